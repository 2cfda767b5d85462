//! Replays queued mutations against the remote and mirrors successes locally.

use crate::error::{StoreError, SyncError};
use crate::json_file;
use crate::store::LocalStore;
use crate::sync::remote::{RemoteApi, RemoteResponse, RequestDescriptor};
use crate::sync::requests::{Method, RequestQueue};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use tracing::{info, warn};

/// Result of one queued request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    /// HTTP status, or 0 when the request never reached the remote
    pub status_code: u16,
    pub message: Value,
}

impl Outcome {
    fn rejected(message: impl Into<String>) -> Self {
        Outcome {
            status_code: 0,
            message: Value::String(message.into()),
        }
    }

    fn from_response(response: RemoteResponse, fallback: String) -> Self {
        Outcome {
            status_code: response.status,
            message: response.body.unwrap_or(Value::String(fallback)),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Outcomes grouped by method then table, in queue order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    methods: Vec<(String, Vec<(String, Vec<Outcome>)>)>,
}

impl SyncReport {
    pub fn outcomes(&self) -> impl Iterator<Item = &Outcome> {
        self.methods
            .iter()
            .flat_map(|(_, tables)| tables)
            .flat_map(|(_, outcomes)| outcomes)
    }

    pub fn get(&self, method: &str, table: &str) -> Option<&[Outcome]> {
        self.methods
            .iter()
            .find(|(m, _)| m == method)
            .and_then(|(_, tables)| tables.iter().find(|(t, _)| t == table))
            .map(|(_, outcomes)| outcomes.as_slice())
    }

    pub fn len(&self) -> usize {
        self.outcomes().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn failures(&self) -> usize {
        self.outcomes().filter(|o| !o.is_success()).count()
    }

    /// `{"POST": {"actors": [{"status_code": 201, "message": ...}]}}`
    pub fn to_value(&self) -> Value {
        let mut methods = Map::new();
        for (method, tables) in &self.methods {
            let mut entry = Map::new();
            for (table, outcomes) in tables {
                let outcomes = outcomes
                    .iter()
                    .map(|o| serde_json::to_value(o).unwrap_or(Value::Null))
                    .collect();
                entry.insert(table.clone(), Value::Array(outcomes));
            }
            methods.insert(method.clone(), Value::Object(entry));
        }
        Value::Object(methods)
    }
}

pub struct Replayer<'a, R: RemoteApi> {
    remote: &'a R,
    store: &'a LocalStore,
    version: String,
}

impl<'a, R: RemoteApi> Replayer<'a, R> {
    pub fn new(remote: &'a R, store: &'a LocalStore, version: impl Into<String>) -> Self {
        Replayer {
            remote,
            store,
            version: version.into(),
        }
    }

    /// Send every queued request in order. Failures are recorded in the
    /// report and never stop the replay.
    pub async fn replay(&self, queue: &RequestQueue) -> SyncReport {
        let mut report = SyncReport::default();

        for entry in &queue.methods {
            let mut tables = Vec::new();
            for requests in &entry.tables {
                let mut outcomes = Vec::with_capacity(requests.bodies.len());
                for body in &requests.bodies {
                    outcomes.push(self.apply(&entry.method, &requests.table, body).await);
                }
                tables.push((requests.table.clone(), outcomes));
            }
            report.methods.push((entry.method.clone(), tables));
        }

        report
    }

    async fn apply(&self, method: &str, table: &str, body: &Value) -> Outcome {
        let Some(kind) = Method::parse(method) else {
            warn!(method, "Method is not valid. Skipping");
            return Outcome::rejected(format!("Method '{}' is not valid", method));
        };

        let join_key = self.store.config().translation_key(table);
        let is_translation = body.get(&join_key).is_some();

        let result = match (kind, is_translation) {
            (Method::Post, false) => self.insert(table, body).await,
            (Method::Post, true) => self.insert_translation(table, body).await,
            (Method::Update, false) => self.update(table, body).await,
            (Method::Update, true) => self.update_translation(table, body).await,
            (Method::Delete, false) => self.delete(table, body).await,
            (Method::Delete, true) => self.delete_translation(table, body).await,
        };

        result.unwrap_or_else(|err| {
            warn!(method, table, error = %err, "Request failed");
            Outcome::rejected(err.to_string())
        })
    }

    async fn insert(&self, table: &str, body: &Value) -> Result<Outcome, SyncError> {
        let fallback = failure_message(body.get("uuid").and_then(Value::as_str).unwrap_or(""));
        let response = self
            .remote
            .send(RequestDescriptor::insert(&self.version, table, body.clone()))
            .await?;

        if response.is_success() {
            if let Some(created) = &response.body {
                self.mirror(table, self.store.insert(table, created.clone()));
            }
        }
        Ok(Outcome::from_response(response, fallback))
    }

    async fn insert_translation(&self, table: &str, body: &Value) -> Result<Outcome, SyncError> {
        let (uuid, _) = match self.validate_translation(table, body) {
            Ok(keys) => keys,
            Err(outcome) => return Ok(outcome),
        };

        let response = self
            .remote
            .send(RequestDescriptor::insert_translation(&self.version, table, uuid, body.clone()))
            .await?;

        if response.is_success() {
            if let Some(Value::Object(created)) = &response.body {
                let mut created = created.clone();
                created.insert(
                    self.store.config().translation_key(table),
                    Value::String(uuid.to_string()),
                );
                self.mirror(table, self.store.insert_translation(table, Value::Object(created)));
            }
        }
        Ok(Outcome::from_response(response, failure_message(uuid)))
    }

    async fn update(&self, table: &str, patch: &Value) -> Result<Outcome, SyncError> {
        let Some(uuid) = patch.get("uuid").and_then(Value::as_str) else {
            return Ok(Outcome::rejected("Field 'uuid' not defined!"));
        };

        let response = self
            .remote
            .send(RequestDescriptor::update(&self.version, table, uuid, patch.clone()))
            .await?;

        if response.is_success() {
            self.mirror(table, self.store.update(table, patch));
        }
        Ok(Outcome::from_response(response, failure_message(uuid)))
    }

    async fn update_translation(&self, table: &str, patch: &Value) -> Result<Outcome, SyncError> {
        let (uuid, language) = match self.validate_translation(table, patch) {
            Ok(keys) => keys,
            Err(outcome) => return Ok(outcome),
        };

        let response = self
            .remote
            .send(RequestDescriptor::update_translation(
                &self.version,
                table,
                uuid,
                language,
                patch.clone(),
            ))
            .await?;

        if response.is_success() {
            self.mirror(table, self.store.update_translation(table, patch));
        }
        Ok(Outcome::from_response(response, failure_message(uuid)))
    }

    async fn delete(&self, table: &str, body: &Value) -> Result<Outcome, SyncError> {
        let Some(uuid) = body.get("uuid").and_then(Value::as_str) else {
            return Ok(Outcome::rejected("Field 'uuid' not defined!"));
        };

        let response = self
            .remote
            .send(RequestDescriptor::delete(&self.version, table, uuid))
            .await?;

        if response.is_success() {
            self.mirror(table, self.store.delete(table, uuid));
            return Ok(deleted(response.status, uuid));
        }
        Ok(Outcome::from_response(response, failure_message(uuid)))
    }

    async fn delete_translation(&self, table: &str, body: &Value) -> Result<Outcome, SyncError> {
        let (uuid, language) = match self.validate_translation(table, body) {
            Ok(keys) => keys,
            Err(outcome) => return Ok(outcome),
        };

        let response = self
            .remote
            .send(RequestDescriptor::delete_translation(&self.version, table, uuid, language))
            .await?;

        if response.is_success() {
            self.mirror(table, self.store.delete_translation(table, uuid, language));
            return Ok(deleted(response.status, uuid));
        }
        Ok(Outcome::from_response(
            response,
            format!("Something wrong happen. Item: '{}' and Language '{}'", uuid, language),
        ))
    }

    /// Parent uuid and language of a translation request, or the outcome
    /// rejecting it without contacting the remote
    fn validate_translation<'b>(
        &self,
        table: &str,
        body: &'b Value,
    ) -> Result<(&'b str, &'b str), Outcome> {
        let config = self.store.config();
        if !config.is_translatable(table) {
            return Err(Outcome::rejected(format!(
                "Table '{}' doesn't have a translation table",
                table
            )));
        }

        let Some(language) = body.get("language").and_then(Value::as_str) else {
            return Err(Outcome::rejected("Field 'language' not defined!"));
        };

        let key = config.translation_key(table);
        let Some(uuid) = body.get(&key).and_then(Value::as_str) else {
            return Err(Outcome::rejected(format!("Field '{}' not defined!", key)));
        };

        Ok((uuid, language))
    }

    /// The remote already accepted the change; a local failure only leaves
    /// the mirror behind, so it is logged rather than reported as failed
    fn mirror<T>(&self, table: &str, result: Result<T, StoreError>) {
        if let Err(err) = result {
            warn!(table, error = %err, "Failed to mirror change into local store");
        }
    }
}

fn failure_message(uuid: &str) -> String {
    format!("Something wrong happen. Item: '{}'", uuid)
}

fn deleted(status: u16, uuid: &str) -> Outcome {
    Outcome {
        status_code: status,
        message: Value::String(format!("Deleted item: '{}'", uuid)),
    }
}

/// Check that the remote is reachable
pub async fn ping<R: RemoteApi>(remote: &R) -> Result<RemoteResponse, SyncError> {
    remote.send(RequestDescriptor::ping()).await
}

/// Replay the requests file, write the outcome report and reset the queue to `{}`
pub async fn sync_files<R: RemoteApi>(
    remote: &R,
    store: &LocalStore,
    version: &str,
    requests_path: &Path,
    output_path: &Path,
) -> Result<SyncReport, SyncError> {
    let queue = RequestQueue::load(requests_path)?;
    info!(requests = queue.len(), path = %requests_path.display(), "Replaying queued requests");

    let report = Replayer::new(remote, store, version).replay(&queue).await;

    json_file::write_pretty(output_path, &report.to_value())?;
    json_file::write_atomic(requests_path, b"{}")?;

    info!(
        sent = report.len(),
        failed = report.failures(),
        output = %output_path.display(),
        "Sync finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CatalogConfig;
    use crate::sync::remote::HttpMethod;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct MockRemote {
        responses: Mutex<VecDeque<RemoteResponse>>,
        sent: Mutex<Vec<RequestDescriptor>>,
    }

    impl MockRemote {
        fn with(responses: Vec<RemoteResponse>) -> Self {
            MockRemote {
                responses: Mutex::new(responses.into()),
                sent: Mutex::new(Vec::new()),
            }
        }

        fn sent(&self) -> Vec<RequestDescriptor> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl RemoteApi for MockRemote {
        async fn send(&self, request: RequestDescriptor) -> Result<RemoteResponse, SyncError> {
            self.sent.lock().unwrap().push(request);
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(RemoteResponse { status: 500, body: None }))
        }
    }

    fn ok(status: u16, body: Value) -> RemoteResponse {
        RemoteResponse {
            status,
            body: Some(body),
        }
    }

    fn store() -> (TempDir, LocalStore) {
        let dir = TempDir::new().unwrap();
        let store = LocalStore::new(CatalogConfig {
            db_folder: dir.path().join("db"),
            ..CatalogConfig::default()
        });
        store.init().unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_insert_mirrors_response_body() {
        let (_dir, store) = store();
        let remote = MockRemote::with(vec![ok(201, json!({"uuid": "a1", "first_name": "Sadie"}))]);
        let queue =
            RequestQueue::from_value(&json!({"POST": {"actors": [{"first_name": "Sadie"}]}}))
                .unwrap();

        let report = Replayer::new(&remote, &store, "v1").replay(&queue).await;

        assert_eq!(
            report.get("POST", "actors").unwrap(),
            &[Outcome {
                status_code: 201,
                message: json!({"uuid": "a1", "first_name": "Sadie"}),
            }]
        );
        assert_eq!(remote.sent()[0].path, "/v1/actors");
        assert_eq!(remote.sent()[0].method, HttpMethod::Post);
        assert_eq!(
            store.read_table("actors").unwrap(),
            vec![json!({"uuid": "a1", "first_name": "Sadie"})]
        );
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_store_untouched() {
        let (_dir, store) = store();
        let remote = MockRemote::with(vec![RemoteResponse { status: 400, body: None }]);
        let queue =
            RequestQueue::from_value(&json!({"POST": {"actors": [{"uuid": "a1"}]}})).unwrap();

        let report = Replayer::new(&remote, &store, "v1").replay(&queue).await;

        let outcome = &report.get("POST", "actors").unwrap()[0];
        assert_eq!(outcome.status_code, 400);
        assert_eq!(outcome.message, json!("Something wrong happen. Item: 'a1'"));
        assert_eq!(report.failures(), 1);
        assert!(store.read_table("actors").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_translation_routing() {
        let (_dir, store) = store();
        let remote = MockRemote::with(vec![
            ok(201, json!({"language": "pt", "title": "Piloto"})),
            ok(200, json!({"language": "pt", "title": "O Piloto"})),
            RemoteResponse { status: 204, body: None },
        ]);
        let queue = RequestQueue::from_value(&json!({
            "POST": {"episodes": [{"episode_uuid": "e1", "language": "pt", "title": "Piloto"}]},
            "UPDATE": {"episodes": [{"episode_uuid": "e1", "language": "pt", "title": "O Piloto"}]},
            "DELETE": {"episodes": [{"episode_uuid": "e1", "language": "pt"}]}
        }))
        .unwrap();

        let replayer = Replayer::new(&remote, &store, "v1");
        let report = replayer.replay(&queue).await;

        let paths: Vec<String> = remote.sent().into_iter().map(|r| r.path).collect();
        assert_eq!(
            paths,
            vec![
                "/v1/episodes/e1/translations",
                "/v1/episodes/e1/translations/pt",
                "/v1/episodes/e1/translations/pt",
            ]
        );
        assert_eq!(
            report.get("DELETE", "episodes").unwrap()[0].message,
            json!("Deleted item: 'e1'")
        );
        assert!(store.read_translations("episodes").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_translation_insert_keeps_join_key() {
        let (_dir, store) = store();
        let remote = MockRemote::with(vec![ok(201, json!({"language": "pt", "title": "Piloto"}))]);
        let queue = RequestQueue::from_value(&json!({
            "POST": {"episodes": [{"episode_uuid": "e1", "language": "pt", "title": "Piloto"}]}
        }))
        .unwrap();

        Replayer::new(&remote, &store, "v1").replay(&queue).await;

        assert_eq!(
            store.read_translations("episodes").unwrap(),
            vec![json!({"language": "pt", "title": "Piloto", "episode_uuid": "e1"})]
        );
    }

    #[tokio::test]
    async fn test_invalid_requests_never_reach_remote() {
        let (_dir, store) = store();
        let remote = MockRemote::default();
        let queue = RequestQueue::from_value(&json!({
            "PUT": {"actors": [{"uuid": "a1"}]},
            "POST": {"actor": [{"actor_uuid": "a1", "language": "en"}]},
            "UPDATE": {"games": [{"game_uuid": "g1"}], "actors": [{"first_name": "x"}]}
        }))
        .unwrap();

        let report = Replayer::new(&remote, &store, "v1").replay(&queue).await;

        assert!(remote.sent().is_empty());
        assert_eq!(
            report.get("PUT", "actors").unwrap()[0].message,
            json!("Method 'PUT' is not valid")
        );
        assert_eq!(
            report.get("POST", "actor").unwrap()[0].message,
            json!("Table 'actor' doesn't have a translation table")
        );
        assert_eq!(
            report.get("UPDATE", "games").unwrap()[0].message,
            json!("Field 'language' not defined!")
        );
        assert_eq!(
            report.get("UPDATE", "actors").unwrap()[0].message,
            json!("Field 'uuid' not defined!")
        );
        assert!(report.outcomes().all(|o| o.status_code == 0));
    }

    #[tokio::test]
    async fn test_sync_files_writes_report_and_clears_queue() {
        let (dir, store) = store();
        store.insert("actors", json!({"uuid": "a1", "first_name": "Joe"})).unwrap();

        let requests_path = dir.path().join("requests.json");
        let output_path = dir.path().join("output.json");
        std::fs::write(&requests_path, r#"{"DELETE": {"actors": [{"uuid": "a1"}]}}"#).unwrap();

        let remote = MockRemote::with(vec![RemoteResponse { status: 200, body: None }]);
        let report = sync_files(&remote, &store, "v1", &requests_path, &output_path)
            .await
            .unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(std::fs::read_to_string(&requests_path).unwrap(), "{}");
        assert_eq!(
            json_file::read_value(&output_path).unwrap(),
            json!({"DELETE": {"actors": [{"status_code": 200, "message": "Deleted item: 'a1'"}]}})
        );
        assert!(store.read_table("actors").unwrap().is_empty());
    }
}
