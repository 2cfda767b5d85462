use crate::config::RemoteConfig;
use crate::error::SyncError;
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Patch,
    Delete,
}

/// One remote call, built fresh for every request
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    /// Path below the API root, starting with `/`
    pub path: String,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    pub fn ping() -> Self {
        RequestDescriptor {
            method: HttpMethod::Get,
            path: "/ping".to_string(),
            body: None,
        }
    }

    pub fn insert(version: &str, table: &str, body: Value) -> Self {
        RequestDescriptor {
            method: HttpMethod::Post,
            path: format!("/{}/{}", version, table),
            body: Some(body),
        }
    }

    pub fn update(version: &str, table: &str, uuid: &str, patch: Value) -> Self {
        RequestDescriptor {
            method: HttpMethod::Patch,
            path: format!("/{}/{}/{}", version, table, uuid),
            body: Some(patch),
        }
    }

    pub fn delete(version: &str, table: &str, uuid: &str) -> Self {
        RequestDescriptor {
            method: HttpMethod::Delete,
            path: format!("/{}/{}/{}", version, table, uuid),
            body: None,
        }
    }

    pub fn insert_translation(version: &str, table: &str, uuid: &str, body: Value) -> Self {
        RequestDescriptor {
            method: HttpMethod::Post,
            path: format!("/{}/{}/{}/translations", version, table, uuid),
            body: Some(body),
        }
    }

    pub fn update_translation(
        version: &str,
        table: &str,
        uuid: &str,
        language: &str,
        patch: Value,
    ) -> Self {
        RequestDescriptor {
            method: HttpMethod::Patch,
            path: format!("/{}/{}/{}/translations/{}", version, table, uuid, language),
            body: Some(patch),
        }
    }

    pub fn delete_translation(version: &str, table: &str, uuid: &str, language: &str) -> Self {
        RequestDescriptor {
            method: HttpMethod::Delete,
            path: format!("/{}/{}/{}/translations/{}", version, table, uuid, language),
            body: None,
        }
    }
}

/// What came back from the remote
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResponse {
    pub status: u16,
    /// Parsed JSON body, or the raw text wrapped as a string; `None` when empty
    pub body: Option<Value>,
}

impl RemoteResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The remote catalog API
#[allow(async_fn_in_trait)]
pub trait RemoteApi {
    async fn send(&self, request: RequestDescriptor) -> Result<RemoteResponse, SyncError>;
}

/// `RemoteApi` over HTTP with a bearer token
pub struct HttpRemote {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl HttpRemote {
    pub fn new(config: RemoteConfig) -> Self {
        HttpRemote {
            client: reqwest::Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }
}

impl RemoteApi for HttpRemote {
    async fn send(&self, request: RequestDescriptor) -> Result<RemoteResponse, SyncError> {
        let url = format!("{}{}", self.config.api_url, request.path);
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self
            .client
            .request(method, &url)
            .bearer_auth(&self.config.token);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let http_err = |source| SyncError::Http {
            url: url.clone(),
            source,
        };
        let response = builder.send().await.map_err(http_err)?;
        let status = response.status().as_u16();
        let text = response.text().await.map_err(http_err)?;

        debug!(%url, status, "Remote responded");
        Ok(RemoteResponse {
            status,
            body: parse_body(&text),
        })
    }
}

/// Bodies that are empty or not JSON leave the caller's fallback message in place
fn parse_body(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}
