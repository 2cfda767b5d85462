use std::path::PathBuf;

/// Layout and naming rules for the local catalog mirror
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Root folder of the local mirror
    pub db_folder: PathBuf,

    /// API version tag, used to namespace the directory layout
    pub version: String,

    /// Every base table the mirror knows about
    pub tables: Vec<String>,

    /// Tables whose locale-variant fields live in a `<table>_translations` table
    pub translation_tables: Vec<String>,

    /// Fields that belong to the translation table on translatable tables
    pub translation_fields: Vec<String>,

    /// Field names that collide with SQL reserved words
    pub special_names: Vec<String>,

    /// How many levels of array-of-object fields may become child tables
    pub max_child_depth: usize,

    /// File name of the generated SQL script
    pub script_name: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        CatalogConfig {
            db_folder: PathBuf::from("db"),
            version: String::from("v1"),
            tables: strings(&[
                "actors",
                "characters",
                "episodes",
                "games",
                "locations",
                "seasons",
                "soundtracks",
            ]),
            translation_tables: strings(&["episodes", "games", "locations", "seasons"]),
            translation_fields: strings(&[
                "language",
                "title",
                "name",
                "description",
                "trailer",
                "genres",
                "trailers",
            ]),
            special_names: strings(&["character", "language"]),
            max_child_depth: 1,
            script_name: String::from("hawapi.sql"),
        }
    }
}

impl CatalogConfig {
    /// `<db_folder>/<version>/data`
    pub fn data_dir(&self) -> PathBuf {
        self.db_folder.join(&self.version).join("data")
    }

    pub fn translations_dir(&self) -> PathBuf {
        self.data_dir().join("translations")
    }

    pub fn sql_dir(&self) -> PathBuf {
        self.data_dir().join("sql")
    }

    pub fn output_path(&self) -> PathBuf {
        self.sql_dir().join(&self.script_name)
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.data_dir().join(format!("{}.json", table))
    }

    pub fn translation_path(&self, table: &str) -> PathBuf {
        self.translations_dir()
            .join(format!("{}.json", self.translation_table(table)))
    }

    pub fn is_translatable(&self, table: &str) -> bool {
        self.translation_tables.iter().any(|t| t == table)
    }

    pub fn is_translation_field(&self, field: &str) -> bool {
        self.translation_fields.iter().any(|f| f == field)
    }

    pub fn is_special_name(&self, field: &str) -> bool {
        self.special_names.iter().any(|f| f == field)
    }

    /// Name of the relation holding translations of `table`
    pub fn translation_table(&self, table: &str) -> String {
        format!("{}_translations", table)
    }

    /// Field joining a translation record to its parent, e.g. `episode_uuid`
    pub fn translation_key(&self, table: &str) -> String {
        format!("{}_uuid", singular(table))
    }
}

/// Table name with one trailing plural `s` removed
pub fn singular(table: &str) -> &str {
    table.strip_suffix('s').unwrap_or(table)
}

/// Relation holding the rows of an array-of-object field, e.g. `characters_relatives`
pub fn child_table(table: &str, field: &str) -> String {
    format!("{}_{}", table, field)
}

/// Split a comma-separated CLI value into trimmed, non-empty names
pub fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

/// Where and how to reach the remote catalog API
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL, e.g. `https://api.example.com/api`
    pub api_url: String,

    /// Bearer token sent with every mutation
    pub token: String,

    pub version: String,
}

impl RemoteConfig {
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        RemoteConfig {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            version: version.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let config = CatalogConfig {
            db_folder: PathBuf::from("mirror"),
            version: "v2".to_string(),
            ..CatalogConfig::default()
        };

        assert_eq!(config.data_dir(), PathBuf::from("mirror/v2/data"));
        assert_eq!(
            config.table_path("actors"),
            PathBuf::from("mirror/v2/data/actors.json")
        );
        assert_eq!(
            config.translation_path("episodes"),
            PathBuf::from("mirror/v2/data/translations/episodes_translations.json")
        );
        assert_eq!(config.output_path(), PathBuf::from("mirror/v2/data/sql/hawapi.sql"));
    }

    #[test]
    fn test_naming_rules() {
        let config = CatalogConfig::default();

        assert_eq!(singular("episodes"), "episode");
        assert_eq!(singular("series"), "serie");
        assert_eq!(singular("staff"), "staff");
        assert_eq!(config.translation_key("games"), "game_uuid");
        assert_eq!(config.translation_table("episodes"), "episodes_translations");
        assert_eq!(child_table("characters", "relatives"), "characters_relatives");
        assert!(config.is_translatable("seasons"));
        assert!(!config.is_translatable("actors"));
        assert!(config.is_special_name("language"));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list("episodes, games,,seasons "),
            vec!["episodes", "games", "seasons"]
        );
    }

    #[test]
    fn test_remote_url_trimmed() {
        let remote = RemoteConfig::new("http://localhost:8080/api/", "token", "v1");
        assert_eq!(remote.api_url, "http://localhost:8080/api");
    }
}
