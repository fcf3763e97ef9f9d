//! Layered configuration.
//!
//! Settings resolve in three layers, later layers overriding earlier
//! ones: compiled defaults, an optional `mieszko.toml` in the working
//! directory, then `MIESZKO_` environment variables (double underscore
//! separating nesting, e.g. `MIESZKO_SEMANTIC_SEARCH__TOP_K=50`).

use std::path::Path;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Default config file looked up relative to the working directory.
pub const CONFIG_FILE: &str = "mieszko.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub semantic_search: SemanticSearchConfig,
    pub search: SearchConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            semantic_search: SemanticSearchConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the HTTP server binds to when enabled.
    pub bind: String,
    /// Log filter applied when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            log_filter: default_log_filter(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SemanticSearchConfig {
    /// Embedding model identifier. Informational; the encoder is
    /// selected at startup.
    pub model: String,
    /// Expected embedding dimension. Vectors of any other width are
    /// rejected at indexing time.
    pub dimension: usize,
    /// Per-attempt budget for encoding the query text, in
    /// milliseconds. One retry is allowed before degrading.
    pub encode_timeout_ms: u64,
    /// How many semantic candidates to pull from the index before
    /// fusion.
    pub top_k: usize,
}

impl Default for SemanticSearchConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            dimension: default_dimension(),
            encode_timeout_ms: default_encode_timeout_ms(),
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result cap applied when a caller does not specify one.
    pub default_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_log_filter() -> String {
    "mieszko=info".to_string()
}

fn default_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

fn default_dimension() -> usize {
    384
}

fn default_encode_timeout_ms() -> u64 {
    5_000
}

fn default_top_k() -> usize {
    100
}

fn default_limit() -> usize {
    5
}

impl Settings {
    /// Load settings from defaults, the config file, and environment.
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Load with an explicit config file path. A missing file is not
    /// an error; the defaults simply stand.
    pub fn load_from(path: &Path) -> Result<Self, figment::Error> {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("MIESZKO_").split("__"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let settings = Settings::default();
        assert_eq!(settings.semantic_search.dimension, 384);
        assert!(settings.semantic_search.top_k >= settings.search.default_limit);
        assert!(settings.semantic_search.encode_timeout_ms > 0);
    }

    #[test]
    fn toml_layer_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "mieszko.toml",
                r#"
                [search]
                default_limit = 12

                [semantic_search]
                top_k = 40
                "#,
            )?;
            let settings = Settings::load_from(Path::new("mieszko.toml"))
                .expect("config should parse");
            assert_eq!(settings.search.default_limit, 12);
            assert_eq!(settings.semantic_search.top_k, 40);
            // Untouched sections keep their defaults.
            assert_eq!(settings.semantic_search.dimension, 384);
            Ok(())
        });
    }

    #[test]
    fn env_layer_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("mieszko.toml", "[search]\ndefault_limit = 12\n")?;
            jail.set_env("MIESZKO_SEARCH__DEFAULT_LIMIT", "3");
            let settings = Settings::load_from(Path::new("mieszko.toml"))
                .expect("config should parse");
            assert_eq!(settings.search.default_limit, 3);
            Ok(())
        });
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        figment::Jail::expect_with(|_jail| {
            let settings = Settings::load_from(Path::new("does-not-exist.toml"))
                .expect("defaults should stand");
            assert_eq!(settings.search.default_limit, 5);
            Ok(())
        });
    }
}
