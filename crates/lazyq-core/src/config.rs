//! Query configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Optional seed for deterministic `randomize`.
    pub seed: Option<u64>,

    /// Number of compiled lambdas kept per resolver. 0 disables caching.
    pub lambda_cache_capacity: usize,

    /// Pretty-print JSON output.
    pub json_pretty: bool,

    /// Let `to_dictionary` overwrite duplicate keys instead of failing.
    pub allow_duplicate_keys: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            seed: None,
            lambda_cache_capacity: 256,
            json_pretty: false,
            allow_duplicate_keys: false,
        }
    }
}

impl QueryConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `LAZYQ_SEED`: random seed
    /// - `LAZYQ_LAMBDA_CACHE_CAPACITY`: compiled lambda cache size
    /// - `LAZYQ_JSON_PRETTY`: `1`/`true` to pretty-print JSON
    /// - `LAZYQ_ALLOW_DUPLICATE_KEYS`: `1`/`true` to overwrite duplicate keys
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("LAZYQ_SEED") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.seed = Some(v);
            }
        }

        if let Ok(s) = std::env::var("LAZYQ_LAMBDA_CACHE_CAPACITY") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.lambda_cache_capacity = v;
            }
        }

        if let Ok(s) = std::env::var("LAZYQ_JSON_PRETTY") {
            cfg.json_pretty = parse_flag(&s);
        }

        if let Ok(s) = std::env::var("LAZYQ_ALLOW_DUPLICATE_KEYS") {
            cfg.allow_duplicate_keys = parse_flag(&s);
        }

        cfg
    }
}

fn parse_flag(s: &str) -> bool {
    matches!(
        s.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
