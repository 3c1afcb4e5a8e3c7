//! Service configuration

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// SQLite database file; the in-memory store is used when unset
    pub database: Option<String>,

    /// Path the JSON API is mounted under
    pub api_prefix: String,

    /// Directory holding the built client, served for every non-API path
    pub static_dir: String,

    /// bcrypt work factor for password hashes
    pub bcrypt_cost: u32,

    /// Load catalog tags, recommendations and achievement types at startup
    pub seed_on_start: bool,

    /// Seconds between sweeps that delete plans dated before today
    pub sweep_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            database: None,
            api_prefix: "/api".to_string(),
            static_dir: "dist".to_string(),
            bcrypt_cost: crate::crypto::BCRYPT_COST,
            seed_on_start: true,
            sweep_interval_secs: 3600,
        }
    }
}

impl Config {
    /// Load configuration from `NIXKNACK_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to
    /// defaults for missing or unparsable values
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            port: parse_or(&lookup, "NIXKNACK_PORT", defaults.port),
            database: lookup("NIXKNACK_DATABASE").filter(|v| !v.is_empty()),
            api_prefix: lookup("NIXKNACK_API_PREFIX").unwrap_or(defaults.api_prefix),
            static_dir: lookup("NIXKNACK_STATIC_DIR").unwrap_or(defaults.static_dir),
            bcrypt_cost: parse_or(&lookup, "NIXKNACK_BCRYPT_COST", defaults.bcrypt_cost),
            seed_on_start: parse_or(&lookup, "NIXKNACK_SEED_ON_START", defaults.seed_on_start),
            sweep_interval_secs: parse_or(
                &lookup,
                "NIXKNACK_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval_secs,
            ),
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparsable setting");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config.port, 3000);
        assert!(config.database.is_none());
        assert_eq!(config.api_prefix, "/api");
        assert!(config.seed_on_start);
    }

    #[test]
    fn test_reads_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("NIXKNACK_PORT", "8080"),
            ("NIXKNACK_DATABASE", "/tmp/nixknack.db"),
            ("NIXKNACK_BCRYPT_COST", "4"),
            ("NIXKNACK_SEED_ON_START", "false"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.database.as_deref(), Some("/tmp/nixknack.db"));
        assert_eq!(config.bcrypt_cost, 4);
        assert!(!config.seed_on_start);
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = Config::from_lookup(lookup_from(&[
            ("NIXKNACK_PORT", "not-a-port"),
            ("NIXKNACK_DATABASE", ""),
        ]));
        assert_eq!(config.port, 3000);
        assert!(config.database.is_none());
    }
}
