use crate::errors::ConfigError;
use crate::leaderboard::DEFAULT_LIMIT;
use crate::storage::DEFAULT_DATA_PATH;
use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_REFRESH_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// Hosted PostgREST/Supabase project.
    Postgrest { url: String, anon_key: String },
    /// In-process backend snapshotted to a JSON file.
    Memory { data_path: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub backend: BackendConfig,
    pub leaderboard_limit: usize,
    pub leaderboard_refresh: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend = match var("SUPABASE_URL") {
            Some(url) => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::InvalidUrl { url });
                }
                let anon_key = var("SUPABASE_ANON_KEY").ok_or(ConfigError::MissingAnonKey)?;
                BackendConfig::Postgrest { url, anon_key }
            }
            None => BackendConfig::Memory {
                data_path: PathBuf::from(
                    var("APP_DATA_PATH").unwrap_or_else(|| DEFAULT_DATA_PATH.to_string()),
                ),
            },
        };

        let port = var("PORT")
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let leaderboard_limit = var("LEADERBOARD_LIMIT")
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|limit| *limit > 0)
            .unwrap_or(DEFAULT_LIMIT);
        let refresh_secs = var("LEADERBOARD_REFRESH_SECS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_REFRESH_SECS);

        Ok(Self {
            port,
            backend,
            leaderboard_limit,
            leaderboard_refresh: Duration::from_secs(refresh_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_memory_backend() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.leaderboard_limit, 5);
        assert_eq!(config.leaderboard_refresh, Duration::from_secs(30));
        assert_eq!(
            config.backend,
            BackendConfig::Memory {
                data_path: PathBuf::from("data/checkins.json"),
            }
        );
    }

    #[test]
    fn supabase_url_selects_postgrest() {
        let config = config(&[
            ("SUPABASE_URL", "https://abc.supabase.co"),
            ("SUPABASE_ANON_KEY", "anon"),
            ("PORT", "9000"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(
            config.backend,
            BackendConfig::Postgrest {
                url: "https://abc.supabase.co".to_string(),
                anon_key: "anon".to_string(),
            }
        );
    }

    #[test]
    fn url_without_key_is_rejected() {
        assert!(matches!(
            config(&[("SUPABASE_URL", "https://abc.supabase.co")]),
            Err(ConfigError::MissingAnonKey)
        ));
        assert!(matches!(
            config(&[("SUPABASE_URL", "YOUR_SUPABASE_URL_HERE"), ("SUPABASE_ANON_KEY", "k")]),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn unparseable_numbers_fall_back() {
        let config = config(&[
            ("PORT", "eighty"),
            ("LEADERBOARD_LIMIT", "0"),
            ("LEADERBOARD_REFRESH_SECS", "-3"),
        ])
        .unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.leaderboard_limit, DEFAULT_LIMIT);
        assert_eq!(config.leaderboard_refresh, Duration::from_secs(DEFAULT_REFRESH_SECS));
    }
}
