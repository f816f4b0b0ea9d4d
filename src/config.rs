use std::time::Duration;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_SCRAPER_SCRIPT: &str = "scripts/jw_scraper.py";
const DEFAULT_SCRAPER_PYTHON: &str = "python3";
const DEFAULT_SCRAPER_TIMEOUT_SECS: u64 = 60;
const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

/// Process configuration read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// Raw session key material; `None` when unset or shorter than 64 bytes.
    pub session_key: Option<Vec<u8>>,
    pub admin_password: String,
    pub scraper: ScraperConfig,
}

/// How the meeting import endpoint runs the external scraper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScraperConfig {
    pub python: String,
    pub script: String,
    pub timeout: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            python: DEFAULT_SCRAPER_PYTHON.to_string(),
            script: DEFAULT_SCRAPER_SCRIPT.to_string(),
            timeout: Duration::from_secs(DEFAULT_SCRAPER_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let database_url = get("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| "DATABASE_URL must be set".to_string())?;

        let session_key = match get("SESSION_KEY") {
            Some(val) if val.len() >= 64 => Some(val.into_bytes()),
            Some(val) => {
                log::warn!("SESSION_KEY too short ({} bytes, need 64+), ignoring", val.len());
                None
            }
            None => None,
        };

        let timeout_secs = match get("SCRAPER_TIMEOUT_SECS") {
            Some(val) => val
                .trim()
                .parse::<u64>()
                .map_err(|_| format!("SCRAPER_TIMEOUT_SECS is not a number: {val}"))?,
            None => DEFAULT_SCRAPER_TIMEOUT_SECS,
        };

        Ok(Self {
            database_url,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            session_key,
            admin_password: get("ADMIN_PASSWORD").unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            scraper: ScraperConfig {
                python: get("SCRAPER_PYTHON").unwrap_or_else(|| DEFAULT_SCRAPER_PYTHON.to_string()),
                script: get("SCRAPER_SCRIPT").unwrap_or_else(|| DEFAULT_SCRAPER_SCRIPT.to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_database_is_set() {
        let cfg = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/v")])).unwrap();
        assert_eq!(cfg.bind_addr, "127.0.0.1:8080");
        assert_eq!(cfg.scraper, ScraperConfig::default());
        assert_eq!(cfg.admin_password, "admin123");
        assert!(cfg.session_key.is_none());
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(AppConfig::from_lookup(lookup(&[])).is_err());
    }

    #[test]
    fn short_session_key_is_ignored_and_timeout_parsed() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/v"),
            ("SESSION_KEY", "short"),
            ("SCRAPER_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();
        assert!(cfg.session_key.is_none());
        assert_eq!(cfg.scraper.timeout, Duration::from_secs(5));
    }
}
