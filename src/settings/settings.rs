use anyhow::{Result, anyhow, bail};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub http: Http,
    pub log: Log,
    pub token: Token,
    pub session_store: SessionStore,
    #[serde(default)]
    pub users: Users,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Deserialize)]
pub struct Token {
    pub issuer: String,
    pub audience: String,
    pub access_secret: String,
    pub refresh_secret: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,
}

// Secrets stay out of logs.
impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .finish()
    }
}

impl Token {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }
}

#[derive(Deserialize)]
pub struct SessionStore {
    pub backend: String, // "redis" or "memory"
    pub redis_url: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

// The redis url may carry a password.
impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("backend", &self.backend)
            .field("redis_url", &self.redis_url.as_ref().map(|_| "<redacted>"))
            .field("key_prefix", &self.key_prefix)
            .field("op_timeout_ms", &self.op_timeout_ms)
            .finish()
    }
}

impl SessionStore {
    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.op_timeout_ms)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Users {
    #[serde(default)]
    pub seed: Vec<SeedUser>,
}

#[derive(Deserialize)]
pub struct SeedUser {
    pub email: String,
    pub name: String,
    pub password: String,
}

impl fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedUser")
            .field("email", &self.email)
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

fn default_access_ttl_secs() -> u64 {
    15 * 60
}

fn default_refresh_ttl_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_key_prefix() -> String {
    "auth".to_string()
}

fn default_op_timeout_ms() -> u64 {
    2_000
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.http
            .address
            .parse::<std::net::SocketAddr>()
            .map_err(|e| anyhow!("invalid http.address {:?}: {}", self.http.address, e))?;
        if self.http.cert_path.is_some() != self.http.key_path.is_some() {
            bail!("http.cert_path and http.key_path must be set together");
        }
        if self.token.access_secret.is_empty() || self.token.refresh_secret.is_empty() {
            bail!("token secrets must not be empty");
        }
        if self.token.access_secret == self.token.refresh_secret {
            bail!("token.access_secret and token.refresh_secret must differ");
        }
        if self.token.access_ttl_secs == 0 || self.token.access_ttl_secs >= self.token.refresh_ttl_secs {
            bail!("token.access_ttl_secs must be positive and shorter than token.refresh_ttl_secs");
        }
        match self.session_store.backend.as_str() {
            "memory" => {}
            "redis" if self.session_store.redis_url.is_some() => {}
            "redis" => bail!("session_store.redis_url is required for the redis backend"),
            other => bail!("unknown session_store.backend: {}", other),
        }
        if self.session_store.op_timeout_ms == 0 {
            bail!("session_store.op_timeout_ms must be positive");
        }
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Loads the settings file, then applies `AUTHGATE__SECTION__KEY` overrides.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix("AUTHGATE").separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Settings {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    const BASE: &str = r#"
        [http]
        address = "127.0.0.1:8888"
        [log]
        filter = "info"
        [token]
        issuer = "authgate"
        audience = "authgate-clients"
        access_secret = "a"
        refresh_secret = "b"
        [session_store]
        backend = "memory"
    "#;

    #[test]
    fn test_defaults_applied() {
        let settings = from_toml(BASE);
        settings.validate().unwrap();
        assert_eq!(settings.token.access_ttl(), Duration::from_secs(900));
        assert_eq!(settings.token.refresh_ttl(), Duration::from_secs(604_800));
        assert_eq!(settings.session_store.key_prefix, "auth");
        assert_eq!(settings.session_store.op_timeout(), Duration::from_secs(2));
        assert!(settings.users.seed.is_empty());
    }

    #[test]
    fn test_identical_secrets_rejected() {
        let settings = from_toml(&BASE.replace(r#"refresh_secret = "b""#, r#"refresh_secret = "a""#));
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_redis_requires_url() {
        let settings = from_toml(&BASE.replace(r#"backend = "memory""#, r#"backend = "redis""#));
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let settings = from_toml(BASE);
        let rendered = format!("{:?}", settings);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains(r#"access_secret: "a""#));
    }
}
