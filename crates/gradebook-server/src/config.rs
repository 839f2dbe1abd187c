use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// JWT secrets that are fine for development and nothing else.
const PLACEHOLDER_SECRETS: &[&str] = &["dev-secret-change-me", "change-me-to-a-random-string"];

const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub jwt_secret: String,
    pub default_student_password: String,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = var("GRADEBOOK_PORT", "5000")
            .parse()
            .context("GRADEBOOK_PORT must be a port number")?;
        let max_upload_bytes = match lookup("GRADEBOOK_MAX_UPLOAD_BYTES") {
            Some(v) => v
                .parse()
                .context("GRADEBOOK_MAX_UPLOAD_BYTES must be a byte count")?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            host: var("GRADEBOOK_HOST", "0.0.0.0"),
            port,
            db_path: var("GRADEBOOK_DB_PATH", "grade_manager.db").into(),
            upload_dir: var("GRADEBOOK_UPLOAD_DIR", "uploads").into(),
            jwt_secret: var("GRADEBOOK_JWT_SECRET", "dev-secret-change-me"),
            default_student_password: var("GRADEBOOK_DEFAULT_STUDENT_PASSWORD", "default123"),
            max_upload_bytes,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }

    pub fn has_placeholder_secret(&self) -> bool {
        self.jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.db_path, PathBuf::from("grade_manager.db"));
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.default_student_password, "default123");
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
        assert!(config.has_placeholder_secret());
        assert_eq!(config.addr().unwrap().port(), 5000);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("GRADEBOOK_PORT", "8080"),
            ("GRADEBOOK_HOST", "127.0.0.1"),
            ("GRADEBOOK_JWT_SECRET", "a-real-secret"),
        ])
        .unwrap();
        assert_eq!(config.addr().unwrap().to_string(), "127.0.0.1:8080");
        assert!(!config.has_placeholder_secret());
    }

    #[test]
    fn test_bad_port_fails() {
        assert!(config(&[("GRADEBOOK_PORT", "http")]).is_err());
    }
}
