use crate::storage::StorageError;
use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_ACCESS_KEY_VAR: &str = "STORAGE_ACCESS_KEY";
pub const DEFAULT_SECRET_KEY_VAR: &str = "STORAGE_SECRET_KEY";

/// `[storage]` section of the pipeline config.
///
/// Secrets never live in the file; only the names of the environment
/// variables that hold them do.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub endpoint: String,
    pub region: Option<String>,
    pub path_style: Option<bool>,
    pub ssl: Option<bool>,
    pub env_access_key: Option<String>,
    pub env_secret_key: Option<String>,
    #[serde(skip)]
    pub access_key: Option<String>,
    #[serde(skip)]
    pub secret_key: Option<String>,
}

impl StorageConfig {
    pub fn access_key_var(&self) -> &str {
        self.env_access_key
            .as_deref()
            .unwrap_or(DEFAULT_ACCESS_KEY_VAR)
    }

    pub fn secret_key_var(&self) -> &str {
        self.env_secret_key
            .as_deref()
            .unwrap_or(DEFAULT_SECRET_KEY_VAR)
    }

    pub fn load_credentials(&mut self) -> Result<(), StorageError> {
        let access_key_var = self.access_key_var().to_string();
        let secret_key_var = self.secret_key_var().to_string();

        self.access_key = Some(read_env(&access_key_var)?);
        self.secret_key = Some(read_env(&secret_key_var)?);

        Ok(())
    }

    pub fn get_access_key(&self) -> Result<&str, StorageError> {
        self.access_key
            .as_deref()
            .ok_or_else(|| StorageError::MissingCredentials {
                variable: self.access_key_var().to_string(),
            })
    }

    pub fn get_secret_key(&self) -> Result<&str, StorageError> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| StorageError::MissingCredentials {
                variable: self.secret_key_var().to_string(),
            })
    }

    pub fn is_ssl(&self) -> bool {
        self.ssl
            .unwrap_or_else(|| self.endpoint.starts_with("https://"))
    }

    pub fn is_path_style(&self) -> bool {
        self.path_style.unwrap_or(true)
    }

    pub fn get_region(&self) -> &str {
        self.region.as_deref().unwrap_or("us-east-1")
    }

    pub fn validate(&self) -> Result<(), StorageError> {
        if self.endpoint.is_empty() {
            return Err(StorageError::InvalidConfig(
                "storage endpoint cannot be empty".to_string(),
            ));
        }

        if self.is_ssl() && self.endpoint.starts_with("http://") {
            return Err(StorageError::InvalidConfig(format!(
                "ssl is enabled but endpoint {} is plain http",
                self.endpoint
            )));
        }

        self.get_access_key()?;
        self.get_secret_key()?;

        Ok(())
    }
}

fn read_env(variable: &str) -> Result<String, StorageError> {
    match env::var(variable) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(StorageError::MissingCredentials {
            variable: variable.to_string(),
        }),
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9000".to_string(),
            region: Some("us-east-1".to_string()),
            path_style: Some(true),
            ssl: None,
            env_access_key: None,
            env_secret_key: None,
            access_key: None,
            secret_key: None,
        }
    }
}
