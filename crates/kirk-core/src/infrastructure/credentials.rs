use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::{
    Path,
    PathBuf,
};
use std::sync::RwLock;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    KirkError,
    KirkResult,
};

/// Secret storage keyed by server URL and user name
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get_password(&self, server_url: &str, username: &str) -> KirkResult<String>;

    async fn set_password(&self, server_url: &str, username: &str, secret: &str) -> KirkResult<()>;
}

fn check_key(server_url: &str, username: &str) -> KirkResult<()> {
    if server_url.is_empty() {
        return Err(KirkError::invalid_argument("server url is empty"));
    }
    if username.is_empty() {
        return Err(KirkError::invalid_argument("username is empty"));
    }
    Ok(())
}

fn not_found(server_url: &str, username: &str) -> KirkError {
    KirkError::Credential(format!(
        "No password stored for '{}' on '{}'",
        username, server_url
    ))
}

pub struct MemoryCredentialStore {
    secrets: RwLock<HashMap<(String, String), String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            secrets: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_password(server_url: &str, username: &str, secret: &str) -> Self {
        let store = Self::new();
        if let Ok(mut secrets) = store.secrets.write() {
            secrets.insert(
                (server_url.to_string(), username.to_string()),
                secret.to_string(),
            );
        }
        store
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn get_password(&self, server_url: &str, username: &str) -> KirkResult<String> {
        check_key(server_url, username)?;
        let secrets = self
            .secrets
            .read()
            .map_err(|e| KirkError::Credential(format!("Lock poisoned: {}", e)))?;
        secrets
            .get(&(server_url.to_string(), username.to_string()))
            .cloned()
            .ok_or_else(|| not_found(server_url, username))
    }

    async fn set_password(&self, server_url: &str, username: &str, secret: &str) -> KirkResult<()> {
        check_key(server_url, username)?;
        let mut secrets = self
            .secrets
            .write()
            .map_err(|e| KirkError::Credential(format!("Lock poisoned: {}", e)))?;
        secrets.insert(
            (server_url.to_string(), username.to_string()),
            secret.to_string(),
        );
        Ok(())
    }
}

type CredentialTable = BTreeMap<String, BTreeMap<String, String>>;

/// Plaintext TOML credential file.
///
/// ```toml
/// ["http://localhost:8080"]
/// admin = "secret"
/// ```
pub struct FileCredentialStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_table(&self) -> KirkResult<CredentialTable> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                KirkError::Credential(format!(
                    "Failed to parse '{}': {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(CredentialTable::new()),
            Err(e) => Err(KirkError::Credential(format!(
                "Failed to read '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn write_table(&self, table: &CredentialTable) -> KirkResult<()> {
        let content = toml::to_string(table)
            .map_err(|e| KirkError::Credential(format!("Failed to serialize credentials: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                KirkError::Credential(format!("Failed to create '{}': {}", parent.display(), e))
            })?;
        }

        tokio::fs::write(&self.path, content).await.map_err(|e| {
            KirkError::Credential(format!(
                "Failed to write '{}': {}",
                self.path.display(),
                e
            ))
        })
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn get_password(&self, server_url: &str, username: &str) -> KirkResult<String> {
        check_key(server_url, username)?;
        let _guard = self.lock.lock().await;

        let table = self.read_table().await?;
        table
            .get(server_url)
            .and_then(|users| users.get(username))
            .cloned()
            .ok_or_else(|| not_found(server_url, username))
    }

    async fn set_password(&self, server_url: &str, username: &str, secret: &str) -> KirkResult<()> {
        check_key(server_url, username)?;
        let _guard = self.lock.lock().await;

        let mut table = self.read_table().await?;
        table
            .entry(server_url.to_string())
            .or_default()
            .insert(username.to_string(), secret.to_string());
        self.write_table(&table).await?;

        tracing::info!(server = server_url, user = username, "Stored credential");
        Ok(())
    }
}
