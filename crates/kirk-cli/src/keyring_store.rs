use std::sync::Arc;

use async_trait::async_trait;
use keyring::Entry;
use kirk_core::{
    CredentialStore,
    KirkError,
    KirkResult,
};
use tokio::sync::Mutex;

const SERVICE_NAME: &str = "kirk";

/// Credentials stored in the operating system keyring, one entry per
/// `<user>@<server>`
pub struct KeyringCredentialStore {
    keyring_lock: Arc<Mutex<()>>,
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self {
            keyring_lock: Arc::new(Mutex::new(())),
        }
    }

    fn keyring_entry(&self, server_url: &str, username: &str) -> KirkResult<Entry> {
        if server_url.is_empty() {
            return Err(KirkError::invalid_argument("server url is empty"));
        }
        if username.is_empty() {
            return Err(KirkError::invalid_argument("username is empty"));
        }

        Entry::new(SERVICE_NAME, &entry_user(server_url, username))
            .map_err(|e| KirkError::Credential(format!("Failed to create keyring entry: {e}")))
    }
}

fn entry_user(server_url: &str, username: &str) -> String {
    format!("{username}@{server_url}")
}

#[async_trait]
impl CredentialStore for KeyringCredentialStore {
    async fn get_password(&self, server_url: &str, username: &str) -> KirkResult<String> {
        let _lock = self.keyring_lock.lock().await;
        let entry = self.keyring_entry(server_url, username)?;

        match entry.get_password() {
            Ok(secret) => Ok(secret),
            Err(keyring::Error::NoEntry) => Err(KirkError::Credential(format!(
                "No password stored for '{}' on '{}'",
                username, server_url
            ))),
            Err(e) => Err(KirkError::Credential(format!(
                "Failed to get password from keyring: {e}"
            ))),
        }
    }

    async fn set_password(&self, server_url: &str, username: &str, secret: &str) -> KirkResult<()> {
        let _lock = self.keyring_lock.lock().await;
        let entry = self.keyring_entry(server_url, username)?;

        entry.set_password(secret).map_err(|e| {
            KirkError::Credential(format!(
                "Failed to store password in system keyring: {}\n\
                 \nPlease ensure:\n\
                 - macOS: Grant Keychain Access permission to kirk\n\
                 - Linux: Install libsecret and run a secret service\n\
                 - Windows: Ensure Credential Manager is accessible",
                e
            ))
        })?;

        tracing::debug!("Stored password of '{}' for '{}'", username, server_url);
        Ok(())
    }
}
