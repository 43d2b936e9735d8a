use std::time::Duration;

use kirk_core::{
    JobService,
    JobServiceConnector,
    ServiceError,
    ServiceResult,
};
use reqwest::header::{
    HeaderMap,
    HeaderValue,
    AUTHORIZATION,
};
use reqwest::Client;

use crate::client::JenkinsClient;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Installs the ring crypto provider unless one is already installed
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// HTTP client sending basic authentication on every request
pub(crate) fn http_client(username: &str, password: &str) -> ServiceResult<Client> {
    install_crypto_provider();

    let auth_value = format!("{username}:{password}");
    let auth_header = format!(
        "Basic {}",
        base64::Engine::encode(
            &base64::engine::general_purpose::STANDARD,
            auth_value.as_bytes()
        )
    );

    let mut auth = HeaderValue::from_str(&auth_header)
        .map_err(|e| ServiceError::Authentication(format!("Invalid auth format: {e}")))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);

    Client::builder()
        .default_headers(headers)
        // crumbs are bound to the session cookie
        .cookie_store(true)
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| ServiceError::Network(format!("Failed to build HTTP client: {e}")))
}

/// Opens [`JenkinsClient`]s
#[derive(Debug, Clone, Default)]
pub struct JenkinsConnector;

impl JenkinsConnector {
    pub fn new() -> Self {
        Self
    }
}

impl JobServiceConnector for JenkinsConnector {
    fn connect(
        &self, server_url: &str, username: &str, password: &str,
    ) -> ServiceResult<Box<dyn JobService>> {
        if server_url.is_empty() {
            return Err(ServiceError::Network("Missing server url".to_string()));
        }

        let client = http_client(username, password)?;
        Ok(Box::new(JenkinsClient::new(client, server_url)))
    }
}
