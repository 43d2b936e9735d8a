//! Jenkins API client and methods

use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use kirk_core::{
    JobInfo,
    JobService,
    PluginInfo,
    ServiceError,
    ServiceResult,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{
    Client,
    RequestBuilder,
    Response,
    StatusCode,
};
use serde::de::DeserializeOwned;
use tokio::sync::OnceCell;

use crate::{
    config,
    types,
};

const MAX_ATTEMPTS: u32 = 3;
const ERROR_PREVIEW_LEN: usize = 300;

/// Jenkins API client with retry logic
pub struct JenkinsClient {
    client: Client,
    server_url: String,
    crumb: OnceCell<Option<types::Crumb>>,
}

impl JenkinsClient {
    pub fn new(client: Client, server_url: &str) -> Self {
        Self {
            client,
            server_url: server_url.trim_end_matches('/').to_string(),
            crumb: OnceCell::new(),
        }
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn job_url(&self, path: &str) -> String {
        let encoded = config::encode_job_path(path);
        if encoded.is_empty() {
            self.server_url.clone()
        } else {
            format!("{}/{}", self.server_url, encoded)
        }
    }

    /// Retries a request operation with exponential backoff
    async fn retry_request<F, Fut, T>(&self, operation: F) -> ServiceResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ServiceResult<T>>,
    {
        let mut delay = Duration::from_millis(50);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e @ (ServiceError::Network(_) | ServiceError::Api(_)))
                    if attempt < MAX_ATTEMPTS =>
                {
                    tracing::debug!("Retry attempt {} after error: {}", attempt, e);
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, context: &str) -> ServiceResult<T> {
        self.retry_request(|| async {
            let response = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| ServiceError::Network(format!("{context}: {e}")))?;

            check_status(response, context)
                .await?
                .json::<T>()
                .await
                .map_err(|e| ServiceError::Serialization(format!("{context}: {e}")))
        })
        .await
    }

    /// CSRF crumb, fetched once. `None` when the server does not issue one.
    async fn crumb(&self) -> ServiceResult<Option<types::Crumb>> {
        self.crumb
            .get_or_try_init(|| async {
                let url = format!("{}/crumbIssuer/api/json", self.server_url);
                match self
                    .get_json::<types::Crumb>(&url, "Failed to fetch crumb")
                    .await
                {
                    Ok(crumb) => Ok(Some(crumb)),
                    Err(ServiceError::NotFound(_)) => {
                        tracing::debug!("No crumb issuer on {}", self.server_url);
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            })
            .await
            .cloned()
    }

    async fn post(&self, url: &str) -> ServiceResult<RequestBuilder> {
        let mut request = self.client.post(url);
        if let Some(crumb) = self.crumb().await? {
            request = request.header(crumb.crumb_request_field.as_str(), crumb.crumb.as_str());
        }
        Ok(request)
    }

    async fn send(&self, request: RequestBuilder, context: &str) -> ServiceResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Network(format!("{context}: {e}")))?;
        check_status(response, context).await
    }

    async fn post_xml(&self, url: &str, config_xml: &str, context: &str) -> ServiceResult<()> {
        let request = self
            .post(url)
            .await?
            .header(CONTENT_TYPE, "application/xml; charset=utf-8")
            .body(config_xml.to_string());
        self.send(request, context).await?;
        Ok(())
    }
}

async fn check_status(response: Response, context: &str) -> ServiceResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    Err(status_error(status, context, &error_text))
}

fn status_error(status: StatusCode, context: &str, error_text: &str) -> ServiceError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ServiceError::Authentication(format!("{context}: HTTP {status}"))
        }
        StatusCode::NOT_FOUND => ServiceError::NotFound(context.to_string()),
        _ if error_text.contains("<!DOCTYPE html>") || error_text.contains("<html") => {
            ServiceError::Api(format!(
                "{context}: Jenkins returned HTTP {status}. Check Jenkins logs for details"
            ))
        }
        _ => {
            let preview: String = error_text.chars().take(ERROR_PREVIEW_LEN).collect();
            ServiceError::Api(format!("{context}: HTTP {status}: {preview}"))
        }
    }
}

#[async_trait]
impl JobService for JenkinsClient {
    async fn job_exists(&self, path: &str) -> ServiceResult<bool> {
        let url = format!("{}/api/json?tree=name", self.job_url(path));
        match self
            .get_json::<serde_json::Value>(&url, &format!("Failed to fetch '{path}'"))
            .await
        {
            Ok(_) => Ok(true),
            Err(ServiceError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_job(&self, path: &str, config_xml: &str) -> ServiceResult<()> {
        let (parent, name) = config::split_job_path(path);
        if name.is_empty() {
            return Err(ServiceError::Api("Cannot create a job without name".to_string()));
        }

        let url = format!(
            "{}/createItem?name={}",
            self.job_url(parent),
            urlencoding::encode(name)
        );
        tracing::debug!("Creating job '{}'", path);
        self.post_xml(&url, config_xml, &format!("Failed to create '{path}'"))
            .await
    }

    async fn reconfig_job(&self, path: &str, config_xml: &str) -> ServiceResult<()> {
        let url = format!("{}/config.xml", self.job_url(path));
        tracing::debug!("Reconfiguring job '{}'", path);
        self.post_xml(&url, config_xml, &format!("Failed to reconfigure '{path}'"))
            .await
    }

    async fn build_job(
        &self, path: &str, parameters: &IndexMap<String, String>,
    ) -> ServiceResult<()> {
        let url = if parameters.is_empty() {
            format!("{}/build", self.job_url(path))
        } else {
            format!("{}/buildWithParameters", self.job_url(path))
        };

        let form: Vec<(&str, &str)> = parameters
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let request = self.post(&url).await?.form(&form);
        self.send(request, &format!("Failed to trigger build of '{path}'"))
            .await?;
        Ok(())
    }

    async fn get_job_info(&self, path: &str) -> ServiceResult<JobInfo> {
        let url = format!("{}/api/json", self.job_url(path));
        self.get_json(&url, &format!("Failed to fetch '{path}' info"))
            .await
    }

    async fn delete_job(&self, path: &str) -> ServiceResult<()> {
        let url = format!("{}/doDelete", self.job_url(path));
        let request = self.post(&url).await?;
        self.send(request, &format!("Failed to delete '{path}'"))
            .await?;
        Ok(())
    }

    async fn whoami(&self) -> ServiceResult<String> {
        let url = format!("{}/me/api/json", self.server_url);
        let me: types::WhoAmI = self.get_json(&url, "Failed to fetch user").await?;
        Ok(me.full_name)
    }

    async fn plugins(&self) -> ServiceResult<Vec<PluginInfo>> {
        let url = format!("{}/pluginManager/api/json?depth=1", self.server_url);
        let response: types::PluginsResponse =
            self.get_json(&url, "Failed to fetch plugins").await?;
        Ok(response.plugins)
    }
}
