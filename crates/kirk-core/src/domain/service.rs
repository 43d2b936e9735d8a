//! Contracts of the remote job-management service

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

/// Errors reported by a remote job service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Serialization(err.to_string())
    }
}

/// Job information reported by the server
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(rename = "nextBuildNumber", default)]
    pub next_build_number: u64,
}

impl JobInfo {
    /// URL of the build that will get `next_build_number`
    pub fn next_build_url(&self) -> String {
        if self.url.ends_with('/') {
            format!("{}{}", self.url, self.next_build_number)
        } else {
            format!("{}/{}", self.url, self.next_build_number)
        }
    }
}

/// An installed server plugin
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginInfo {
    #[serde(rename = "shortName")]
    pub short_name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub active: bool,
}

/// Remote job-management service.
///
/// Paths are slash separated folder paths, e.g. `myProject/dev/admin/job`.
#[async_trait]
pub trait JobService: Send + Sync {
    async fn job_exists(&self, path: &str) -> ServiceResult<bool>;

    async fn create_job(&self, path: &str, config_xml: &str) -> ServiceResult<()>;

    async fn reconfig_job(&self, path: &str, config_xml: &str) -> ServiceResult<()>;

    async fn build_job(&self, path: &str, parameters: &IndexMap<String, String>) -> ServiceResult<()>;

    async fn get_job_info(&self, path: &str) -> ServiceResult<JobInfo>;

    async fn delete_job(&self, path: &str) -> ServiceResult<()>;

    /// Full name of the authenticated user
    async fn whoami(&self) -> ServiceResult<String>;

    async fn plugins(&self) -> ServiceResult<Vec<PluginInfo>> {
        Ok(Vec::new())
    }
}

/// Opens authenticated [`JobService`] handles.
///
/// A handle lives as long as the returned box; dropping it releases the
/// connection.
pub trait JobServiceConnector: Send + Sync {
    fn connect(
        &self, server_url: &str, username: &str, password: &str,
    ) -> ServiceResult<Box<dyn JobService>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_build_url() {
        let info = JobInfo {
            name: "test_name0".to_string(),
            url: "http://localhost:8080/job/myProject/job/test_name0/".to_string(),
            next_build_number: 7,
        };
        assert_eq!(
            info.next_build_url(),
            "http://localhost:8080/job/myProject/job/test_name0/7"
        );

        let info = JobInfo {
            url: "http://localhost:8080/job/x".to_string(),
            next_build_number: 1,
            ..JobInfo::default()
        };
        assert_eq!(info.next_build_url(), "http://localhost:8080/job/x/1");
    }

    #[test]
    fn test_job_info_from_json() {
        let info: JobInfo = serde_json::from_str(
            r#"{"name":"a","url":"http://h/job/a/","nextBuildNumber":3,"buildable":true}"#,
        )
        .unwrap();
        assert_eq!(info.next_build_number, 3);
        assert_eq!(info.url, "http://h/job/a/");
    }
}
