//! Recording job service used by the application tests

use std::collections::HashSet;
use std::sync::{
    Arc,
    Mutex,
};

use async_trait::async_trait;
use indexmap::IndexMap;

use crate::domain::{
    JobInfo,
    JobService,
    JobServiceConnector,
    PluginInfo,
    ServiceError,
    ServiceResult,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(String, String, String),
    Exists(String),
    Create(String, String),
    Reconfig(String, String),
    Build(String, IndexMap<String, String>),
    Info(String),
    Delete(String),
    WhoAmI,
    Plugins,
    Release,
}

#[derive(Default)]
pub struct ServerState {
    pub calls: Vec<Call>,
    pub jobs: HashSet<String>,
    pub plugins: Vec<String>,
    pub user: String,
    /// Operation name that fails, e.g. `build`
    pub fail_on: Option<&'static str>,
}

#[derive(Clone, Default)]
pub struct MockServer {
    state: Arc<Mutex<ServerState>>,
}

impl MockServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(jobs: &[&str]) -> Self {
        let server = Self::new();
        server.state().jobs = jobs.iter().map(|j| j.to_string()).collect();
        server
    }

    pub fn state(&self) -> std::sync::MutexGuard<'_, ServerState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn created(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Create(path, _) => Some(path),
                _ => None,
            })
            .collect()
    }

    pub fn reconfigured(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Reconfig(path, _) => Some(path),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call, operation: &str) -> ServiceResult<()> {
        let mut state = self.state();
        state.calls.push(call);
        if state.fail_on == Some(operation) {
            return Err(ServiceError::Api(format!("{operation} failed")));
        }
        Ok(())
    }
}

impl JobServiceConnector for MockServer {
    fn connect(
        &self, server_url: &str, username: &str, password: &str,
    ) -> ServiceResult<Box<dyn JobService>> {
        self.record(
            Call::Connect(
                server_url.to_string(),
                username.to_string(),
                password.to_string(),
            ),
            "connect",
        )?;
        Ok(Box::new(MockHandle {
            server: self.clone(),
        }))
    }
}

pub struct MockHandle {
    server: MockServer,
}

impl Drop for MockHandle {
    fn drop(&mut self) {
        self.server.state().calls.push(Call::Release);
    }
}

#[async_trait]
impl JobService for MockHandle {
    async fn job_exists(&self, path: &str) -> ServiceResult<bool> {
        self.server.record(Call::Exists(path.to_string()), "exists")?;
        Ok(self.server.state().jobs.contains(path))
    }

    async fn create_job(&self, path: &str, config_xml: &str) -> ServiceResult<()> {
        self.server.record(
            Call::Create(path.to_string(), config_xml.to_string()),
            "create",
        )?;
        self.server.state().jobs.insert(path.to_string());
        Ok(())
    }

    async fn reconfig_job(&self, path: &str, config_xml: &str) -> ServiceResult<()> {
        self.server.record(
            Call::Reconfig(path.to_string(), config_xml.to_string()),
            "reconfig",
        )
    }

    async fn build_job(
        &self, path: &str, parameters: &IndexMap<String, String>,
    ) -> ServiceResult<()> {
        self.server
            .record(Call::Build(path.to_string(), parameters.clone()), "build")
    }

    async fn get_job_info(&self, path: &str) -> ServiceResult<JobInfo> {
        self.server.record(Call::Info(path.to_string()), "info")?;
        let url = path
            .split('/')
            .map(|segment| format!("job/{segment}/"))
            .collect::<String>();
        Ok(JobInfo {
            name: path.rsplit('/').next().unwrap_or_default().to_string(),
            url: format!("http://localhost:8080/{url}"),
            next_build_number: 7,
        })
    }

    async fn delete_job(&self, path: &str) -> ServiceResult<()> {
        self.server.record(Call::Delete(path.to_string()), "delete")?;
        self.server.state().jobs.remove(path);
        Ok(())
    }

    async fn whoami(&self) -> ServiceResult<String> {
        self.server.record(Call::WhoAmI, "whoami")?;
        Ok(self.server.state().user.clone())
    }

    async fn plugins(&self) -> ServiceResult<Vec<PluginInfo>> {
        self.server.record(Call::Plugins, "plugins")?;
        Ok(self
            .server
            .state()
            .plugins
            .iter()
            .map(|name| PluginInfo {
                short_name: name.clone(),
                version: "1.0".to_string(),
                active: true,
            })
            .collect())
    }
}
