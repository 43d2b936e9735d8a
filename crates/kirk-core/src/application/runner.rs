use std::sync::Arc;

use indexmap::IndexMap;

use super::workflow::{
    WorkflowBuilder,
    EMPTY_FOLDER_XML,
    VERSION_PARAMETER,
};
use crate::domain::{
    Job,
    JobService,
    JobServiceConnector,
};
use crate::infrastructure::settings::DEFAULT_DEV_FOLDER;
use crate::infrastructure::CredentialStore;
use crate::{
    KirkError,
    KirkResult,
};

/// Options of a single job run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    /// Developer running the job. When empty the job runs in the project
    /// location.
    pub user: String,
    pub dev_folder: String,
    /// Source revision passed to the workflow builder
    pub change_id: String,
}

impl Default for RunRequest {
    fn default() -> Self {
        Self {
            user: String::new(),
            dev_folder: DEFAULT_DEV_FOLDER.to_string(),
            change_id: String::new(),
        }
    }
}

impl RunRequest {
    pub fn for_user(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            ..Self::default()
        }
    }

    pub fn with_dev_folder(mut self, dev_folder: impl Into<String>) -> Self {
        self.dev_folder = dev_folder.into();
        self
    }

    pub fn with_change_id(mut self, change_id: impl Into<String>) -> Self {
        self.change_id = change_id.into();
        self
    }
}

/// Folder hosting the seed job: the project location, or
/// `<location>/<dev_folder>/<user>` for a developer run.
pub fn seed_location(job: &Job, request: &RunRequest) -> KirkResult<String> {
    let location = job.project().location.trim_matches('/');

    if request.user.is_empty() {
        return Ok(location.to_string());
    }

    if request.dev_folder.is_empty() {
        return Err(KirkError::invalid_argument("dev folder is empty"));
    }

    Ok([location, request.dev_folder.as_str(), request.user.as_str()]
        .iter()
        .filter(|segment| !segment.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("/"))
}

/// Seeds jobs on their server and triggers them.
///
/// Every remote call is made as `owner`; the requesting user only selects
/// the folder.
pub struct JobRunner {
    credentials: Arc<dyn CredentialStore>,
    connector: Arc<dyn JobServiceConnector>,
    owner: String,
    builder: WorkflowBuilder,
}

impl JobRunner {
    pub fn new(
        credentials: Arc<dyn CredentialStore>, connector: Arc<dyn JobServiceConnector>,
        owner: impl Into<String>,
    ) -> KirkResult<Self> {
        let owner = owner.into();
        if owner.is_empty() {
            return Err(KirkError::invalid_argument("owner is empty"));
        }

        Ok(Self {
            credentials,
            connector,
            owner,
            builder: WorkflowBuilder::new(),
        })
    }

    pub fn with_builder(mut self, builder: WorkflowBuilder) -> Self {
        self.builder = builder;
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Seeds `job` and triggers a build of it.
    ///
    /// Returns the URL of the triggered build.
    pub async fn run(&self, job: &Job, request: &RunRequest) -> KirkResult<String> {
        let location = seed_location(job, request)?;

        let password = self
            .credentials
            .get_password(job.server(), &self.owner)
            .await?;

        tracing::info!("Connecting to '{}' as '{}'", job.server(), self.owner);
        let service = self
            .connector
            .connect(job.server(), &self.owner, &password)?;

        self.run_on(service.as_ref(), job, request, &location).await
    }

    async fn run_on(
        &self, service: &dyn JobService, job: &Job, request: &RunRequest, location: &str,
    ) -> KirkResult<String> {
        self.setup_folder(service, location).await?;

        let xml = self.builder.build_xml(job, &request.change_id)?;
        let seed = if location.is_empty() {
            job.name().to_string()
        } else {
            format!("{}/{}", location, job.name())
        };

        if service.job_exists(&seed).await? {
            tracing::info!("Reconfiguring '{}'", seed);
            service.reconfig_job(&seed, &xml).await?;
        } else {
            tracing::info!("Creating '{}'", seed);
            service.create_job(&seed, &xml).await?;
        }

        let mut parameters = IndexMap::new();
        parameters.insert(VERSION_PARAMETER.to_string(), crate::VERSION.to_string());
        parameters.extend(job.parameter_values());

        tracing::info!(job = %job.token(), "Building '{}'", seed);
        service.build_job(&seed, &parameters).await?;

        let info = service.get_job_info(&seed).await?;
        Ok(info.next_build_url())
    }

    /// Creates every missing folder of `location`, parents first
    async fn setup_folder(&self, service: &dyn JobService, location: &str) -> KirkResult<()> {
        let mut prefix = String::new();

        for folder in location.split('/').filter(|f| !f.is_empty()) {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(folder);

            if !service.job_exists(&prefix).await? {
                tracing::debug!("Creating folder '{}'", prefix);
                service.create_job(&prefix, EMPTY_FOLDER_XML).await?;
            }
        }

        Ok(())
    }
}
