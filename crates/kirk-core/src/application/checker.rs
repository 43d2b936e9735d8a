//! Sanity checks of a Jenkins server before seeding jobs on it

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::workflow::prettify;
use crate::domain::{
    JobService,
    JobServiceConnector,
};
use crate::{
    KirkError,
    KirkResult,
};

/// Job created, and then removed, by the checks
pub const TEST_JOB: &str = "__kirk_delete_me";

/// `(plugin, optional)`
pub const PLUGINS: &[(&str, bool)] = &[
    ("workflow-job", false),
    ("workflow-cps", false),
    ("cloudbees-folder", false),
    ("git", true),
    ("p4", true),
];

const TEST_JOB_XML: &str = r#"<?xml version='1.1' encoding='UTF-8'?>
<flow-definition plugin="workflow-job">
  <description>Testing job for kirk check command</description>
  <keepDependencies>false</keepDependencies>
  <definition class="org.jenkinsci.plugins.workflow.cps.CpsFlowDefinition" plugin="workflow-cps">
    <script></script>
    <sandbox>true</sandbox>
  </definition>
  <triggers/>
  <disabled>false</disabled>
</flow-definition>"#;

const TEST_JOB_PARAMS_XML: &str = r#"<?xml version='1.1' encoding='UTF-8'?>
<flow-definition plugin="workflow-job">
  <description>Testing job for kirk check command</description>
  <keepDependencies>false</keepDependencies>
  <properties>
    <hudson.model.ParametersDefinitionProperty>
      <parameterDefinitions>
        <hudson.model.StringParameterDefinition>
          <name>NAME</name>
          <description>Name of the guy to greet</description>
          <defaultValue>gigi</defaultValue>
          <trim>false</trim>
        </hudson.model.StringParameterDefinition>
      </parameterDefinitions>
    </hudson.model.ParametersDefinitionProperty>
  </properties>
  <definition class="org.jenkinsci.plugins.workflow.cps.CpsFlowDefinition" plugin="workflow-cps">
    <script></script>
    <sandbox>true</sandbox>
  </definition>
  <triggers/>
  <disabled>false</disabled>
</flow-definition>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckStep {
    Connection,
    Plugins,
    JobCreate,
    JobConfig,
    JobInfo,
    JobBuild,
    JobDelete,
}

impl CheckStep {
    pub const ALL: [CheckStep; 7] = [
        CheckStep::Connection,
        CheckStep::Plugins,
        CheckStep::JobCreate,
        CheckStep::JobConfig,
        CheckStep::JobInfo,
        CheckStep::JobBuild,
        CheckStep::JobDelete,
    ];

    pub fn description(self) -> &'static str {
        match self {
            CheckStep::Connection => "connection",
            CheckStep::Plugins => "installed plugins",
            CheckStep::JobCreate => "job creation",
            CheckStep::JobConfig => "job configuration",
            CheckStep::JobInfo => "job information",
            CheckStep::JobBuild => "job build",
            CheckStep::JobDelete => "job delete",
        }
    }
}

impl fmt::Display for CheckStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub step: CheckStep,
    /// `None` when the step passed
    pub error: Option<String>,
}

impl CheckResult {
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }
}

/// Outcome of the checks, in execution order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckReport {
    pub results: Vec<CheckResult>,
}

impl CheckReport {
    pub fn passed(&self) -> bool {
        self.results.len() == CheckStep::ALL.len() && self.results.iter().all(CheckResult::passed)
    }

    pub fn failure(&self) -> Option<&CheckResult> {
        self.results.iter().find(|r| !r.passed())
    }
}

pub struct ServerChecker {
    connector: Arc<dyn JobServiceConnector>,
}

impl ServerChecker {
    pub fn new(connector: Arc<dyn JobServiceConnector>) -> Self {
        Self { connector }
    }

    /// Runs every check, stopping at the first failure.
    pub async fn check(&self, url: &str, username: &str, password: &str) -> KirkResult<CheckReport> {
        if url.is_empty() {
            return Err(KirkError::invalid_argument("url is empty"));
        }
        if username.is_empty() {
            return Err(KirkError::invalid_argument("username is empty"));
        }

        let mut report = CheckReport::default();

        let service = match self.connector.connect(url, username, password) {
            Ok(service) => service,
            Err(e) => {
                report.results.push(CheckResult {
                    step: CheckStep::Connection,
                    error: Some(e.to_string()),
                });
                return Ok(report);
            }
        };

        for step in CheckStep::ALL {
            let outcome = run_step(service.as_ref(), step, username).await;
            let error = outcome.err().map(|e| e.to_string());

            match &error {
                None => tracing::info!("Check {}: passed", step),
                Some(e) => tracing::warn!("Check {}: {}", step, e),
            }

            let failed = error.is_some();
            report.results.push(CheckResult { step, error });
            if failed {
                break;
            }
        }

        Ok(report)
    }
}

async fn run_step(service: &dyn JobService, step: CheckStep, username: &str) -> KirkResult<()> {
    match step {
        CheckStep::Connection => {
            let user = service.whoami().await?;
            if user != username {
                return Err(KirkError::Validation(format!(
                    "read username '{}' != '{}'",
                    user, username
                )));
            }
        }
        CheckStep::Plugins => {
            let installed = service.plugins().await?;
            for (name, optional) in PLUGINS {
                let found = installed.iter().any(|p| p.short_name == *name);
                if !found && !optional {
                    return Err(KirkError::Validation(format!(
                        "'{}' plugin is required",
                        name
                    )));
                }
            }
        }
        CheckStep::JobCreate => {
            service
                .create_job(TEST_JOB, &prettify(TEST_JOB_XML)?)
                .await?;
        }
        CheckStep::JobConfig => {
            service
                .reconfig_job(TEST_JOB, &prettify(TEST_JOB_PARAMS_XML)?)
                .await?;
        }
        CheckStep::JobInfo => {
            service.get_job_info(TEST_JOB).await?;
        }
        CheckStep::JobBuild => {
            let mut parameters = IndexMap::new();
            parameters.insert("NAME".to_string(), "pluto".to_string());
            service.build_job(TEST_JOB, &parameters).await?;
        }
        CheckStep::JobDelete => {
            service.delete_job(TEST_JOB).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::mock::{
        Call,
        MockServer,
    };

    fn server(user: &str, plugins: &[&str]) -> MockServer {
        let server = MockServer::new();
        {
            let mut state = server.state();
            state.user = user.to_string();
            state.plugins = plugins.iter().map(|p| p.to_string()).collect();
        }
        server
    }

    const REQUIRED: &[&str] = &["workflow-job", "workflow-cps", "cloudbees-folder"];

    #[tokio::test]
    async fn test_all_checks_pass() {
        let server = server("admin", REQUIRED);
        let checker = ServerChecker::new(Arc::new(server.clone()));

        let report = checker
            .check("http://localhost:8080", "admin", "pwd")
            .await
            .unwrap();

        assert!(report.passed());
        assert_eq!(report.results.len(), CheckStep::ALL.len());
        assert!(server.calls().contains(&Call::Delete(TEST_JOB.to_string())));
        assert!(server.state().jobs.is_empty());
        assert_eq!(server.calls().last(), Some(&Call::Release));
    }

    #[tokio::test]
    async fn test_wrong_user() {
        let server = server("someone", REQUIRED);
        let checker = ServerChecker::new(Arc::new(server.clone()));

        let report = checker
            .check("http://localhost:8080", "admin", "pwd")
            .await
            .unwrap();

        assert!(!report.passed());
        assert_eq!(report.results.len(), 1);
        assert_eq!(report.failure().unwrap().step, CheckStep::Connection);
    }

    #[tokio::test]
    async fn test_missing_required_plugin() {
        let server = server("admin", &["workflow-job", "git"]);
        let checker = ServerChecker::new(Arc::new(server.clone()));

        let report = checker
            .check("http://localhost:8080", "admin", "pwd")
            .await
            .unwrap();

        let failure = report.failure().unwrap();
        assert_eq!(failure.step, CheckStep::Plugins);
        assert_eq!(
            failure.error.as_deref(),
            Some("Validation error: 'workflow-cps' plugin is required")
        );
        assert!(server.created().is_empty());
    }

    #[tokio::test]
    async fn test_stops_at_first_failure() {
        let server = server("admin", REQUIRED);
        server.state().fail_on = Some("build");
        let checker = ServerChecker::new(Arc::new(server.clone()));

        let report = checker
            .check("http://localhost:8080", "admin", "pwd")
            .await
            .unwrap();

        assert_eq!(report.failure().unwrap().step, CheckStep::JobBuild);
        assert!(!server.calls().contains(&Call::Delete(TEST_JOB.to_string())));
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let server = server("admin", REQUIRED);
        server.state().fail_on = Some("connect");
        let checker = ServerChecker::new(Arc::new(server));

        let report = checker
            .check("http://localhost:8080", "admin", "pwd")
            .await
            .unwrap();

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.failure().unwrap().step, CheckStep::Connection);
    }

    #[tokio::test]
    async fn test_invalid_args() {
        let checker = ServerChecker::new(Arc::new(MockServer::new()));
        assert!(matches!(
            checker.check("", "admin", "pwd").await,
            Err(KirkError::InvalidArgument(_))
        ));
    }
}
