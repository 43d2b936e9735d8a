use std::path::Path;
use std::sync::LazyLock;

use indexmap::IndexMap;
use quick_xml::escape::escape;

use super::template::FlowTemplate;
use crate::domain::{
    GitScm,
    Job,
    PerforceScm,
    ScmConfig,
    ScriptScm,
};
use crate::{
    KirkError,
    KirkResult,
};

pub const DEFAULT_GIT_CHECKOUT: &str = "master";
pub const LATEST_CHANGELIST: &str = "latest";

const GIT_SEED_XML: &str = r#"<?xml version='1.1' encoding='UTF-8'?>
<flow-definition plugin="workflow-job">
  <!-- Generics -->
  <description>KIRK_DESCRIPTION</description>
  <keepDependencies>false</keepDependencies>
  <properties>
    KIRK_PARAMETERS
  </properties>
  <!-- SCM pipeline setup -->
  <definition class="org.jenkinsci.plugins.workflow.cps.CpsScmFlowDefinition" plugin="workflow-cps">
    <scm class="hudson.plugins.git.GitSCM" plugin="git">
      <configVersion>2</configVersion>
      <userRemoteConfigs>
        <hudson.plugins.git.UserRemoteConfig>
          <url>KIRK_GIT_URL</url>
          <credentialsId>KIRK_GIT_CREDENTIAL</credentialsId>
        </hudson.plugins.git.UserRemoteConfig>
      </userRemoteConfigs>
      <branches>
        <hudson.plugins.git.BranchSpec>
          <name>KIRK_GIT_CHECKOUT</name>
        </hudson.plugins.git.BranchSpec>
      </branches>
      <doGenerateSubmoduleConfigurations>false</doGenerateSubmoduleConfigurations>
      <submoduleCfg class="list"/>
      <extensions/>
    </scm>
    <scriptPath>KIRK_SCRIPT_PATH</scriptPath>
    <lightweight>false</lightweight>
  </definition>
  <triggers/>
  <disabled>false</disabled>
</flow-definition>
"#;

const PERFORCE_SEED_XML: &str = r#"<?xml version='1.1' encoding='UTF-8'?>
<flow-definition plugin="workflow-job">
  <!-- Generics -->
  <description>KIRK_DESCRIPTION</description>
  <keepDependencies>false</keepDependencies>
  <properties>
    KIRK_PARAMETERS
  </properties>
  <!-- SCM pipeline setup -->
  <definition class="org.jenkinsci.plugins.workflow.cps.CpsScmFlowDefinition" plugin="workflow-cps">
    <scm class="org.jenkinsci.plugins.p4.PerforceScm" plugin="p4">
      <credential>KIRK_P4_CREDENTIAL</credential>
      <workspace class="org.jenkinsci.plugins.p4.workspace.ManualWorkspaceImpl">
        <charset>none</charset>
        <pinHost>false</pinHost>
        <name>KIRK_P4_WORKSPACE</name>
        <spec>
          <allwrite>false</allwrite>
          <clobber>true</clobber>
          <compress>false</compress>
          <locked>false</locked>
          <modtime>false</modtime>
          <rmdir>false</rmdir>
          <streamName>KIRK_P4_STREAM</streamName>
          <line>LOCAL</line>
          <view></view>
          <type>WRITABLE</type>
          <serverID></serverID>
          <backup>false</backup>
        </spec>
      </workspace>
      <populate class="org.jenkinsci.plugins.p4.populate.AutoCleanImpl">
        <have>true</have>
        <force>false</force>
        <modtime>false</modtime>
        <quiet>true</quiet>
        <pin>KIRK_P4_CL</pin>
        <parallel>
          <enable>false</enable>
          <threads>4</threads>
          <minfiles>1</minfiles>
          <minbytes>1024</minbytes>
        </parallel>
        <replace>true</replace>
        <delete>true</delete>
        <tidy>false</tidy>
      </populate>
    </scm>
    <scriptPath>KIRK_SCRIPT_PATH</scriptPath>
    <lightweight>true</lightweight>
  </definition>
  <triggers/>
  <disabled>false</disabled>
</flow-definition>
"#;

const SCRIPT_SEED_XML: &str = r#"<?xml version='1.1' encoding='UTF-8'?>
<flow-definition plugin="workflow-job">
  <!-- Generics -->
  <description>KIRK_DESCRIPTION</description>
  <keepDependencies>false</keepDependencies>
  <properties>
    KIRK_PARAMETERS
  </properties>
  <!-- Scripted pipeline setup -->
  <definition class="org.jenkinsci.plugins.workflow.cps.CpsFlowDefinition" plugin="workflow-cps">
    <script>KIRK_SCRIPT_CODE</script>
    <sandbox>KIRK_SCRIPT_SANDBOX</sandbox>
  </definition>
  <triggers/>
  <disabled>false</disabled>
</flow-definition>
"#;

static GIT_TEMPLATE: LazyLock<FlowTemplate> = LazyLock::new(|| {
    FlowTemplate::new(
        GIT_SEED_XML,
        &[
            "KIRK_DESCRIPTION",
            "KIRK_PARAMETERS",
            "KIRK_GIT_URL",
            "KIRK_GIT_CREDENTIAL",
            "KIRK_GIT_CHECKOUT",
            "KIRK_SCRIPT_PATH",
        ],
    )
    .expect("Invalid git flow template")
});

static PERFORCE_TEMPLATE: LazyLock<FlowTemplate> = LazyLock::new(|| {
    FlowTemplate::new(
        PERFORCE_SEED_XML,
        &[
            "KIRK_DESCRIPTION",
            "KIRK_PARAMETERS",
            "KIRK_P4_CREDENTIAL",
            "KIRK_P4_WORKSPACE",
            "KIRK_P4_STREAM",
            "KIRK_P4_CL",
            "KIRK_SCRIPT_PATH",
        ],
    )
    .expect("Invalid perforce flow template")
});

static SCRIPT_TEMPLATE: LazyLock<FlowTemplate> = LazyLock::new(|| {
    FlowTemplate::new(
        SCRIPT_SEED_XML,
        &[
            "KIRK_DESCRIPTION",
            "KIRK_PARAMETERS",
            "KIRK_SCRIPT_CODE",
            "KIRK_SCRIPT_SANDBOX",
        ],
    )
    .expect("Invalid script flow template")
});

/// The supported pipeline flows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// Jenkinsfile fetched from a Git repository
    Git,
    /// Jenkinsfile fetched from a Perforce stream
    Perforce,
    /// Pipeline script embedded in the job
    Script,
}

impl FlowKind {
    pub fn accepts(self, scm: &ScmConfig) -> bool {
        match self {
            FlowKind::Git => scm.git.is_some(),
            FlowKind::Perforce => scm.perforce.is_some(),
            FlowKind::Script => scm.script.is_some(),
        }
    }

    pub fn template(self) -> &'static FlowTemplate {
        match self {
            FlowKind::Git => &GIT_TEMPLATE,
            FlowKind::Perforce => &PERFORCE_TEMPLATE,
            FlowKind::Script => &SCRIPT_TEMPLATE,
        }
    }

    /// Values of the flow specific placeholders
    pub(super) fn values(
        self, job: &Job, scm: &ScmConfig, change_ref: &str,
    ) -> KirkResult<IndexMap<&'static str, String>> {
        match (self, scm) {
            (
                FlowKind::Git,
                ScmConfig {
                    git: Some(git), ..
                },
            ) => Ok(git_values(job, git, change_ref)),
            (
                FlowKind::Perforce,
                ScmConfig {
                    perforce: Some(perforce),
                    ..
                },
            ) => perforce_values(job, perforce, change_ref),
            (
                FlowKind::Script,
                ScmConfig {
                    script: Some(script),
                    ..
                },
            ) => script_values(script),
            _ => Err(KirkError::Configuration(format!(
                "{:?} flow does not support SCM configuration: {}",
                self, scm
            ))),
        }
    }
}

fn git_values(job: &Job, git: &GitScm, change_ref: &str) -> IndexMap<&'static str, String> {
    let checkout = if !change_ref.is_empty() {
        change_ref
    } else {
        git.checkout
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_GIT_CHECKOUT)
    };

    let mut values = IndexMap::new();
    values.insert("KIRK_GIT_URL", escape(&git.url).into_owned());
    values.insert(
        "KIRK_GIT_CREDENTIAL",
        escape(git.credential.as_deref().unwrap_or_default()).into_owned(),
    );
    values.insert("KIRK_GIT_CHECKOUT", escape(checkout).into_owned());
    values.insert("KIRK_SCRIPT_PATH", escape(job.pipeline()).into_owned());
    values
}

fn perforce_values(
    job: &Job, perforce: &PerforceScm, change_ref: &str,
) -> KirkResult<IndexMap<&'static str, String>> {
    let pin = if !change_ref.is_empty() {
        change_ref
    } else {
        perforce
            .changelist
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(LATEST_CHANGELIST)
    };

    if pin != LATEST_CHANGELIST && pin.parse::<i64>().is_err() {
        return Err(KirkError::InvalidArgument(format!(
            "'{pin}' is not a valid changelist number"
        )));
    }

    let mut values = IndexMap::new();
    values.insert("KIRK_P4_CREDENTIAL", escape(&perforce.credential).into_owned());
    values.insert("KIRK_P4_WORKSPACE", escape(&perforce.workspace).into_owned());
    values.insert("KIRK_P4_STREAM", escape(&perforce.stream).into_owned());
    values.insert("KIRK_P4_CL", pin.to_string());
    values.insert("KIRK_SCRIPT_PATH", escape(job.pipeline()).into_owned());
    Ok(values)
}

fn script_values(script: &ScriptScm) -> KirkResult<IndexMap<&'static str, String>> {
    let path = Path::new(&script.script);
    let code = std::fs::read_to_string(path).map_err(|e| KirkError::io(path, e))?;

    let mut values = IndexMap::new();
    values.insert("KIRK_SCRIPT_CODE", escape(&code).into_owned());
    values.insert("KIRK_SCRIPT_SANDBOX", script.sandbox.to_string());
    Ok(values)
}
