//! Jenkins pipeline XML generation.
//!
//! A [`WorkflowBuilder`] holds an ordered list of [`FlowKind`]s; the first
//! flow accepting the job SCM configuration renders the seed job document.

mod flows;
mod pretty;
mod template;

use quick_xml::escape::escape;

pub use flows::{
    FlowKind,
    DEFAULT_GIT_CHECKOUT,
    LATEST_CHANGELIST,
};
pub use pretty::prettify;
pub use template::FlowTemplate;

use crate::domain::Job;
use crate::{
    KirkError,
    KirkResult,
};

/// Parameter always injected in the seed jobs
pub const VERSION_PARAMETER: &str = "KIRK_VERSION";
const VERSION_LABEL: &str = "Kirk version";

/// Configuration of an empty folder
pub const EMPTY_FOLDER_XML: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<com.cloudbees.hudson.plugins.folder.Folder plugin="cloudbees-folder@6.1.0">
  <actions/>
  <description></description>
  <properties/>
  <folderViews/>
  <healthMetrics/>
</com.cloudbees.hudson.plugins.folder.Folder>"#;

#[derive(Debug, Clone)]
pub struct WorkflowBuilder {
    flows: Vec<FlowKind>,
}

impl Default for WorkflowBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowBuilder {
    pub fn new() -> Self {
        Self::with_flows(vec![FlowKind::Git, FlowKind::Perforce, FlowKind::Script])
    }

    pub fn with_flows(flows: Vec<FlowKind>) -> Self {
        Self { flows }
    }

    pub fn flows(&self) -> &[FlowKind] {
        &self.flows
    }

    /// The first flow accepting the job SCM configuration
    pub fn select(&self, job: &Job) -> Option<FlowKind> {
        let scm = job.scm()?;
        self.flows.iter().copied().find(|flow| flow.accepts(scm))
    }

    /// Converts `job` into a Jenkins seed job configuration.
    ///
    /// `change_ref` selects the source revision: a branch or commit for Git,
    /// a changelist number for Perforce. It is ignored by script flows.
    pub fn build_xml(&self, job: &Job, change_ref: &str) -> KirkResult<String> {
        let (flow, scm) = match (self.select(job), job.scm()) {
            (Some(flow), Some(scm)) => (flow, scm),
            (_, scm) => {
                return Err(KirkError::Configuration(format!(
                    "Unsupported SCM configuration for '{}': {}",
                    job.token(),
                    scm.map(ToString::to_string)
                        .unwrap_or_else(|| "<none>".to_string())
                )));
            }
        };

        let mut values = flow.values(job, scm, change_ref)?;
        values.insert("KIRK_DESCRIPTION", description());
        values.insert("KIRK_PARAMETERS", parameters_xml(job, crate::VERSION));

        let xml = flow.template().render(&values)?;

        tracing::debug!(job = %job.token(), flow = ?flow, "Generated seed XML");

        prettify(&xml)
    }
}

fn description() -> String {
    format!(
        "Created by kirk in date {}",
        chrono::Local::now().format("%Y-%m-%d")
    )
}

fn parameter_xml(name: &str, label: &str, value: &str) -> String {
    format!(
        "<hudson.model.StringParameterDefinition>\
         <name>{}</name>\
         <description>{}</description>\
         <defaultValue>{}</defaultValue>\
         <trim>false</trim>\
         </hudson.model.StringParameterDefinition>",
        escape(name),
        escape(label),
        escape(value)
    )
}

/// The `ParametersDefinitionProperty` block of a job.
///
/// The version parameter comes first, followed by the job parameters with
/// their current values.
pub fn parameters_xml(job: &Job, version: &str) -> String {
    let mut xml = String::from(
        "<hudson.model.ParametersDefinitionProperty><parameterDefinitions>",
    );

    xml.push_str(&parameter_xml(VERSION_PARAMETER, VERSION_LABEL, version));
    for param in job.parameters() {
        xml.push_str(&parameter_xml(param.name(), param.label(), param.value()));
    }

    xml.push_str("</parameterDefinitions></hudson.model.ParametersDefinitionProperty>");
    xml
}
