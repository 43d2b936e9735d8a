use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::parameter::Parameter;
use super::project::ProjectInfo;
use super::scm::ScmConfig;
use super::token;

/// A pipeline definition that becomes a seed job on the server
#[derive(Debug, Clone, PartialEq)]
pub struct Job {
    name: String,
    server: String,
    pipeline: String,
    scm: Option<ScmConfig>,
    dependences: Vec<String>,
    parameters: Vec<Parameter>,
    project: Arc<ProjectInfo>,
}

impl Job {
    pub fn new(name: impl Into<String>, server: impl Into<String>, project: Arc<ProjectInfo>) -> Self {
        Self {
            name: name.into(),
            server: server.into(),
            pipeline: String::new(),
            scm: None,
            dependences: Vec::new(),
            parameters: Vec::new(),
            project,
        }
    }

    pub fn with_pipeline(mut self, pipeline: impl Into<String>) -> Self {
        self.pipeline = pipeline.into();
        self
    }

    pub fn with_scm(mut self, scm: Option<ScmConfig>) -> Self {
        self.scm = scm;
        self
    }

    pub fn with_dependences(mut self, dependences: Vec<String>) -> Self {
        self.dependences = dependences;
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<Parameter>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Jenkins server URL
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Pipeline script location
    pub fn pipeline(&self) -> &str {
        &self.pipeline
    }

    pub fn scm(&self) -> Option<&ScmConfig> {
        self.scm.as_ref()
    }

    /// Jobs this job depends on. Informational only.
    pub fn dependences(&self) -> &[String] {
        &self.dependences
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameters_mut(&mut self) -> &mut [Parameter] {
        &mut self.parameters
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name() == name)
    }

    pub fn project(&self) -> &ProjectInfo {
        &self.project
    }

    /// `project::job`, without parameters
    pub fn token(&self) -> String {
        format!("{}::{}", self.project.name, self.name)
    }

    /// `project::job[...]` with the current value of the visible parameters
    pub fn token_with_params(&self) -> String {
        let visible: IndexMap<String, String> = self
            .parameters
            .iter()
            .filter(|p| p.show())
            .map(|p| (p.name().to_string(), p.value().to_string()))
            .collect();

        token::encode(&self.project.name, &self.name, &visible).unwrap_or_else(|_| self.token())
    }

    /// Current parameter values, in declaration order
    pub fn parameter_values(&self) -> IndexMap<String, String> {
        self.parameters
            .iter()
            .map(|p| (p.name().to_string(), p.value().to_string()))
            .collect()
    }

    /// Sets the value of every parameter named in `overrides`.
    ///
    /// Returns the names that do not belong to this job.
    pub fn apply_overrides(&mut self, overrides: &IndexMap<String, String>) -> Vec<String> {
        let mut unknown = Vec::new();
        for (name, value) in overrides {
            match self.parameters.iter_mut().find(|p| p.name() == name) {
                Some(param) => param.set_value(value),
                None => unknown.push(name.clone()),
            }
        }
        unknown
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}
