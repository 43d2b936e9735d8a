use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use super::{
    schema,
    yaml_env,
};
use crate::domain::scm::scalar_to_string;
use crate::domain::{
    Job,
    Parameter,
    Project,
    ProjectInfo,
    ScmConfig,
};
use crate::{
    KirkError,
    KirkResult,
};

#[derive(Debug, Deserialize)]
struct ProjectFile {
    name: String,
    description: String,
    author: String,
    year: i64,
    #[serde(deserialize_with = "scalar_to_string")]
    version: String,
    location: String,
    defaults: DefaultsSection,
    jobs: Vec<JobSection>,
}

#[derive(Debug, Deserialize)]
struct DefaultsSection {
    server: String,
    #[serde(default)]
    scm: Option<ScmConfig>,
    #[serde(default)]
    parameters: Vec<ParameterSection>,
}

#[derive(Debug, Deserialize)]
struct JobSection {
    name: String,
    #[serde(default)]
    pipeline: Option<String>,
    #[serde(default)]
    server: Option<String>,
    #[serde(default)]
    scm: Option<ScmConfig>,
    #[serde(default)]
    parameters: Vec<ParameterSection>,
    #[serde(default)]
    depends: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ParameterSection {
    name: String,
    label: String,
    #[serde(default, deserialize_with = "scalar_to_string")]
    default: String,
    #[serde(default = "default_show")]
    show: bool,
}

fn default_show() -> bool {
    true
}

impl From<&ParameterSection> for Parameter {
    fn from(section: &ParameterSection) -> Self {
        Parameter::new(
            section.name.as_str(),
            section.label.as_str(),
            section.default.as_str(),
            section.show,
        )
    }
}

/// Job-level parameters first, in declared order, then every default
/// whose name is not declared by the job.
fn merge_parameters(
    job_params: &[ParameterSection], default_params: &[ParameterSection],
) -> Vec<Parameter> {
    let mut merged: Vec<Parameter> = Vec::with_capacity(job_params.len() + default_params.len());

    for section in job_params.iter().chain(default_params) {
        if merged.iter().all(|p| p.name() != section.name) {
            merged.push(Parameter::from(section));
        }
    }

    merged
}

impl Project {
    /// Loads a project file, replacing the current content of the project.
    pub fn load(&mut self, path: &Path) -> KirkResult<()> {
        let document = yaml_env::load(path)?;
        schema::validate_project(&document)?;

        let file: ProjectFile = serde_yaml::from_value(document).map_err(|e| {
            KirkError::Validation(format!("Invalid project '{}': {}", path.display(), e))
        })?;

        let info = Arc::new(ProjectInfo {
            name: file.name,
            description: file.description,
            author: file.author,
            year: file.year,
            version: file.version,
            location: file.location,
            path: path.to_path_buf(),
        });

        let mut names = HashSet::new();
        let mut jobs = Vec::with_capacity(file.jobs.len());

        for section in file.jobs {
            if !names.insert(section.name.clone()) {
                return Err(KirkError::Conflict(format!(
                    "Two jobs with the same name '{}' for project '{}'",
                    section.name, info.name
                )));
            }

            let parameters = merge_parameters(&section.parameters, &file.defaults.parameters);
            let server = section
                .server
                .unwrap_or_else(|| file.defaults.server.clone());
            let scm = section.scm.or_else(|| file.defaults.scm.clone());

            jobs.push(
                Job::new(section.name, server, Arc::clone(&info))
                    .with_pipeline(section.pipeline.unwrap_or_default())
                    .with_scm(scm)
                    .with_dependences(section.depends)
                    .with_parameters(parameters),
            );
        }

        tracing::debug!(
            project = %info.name,
            jobs = jobs.len(),
            "Loaded project from {}",
            path.display()
        );

        self.info = info;
        self.jobs = jobs;
        Ok(())
    }

    pub fn from_file(path: &Path) -> KirkResult<Self> {
        let mut project = Project::new();
        project.load(path)?;
        Ok(project)
    }
}
