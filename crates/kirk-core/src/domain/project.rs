use std::path::{
    Path,
    PathBuf,
};
use std::sync::Arc;

use super::job::Job;

/// Project metadata shared by all the jobs of a project
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectInfo {
    pub name: String,
    pub description: String,
    pub author: String,
    pub year: i64,
    pub version: String,
    /// Slash separated folder path on the Jenkins server
    pub location: String,
    /// File the project was loaded from
    pub path: PathBuf,
}

impl ProjectInfo {
    pub fn named(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: location.into(),
            ..Self::default()
        }
    }
}

/// A collection of jobs loaded from one project file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Project {
    pub(crate) info: Arc<ProjectInfo>,
    pub(crate) jobs: Vec<Job>,
}

impl Project {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn info(&self) -> &ProjectInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn description(&self) -> &str {
        &self.info.description
    }

    pub fn author(&self) -> &str {
        &self.info.author
    }

    pub fn year(&self) -> i64 {
        self.info.year
    }

    pub fn version(&self) -> &str {
        &self.info.version
    }

    pub fn location(&self) -> &str {
        &self.info.location
    }

    pub fn path(&self) -> &Path {
        &self.info.path
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.name() == name)
    }
}
