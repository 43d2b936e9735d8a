pub mod job;
pub mod parameter;
pub mod project;
pub mod scm;
pub mod service;
pub mod token;

pub use job::Job;
pub use parameter::Parameter;
pub use project::{
    Project,
    ProjectInfo,
};
pub use scm::{
    GitScm,
    PerforceScm,
    ScmConfig,
    ScriptScm,
};
pub use service::{
    JobInfo,
    JobService,
    JobServiceConnector,
    PluginInfo,
    ServiceError,
    ServiceResult,
};
pub use token::JobToken;
