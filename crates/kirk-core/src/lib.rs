pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;

pub use application::{
    JobRunner,
    RunRequest,
    ServerChecker,
    WorkflowBuilder,
};
pub use domain::{
    Job,
    JobInfo,
    JobService,
    JobServiceConnector,
    JobToken,
    Parameter,
    PluginInfo,
    Project,
    ProjectInfo,
    ScmConfig,
    ServiceError,
    ServiceResult,
};
pub use error::{
    KirkError,
    KirkResult,
};
pub use infrastructure::{
    CredentialStore,
    FileCredentialStore,
    MemoryCredentialStore,
    Settings,
    SettingsLoader,
};

/// Version injected as `KIRK_VERSION` in every seed job
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
