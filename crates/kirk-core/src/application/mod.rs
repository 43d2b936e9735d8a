pub mod checker;
pub mod registry;
pub mod runner;
pub mod workflow;

#[cfg(test)]
pub(crate) mod mock;

pub use checker::{
    CheckReport,
    CheckResult,
    CheckStep,
    ServerChecker,
};
pub use registry::{
    find_job,
    load_directory,
    search_by_regex,
};
pub use runner::{
    seed_location,
    JobRunner,
    RunRequest,
};
pub use workflow::{
    FlowKind,
    WorkflowBuilder,
    EMPTY_FOLDER_XML,
};
