//! Command line arguments

use std::path::PathBuf;

use clap::{
    Args,
    Parser,
    Subcommand,
};
use kirk_core::Settings;

/// Kirk - Jenkins remote tester.
///
/// Creates and runs Jenkins jobs described by project files, using the
/// pipeline scripts stored inside your projects.
#[derive(Debug, Parser)]
#[command(name = "kirk", version, about)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Args)]
pub struct GlobalOptions {
    /// Settings file (default: KIRK_CONFIG_PATH, ./kirk.toml or the user
    /// config folder)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Folder containing projects definitions
    #[arg(short, long, global = true)]
    pub projects: Option<PathBuf>,

    /// File that stores owners credentials
    #[arg(short = 'c', long, global = true)]
    pub credentials: Option<PathBuf>,

    /// Jenkins user that will create and build jobs
    #[arg(short, long, global = true)]
    pub owner: Option<String>,

    /// Store credentials in the system keyring
    #[arg(long, global = true)]
    pub keyring: bool,

    /// Activate the debug mode
    #[arg(short, long, global = true)]
    pub debug: bool,
}

impl GlobalOptions {
    /// Flags given on the command line win over the settings file.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(projects) = &self.projects {
            settings.projects = projects.clone();
        }
        if let Some(credentials) = &self.credentials {
            settings.credentials = credentials.clone();
        }
        if let Some(owner) = &self.owner {
            settings.owner = owner.clone();
        }
        if self.keyring {
            settings.keyring = true;
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the available projects and jobs
    List {
        /// List the available jobs only
        #[arg(short, long)]
        jobs: bool,
    },

    /// Search for available jobs using a regular expression
    ///
    /// Example: kirk search '.*unittest.*'
    Search {
        regexp: String,
    },

    /// Seed and run a list of jobs
    ///
    /// Jobs are given as `<project>::<job>[<parameters>]`. When a user is
    /// given, jobs are created inside the developer folder of the project.
    Run {
        /// Name of the developer that is running the job
        #[arg(short, long, default_value = "")]
        user: String,

        /// Source code change identifier. By default the latest is used
        #[arg(long, default_value = "")]
        change_id: String,

        /// Folder hosting the developers folders
        #[arg(long)]
        dev_folder: Option<String>,

        #[arg(required = true)]
        tokens: Vec<String>,
    },

    /// Save the credential of a user for the given server
    Credential {
        url: String,
        user: String,

        /// Read from standard input when missing
        #[arg(long)]
        password: Option<String>,
    },

    /// Check that a user is allowed to use kirk on the given server
    Check {
        url: String,
        user: String,
        token: String,
    },
}
