mod cli;
mod commands;
mod keyring_store;

use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use kirk_core::{
    Settings,
    SettingsLoader,
};

use crate::cli::{
    Cli,
    Commands,
};

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.global.config {
        Some(path) => SettingsLoader::load(path)?,
        None => SettingsLoader::load_default()?,
    };
    cli.global.apply(&mut settings);
    Ok(settings)
}

async fn execute(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;

    if cli.global.debug {
        println!("debugging session\n");
    }

    tracing::debug!(
        owner = %settings.owner,
        projects = %settings.projects.display(),
        keyring = settings.keyring,
        "kirk {} session started",
        kirk_core::VERSION
    );

    match cli.command {
        Commands::List { jobs } => commands::list(&settings, jobs),
        Commands::Search { regexp } => commands::search(&settings, &regexp),
        Commands::Run {
            user,
            change_id,
            dev_folder,
            tokens,
        } => {
            commands::run(
                &settings,
                &user,
                &change_id,
                dev_folder.as_deref(),
                &tokens,
            )
            .await
        }
        Commands::Credential {
            url,
            user,
            password,
        } => commands::credential(&settings, &url, &user, password).await,
        Commands::Check { url, user, token } => commands::check(&url, &user, &token).await,
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    let cli = Cli::parse();

    if cli.global.debug {
        kirk_core::logging::init_dev();
    } else {
        kirk_core::logging::init();
    }

    let debug = cli.global.debug;
    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if debug {
                eprintln!("{err:?}");
            } else {
                eprintln!("{err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
