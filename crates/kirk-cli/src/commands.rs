use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;

use anyhow::{
    bail,
    Context,
    Result,
};
use kirk_core::application::{
    find_job,
    load_directory,
    search_by_regex,
    CheckStep,
};
use kirk_core::domain::token;
use kirk_core::{
    CredentialStore,
    FileCredentialStore,
    Job,
    JobRunner,
    Project,
    RunRequest,
    ServerChecker,
    Settings,
};
use kirk_jenkins::JenkinsConnector;

use crate::keyring_store::KeyringCredentialStore;

const TOKEN_SYNTAX_HELP: &str = "Invalid job token. Please use the following syntax:\n\
                                 \n  <project>::<job>[<parameters>]";

pub fn credential_store(settings: &Settings) -> Arc<dyn CredentialStore> {
    if settings.keyring {
        Arc::new(KeyringCredentialStore::new())
    } else {
        Arc::new(FileCredentialStore::new(&settings.credentials))
    }
}

fn load_projects(folder: &Path) -> Result<Vec<Project>> {
    let projects = load_directory(folder)
        .with_context(|| format!("Cannot load projects from '{}'", folder.display()))?;

    let jobs: usize = projects.iter().map(|p| p.jobs().len()).sum();
    println!("collected {} jobs\n", jobs);

    Ok(projects)
}

pub fn list(settings: &Settings, jobs_only: bool) -> Result<()> {
    let projects = load_projects(&settings.projects)?;
    if projects.is_empty() {
        return Ok(());
    }

    if jobs_only {
        println!("available jobs");
        for job in projects.iter().flat_map(Project::jobs) {
            println!("  {}", job.token_with_params());
        }
        return Ok(());
    }

    println!("available projects");
    for project in &projects {
        println!("  {}", project.name());
        for job in project.jobs() {
            println!("   - {}", job.token_with_params());
        }
        println!();
    }

    Ok(())
}

pub fn search(settings: &Settings, regexp: &str) -> Result<()> {
    let projects = load_projects(&settings.projects)?;
    if projects.is_empty() {
        return Ok(());
    }

    let found = search_by_regex(regexp, &projects)?;
    if found.is_empty() {
        bail!("No jobs found.");
    }

    println!("found jobs");
    for job in found {
        println!("  {}", job.token_with_params());
    }

    Ok(())
}

/// Resolves every token to its job, with the token parameters applied.
fn select_jobs(projects: &[Project], tokens: &[String]) -> Result<Vec<(String, Job)>> {
    let mut selected = Vec::with_capacity(tokens.len());
    let mut missing = Vec::new();

    for raw in tokens {
        let Some(decoded) = token::decode(raw)? else {
            bail!(TOKEN_SYNTAX_HELP);
        };

        let Some(job) = find_job(projects, &decoded.project, &decoded.job) else {
            missing.push(raw.as_str());
            continue;
        };

        let mut job = job.clone();
        for name in job.apply_overrides(&decoded.params) {
            tracing::warn!("'{}' has no parameter named '{}'", job.token(), name);
        }
        selected.push((raw.clone(), job));
    }

    if !missing.is_empty() {
        let mut message = String::from("Cannot find the following jobs\n");
        for raw in missing {
            message.push_str(&format!("  {}\n", raw));
        }
        message.push_str("\nPlease use 'list' command to show available jobs");
        bail!(message);
    }

    Ok(selected)
}

pub async fn run(
    settings: &Settings, user: &str, change_id: &str, dev_folder: Option<&str>,
    tokens: &[String],
) -> Result<()> {
    let projects = load_projects(&settings.projects)?;

    println!("selected jobs");
    for raw in tokens {
        println!("  {}", raw);
    }
    println!();

    let jobs = select_jobs(&projects, tokens)?;

    let runner = JobRunner::new(
        credential_store(settings),
        Arc::new(JenkinsConnector::new()),
        settings.owner.as_str(),
    )?;

    let request = RunRequest::for_user(user)
        .with_dev_folder(dev_folder.unwrap_or(&settings.dev_folder))
        .with_change_id(change_id);

    for (raw, job) in jobs {
        println!("-> running {} (user='{}')", raw, user);
        let url = runner
            .run(&job, &request)
            .await
            .with_context(|| format!("Failed to run '{}'", raw))?;
        println!("-> configured {}", url);
    }

    Ok(())
}

fn read_password() -> Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Cannot read the password from standard input")?;

    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("Password is empty");
    }
    Ok(password)
}

pub async fn credential(
    settings: &Settings, url: &str, user: &str, password: Option<String>,
) -> Result<()> {
    println!("saving credential:");
    println!("  url:  {}", url);
    println!("  user: {}", user);

    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };

    credential_store(settings)
        .set_password(url, user, &password)
        .await?;

    println!("\ncredential saved");
    Ok(())
}

pub async fn check(url: &str, user: &str, password: &str) -> Result<()> {
    println!("kirk-check session started\n");
    println!("  url: {}", url);
    println!("  user: {}", user);
    println!("  token: *******\n");

    let checker = ServerChecker::new(Arc::new(JenkinsConnector::new()));
    let report = checker.check(url, user, password).await?;

    let total = CheckStep::ALL.len();
    for (index, result) in report.results.iter().enumerate() {
        let status = if result.passed() { "PASSED" } else { "FAILED" };
        println!("  {}/{}   {:<20} {}", index + 1, total, result.step, status);
    }

    if let Some(failure) = report.failure() {
        bail!(
            "{} check failed: {}",
            failure.step,
            failure.error.as_deref().unwrap_or_default()
        );
    }

    Ok(())
}
