//! Loading of project folders and job lookup

use std::collections::HashSet;
use std::path::{
    Path,
    PathBuf,
};

use regex::Regex;

use crate::domain::{
    Job,
    Project,
};
use crate::infrastructure::yaml_env;
use crate::{
    KirkError,
    KirkResult,
};

/// Loads every `.yml`/`.yaml` file of `folder`, in file name order.
///
/// Subfolders are not visited. A file failing validation is skipped with a
/// warning; any other error, duplicate names included, aborts the scan.
pub fn load_directory(folder: &Path) -> KirkResult<Vec<Project>> {
    if folder.as_os_str().is_empty() {
        return Err(KirkError::invalid_argument("folder is empty"));
    }

    if !folder.is_dir() {
        return Err(KirkError::InvalidArgument(format!(
            "'{}' is not a directory",
            folder.display()
        )));
    }

    let entries = std::fs::read_dir(folder).map_err(|e| KirkError::io(folder, e))?;

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| KirkError::io(folder, e))?.path();
        if path.is_file() && yaml_env::is_project_file(&path) {
            files.push(path);
        }
    }
    files.sort();

    let mut names = HashSet::new();
    let mut projects = Vec::with_capacity(files.len());

    for file in files {
        tracing::debug!("Loading {}", file.display());
        let project = match Project::from_file(&file) {
            Ok(project) => project,
            Err(KirkError::Validation(reason)) => {
                tracing::warn!("Skipping {}: {}", file.display(), reason);
                continue;
            }
            Err(e) => return Err(e),
        };

        if !names.insert(project.name().to_string()) {
            return Err(KirkError::Conflict(format!(
                "Two projects with the same name '{}'",
                project.name()
            )));
        }

        projects.push(project);
    }

    tracing::info!(
        projects = projects.len(),
        "Loaded projects from {}",
        folder.display()
    );

    Ok(projects)
}

pub fn find_job<'a>(projects: &'a [Project], project: &str, job: &str) -> Option<&'a Job> {
    projects
        .iter()
        .find(|p| p.name() == project)
        .and_then(|p| p.job(job))
}

/// Jobs whose `project::job` token matches `pattern` from its first
/// character.
pub fn search_by_regex<'a>(pattern: &str, projects: &'a [Project]) -> KirkResult<Vec<&'a Job>> {
    if pattern.is_empty() {
        return Err(KirkError::invalid_argument("pattern is empty"));
    }

    if projects.is_empty() {
        return Err(KirkError::invalid_argument("projects list is empty"));
    }

    let regex = Regex::new(&format!("^(?:{pattern})"))
        .map_err(|e| KirkError::InvalidArgument(format!("Invalid pattern '{pattern}': {e}")))?;

    Ok(projects
        .iter()
        .flat_map(Project::jobs)
        .filter(|job| regex.is_match(&job.token()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_yaml(name: &str, jobs: &[&str]) -> String {
        let mut yaml = format!(
            "name: {name}\ndescription: test\nauthor: me\nyear: 2020\nversion: 1\n\
             location: myProject\ndefaults:\n    server: http://localhost:8080\njobs:\n"
        );
        for job in jobs {
            yaml.push_str(&format!("    - name: {job}\n      pipeline: test.groovy\n"));
        }
        yaml
    }

    fn setup() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b_project.yml"),
            project_yaml("project1", &["mytest_1", "mytest_2"]),
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a_project.yaml"),
            project_yaml("project0", &["mytest_0", "build"]),
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a project").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        std::fs::write(
            dir.path().join("nested").join("c_project.yml"),
            project_yaml("project2", &["hidden"]),
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_load_directory() {
        let dir = setup();
        let projects = load_directory(dir.path()).unwrap();

        let names: Vec<&str> = projects.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["project0", "project1"]);
    }

    #[test]
    fn test_load_directory_invalid_args() {
        let dir = setup();
        assert!(matches!(
            load_directory(Path::new("")),
            Err(KirkError::InvalidArgument(_))
        ));
        assert!(matches!(
            load_directory(&dir.path().join("notes.txt")),
            Err(KirkError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_invalid_file_is_skipped() {
        let dir = setup();
        std::fs::write(dir.path().join("c_bad.yml"), "name: bad\njobs: []\n").unwrap();
        std::fs::write(dir.path().join("d_broken.yaml"), "name: [unclosed\n").unwrap();

        let projects = load_directory(dir.path()).unwrap();

        let names: Vec<&str> = projects.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["project0", "project1"]);
    }

    #[test]
    fn test_duplicate_after_invalid_file() {
        let dir = setup();
        std::fs::write(dir.path().join("c_bad.yml"), "name: bad\njobs: []\n").unwrap();
        std::fs::write(
            dir.path().join("d_project.yml"),
            project_yaml("project1", &["other"]),
        )
        .unwrap();

        assert!(matches!(
            load_directory(dir.path()),
            Err(KirkError::Conflict(_))
        ));
    }

    #[test]
    fn test_duplicate_projects() {
        let dir = setup();
        std::fs::write(
            dir.path().join("c_project.yml"),
            project_yaml("project0", &["other"]),
        )
        .unwrap();

        let err = load_directory(dir.path()).unwrap_err();
        assert!(matches!(err, KirkError::Conflict(ref m) if m.contains("project0")));
    }

    #[test]
    fn test_find_job() {
        let dir = setup();
        let projects = load_directory(dir.path()).unwrap();

        assert_eq!(
            find_job(&projects, "project1", "mytest_2").map(Job::token),
            Some("project1::mytest_2".to_string())
        );
        assert!(find_job(&projects, "project1", "mytest_0").is_none());
        assert!(find_job(&projects, "project9", "mytest_0").is_none());
    }

    #[test]
    fn test_search_by_regex() {
        let dir = setup();
        let projects = load_directory(dir.path()).unwrap();

        let tokens = |pattern: &str| -> Vec<String> {
            search_by_regex(pattern, &projects)
                .unwrap()
                .into_iter()
                .map(Job::token)
                .collect()
        };

        assert_eq!(
            tokens(r"project\d::mytest_.*"),
            vec![
                "project0::mytest_0",
                "project1::mytest_1",
                "project1::mytest_2"
            ]
        );
        assert_eq!(tokens("project0"), vec!["project0::mytest_0", "project0::build"]);
        assert!(tokens("mytest").is_empty());
        assert_eq!(tokens("project1::mytest_1|project0::build"), vec![
            "project0::build",
            "project1::mytest_1"
        ]);
    }

    #[test]
    fn test_search_invalid_args() {
        let dir = setup();
        let projects = load_directory(dir.path()).unwrap();

        assert!(matches!(
            search_by_regex("", &projects),
            Err(KirkError::InvalidArgument(_))
        ));
        assert!(matches!(
            search_by_regex(".*", &[]),
            Err(KirkError::InvalidArgument(_))
        ));
        assert!(matches!(
            search_by_regex("project(", &projects),
            Err(KirkError::InvalidArgument(_))
        ));
    }
}
