/// Maps a slash separated folder path to its URL form,
/// e.g. `a/b c` to `job/a/job/b%20c`.
pub(crate) fn encode_job_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| format!("job/{}", urlencoding::encode(segment)))
        .collect::<Vec<_>>()
        .join("/")
}

/// Splits `a/b/c` into `("a/b", "c")`
pub(crate) fn split_job_path(path: &str) -> (&str, &str) {
    let path = path.trim_matches('/');
    match path.rfind('/') {
        Some(pos) => (&path[..pos], &path[pos + 1..]),
        None => ("", path),
    }
}
