use std::path::{Path, PathBuf};

/// Default `.env` location: the current working directory.
pub fn default_env_path() -> PathBuf {
    std::env::current_dir()
        .map(|dir| dir.join(".env"))
        .unwrap_or_else(|_| PathBuf::from(".env"))
}

/// Persist Zotero credentials to a `.env` file, replacing any previous
/// Zotero entries but leaving unrelated lines untouched.
pub fn save_credentials(path: &Path, library_id: &str, api_key: &str) -> std::io::Result<()> {
    let existing = std::fs::read_to_string(path).unwrap_or_default();
    let mut lines: Vec<String> = existing
        .lines()
        .filter(|line| {
            !line.starts_with("ZOTERO_API_KEY=") && !line.starts_with("ZOTERO_LIBRARY_ID=")
        })
        .map(str::to_string)
        .collect();
    lines.push(format!("ZOTERO_LIBRARY_ID={library_id}"));
    lines.push(format!("ZOTERO_API_KEY={api_key}"));
    std::fs::write(path, lines.join("\n") + "\n")
}
