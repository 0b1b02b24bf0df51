use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use zotsave_core::config::{default_env_path, save_credentials};

pub const SERVER_NAME: &str = "add-to-zotero";
const ZOTERO_KEYS_URL: &str = "https://www.zotero.org/settings/keys";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse Claude Desktop config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0} cannot be empty")]
    EmptyInput(&'static str),
}

/// Interactive configuration: prompt for credentials, write them to `.env`,
/// and optionally register the server in Claude Desktop's config file.
pub fn run(force: bool) -> Result<(), ConfigError> {
    println!();
    println!("  add-to-zotero — configuration");
    println!("  Create an API key with write access at {ZOTERO_KEYS_URL}");
    println!("  Your library ID is shown at the top of that page.");
    println!();

    let api_key = prompt("Enter your Zotero API key: ")?;
    if api_key.is_empty() {
        return Err(ConfigError::EmptyInput("API key"));
    }
    let library_id = prompt("Enter your Zotero library ID (the number): ")?;
    if library_id.is_empty() {
        return Err(ConfigError::EmptyInput("library ID"));
    }

    let env_path = default_env_path();
    save_credentials(&env_path, &library_id, &api_key)?;
    println!("Wrote credentials to {}", env_path.display());

    match claude_config_path() {
        Some(config_path) if config_path.parent().is_some_and(Path::exists) => {
            if prompt_yes_no("Register the server with Claude Desktop?", true)? {
                register_with_claude(&config_path, &api_key, &library_id, force)?;
            }
        }
        Some(config_path) => {
            println!("Claude Desktop config directory not found at:");
            println!("  {}", config_path.display());
            println!("Configure Claude Desktop manually (see README.md).");
        }
        None => {
            println!("Could not determine the Claude Desktop config path on this system.");
        }
    }

    println!();
    println!("Setup complete. Restart Claude Desktop, then look for");
    println!("'{SERVER_NAME}' in its tools menu.");
    Ok(())
}

fn register_with_claude(
    config_path: &Path,
    api_key: &str,
    library_id: &str,
    force: bool,
) -> Result<(), ConfigError> {
    let mut config: Value = match std::fs::read_to_string(config_path) {
        Ok(contents) => serde_json::from_str(&contents)?,
        Err(_) => json!({}),
    };

    if has_server_entry(&config) && !force {
        let overwrite =
            prompt_yes_no(&format!("'{SERVER_NAME}' already exists in config. Overwrite?"), false)?;
        if !overwrite {
            println!("Skipping Claude Desktop configuration.");
            return Ok(());
        }
    }

    let command = std::env::current_exe()?;
    upsert_server_entry(&mut config, server_entry(&command, api_key, library_id));
    std::fs::write(config_path, serde_json::to_string_pretty(&config)?)?;
    println!("Added '{SERVER_NAME}' to Claude Desktop config");
    println!("  Path: {}", config_path.display());
    Ok(())
}

/// The Claude Desktop config location for this OS, or `None` if unknown.
pub fn claude_config_path() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|home| home.join("Library/Application Support/Claude/claude_desktop_config.json"))
    } else if cfg!(target_os = "windows") {
        std::env::var_os("APPDATA")
            .map(|appdata| PathBuf::from(appdata).join("Claude").join("claude_desktop_config.json"))
    } else {
        // Claude Desktop doesn't officially support Linux; use the XDG path.
        dirs::config_dir().map(|config| config.join("Claude/claude_desktop_config.json"))
    }
}

/// The `mcpServers` entry pointing at this binary in serve mode.
pub fn server_entry(command: &Path, api_key: &str, library_id: &str) -> Value {
    json!({
        "command": command,
        "args": ["serve"],
        "env": {
            "ZOTERO_API_KEY": api_key,
            "ZOTERO_LIBRARY_ID": library_id,
        },
    })
}

pub fn has_server_entry(config: &Value) -> bool {
    config
        .get("mcpServers")
        .and_then(|servers| servers.get(SERVER_NAME))
        .is_some()
}

/// Insert or replace the server entry, preserving everything else in the
/// config. Returns true when an existing entry was replaced.
pub fn upsert_server_entry(config: &mut Value, entry: Value) -> bool {
    if !config.is_object() {
        *config = json!({});
    }
    let Some(root) = config.as_object_mut() else {
        return false;
    };
    let servers = root.entry("mcpServers").or_insert_with(|| json!({}));
    if !servers.is_object() {
        *servers = json!({});
    }
    match servers.as_object_mut() {
        Some(map) => map.insert(SERVER_NAME.to_string(), entry).is_some(),
        None => false,
    }
}

fn prompt(question: &str) -> std::io::Result<String> {
    print!("{question}");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}

fn prompt_yes_no(question: &str, default: bool) -> std::io::Result<bool> {
    let suffix = if default { " [Y/n]: " } else { " [y/N]: " };
    loop {
        let answer = prompt(&format!("{question}{suffix}"))?.to_lowercase();
        match answer.as_str() {
            "" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("Please answer 'y' or 'n'."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_into_empty_config() {
        let mut config = json!({});
        let entry = server_entry(Path::new("/usr/local/bin/zotsave"), "key", "12345");
        let replaced = upsert_server_entry(&mut config, entry);
        assert!(!replaced);
        assert_eq!(config["mcpServers"][SERVER_NAME]["args"], json!(["serve"]));
        assert_eq!(
            config["mcpServers"][SERVER_NAME]["env"]["ZOTERO_LIBRARY_ID"],
            "12345"
        );
    }

    #[test]
    fn test_upsert_preserves_other_servers_and_keys() {
        let mut config = json!({
            "theme": "dark",
            "mcpServers": {"other-tool": {"command": "other"}},
        });
        let replaced =
            upsert_server_entry(&mut config, server_entry(Path::new("zotsave"), "k", "1"));
        assert!(!replaced);
        assert_eq!(config["theme"], "dark");
        assert_eq!(config["mcpServers"]["other-tool"]["command"], "other");
        assert!(has_server_entry(&config));
    }

    #[test]
    fn test_upsert_replaces_existing_entry() {
        let mut config = json!({
            "mcpServers": {SERVER_NAME: {"command": "old"}},
        });
        let replaced =
            upsert_server_entry(&mut config, server_entry(Path::new("new"), "k", "1"));
        assert!(replaced);
        assert_eq!(config["mcpServers"][SERVER_NAME]["command"], "new");
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claude_desktop_config.json");
        std::fs::write(&path, r#"{"mcpServers": {}}"#).unwrap();
        let mut config: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        upsert_server_entry(&mut config, server_entry(Path::new("zotsave"), "k", "1"));
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
        let reread: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(has_server_entry(&reread));
    }
}
