use super::CommandContext;
use crate::config::{DEFAULT_DB_FILENAME, TIX_DIR_NAME};
use crate::error::{Result, TrackerError};
use crate::storage::SqliteStorage;
use serde_json::json;
use std::fs;
use std::path::Path;
use tracing::info;

const CONFIG_TEMPLATE: &str = r"# tix project configuration
# default-priority: medium
# page-size: 10
# lock-timeout: 30000
# server:
#   host: 0.0.0.0
#   port: 8000
#   cors-origins: http://localhost:5173,http://127.0.0.1:5173
";

const GITIGNORE_TEMPLATE: &str = r"# Database
*.db
*.db-shm
*.db-wal
";

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` when a database exists and `force` is not
/// set, or an error if the directory or database cannot be created.
pub fn execute(force: bool, root_dir: Option<&Path>, ctx: &CommandContext) -> Result<()> {
    let base_dir = root_dir.unwrap_or_else(|| Path::new("."));
    let tix_dir = base_dir.join(TIX_DIR_NAME);
    let db_path = tix_dir.join(DEFAULT_DB_FILENAME);

    if tix_dir.exists() {
        if db_path.exists() {
            if !force {
                return Err(TrackerError::AlreadyInitialized { path: db_path });
            }
            remove_database(&db_path)?;
        }
    } else {
        fs::create_dir_all(&tix_dir)?;
    }

    // Opening applies the schema.
    SqliteStorage::open(&db_path)?;
    info!(path = %db_path.display(), force, "Initialized database");

    let config_path = tix_dir.join("config.yaml");
    if !config_path.exists() {
        fs::write(config_path, CONFIG_TEMPLATE)?;
    }

    let gitignore_path = tix_dir.join(".gitignore");
    if !gitignore_path.exists() {
        fs::write(gitignore_path, GITIGNORE_TEMPLATE)?;
    }

    if ctx.json {
        super::print_json(&json!({
            "initialized": true,
            "path": tix_dir.display().to_string(),
        }))?;
    } else {
        ctx.say(format!("Initialized tix workspace in {TIX_DIR_NAME}/"));
    }
    Ok(())
}

fn remove_database(db_path: &Path) -> Result<()> {
    fs::remove_file(db_path)?;
    for suffix in ["-wal", "-shm"] {
        let mut sidecar = db_path.as_os_str().to_owned();
        sidecar.push(suffix);
        let sidecar = Path::new(&sidecar);
        if sidecar.exists() {
            fs::remove_file(sidecar)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewTicket;
    use tempfile::TempDir;

    fn quiet() -> CommandContext {
        CommandContext {
            quiet: true,
            ..CommandContext::default()
        }
    }

    #[test]
    fn test_init_creates_workspace() {
        let temp_dir = TempDir::new().unwrap();
        execute(false, Some(temp_dir.path()), &quiet()).unwrap();

        let tix = temp_dir.path().join(".tix");
        assert!(tix.join("tix.db").exists());
        assert!(tix.join("config.yaml").exists());
        assert!(tix.join(".gitignore").exists());
    }

    #[test]
    fn test_init_fails_if_already_initialized() {
        let temp_dir = TempDir::new().unwrap();
        execute(false, Some(temp_dir.path()), &quiet()).unwrap();

        let err = execute(false, Some(temp_dir.path()), &quiet()).unwrap_err();
        assert!(matches!(err, TrackerError::AlreadyInitialized { .. }));
    }

    #[test]
    fn test_init_force_recreates_database() {
        let temp_dir = TempDir::new().unwrap();
        execute(false, Some(temp_dir.path()), &quiet()).unwrap();

        let db_path = temp_dir.path().join(".tix/tix.db");
        {
            let mut storage = SqliteStorage::open(&db_path).unwrap();
            storage
                .create_ticket(&NewTicket {
                    title: "Survives?".to_string(),
                    ..NewTicket::default()
                })
                .unwrap();
        }

        execute(true, Some(temp_dir.path()), &quiet()).unwrap();
        let storage = SqliteStorage::open(&db_path).unwrap();
        assert_eq!(storage.count_tickets().unwrap(), 0);
    }

    #[test]
    fn test_init_keeps_existing_config() {
        let temp_dir = TempDir::new().unwrap();
        let tix = temp_dir.path().join(".tix");
        fs::create_dir_all(&tix).unwrap();
        fs::write(tix.join("config.yaml"), "page-size: 25\n").unwrap();

        execute(false, Some(temp_dir.path()), &quiet()).unwrap();
        assert_eq!(
            fs::read_to_string(tix.join("config.yaml")).unwrap(),
            "page-size: 25\n"
        );
    }
}
