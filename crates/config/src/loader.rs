//! Configuration loading and discovery.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::schema::BrokerConfig;

/// Standard config file name.
const CONFIG_FILENAME: &str = "warren.toml";

/// Load config from the given TOML file.
pub fn load_config(path: &Path) -> anyhow::Result<BrokerConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let config: BrokerConfig = toml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse {}: {e}", path.display()))?;
    Ok(config.deduped())
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./warren.toml` (project-local)
/// 2. `~/.config/warren/warren.toml` (user-global)
///
/// Returns `BrokerConfig::default()` if no config file is found.
pub fn discover_and_load() -> BrokerConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(config) => return config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    BrokerConfig::default()
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILENAME);
    if local.exists() {
        return Some(local);
    }

    if let Some(dirs) = directories::ProjectDirs::from("", "", "warren") {
        let global = dirs.config_dir().join(CONFIG_FILENAME);
        if global.exists() {
            return Some(global);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("create temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn loads_queues_in_declaration_order() {
        let file = write_config(
            r#"
            enabled = true
            service_uri = "amqp://broker.internal:5672"
            user_name = "consumer"

            [[queue]]
            queue_name = "orders"
            app_id = "svc1"

            [[queue]]
            queue_name = "audit"
            app_id = "svc2"
            "#,
        );

        let config = load_config(file.path()).expect("config loads");
        assert!(config.enabled);
        assert_eq!(config.service_uri, "amqp://broker.internal:5672");
        assert_eq!(config.user_name, "consumer");
        let names: Vec<_> = config.queues.iter().map(|q| q.queue_name.as_str()).collect();
        assert_eq!(names, vec!["orders", "audit"]);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let file = write_config("enabled = true\n");

        let config = load_config(file.path()).expect("config loads");
        assert!(config.enabled);
        assert_eq!(config.service_uri, "amqp://localhost:5672");
        assert_eq!(config.user_name, "guest");
        assert!(config.queues.is_empty());
    }

    #[test]
    fn duplicate_queue_names_keep_the_first_entry() {
        let file = write_config(
            r#"
            [[queue]]
            queue_name = "orders"
            app_id = "svc1"

            [[queue]]
            queue_name = "orders"
            app_id = "svc2"
            "#,
        );

        let config = load_config(file.path()).expect("config loads");
        assert_eq!(config.queues.len(), 1);
        assert_eq!(config.queues[0].app_id, "svc1");
    }

    #[test]
    fn unreadable_path_errors() {
        assert!(load_config(Path::new("/nonexistent/warren.toml")).is_err());
    }
}
