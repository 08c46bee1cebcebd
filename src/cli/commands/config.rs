//! Config command - show or edit configuration

use crate::cache;
use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::schema::CacheBackendKind;
use crate::config::{Config, ConfigManager};
use crate::error::{TodoError, TodoResult};
use crate::ui::{self, UiContext};

const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "general.audit_log",
    "store.seed",
    "origin.url",
    "origin.timeout_secs",
    "cache.backend",
    "cache.dir",
    "cache.key",
    "cache.single_flight",
];

/// Execute the config command
pub async fn execute(args: ConfigArgs, manager: &ConfigManager, config: &Config) -> TodoResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> TodoResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

async fn init_config(manager: &ConfigManager, force: bool) -> TodoResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());

    Ok(())
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> TodoResult<()> {
    let ctx = UiContext::detect();
    let mut config = config.clone();

    if let Err(e) = apply(&mut config, key, value) {
        if matches!(e, TodoError::User(_)) && !VALID_KEYS.contains(&key) {
            ui::step_error_detail(&ctx, "Unknown config key", key);
            ui::remark(&ctx, "Valid keys:");
            for key in VALID_KEYS {
                eprintln!("  {}", key);
            }
        }
        return Err(e);
    }

    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));

    Ok(())
}

/// Apply one dot-separated `key = value` assignment to `config`
fn apply(config: &mut Config, key: &str, value: &str) -> TodoResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(TodoError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )))
            }
        },
        ["general", "audit_log"] => config.general.audit_log = parse_bool(value)?,

        ["store", "seed"] => config.store.seed = parse_bool(value)?,

        ["origin", "url"] => config.origin.url = value.to_string(),
        ["origin", "timeout_secs"] => config.origin.timeout_secs = parse_u64(value)?,

        ["cache", "backend"] => config.cache.backend = parse_backend(value)?,
        ["cache", "dir"] => config.cache.dir = value.into(),
        ["cache", "key"] => {
            cache::validate_key(value)?;
            config.cache.key = value.to_string()
        }
        ["cache", "single_flight"] => config.cache.single_flight = parse_bool(value)?,

        _ => return Err(TodoError::User(format!("Unknown config key: {}", key))),
    }

    Ok(())
}

fn parse_bool(value: &str) -> TodoResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(TodoError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u64(value: &str) -> TodoResult<u64> {
    value
        .parse()
        .map_err(|_| TodoError::User(format!("Invalid number: {}", value)))
}

fn parse_backend(value: &str) -> TodoResult<CacheBackendKind> {
    match value {
        "memory" => Ok(CacheBackendKind::Memory),
        "dir" => Ok(CacheBackendKind::Dir),
        _ => Err(TodoError::User(format!(
            "Invalid cache backend: {}. Use memory or dir",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn apply_known_keys() {
        let mut config = Config::default();
        apply(&mut config, "cache.backend", "dir").unwrap();
        apply(&mut config, "cache.single_flight", "yes").unwrap();
        apply(&mut config, "origin.timeout_secs", "3").unwrap();
        apply(&mut config, "store.seed", "false").unwrap();

        assert_eq!(config.cache.backend, CacheBackendKind::Dir);
        assert!(config.cache.single_flight);
        assert_eq!(config.origin.timeout_secs, 3);
        assert!(!config.store.seed);
    }

    #[test]
    fn apply_rejects_bad_values() {
        let mut config = Config::default();
        assert!(apply(&mut config, "cache.backend", "redis").is_err());
        assert!(apply(&mut config, "general.audit_log", "maybe").is_err());
        assert!(apply(&mut config, "origin.timeout_secs", "-1").is_err());
        assert!(apply(&mut config, "cache.size", "1").is_err());
    }

    #[test]
    fn cache_key_must_be_usable_by_backends() {
        let mut config = Config::default();
        for bad in ["", "a/b", "../entries", ".hidden", "two words"] {
            let err = apply(&mut config, "cache.key", bad).unwrap_err();
            assert!(matches!(err, TodoError::InvalidInput { .. }), "{:?}", bad);
        }
        assert_eq!(config.cache.key, "entries");

        apply(&mut config, "cache.key", "entries-v2").unwrap();
        assert_eq!(config.cache.key, "entries-v2");
    }

    #[test]
    fn valid_keys_are_all_settable() {
        let samples = [
            ("general.log_format", "json"),
            ("general.audit_log", "false"),
            ("store.seed", "true"),
            ("origin.url", "http://localhost:8080/entries"),
            ("origin.timeout_secs", "5"),
            ("cache.backend", "memory"),
            ("cache.dir", "/tmp/todocache"),
            ("cache.key", "entries-v2"),
            ("cache.single_flight", "true"),
        ];
        assert_eq!(samples.len(), VALID_KEYS.len());

        let mut config = Config::default();
        for (key, value) in samples {
            assert!(VALID_KEYS.contains(&key));
            apply(&mut config, key, value).unwrap();
        }
    }

    #[tokio::test]
    async fn set_persists_to_file() {
        let temp = TempDir::new().unwrap();
        let manager = ConfigManager::with_path(temp.path().join("config.toml"));

        set_value(&manager, &Config::default(), "cache.key", "entries-v2")
            .await
            .unwrap();

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded.cache.key, "entries-v2");
    }
}
