//! Integration tests for todocache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// Unroutable origin so no test reaches the network
    const DEAD_ORIGIN: &str = "http://127.0.0.1:9/entries";

    fn todocache(config: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("todocache");
        cmd.arg("--config").arg(config).env_remove("RUST_LOG");
        cmd
    }

    /// Write a config that keeps audit output and cache files inside `temp`
    fn write_config(temp: &TempDir) -> std::path::PathBuf {
        let path = temp.path().join("config.toml");
        let content = format!(
            "[general]\naudit_log = false\n\n\
             [origin]\nurl = \"{}\"\ntimeout_secs = 2\n\n\
             [cache]\nbackend = \"dir\"\ndir = {:?}\n",
            DEAD_ORIGIN,
            temp.path().join("cache"),
        );
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("todocache")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("task records"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("todocache")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("todocache"));
    }

    #[test]
    fn list_shows_seed_records() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        todocache(&config)
            .args(["list", "--format", "plain"])
            .assert()
            .success()
            .stdout("1\tsports\tmedium\tGo to Gym\n2\tGrocery\thigh\tGet grocery\n");
    }

    #[test]
    fn list_limit() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        todocache(&config)
            .args(["list", "--limit", "1", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("sports").and(predicate::str::contains("Grocery").not()));
    }

    #[test]
    fn get_missing_record() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        todocache(&config)
            .args(["get", "99"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Todo not found: 99"));
    }

    #[test]
    fn create_assigns_next_id() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        todocache(&config)
            .args(["create", "Laundry", "Wash clothes", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""id":3"#));
    }

    #[test]
    fn create_rejects_short_name() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        todocache(&config)
            .args(["create", "ab", "too short"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid name"));
    }

    #[test]
    fn shell_session_keeps_state() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        let script = "create Laundry \"Wash clothes\"\n\
                      update 1 --priority high\n\
                      delete 2\n\
                      get 2\n\
                      list\n\
                      exit\n";

        todocache(&config)
            .args(["shell", "--format", "plain"])
            .write_stdin(script)
            .assert()
            .success()
            .stdout(
                "3\n\
                 1\tsports\thigh\tGo to Gym\n\
                 2\n\
                 404 Todo not found: 2\n\
                 1\tsports\thigh\tGo to Gym\n\
                 3\tLaundry\tlow\tWash clothes\n",
            );
    }

    #[test]
    fn shell_reports_validation_failure_and_continues() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        todocache(&config)
            .args(["shell", "--format", "plain"])
            .write_stdin("update 1 --description \"\"\nget 1\n")
            .assert()
            .success()
            .stdout(predicate::str::contains("422 Invalid description"))
            .stdout(predicate::str::contains("1\tsports\tmedium\tGo to Gym"));
    }

    #[test]
    fn dataset_served_from_cache_without_origin() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);
        let cache_dir = temp.path().join("cache");
        std::fs::create_dir_all(&cache_dir).unwrap();
        std::fs::write(
            cache_dir.join("entries.cache"),
            r#"{"count":1,"entries":[{"API":"AdoptAPet"}]}"#,
        )
        .unwrap();

        todocache(&config)
            .args(["dataset", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""source": "cache""#))
            .stdout(predicate::str::contains("AdoptAPet"));
    }

    #[test]
    fn dataset_miss_with_dead_origin_fails() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        todocache(&config)
            .args(["dataset"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Origin unavailable"));

        assert!(!temp.path().join("cache").join("entries.cache").exists());
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        todocache(&config)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        todocache(&config)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("backend = \"dir\""));
    }

    #[test]
    fn config_set_unknown_key() {
        let temp = TempDir::new().unwrap();
        let config = write_config(&temp);

        todocache(&config)
            .args(["config", "set", "cache.size", "10"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }

    #[test]
    fn invalid_config_reports_hint() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[cache\nbackend = ").unwrap();

        todocache(&path)
            .arg("list")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"))
            .stderr(predicate::str::contains("config init --force"));
    }
}
