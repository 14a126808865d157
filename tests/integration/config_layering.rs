//! Integration tests for layered configuration loading

use pkgio::config::{global_config_path, ConfigLoader, PACKAGE_CONFIG_FILE};
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

use crate::integration::test_utils::write_file;

// Tests here change process environment variables.
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with `vars` set, restoring the previous values afterwards.
fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
    let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let saved: Vec<(String, Option<String>)> = vars
        .iter()
        .map(|(k, _)| (k.to_string(), std::env::var(k).ok()))
        .collect();
    for (k, v) in vars {
        match v {
            Some(v) => std::env::set_var(k, v),
            None => std::env::remove_var(k),
        }
    }
    f();
    for (k, v) in saved {
        match v {
            Some(v) => std::env::set_var(&k, v),
            None => std::env::remove_var(&k),
        }
    }
}

#[test]
fn test_global_config_path_respects_xdg() {
    let config_home = TempDir::new().unwrap();
    let home = config_home.path().to_str().unwrap().to_string();
    with_env(&[("XDG_CONFIG_HOME", Some(home.as_str()))], || {
        assert_eq!(
            global_config_path(),
            Some(PathBuf::from(&home).join("pkgio").join("config.toml"))
        );
    });
}

#[test]
fn test_package_file_overrides_global_file() {
    let config_home = TempDir::new().unwrap();
    let package = TempDir::new().unwrap();
    write_file(
        config_home.path(),
        "pkgio/config.toml",
        "[package]\npackage_file_name = \"Kptfile\"\ninclude_subpackages = true\n",
    );
    write_file(
        package.path(),
        PACKAGE_CONFIG_FILE,
        "[package]\ninclude_subpackages = false\n",
    );

    let home = config_home.path().to_str().unwrap().to_string();
    with_env(
        &[
            ("XDG_CONFIG_HOME", Some(home.as_str())),
            ("PKGIO_PACKAGE__INCLUDE_SUBPACKAGES", None),
        ],
        || {
            let config = ConfigLoader::load(package.path()).unwrap();
            assert_eq!(config.package.package_file_name, "Kptfile");
            assert!(!config.package.include_subpackages);
        },
    );
}

#[test]
fn test_environment_overrides_files() {
    let config_home = TempDir::new().unwrap();
    let package = TempDir::new().unwrap();
    write_file(
        package.path(),
        PACKAGE_CONFIG_FILE,
        "[package]\ninclude_subpackages = false\n",
    );

    let home = config_home.path().to_str().unwrap().to_string();
    with_env(
        &[
            ("XDG_CONFIG_HOME", Some(home.as_str())),
            ("PKGIO_PACKAGE__INCLUDE_SUBPACKAGES", Some("true")),
        ],
        || {
            let config = ConfigLoader::load(package.path()).unwrap();
            assert!(config.package.include_subpackages);
            assert_eq!(config.package.ignore_file_name, ".krmignore");
        },
    );
}

#[test]
fn test_invalid_package_file_is_an_error() {
    let config_home = TempDir::new().unwrap();
    let package = TempDir::new().unwrap();
    write_file(
        package.path(),
        PACKAGE_CONFIG_FILE,
        "[package]\nmatch_files_glob = [\"{unclosed\"]\n",
    );

    let home = config_home.path().to_str().unwrap().to_string();
    with_env(&[("XDG_CONFIG_HOME", Some(home.as_str()))], || {
        assert!(ConfigLoader::load(package.path()).is_err());
    });
}
