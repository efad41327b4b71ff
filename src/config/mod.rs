use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use crate::catalog::ThemeType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPathError {
    MissingHomeDirectory,
}

pub const APP_DIR: &str = "campus-theme";
const APP_CONFIG_FILE: &str = "config.json";

/// Application-level settings from `config.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Directory holding `glass.json` / `solid.json` catalog responses.
    #[serde(default)]
    pub catalog_dir: Option<PathBuf>,
    #[serde(default)]
    pub default_theme: Option<String>,
    /// Unrecognized values read as `glass` rather than rejecting the file.
    #[serde(default, deserialize_with = "lenient_theme_type")]
    pub default_theme_type: Option<ThemeType>,
}

fn lenient_theme_type<'de, D>(deserializer: D) -> Result<Option<ThemeType>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        serde_json::Value::String(raw) => ThemeType::parse_or_default(&raw),
        other => {
            tracing::warn!(value = %other, "default_theme_type is not a string; using glass");
            ThemeType::default()
        }
    }))
}

pub fn load_app_config() -> AppConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_app_config_with(xdg_config_home.as_deref(), home.as_deref())
}

pub(crate) fn load_app_config_with(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> AppConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return AppConfig::default(),
    };
    if !path.exists() {
        return AppConfig::default();
    }
    match std::fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            AppConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            AppConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            APP_DIR,
            "selection.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(
            path,
            PathBuf::from("/tmp/config-root/campus-theme/selection.json")
        );
    }

    #[test]
    fn app_config_path_ignores_empty_xdg_config_home() {
        let path = app_config_path(
            APP_DIR,
            "selection.json",
            Some(Path::new("")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(
            path,
            PathBuf::from("/tmp/home/.config/campus-theme/selection.json")
        );
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path(APP_DIR, "selection.json", None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn app_config_defaults_when_file_missing() {
        let root = tempfile::tempdir().unwrap();
        let config = load_app_config_with(Some(root.path()), None);
        assert!(config.catalog_dir.is_none());
        assert!(config.default_theme.is_none());
    }

    #[test]
    fn app_config_parses_catalog_dir_and_default_theme() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(APP_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(APP_CONFIG_FILE),
            r#"{
                "catalog_dir": "/srv/themes",
                "default_theme": "midnight",
                "default_theme_type": "solid"
            }"#,
        )
        .unwrap();

        let config = load_app_config_with(Some(root.path()), None);
        assert_eq!(config.catalog_dir, Some(PathBuf::from("/srv/themes")));
        assert_eq!(config.default_theme.as_deref(), Some("midnight"));
        assert_eq!(config.default_theme_type, Some(ThemeType::Solid));
    }

    #[test]
    fn app_config_invalid_payload_falls_back_to_defaults() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(APP_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(APP_CONFIG_FILE), "{ invalid ").unwrap();

        let config = load_app_config_with(Some(root.path()), None);
        assert!(config.catalog_dir.is_none());
    }

    #[test]
    fn app_config_unknown_theme_type_keeps_other_settings() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join(APP_DIR);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(APP_CONFIG_FILE),
            r#"{
                "catalog_dir": "/srv/themes",
                "default_theme": "midnight",
                "default_theme_type": "matte"
            }"#,
        )
        .unwrap();

        let config = load_app_config_with(Some(root.path()), None);
        assert_eq!(config.catalog_dir, Some(PathBuf::from("/srv/themes")));
        assert_eq!(config.default_theme.as_deref(), Some("midnight"));
        assert_eq!(config.default_theme_type, Some(ThemeType::Glass));
    }

    #[test]
    fn app_config_theme_type_parses_leniently() {
        let config: AppConfig =
            serde_json::from_str(r#"{ "default_theme_type": " Solid " }"#).unwrap();
        assert_eq!(config.default_theme_type, Some(ThemeType::Solid));

        let config: AppConfig =
            serde_json::from_str(r#"{ "catalog_dir": "/srv", "default_theme_type": 3 }"#).unwrap();
        assert_eq!(config.catalog_dir, Some(PathBuf::from("/srv")));
        assert_eq!(config.default_theme_type, Some(ThemeType::Glass));

        let config: AppConfig = serde_json::from_str(r#"{ "default_theme_type": null }"#).unwrap();
        assert_eq!(config.default_theme_type, None);
    }
}
