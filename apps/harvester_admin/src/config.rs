use std::{fs, path::Path};

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "harvester_admin.toml";
const FALLBACK_DATABASE_URL: &str = "sqlite://./data/harvester_admin.db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub window_title: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            window_title: "Harvester Admin".into(),
        }
    }
}

/// Keys accepted in `harvester_admin.toml`. Unknown keys are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct FileSettings {
    pub database_url: Option<String>,
    pub window_title: Option<String>,
}

impl Settings {
    pub fn apply_file(&mut self, file: FileSettings) {
        if let Some(v) = file.database_url {
            self.database_url = v;
        }
        if let Some(v) = file.window_title {
            self.window_title = v;
        }
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("HARVESTER_ADMIN_DATABASE_URL") {
            self.database_url = v;
        }
        if let Some(v) = lookup("APP__DATABASE_URL") {
            self.database_url = v;
        }
    }
}

/// Defaults, then the config file, then the environment. A command-line
/// `--database-url` is applied by the caller on top of this.
pub fn load_settings(config_path: Option<&Path>) -> Settings {
    let mut settings = Settings::default();

    let path = config_path.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
    match read_file_settings(path) {
        Ok(Some(file)) => settings.apply_file(file),
        Ok(None) => {
            if config_path.is_some() {
                tracing::warn!(path = %path.display(), "config file not found; using defaults");
            }
        }
        Err(err) => tracing::warn!("ignoring config file: {err:#}"),
    }

    settings.apply_env(|key| std::env::var(key).ok());
    settings.database_url = normalize_database_url(&settings.database_url);
    settings
}

pub fn read_file_settings(path: &Path) -> anyhow::Result<Option<FileSettings>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()))
        }
    };
    let file = toml::from_str::<FileSettings>(&raw)
        .with_context(|| format!("failed to parse '{}'", path.display()))?;
    Ok(Some(file))
}

fn default_database_url() -> String {
    dirs::data_local_dir()
        .map(|dir| database_url_for_path(&dir.join("harvester_admin").join("harvester_admin.db")))
        .unwrap_or_else(|| FALLBACK_DATABASE_URL.to_string())
}

fn database_url_for_path(path: &Path) -> String {
    normalize_database_url(&path.to_string_lossy())
}

/// Accepts either a sqlite URL or a bare filesystem path and returns a URL
/// sqlx can open. Windows drive paths use the single-colon `sqlite:C:/...`
/// form.
pub fn normalize_database_url(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return FALLBACK_DATABASE_URL.to_string();
    }
    if raw.starts_with("sqlite::memory:") {
        return raw.to_string();
    }

    let path = if let Some(rest) = raw.strip_prefix("sqlite://") {
        rest
    } else if let Some(rest) = raw.strip_prefix("sqlite:") {
        rest
    } else if raw.contains("://") {
        return raw.to_string();
    } else {
        raw
    };

    let path = path.replace('\\', "/");
    if has_drive_prefix(&path) {
        format!("sqlite:{path}")
    } else {
        format!("sqlite://{path}")
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
