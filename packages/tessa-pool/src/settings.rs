//! Pool settings loaded from the environment or a JSON file.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tessa_ocr::{EngineMode, OcrOptions, PageSegmentation};
use thiserror::Error;

pub const DEFAULT_CEILING: usize = 6;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("pool ceiling must be at least 1")]
    InvalidCeiling,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Maximum number of live workers.
    pub ceiling: usize,
    pub options: OcrOptions,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_CEILING,
            options: OcrOptions::default(),
        }
    }
}

impl PoolSettings {
    /// Defaults overridden by `TESSA_*` variables and `TESSDATA_PREFIX`.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<L>(lookup: L) -> Result<Self, SettingsError>
    where
        L: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let opts = &mut settings.options;

        if let Some(v) = lookup("TESSA_POOL_CEILING") {
            settings.ceiling = parse("TESSA_POOL_CEILING", &v)?;
        }
        if let Some(v) = lookup("TESSA_LANGUAGE") {
            opts.language = v;
        }
        if let Some(v) = lookup("TESSDATA_PREFIX") {
            opts.data_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("TESSA_PPI") {
            opts.pixels_per_inch = parse("TESSA_PPI", &v)?;
        }
        if let Some(v) = lookup("TESSA_OEM") {
            opts.engine_mode = EngineMode::from_code(parse("TESSA_OEM", &v)?)
                .ok_or_else(|| invalid("TESSA_OEM", &v))?;
        }
        if let Some(v) = lookup("TESSA_PSM") {
            opts.page_segmentation = PageSegmentation::from_code(parse("TESSA_PSM", &v)?)
                .ok_or_else(|| invalid("TESSA_PSM", &v))?;
        }
        if let Some(v) = lookup("TESSA_WHITELIST") {
            opts.whitelist = Some(v);
        }
        if let Some(v) = lookup("TESSA_BLACKLIST") {
            opts.blacklist = Some(v);
        }
        if let Some(v) = lookup("TESSA_NUMERIC") {
            opts.numeric = match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid("TESSA_NUMERIC", &v)),
            };
        }
        if let Some(v) = lookup("TESSA_CONFIG") {
            opts.config_path = Some(PathBuf::from(v));
        }

        settings.validate()
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    fn validate(self) -> Result<Self, SettingsError> {
        if self.ceiling == 0 {
            return Err(SettingsError::InvalidCeiling);
        }
        Ok(self)
    }
}

fn invalid(key: &'static str, value: &str) -> SettingsError {
    SettingsError::InvalidValue {
        key,
        value: value.to_string(),
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, SettingsError> {
    value.trim().parse().map_err(|_| invalid(key, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_overrides() {
        let settings = PoolSettings::from_lookup(lookup(&[
            ("TESSA_POOL_CEILING", "3"),
            ("TESSA_LANGUAGE", "deu+eng"),
            ("TESSA_PSM", "7"),
            ("TESSA_OEM", "1"),
            ("TESSA_NUMERIC", "yes"),
            ("TESSA_WHITELIST", "0123456789"),
        ]))
        .unwrap();
        assert_eq!(settings.ceiling, 3);
        assert_eq!(settings.options.language, "deu+eng");
        assert_eq!(settings.options.page_segmentation, PageSegmentation::Line);
        assert_eq!(settings.options.engine_mode, EngineMode::LstmOnly);
        assert!(settings.options.numeric);
        assert_eq!(settings.options.whitelist.as_deref(), Some("0123456789"));
        assert_eq!(settings.options.pixels_per_inch, 70);
    }

    #[test]
    fn test_env_rejects_garbage() {
        let err = PoolSettings::from_lookup(lookup(&[("TESSA_PPI", "lots")])).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { key: "TESSA_PPI", .. }));

        let err = PoolSettings::from_lookup(lookup(&[("TESSA_PSM", "14")])).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { key: "TESSA_PSM", .. }));

        let err = PoolSettings::from_lookup(lookup(&[("TESSA_POOL_CEILING", "0")])).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidCeiling));
    }

    #[test]
    fn test_json_partial() {
        let settings =
            PoolSettings::from_json(r#"{"ceiling":2,"options":{"language":"fra"}}"#).unwrap();
        assert_eq!(settings.ceiling, 2);
        assert_eq!(settings.options.language, "fra");
        assert_eq!(settings.options.pixels_per_inch, 70);

        assert!(PoolSettings::from_json("{}").is_ok());
        assert!(matches!(
            PoolSettings::from_json(r#"{"ceiling":0}"#),
            Err(SettingsError::InvalidCeiling)
        ));
    }

    #[test]
    fn test_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.json");
        std::fs::write(&path, r#"{"ceiling":4}"#).unwrap();
        assert_eq!(PoolSettings::from_json_file(&path).unwrap().ceiling, 4);

        let missing = PoolSettings::from_json_file(dir.path().join("nope.json"));
        assert!(matches!(missing, Err(SettingsError::Io { .. })));
    }
}
