use fridge_engine::{MarkupOptions, WriteMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Layout for newly opened documents
    pub mode: WriteMode,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory relative document paths are resolved against
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents_path: Option<PathBuf>,
    /// Where the list of open documents is saved between runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_path: Option<PathBuf>,
    pub editor: EditorConfig,
    pub markup: MarkupOptions,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded paths
        config.documents_path = config.documents_path.map(Self::expand_or_keep);
        config.state_path = config.state_path.map(Self::expand_or_keep);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        self.save_to_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/fridge");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn markup_options(&self) -> MarkupOptions {
        self.markup
    }

    /// Resolve a document path given on the command line. Relative paths are
    /// taken from `documents_path` when one is configured.
    pub fn resolve_document_path(&self, path: &Path) -> PathBuf {
        let path = Self::expand_or_keep(path.to_path_buf());
        match &self.documents_path {
            Some(root) if path.is_relative() => root.join(path),
            _ => path,
        }
    }

    fn expand_or_keep(path: PathBuf) -> PathBuf {
        Self::expand_path(&path).unwrap_or(path)
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = Config::config_path();
        let path_str = config_path.to_string_lossy();

        // Should not contain tilde anymore
        assert!(!path_str.starts_with('~'));
        assert!(path_str.ends_with(".config/fridge/config.toml"));
    }

    #[test]
    fn test_defaults_from_empty_file() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.documents_path, None);
        assert_eq!(config.editor.mode, WriteMode::Ltr);
        assert_eq!(config.markup_options(), MarkupOptions::default());
        assert!(config.markup.highlight_search);
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
[editor]
mode = "ttb"

[markup]
show_full_space = true
"#,
        )
        .unwrap();

        assert_eq!(config.editor.mode, WriteMode::Ttb);
        let markup = config.markup_options();
        assert!(markup.show_full_space);
        assert!(!markup.show_half_space);
        assert!(markup.highlight_search);
    }

    #[test]
    fn test_invalid_mode_is_a_parse_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[editor]\nmode = \"diagonal\"\n").unwrap();

        let result = Config::load_from_path(&config_file);
        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let path = PathBuf::from("~/test/path");
        let expanded = Config::expand_path(&path);

        assert!(expanded.is_some());
        let expanded = expanded.unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_with_env_var() {
        unsafe {
            env::set_var("FRIDGE_TEST_VAR", "/test/env/path");
        }

        let path = PathBuf::from("$FRIDGE_TEST_VAR/subdir");
        let expanded = Config::expand_path(&path);

        assert_eq!(expanded, Some(PathBuf::from("/test/env/path/subdir")));

        unsafe {
            env::remove_var("FRIDGE_TEST_VAR");
        }
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = Config::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested/config.toml");
        let test_config = Config {
            documents_path: Some(PathBuf::from("/tmp/test-docs")),
            state_path: Some(PathBuf::from("/tmp/state.json")),
            editor: EditorConfig {
                mode: WriteMode::Ttb,
            },
            markup: MarkupOptions {
                show_newline: true,
                ..MarkupOptions::default()
            },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = Config::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_resolve_document_path() {
        let config = Config {
            documents_path: Some(PathBuf::from("/docs")),
            ..Config::default()
        };

        assert_eq!(
            config.resolve_document_path(Path::new("note.txt")),
            PathBuf::from("/docs/note.txt")
        );
        assert_eq!(
            config.resolve_document_path(Path::new("/abs/note.txt")),
            PathBuf::from("/abs/note.txt")
        );
        assert_eq!(
            Config::default().resolve_document_path(Path::new("note.txt")),
            PathBuf::from("note.txt")
        );
    }
}
