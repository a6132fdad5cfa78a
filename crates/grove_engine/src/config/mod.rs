//! Configuration system
//!
//! Configuration records are plain serde structs handed to the runtime at
//! construction time. They can be read from and written to TOML or RON
//! files, picked by file extension.

use std::path::Path;

pub use serde::{Deserialize, Serialize};

mod runtime;

pub use runtime::{
    AnimationConfig, FrameConfig, GridConfig, MovementConfig, PickupConfig, RuntimeConfig,
};

/// On-disk configuration format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// `.toml`
    Toml,
    /// `.ron`
    Ron,
}

impl ConfigFormat {
    /// Format implied by the extension of `path`
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Ok(Self::Toml),
            Some(ext) if ext.eq_ignore_ascii_case("ron") => Ok(Self::Ron),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Serde-backed configuration record
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Parse `text` written in `format`
    fn parse(text: &str, format: ConfigFormat) -> Result<Self, ConfigError> {
        match format {
            ConfigFormat::Toml => toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string())),
            ConfigFormat::Ron => ron::from_str(text).map_err(|e| ConfigError::Parse(e.to_string())),
        }
    }

    /// Render as `format`
    fn render(&self, format: ConfigFormat) -> Result<String, ConfigError> {
        match format {
            ConfigFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
            }
            ConfigFormat::Ron => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new())
                .map_err(|e| ConfigError::Serialize(e.to_string())),
        }
    }

    /// Load from a `.toml` or `.ron` file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let format = ConfigFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents, format)
    }

    /// Write to a `.toml` or `.ron` file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = self.render(ConfigFormat::from_path(path)?)?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File contents do not match the record
    #[error("Parse error: {0}")]
    Parse(String),

    /// Record could not be rendered
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Extension is neither `.toml` nor `.ron`
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value is outside its allowed range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    /// Scratch file under the system temp dir, removed on drop
    struct ScratchFile(PathBuf);

    impl ScratchFile {
        fn new(name: &str) -> Self {
            let file = format!("grove_config_{}_{}", std::process::id(), name);
            Self(std::env::temp_dir().join(file))
        }
    }

    impl Drop for ScratchFile {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    fn customised() -> RuntimeConfig {
        let mut config = RuntimeConfig::default();
        config.grid.dimensions = [40, 25];
        config.pickup.timing = 0.4;
        config.pickup.actions = vec!["dance".to_string()];
        config.frame.max_step_seconds = 0.05;
        config
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("a/scene.toml")).ok(), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_path(Path::new("scene.RON")).ok(), Some(ConfigFormat::Ron));
        assert!(matches!(
            ConfigFormat::from_path(Path::new("scene")),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_toml_file_round_trip() {
        let file = ScratchFile::new("round_trip.toml");
        let config = customised();
        config.save_to_file(&file.0).expect("save toml");

        let loaded = RuntimeConfig::load_from_file(&file.0).expect("load toml");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_ron_file_round_trip() {
        let file = ScratchFile::new("round_trip.ron");
        let config = customised();
        config.save_to_file(&file.0).expect("save ron");

        let loaded = RuntimeConfig::load_from_file(&file.0).expect("load ron");
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_existing_file_with_unknown_extension() {
        let file = ScratchFile::new("scene.yaml");
        std::fs::write(&file.0, "grid: {}").expect("write yaml");

        let result = RuntimeConfig::load_from_file(&file.0);
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
        assert!(matches!(
            customised().save_to_file(&file.0),
            Err(ConfigError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let file = ScratchFile::new("absent.toml");
        assert!(matches!(RuntimeConfig::load_from_file(&file.0), Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_malformed_contents() {
        let result = RuntimeConfig::parse("[grid\ndimensions = ", ConfigFormat::Toml);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
