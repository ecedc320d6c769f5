use anyhow::Context;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::builder::{BuildOptions, GroupType};
use crate::lang::Lang;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub lang: Lang,
    /// Overrides the language's suffix tolerance
    #[serde(default)]
    pub suffix_tolerance: Option<usize>,
    #[serde(default)]
    pub generate: GenerateConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lang: Lang::default(),
            suffix_tolerance: None,
            generate: GenerateConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

// ============================================================================
// Generation Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct GenerateConfig {
    /// Generate on/off phrases for every device
    #[serde(default = "default_gen_device_commands")]
    pub device_commands: bool,

    /// Generate on/off phrases for device classes per place and zone
    #[serde(default = "default_gen_group_commands")]
    pub group_commands: bool,

    /// Only these subsystems get generated phrases (empty = all)
    #[serde(default)]
    pub subsystems: Vec<String>,

    /// Group words and the device types they cover (empty = language default)
    #[serde(default)]
    pub group_types: Vec<GroupType>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            device_commands: default_gen_device_commands(),
            group_commands: default_gen_group_commands(),
            subsystems: Vec::new(),
            group_types: Vec::new(),
        }
    }
}

fn default_gen_device_commands() -> bool {
    true
}

fn default_gen_group_commands() -> bool {
    true
}

// ============================================================================
// Sources Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SourcesConfig {
    /// Device catalog, JSON array of device records
    #[serde(default = "default_catalog")]
    pub catalog: PathBuf,

    /// Extension phrases, JSON array; optional
    #[serde(default)]
    pub extensions: Option<PathBuf>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            extensions: None,
        }
    }
}

fn default_catalog() -> PathBuf {
    PathBuf::from("devices.json")
}

impl Config {
    /// Read a TOML config; a missing file yields the defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn suffix_tolerance(&self) -> usize {
        self.suffix_tolerance
            .unwrap_or_else(|| self.lang.suffix_tolerance())
    }

    pub fn build_options(&self) -> BuildOptions {
        let group_types = if self.generate.group_types.is_empty() {
            GroupType::defaults(self.lang)
        } else {
            self.generate.group_types.clone()
        };
        BuildOptions {
            gen_device_commands: self.generate.device_commands,
            gen_group_commands: self.generate.group_commands,
            subsystems: self.generate.subsystems.clone(),
            group_types,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_defaults() {
        let config = Config::load(Path::new("/nonexistent/verbal.toml")).unwrap();
        assert_eq!(config.lang, Lang::Ru);
        assert!(config.generate.device_commands);
        assert_eq!(config.suffix_tolerance(), 3);
        assert_eq!(config.build_options().group_types[0].word, "свет");
    }

    #[test]
    fn test_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
lang = "en"

[generate]
group_commands = false
subsystems = ["lighting"]

[[generate.group_types]]
word = "blinds"
types = ["700"]
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.lang, Lang::En);
        assert_eq!(config.suffix_tolerance(), 1);
        let opts = config.build_options();
        assert!(opts.gen_device_commands);
        assert!(!opts.gen_group_commands);
        assert_eq!(opts.subsystems, vec!["lighting"]);
        assert_eq!(opts.group_types[0].word, "blinds");
        assert_eq!(config.sources.catalog, PathBuf::from("devices.json"));
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "lang = \"de\"").unwrap();
        assert!(Config::load(file.path()).is_err());
    }
}
