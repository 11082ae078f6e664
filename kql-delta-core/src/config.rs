//! Configuration loading and resolution.
//!
//! Supports TOML config files, environment variables, and CLI overrides
//! with a defined priority order (CLI > env > TOML > defaults).

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{DeltaError, Result};

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "kql-delta.toml";

/// Helper macro to apply an optional owned value directly to a target field.
///
/// Replaces: `if let Some(v) = $opt { $target = v; }`
macro_rules! apply_option {
    ($opt:expr => $target:expr) => {
        if let Some(v) = $opt {
            $target = v;
        }
    };
}

/// Helper macro to apply an optional owned value, wrapping it in `Some()`.
///
/// Replaces: `if let Some(v) = $opt { $target = Some(v); }`
macro_rules! apply_option_some {
    ($opt:expr => $target:expr) => {
        if let Some(v) = $opt {
            $target = Some(v);
        }
    };
}

/// Helper macro to clone a borrowed optional value directly to a target field.
///
/// Replaces: `if let Some(ref v) = $opt { $target = v.clone(); }`
macro_rules! apply_option_clone {
    ($opt:expr => $target:expr) => {
        if let Some(ref v) = $opt {
            $target = v.clone();
        }
    };
}

/// Helper macro to clone a borrowed optional value, wrapping it in `Some()`.
///
/// Replaces: `if let Some(ref v) = $opt { $target = Some(v.clone()); }`
macro_rules! apply_option_some_clone {
    ($opt:expr => $target:expr) => {
        if let Some(ref v) = $opt {
            $target = Some(v.clone());
        }
    };
}

/// Top-level configuration for kql-delta.
#[derive(Debug, Clone, Default)]
pub struct KqlDeltaConfig {
    /// Schema the database has now.
    pub current: SourceConfig,
    /// Schema the database should have.
    pub target: SourceConfig,
    /// Where the delta script goes.
    pub output: OutputConfig,
    /// Delta computation settings.
    pub delta: DeltaSettings,
}

/// Where a schema comes from: script files and folders, or an introspected
/// schema document. Neither means an empty database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceConfig {
    /// Script files or folders, read in the order given.
    pub scripts: Vec<PathBuf>,
    /// JSON document produced by `.show database schema as json`.
    pub schema: Option<PathBuf>,
    /// Database to pick when the document holds several.
    pub database: Option<String>,
}

impl SourceConfig {
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty() && self.schema.is_none()
    }

    fn set_scripts(&mut self, scripts: Vec<PathBuf>) {
        self.scripts = scripts;
        self.schema = None;
    }

    fn set_schema(&mut self, schema: PathBuf) {
        self.schema = Some(schema);
        self.scripts.clear();
    }

    fn validate(&self, label: &str) -> Result<()> {
        if !self.scripts.is_empty() && self.schema.is_some() {
            return Err(DeltaError::ConfigError(format!(
                "[{}] names both scripts and a schema document; use one",
                label
            )));
        }
        Ok(())
    }
}

impl fmt::Display for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref schema) = self.schema {
            write!(f, "schema {}", schema.display())?;
            if let Some(ref db) = self.database {
                write!(f, " (database {})", db)?;
            }
            Ok(())
        } else if self.scripts.is_empty() {
            write!(f, "empty database")
        } else {
            let paths: Vec<String> = self
                .scripts
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            write!(f, "scripts {}", paths.join(", "))
        }
    }
}

/// Delta output targets. Several may be active at once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Single script file holding the whole delta.
    pub file: Option<PathBuf>,
    /// Folder receiving one file per command.
    pub folder: Option<PathBuf>,
    /// Print the script to standard output.
    pub console: bool,
}

/// Delta computation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaSettings {
    /// Extensions of script files picked up when walking a folder.
    pub extensions: Vec<String>,
    /// Refuse a delta that drops a table, or drops or retypes a column.
    pub fail_if_data_loss: bool,
}

impl Default for DeltaSettings {
    fn default() -> Self {
        DeltaSettings {
            extensions: vec!["kql".to_string(), "csl".to_string()],
            fail_if_data_loss: false,
        }
    }
}

// ── TOML deserialization structs ──

#[derive(Deserialize, Default)]
struct TomlConfig {
    current: Option<TomlSourceConfig>,
    target: Option<TomlSourceConfig>,
    output: Option<TomlOutputConfig>,
    delta: Option<TomlDeltaSettings>,
}

#[derive(Deserialize, Default)]
struct TomlSourceConfig {
    scripts: Option<Vec<String>>,
    schema: Option<String>,
    database: Option<String>,
}

#[derive(Deserialize, Default)]
struct TomlOutputConfig {
    file: Option<String>,
    folder: Option<String>,
    console: Option<bool>,
}

#[derive(Deserialize, Default)]
struct TomlDeltaSettings {
    extensions: Option<Vec<String>>,
    fail_if_data_loss: Option<bool>,
}

/// CLI overrides that take highest priority.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Override the current schema's script locations.
    pub current_scripts: Option<Vec<PathBuf>>,
    /// Override the current schema with a schema document.
    pub current_schema: Option<PathBuf>,
    /// Override the target schema's script locations.
    pub target_scripts: Option<Vec<PathBuf>>,
    /// Override the target schema with a schema document.
    pub target_schema: Option<PathBuf>,
    /// Override the delta script file.
    pub output_file: Option<PathBuf>,
    /// Override the per-command output folder.
    pub output_folder: Option<PathBuf>,
    /// Override console output.
    pub console: Option<bool>,
    /// Override the script file extensions.
    pub extensions: Option<Vec<String>>,
    /// Override the data-loss policy.
    pub fail_if_data_loss: Option<bool>,
}

impl KqlDeltaConfig {
    /// Load configuration with the following priority (highest wins):
    /// 1. CLI arguments
    /// 2. Environment variables
    /// 3. TOML config file
    /// 4. Built-in defaults
    pub fn load(config_path: Option<&str>, overrides: &CliOverrides) -> Result<Self> {
        let mut config = KqlDeltaConfig::default();

        // Layer 3: TOML config file
        let toml_path = config_path.unwrap_or(DEFAULT_CONFIG_FILE);
        if let Ok(content) = std::fs::read_to_string(toml_path) {
            // Warn if config file has overly permissive permissions (Unix only)
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Ok(meta) = std::fs::metadata(toml_path) {
                    let mode = meta.permissions().mode();
                    if mode & 0o002 != 0 {
                        log::warn!("Config file is world-writable. Consider chmod 644.; path={}, mode={:o}", toml_path, mode);
                    }
                }
            }
            let toml_config: TomlConfig = toml::from_str(&content).map_err(|e| {
                DeltaError::ConfigError(format!(
                    "Failed to parse config file '{}': {}",
                    toml_path, e
                ))
            })?;
            config.apply_toml(toml_config)?;
        } else if config_path.is_some() {
            // If explicitly specified, error if not found
            return Err(DeltaError::ConfigError(format!(
                "Config file '{}' not found",
                toml_path
            )));
        }

        // Layer 2: Environment variables
        config.apply_env();

        // Layer 1: CLI overrides
        config.apply_cli(overrides);

        config.validate()?;
        Ok(config)
    }

    fn apply_toml(&mut self, toml: TomlConfig) -> Result<()> {
        if let Some(current) = toml.current {
            apply_source(&mut self.current, current, "current")?;
        }
        if let Some(target) = toml.target {
            apply_source(&mut self.target, target, "target")?;
        }
        if let Some(output) = toml.output {
            apply_option_some!(output.file.map(PathBuf::from) => self.output.file);
            apply_option_some!(output.folder.map(PathBuf::from) => self.output.folder);
            apply_option!(output.console => self.output.console);
        }
        if let Some(delta) = toml.delta {
            apply_option!(delta.extensions.map(normalize_extensions) => self.delta.extensions);
            apply_option!(delta.fail_if_data_loss => self.delta.fail_if_data_loss);
        }
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(v) = std::env::var("KQL_DELTA_CURRENT_SCRIPTS") {
            self.current.set_scripts(split_paths(&v));
        }
        if let Ok(v) = std::env::var("KQL_DELTA_CURRENT_SCHEMA") {
            self.current.set_schema(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("KQL_DELTA_TARGET_SCRIPTS") {
            self.target.set_scripts(split_paths(&v));
        }
        if let Ok(v) = std::env::var("KQL_DELTA_TARGET_SCHEMA") {
            self.target.set_schema(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("KQL_DELTA_OUTPUT_FILE") {
            self.output.file = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("KQL_DELTA_OUTPUT_FOLDER") {
            self.output.folder = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("KQL_DELTA_EXTENSIONS") {
            self.delta.extensions =
                normalize_extensions(v.split(',').map(str::to_string).collect());
        }
        if let Ok(v) = std::env::var("KQL_DELTA_FAIL_IF_DATA_LOSS") {
            self.delta.fail_if_data_loss = v == "1" || v.eq_ignore_ascii_case("true");
        }
    }

    fn apply_cli(&mut self, overrides: &CliOverrides) {
        if let Some(ref v) = overrides.current_scripts {
            self.current.set_scripts(v.clone());
        }
        if let Some(ref v) = overrides.current_schema {
            self.current.set_schema(v.clone());
        }
        if let Some(ref v) = overrides.target_scripts {
            self.target.set_scripts(v.clone());
        }
        if let Some(ref v) = overrides.target_schema {
            self.target.set_schema(v.clone());
        }
        apply_option_some_clone!(overrides.output_file => self.output.file);
        apply_option_some_clone!(overrides.output_folder => self.output.folder);
        apply_option!(overrides.console => self.output.console);
        apply_option_clone!(overrides.extensions => self.delta.extensions);
        apply_option!(overrides.fail_if_data_loss => self.delta.fail_if_data_loss);
    }

    fn validate(&self) -> Result<()> {
        self.current.validate("current")?;
        self.target.validate("target")?;
        if self.delta.extensions.is_empty() {
            return Err(DeltaError::ConfigError(
                "[delta] extensions must list at least one extension".to_string(),
            ));
        }
        Ok(())
    }
}

fn apply_source(source: &mut SourceConfig, toml: TomlSourceConfig, label: &str) -> Result<()> {
    if toml.scripts.is_some() && toml.schema.is_some() {
        return Err(DeltaError::ConfigError(format!(
            "[{}] names both scripts and a schema document; use one",
            label
        )));
    }
    if let Some(scripts) = toml.scripts {
        source.set_scripts(scripts.into_iter().map(PathBuf::from).collect());
    }
    if let Some(schema) = toml.schema {
        source.set_schema(PathBuf::from(schema));
    }
    apply_option_some!(toml.database => source.database);
    Ok(())
}

fn split_paths(value: &str) -> Vec<PathBuf> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Strip leading dots and blanks: `.kql` and `kql` are the same extension.
pub fn normalize_extensions(extensions: Vec<String>) -> Vec<String> {
    extensions
        .into_iter()
        .map(|e| e.trim().trim_start_matches('.').to_string())
        .filter(|e| !e.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = KqlDeltaConfig::default();
        assert!(config.current.is_empty());
        assert!(config.target.is_empty());
        assert_eq!(config.delta.extensions, vec!["kql", "csl"]);
        assert!(!config.delta.fail_if_data_loss);
        assert!(!config.output.console);
        assert_eq!(config.output.file, None);
    }

    #[test]
    fn test_toml_parsing() {
        let toml_str = r#"
[current]
schema = "current.json"
database = "Telemetry"

[target]
scripts = ["db/tables", "db/functions"]

[output]
file = "delta.kql"
folder = "delta"
console = true

[delta]
extensions = [".kql"]
fail_if_data_loss = true
"#;

        let toml_config: TomlConfig = toml::from_str(toml_str).unwrap();
        let mut config = KqlDeltaConfig::default();
        config.apply_toml(toml_config).unwrap();

        assert_eq!(config.current.schema, Some(PathBuf::from("current.json")));
        assert_eq!(config.current.database.as_deref(), Some("Telemetry"));
        assert_eq!(
            config.target.scripts,
            vec![PathBuf::from("db/tables"), PathBuf::from("db/functions")]
        );
        assert_eq!(config.output.file, Some(PathBuf::from("delta.kql")));
        assert_eq!(config.output.folder, Some(PathBuf::from("delta")));
        assert!(config.output.console);
        assert_eq!(config.delta.extensions, vec!["kql"]);
        assert!(config.delta.fail_if_data_loss);
    }

    #[test]
    fn test_toml_source_with_both_kinds_rejected() {
        let toml_config: TomlConfig = toml::from_str(
            r#"
[target]
scripts = ["db"]
schema = "target.json"
"#,
        )
        .unwrap();
        let mut config = KqlDeltaConfig::default();
        let err = config.apply_toml(toml_config).unwrap_err();
        assert!(matches!(err, DeltaError::ConfigError(_)));
    }

    #[test]
    fn test_cli_overrides_replace_source_kind() {
        let mut config = KqlDeltaConfig::default();
        config.current.set_scripts(vec![PathBuf::from("db/current")]);
        config.target.set_schema(PathBuf::from("target.json"));

        let overrides = CliOverrides {
            current_schema: Some(PathBuf::from("prod.json")),
            target_scripts: Some(vec![PathBuf::from("db/target")]),
            output_file: Some(PathBuf::from("out.kql")),
            fail_if_data_loss: Some(true),
            ..Default::default()
        };
        config.apply_cli(&overrides);

        assert_eq!(config.current.schema, Some(PathBuf::from("prod.json")));
        assert!(config.current.scripts.is_empty());
        assert_eq!(config.target.scripts, vec![PathBuf::from("db/target")]);
        assert_eq!(config.target.schema, None);
        assert_eq!(config.output.file, Some(PathBuf::from("out.kql")));
        assert!(config.delta.fail_if_data_loss);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("KQL_DELTA_OUTPUT_FOLDER", "env-delta");
        std::env::set_var("KQL_DELTA_FAIL_IF_DATA_LOSS", "TRUE");
        let mut config = KqlDeltaConfig::default();
        config.apply_env();
        std::env::remove_var("KQL_DELTA_OUTPUT_FOLDER");
        std::env::remove_var("KQL_DELTA_FAIL_IF_DATA_LOSS");

        assert_eq!(config.output.folder, Some(PathBuf::from("env-delta")));
        assert!(config.delta.fail_if_data_loss);
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let err = KqlDeltaConfig::load(Some("/nonexistent/kql-delta.toml"), &CliOverrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kql-delta.toml");
        std::fs::write(&path, "[target]\nscripts = [\"db\"]\n").unwrap();

        let overrides = CliOverrides {
            extensions: Some(vec!["csl".to_string()]),
            ..Default::default()
        };
        let config = KqlDeltaConfig::load(path.to_str(), &overrides).unwrap();
        assert_eq!(config.target.scripts, vec![PathBuf::from("db")]);
        assert_eq!(config.delta.extensions, vec!["csl"]);
    }

    #[test]
    fn test_load_rejects_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kql-delta.toml");
        std::fs::write(&path, "[target\nscripts = 1").unwrap();
        let err = KqlDeltaConfig::load(path.to_str(), &CliOverrides::default()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_empty_extensions_rejected() {
        let mut config = KqlDeltaConfig::default();
        config.delta.extensions = normalize_extensions(vec![" . ".to_string()]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_source_display() {
        let mut source = SourceConfig::default();
        assert_eq!(source.to_string(), "empty database");
        source.set_scripts(vec![PathBuf::from("a"), PathBuf::from("b.kql")]);
        assert_eq!(source.to_string(), "scripts a, b.kql");
        source.set_schema(PathBuf::from("s.json"));
        source.database = Some("Db".to_string());
        assert_eq!(source.to_string(), "schema s.json (database Db)");
    }
}
