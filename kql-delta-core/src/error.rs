//! Error types for kql-delta operations.

use std::path::PathBuf;

use thiserror::Error;

/// Join a list of `(name, count)` duplicate groups for display.
fn format_duplicates(duplicates: &[(String, usize)]) -> String {
    duplicates
        .iter()
        .map(|(name, count)| format!("(Name = '{}', Count = {})", name, count))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render one violation per line, indented under the aggregate header.
fn format_violations(errors: &[DeltaError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}

/// All error types that kql-delta operations can produce.
#[derive(Error, Debug)]
pub enum DeltaError {
    /// Invalid or missing configuration (TOML parse errors, conflicting sources, etc.).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A filesystem I/O operation failed (reading scripts, writing outputs, config, etc.).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// One or more commands are of a kind that cannot describe schema state.
    #[error("Unsupported command types: {}", .kinds.join(", "))]
    UnsupportedCommandType { kinds: Vec<String> },

    /// Two or more commands of the same category share a name.
    #[error("{category} have duplicates: {{ {} }}", format_duplicates(.duplicates))]
    DuplicateObjectName {
        category: String,
        duplicates: Vec<(String, usize)>,
    },

    /// A function body is not brace-delimited or is empty once trimmed.
    #[error("Malformed function body ({reason}): {body}")]
    MalformedFunctionBody { reason: String, body: String },

    /// Several validation violations found while building one snapshot.
    #[error("Validation failed:\n{}", format_violations(.0))]
    ValidationFailed(Vec<DeltaError>),

    /// Script text could not be parsed into control commands.
    #[error("Script parse error at line {line}: {reason}")]
    ScriptParse { line: usize, reason: String },

    /// A script file failed to parse; wraps the underlying parse error.
    #[error("In script {path}: {source}")]
    ScriptFile {
        path: PathBuf,
        #[source]
        source: Box<DeltaError>,
    },

    /// An introspected schema document could not be read.
    #[error("Schema document error: {0}")]
    SchemaParse(String),

    /// The delta would lose data and the configuration forbids it.
    #[error("Delta contains {count} data-loss command(s): {details}")]
    DataLoss { count: usize, details: String },
}

impl DeltaError {
    /// Fold a list of violations into a single error.
    ///
    /// Returns `None` for an empty list and the violation itself when there
    /// is exactly one, so single failures keep their specific variant.
    pub fn aggregate(mut errors: Vec<DeltaError>) -> Option<DeltaError> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(DeltaError::ValidationFailed(errors)),
        }
    }

    /// Attach the script path to a parse or validation error.
    pub fn in_script(self, path: impl Into<PathBuf>) -> DeltaError {
        DeltaError::ScriptFile {
            path: path.into(),
            source: Box::new(self),
        }
    }
}

/// Convenience type alias for `Result<T, DeltaError>`.
pub type Result<T> = std::result::Result<T, DeltaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_message_lists_every_group() {
        let err = DeltaError::DuplicateObjectName {
            category: "Functions".to_string(),
            duplicates: vec![("F".to_string(), 2), ("G".to_string(), 3)],
        };
        assert_eq!(
            err.to_string(),
            "Functions have duplicates: { (Name = 'F', Count = 2), (Name = 'G', Count = 3) }"
        );
    }

    #[test]
    fn test_aggregate_single_keeps_variant() {
        let err = DeltaError::aggregate(vec![DeltaError::UnsupportedCommandType {
            kinds: vec![".drop function".to_string()],
        }]);
        assert!(matches!(
            err,
            Some(DeltaError::UnsupportedCommandType { .. })
        ));
        assert!(DeltaError::aggregate(Vec::new()).is_none());
    }

    #[test]
    fn test_aggregate_many_lists_all() {
        let err = DeltaError::aggregate(vec![
            DeltaError::UnsupportedCommandType {
                kinds: vec![".drop table".to_string()],
            },
            DeltaError::DuplicateObjectName {
                category: "Functions".to_string(),
                duplicates: vec![("F".to_string(), 2)],
            },
        ])
        .unwrap();
        let msg = err.to_string();
        assert!(msg.starts_with("Validation failed:"));
        assert!(msg.contains("Unsupported command types: .drop table"));
        assert!(msg.contains("(Name = 'F', Count = 2)"));
    }
}
