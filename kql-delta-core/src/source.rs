//! Loading schema snapshots from configured sources.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::SourceConfig;
use crate::ddl::Command;
use crate::error::{DeltaError, Result};
use crate::gateway::FileGateway;
use crate::introspect::parse_database_schema;
use crate::parser::parse_script;
use crate::schema::SchemaSnapshot;

/// Which side of a delta a source describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Current,
    Target,
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Current => write!(f, "current"),
            Side::Target => write!(f, "target"),
        }
    }
}

/// A snapshot and the files it was read from.
#[derive(Debug, Clone)]
pub struct LoadedSource {
    pub snapshot: SchemaSnapshot,
    pub files: Vec<PathBuf>,
}

/// Load the snapshot a source describes. An empty source is an empty
/// database.
pub async fn load_snapshot(
    gateway: &FileGateway,
    source: &SourceConfig,
    extensions: &[String],
) -> Result<LoadedSource> {
    if let Some(ref schema) = source.schema {
        return load_schema_document(gateway, schema, source.database.as_deref()).await;
    }

    let mut commands: Vec<Command> = Vec::new();
    let mut files = Vec::new();

    for location in &source.scripts {
        let path = gateway.resolve(location);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DeltaError::ConfigError(format!(
                    "Script location '{}' not found",
                    location.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        if metadata.is_dir() {
            let mut walker = gateway.walk(location, Some(extensions));
            while let Some(script) = walker.next().await? {
                commands.extend(parse_file(&script.path, &script.content)?);
                files.push(script.path);
            }
        } else {
            let content = gateway.read_script(location).await?;
            commands.extend(parse_file(&path, &content)?);
            files.push(path);
        }
    }

    log::info!(
        "Loaded scripts; files={}, commands={}",
        files.len(),
        commands.len()
    );
    let snapshot = SchemaSnapshot::from_commands(commands)?;
    Ok(LoadedSource { snapshot, files })
}

fn parse_file(path: &Path, content: &str) -> Result<Vec<Command>> {
    parse_script(content).map_err(|e| e.in_script(path))
}

async fn load_schema_document(
    gateway: &FileGateway,
    path: &Path,
    database: Option<&str>,
) -> Result<LoadedSource> {
    let content = gateway.read_script(path).await?;
    let schema = parse_database_schema(&content, database).map_err(|e| match e {
        DeltaError::SchemaParse(msg) => {
            DeltaError::SchemaParse(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })?;
    let snapshot = SchemaSnapshot::from_database_schema(&schema)?;
    log::info!(
        "Loaded schema document; path={}, objects={}",
        path.display(),
        snapshot.len()
    );
    Ok(LoadedSource {
        snapshot,
        files: vec![gateway.resolve(path)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_source_is_empty_database() {
        let gateway = FileGateway::new();
        let loaded = load_snapshot(&gateway, &SourceConfig::default(), &[])
            .await
            .unwrap();
        assert!(loaded.snapshot.is_empty());
        assert!(loaded.files.is_empty());
    }

    #[tokio::test]
    async fn test_duplicates_across_files_detected() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FileGateway::with_root(dir.path());
        gateway
            .write_script("db/a.kql", ".create function F() { 1 }")
            .await
            .unwrap();
        gateway
            .write_script("db/b.kql", ".create function F() { 2 }")
            .await
            .unwrap();
        let source = SourceConfig {
            scripts: vec![PathBuf::from("db")],
            ..Default::default()
        };
        let err = load_snapshot(&gateway, &source, &["kql".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, DeltaError::DuplicateObjectName { .. }));
    }

    #[tokio::test]
    async fn test_parse_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FileGateway::with_root(dir.path());
        gateway
            .write_script("bad.kql", "\n.create function F( { 1 }")
            .await
            .unwrap();
        let source = SourceConfig {
            scripts: vec![PathBuf::from("bad.kql")],
            ..Default::default()
        };
        let err = load_snapshot(&gateway, &source, &[]).await.unwrap_err();
        match err {
            DeltaError::ScriptFile { path, source } => {
                assert!(path.ends_with("bad.kql"));
                assert!(matches!(*source, DeltaError::ScriptParse { line: 2, .. }));
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[tokio::test]
    async fn test_missing_location() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FileGateway::with_root(dir.path());
        let source = SourceConfig {
            scripts: vec![PathBuf::from("nope")],
            ..Default::default()
        };
        let err = load_snapshot(&gateway, &source, &[]).await.unwrap_err();
        assert!(matches!(err, DeltaError::ConfigError(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_location_io_failure_is_not_reported_missing() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FileGateway::with_root(dir.path());
        gateway.write_script("a.kql", "").await.unwrap();
        // A path below a regular file fails with ENOTDIR rather than ENOENT.
        let source = SourceConfig {
            scripts: vec![PathBuf::from("a.kql/inner.kql")],
            ..Default::default()
        };
        let err = load_snapshot(&gateway, &source, &[]).await.unwrap_err();
        assert!(matches!(err, DeltaError::IoError(_)), "{err}");
    }

    #[tokio::test]
    async fn test_schema_document_error_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let gateway = FileGateway::with_root(dir.path());
        gateway.write_script("s.json", "[1, 2]").await.unwrap();
        let source = SourceConfig {
            schema: Some(PathBuf::from("s.json")),
            ..Default::default()
        };
        let err = load_snapshot(&gateway, &source, &[]).await.unwrap_err();
        match err {
            DeltaError::SchemaParse(msg) => assert!(msg.contains("s.json")),
            other => panic!("unexpected {other}"),
        }
    }
}
