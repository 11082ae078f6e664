//! Render one schema source as a canonical script.
//!
//! Turns an introspected schema document, or a tree of hand-written scripts,
//! into the script that recreates it from an empty database.

use std::path::PathBuf;

use serde::Serialize;

use crate::commands::{category_folder, script_checksum, write_command_files};
use crate::config::KqlDeltaConfig;
use crate::error::Result;
use crate::gateway::FileGateway;
use crate::source::{load_snapshot, Side};

/// Report from an export operation.
#[derive(Debug, Serialize)]
pub struct ExportReport {
    pub side: Side,
    /// Description of the exported source.
    pub source: String,
    pub tables: usize,
    pub functions: usize,
    /// Rendered script.
    pub script: String,
    /// CRC32 of `script`.
    pub checksum: u32,
    /// Files written.
    pub outputs: Vec<PathBuf>,
}

/// Execute the export command.
pub async fn execute(
    gateway: &FileGateway,
    config: &KqlDeltaConfig,
    side: Side,
) -> Result<ExportReport> {
    let source = match side {
        Side::Current => &config.current,
        Side::Target => &config.target,
    };
    let loaded = load_snapshot(gateway, source, &config.delta.extensions).await?;
    let snapshot = &loaded.snapshot;

    let script = snapshot.to_script();
    let checksum = script_checksum(&script);

    let mut outputs = Vec::new();
    if let Some(ref file) = config.output.file {
        gateway.write_script(file, &script).await?;
        outputs.push(gateway.resolve(file));
    }
    if let Some(ref folder) = config.output.folder {
        let commands = snapshot.to_commands();
        let files = commands
            .iter()
            .map(|command| (category_folder(folder, command.category()), command));
        outputs.extend(write_command_files(gateway, files).await?);
    }

    log::info!(
        "Export complete; side={}, objects={}, outputs={}",
        side,
        snapshot.len(),
        outputs.len()
    );

    Ok(ExportReport {
        side,
        source: source.to_string(),
        tables: snapshot.tables().count(),
        functions: snapshot.functions().count(),
        script,
        checksum,
        outputs,
    })
}
