//! Compute the script that takes the current schema to the target schema.

use std::path::PathBuf;

use serde::Serialize;

use crate::commands::{category_folder, script_checksum, write_command_files};
use crate::config::KqlDeltaConfig;
use crate::ddl::render_script;
use crate::error::{DeltaError, Result};
use crate::gateway::FileGateway;
use crate::schema::{DeltaAction, DeltaEntry};
use crate::source::load_snapshot;

/// Report produced by the delta command.
#[derive(Debug, Serialize)]
pub struct DeltaReport {
    /// Description of the current schema source.
    pub current: String,
    /// Description of the target schema source.
    pub target: String,
    /// Objects that change, in apply order.
    pub entries: Vec<DeltaEntry>,
    pub drops: usize,
    pub creates: usize,
    pub alters: usize,
    pub unchanged: usize,
    /// Number of commands that lose data.
    pub data_loss: usize,
    /// Whether any command was produced.
    pub has_changes: bool,
    /// Rendered delta script.
    pub script: String,
    /// CRC32 of `script`.
    pub checksum: u32,
    /// Files written.
    pub outputs: Vec<PathBuf>,
}

/// Execute the delta command.
pub async fn execute(gateway: &FileGateway, config: &KqlDeltaConfig) -> Result<DeltaReport> {
    let extensions = &config.delta.extensions;

    let current = load_snapshot(gateway, &config.current, extensions).await?;
    let target = load_snapshot(gateway, &config.target, extensions).await?;

    let plan = current.snapshot.plan(&target.snapshot);

    let data_loss: Vec<&DeltaEntry> = plan.data_loss_entries().collect();
    if config.delta.fail_if_data_loss && !data_loss.is_empty() {
        let details = data_loss
            .iter()
            .map(|e| format!("{} {} {}", e.action, e.category, e.name))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(DeltaError::DataLoss {
            count: data_loss.len(),
            details,
        });
    }
    let data_loss = data_loss.len();
    if data_loss > 0 {
        log::warn!("Delta loses data; commands={}", data_loss);
    }

    let commands = plan.commands();
    let script = render_script(&commands);
    let checksum = script_checksum(&script);

    let mut outputs = Vec::new();
    if let Some(ref file) = config.output.file {
        gateway.write_script(file, &script).await?;
        outputs.push(gateway.resolve(file));
    }
    if let Some(ref folder) = config.output.folder {
        let files = plan.changes().filter_map(|e| {
            let dir = category_folder(folder, e.category).join(e.action.to_string());
            e.command.as_ref().map(|command| (dir, command))
        });
        outputs.extend(write_command_files(gateway, files).await?);
    }

    log::info!(
        "Delta complete; commands={}, checksum={}, outputs={}",
        commands.len(),
        checksum,
        outputs.len()
    );

    Ok(DeltaReport {
        current: config.current.to_string(),
        target: config.target.to_string(),
        drops: plan.count(DeltaAction::Drop),
        creates: plan.count(DeltaAction::Create),
        alters: plan.count(DeltaAction::Alter),
        unchanged: plan.count(DeltaAction::Unchanged),
        data_loss,
        has_changes: !commands.is_empty(),
        entries: plan.changes().cloned().collect(),
        script,
        checksum,
        outputs,
    })
}
