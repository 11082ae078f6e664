//! Command implementations: delta, export, check.

pub mod check;
pub mod delta;
pub mod export;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::ddl::{Category, Command};
use crate::error::Result;
use crate::gateway::FileGateway;

/// CRC32 of a rendered script.
pub fn script_checksum(script: &str) -> u32 {
    crc32fast::hash(script.as_bytes())
}

/// File name for one object inside an output folder.
///
/// Path separators in the name are replaced so every object gets exactly
/// one file directly inside its folder.
pub(crate) fn object_file_name(name: &str) -> String {
    format!("{}.kql", object_file_stem(name))
}

fn object_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}

/// Folder of a category inside an output folder: `tables`, `functions`.
pub(crate) fn category_folder(root: &Path, category: Category) -> PathBuf {
    root.join(format!("{}s", category))
}

/// Write each command to `<dir>/<name>.kql`. Returns the written paths.
///
/// Names that map to a file already written in this call get a numeric
/// suffix (`a_b_2.kql`). Paths compare case-insensitively.
pub(crate) async fn write_command_files<'a>(
    gateway: &FileGateway,
    files: impl IntoIterator<Item = (PathBuf, &'a Command)>,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    let mut taken = HashSet::new();
    for (dir, command) in files {
        let stem = object_file_stem(command.object_name());
        let mut path = dir.join(object_file_name(command.object_name()));
        let mut suffix = 2;
        while !taken.insert(path.to_string_lossy().to_lowercase()) {
            path = dir.join(format!("{}_{}.kql", stem, suffix));
            suffix += 1;
        }
        if suffix > 2 {
            log::warn!(
                "File name taken by another object; name={}, path={}",
                command.object_name(),
                path.display()
            );
        }
        gateway
            .write_script(&path, &format!("{}\n", command.render()))
            .await?;
        written.push(gateway.resolve(&path));
    }
    Ok(written)
}
