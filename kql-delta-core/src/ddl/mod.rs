//! Control-command model: one value per schema-object definition.
//!
//! Commands are immutable, render themselves as script text, and compare by
//! meaning rather than by spelling, so a function parsed from a hand-written
//! script equals the same function read back from the service.

pub mod function;
pub mod table;

use std::fmt;

use serde::Serialize;

pub use function::{CreateFunctionCommand, DropFunctionCommand, Parameter, TableParameterColumn};
pub use table::{AlterTableCommand, ColumnDef, CreateTableCommand, DropTableCommand};

/// Object category a command belongs to.
///
/// The declaration order is the order categories are emitted in a delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    Table,
    Function,
}

impl Category {
    /// Plural label used in messages and output folders.
    pub fn plural(&self) -> &'static str {
        match self {
            Category::Table => "Tables",
            Category::Function => "Functions",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Table => write!(f, "table"),
            Category::Function => write!(f, "function"),
        }
    }
}

/// A single control command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateFunction(CreateFunctionCommand),
    DropFunction(DropFunctionCommand),
    CreateTable(CreateTableCommand),
    AlterTable(AlterTableCommand),
    DropTable(DropTableCommand),
}

impl Command {
    pub fn category(&self) -> Category {
        match self {
            Command::CreateFunction(_) | Command::DropFunction(_) => Category::Function,
            Command::CreateTable(_) | Command::AlterTable(_) | Command::DropTable(_) => {
                Category::Table
            }
        }
    }

    /// Name of the object the command targets.
    pub fn object_name(&self) -> &str {
        match self {
            Command::CreateFunction(c) => &c.name,
            Command::DropFunction(c) => &c.name,
            Command::CreateTable(c) => &c.name,
            Command::AlterTable(c) => &c.name,
            Command::DropTable(c) => &c.name,
        }
    }

    /// Command keyword, used when reporting unsupported commands.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::CreateFunction(c) if c.is_create_or_alter => ".create-or-alter function",
            Command::CreateFunction(_) => ".create function",
            Command::DropFunction(_) => ".drop function",
            Command::CreateTable(_) => ".create table",
            Command::AlterTable(_) => ".alter table",
            Command::DropTable(_) => ".drop table",
        }
    }

    /// Whether the command declares schema state and may appear in a
    /// snapshot input. Drops and alters only ever appear in a delta.
    pub fn is_model_input(&self) -> bool {
        match self {
            Command::CreateFunction(_) | Command::CreateTable(_) => true,
            Command::DropFunction(_) | Command::AlterTable(_) | Command::DropTable(_) => false,
        }
    }

    /// Render the command as script text.
    pub fn render(&self) -> String {
        match self {
            Command::CreateFunction(c) => c.render(),
            Command::DropFunction(c) => c.render(),
            Command::CreateTable(c) => c.render(),
            Command::AlterTable(c) => c.render(),
            Command::DropTable(c) => c.render(),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Join rendered commands into one script, separated by blank lines.
pub fn render_script(commands: &[Command]) -> String {
    let mut script = commands
        .iter()
        .map(Command::render)
        .collect::<Vec<_>>()
        .join("\n\n");
    if !script.is_empty() {
        script.push('\n');
    }
    script
}

/// Control-command keywords that may appear where a name is expected.
const RESERVED_WORDS: &[&str] = &["with", "ifnotexists", "ifexists"];

/// Whether `name` can be written without bracket quoting.
pub fn is_plain_identifier(name: &str) -> bool {
    if RESERVED_WORDS.iter().any(|w| w.eq_ignore_ascii_case(name)) {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Render an entity name, bracket-quoting it when it is not a plain identifier.
///
/// `My Table` becomes `['My Table']`.
pub fn quote_ident(name: &str) -> String {
    if is_plain_identifier(name) {
        name.to_string()
    } else {
        format!("['{}']", name.replace('\\', "\\\\").replace('\'', "\\'"))
    }
}

/// Canonical spelling of a scalar type name.
///
/// Aliases accepted by the service collapse to the name it reports back, so
/// `int64` in a script equals `long` from introspection.
pub fn normalize_type(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    let canonical = match lower.as_str() {
        "int64" => "long",
        "int32" => "int",
        "double" | "float" => "real",
        "boolean" => "bool",
        "date" => "datetime",
        "time" => "timespan",
        "uniqueid" => "guid",
        other => other,
    };
    canonical.to_string()
}

/// Render the `with (folder=..., docstring=...)` clause, or nothing when
/// neither property is present.
pub(crate) fn render_properties(
    folder: Option<&crate::quoted_text::QuotedText>,
    doc_string: Option<&crate::quoted_text::QuotedText>,
) -> Option<String> {
    let mut props = Vec::new();
    if let Some(folder) = folder {
        props.push(format!("folder={}", folder.to_script()));
    }
    if let Some(doc) = doc_string {
        props.push(format!("docstring={}", doc.to_script()));
    }
    if props.is_empty() {
        None
    } else {
        Some(format!("with ({})", props.join(", ")))
    }
}
