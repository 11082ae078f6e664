//! Database schema snapshots and the delta between two of them.
//!
//! Used by the delta, export and check commands.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::ddl::{
    render_script, AlterTableCommand, Category, ColumnDef, Command, CreateFunctionCommand,
    CreateTableCommand, DropFunctionCommand, DropTableCommand, Parameter, TableParameterColumn,
};
use crate::error::{DeltaError, Result};
use crate::introspect::{DatabaseSchema, FunctionSchema, InputParameterSchema, TableSchema};
use crate::quoted_text::QuotedText;

/// Complete, validated state of a database schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaSnapshot {
    functions: BTreeMap<String, CreateFunctionCommand>,
    tables: BTreeMap<String, CreateTableCommand>,
}

/// What the delta does to one object.
///
/// The declaration order is the emit order inside a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeltaAction {
    Drop,
    Create,
    Alter,
    Unchanged,
}

impl fmt::Display for DeltaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeltaAction::Drop => write!(f, "drop"),
            DeltaAction::Create => write!(f, "create"),
            DeltaAction::Alter => write!(f, "alter"),
            DeltaAction::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Classification of one named object.
#[derive(Debug, Clone, Serialize)]
pub struct DeltaEntry {
    pub category: Category,
    pub name: String,
    pub action: DeltaAction,
    /// Applying the command would lose stored data.
    pub data_loss: bool,
    /// Command to apply; `None` when unchanged.
    #[serde(skip)]
    pub command: Option<Command>,
}

/// Every object of two snapshots with the action taking one to the other.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeltaPlan {
    pub entries: Vec<DeltaEntry>,
}

impl DeltaPlan {
    /// Commands in apply order.
    pub fn commands(&self) -> Vec<Command> {
        self.entries
            .iter()
            .filter_map(|e| e.command.clone())
            .collect()
    }

    /// Entries that produce a command.
    pub fn changes(&self) -> impl Iterator<Item = &DeltaEntry> {
        self.entries
            .iter()
            .filter(|e| e.action != DeltaAction::Unchanged)
    }

    pub fn has_changes(&self) -> bool {
        self.changes().next().is_some()
    }

    pub fn count(&self, action: DeltaAction) -> usize {
        self.entries.iter().filter(|e| e.action == action).count()
    }

    pub fn data_loss_entries(&self) -> impl Iterator<Item = &DeltaEntry> {
        self.entries.iter().filter(|e| e.data_loss)
    }
}

impl fmt::Display for DeltaPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in self.changes() {
            let marker = match entry.action {
                DeltaAction::Create => "+",
                DeltaAction::Drop => "-",
                _ => "~",
            };
            write!(f, "{} {} {}", marker, entry.category, entry.name)?;
            if entry.data_loss {
                write!(f, " (data loss)")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl SchemaSnapshot {
    /// Snapshot of a database with no objects.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from parsed commands.
    ///
    /// Every command must declare schema state, and names must be unique
    /// within a category. All violations are reported together.
    pub fn from_commands(commands: Vec<Command>) -> Result<Self> {
        let mut errors = Vec::new();

        let unsupported: BTreeSet<&str> = commands
            .iter()
            .filter(|c| !c.is_model_input())
            .map(Command::kind)
            .collect();
        if !unsupported.is_empty() {
            errors.push(DeltaError::UnsupportedCommandType {
                kinds: unsupported.into_iter().map(str::to_string).collect(),
            });
        }

        let mut counts: BTreeMap<Category, BTreeMap<&str, usize>> = BTreeMap::new();
        for command in commands.iter().filter(|c| c.is_model_input()) {
            *counts
                .entry(command.category())
                .or_default()
                .entry(command.object_name())
                .or_default() += 1;
        }
        for (category, names) in &counts {
            let duplicates: Vec<(String, usize)> = names
                .iter()
                .filter(|(_, count)| **count > 1)
                .map(|(name, count)| (name.to_string(), *count))
                .collect();
            if !duplicates.is_empty() {
                errors.push(DeltaError::DuplicateObjectName {
                    category: category.plural().to_string(),
                    duplicates,
                });
            }
        }

        if let Some(err) = DeltaError::aggregate(errors) {
            return Err(err);
        }

        let mut snapshot = Self::default();
        for command in commands {
            match command {
                Command::CreateFunction(f) => {
                    snapshot.functions.insert(f.name.clone(), f);
                }
                Command::CreateTable(t) => {
                    snapshot.tables.insert(t.name.clone(), t);
                }
                // Rejected above.
                Command::DropFunction(_) | Command::AlterTable(_) | Command::DropTable(_) => {}
            }
        }

        log::debug!(
            "Built snapshot from commands; tables={}, functions={}",
            snapshot.tables.len(),
            snapshot.functions.len()
        );
        Ok(snapshot)
    }

    /// Build a snapshot from an introspected schema document.
    pub fn from_database_schema(schema: &DatabaseSchema) -> Result<Self> {
        let mut snapshot = Self::default();

        for (key, table) in &schema.tables {
            let command = table_from_schema(table)?;
            if snapshot.tables.insert(command.name.clone(), command).is_some() {
                log::warn!("Table replaced by a later entry; key={}, name={}", key, table.name);
            }
        }
        for (key, function) in &schema.functions {
            let command = function_from_schema(function)?;
            if snapshot.functions.insert(command.name.clone(), command).is_some() {
                log::warn!(
                    "Function replaced by a later entry; key={}, name={}",
                    key,
                    function.name
                );
            }
        }

        Ok(snapshot)
    }

    pub fn functions(&self) -> impl Iterator<Item = &CreateFunctionCommand> {
        self.functions.values()
    }

    pub fn tables(&self) -> impl Iterator<Item = &CreateTableCommand> {
        self.tables.values()
    }

    pub fn function(&self, name: &str) -> Option<&CreateFunctionCommand> {
        self.functions.get(name)
    }

    pub fn table(&self, name: &str) -> Option<&CreateTableCommand> {
        self.tables.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.tables.is_empty()
    }

    /// Number of objects across all categories.
    pub fn len(&self) -> usize {
        self.functions.len() + self.tables.len()
    }

    /// Classify every object of `self` and `target`.
    pub fn plan(&self, target: &SchemaSnapshot) -> DeltaPlan {
        let mut entries = Vec::new();

        plan_category(
            &mut entries,
            Category::Table,
            &self.tables,
            &target.tables,
            |t| (Command::CreateTable(t.clone()), false),
            |c| (Command::DropTable(DropTableCommand::new(&c.name)), true),
            |c, t| (Command::AlterTable(AlterTableCommand::from(t)), c.loses_data_to(t)),
        );
        plan_category(
            &mut entries,
            Category::Function,
            &self.functions,
            &target.functions,
            |t| (Command::CreateFunction(t.with_create_or_alter(false)), false),
            |c| (Command::DropFunction(DropFunctionCommand::new(&c.name)), false),
            |_, t| (Command::CreateFunction(t.with_create_or_alter(true)), false),
        );

        entries.sort_by(|a, b| {
            (a.category, a.action, &a.name).cmp(&(b.category, b.action, &b.name))
        });

        let plan = DeltaPlan { entries };
        log::info!(
            "Computed delta; drops={}, creates={}, alters={}, unchanged={}",
            plan.count(DeltaAction::Drop),
            plan.count(DeltaAction::Create),
            plan.count(DeltaAction::Alter),
            plan.count(DeltaAction::Unchanged)
        );
        plan
    }

    /// Commands that take `self` to `target`, in apply order.
    pub fn compute_delta(&self, target: &SchemaSnapshot) -> Vec<Command> {
        self.plan(target).commands()
    }

    /// Commands recreating the whole snapshot, tables first.
    pub fn to_commands(&self) -> Vec<Command> {
        self.tables
            .values()
            .map(|t| Command::CreateTable(t.clone()))
            .chain(
                self.functions
                    .values()
                    .map(|f| Command::CreateFunction(f.with_create_or_alter(false))),
            )
            .collect()
    }

    /// Script recreating the whole snapshot.
    pub fn to_script(&self) -> String {
        render_script(&self.to_commands())
    }
}

/// Classify one category. Each builder returns the command for a changed
/// name and whether applying it loses data.
fn plan_category<T: PartialEq>(
    entries: &mut Vec<DeltaEntry>,
    category: Category,
    current: &BTreeMap<String, T>,
    target: &BTreeMap<String, T>,
    create: impl Fn(&T) -> (Command, bool),
    drop: impl Fn(&T) -> (Command, bool),
    alter: impl Fn(&T, &T) -> (Command, bool),
) {
    let names: BTreeSet<&String> = current.keys().chain(target.keys()).collect();

    for name in names {
        let (action, change) = match (current.get(name), target.get(name)) {
            (Some(c), Some(t)) if c == t => (DeltaAction::Unchanged, None),
            (Some(c), Some(t)) => (DeltaAction::Alter, Some(alter(c, t))),
            (Some(c), None) => (DeltaAction::Drop, Some(drop(c))),
            (None, Some(t)) => (DeltaAction::Create, Some(create(t))),
            (None, None) => continue,
        };
        let (command, data_loss) = match change {
            Some((command, data_loss)) => (Some(command), data_loss),
            None => (None, false),
        };
        entries.push(DeltaEntry {
            category,
            name: name.clone(),
            action,
            data_loss,
            command,
        });
    }
}

fn table_from_schema(table: &TableSchema) -> Result<CreateTableCommand> {
    if table.ordered_columns.is_empty() {
        return Err(DeltaError::SchemaParse(format!(
            "table '{}' has no columns",
            table.name
        )));
    }
    let columns = table
        .ordered_columns
        .iter()
        .map(|c| ColumnDef::new(&c.name, &c.csl_type))
        .collect();
    Ok(CreateTableCommand::new(
        &table.name,
        columns,
        QuotedText::from_text(table.folder.as_deref()),
        QuotedText::from_text(table.doc_string.as_deref()),
    ))
}

fn function_from_schema(function: &FunctionSchema) -> Result<CreateFunctionCommand> {
    let parameters = function
        .input_parameters
        .iter()
        .map(parameter_from_schema)
        .collect();
    CreateFunctionCommand::new(
        &function.name,
        parameters,
        &function.body,
        QuotedText::from_text(function.folder.as_deref()),
        QuotedText::from_text(function.doc_string.as_deref()),
        false,
    )
}

fn parameter_from_schema(input: &InputParameterSchema) -> Parameter {
    match &input.csl_type {
        Some(csl_type) => {
            Parameter::scalar(&input.name, csl_type, input.csl_default_value.as_deref())
        }
        None => Parameter::table(
            &input.name,
            input
                .columns
                .iter()
                .map(|c| TableParameterColumn::new(&c.name, &c.csl_type))
                .collect(),
        ),
    }
}
