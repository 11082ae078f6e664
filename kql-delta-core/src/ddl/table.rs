//! Table commands.

use crate::ddl::{normalize_type, quote_ident, render_properties};
use crate::quoted_text::QuotedText;

/// Table column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: &str) -> Self {
        Self {
            name: name.into(),
            column_type: normalize_type(column_type),
        }
    }

    fn render(&self) -> String {
        format!("{}:{}", quote_ident(&self.name), self.column_type)
    }
}

fn render_table(
    keyword: &str,
    name: &str,
    columns: &[ColumnDef],
    folder: Option<&QuotedText>,
    doc_string: Option<&QuotedText>,
) -> String {
    let cols: Vec<String> = columns.iter().map(ColumnDef::render).collect();
    let mut text = format!("{} {} ({})", keyword, quote_ident(name), cols.join(", "));
    if let Some(props) = render_properties(folder, doc_string) {
        text.push(' ');
        text.push_str(&props);
    }
    text
}

/// `.create table`. Column order is part of the definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTableCommand {
    pub(crate) name: String,
    pub(crate) columns: Vec<ColumnDef>,
    pub(crate) folder: Option<QuotedText>,
    pub(crate) doc_string: Option<QuotedText>,
}

impl CreateTableCommand {
    pub fn new(
        name: impl Into<String>,
        columns: Vec<ColumnDef>,
        folder: Option<QuotedText>,
        doc_string: Option<QuotedText>,
    ) -> Self {
        Self {
            name: name.into(),
            columns,
            folder,
            doc_string,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn folder(&self) -> Option<&QuotedText> {
        self.folder.as_ref()
    }

    pub fn doc_string(&self) -> Option<&QuotedText> {
        self.doc_string.as_ref()
    }

    /// Whether replacing this definition with `target` drops a column or
    /// changes a column's type.
    pub fn loses_data_to(&self, target: &CreateTableCommand) -> bool {
        self.columns.iter().any(|current| {
            !target
                .columns
                .iter()
                .any(|c| c.name == current.name && c.column_type == current.column_type)
        })
    }

    pub fn render(&self) -> String {
        render_table(
            ".create table",
            &self.name,
            &self.columns,
            self.folder.as_ref(),
            self.doc_string.as_ref(),
        )
    }
}

/// `.alter table`: replaces the whole column list of an existing table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlterTableCommand {
    pub(crate) name: String,
    pub(crate) columns: Vec<ColumnDef>,
    pub(crate) folder: Option<QuotedText>,
    pub(crate) doc_string: Option<QuotedText>,
}

impl AlterTableCommand {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn render(&self) -> String {
        render_table(
            ".alter table",
            &self.name,
            &self.columns,
            self.folder.as_ref(),
            self.doc_string.as_ref(),
        )
    }
}

impl From<&CreateTableCommand> for AlterTableCommand {
    fn from(table: &CreateTableCommand) -> Self {
        Self {
            name: table.name.clone(),
            columns: table.columns.clone(),
            folder: table.folder.clone(),
            doc_string: table.doc_string.clone(),
        }
    }
}

/// `.drop table`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropTableCommand {
    pub(crate) name: String,
}

impl DropTableCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self) -> String {
        format!(".drop table {}", quote_ident(&self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events(columns: &[(&str, &str)]) -> CreateTableCommand {
        CreateTableCommand::new(
            "Events",
            columns.iter().map(|(n, t)| ColumnDef::new(*n, t)).collect(),
            None,
            None,
        )
    }

    #[test]
    fn test_render_create_table() {
        let table = CreateTableCommand::new(
            "Events",
            vec![ColumnDef::new("Timestamp", "datetime"), ColumnDef::new("Level", "string")],
            Some(QuotedText::new("Raw")),
            None,
        );
        assert_eq!(
            table.render(),
            ".create table Events (Timestamp:datetime, Level:string) with (folder=\"Raw\")"
        );
    }

    #[test]
    fn test_render_alter_and_drop() {
        let table = events(&[("Id", "long")]);
        assert_eq!(
            AlterTableCommand::from(&table).render(),
            ".alter table Events (Id:long)"
        );
        assert_eq!(DropTableCommand::new("Events").render(), ".drop table Events");
    }

    #[test]
    fn test_column_order_matters() {
        assert_ne!(
            events(&[("a", "long"), ("b", "string")]),
            events(&[("b", "string"), ("a", "long")])
        );
    }

    #[test]
    fn test_type_alias_equal() {
        assert_eq!(events(&[("a", "int64")]), events(&[("a", "long")]));
    }

    #[test]
    fn test_loses_data_to() {
        let current = events(&[("a", "long"), ("b", "string")]);
        assert!(!current.loses_data_to(&events(&[("a", "long"), ("b", "string"), ("c", "real")])));
        assert!(!current.loses_data_to(&events(&[("b", "string"), ("a", "long")])));
        assert!(current.loses_data_to(&events(&[("a", "long")])));
        assert!(current.loses_data_to(&events(&[("a", "string"), ("b", "string")])));
    }
}
