//! Stored function commands and their parameter descriptors.

use crate::ddl::{normalize_type, quote_ident, render_properties};
use crate::error::{DeltaError, Result};
use crate::quoted_text::QuotedText;

/// Column of a tabular parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableParameterColumn {
    pub name: String,
    pub column_type: String,
}

impl TableParameterColumn {
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

/// Function parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Parameter {
    /// Scalar parameter with an optional default value expression.
    Scalar {
        name: String,
        param_type: String,
        default_value: Option<String>,
    },
    /// Tabular parameter. No columns means any schema, written `(*)`.
    Table {
        name: String,
        columns: Vec<TableParameterColumn>,
    },
}

impl Parameter {
    /// Scalar parameter. A blank default is treated as no default.
    pub fn scalar(name: impl Into<String>, param_type: &str, default_value: Option<&str>) -> Self {
        Parameter::Scalar {
            name: name.into(),
            param_type: normalize_type(param_type),
            default_value: default_value
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        }
    }

    pub fn table(name: impl Into<String>, columns: Vec<TableParameterColumn>) -> Self {
        Parameter::Table {
            name: name.into(),
            columns,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Parameter::Scalar { name, .. } | Parameter::Table { name, .. } => name,
        }
    }

    fn render(&self) -> String {
        match self {
            Parameter::Scalar {
                name,
                param_type,
                default_value,
            } => match default_value {
                Some(default) => format!("{}:{}={}", quote_ident(name), param_type, default),
                None => format!("{}:{}", quote_ident(name), param_type),
            },
            Parameter::Table { name, columns } if columns.is_empty() => {
                format!("{}:(*)", quote_ident(name))
            }
            Parameter::Table { name, columns } => {
                let cols: Vec<String> = columns.iter().map(TableParameterColumn::render).collect();
                format!("{}:({})", quote_ident(name), cols.join(", "))
            }
        }
    }
}

/// `.create function` / `.create-or-alter function`.
///
/// Equality covers name, parameters, body, folder and doc string. The
/// `is_create_or_alter` flag only picks the keyword used when rendering.
#[derive(Debug, Clone)]
pub struct CreateFunctionCommand {
    pub(crate) name: String,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) body: String,
    pub(crate) folder: Option<QuotedText>,
    pub(crate) doc_string: Option<QuotedText>,
    pub(crate) is_create_or_alter: bool,
}

impl CreateFunctionCommand {
    /// Build a function from a brace-delimited body as written in a script
    /// or returned by the service.
    pub fn new(
        name: impl Into<String>,
        parameters: Vec<Parameter>,
        body: &str,
        folder: Option<QuotedText>,
        doc_string: Option<QuotedText>,
        is_create_or_alter: bool,
    ) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            parameters,
            body: trim_function_body(body)?,
            folder,
            doc_string,
            is_create_or_alter,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Body without its braces and surrounding whitespace.
    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn folder(&self) -> Option<&QuotedText> {
        self.folder.as_ref()
    }

    pub fn doc_string(&self) -> Option<&QuotedText> {
        self.doc_string.as_ref()
    }

    pub fn is_create_or_alter(&self) -> bool {
        self.is_create_or_alter
    }

    /// Same definition with the given rendering keyword.
    pub fn with_create_or_alter(&self, is_create_or_alter: bool) -> Self {
        Self {
            is_create_or_alter,
            ..self.clone()
        }
    }

    pub fn render(&self) -> String {
        let mut header = if self.is_create_or_alter {
            ".create-or-alter function".to_string()
        } else {
            ".create function".to_string()
        };
        if let Some(props) = render_properties(self.folder.as_ref(), self.doc_string.as_ref()) {
            header.push(' ');
            header.push_str(&props);
        }
        let params: Vec<String> = self.parameters.iter().map(Parameter::render).collect();

        format!(
            "{} {}({})\n{{\n{}\n}}",
            header,
            quote_ident(&self.name),
            params.join(", "),
            self.body
        )
    }
}

impl PartialEq for CreateFunctionCommand {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.parameters == other.parameters
            && self.body == other.body
            && self.folder == other.folder
            && self.doc_string == other.doc_string
    }
}

impl Eq for CreateFunctionCommand {}

/// `.drop function`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DropFunctionCommand {
    pub(crate) name: String,
}

impl DropFunctionCommand {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn render(&self) -> String {
        format!(".drop function {}", quote_ident(&self.name))
    }
}

/// Strip the braces and surrounding whitespace from a function body.
///
/// Rejects bodies that are not brace-delimited and bodies that are empty
/// once the braces are removed.
pub fn trim_function_body(body: &str) -> Result<String> {
    let trimmed = body.trim();

    if trimmed.chars().count() < 2 {
        return Err(DeltaError::MalformedFunctionBody {
            reason: "body should be at least 2 characters".to_string(),
            body: body.to_string(),
        });
    }
    if !trimmed.starts_with('{') || !trimmed.ends_with('}') {
        return Err(DeltaError::MalformedFunctionBody {
            reason: "body should be surrounded by curly braces".to_string(),
            body: body.to_string(),
        });
    }

    // Inner trim drops the line breaks around the braces so they do not
    // accumulate across render/parse cycles.
    let inner = trimmed[1..trimmed.len() - 1].trim();
    if inner.is_empty() {
        return Err(DeltaError::MalformedFunctionBody {
            reason: "body is empty".to_string(),
            body: body.to_string(),
        });
    }

    Ok(inner.to_string())
}
