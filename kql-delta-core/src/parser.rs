//! Control-command script parsing.
//!
//! Only the schema-declaring subset is understood: function and table
//! definitions and their drops. Query text inside a function body is kept
//! verbatim and never interpreted.

use std::sync::LazyLock;

use regex_lite::Regex;

use crate::ddl::{
    AlterTableCommand, ColumnDef, Command, CreateFunctionCommand, CreateTableCommand,
    DropFunctionCommand, DropTableCommand, Parameter, TableParameterColumn,
};
use crate::error::{DeltaError, Result};
use crate::quoted_text::{self, QuotedText};

/// Raw text of one command and the line it starts on (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandText<'a> {
    pub line: usize,
    pub text: &'a str,
}

// Command headers. Order matters where one keyword prefixes another.
static FUNCTION_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\.(create-or-alter|create|alter)\s+function\b").unwrap()
});

static DROP_FUNCTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\.drop\s+function\b").unwrap());

static TABLE_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\.(create-merge|create|alter)\s+table\b").unwrap()
});

static DROP_TABLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\.drop\s+table\b").unwrap());

/// Parse a whole script into commands, in script order.
pub fn parse_script(script: &str) -> Result<Vec<Command>> {
    let texts = split_commands(script)?;
    let mut commands = Vec::with_capacity(texts.len());
    for text in texts {
        commands.push(parse_command(text)?);
    }
    log::debug!("Parsed script; commands={}", commands.len());
    Ok(commands)
}

/// Split a script into individual commands.
///
/// A command starts with `.` at the beginning of a line, outside of any
/// string literal, comment or bracketed block, and runs until the next one.
/// Anything but whitespace and `//` comments before the first command is an
/// error.
pub fn split_commands(script: &str) -> Result<Vec<CommandText<'_>>> {
    let bytes = script.as_bytes();
    let len = bytes.len();
    let mut commands = Vec::new();
    let mut current: Option<(usize, usize)> = None;
    let mut depth = 0usize;
    let mut line = 1;
    let mut at_line_start = true;
    let mut i = 0;

    while i < len {
        match bytes[i] {
            b'\n' => {
                line += 1;
                at_line_start = true;
                i += 1;
                continue;
            }
            b' ' | b'\t' | b'\r' => {
                i += 1;
                continue;
            }
            // Line comment
            b'/' if i + 1 < len && bytes[i + 1] == b'/' => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
                continue;
            }
            b'.' if at_line_start && depth == 0 => {
                if let Some((start_line, start)) = current.take() {
                    push_command(&mut commands, start_line, &script[start..i]);
                }
                current = Some((line, i));
            }
            _ if current.is_none() => {
                return Err(DeltaError::ScriptParse {
                    line,
                    reason: "text outside of a control command".to_string(),
                });
            }
            b'"' | b'\'' => {
                let verbatim = i > 0 && bytes[i - 1] == b'@';
                let end = scan_string(bytes, i, verbatim).ok_or_else(|| DeltaError::ScriptParse {
                    line,
                    reason: "unterminated string literal".to_string(),
                })?;
                line += bytes[i..end].iter().filter(|b| **b == b'\n').count();
                at_line_start = false;
                i = end;
                continue;
            }
            b'`' if bytes[i..].starts_with(MULTILINE_QUOTE) => {
                let end = scan_multiline_string(bytes, i).ok_or_else(|| DeltaError::ScriptParse {
                    line,
                    reason: "unterminated multi-line string literal".to_string(),
                })?;
                line += bytes[i..end].iter().filter(|b| **b == b'\n').count();
                at_line_start = false;
                i = end;
                continue;
            }
            b'{' | b'(' | b'[' => depth += 1,
            b'}' | b')' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
        at_line_start = false;
        i += 1;
    }

    if let Some((start_line, start)) = current {
        push_command(&mut commands, start_line, &script[start..]);
    }

    Ok(commands)
}

fn push_command<'a>(commands: &mut Vec<CommandText<'a>>, line: usize, text: &'a str) {
    commands.push(CommandText {
        line,
        text: text.trim_end(),
    });
}

/// Return the offset just past the string literal whose opening quote is at
/// `start`, or `None` if it never closes.
fn scan_string(bytes: &[u8], start: usize, verbatim: bool) -> Option<usize> {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\\' && !verbatim {
            i += 2;
            continue;
        }
        if b == quote {
            if verbatim && i + 1 < bytes.len() && bytes[i + 1] == quote {
                i += 2;
                continue;
            }
            return Some(i + 1);
        }
        if b == b'\n' && !verbatim {
            return None;
        }
        i += 1;
    }
    None
}

const MULTILINE_QUOTE: &[u8] = b"```";

/// Return the offset just past the ```` ``` ```` literal opened at `start`.
/// The content is raw: no escapes, line breaks allowed.
fn scan_multiline_string(bytes: &[u8], start: usize) -> Option<usize> {
    let body = start + MULTILINE_QUOTE.len();
    bytes
        .get(body..)?
        .windows(MULTILINE_QUOTE.len())
        .position(|w| w == MULTILINE_QUOTE)
        .map(|offset| body + offset + MULTILINE_QUOTE.len())
}

/// Parse one command.
pub fn parse_command(command: CommandText<'_>) -> Result<Command> {
    let text = command.text;

    if let Some(caps) = FUNCTION_HEADER_RE.captures(text) {
        let is_create_or_alter = !caps[1].eq_ignore_ascii_case("create");
        let mut cursor = Cursor::new(text, caps.get(0).map_or(0, |m| m.end()), command.line);
        return parse_create_function(&mut cursor, is_create_or_alter);
    }

    if let Some(m) = DROP_FUNCTION_RE.find(text) {
        let mut cursor = Cursor::new(text, m.end(), command.line);
        let name = parse_drop_target(&mut cursor)?;
        return Ok(Command::DropFunction(DropFunctionCommand::new(name)));
    }

    if let Some(caps) = TABLE_HEADER_RE.captures(text) {
        let is_alter = caps[1].eq_ignore_ascii_case("alter");
        let mut cursor = Cursor::new(text, caps.get(0).map_or(0, |m| m.end()), command.line);
        let table = parse_table(&mut cursor)?;
        return Ok(if is_alter {
            Command::AlterTable(AlterTableCommand::from(&table))
        } else {
            Command::CreateTable(table)
        });
    }

    if let Some(m) = DROP_TABLE_RE.find(text) {
        let mut cursor = Cursor::new(text, m.end(), command.line);
        let name = parse_drop_target(&mut cursor)?;
        return Ok(Command::DropTable(DropTableCommand::new(name)));
    }

    let preview: String = text.lines().next().unwrap_or("").chars().take(60).collect();
    Err(DeltaError::ScriptParse {
        line: command.line,
        reason: format!("unrecognized command '{}'", preview),
    })
}

fn parse_create_function(cursor: &mut Cursor<'_>, is_create_or_alter: bool) -> Result<Command> {
    cursor.keyword("ifnotexists");
    let (folder, doc_string) = if cursor.keyword("with") {
        parse_properties(cursor, true)?
    } else {
        (None, None)
    };
    let name = cursor.identifier()?;
    cursor.expect('(')?;
    let parameters = parse_parameters(cursor)?;
    let body = cursor.brace_block()?;
    cursor.expect_end()?;

    let function =
        CreateFunctionCommand::new(name, parameters, body, folder, doc_string, is_create_or_alter)?;
    Ok(Command::CreateFunction(function))
}

/// Parameters after the opening parenthesis, through the closing one.
fn parse_parameters(cursor: &mut Cursor<'_>) -> Result<Vec<Parameter>> {
    let mut parameters = Vec::new();
    if cursor.eat(')') {
        return Ok(parameters);
    }

    loop {
        let name = cursor.identifier()?;
        cursor.expect(':')?;
        if cursor.eat('(') {
            let columns = if cursor.eat('*') {
                cursor.expect(')')?;
                Vec::new()
            } else {
                parse_columns(cursor)?
                    .into_iter()
                    .map(|c| TableParameterColumn::new(c.name, &c.column_type))
                    .collect()
            };
            parameters.push(Parameter::table(name, columns));
        } else {
            let param_type = cursor.type_name()?;
            let default_value = if cursor.eat('=') {
                Some(cursor.expression()?)
            } else {
                None
            };
            parameters.push(Parameter::scalar(name, &param_type, default_value.as_deref()));
        }

        if cursor.eat(')') {
            return Ok(parameters);
        }
        cursor.expect(',')?;
    }
}

/// `name:type` pairs after an opening parenthesis, through the closing one.
fn parse_columns(cursor: &mut Cursor<'_>) -> Result<Vec<ColumnDef>> {
    let mut columns = Vec::new();
    loop {
        let name = cursor.identifier()?;
        cursor.expect(':')?;
        let column_type = cursor.type_name()?;
        columns.push(ColumnDef::new(name, &column_type));
        if cursor.eat(')') {
            return Ok(columns);
        }
        cursor.expect(',')?;
    }
}

fn parse_table(cursor: &mut Cursor<'_>) -> Result<CreateTableCommand> {
    let name = cursor.identifier()?;
    cursor.expect('(')?;
    if cursor.eat(')') {
        return Err(cursor.error("a table needs at least one column"));
    }
    let columns = parse_columns(cursor)?;
    let (folder, doc_string) = if cursor.keyword("with") {
        parse_properties(cursor, false)?
    } else {
        (None, None)
    };
    cursor.expect_end()?;
    Ok(CreateTableCommand::new(name, columns, folder, doc_string))
}

fn parse_drop_target(cursor: &mut Cursor<'_>) -> Result<String> {
    let name = cursor.identifier()?;
    cursor.keyword("ifexists");
    cursor.expect_end()?;
    Ok(name)
}

/// `with (key=value, ...)`, returning folder and doc string.
fn parse_properties(
    cursor: &mut Cursor<'_>,
    is_function: bool,
) -> Result<(Option<QuotedText>, Option<QuotedText>)> {
    let mut folder = None;
    let mut doc_string = None;
    cursor.expect('(')?;
    if cursor.eat(')') {
        return Ok((folder, doc_string));
    }

    loop {
        let key = cursor.identifier()?;
        cursor.expect('=')?;
        let value = cursor.property_value()?;
        match key.to_ascii_lowercase().as_str() {
            "folder" => folder = QuotedText::from_text(Some(&value)),
            "docstring" => doc_string = QuotedText::from_text(Some(&value)),
            "skipvalidation" if is_function => {
                log::debug!("Ignoring property; key={}, value={}", key, value);
            }
            _ => return Err(cursor.error(&format!("unsupported property '{}'", key))),
        }
        if cursor.eat(')') {
            return Ok((folder, doc_string));
        }
        cursor.expect(',')?;
    }
}

/// Position within one command's text.
struct Cursor<'a> {
    src: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str, pos: usize, line: usize) -> Self {
        Self { src, pos, line }
    }

    fn error(&self, reason: &str) -> DeltaError {
        let consumed = &self.src[..self.pos.min(self.src.len())];
        DeltaError::ScriptParse {
            line: self.line + consumed.matches('\n').count(),
            reason: reason.to_string(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// Skip whitespace and `//` comments.
    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if trimmed.starts_with("//") {
                let skip = trimmed.find('\n').unwrap_or(trimmed.len());
                self.pos += skip;
            } else {
                return;
            }
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_trivia();
        self.rest().chars().next()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, c: char) -> Result<()> {
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c)))
        }
    }

    fn expect_end(&mut self) -> Result<()> {
        if self.peek().is_none() {
            Ok(())
        } else {
            Err(self.error("unexpected text after command"))
        }
    }

    fn word_len(&self) -> usize {
        self.rest()
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count()
    }

    /// Consume `kw` if it is the next whole word (case-insensitive).
    fn keyword(&mut self, kw: &str) -> bool {
        self.skip_trivia();
        let len = self.word_len();
        if len == kw.len() && self.rest()[..len].eq_ignore_ascii_case(kw) {
            self.pos += len;
            true
        } else {
            false
        }
    }

    /// A plain identifier or a bracket-quoted one: `['name']`, `["name"]`.
    fn identifier(&mut self) -> Result<String> {
        self.skip_trivia();
        if self.rest().starts_with('[') {
            self.pos += 1;
            let name = self.string_literal()?;
            self.expect(']')?;
            return Ok(name);
        }
        let first = self.rest().bytes().next();
        let len = self.word_len();
        match first {
            Some(b) if len > 0 && !b.is_ascii_digit() => {
                let name = self.rest()[..len].to_string();
                self.pos += len;
                Ok(name)
            }
            _ => Err(self.error("expected an identifier")),
        }
    }

    fn type_name(&mut self) -> Result<String> {
        self.skip_trivia();
        let len = self.word_len();
        if len == 0 {
            return Err(self.error("expected a type name"));
        }
        let name = self.rest()[..len].to_string();
        self.pos += len;
        Ok(name)
    }

    fn string_literal(&mut self) -> Result<String> {
        self.skip_trivia();
        let bytes = self.src.as_bytes();
        let verbatim = self.rest().starts_with('@');
        let quote_at = if verbatim { self.pos + 1 } else { self.pos };
        if !matches!(bytes.get(quote_at), Some(b'"') | Some(b'\'')) {
            return Err(self.error("expected a string literal"));
        }
        let end = scan_string(bytes, quote_at, verbatim)
            .ok_or_else(|| self.error("unterminated string literal"))?;
        let literal = &self.src[self.pos..end];
        let value = quoted_text::decode(literal)
            .ok_or_else(|| self.error("malformed string literal"))?;
        self.pos = end;
        Ok(value)
    }

    /// A property value: a string literal or a bare word such as `true`.
    fn property_value(&mut self) -> Result<String> {
        match self.peek() {
            Some('"') | Some('\'') | Some('@') => self.string_literal(),
            _ => self.type_name(),
        }
    }

    /// Default-value expression, up to the next top-level `,` or `)`.
    fn expression(&mut self) -> Result<String> {
        self.skip_trivia();
        let bytes = self.src.as_bytes();
        let start = self.pos;
        let mut depth = 0usize;
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                b'"' | b'\'' => {
                    let verbatim = i > start && bytes[i - 1] == b'@';
                    i = scan_string(bytes, i, verbatim)
                        .ok_or_else(|| self.error("unterminated string literal"))?;
                    continue;
                }
                b'`' if bytes[i..].starts_with(MULTILINE_QUOTE) => {
                    i = scan_multiline_string(bytes, i)
                        .ok_or_else(|| self.error("unterminated multi-line string literal"))?;
                    continue;
                }
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b',' if depth == 0 => break,
                b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                _ => {}
            }
            i += 1;
        }
        let expr = self.src[start..i].trim();
        if expr.is_empty() {
            return Err(self.error("expected a default value"));
        }
        self.pos = i;
        Ok(expr.to_string())
    }

    /// A `{ ... }` block including its braces. Nested braces and braces
    /// inside string literals or comments are skipped.
    fn brace_block(&mut self) -> Result<&'a str> {
        self.skip_trivia();
        let bytes = self.src.as_bytes();
        let start = self.pos;
        if bytes.get(start) != Some(&b'{') {
            return Err(self.error("expected '{' to open the function body"));
        }
        let mut depth = 0usize;
        let mut i = start;
        while i < bytes.len() {
            match bytes[i] {
                b'"' | b'\'' => {
                    let verbatim = i > 0 && bytes[i - 1] == b'@';
                    i = scan_string(bytes, i, verbatim)
                        .ok_or_else(|| self.error("unterminated string literal in body"))?;
                    continue;
                }
                b'`' if bytes[i..].starts_with(MULTILINE_QUOTE) => {
                    i = scan_multiline_string(bytes, i)
                        .ok_or_else(|| self.error("unterminated multi-line string literal in body"))?;
                    continue;
                }
                b'/' if i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                    while i < bytes.len() && bytes[i] != b'\n' {
                        i += 1;
                    }
                    continue;
                }
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        self.pos = i + 1;
                        return Ok(&self.src[start..=i]);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Err(self.error("function body is missing its closing '}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(script: &str) -> Command {
        let mut commands = parse_script(script).unwrap();
        assert_eq!(commands.len(), 1, "expected one command in {:?}", script);
        commands.remove(0)
    }

    fn function(script: &str) -> CreateFunctionCommand {
        match single(script) {
            Command::CreateFunction(f) => f,
            other => panic!("expected a function, got {:?}", other),
        }
    }

    #[test]
    fn test_split_commands() {
        let script = "// header\n.create function F1() { 1 }\n\n.create function F2() {\n  2\n}\n";
        let commands = split_commands(script).unwrap();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].line, 2);
        assert_eq!(commands[0].text, ".create function F1() { 1 }");
        assert_eq!(commands[1].line, 4);
        assert_eq!(commands[1].text, ".create function F2() {\n  2\n}");
    }

    #[test]
    fn test_split_ignores_dots_inside_blocks_and_strings() {
        let script = ".create function F() {\n.5 + 1\n}\n.create function G() { \"\n.x\" }";
        // The string literal spans a line break, which is not valid in a
        // regular literal.
        assert!(split_commands(script).is_err());

        let script = ".create function F() {\n.5 + 1\n}\n.create function G() { 'a.b' }";
        let commands = split_commands(script).unwrap();
        assert_eq!(commands.len(), 2);
        assert!(commands[0].text.ends_with(".5 + 1\n}"));
    }

    #[test]
    fn test_split_rejects_stray_text() {
        let err = split_commands("\n\nT | take 10\n").unwrap_err();
        assert!(matches!(err, DeltaError::ScriptParse { line: 3, .. }));
    }

    #[test]
    fn test_split_empty_script() {
        assert!(split_commands("").unwrap().is_empty());
        assert!(split_commands("// only a comment\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_parse_simple_function() {
        let f = function(".create function F1(x:long) { x }");
        assert_eq!(f.name(), "F1");
        assert_eq!(f.parameters(), &[Parameter::scalar("x", "long", None)]);
        assert_eq!(f.body(), "x");
        assert!(!f.is_create_or_alter());
    }

    #[test]
    fn test_parse_create_or_alter_with_properties() {
        let f = function(
            ".create-or-alter function with (docstring = 'Daily \"top\" rows', folder=@\"Reports\\Daily\", skipvalidation = \"true\")\n\
             TopRows(T:(Name:string, ['Count']:int64), n:long = 10, Any:(*))\n{\n    T\n    | top n by Count\n}",
        );
        assert!(f.is_create_or_alter());
        assert_eq!(f.folder(), Some(&QuotedText::new("Reports\\Daily")));
        assert_eq!(f.doc_string(), Some(&QuotedText::new("Daily \"top\" rows")));
        assert_eq!(
            f.parameters(),
            &[
                Parameter::table(
                    "T",
                    vec![
                        TableParameterColumn::new("Name", "string"),
                        TableParameterColumn::new("Count", "long"),
                    ]
                ),
                Parameter::scalar("n", "long", Some("10")),
                Parameter::table("Any", Vec::new()),
            ]
        );
        assert_eq!(f.body(), "T\n    | top n by Count");
    }

    #[test]
    fn test_parse_default_with_nested_commas() {
        let f = function(".create function F(d:dynamic = dynamic([1, 2]), s:string = \"a,b\") { d }");
        assert_eq!(
            f.parameters(),
            &[
                Parameter::scalar("d", "dynamic", Some("dynamic([1, 2])")),
                Parameter::scalar("s", "string", Some("\"a,b\"")),
            ]
        );
    }

    #[test]
    fn test_parse_body_with_braces_in_strings_and_comments() {
        let f = function(".create function F() {\n  print s = \"}\" // closing } here\n  | extend x = dynamic({\"a\": 1})\n}");
        assert_eq!(
            f.body(),
            "print s = \"}\" // closing } here\n  | extend x = dynamic({\"a\": 1})"
        );
    }

    #[test]
    fn test_parse_body_with_multiline_string() {
        let commands = parse_script(
            ".create function F() {\n print s = ```it's {\n.not a command\n```\n}\n.create function G() { 1 }",
        )
        .unwrap();
        assert_eq!(commands.len(), 2);
        match &commands[0] {
            Command::CreateFunction(f) => {
                assert_eq!(f.body(), "print s = ```it's {\n.not a command\n```")
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(commands[1].object_name(), "G");

        let err = parse_script(".create function F() {\n print s = ```open\n}").unwrap_err();
        assert!(err.to_string().contains("multi-line string"), "{err}");
    }

    #[test]
    fn test_parse_alter_function_is_create_or_alter() {
        assert!(function(".alter function F() { 1 }").is_create_or_alter());
        assert!(function(".CREATE FUNCTION ifnotexists F() { 1 }").name() == "F");
    }

    #[test]
    fn test_parse_empty_body_rejected() {
        let err = parse_script(".create function F() {  }").unwrap_err();
        assert!(matches!(err, DeltaError::MalformedFunctionBody { .. }));
    }

    #[test]
    fn test_parse_drop_function() {
        assert_eq!(
            single(".drop function ['my func'] ifexists"),
            Command::DropFunction(DropFunctionCommand::new("my func"))
        );
    }

    #[test]
    fn test_parse_tables() {
        let script = ".create table Events (Timestamp:datetime, Level:string) with (folder=\"Raw\")\n\
                      .create-merge table Logs (Message:string)\n\
                      .alter table Events (Timestamp:datetime)\n\
                      .drop table Old";
        let commands = parse_script(script).unwrap();
        assert_eq!(commands.len(), 4);
        match &commands[0] {
            Command::CreateTable(t) => {
                assert_eq!(t.name(), "Events");
                assert_eq!(t.columns().len(), 2);
                assert_eq!(t.folder(), Some(&QuotedText::new("Raw")));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(commands[1], Command::CreateTable(_)));
        assert!(matches!(commands[2], Command::AlterTable(_)));
        assert_eq!(commands[3], Command::DropTable(DropTableCommand::new("Old")));
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let err = parse_script("// c\n.create function F(x long) { x }").unwrap_err();
        match err {
            DeltaError::ScriptParse { line, reason } => {
                assert_eq!(line, 2);
                assert_eq!(reason, "expected ':'");
            }
            other => panic!("unexpected {other}"),
        }
    }

    #[test]
    fn test_parse_unrecognized_command() {
        let err = parse_script(".alter database Db policy caching hot = 1d").unwrap_err();
        match err {
            DeltaError::ScriptParse { reason, .. } => assert!(reason.contains("unrecognized")),
            other => panic!("unexpected {other}"),
        }
        assert!(parse_script(".create tables A (x:int)").is_err());
    }

    #[test]
    fn test_parse_unsupported_property() {
        let err = parse_script(".create table T (x:int) with (skipvalidation=true)").unwrap_err();
        assert!(matches!(err, DeltaError::ScriptParse { .. }));
    }

    #[test]
    fn test_trailing_text_rejected() {
        assert!(parse_script(".create function F() { 1 } extra").is_err());
        assert!(parse_script(".drop table T now").is_err());
    }

    #[test]
    fn test_render_parse_round_trip() {
        let original = function(
            ".create function with (folder=\"A\\\\B\", docstring=\"line1\\nline2\") ['Odd Name'](T:(a:string), x:real=1.5) {\n  T | where a != \"{\" | extend y = x\n}",
        );
        let reparsed = function(&original.render());
        assert_eq!(original, reparsed);
        assert_eq!(reparsed.doc_string(), Some(&QuotedText::new("line1\nline2")));
    }

    #[test]
    fn test_keyword_names_round_trip() {
        let f = CreateFunctionCommand::new("with", Vec::new(), "{ 1 }", None, None, false).unwrap();
        assert_eq!(f.render(), ".create function ['with']()\n{\n1\n}");
        assert_eq!(function(&f.render()), f);

        let t = Command::DropTable(DropTableCommand::new("ifexists"));
        assert_eq!(single(&t.render()), t);
    }
}
