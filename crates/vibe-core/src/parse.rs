//! Line-oriented, tolerant parser for the architecture Markdown schema.
//!
//! Parsing never fails in [`ParseMode::Lenient`]. Lines that cannot be attributed
//! to a schema element are kept: inside a node block they join that node's
//! description, anywhere else they join the project context. Everything after an
//! unknown `##` heading is kept verbatim as the document appendix.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::rules::{
    DATA_MODELS_KEY, PROJECT_CONTEXT_MARKER, ROUTES_KEY, SENDS_DATA_TO, TABLE_PREFIX, TITLE,
    VISUAL_STYLE_MARKER,
};
use crate::{
    ArchitectureDocument, Connection, DataModel, Error, Field, FieldKind, Method, Node, NodeType,
    Result, Route,
};

/// How parse policies for hand-edited documents are applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Duplicate headings: last one wins. Dangling connections: kept and flagged.
    #[default]
    Lenient,
    /// Duplicate headings and dangling connections are errors.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum WarningKind {
    InvalidPort { value: String },
    UnknownNodeType { value: String },
    UnknownMethod { value: String },
    UnknownFieldKind { value: String },
    UnrecognizedLine { text: String },
    DuplicateNode { name: String },
    #[serde(rename_all = "camelCase")]
    UnresolvedReference {
        source_name: String,
        target_name: String,
        missing: String,
    },
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::InvalidPort { value } => write!(f, "invalid port '{value}'"),
            WarningKind::UnknownNodeType { value } => {
                write!(f, "unknown node type '{value}', using custom")
            }
            WarningKind::UnknownMethod { value } => write!(f, "unknown route method '{value}'"),
            WarningKind::UnknownFieldKind { value } => write!(f, "unknown field type '{value}'"),
            WarningKind::UnrecognizedLine { text } => write!(f, "unrecognized line kept as text: {text}"),
            WarningKind::DuplicateNode { name } => {
                write!(f, "node '{name}' defined again, later definition wins")
            }
            WarningKind::UnresolvedReference {
                source_name,
                target_name,
                missing,
            } => write!(
                f,
                "connection {source_name} -> {target_name} references unknown node '{missing}'"
            ),
        }
    }
}

/// A non-fatal problem found while parsing. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub line: usize,
    #[serde(flatten)]
    pub kind: WarningKind,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedDocument {
    pub document: ArchitectureDocument,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedDocument {
    /// Parse result for a document that did not come from text.
    pub fn from_document(document: ArchitectureDocument) -> Self {
        let warnings = document
            .connections
            .iter()
            .flat_map(|c| unresolved_warnings(&document, c, 0))
            .collect();
        ParsedDocument { document, warnings }
    }

    pub fn unresolved(&self) -> impl Iterator<Item = &ParseWarning> {
        self.warnings
            .iter()
            .filter(|w| matches!(w.kind, WarningKind::UnresolvedReference { .. }))
    }
}

/// Parse in lenient mode. Never fails.
pub fn parse(text: &str) -> ParsedDocument {
    let mut parser = Parser::default();
    for (idx, line) in text.lines().enumerate() {
        parser.feed(idx + 1, line);
    }
    let parsed = parser.finish();
    debug!(
        nodes = parsed.document.nodes.len(),
        connections = parsed.document.connections.len(),
        warnings = parsed.warnings.len(),
        "parsed architecture document"
    );
    parsed
}

pub fn parse_with(text: &str, mode: ParseMode) -> Result<ParsedDocument> {
    let parsed = parse(text);
    if mode == ParseMode::Strict {
        for warning in &parsed.warnings {
            match &warning.kind {
                WarningKind::DuplicateNode { name } => {
                    return Err(Error::DuplicateNode(name.clone()));
                }
                WarningKind::UnresolvedReference {
                    source_name,
                    target_name,
                    missing,
                } => {
                    return Err(Error::UnresolvedReference {
                        source_name: source_name.clone(),
                        target_name: target_name.clone(),
                        missing: missing.clone(),
                    });
                }
                _ => {}
            }
        }
    }
    Ok(parsed)
}

fn unresolved_warnings(doc: &ArchitectureDocument, c: &Connection, line: usize) -> Vec<ParseWarning> {
    let mut missing = Vec::new();
    if doc.node(&c.source_name).is_none() {
        missing.push(c.source_name.clone());
    }
    if c.target_name != c.source_name && doc.node(&c.target_name).is_none() {
        missing.push(c.target_name.clone());
    }
    missing
        .into_iter()
        .map(|name| ParseWarning {
            line,
            kind: WarningKind::UnresolvedReference {
                source_name: c.source_name.clone(),
                target_name: c.target_name.clone(),
                missing: name,
            },
        })
        .collect()
}

// --- Parser state ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Section {
    #[default]
    Preamble,
    Overview,
    Connections,
    Appendix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Properties,
    Routes,
    DataModels,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Quote {
    #[default]
    Context,
    Visual,
}

struct NodeDraft {
    node: Node,
    block: Block,
    description: Vec<String>,
    line: usize,
}

impl NodeDraft {
    fn new(name: &str, line: usize) -> Self {
        NodeDraft {
            node: Node::new(name, NodeType::Custom),
            block: Block::Properties,
            description: Vec::new(),
            line,
        }
    }

    fn feed(&mut self, line_no: usize, trimmed: &str, warnings: &mut Vec<ParseWarning>) {
        if self.block == Block::DataModels {
            if let Some(name) = table_line(trimmed) {
                self.node.data_models.push(DataModel {
                    name: name.to_string(),
                    fields: Vec::new(),
                });
                return;
            }
        }

        if let Some((key, value)) = property_line(trimmed) {
            self.property(line_no, key, value, warnings);
            return;
        }

        match self.block {
            Block::Routes => match parse_route(trimmed) {
                Ok(route) => self.node.routes.push(route),
                Err(LineError::Unknown(value)) => {
                    warnings.push(ParseWarning {
                        line: line_no,
                        kind: WarningKind::UnknownMethod { value },
                    });
                    self.description.push(trimmed.to_string());
                }
                Err(LineError::Malformed) => self.keep(line_no, trimmed, warnings),
            },
            Block::DataModels => match parse_field(trimmed) {
                Ok(field) => match self.node.data_models.last_mut() {
                    Some(model) => model.fields.push(field),
                    None => self.keep(line_no, trimmed, warnings),
                },
                Err(LineError::Unknown(value)) => {
                    warnings.push(ParseWarning {
                        line: line_no,
                        kind: WarningKind::UnknownFieldKind { value },
                    });
                    self.description.push(trimmed.to_string());
                }
                Err(LineError::Malformed) => self.keep(line_no, trimmed, warnings),
            },
            Block::Properties => self.keep(line_no, trimmed, warnings),
        }
    }

    fn property(&mut self, line_no: usize, key: &str, value: &str, warnings: &mut Vec<ParseWarning>) {
        let lower = key.to_ascii_lowercase();
        self.block = if lower == ROUTES_KEY.to_ascii_lowercase() {
            Block::Routes
        } else if lower == DATA_MODELS_KEY.to_ascii_lowercase() {
            Block::DataModels
        } else {
            Block::Properties
        };

        match lower.as_str() {
            "type" => match value.parse::<NodeType>() {
                Ok(kind) => self.node.kind = kind,
                Err(()) => {
                    self.node.kind = NodeType::Custom;
                    if !value.is_empty() {
                        warnings.push(ParseWarning {
                            line: line_no,
                            kind: WarningKind::UnknownNodeType {
                                value: value.to_string(),
                            },
                        });
                        self.description.push(format!("{key}: {value}"));
                    }
                }
            },
            "technology" => self.node.technology = value.to_string(),
            "port" => {
                self.node.port = parse_port(value);
                if self.node.port.is_none() && !value.is_empty() {
                    warnings.push(ParseWarning {
                        line: line_no,
                        kind: WarningKind::InvalidPort {
                            value: value.to_string(),
                        },
                    });
                    self.description.push(format!("{key}: {value}"));
                }
            }
            "description" => push_nonempty(&mut self.description, value),
            _ if self.block != Block::Properties => {
                if !value.is_empty() {
                    self.description.push(format!("{key}: {value}"));
                }
            }
            _ if value.is_empty() => self.description.push(key.to_string()),
            _ => self.description.push(format!("{key}: {value}")),
        }
    }

    /// Unattributed line inside a node block: becomes description text.
    fn keep(&mut self, line_no: usize, trimmed: &str, warnings: &mut Vec<ParseWarning>) {
        warnings.push(ParseWarning {
            line: line_no,
            kind: WarningKind::UnrecognizedLine {
                text: trimmed.to_string(),
            },
        });
        self.description.push(trimmed.to_string());
    }
}

#[derive(Default)]
struct Parser {
    section: Section,
    quote: Quote,
    context: Vec<String>,
    visual: Vec<String>,
    nodes: Vec<Node>,
    current: Option<NodeDraft>,
    connections: Vec<(usize, Connection)>,
    appendix: Vec<String>,
    warnings: Vec<ParseWarning>,
}

impl Parser {
    fn feed(&mut self, line_no: usize, raw: &str) {
        let line = raw.trim_end();
        let trimmed = line.trim();

        if let Some(heading) = trimmed.strip_prefix("## ") {
            self.finish_node();
            self.section = known_section(heading).unwrap_or(Section::Appendix);
            if self.section == Section::Appendix {
                self.appendix.push(line.to_string());
            }
            return;
        }

        if self.section == Section::Appendix {
            self.appendix.push(line.to_string());
            return;
        }

        if let Some(heading) = trimmed.strip_prefix("### ") {
            if matches!(self.section, Section::Preamble | Section::Overview) {
                self.finish_node();
                let name = node_name(heading);
                if name.is_empty() {
                    self.stray(line_no, trimmed);
                } else {
                    self.section = Section::Overview;
                    self.current = Some(NodeDraft::new(name, line_no));
                }
                return;
            }
        }

        if trimmed.is_empty() {
            return;
        }

        match self.section {
            Section::Preamble => {
                if trimmed.eq_ignore_ascii_case(TITLE) {
                    return;
                }
                match trimmed.strip_prefix('>') {
                    Some(content) => self.quote_line(content),
                    None => self.stray(line_no, trimmed),
                }
            }
            Section::Overview => match self.current.as_mut() {
                Some(draft) => draft.feed(line_no, trimmed, &mut self.warnings),
                None => self.stray(line_no, trimmed),
            },
            Section::Connections => match parse_connection(trimmed) {
                Some(parsed) => {
                    for value in parsed.bad_ports {
                        self.warnings.push(ParseWarning {
                            line: line_no,
                            kind: WarningKind::InvalidPort { value },
                        });
                    }
                    self.connections.push((line_no, parsed.connection));
                }
                None => self.stray(line_no, trimmed),
            },
            Section::Appendix => self.appendix.push(line.to_string()),
        }
    }

    fn quote_line(&mut self, content: &str) {
        // One space after `>` belongs to the quote syntax; more is content.
        let content = content.strip_prefix(' ').unwrap_or(content);
        if let Some(rest) = content.strip_prefix(PROJECT_CONTEXT_MARKER) {
            self.quote = Quote::Context;
            push_nonempty(&mut self.context, rest);
        } else if let Some(rest) = content.strip_prefix(VISUAL_STYLE_MARKER) {
            self.quote = Quote::Visual;
            push_nonempty(&mut self.visual, rest);
        } else {
            let target = match self.quote {
                Quote::Context => &mut self.context,
                Quote::Visual => &mut self.visual,
            };
            target.push(content.trim().to_string());
        }
    }

    /// Unattributed line outside any node: becomes project context.
    fn stray(&mut self, line_no: usize, trimmed: &str) {
        self.warnings.push(ParseWarning {
            line: line_no,
            kind: WarningKind::UnrecognizedLine {
                text: trimmed.to_string(),
            },
        });
        self.context.push(trimmed.to_string());
    }

    fn finish_node(&mut self) {
        let Some(draft) = self.current.take() else {
            return;
        };
        let mut node = draft.node;
        let description = draft.description.join(" ");
        node.description = (!description.is_empty()).then_some(description);

        match self.nodes.iter().position(|n| n.name == node.name) {
            Some(idx) => {
                self.warnings.push(ParseWarning {
                    line: draft.line,
                    kind: WarningKind::DuplicateNode {
                        name: node.name.clone(),
                    },
                });
                self.nodes[idx] = node;
            }
            None => self.nodes.push(node),
        }
    }

    fn finish(mut self) -> ParsedDocument {
        self.finish_node();

        let mut document = ArchitectureDocument {
            project_context: join_text(&self.context),
            visual_style: join_text(&self.visual),
            nodes: self.nodes,
            connections: Vec::new(),
            appendix: None,
        };

        let appendix = self.appendix.join("\n");
        let appendix = appendix.trim_end();
        if !appendix.is_empty() {
            document.appendix = Some(appendix.to_string());
        }

        let mut warnings = self.warnings;
        for (line, connection) in self.connections {
            warnings.extend(unresolved_warnings(&document, &connection, line));
            document.connections.push(connection);
        }

        ParsedDocument { document, warnings }
    }
}

// --- Line helpers ---

#[derive(Debug, PartialEq, Eq)]
enum LineError {
    /// Right shape, but the method or field type is not one the schema knows.
    Unknown(String),
    Malformed,
}

struct ConnectionLine {
    connection: Connection,
    bad_ports: Vec<String>,
}

fn known_section(heading: &str) -> Option<Section> {
    let title = heading
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.')
        .trim()
        .to_ascii_uppercase();
    if title.starts_with("ARCHITECTURE OVERVIEW") {
        Some(Section::Overview)
    } else if title.starts_with("DATA FLOW") {
        Some(Section::Connections)
    } else {
        None
    }
}

fn node_name(heading: &str) -> &str {
    let heading = heading.trim();
    heading
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .map(str::trim)
        .unwrap_or(heading)
}

/// `- **Key:** Value`
fn property_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix("- **")?;
    let (key, value) = rest.split_once(":**")?;
    let key = key.trim();
    if key.is_empty() || key.contains("**") || key.contains('`') {
        return None;
    }
    Some((key, value.trim()))
}

/// `- **Table/Model: Name**`
fn table_line(line: &str) -> Option<&str> {
    let inner = line.strip_prefix("- **")?.strip_suffix("**")?;
    Some(inner.strip_prefix(TABLE_PREFIX)?.trim())
}

/// `- **GET** `/path` - Description`
fn parse_route(line: &str) -> std::result::Result<Route, LineError> {
    let rest = line.strip_prefix("- **").ok_or(LineError::Malformed)?;
    let (method, rest) = rest.split_once("**").ok_or(LineError::Malformed)?;
    let rest = rest.trim_start().strip_prefix('`').ok_or(LineError::Malformed)?;
    let (path, rest) = rest.split_once('`').ok_or(LineError::Malformed)?;
    let rest = rest.trim();
    let description = rest.strip_prefix('-').map(str::trim).unwrap_or(rest);
    let method = method
        .parse::<Method>()
        .map_err(|()| LineError::Unknown(method.trim().to_string()))?;
    Ok(Route {
        method,
        path: path.trim().to_string(),
        description: description.to_string(),
    })
}

/// `- `fieldName` : type`
fn parse_field(line: &str) -> std::result::Result<Field, LineError> {
    let rest = line.strip_prefix("- `").ok_or(LineError::Malformed)?;
    let (name, rest) = rest.split_once('`').ok_or(LineError::Malformed)?;
    let kind = rest.trim().strip_prefix(':').ok_or(LineError::Malformed)?.trim();
    let kind = kind
        .parse::<FieldKind>()
        .map_err(|()| LineError::Unknown(kind.to_string()))?;
    Ok(Field {
        name: name.trim().to_string(),
        kind,
    })
}

/// `- **Source** (:Port) sends data to **Target** (:Port)`, ports optional.
fn parse_connection(line: &str) -> Option<ConnectionLine> {
    let mut bad_ports = Vec::new();

    let rest = line.strip_prefix("- **")?;
    let (source, rest) = rest.split_once("**")?;
    let (source_port, rest) = take_port(rest.trim_start(), &mut bad_ports);
    let rest = rest.trim_start().strip_prefix(SENDS_DATA_TO)?;
    let rest = rest.trim_start().strip_prefix("**")?;
    let (target, rest) = rest.split_once("**")?;
    let (target_port, rest) = take_port(rest.trim_start(), &mut bad_ports);
    if !rest.trim().is_empty() {
        return None;
    }

    let source = source.trim();
    let target = target.trim();
    if source.is_empty() || target.is_empty() {
        return None;
    }

    Some(ConnectionLine {
        connection: Connection {
            source_name: source.to_string(),
            source_port,
            target_name: target.to_string(),
            target_port,
        },
        bad_ports,
    })
}

fn take_port<'a>(text: &'a str, bad_ports: &mut Vec<String>) -> (Option<u16>, &'a str) {
    let Some((inner, tail)) = text.strip_prefix('(').and_then(|s| s.split_once(')')) else {
        return (None, text);
    };
    let port = parse_port(inner);
    if port.is_none() {
        bad_ports.push(inner.trim().to_string());
    }
    (port, tail)
}

fn parse_port(value: &str) -> Option<u16> {
    value.trim().trim_start_matches(':').trim().parse().ok()
}

fn push_nonempty(target: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        target.push(value.to_string());
    }
}

fn join_text(lines: &[String]) -> Option<String> {
    let text = lines.join("\n");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
