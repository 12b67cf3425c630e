pub mod error;
pub mod parse;
pub mod render;
pub mod rules;
pub mod storage;

pub use error::{Error, Result};
pub use parse::{parse, parse_with, ParseMode, ParseWarning, ParsedDocument, WarningKind};
pub use render::serialize;
pub use storage::Settings;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- Types ---

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Frontend,
    Backend,
    Database,
    Cloud,
    #[default]
    Custom,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Frontend => "frontend",
            NodeType::Backend => "backend",
            NodeType::Database => "database",
            NodeType::Cloud => "cloud",
            NodeType::Custom => "custom",
        }
    }
}

impl FromStr for NodeType {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.trim().to_ascii_lowercase().as_str() {
            "frontend" => Ok(NodeType::Frontend),
            "backend" => Ok(NodeType::Backend),
            "database" => Ok(NodeType::Database),
            "cloud" => Ok(NodeType::Cloud),
            "custom" => Ok(NodeType::Custom),
            _ => Err(()),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Crud,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Crud => "CRUD",
        }
    }
}

impl FromStr for Method {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            "CRUD" => Ok(Method::Crud),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Pk,
    Fk,
    Date,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Number => "number",
            FieldKind::Boolean => "boolean",
            FieldKind::Array => "array",
            FieldKind::Object => "object",
            FieldKind::Pk => "pk",
            FieldKind::Fk => "fk",
            FieldKind::Date => "date",
        }
    }
}

impl FromStr for FieldKind {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, ()> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(FieldKind::String),
            "number" => Ok(FieldKind::Number),
            "boolean" => Ok(FieldKind::Boolean),
            "array" => Ok(FieldKind::Array),
            "object" => Ok(FieldKind::Object),
            "pk" => Ok(FieldKind::Pk),
            "fk" => Ok(FieldKind::Fk),
            "date" => Ok(FieldKind::Date),
            _ => Err(()),
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub method: Method,
    /// Request path, conventionally starting with `/`
    pub path: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

/// A table or schema definition owned by a database-like node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataModel {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    /// Unique within a document; connections refer to nodes by this name.
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: NodeType,
    #[serde(default)]
    pub technology: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
    #[serde(default)]
    pub data_models: Vec<DataModel>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeType) -> Self {
        Node {
            name: name.into(),
            kind,
            ..Node::default()
        }
    }
}

/// A directed data-flow edge between two nodes, keyed by node name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub source_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port: Option<u16>,
    pub target_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<u16>,
}

/// The whole architecture description. Always transferred and replaced as a unit.
///
/// A document round-trips through [`serialize`] and [`parse`] unchanged when it is
/// *well-formed*: node names are unique and non-empty, single-line values carry no
/// leading or trailing whitespace, optional text is `None` rather than empty, and
/// names contain none of the Markdown delimiters the schema uses (`**`, `` ` ``, `]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArchitectureDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_style: Option<String>,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    /// Trailing `##` sections the model does not interpret, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appendix: Option<String>,
}

impl ArchitectureDocument {
    /// Deserialize an edit buffer coming from the UI.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::MalformedInput(e.to_string()))
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Connections with at least one endpoint that names no node in this document.
    pub fn unresolved_connections(&self) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| self.node(&c.source_name).is_none() || self.node(&c.target_name).is_none())
            .collect()
    }

    /// Strict validation: node names are unique and every connection resolves.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        if let Some(dup) = self.nodes.iter().find(|n| !seen.insert(n.name.as_str())) {
            return Err(Error::DuplicateNode(dup.name.clone()));
        }
        for c in &self.connections {
            let missing = [&c.source_name, &c.target_name]
                .into_iter()
                .find(|name| self.node(name).is_none());
            if let Some(missing) = missing {
                return Err(Error::UnresolvedReference {
                    source_name: c.source_name.clone(),
                    target_name: c.target_name.clone(),
                    missing: missing.clone(),
                });
            }
        }
        Ok(())
    }

    /// The worked example used when no document has been persisted yet.
    pub fn example() -> Self {
        let route = |method, path: &str, description: &str| Route {
            method,
            path: path.to_string(),
            description: description.to_string(),
        };
        let field = |name: &str, kind| Field {
            name: name.to_string(),
            kind,
        };

        let web_app = Node {
            technology: "React/Vite".to_string(),
            port: Some(3000),
            routes: vec![
                route(Method::Get, "/", "Home Page"),
                route(Method::Get, "/dashboard", "Dashboard"),
            ],
            ..Node::new("WebApp", NodeType::Frontend)
        };
        let backend = Node {
            technology: "Node.js/Express".to_string(),
            port: Some(8080),
            routes: vec![
                route(Method::Get, "/api/health", "Health check"),
                route(Method::Crud, "/api/users", "User List"),
            ],
            ..Node::new("Backend", NodeType::Backend)
        };
        let database = Node {
            technology: "PostgreSQL".to_string(),
            port: Some(5432),
            data_models: vec![DataModel {
                name: "Users".to_string(),
                fields: vec![field("id", FieldKind::Pk), field("email", FieldKind::String)],
            }],
            ..Node::new("Main DB", NodeType::Database)
        };

        ArchitectureDocument {
            project_context: Some("Students meeting app".to_string()),
            visual_style: Some(format!("Futuristic Glassmorphism\n{}", rules::EXAMPLE_STYLE_NOTES)),
            nodes: vec![web_app, backend, database],
            connections: vec![
                Connection {
                    source_name: "WebApp".to_string(),
                    source_port: Some(3000),
                    target_name: "Backend".to_string(),
                    target_port: Some(8080),
                },
                Connection {
                    source_name: "Backend".to_string(),
                    source_port: Some(8080),
                    target_name: "Main DB".to_string(),
                    target_port: Some(5432),
                },
            ],
            appendix: Some(rules::INSTRUCTIONS_SECTION.to_string()),
        }
    }
}

/// JSON schema of [`ArchitectureDocument`], handed to UI edit buffers.
pub fn document_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(ArchitectureDocument)).unwrap_or_default()
}
