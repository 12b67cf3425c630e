//! Canonical Markdown rendering of an [`ArchitectureDocument`].

use std::fmt::Write;

use crate::rules::{
    CONNECTIONS_HEADING, DATA_MODELS_KEY, OVERVIEW_HEADING, PROJECT_CONTEXT_MARKER, ROUTES_KEY,
    SENDS_DATA_TO, TABLE_PREFIX, TITLE, VISUAL_STYLE_MARKER,
};
use crate::{ArchitectureDocument, Connection, Node};

/// Render the document. There is exactly one rendering per document value.
pub fn serialize(doc: &ArchitectureDocument) -> String {
    let mut out = String::with_capacity(2048);

    out.push_str(TITLE);
    out.push('\n');

    let mut quoted = false;
    if let Some(context) = &doc.project_context {
        out.push_str("> ");
        out.push_str(PROJECT_CONTEXT_MARKER);
        out.push('\n');
        for line in context.lines() {
            push_quoted(&mut out, line);
        }
        out.push('\n');
        quoted = true;
    }
    if let Some(style) = &doc.visual_style {
        let mut lines = style.lines();
        out.push_str("> ");
        out.push_str(VISUAL_STYLE_MARKER);
        if let Some(first) = lines.next() {
            out.push(' ');
            out.push_str(first);
        }
        out.push('\n');
        for line in lines {
            push_quoted(&mut out, line);
        }
        out.push('\n');
        quoted = true;
    }
    if !quoted {
        out.push('\n');
    }

    out.push_str(OVERVIEW_HEADING);
    out.push_str("\n\n");
    for node in &doc.nodes {
        render_node(&mut out, node);
    }

    out.push('\n');
    out.push_str(CONNECTIONS_HEADING);
    out.push_str("\n\n");
    for connection in &doc.connections {
        out.push_str(&connection_line(connection));
        out.push('\n');
    }

    if let Some(appendix) = &doc.appendix {
        out.push('\n');
        out.push_str(appendix);
        out.push('\n');
    }

    out
}

/// `- **Source** (:Port) sends data to **Target** (:Port)`
pub fn connection_line(c: &Connection) -> String {
    let mut line = format!("- **{}**", c.source_name);
    if let Some(port) = c.source_port {
        let _ = write!(line, " (:{port})");
    }
    let _ = write!(line, " {SENDS_DATA_TO} **{}**", c.target_name);
    if let Some(port) = c.target_port {
        let _ = write!(line, " (:{port})");
    }
    line
}

fn push_quoted(out: &mut String, line: &str) {
    if line.is_empty() {
        out.push_str(">\n");
        return;
    }
    out.push_str("> ");
    // A content line that starts like a marker gets an extra space so it is not read back as one.
    if line.starts_with(PROJECT_CONTEXT_MARKER) || line.starts_with(VISUAL_STYLE_MARKER) {
        out.push(' ');
    }
    out.push_str(line);
    out.push('\n');
}

fn render_node(out: &mut String, node: &Node) {
    let _ = writeln!(out, "### [{}]", node.name);
    let _ = writeln!(out, "- **Type:** {}", node.kind);
    if !node.technology.is_empty() {
        let _ = writeln!(out, "- **Technology:** {}", node.technology);
    }
    if let Some(port) = node.port {
        let _ = writeln!(out, "- **Port:** {port}");
    }
    if let Some(description) = &node.description {
        let _ = writeln!(out, "- **Description:** {description}");
    }

    if !node.routes.is_empty() {
        let _ = writeln!(out, "- **{ROUTES_KEY}:**");
        for route in &node.routes {
            let _ = write!(out, "  - **{}** `{}`", route.method, route.path);
            if !route.description.is_empty() {
                let _ = write!(out, " - {}", route.description);
            }
            out.push('\n');
        }
    }

    if !node.data_models.is_empty() {
        let _ = writeln!(out, "- **{DATA_MODELS_KEY}:**");
        for model in &node.data_models {
            let _ = writeln!(out, "  - **{TABLE_PREFIX} {}**", model.name);
            for field in &model.fields {
                let _ = writeln!(out, "    - `{}` : {}", field.name, field.kind);
            }
        }
    }
}
