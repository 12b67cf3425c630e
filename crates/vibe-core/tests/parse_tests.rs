use vibe_core::{
    parse, parse_with, serialize, ArchitectureDocument, Error, FieldKind, Method, NodeType, ParseMode, WarningKind,
};

const SAMPLE: &str = "\
# SYSTEM ARCHITECTURE SPECIFICATION
> **Project Context / Goal:**
> Students meeting app

> **Visual Style:** Futuristic Glassmorphism
> *Dark Mode app interface*

## 1. ARCHITECTURE OVERVIEW

### [WebApp]
- **Type:** frontend
- **Technology:** React/Vite
- **Port:** 3000
- **API Routes / Endpoints:**
  - **GET** `/` - Home Page
  - **GET** `/dashboard` - Dashboard
### [Main DB]
- **Type:** database
- **Technology:** PostgreSQL
- **Port:** 5432
- **Data Models / Schema:**
  - **Table/Model: Users**
    - `id` : pk
    - `email` : string
  - **Table/Model: Rooms**
    - `members` : array

## 2. DATA FLOW & CONNECTIONS

- **WebApp** (:3000) sends data to **Main DB** (:5432)

## 3. INSTRUCTIONS
Act as a Senior Software Architect.
";

#[test]
fn parses_single_node_scenario() {
    let parsed = parse("## 1. ARCHITECTURE OVERVIEW\n### [WebApp]\n- **Type:** frontend\n- **Port:** 3000\n");
    let doc = parsed.document;
    assert_eq!(doc.nodes.len(), 1);
    let node = &doc.nodes[0];
    assert_eq!(node.name, "WebApp");
    assert_eq!(node.kind, NodeType::Frontend);
    assert_eq!(node.port, Some(3000));
    assert!(node.routes.is_empty());
    assert!(node.data_models.is_empty());
    assert!(parsed.warnings.is_empty());
}

#[test]
fn parses_full_sample() {
    let parsed = parse(SAMPLE);
    let doc = &parsed.document;
    assert!(parsed.warnings.is_empty(), "{:?}", parsed.warnings);

    assert_eq!(doc.project_context.as_deref(), Some("Students meeting app"));
    assert_eq!(
        doc.visual_style.as_deref(),
        Some("Futuristic Glassmorphism\n*Dark Mode app interface*")
    );

    let web = doc.node("WebApp").unwrap();
    assert_eq!(web.technology, "React/Vite");
    assert_eq!(web.routes.len(), 2);
    assert_eq!(web.routes[1].method, Method::Get);
    assert_eq!(web.routes[1].path, "/dashboard");
    assert_eq!(web.routes[1].description, "Dashboard");

    let db = doc.node("Main DB").unwrap();
    assert_eq!(db.kind, NodeType::Database);
    assert_eq!(db.data_models.len(), 2);
    assert_eq!(db.data_models[0].name, "Users");
    assert_eq!(db.data_models[0].fields[0].kind, FieldKind::Pk);
    assert_eq!(db.data_models[1].fields[0].name, "members");

    assert_eq!(doc.connections.len(), 1);
    assert_eq!(doc.connections[0].source_port, Some(3000));
    assert_eq!(doc.connections[0].target_name, "Main DB");

    assert_eq!(
        doc.appendix.as_deref(),
        Some("## 3. INSTRUCTIONS\nAct as a Senior Software Architect.")
    );
}

#[test]
fn empty_input_is_an_empty_document() {
    let parsed = parse("");
    assert_eq!(parsed.document, ArchitectureDocument::default());
    assert!(parsed.warnings.is_empty());
}

#[test]
fn duplicate_heading_keeps_later_block() {
    let text = "\
## 1. ARCHITECTURE OVERVIEW
### [Same]
- **Type:** frontend
- **Port:** 1
### [Other]
- **Type:** cloud
### [Same]
- **Type:** backend
- **Technology:** Go
";
    let parsed = parse(text);
    let same: Vec<_> = parsed.document.nodes.iter().filter(|n| n.name == "Same").collect();
    assert_eq!(same.len(), 1);
    assert_eq!(same[0].kind, NodeType::Backend);
    assert_eq!(same[0].technology, "Go");
    assert_eq!(same[0].port, None);
    // Replaced in place, so document order keeps the first position.
    assert_eq!(parsed.document.nodes[0].name, "Same");
    assert!(parsed
        .warnings
        .iter()
        .any(|w| w.line == 7 && w.kind == WarningKind::DuplicateNode { name: "Same".into() }));
}

#[test]
fn dangling_connection_is_kept_and_flagged() {
    let text = "\
## 1. ARCHITECTURE OVERVIEW
### [WebApp]
- **Type:** frontend

## 2. DATA FLOW & CONNECTIONS
- **WebApp** sends data to **Ghost** (:9000)
";
    let parsed = parse(text);
    assert_eq!(parsed.document.connections.len(), 1);
    assert_eq!(parsed.document.connections[0].target_name, "Ghost");
    let unresolved: Vec<_> = parsed.unresolved().collect();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].line, 6);
    assert!(matches!(
        &unresolved[0].kind,
        WarningKind::UnresolvedReference { missing, .. } if missing == "Ghost"
    ));
    assert_eq!(parsed.document.unresolved_connections().len(), 1);
}

#[test]
fn strict_mode_rejects_dangling_and_duplicates() {
    let dangling = "## 2. DATA FLOW & CONNECTIONS\n- **A** sends data to **B**\n";
    match parse_with(dangling, ParseMode::Strict) {
        Err(Error::UnresolvedReference { missing, .. }) => assert_eq!(missing, "A"),
        other => panic!("expected unresolved reference, got {other:?}"),
    }

    let duplicate = "### [A]\n### [A]\n";
    assert!(matches!(
        parse_with(duplicate, ParseMode::Strict),
        Err(Error::DuplicateNode(name)) if name == "A"
    ));
    assert!(parse_with(duplicate, ParseMode::Lenient).is_ok());
}

#[test]
fn malformed_port_is_absent_with_warning() {
    let text = "### [Api]\n- **Type:** backend\n- **Port:** eighty\n";
    let parsed = parse(text);
    assert_eq!(parsed.document.nodes[0].port, None);
    assert_eq!(
        parsed.warnings[0].kind,
        WarningKind::InvalidPort { value: "eighty".into() }
    );
    assert_eq!(parsed.warnings[0].line, 3);
    // The raw value survives a save as description text.
    assert_eq!(parsed.document.nodes[0].description.as_deref(), Some("Port: eighty"));
    let reparsed = parse(&serialize(&parsed.document));
    assert_eq!(reparsed.document, parsed.document);
    assert!(reparsed.warnings.is_empty());
}

#[test]
fn unknown_keys_become_description_text() {
    let text = "\
### [Api]
- **Type:** backend
- **Owner:** Platform team
- **Description:** Public API
just a note
";
    let parsed = parse(text);
    assert_eq!(
        parsed.document.nodes[0].description.as_deref(),
        Some("Owner: Platform team Public API just a note")
    );
}

#[test]
fn unknown_enum_values_are_preserved_as_text() {
    let text = "\
### [Api]
- **Type:** serverless
- **API Routes / Endpoints:**
  - **FETCH** `/items` - List items
  - **POST** `/items` - Create
- **Data Models / Schema:**
  - **Table/Model: Item**
    - `tags` : set
    - `id` : pk
";
    let parsed = parse(text);
    let node = &parsed.document.nodes[0];
    assert_eq!(node.kind, NodeType::Custom);
    assert_eq!(node.routes.len(), 1);
    assert_eq!(node.routes[0].method, Method::Post);
    assert_eq!(node.data_models[0].fields.len(), 1);
    let description = node.description.as_deref().unwrap();
    assert!(description.contains("Type: serverless"));
    assert!(description.contains("- **FETCH** `/items` - List items"));
    assert!(description.contains("- `tags` : set"));

    let kinds: Vec<_> = parsed.warnings.iter().map(|w| &w.kind).collect();
    assert!(kinds.contains(&&WarningKind::UnknownNodeType { value: "serverless".into() }));
    assert!(kinds.contains(&&WarningKind::UnknownMethod { value: "FETCH".into() }));
    assert!(kinds.contains(&&WarningKind::UnknownFieldKind { value: "set".into() }));
}

#[test]
fn unstructured_text_falls_back_to_project_context() {
    let text = "Just some notes about the app.\nIt has a backend.\n";
    let parsed = parse(text);
    assert!(parsed.document.nodes.is_empty());
    assert_eq!(
        parsed.document.project_context.as_deref(),
        Some("Just some notes about the app.\nIt has a backend.")
    );
    assert_eq!(parsed.warnings.len(), 2);
}

#[test]
fn garbage_in_connections_section_is_kept() {
    let text = "\
### [A]
### [B]
## 2. DATA FLOW & CONNECTIONS
- **A** talks to **B** somehow
- **A** sends data to **B**
";
    let parsed = parse(text);
    assert_eq!(parsed.document.connections.len(), 1);
    assert_eq!(
        parsed.document.project_context.as_deref(),
        Some("- **A** talks to **B** somehow")
    );
}

#[test]
fn headings_without_brackets_and_loose_indentation() {
    let text = "\
## 1. ARCHITECTURE OVERVIEW
### Worker
- **Type:** CLOUD
- **API Routes / Endpoints:**
- **GET** `/jobs` - Jobs
";
    let parsed = parse(text);
    let node = &parsed.document.nodes[0];
    assert_eq!(node.name, "Worker");
    assert_eq!(node.kind, NodeType::Cloud);
    assert_eq!(node.routes.len(), 1);
    assert!(parsed.warnings.is_empty());
}

#[test]
fn warnings_serialize_for_the_ui() {
    let parsed = parse("### [A]\n- **Port:** x\n");
    let json = serde_json::to_value(&parsed.warnings[0]).unwrap();
    assert_eq!(json["line"], 2);
    assert_eq!(json["kind"], "invalidPort");
    assert_eq!(json["value"], "x");
    assert_eq!(parsed.warnings[0].to_string(), "line 2: invalid port 'x'");
}
