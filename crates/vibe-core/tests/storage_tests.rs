use std::path::Path;

use vibe_core::storage::{
    project_file, read_document_raw, read_settings_from, resolve_document_path,
    write_document_raw, write_settings_to, AssistantSettings, Settings, DEFAULT_DOCUMENT_PATH,
};
use vibe_core::{Error, ParseMode};

#[test]
fn missing_document_reads_as_none() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".github").join("copilot-instructions.md");
    assert!(read_document_raw(&path).unwrap().is_none());
}

#[test]
fn write_creates_parent_and_replaces_contents() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(".github").join("copilot-instructions.md");

    write_document_raw(&path, "first version that is fairly long").unwrap();
    write_document_raw(&path, "second").unwrap();

    assert_eq!(read_document_raw(&path).unwrap().as_deref(), Some("second"));
    let leftovers: Vec<_> = std::fs::read_dir(path.parent().unwrap())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn resolve_prefers_destination_then_project_root() {
    let dest = Path::new("/tmp/elsewhere/arch.md");
    assert_eq!(
        resolve_document_path(None, DEFAULT_DOCUMENT_PATH, Some(dest)).unwrap(),
        dest
    );

    let root = Path::new("/work/project");
    assert_eq!(
        resolve_document_path(Some(root), DEFAULT_DOCUMENT_PATH, None).unwrap(),
        root.join(".github/copilot-instructions.md")
    );

    assert!(matches!(
        resolve_document_path(None, DEFAULT_DOCUMENT_PATH, None),
        Err(Error::StorageUnavailable)
    ));
}

#[test]
fn project_file_stays_inside_root() {
    let root = Path::new("/work/project");
    assert_eq!(project_file(root, "prompt.md").unwrap(), root.join("prompt.md"));
    assert_eq!(
        project_file(root, "./docs/arch.md").unwrap(),
        root.join("./docs/arch.md")
    );
    for bad in ["../escape.md", "/etc/passwd", "docs/../../x", ""] {
        assert!(
            matches!(project_file(root, bad), Err(Error::InvalidDestination(_))),
            "{bad}"
        );
    }
}

#[test]
fn settings_default_when_missing_or_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    assert_eq!(read_settings_from(&path), Settings::default());

    std::fs::write(&path, "{not json").unwrap();
    assert_eq!(read_settings_from(&path), Settings::default());
}

#[test]
fn settings_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("settings.json");
    let settings = Settings {
        document_path: "docs/ARCHITECTURE.md".to_string(),
        strict: true,
        assistant: AssistantSettings {
            program: Some("codex".to_string()),
            args: vec!["exec".to_string(), "-".to_string()],
        },
    };
    write_settings_to(&path, &settings).unwrap();
    let back = read_settings_from(&path);
    assert_eq!(back, settings);
    assert_eq!(back.parse_mode(), ParseMode::Strict);

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"documentPath\""));
}

#[test]
fn partial_settings_fill_in_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    std::fs::write(&path, r#"{"strict": true}"#).unwrap();
    let settings = read_settings_from(&path);
    assert!(settings.strict);
    assert_eq!(settings.document_path, DEFAULT_DOCUMENT_PATH);
    assert_eq!(settings.assistant.program, None);
}
