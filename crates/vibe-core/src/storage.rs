use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::{Error, ParseMode, Result};

/// Default location of the architecture document inside a project.
pub const DEFAULT_DOCUMENT_PATH: &str = ".github/copilot-instructions.md";

// --- Document files ---

/// Resolve where the document lives: an explicit destination wins, otherwise
/// `relative` under the project root.
pub fn resolve_document_path(
    root: Option<&Path>,
    relative: &str,
    destination: Option<&Path>,
) -> Result<PathBuf> {
    if let Some(dest) = destination {
        return Ok(dest.to_path_buf());
    }
    let root = root.ok_or(Error::StorageUnavailable)?;
    project_file(root, relative)
}

/// Join a relative file name onto the project root, refusing anything that
/// would land outside it.
pub fn project_file(root: &Path, relative: &str) -> Result<PathBuf> {
    let rel = Path::new(relative);
    let escapes = rel
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if relative.trim().is_empty() || escapes {
        return Err(Error::InvalidDestination(relative.to_string()));
    }
    Ok(root.join(rel))
}

/// Read the raw document text. `Ok(None)` when the file does not exist.
pub fn read_document_raw(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Replace the file contents.
///
/// Writes a sibling temp file and renames it over the target, so a watcher sees
/// one complete write and never a truncated file. Missing parent directories are
/// created.
pub fn write_document_raw(path: &Path, text: &str) -> Result<()> {
    let dir = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidDestination(path.display().to_string()))?;
    let tmp = dir.join(format!(".{}.tmp", file_name.to_string_lossy()));
    fs::write(&tmp, text).map_err(|e| Error::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| Error::io(path, e))
}

// --- Settings ---

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AssistantSettings {
    /// Program that receives edit prompts on stdin. Auto-detected when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub document_path: String,
    /// Reject duplicate node headings and dangling connections instead of tolerating them.
    pub strict: bool,
    pub assistant: AssistantSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            document_path: DEFAULT_DOCUMENT_PATH.to_string(),
            strict: false,
            assistant: AssistantSettings::default(),
        }
    }
}

impl Settings {
    pub fn parse_mode(&self) -> ParseMode {
        if self.strict {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        }
    }
}

/// Resolve the global settings directory (~/.vibe-architect/).
pub fn settings_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".vibe-architect")
}

pub fn settings_path() -> PathBuf {
    settings_dir().join("settings.json")
}

/// Read settings from `path`, falling back to defaults when the file is missing or unreadable.
pub fn read_settings_from(path: &Path) -> Settings {
    if !path.exists() {
        return Settings::default();
    }
    match fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|s| serde_json::from_str(&s).map_err(|e| e.to_string()))
    {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable settings");
            Settings::default()
        }
    }
}

pub fn read_settings() -> Settings {
    read_settings_from(&settings_path())
}

pub fn write_settings_to(path: &Path, settings: &Settings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings).map_err(|e| Error::Settings(e.to_string()))?;
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    fs::write(path, json).map_err(|e| Error::io(path, e))
}

pub fn write_settings(settings: &Settings) -> Result<()> {
    write_settings_to(&settings_path(), settings)
}
