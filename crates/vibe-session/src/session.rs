use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use vibe_core::{
    parse_with, serialize, storage, ArchitectureDocument, Error, ParsedDocument, Result, Settings,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unloaded,
    Loaded,
    /// The file changed on disk and a refresh is pending.
    Stale,
}

type ChangeListener = Box<dyn FnMut(&ParsedDocument, &str) + Send>;

/// Owns the one authoritative in-memory copy of the architecture document for
/// an open project. The filesystem is the arbiter: an external change always
/// replaces what is held here.
pub struct Session {
    root: Option<PathBuf>,
    settings: Settings,
    state: SessionState,
    current: Option<ParsedDocument>,
    text: Option<String>,
    disk_text: Option<String>,
    last_written: Option<String>,
    listeners: Vec<ChangeListener>,
}

impl Session {
    pub fn new(root: Option<PathBuf>, settings: Settings) -> Self {
        Session {
            root,
            settings,
            state: SessionState::Unloaded,
            current: None,
            text: None,
            disk_text: None,
            last_written: None,
            listeners: Vec::new(),
        }
    }

    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn current(&self) -> Option<&ParsedDocument> {
        self.current.as_ref()
    }

    /// Rendered text of the current document, as shown to the UI. When no file
    /// exists yet this is the built-in example.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Contents of the document file as last read or written. `None` when the
    /// file does not exist.
    pub fn disk_text(&self) -> Option<&str> {
        self.disk_text.as_deref()
    }

    /// Where the document lives inside the project. `None` without a project root.
    pub fn document_path(&self) -> Option<PathBuf> {
        let root = self.root.as_deref()?;
        storage::project_file(root, &self.settings.document_path).ok()
    }

    /// File name used when talking to the assistant about the document.
    pub fn document_name(&self) -> String {
        Path::new(&self.settings.document_path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.settings.document_path.clone())
    }

    /// Register a callback run after an external change replaced the document.
    pub fn on_external_change(&mut self, callback: impl FnMut(&ParsedDocument, &str) + Send + 'static) {
        self.listeners.push(Box::new(callback));
    }

    /// Read and parse the document. A missing file yields the built-in example.
    pub async fn load(&mut self) -> Result<&ParsedDocument> {
        let text = match self.document_path() {
            Some(path) => read_blocking(path).await.inspect_err(|e| warn!(error = %e, "load failed"))?,
            None => None,
        };

        let parsed = match &text {
            Some(text) => parse_with(text, self.settings.parse_mode())
                .inspect_err(|e| warn!(error = %e, "document rejected"))?,
            None => {
                info!("no architecture document yet, using built-in example");
                ParsedDocument::from_document(ArchitectureDocument::example())
            }
        };

        info!(
            nodes = parsed.document.nodes.len(),
            warnings = parsed.warnings.len(),
            "architecture document loaded"
        );
        self.text = Some(match &text {
            Some(text) => text.clone(),
            None => serialize(&parsed.document),
        });
        self.disk_text = text;
        self.state = SessionState::Loaded;
        Ok(self.current.insert(parsed))
    }

    /// Serialize and write the whole document, replacing the file contents.
    ///
    /// `destination` overrides the project location; without either the save
    /// fails with [`Error::StorageUnavailable`] and nothing is written. A save to
    /// anywhere other than the watched document leaves the session untouched.
    pub async fn save(&mut self, document: ArchitectureDocument, destination: Option<&Path>) -> Result<PathBuf> {
        if self.settings.strict {
            document.validate()?;
        }
        let path = storage::resolve_document_path(
            self.root.as_deref(),
            &self.settings.document_path,
            destination,
        )?;

        let text = serialize(&document);
        write_blocking(path.clone(), text.clone())
            .await
            .inspect_err(|e| warn!(error = %e, "save failed"))?;
        info!(path = %path.display(), nodes = document.nodes.len(), "architecture document saved");

        let watched = self.document_path();
        if watched.is_none() || watched.as_deref() == Some(path.as_path()) {
            self.current = Some(ParsedDocument::from_document(document));
            self.text = Some(text.clone());
            if watched.is_some() {
                self.disk_text = Some(text.clone());
                self.last_written = Some(text);
            }
            self.state = SessionState::Loaded;
        }
        Ok(path)
    }

    /// Write an arbitrary file relative to the project root. Writing to the
    /// document's own path goes through the parser like any other load, and is
    /// refused before anything is written if the parse mode rejects the text.
    pub async fn write_file(&mut self, filename: &str, contents: &str) -> Result<PathBuf> {
        let root = self.root.as_deref().ok_or(Error::StorageUnavailable)?;
        let path = storage::project_file(root, filename)?;
        let parsed = if self.document_path().as_deref() == Some(path.as_path()) {
            Some(parse_with(contents, self.settings.parse_mode())?)
        } else {
            None
        };

        write_blocking(path.clone(), contents.to_string())
            .await
            .inspect_err(|e| warn!(error = %e, "write failed"))?;
        info!(path = %path.display(), "file saved");

        if let Some(parsed) = parsed {
            self.current = Some(parsed);
            self.text = Some(contents.to_string());
            self.disk_text = Some(contents.to_string());
            self.last_written = Some(contents.to_string());
            self.state = SessionState::Loaded;
        }
        Ok(path)
    }

    pub fn mark_stale(&mut self) {
        if self.state == SessionState::Loaded {
            self.state = SessionState::Stale;
        }
    }

    /// Re-read the file after an external change and replace the in-memory copy.
    ///
    /// Returns `Ok(true)` when the document was replaced and listeners ran.
    /// On failure the last good document is kept.
    pub async fn refresh(&mut self) -> Result<bool> {
        let Some(path) = self.document_path() else {
            return Ok(false);
        };
        let Some(text) = read_blocking(path)
            .await
            .inspect_err(|e| warn!(error = %e, "refresh failed, keeping last good document"))?
        else {
            debug!("document removed, keeping last good document");
            self.disk_text = None;
            self.settle();
            return Ok(false);
        };

        if self.last_written.as_deref() == Some(text.as_str()) {
            debug!("change matches our own write");
            self.settle();
            return Ok(false);
        }

        let parsed = parse_with(&text, self.settings.parse_mode())
            .inspect_err(|e| warn!(error = %e, "refreshed document rejected, keeping last good"))?;
        info!(nodes = parsed.document.nodes.len(), "reloaded architecture document after external change");

        self.last_written = None;
        self.state = SessionState::Loaded;
        let current = self.current.insert(parsed);
        for listener in &mut self.listeners {
            listener(current, &text);
        }
        self.text = Some(text.clone());
        self.disk_text = Some(text);
        Ok(true)
    }

    fn settle(&mut self) {
        self.state = if self.current.is_some() {
            SessionState::Loaded
        } else {
            SessionState::Unloaded
        };
    }
}

async fn read_blocking(path: PathBuf) -> Result<Option<String>> {
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || storage::read_document_raw(&task_path))
        .await
        .map_err(|e| Error::Io {
            path,
            source: std::io::Error::other(e),
        })?
}

async fn write_blocking(path: PathBuf, text: String) -> Result<()> {
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || storage::write_document_raw(&task_path, &text))
        .await
        .map_err(|e| Error::Io {
            path,
            source: std::io::Error::other(e),
        })?
}
