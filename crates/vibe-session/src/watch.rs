use std::path::{Path, PathBuf};

use notify::{recommended_watcher, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};
use vibe_core::{Error, Result};

/// The watched document was created, modified or removed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChanged {
    pub path: PathBuf,
}

/// Keeps the underlying OS watcher alive; dropping it stops notifications.
pub struct DocumentWatcher {
    path: PathBuf,
    _watcher: RecommendedWatcher,
}

impl DocumentWatcher {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Watch a single document file and forward every change to `events`.
///
/// A directory is watched rather than the file itself so that atomic
/// replacements (write temp file, rename over) and first-time creation are seen.
/// That is the parent directory when it exists. Otherwise the nearest existing
/// ancestor is watched recursively, and nothing is created on disk.
pub fn watch_document(path: &Path, events: UnboundedSender<FileChanged>) -> Result<DocumentWatcher> {
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| Error::InvalidDestination(path.display().to_string()))?;
    let dir = parent
        .ancestors()
        .find(|p| p.is_dir())
        .ok_or_else(|| Error::io(parent, std::io::ErrorKind::NotFound.into()))?
        .to_path_buf();
    let mode = if dir == parent {
        RecursiveMode::NonRecursive
    } else {
        RecursiveMode::Recursive
    };
    // Event paths are matched by their tail below the watched directory.
    let relative = path
        .strip_prefix(&dir)
        .map_err(|_| Error::InvalidDestination(path.display().to_string()))?
        .to_path_buf();

    let target = path.to_path_buf();
    let mut watcher = recommended_watcher(move |res: notify::Result<notify::Event>| {
        let Ok(event) = res else { return };
        if !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) {
            return;
        }
        if event.paths.iter().any(|p| p.ends_with(&relative)) {
            debug!(kind = ?event.kind, "document changed on disk");
            // Receiver gone means the host shut down.
            let _ = events.send(FileChanged {
                path: target.clone(),
            });
        }
    })
    .map_err(|e| notify_error(&dir, e))?;

    watcher
        .watch(&dir, mode)
        .map_err(|e| notify_error(&dir, e))?;
    info!(path = %path.display(), dir = %dir.display(), ?mode, "watching architecture document");

    Ok(DocumentWatcher {
        path: path.to_path_buf(),
        _watcher: watcher,
    })
}

fn notify_error(dir: &Path, e: notify::Error) -> Error {
    Error::io(dir, std::io::Error::other(e))
}
