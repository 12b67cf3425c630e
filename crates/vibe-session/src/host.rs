use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use vibe_core::{ArchitectureDocument, ParseWarning, Result};
use vibe_relay::{relay_edit_request, Assistant};

use crate::session::{Session, SessionState};
use crate::watch::{watch_document, DocumentWatcher, FileChanged};

/// Messages the UI surface sends to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum Request {
    /// The UI finished loading and wants the current document.
    Ready,
    Save {
        document: ArchitectureDocument,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        destination: Option<PathBuf>,
    },
    /// Write raw text to a file relative to the project root.
    SaveFile { filename: String, text: String },
    /// Free-text edit request, wrapped with the schema rules before relay.
    RelayToAssistant { request: String },
    /// Open the assistant with a query as-is.
    OpenAssistant { query: String },
}

/// Messages the host pushes to the UI surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum UiMessage {
    LoadState {
        document: ArchitectureDocument,
        text: String,
        warnings: Vec<ParseWarning>,
    },
    Saved { path: PathBuf },
    Relayed,
    Error { code: &'static str, message: String },
}

impl UiMessage {
    fn error(e: &vibe_core::Error) -> Self {
        UiMessage::Error {
            code: e.code(),
            message: e.to_string(),
        }
    }
}

/// Single thread of control over one session: UI requests and file-change
/// events are handled one at a time, in arrival order.
pub struct Host<A: Assistant> {
    session: Session,
    assistant: A,
    outbox: UnboundedSender<UiMessage>,
}

impl<A: Assistant> Host<A> {
    pub fn new(mut session: Session, assistant: A, outbox: UnboundedSender<UiMessage>) -> Self {
        let tx = outbox.clone();
        session.on_external_change(move |parsed, text| {
            let _ = tx.send(UiMessage::LoadState {
                document: parsed.document.clone(),
                text: text.to_string(),
                warnings: parsed.warnings.clone(),
            });
        });
        Host {
            session,
            assistant,
            outbox,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Start watching the document file. `None` when no project folder is open.
    pub fn watch(&self) -> Result<Option<(DocumentWatcher, UnboundedReceiver<FileChanged>)>> {
        let Some(path) = self.session.document_path() else {
            return Ok(None);
        };
        let (tx, rx) = mpsc::unbounded_channel();
        let watcher = watch_document(&path, tx)?;
        Ok(Some((watcher, rx)))
    }

    pub async fn handle(&mut self, request: Request) {
        let reply = match request {
            Request::Ready => match self.session.load().await {
                Ok(_) => self.load_state(),
                Err(e) => Some(UiMessage::error(&e)),
            },
            Request::Save {
                document,
                destination,
            } => match self.session.save(document, destination.as_deref()).await {
                Ok(path) => Some(UiMessage::Saved { path }),
                Err(e) => Some(UiMessage::error(&e)),
            },
            Request::SaveFile { filename, text } => {
                match self.session.write_file(&filename, &text).await {
                    Ok(path) => Some(UiMessage::Saved { path }),
                    Err(e) => Some(UiMessage::error(&e)),
                }
            }
            Request::RelayToAssistant { request } => Some(self.relay(&request).await),
            Request::OpenAssistant { query } => match self.assistant.open_chat(&query).await {
                Ok(()) => Some(UiMessage::Relayed),
                Err(e) => Some(relay_failed(e)),
            },
        };
        if let Some(reply) = reply {
            self.send(reply);
        }
    }

    /// React to the document changing on disk.
    pub async fn handle_file_change(&mut self) {
        self.session.mark_stale();
        if let Err(e) = self.session.refresh().await {
            self.send(UiMessage::error(&e));
        }
    }

    /// Serve requests and file events until the request channel closes.
    pub async fn run(
        mut self,
        mut requests: UnboundedReceiver<Request>,
        mut changes: UnboundedReceiver<FileChanged>,
    ) {
        info!("host started");
        loop {
            tokio::select! {
                request = requests.recv() => match request {
                    Some(request) => self.handle(request).await,
                    None => break,
                },
                Some(change) = changes.recv() => {
                    // One atomic write fires several events; coalesce them.
                    let mut coalesced = 0;
                    while changes.try_recv().is_ok() {
                        coalesced += 1;
                    }
                    debug!(path = %change.path.display(), coalesced, "file change");
                    self.handle_file_change().await;
                }
            }
        }
        info!("host stopped");
    }

    async fn relay(&mut self, request: &str) -> UiMessage {
        if self.session.state() == SessionState::Unloaded {
            if let Err(e) = self.session.load().await {
                return UiMessage::error(&e);
            }
        }
        let name = self.session.document_name();
        // Blank text tells the assistant the file has to be created.
        let current = self.session.disk_text().unwrap_or_default();
        match relay_edit_request(&self.assistant, &name, request, current).await {
            Ok(()) => UiMessage::Relayed,
            Err(e) => relay_failed(e),
        }
    }

    fn load_state(&self) -> Option<UiMessage> {
        let parsed = self.session.current()?;
        Some(UiMessage::LoadState {
            document: parsed.document.clone(),
            text: self.session.text().unwrap_or_default().to_string(),
            warnings: parsed.warnings.clone(),
        })
    }

    fn send(&self, message: UiMessage) {
        if self.outbox.send(message).is_err() {
            debug!("ui gone, dropping message");
        }
    }
}

fn relay_failed(e: vibe_relay::RelayError) -> UiMessage {
    warn!(error = %e, "relay to assistant failed");
    UiMessage::Error {
        code: "RELAY_FAILED",
        message: e.to_string(),
    }
}
