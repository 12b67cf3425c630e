//! Document lifecycle for one open project: load, save, watch the file and
//! dispatch UI requests against it.

mod host;
mod session;
mod watch;

pub use host::{Host, Request, UiMessage};
pub use session::{Session, SessionState};
pub use watch::{watch_document, DocumentWatcher, FileChanged};
