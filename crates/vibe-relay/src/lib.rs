pub mod assistant;
mod prompt;

pub use assistant::{Assistant, CommandAssistant, RelayError};
pub use prompt::{build_edit_prompt, build_edit_prompt_for, system_prompt};

use tracing::info;

/// Wrap a free-text edit request with the schema rules and hand it to the assistant.
pub async fn relay_edit_request<A: Assistant + ?Sized>(
    assistant: &A,
    document_name: &str,
    user_request: &str,
    current_text: &str,
) -> Result<(), RelayError> {
    let prompt = build_edit_prompt_for(document_name, user_request, current_text);
    info!(document = document_name, "sending edit request to assistant");
    assistant.open_chat(&prompt).await
}
