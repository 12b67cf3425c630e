use vibe_core::{rules, serialize, ArchitectureDocument};

pub fn system_prompt(document_name: &str) -> String {
    format!(
        "You are an AI assistant helping to modify a software architecture document.\n\
The user wants to update the `{document_name}` file.\n\n\
{}",
        rules::RULES
    )
}

/// Build the full instruction payload for one user edit request.
///
/// `current_text` is the document as it is on disk. When it is blank the
/// built-in example is embedded instead, so the assistant has a structure to
/// start from.
pub fn build_edit_prompt(user_request: &str, current_text: &str) -> String {
    build_edit_prompt_for("copilot-instructions.md", user_request, current_text)
}

pub fn build_edit_prompt_for(document_name: &str, user_request: &str, current_text: &str) -> String {
    let mut out = String::with_capacity(4096);
    out.push_str(&system_prompt(document_name));
    out.push_str("\n\n");

    if current_text.trim().is_empty() {
        out.push_str(
            "The file is empty or does not exist. Create it with the following example structure \
in mind, without changing the LLM instructions, and only modifying the actual architecture-related \
and app-related data : [\n\n",
        );
        out.push_str(&serialize(&ArchitectureDocument::example()));
    } else {
        out.push_str("Current contents of the file: [\n\n");
        out.push_str(current_text.trim_end());
        out.push('\n');
    }
    out.push_str("]\n\n");

    out.push_str("**User Request:**\n");
    out.push_str(user_request.trim());
    out.push_str("\n\n**Action:**\n");
    out.push_str(&format!(
        "Update the `{document_name}` file in the workspace to reflect the user's request \
while strictly adhering to the structure above.\n"
    ));
    out
}
