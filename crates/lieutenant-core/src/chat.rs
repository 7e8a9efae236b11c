//! Role normalization for outbound chat requests.
//!
//! Providers disagree on the name of the instruction role: OpenAI's newer
//! models take `developer`, Anthropic and Perplexity take `system`. Every
//! inbound instruction message is rewritten to the target's role and
//! prefixed with the model's developer prompt. Conversation turns pass
//! through untouched and in order.

use crate::models::{ChatMessage, Role};

/// Placed between the developer prompt and the caller's instruction text.
pub const PROMPT_SEPARATOR: &str = "\n\n---\n\n";

/// Rewrite instruction messages for a target model.
///
/// The output always has the same length and order as the input.
pub fn normalize_messages(
    messages: &[ChatMessage],
    developer_prompt: &str,
    system_role: Role,
) -> Vec<ChatMessage> {
    messages
        .iter()
        .map(|message| {
            if !message.role.is_instruction() {
                return message.clone();
            }
            let content = if developer_prompt.is_empty() {
                message.content.clone()
            } else {
                format!("{}{}{}", developer_prompt, PROMPT_SEPARATOR, message.content)
            };
            ChatMessage::new(system_role, content)
        })
        .collect()
}
