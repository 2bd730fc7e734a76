use crate::core::models::ChatMessage;

/// Filters a history window, retaining only messages worth summarizing:
/// drops blank messages and bot-command invocations.
#[must_use]
pub fn filter_history_messages(messages: Vec<ChatMessage>) -> Vec<ChatMessage> {
    messages
        .into_iter()
        .filter(|msg| {
            let text = msg.text.trim();
            let is_blank = text.is_empty();
            let is_command = text.starts_with('/');

            !is_blank && !is_command
        })
        .collect()
}
