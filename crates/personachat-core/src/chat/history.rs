//! Conversation assembly for provider calls.

use personachat_types::chat::HistoryMessage;
use personachat_types::llm::LlmMessage;

/// Build the message list for a provider call.
///
/// Keeps the last `max_history` entries of `history`, drops blank ones and
/// appends `new_message` as the final user turn.
pub fn assemble_conversation(
    history: &[HistoryMessage],
    new_message: &str,
    max_history: usize,
) -> Vec<LlmMessage> {
    let start = history.len().saturating_sub(max_history);
    let mut messages: Vec<LlmMessage> = history[start..]
        .iter()
        .filter(|m| !m.content.trim().is_empty())
        .map(|m| {
            if m.is_user {
                LlmMessage::user(m.content.as_str())
            } else {
                LlmMessage::assistant(m.content.as_str())
            }
        })
        .collect();
    messages.push(LlmMessage::user(new_message));
    messages
}
