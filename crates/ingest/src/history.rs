//! Conversation history formatting for prompt construction.

use database::Interaction;

/// Format prior interactions as alternating user/bot lines.
///
/// Interactions arrive newest-first (how the database returns them) and are
/// reversed here so the prompt reads chronologically.
pub fn format_past_interactions(newest_first: &[Interaction]) -> String {
    let mut lines = Vec::with_capacity(newest_first.len());
    for interaction in newest_first.iter().rev() {
        lines.push(format!(
            "{}. User: {}\nBot: {}\n\n",
            interaction.id, interaction.user_message, interaction.bot_response
        ));
    }
    lines.join("\n")
}
