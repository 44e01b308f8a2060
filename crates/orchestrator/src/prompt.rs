//! Prompt assembly for the reasoning rounds.

use assistant_core::MemoryHit;

/// Build the combined system-and-user prompt for the tools-enabled round.
pub fn build_prompt(
    current_date: &str,
    query: &str,
    conversation_history: &str,
    media_descriptions: &[String],
) -> String {
    let history_block = if conversation_history.is_empty() {
        String::new()
    } else {
        format!("Conversation history: \n\n{}\n", conversation_history)
    };

    let mut prompt = format!(
        r#"CURRENT_DATE: {current_date}
You are a helpful AI assistant named Whatsy! with access to memory functions. Your role is to:

1. Answer user queries accurately and helpfully
2. Use get_memory to retrieve relevant context when needed or when the user asks for something specific which you are not aware of and want to look up in the knowledge base.
3. You have been provided with the conversation history of the user, to help better answer follow up questions.
4. Use store_memory to save important information from the user's chat:
    This includes:
    * Preferences: likes, dislikes, favorites (e.g., "I prefer Italian food").
    * Decisions: commitments, choices, or resolutions (e.g., "I'll go with the cheaper plan").
    * Tasks & Plans: to-dos, reminders, schedules, or events (e.g., "I need to call mom tomorrow").
    * Facts about their life: updates, achievements, health changes, routines (e.g., "I started a new job").
    * Feedback: opinions about the assistant or the experience (e.g., "Please answer more briefly next time").
    * Entities: names of people, places, pets, organizations, or other recurring references.
    * Do not store trivial acknowledgements (e.g., "hi", "ok", "thanks") or ephemeral chit-chat that has no future value.

When you retrieve memories, use them to provide more informed responses.
Always be conversational and helpful and at the same time be concise and to the point, do not be verbose.

{history_block}
User : {query}
"#
    );

    if !media_descriptions.is_empty() {
        prompt.push_str("\nUser Attached Following Media Files: \n\n");
        for line in media_descriptions {
            prompt.push_str(line);
            prompt.push('\n');
        }
    }

    prompt
}

/// Format retrieved memories as a numbered context block. Empty input
/// produces an empty string.
pub fn format_memories_as_context(memories: &[MemoryHit]) -> String {
    if memories.is_empty() {
        return String::new();
    }

    let mut block = String::from("=== RETRIEVED MEMORIES (for context) ===\n");
    for (i, memory) in memories.iter().enumerate() {
        if memory.memory.is_empty() {
            continue;
        }
        block.push_str(&format!("{}. {}\n", i + 1, memory.memory));
    }
    block.push_str("=== END OF MEMORIES ===\n");
    block
}

/// Build the tools-off follow-up prompt: retrieved context plus the original
/// query.
pub fn build_followup_prompt(memory_context: &str, query: &str) -> String {
    format!(
        "{}Please use these memories as context to answer the original query:\n{}\n",
        memory_context, query
    )
}
