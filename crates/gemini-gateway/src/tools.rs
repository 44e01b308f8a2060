//! Function declarations for the memory tools.

use serde_json::json;

use crate::api_types::{FunctionDeclaration, Tool};

/// The tool manifest exposed on tools-enabled rounds: `get_memory` and
/// `store_memory`.
pub fn memory_tool_manifest() -> Vec<Tool> {
    vec![Tool {
        function_declarations: vec![get_memory_declaration(), store_memory_declaration()],
    }]
}

fn get_memory_declaration() -> FunctionDeclaration {
    FunctionDeclaration {
        name: "get_memory".to_string(),
        description: "Retrieve relevant memories and knowledge to help answer the user's query. \
                      Use this when you need context or information that might have been shared \
                      previously. If the query contains terms like \"in the last week\", \
                      \"coming weeks\" or \"today\", infer start_date and end_date from the \
                      provided current date in UTC. If no such terms are present leave them null."
            .to_string(),
        parameters: json!({
            "type": "OBJECT",
            "properties": {
                "search_query": {
                    "type": "STRING",
                    "description": "The search query to find relevant memories. Be specific about what information you're looking for."
                },
                "start_date": {
                    "type": "STRING",
                    "nullable": true,
                    "description": "The start date to find relevant memories, in YYYY-MM-DD format."
                },
                "end_date": {
                    "type": "STRING",
                    "nullable": true,
                    "description": "The end date to find relevant memories, in YYYY-MM-DD format."
                }
            },
            "required": ["search_query"]
        }),
    }
}

fn store_memory_declaration() -> FunctionDeclaration {
    FunctionDeclaration {
        name: "store_memory".to_string(),
        description: "Store new information as a memory when the user shares likes/dislikes, \
                      something useful, makes a decision, completes a task, introduces new \
                      entities, or provides feedback/clarification. Summarize the memory in a \
                      concise format."
            .to_string(),
        parameters: json!({
            "type": "OBJECT",
            "properties": {
                "memory_content": {
                    "type": "STRING",
                    "description": "The information to store as memory. Include relevant context and details. Summarize the memory in a concise format."
                },
                "memory_type": {
                    "type": "STRING",
                    "description": "Type of memory being stored",
                    "enum": ["preference", "decision", "task_completion", "entity", "feedback", "general_info"]
                }
            },
            "required": ["memory_content", "memory_type"]
        }),
    }
}
