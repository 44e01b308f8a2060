//! Conversation orchestrator.
//!
//! Drives one reasoning turn as a bounded two-round function-calling
//! exchange: the first round runs with the memory tools enabled, tool calls
//! are resolved against the memory gateway (searches with timezone-aware
//! date-range translation, stores with consolidation-event capture), and if
//! any tool fired a second round without tools forces the final
//! natural-language answer.
//!
//! The orchestrator never fails its caller: gateway errors degrade to an
//! apologetic reply string.

pub mod dates;
mod orchestrator;
mod prompt;

pub use orchestrator::{ConversationOrchestrator, ConverseOutcome, ConverseRequest};
pub use prompt::format_memories_as_context;
