//! Tool invocations emitted by the reasoning model.
//!
//! The model can request the host to execute one of two named operations
//! (`get_memory`, `store_memory`) before finalizing its answer. The host
//! resolves each invocation and feeds the result back in a follow-up turn.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured function call requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Name of the requested operation.
    pub name: String,
    /// Arguments as a JSON object.
    pub arguments: Map<String, Value>,
}

impl ToolInvocation {
    /// Create an invocation from a name and JSON arguments.
    pub fn new(name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }

    /// Get a string argument by name. Null arguments count as absent.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Get a required string argument, or an error message naming it.
    pub fn require_str(&self, key: &str) -> Result<&str, String> {
        self.get_str(key)
            .ok_or_else(|| format!("missing required argument: {}", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn invocation() -> ToolInvocation {
        let args = json!({
            "search_query": "dinner plans",
            "start_date": null,
        });
        let Value::Object(map) = args else {
            unreachable!()
        };
        ToolInvocation::new("get_memory", map)
    }

    #[test]
    fn test_get_str() {
        let call = invocation();
        assert_eq!(call.get_str("search_query"), Some("dinner plans"));
        // null is treated as absent
        assert_eq!(call.get_str("start_date"), None);
        assert_eq!(call.get_str("end_date"), None);
    }

    #[test]
    fn test_require_str_missing() {
        let call = invocation();
        assert!(call.require_str("memory_content").is_err());
        assert_eq!(call.require_str("search_query").unwrap(), "dinner plans");
    }
}
