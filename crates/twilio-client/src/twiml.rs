//! TwiML reply envelope.
//!
//! The provider expects webhook responses as an XML `<Response>` element with
//! zero or more `<Message>` children.

/// Builder for a TwiML messaging response.
#[derive(Debug, Default, Clone)]
pub struct MessagingResponse {
    messages: Vec<String>,
}

impl MessagingResponse {
    /// Create an empty response.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message to the reply.
    pub fn message(mut self, body: impl Into<String>) -> Self {
        self.messages.push(body.into());
        self
    }

    /// Render the XML envelope.
    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?><Response>");
        for message in &self.messages {
            xml.push_str("<Message>");
            xml.push_str(&escape(message));
            xml.push_str("</Message>");
        }
        xml.push_str("</Response>");
        xml
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
