/// Event name used by SSE when the server does not name an event.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// A single named event received from the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub event_type: String,
    pub data: String,
}

impl Message {
    pub fn new(event_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
        }
    }

    pub fn is(&self, event_type: &str) -> bool {
        self.event_type == event_type
    }
}

/// Everything a consumer can observe on an open connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Message(Message),
    /// The transport failed or the server ended the stream. Always the last
    /// event a connection yields.
    Failed(String),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Failed(_))
    }
}
