//! A backend that records every message instead of sending it.

use knockknock::{Backend, DeliveryError, Event, Message};
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, Default)]
pub struct RecordingBackend {
    pub delivered: Arc<Mutex<Vec<Message>>>,
    fail: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records messages but reports every delivery as failed.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn messages(&self) -> Vec<Message> {
        self.delivered.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.messages().iter().map(Message::event).collect()
    }
}

impl Backend for RecordingBackend {
    fn name(&self) -> &'static str {
        "recording"
    }

    fn deliver(&self, message: &Message) -> Result<(), DeliveryError> {
        self.delivered.lock().unwrap().push(message.clone());
        if self.fail {
            return Err(DeliveryError::Api {
                backend: "recording",
                message: "provider unavailable".to_string(),
            });
        }
        Ok(())
    }
}
