use serde::{Deserialize, Serialize};

pub mod auth;
pub mod directory;
pub mod tickets;

/// Body returned by delete operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Confirmation {
    pub message: String,
}

impl Confirmation {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
