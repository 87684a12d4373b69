//! Error types for the menu store.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MenuError {
    #[error("Invalid menu item: {0}")]
    InvalidItem(String),

    /// The menu is read-only once seeded.
    #[error("Menu is read-only")]
    ReadOnly,

    #[error("Actor communication error: {0}")]
    ActorCommunicationError(String),
}

impl From<String> for MenuError {
    fn from(msg: String) -> Self {
        MenuError::ActorCommunicationError(msg)
    }
}
