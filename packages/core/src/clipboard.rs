//! System clipboard collaborator
//!
//! Reading and writing the clipboard is asynchronous and may be refused by
//! the host. Failures surface as [`ClipboardError`] values the caller turns
//! into a notification.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClipboardError {
    #[error("Clipboard access was denied")]
    PermissionDenied,

    #[error("Clipboard is unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait ClipboardProvider: Send + Sync {
    async fn read_text(&self) -> Result<String, ClipboardError>;
    async fn write_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// Process-local clipboard
///
/// Clones share contents. Access can be denied to exercise the
/// permission-failure path.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: Arc<Mutex<String>>,
    denied: Arc<AtomicBool>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_denied(&self, denied: bool) {
        self.denied.store(denied, Ordering::SeqCst);
    }

    fn check_access(&self) -> Result<(), ClipboardError> {
        if self.denied.load(Ordering::SeqCst) {
            return Err(ClipboardError::PermissionDenied);
        }
        Ok(())
    }
}

#[async_trait]
impl ClipboardProvider for MemoryClipboard {
    async fn read_text(&self) -> Result<String, ClipboardError> {
        self.check_access()?;
        let contents = self
            .contents
            .lock()
            .map_err(|_| ClipboardError::Unavailable("Failed to acquire lock".to_string()))?;
        Ok(contents.clone())
    }

    async fn write_text(&self, text: &str) -> Result<(), ClipboardError> {
        self.check_access()?;
        let mut contents = self
            .contents
            .lock()
            .map_err(|_| ClipboardError::Unavailable("Failed to acquire lock".to_string()))?;
        *contents = text.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_read() {
        let clipboard = MemoryClipboard::new();
        clipboard.write_text("hello").await.unwrap();
        assert_eq!(clipboard.read_text().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_denied_access() {
        let clipboard = MemoryClipboard::new();
        clipboard.write_text("kept").await.unwrap();
        clipboard.set_denied(true);

        assert_eq!(
            clipboard.read_text().await.unwrap_err(),
            ClipboardError::PermissionDenied
        );
        assert_eq!(
            clipboard.write_text("lost").await.unwrap_err(),
            ClipboardError::PermissionDenied
        );

        clipboard.set_denied(false);
        assert_eq!(clipboard.read_text().await.unwrap(), "kept");
    }
}
