use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(#[source] arboard::Error),
    #[error("failed to copy: {0}")]
    Write(#[source] arboard::Error),
}

/// Replaces the system clipboard's text.
pub fn write_text(text: &str) -> Result<(), ClipboardError> {
    let mut clipboard = arboard::Clipboard::new().map_err(ClipboardError::Unavailable)?;
    clipboard
        .set_text(text.to_string())
        .map_err(ClipboardError::Write)?;
    debug!(
        lines = text.lines().count(),
        bytes = text.len(),
        "copied to clipboard"
    );
    Ok(())
}
