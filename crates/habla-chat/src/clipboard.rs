//! System clipboard seam.

use crate::error::ChatError;

/// Write access to a clipboard.
pub trait Clipboard: Send {
    fn set_text(&mut self, text: &str) -> Result<(), ChatError>;
}
