//! System clipboard through `arboard`.

use habla_chat::{ChatError, Clipboard};

/// Opens the system clipboard on each copy; the handle is not kept alive
/// between copies.
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ChatError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ChatError::Clipboard(e.to_string()))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| ChatError::Clipboard(e.to_string()))
    }
}
