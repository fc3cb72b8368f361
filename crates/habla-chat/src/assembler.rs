//! Streamed reply assembly.
//!
//! Fragments append to a raw buffer that is the source of truth; every
//! text-bearing fragment triggers a full re-render of the cumulative text
//! because partial Markdown only renders correctly as a whole. Citation
//! metadata is last-write-wins and attached on completion.

use habla_core::types::{Citation, Message, MessageId, MessageStatus};

use crate::backend::Fragment;
use crate::render::{citation_block, MarkupRenderer};

/// Replaces the reply when the stream fails.
pub const ERROR_NOTICE: &str = "Lo siento, hubo un error al procesar tu solicitud.";

/// Accumulates one streamed reply into its assistant message.
#[derive(Debug)]
pub struct StreamAssembler {
    message_id: MessageId,
    raw: String,
    citations: Option<Vec<Citation>>,
    renders: usize,
    started: bool,
}

impl StreamAssembler {
    pub fn new(message_id: MessageId) -> Self {
        Self {
            message_id,
            raw: String::new(),
            citations: None,
            renders: 0,
            started: false,
        }
    }

    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    /// Full renders performed so far.
    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    /// Apply one fragment. Returns `true` when the visible message changed.
    pub fn apply(
        &mut self,
        fragment: Fragment,
        message: &mut Message,
        renderer: &dyn MarkupRenderer,
    ) -> bool {
        let mut changed = false;

        if !self.started {
            // First fragment of any kind swaps out the typing indicator.
            self.started = true;
            message.status = MessageStatus::Streaming;
            message.markup.clear();
            changed = true;
        }

        if let Some(text) = fragment.text.filter(|t| !t.is_empty()) {
            self.raw.push_str(&text);
            message.raw_text.clone_from(&self.raw);
            message.markup = renderer.render(&self.raw);
            self.renders += 1;
            changed = true;
        }

        if let Some(citations) = fragment.citations {
            self.citations = Some(citations);
        }

        changed
    }

    /// The stream ended normally. Returns the number of citations attached.
    pub fn finish(self, message: &mut Message, renderer: &dyn MarkupRenderer) -> usize {
        message.status = MessageStatus::Complete;
        let citations = self.citations.unwrap_or_default();
        if !citations.is_empty() {
            let sources = renderer.render(&citation_block(&citations));
            if !message.markup.is_empty() && !message.markup.ends_with('\n') {
                message.markup.push_str("\n\n");
            }
            message.markup.push_str(&sources);
        }
        let count = citations.len();
        message.citations = citations;
        tracing::debug!(
            message = %self.message_id,
            renders = self.renders,
            citations = count,
            "Reply complete"
        );
        count
    }

    /// The stream failed. Partial content is replaced by the notice.
    pub fn fail(self, message: &mut Message) {
        message.status = MessageStatus::Failed;
        message.raw_text = ERROR_NOTICE.to_string();
        message.markup = ERROR_NOTICE.to_string();
        message.citations.clear();
    }
}
