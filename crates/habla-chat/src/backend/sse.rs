//! Incremental Server-Sent Events parsing for streamed replies.
//!
//! Bytes arrive in arbitrary chunks; lines are buffered until a newline and
//! events are emitted at blank-line boundaries. `data:` lines of one event
//! are joined with `\n`, comment lines (leading `:`) are skipped.

/// A complete SSE event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseEvent {
    /// Value of the `event:` field, if any.
    pub event_type: Option<String>,
    pub data: String,
}

#[derive(Debug, Default)]
struct PendingEvent {
    event_type: Option<String>,
    data_lines: Vec<String>,
}

impl PendingEvent {
    fn take(&mut self) -> Option<SseEvent> {
        if self.data_lines.is_empty() {
            self.event_type = None;
            return None;
        }
        let data = std::mem::take(&mut self.data_lines).join("\n");
        Some(SseEvent {
            event_type: self.event_type.take(),
            data,
        })
    }

    fn line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            return self.take();
        }
        if line.starts_with(':') {
            return None;
        }
        if let Some((field, value)) = split_field(line) {
            match field {
                "data" => self.data_lines.push(value.to_string()),
                "event" => self.event_type = Some(value.to_string()),
                _ => {}
            }
        }
        None
    }
}

/// `field: value` with one optional leading space stripped from the value.
fn split_field(line: &str) -> Option<(&str, &str)> {
    let (field, value) = line.split_once(':')?;
    Some((field, value.strip_prefix(' ').unwrap_or(value)))
}

/// Stateful parser fed with raw body chunks.
#[derive(Debug, Default)]
pub struct SseLineParser {
    partial: Vec<u8>,
    pending: PendingEvent,
}

impl SseLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the events it completed.
    ///
    /// Lines are split on raw bytes so a multi-byte character spanning two
    /// chunks is decoded intact.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let mut events = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                let raw = std::mem::take(&mut self.partial);
                let line = String::from_utf8_lossy(&raw);
                let line = line.strip_suffix('\r').unwrap_or(&line);
                if let Some(event) = self.pending.line(line) {
                    events.push(event);
                }
            } else {
                self.partial.push(byte);
            }
        }
        events
    }

    /// Emit whatever is buffered once the body has ended.
    pub fn flush(&mut self) -> Option<SseEvent> {
        if !self.partial.is_empty() {
            let raw = std::mem::take(&mut self.partial);
            let line = String::from_utf8_lossy(&raw);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if let Some(event) = self.pending.line(line) {
                return Some(event);
            }
        }
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_field() {
        assert_eq!(split_field("data: hola"), Some(("data", "hola")));
        assert_eq!(split_field("data:hola"), Some(("data", "hola")));
        assert_eq!(split_field("data:"), Some(("data", "")));
        assert_eq!(split_field("data: {\"a\":1}"), Some(("data", "{\"a\":1}")));
        assert_eq!(split_field("sin campo"), None);
    }

    #[test]
    fn test_single_event() {
        let mut p = SseLineParser::new();
        let events = p.push(b"data: {\"x\":1}\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "{\"x\":1}");
        assert!(events[0].event_type.is_none());
    }

    #[test]
    fn test_event_split_across_chunks() {
        let mut p = SseLineParser::new();
        assert!(p.push(b"data: Ho").is_empty());
        assert!(p.push(b"la\n").is_empty());
        let events = p.push(b"\n");
        assert_eq!(events[0].data, "Hola");
    }

    #[test]
    fn test_multibyte_char_split_across_chunks() {
        let bytes = "data: Olá\n\n".as_bytes();
        // Split inside the two-byte 'á'.
        let cut = bytes.iter().position(|b| *b == 0xC3).unwrap() + 1;
        let mut p = SseLineParser::new();
        assert!(p.push(&bytes[..cut]).is_empty());
        let events = p.push(&bytes[cut..]);
        assert_eq!(events[0].data, "Olá");
    }

    #[test]
    fn test_crlf_and_comments() {
        let mut p = SseLineParser::new();
        let events = p.push(b": keep-alive\r\nevent: message\r\ndata: a\r\n\r\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type.as_deref(), Some("message"));
        assert_eq!(events[0].data, "a");
    }

    #[test]
    fn test_multi_line_data_joined() {
        let mut p = SseLineParser::new();
        let events = p.push(b"data: uno\ndata: dos\n\n");
        assert_eq!(events[0].data, "uno\ndos");
    }

    #[test]
    fn test_several_events_in_one_chunk() {
        let mut p = SseLineParser::new();
        let events = p.push(b"data: a\n\ndata: b\n\n");
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].data, "b");
    }

    #[test]
    fn test_flush_trailing_event() {
        let mut p = SseLineParser::new();
        assert!(p.push(b"data: final").is_empty());
        assert_eq!(p.flush().unwrap().data, "final");
        assert!(p.flush().is_none());
    }

    #[test]
    fn test_blank_lines_without_data() {
        let mut p = SseLineParser::new();
        assert!(p.push(b"\n\n\n").is_empty());
        assert!(p.flush().is_none());
    }
}
