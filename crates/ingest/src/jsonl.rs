//! JSON-lines source: one serialized [`ChatEvent`] per line.
//!
//! ```text
//! {"sender_id":"alice","raw_text":"hello","emote_tokens":["Kappa"],"timestamp":"2024-05-01T12:00:00Z"}
//! ```
//!
//! Blank lines are ignored. A line that does not decode is delivered as
//! [`IngestError::InvalidPayload`] and reading continues.

use std::path::Path;

use async_trait::async_trait;
use chatsieve_core::{ChatEvent, IngestError};
use tokio::io::{self, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

use crate::source::{EventSource, SourceItem};

type Reader = Box<dyn AsyncRead + Unpin + Send>;

/// Reads events from stdin, a file, or any async reader.
pub struct JsonLinesSource {
    name: String,
    reader: Mutex<Option<Reader>>,
    buffer: usize,
}

impl JsonLinesSource {
    pub fn from_reader(
        name: impl Into<String>,
        reader: impl AsyncRead + Unpin + Send + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            reader: Mutex::new(Some(Box::new(reader))),
            buffer: 64,
        }
    }

    pub fn stdin() -> Self {
        Self::from_reader("stdin", io::stdin())
    }

    pub async fn open(path: &Path) -> Result<Self, IngestError> {
        let file = tokio::fs::File::open(path).await.map_err(|e| {
            IngestError::NotConfigured(format!("cannot open {}: {e}", path.display()))
        })?;
        Ok(Self::from_reader(path.display().to_string(), file))
    }

    /// Capacity of the channel between the reader task and the dispatcher.
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer.max(1);
        self
    }
}

/// Decode one line. `line_no` is 1-based and only used in the error.
pub fn parse_line(line: &str, line_no: usize) -> Result<ChatEvent, IngestError> {
    serde_json::from_str(line)
        .map_err(|e| IngestError::InvalidPayload(format!("line {line_no}: {e}")))
}

#[async_trait]
impl EventSource for JsonLinesSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start(&self) -> Result<mpsc::Receiver<SourceItem>, IngestError> {
        let reader = self.reader.lock().await.take().ok_or_else(|| {
            IngestError::NotConfigured(format!("source '{}' already started", self.name))
        })?;

        let (tx, rx) = mpsc::channel(self.buffer);
        let name = self.name.clone();
        info!(source = %name, "Reading JSON-lines events");

        tokio::spawn(async move {
            let mut reader = BufReader::new(reader);
            let mut buf = Vec::new();
            let mut line_no = 0usize;

            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => {
                        debug!(source = %name, lines = line_no, "End of input");
                        break;
                    }
                    Ok(_) => {
                        line_no += 1;
                        let item = match std::str::from_utf8(&buf) {
                            Ok(line) if line.trim().is_empty() => continue,
                            Ok(line) => parse_line(line.trim(), line_no),
                            Err(e) => Err(IngestError::InvalidPayload(format!(
                                "line {line_no}: {e}"
                            ))),
                        };
                        if tx.send(item).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(IngestError::ConnectionLost(e.to_string()))).await;
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(source: &JsonLinesSource) -> Vec<SourceItem> {
        let mut rx = source.start().await.unwrap();
        let mut items = Vec::new();
        while let Some(item) = rx.recv().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn reads_events_and_skips_blank_lines() {
        let input = concat!(
            r#"{"sender_id":"alice","raw_text":"hello there"}"#,
            "\n\n   \n",
            r#"{"sender_id":"bob","raw_text":"","emote_tokens":["Kappa","Kappa"],"is_reply":true}"#,
            "\n",
        );
        let source = JsonLinesSource::from_reader("test", input.as_bytes());
        let items = collect(&source).await;

        assert_eq!(items.len(), 2);
        let alice = items[0].as_ref().unwrap();
        assert_eq!(alice.sender_id, "alice");
        assert!(!alice.is_reply);
        let bob = items[1].as_ref().unwrap();
        assert_eq!(bob.emote_tokens, vec!["Kappa", "Kappa"]);
        assert!(bob.is_reply);
    }

    #[tokio::test]
    async fn bad_line_is_reported_with_line_number() {
        let input = "not json\n{\"sender_id\":\"a\",\"raw_text\":\"ok\"}\n";
        let source = JsonLinesSource::from_reader("test", input.as_bytes());
        let items = collect(&source).await;

        assert_eq!(items.len(), 2);
        match &items[0] {
            Err(IngestError::InvalidPayload(msg)) => assert!(msg.starts_with("line 1:"), "{msg}"),
            other => panic!("expected invalid payload, got {other:?}"),
        }
        assert!(items[1].is_ok());
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_end_the_stream() {
        let mut input = br#"{"sender_id":"a","raw_text":"first"}"#.to_vec();
        input.extend_from_slice(b"\n\xff\xfe\n");
        input.extend_from_slice(br#"{"sender_id":"b","raw_text":"after"}"#);
        let source = JsonLinesSource::from_reader("test", std::io::Cursor::new(input));
        let items = collect(&source).await;

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap().raw_text, "first");
        match &items[1] {
            Err(IngestError::InvalidPayload(msg)) => assert!(msg.starts_with("line 2:"), "{msg}"),
            other => panic!("expected invalid payload, got {other:?}"),
        }
        // Last line has no trailing newline.
        assert_eq!(items[2].as_ref().unwrap().raw_text, "after");
    }

    #[test]
    fn parse_line_reads_timestamp() {
        let event = parse_line(
            r#"{"sender_id":"a","raw_text":"x","timestamp":"2024-05-01T12:00:00Z"}"#,
            1,
        )
        .unwrap();
        assert_eq!(event.timestamp.to_rfc3339(), "2024-05-01T12:00:00+00:00");
    }

    #[tokio::test]
    async fn missing_file_is_not_configured() {
        let result = JsonLinesSource::open(Path::new("/definitely/not/here.jsonl")).await;
        assert!(matches!(result, Err(IngestError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn starts_only_once() {
        let source = JsonLinesSource::from_reader("test", "".as_bytes());
        assert!(source.start().await.is_ok());
        assert!(source.start().await.is_err());
    }
}
