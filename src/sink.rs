//! Frame sinks: where finished frames and UI text go.
//!
//! Every message carries a `type` tag. Terrain frames are `ascii`; the other
//! kinds (`input`, `input_confirm`, `output`) carry text for the display's
//! overlay.

use std::io::Write;
use std::time::{Duration, Instant};

use crossterm::{cursor, execute, terminal};
use serde::{Deserialize, Serialize};

use crate::error::SinkError;
use crate::render::OutputGrid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    /// A rendered terrain frame
    Ascii,
    /// Tentative user input
    Input,
    /// Confirmed user input
    InputConfirm,
    /// System text shown to the user
    Output,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameMessage {
    #[serde(rename = "type")]
    pub kind: FrameKind,
    pub content: String,
}

impl FrameMessage {
    pub fn ascii(grid: &OutputGrid) -> Self {
        Self {
            kind: FrameKind::Ascii,
            content: grid.to_text(),
        }
    }

    pub fn output(text: impl Into<String>) -> Self {
        Self {
            kind: FrameKind::Output,
            content: text.into(),
        }
    }
}

/// Receives frames. A sink that is not ready gets no frames until it says so.
pub trait FrameSink {
    fn is_ready(&mut self) -> bool {
        true
    }

    fn send(&mut self, message: &FrameMessage) -> Result<(), SinkError>;
}

// =============================================================================
// TERMINAL
// =============================================================================

/// Redraws the terminal for every terrain frame; text messages go below it.
pub struct StdoutSink {
    clear: bool,
}

impl StdoutSink {
    pub fn new(clear: bool) -> Self {
        Self { clear }
    }
}

impl FrameSink for StdoutSink {
    fn send(&mut self, message: &FrameMessage) -> Result<(), SinkError> {
        let mut stdout = std::io::stdout().lock();
        match message.kind {
            FrameKind::Ascii => {
                if self.clear {
                    execute!(stdout, terminal::Clear(terminal::ClearType::All), cursor::MoveTo(0, 0))?;
                }
                writeln!(stdout, "{}", message.content)?;
            }
            FrameKind::Input => writeln!(stdout, "... {}", message.content)?,
            FrameKind::InputConfirm => writeln!(stdout, "> {}", message.content)?,
            FrameKind::Output => writeln!(stdout, "{}", message.content)?,
        }
        stdout.flush()?;
        Ok(())
    }
}

// =============================================================================
// JSON LINES
// =============================================================================

/// Writes each message as one JSON object per line.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> FrameSink for JsonLinesSink<W> {
    fn send(&mut self, message: &FrameMessage) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, message)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

// =============================================================================
// HTTP
// =============================================================================

/// POSTs messages as JSON to a display endpoint.
///
/// A failed request marks the sink not ready; it offers itself again once
/// `retry_after` has passed.
pub struct HttpSink {
    client: reqwest::blocking::Client,
    url: String,
    retry_after: Duration,
    failed_at: Option<Instant>,
}

impl HttpSink {
    pub fn new(url: impl Into<String>, timeout: Duration, retry_after: Duration) -> Result<Self, SinkError> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            retry_after,
            failed_at: None,
        })
    }
}

impl FrameSink for HttpSink {
    fn is_ready(&mut self) -> bool {
        match self.failed_at {
            Some(at) if at.elapsed() < self.retry_after => false,
            Some(_) => {
                self.failed_at = None;
                true
            }
            None => true,
        }
    }

    fn send(&mut self, message: &FrameMessage) -> Result<(), SinkError> {
        let response = match self.client.post(&self.url).json(message).send() {
            Ok(response) => response,
            Err(err) => {
                self.failed_at = Some(Instant::now());
                return Err(err.into());
            }
        };
        if !response.status().is_success() {
            self.failed_at = Some(Instant::now());
            return Err(SinkError::Unavailable(format!("{} returned {}", self.url, response.status())));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kinds_serialize_as_type_tags() {
        let json = serde_json::to_string(&FrameMessage {
            kind: FrameKind::InputConfirm,
            content: "go left".to_string(),
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"input_confirm","content":"go left"}"#);

        let parsed: FrameMessage = serde_json::from_str(r#"{"type":"ascii","content":"_\n|"}"#).unwrap();
        assert_eq!(parsed.kind, FrameKind::Ascii);
    }

    #[test]
    fn test_json_lines_sink_writes_one_line_per_frame() {
        let mut grid = OutputGrid::blank(3, 2);
        grid.set(1, 0, '#');
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.send(&FrameMessage::ascii(&grid)).unwrap();
        sink.send(&FrameMessage::output("hello")).unwrap();

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: FrameMessage = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.content, " # \n   ");
        assert!(lines[1].contains(r#""type":"output""#));
    }

    #[test]
    fn test_unreachable_http_sink_backs_off() {
        let mut sink = HttpSink::new(
            "http://127.0.0.1:9/frames",
            Duration::from_millis(500),
            Duration::from_secs(60),
        )
        .unwrap();
        assert!(sink.is_ready());
        assert!(sink.send(&FrameMessage::output("ping")).is_err());
        assert!(!sink.is_ready());
    }
}
