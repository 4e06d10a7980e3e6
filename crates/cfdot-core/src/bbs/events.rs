// crates/cfdot-core/src/bbs/events.rs - Server-sent event subscriptions
//
// The record store streams events as `text/event-stream`:
//
//   event: desired_lrp_created
//   id: 3
//   data: {"desired_lrp": {...}}
//   <blank line>
//
// A frame ends at a blank line. Multiple `data:` lines are joined with '\n'.
// Comment lines (leading ':') and unknown fields are ignored. When the HTTP
// body ends the subscription is over; a half-received frame is dropped.

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::error::{BbsError, BbsResult, ErrorType};

/// One item of the JSON event stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
}

impl EventEnvelope {
    pub fn new(event_type: impl Into<String>, data: Value) -> Self {
        Self {
            event_type: event_type.into(),
            data,
        }
    }

    /// desired_lrp_created, desired_lrp_changed or desired_lrp_removed
    pub fn is_desired_lrp_event(&self) -> bool {
        self.event_type.starts_with("desired_lrp_")
    }
}

/// A subscription that yields events until the server ends the stream
#[allow(async_fn_in_trait)]
pub trait EventSource {
    /// `Ok(None)` is a clean end of stream
    async fn next(&mut self) -> BbsResult<Option<EventEnvelope>>;

    /// Release the underlying connection; further calls to `next` end the stream
    fn close(&mut self);
}

/// A decoded frame before its payload is parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: String,
    pub data: String,
}

/// Incremental `text/event-stream` decoder
///
/// Bytes before `consumed` belong to lines already decoded; `scanned` marks how
/// far the search for the next newline has got, so a long line arriving in many
/// small chunks is only scanned once.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    consumed: usize,
    scanned: usize,
    event: Option<String>,
    data: Vec<String>,
}

impl SseDecoder {
    pub fn push(&mut self, chunk: &[u8]) {
        if self.consumed > 0 {
            self.buffer.drain(..self.consumed);
            self.scanned -= self.consumed;
            self.consumed = 0;
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Next complete frame from what has been pushed so far
    pub fn next_frame(&mut self) -> BbsResult<Option<SseFrame>> {
        while let Some(line) = self.next_line()? {
            if line.is_empty() {
                if self.event.is_none() && self.data.is_empty() {
                    continue;
                }
                return Ok(Some(SseFrame {
                    event: self.event.take().unwrap_or_else(|| "message".to_string()),
                    data: std::mem::take(&mut self.data).join("\n"),
                }));
            }

            if line.starts_with(':') {
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line.as_str(), ""),
            };

            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                _ => {}
            }
        }
        Ok(None)
    }

    fn next_line(&mut self) -> BbsResult<Option<String>> {
        let Some(offset) = self.buffer[self.scanned..].iter().position(|b| *b == b'\n') else {
            self.scanned = self.buffer.len();
            return Ok(None);
        };
        let end = self.scanned + offset;
        let start = self.consumed;
        self.consumed = end + 1;
        self.scanned = end + 1;

        let raw = &self.buffer[start..end];
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = std::str::from_utf8(raw).map_err(|err| {
            BbsError::api(
                ErrorType::DESERIALIZE,
                format!("event stream line is not valid UTF-8: {err}"),
            )
        })?;
        Ok(Some(line.to_string()))
    }
}

impl SseFrame {
    pub fn into_envelope(self) -> BbsResult<EventEnvelope> {
        let data = if self.data.is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&self.data).map_err(|err| {
                BbsError::api(
                    ErrorType::DESERIALIZE,
                    format!("failed to parse '{}' event payload: {err}", self.event),
                )
            })?
        };
        Ok(EventEnvelope::new(self.event, data))
    }
}

type ByteStream = Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>;

/// Event subscription backed by a streaming HTTP response
pub struct SseEventSource {
    route: &'static str,
    body: Option<ByteStream>,
    decoder: SseDecoder,
}

impl SseEventSource {
    pub fn new(route: &'static str, response: reqwest::Response) -> Self {
        Self {
            route,
            body: Some(Box::pin(response.bytes_stream())),
            decoder: SseDecoder::default(),
        }
    }
}

impl EventSource for SseEventSource {
    async fn next(&mut self) -> BbsResult<Option<EventEnvelope>> {
        loop {
            if let Some(frame) = self.decoder.next_frame()? {
                return frame.into_envelope().map(Some);
            }

            let Some(body) = self.body.as_mut() else {
                return Ok(None);
            };

            match body.next().await {
                Some(Ok(chunk)) => self.decoder.push(&chunk),
                Some(Err(err)) => return Err(BbsError::transport(err)),
                None => {
                    debug!(route = self.route, "event stream ended");
                    self.body = None;
                    return Ok(None);
                }
            }
        }
    }

    fn close(&mut self) {
        if self.body.take().is_some() {
            debug!(route = self.route, "closed event stream");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn frames(input: &str) -> Vec<SseFrame> {
        let mut decoder = SseDecoder::default();
        decoder.push(input.as_bytes());
        std::iter::from_fn(|| decoder.next_frame().unwrap()).collect()
    }

    #[test]
    fn test_single_frame() {
        let got = frames("event: task_created\nid: 1\ndata: {\"task\":{}}\n\n");
        assert_eq!(
            got,
            vec![SseFrame {
                event: "task_created".into(),
                data: "{\"task\":{}}".into()
            }]
        );
    }

    #[test]
    fn test_multi_line_data_and_comments() {
        let got = frames(": keepalive\r\nevent: x\r\ndata: {\"a\":\r\ndata: 1}\r\n\r\n");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].data, "{\"a\":\n1}");
    }

    #[test]
    fn test_frames_split_across_chunks() {
        let mut decoder = SseDecoder::default();
        decoder.push(b"event: desired_lrp_re");
        assert_eq!(decoder.next_frame().unwrap(), None);
        decoder.push(b"moved\ndata: {}\n");
        assert_eq!(decoder.next_frame().unwrap(), None);
        decoder.push(b"\nevent: second\ndata: null\n\n");
        assert_eq!(decoder.next_frame().unwrap().unwrap().event, "desired_lrp_removed");
        assert_eq!(decoder.next_frame().unwrap().unwrap().event, "second");
        assert_eq!(decoder.next_frame().unwrap(), None);
    }

    #[test]
    fn test_long_line_in_small_chunks() {
        let payload = format!("{{\"key\":\"{}\"}}", "v".repeat(64 * 1024));
        let input = format!("event: big\ndata: {payload}\n\nevent: after\ndata: 1\n\n");

        let mut decoder = SseDecoder::default();
        let mut got = Vec::new();
        for chunk in input.as_bytes().chunks(7) {
            decoder.push(chunk);
            while let Some(frame) = decoder.next_frame().unwrap() {
                got.push(frame);
            }
        }

        assert_eq!(got.len(), 2);
        assert_eq!(got[0].event, "big");
        assert_eq!(got[0].data, payload);
        assert_eq!(got[1].event, "after");
        assert_eq!(got[1].data, "1");
    }

    #[test]
    fn test_invalid_utf8_is_reported() {
        let mut decoder = SseDecoder::default();
        decoder.push(b"event: x\ndata: \xff\xfe\n\nevent: y\ndata: 2\n\n");
        let err = decoder.next_frame().unwrap_err();
        assert_eq!(err.error_type(), Some(ErrorType::DESERIALIZE));

        // the bad line is consumed, so decoding resumes after it
        let frame = decoder.next_frame().unwrap().unwrap();
        assert_eq!(frame.event, "x");
        assert_eq!(frame.data, "");
    }

    #[test]
    fn test_blank_lines_without_fields_are_skipped() {
        assert!(frames("\n\n\n").is_empty());
    }

    #[test]
    fn test_envelope_parsing() {
        let frame = SseFrame {
            event: "actual_lrp_instance_created".into(),
            data: "{\"actual_lrp\":{\"state\":\"RUNNING\"}}".into(),
        };
        let envelope = frame.into_envelope().unwrap();
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"type": "actual_lrp_instance_created", "data": {"actual_lrp": {"state": "RUNNING"}}})
        );
        assert!(!envelope.is_desired_lrp_event());

        let bad = SseFrame {
            event: "desired_lrp_changed".into(),
            data: "{".into(),
        };
        assert_eq!(bad.into_envelope().unwrap_err().error_type(), Some(ErrorType::DESERIALIZE));
    }
}
