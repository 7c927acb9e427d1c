//! Server-Sent Events decoding (Bytes -> JSON Value)

use crate::{BoxStream, Error};
use bytes::{Bytes, BytesMut};
use futures::{stream, StreamExt};
use serde_json::Value;

const DONE_SIGNAL: &str = "[DONE]";

fn is_done(frame: &str) -> bool {
    let t = frame.trim();
    t == DONE_SIGNAL || t.strip_prefix("data:").map(str::trim) == Some(DONE_SIGNAL)
}

/// Collect the `data:` lines of one frame. Comment lines (`:`) and other fields are skipped.
fn parse_frame(frame: &str) -> Option<Result<Value, Error>> {
    let frame = frame.replace("\r\n", "\n").replace('\r', "\n");
    let payload = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join("\n");

    let payload = payload.trim();
    if payload.is_empty() {
        return None;
    }

    Some(serde_json::from_str(payload).map_err(|e| Error::Stream {
        message: format!("invalid JSON in SSE frame: {}", e),
    }))
}

/// Length of the line ending starting at `i`, if any (`\r\n`, `\n` or `\r`).
fn line_ending_len(buf: &[u8], i: usize) -> Option<usize> {
    match buf.get(i)? {
        b'\n' => Some(1),
        b'\r' if buf.get(i + 1) == Some(&b'\n') => Some(2),
        b'\r' => Some(1),
        _ => None,
    }
}

/// Locate the first blank line. Returns `(frame_end, consumed)`.
fn find_frame_end(buf: &[u8]) -> Option<(usize, usize)> {
    // A trailing CR may be the first half of a CRLF still in flight.
    let buf = match buf.last() {
        Some(b'\r') => &buf[..buf.len() - 1],
        _ => buf,
    };
    let mut i = 0;
    while i < buf.len() {
        match line_ending_len(buf, i) {
            Some(first) => {
                if let Some(second) = line_ending_len(buf, i + first) {
                    return Some((i, i + first + second));
                }
                i += first;
            }
            None => i += 1,
        }
    }
    None
}

fn decode_frame(bytes: &[u8]) -> Result<&str, Error> {
    std::str::from_utf8(bytes).map_err(|e| Error::Stream {
        message: format!("SSE frame is not valid UTF-8: {}", e),
    })
}

/// Split an SSE byte stream into JSON payloads, stopping at `[DONE]`.
pub fn decode_sse(input: BoxStream<'static, Bytes>) -> BoxStream<'static, Value> {
    // Bytes are buffered raw; only complete frames are decoded as UTF-8.
    let stream = stream::unfold(Some((input, BytesMut::new())), |state| async move {
        let Some((mut input, mut buf)) = state else {
            return None;
        };
        loop {
            if let Some((end, consumed)) = find_frame_end(&buf) {
                let raw = buf.split_to(consumed);
                let frame = match decode_frame(&raw[..end]) {
                    Ok(frame) => frame,
                    Err(e) => return Some((Err(e), None)),
                };

                if is_done(frame) {
                    return None;
                }
                match parse_frame(frame) {
                    Some(item) => return Some((item, Some((input, buf)))),
                    None => continue,
                }
            }

            // Need more data.
            match input.next().await {
                Some(Ok(bytes)) => buf.extend_from_slice(&bytes),
                Some(Err(e)) => return Some((Err(e), None)),
                None => {
                    // EOF: try the remaining buffer once
                    let rest = match decode_frame(&buf) {
                        Ok(rest) => rest,
                        Err(e) => return Some((Err(e), None)),
                    };
                    if is_done(rest) {
                        return None;
                    }
                    return parse_frame(rest).map(|item| (item, None));
                }
            }
        }
    });

    Box::pin(stream)
}
