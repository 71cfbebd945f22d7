//! Unwrapping of the XML envelope used by the portal's AJAX endpoints.
//!
//! The listing endpoints answer with
//!
//! ```text
//! <?xml version="1.0"?>
//! <response status="ok">
//!   <html><![CDATA[ ...html fragment... ]]></html>
//! </response>
//! ```
//!
//! The payload may also arrive entity-escaped or as inline elements; all
//! three forms are reassembled into the same HTML string.

use std::borrow::Cow;

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use tracing::trace;

use super::ExtractError;

/// Parent element of the payload.
pub const PAYLOAD_PARENT: &str = "response";
/// Element whose content is the HTML payload.
pub const PAYLOAD_ELEMENT: &str = "html";

/// Returns true when `body` looks like an XML envelope rather than bare HTML.
#[must_use]
pub fn looks_like_envelope(body: &str) -> bool {
    let trimmed = body.trim_start();
    trimmed.starts_with("<?xml") || trimmed.starts_with(&format!("<{PAYLOAD_PARENT}"))
}

/// Returns the HTML carried by an envelope, or `body` unchanged when it is
/// not wrapped.
///
/// # Errors
///
/// Returns [`ExtractError`] when an envelope is malformed or lacks a payload.
pub fn html_payload(body: &str) -> Result<Cow<'_, str>, ExtractError> {
    if looks_like_envelope(body) {
        unwrap_envelope(body).map(Cow::Owned)
    } else {
        Ok(Cow::Borrowed(body))
    }
}

/// Extracts the `<response><html>` payload from an XML envelope.
///
/// # Errors
///
/// Returns [`ExtractError::Envelope`] on malformed XML,
/// [`ExtractError::MissingPayload`] when no payload element exists and
/// [`ExtractError::Escape`] when escaped text contains a bad entity.
pub fn unwrap_envelope(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().check_end_names = false;

    let mut stack: Vec<String> = Vec::new();
    let mut payload_depth: Option<usize> = None;
    let mut found = false;
    let mut payload = PayloadBuffer::default();

    loop {
        let event = reader.read_event().map_err(|e| ExtractError::Envelope {
            position: reader.error_position().try_into().unwrap_or(u64::MAX),
            reason: e.to_string(),
        })?;

        match event {
            Event::Start(start) => {
                let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
                if payload_depth.is_some() {
                    payload.push_raw(&format!("<{}>", String::from_utf8_lossy(&start)));
                } else if name == PAYLOAD_ELEMENT
                    && stack.last().is_some_and(|parent| parent == PAYLOAD_PARENT)
                {
                    payload_depth = Some(stack.len() + 1);
                    found = true;
                }
                stack.push(name);
            }
            Event::End(end) => {
                if let Some(depth) = payload_depth {
                    if stack.len() == depth {
                        payload_depth = None;
                    } else {
                        let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                        payload.push_raw(&format!("</{name}>"));
                    }
                }
                stack.pop();
            }
            Event::Empty(empty) => {
                if payload_depth.is_some() {
                    payload.push_raw(&format!("<{}/>", String::from_utf8_lossy(&empty)));
                } else if empty.local_name().as_ref() == PAYLOAD_ELEMENT.as_bytes()
                    && stack.last().is_some_and(|parent| parent == PAYLOAD_PARENT)
                {
                    found = true;
                }
            }
            Event::Text(text) if payload_depth.is_some() => {
                payload.push_escaped(&String::from_utf8_lossy(&text));
            }
            Event::GeneralRef(reference) if payload_depth.is_some() => {
                payload.push_escaped(&format!("&{};", String::from_utf8_lossy(&reference)));
            }
            Event::CData(cdata) if payload_depth.is_some() => {
                payload.push_raw(&String::from_utf8_lossy(&cdata));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !found {
        return Err(ExtractError::MissingPayload {
            parent: PAYLOAD_PARENT,
            element: PAYLOAD_ELEMENT,
        });
    }

    let html = payload.finish()?;
    trace!(bytes = html.len(), "unwrapped XML envelope");
    Ok(html.trim().to_string())
}

/// Accumulates payload pieces; escaped text is unescaped in runs so that
/// entity references split across events still decode.
#[derive(Default)]
struct PayloadBuffer {
    out: String,
    escaped: String,
    error: Option<String>,
}

impl PayloadBuffer {
    fn push_escaped(&mut self, text: &str) {
        self.escaped.push_str(text);
    }

    fn push_raw(&mut self, text: &str) {
        self.flush();
        self.out.push_str(text);
    }

    fn flush(&mut self) {
        if self.escaped.is_empty() {
            return;
        }
        match quick_xml::escape::unescape(&self.escaped) {
            Ok(text) => self.out.push_str(&text),
            Err(e) => {
                if self.error.is_none() {
                    self.error = Some(e.to_string());
                }
            }
        }
        self.escaped.clear();
    }

    fn finish(mut self) -> Result<String, ExtractError> {
        self.flush();
        match self.error {
            Some(reason) => Err(ExtractError::Escape { reason }),
            None => Ok(self.out),
        }
    }
}
