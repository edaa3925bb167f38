//! Message parsing: raw RFC 5322 bytes to a structured record.
//!
//! Pure transformation, no side effects. Missing optional headers never
//! fail the parse; only input that cannot be read as a message at all
//! produces an error.

use mailparse::{dateparse, parse_mail, MailHeaderMap, ParsedMail};

use crate::types::error::{Result, ShelfError};

/// Structured fields extracted from one raw message file.
#[derive(Debug, Clone, Default)]
pub struct ParsedMessage {
    /// Declared Message-ID with angle brackets stripped, if present.
    pub message_id: Option<String>,
    pub from_address: Option<String>,
    pub to_address: Option<String>,
    pub subject: Option<String>,
    /// RFC 3339 rendering of the Date header when it parses, otherwise
    /// the raw header text.
    pub date: Option<String>,
    /// Epoch seconds of the Date header; absent (not zero) when the
    /// header is missing or unparseable.
    pub timestamp: Option<i64>,
    pub body_text: Option<String>,
    pub body_html: Option<String>,
}

/// Parse raw message bytes into a [`ParsedMessage`].
pub fn parse_message(raw: &[u8]) -> Result<ParsedMessage> {
    let mail = parse_mail(raw).map_err(|e| ShelfError::Parse(e.to_string()))?;

    let message_id = mail
        .headers
        .get_first_value("Message-ID")
        .map(|v| strip_angle_brackets(&v))
        .filter(|v| !v.is_empty());

    let from_address = header_display(&mail, "From");
    let to_address = header_display(&mail, "To");
    let subject = mail
        .headers
        .get_first_value("Subject")
        .filter(|v| !v.trim().is_empty());

    let raw_date = mail.headers.get_first_value("Date");
    let timestamp = raw_date.as_deref().and_then(|d| dateparse(d).ok());
    // Normalize to RFC 3339 when the header parses; keep the declared
    // text otherwise so nothing is silently dropped.
    let date = match timestamp {
        Some(ts) => chrono::DateTime::from_timestamp(ts, 0)
            .map(|dt| dt.to_rfc3339())
            .or(raw_date),
        None => raw_date,
    };

    let mut body_text = None;
    let mut body_html = None;
    extract_bodies(&mail, &mut body_text, &mut body_html);

    Ok(ParsedMessage {
        message_id,
        from_address,
        to_address,
        subject,
        date,
        timestamp,
        body_text,
        body_html,
    })
}

/// Render an address header to a display string. Repeated headers are
/// joined, RFC 2047 encoded-words are already decoded by mailparse.
fn header_display(mail: &ParsedMail, name: &str) -> Option<String> {
    let values = mail.headers.get_all_values(name);
    if values.is_empty() {
        return None;
    }
    let joined = values.join(", ");
    if joined.trim().is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn strip_angle_brackets(value: &str) -> String {
    value
        .trim()
        .trim_matches(|c| c == '<' || c == '>')
        .to_string()
}

/// Depth-first walk of the MIME tree collecting the first text/plain
/// and first text/html leaf bodies. Undecodable parts are skipped.
fn extract_bodies(part: &ParsedMail, text: &mut Option<String>, html: &mut Option<String>) {
    if part.subparts.is_empty() {
        match part.ctype.mimetype.as_str() {
            "text/plain" if text.is_none() => *text = part.get_body().ok(),
            "text/html" if html.is_none() => *html = part.get_body().ok(),
            _ => {}
        }
        return;
    }
    for sub in &part.subparts {
        if text.is_some() && html.is_some() {
            return;
        }
        extract_bodies(sub, text, html);
    }
}
