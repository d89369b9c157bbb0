//! Raw RFC 5322 bytes → [`UnreadMessage`].
//!
//! Header values come back from `mailparse` with RFC 2047 encoded words
//! already decoded. The body is the first inline `text/plain` leaf of the
//! MIME tree; HTML-only and attachment-only messages decode to an empty body.

use mailparse::{DispositionType, MailAddr, MailHeader, MailHeaderMap, ParsedMail};
use tracing::debug;

use maildraft_core::UnreadMessage;

use crate::error::DecodeError;

/// Decode one fetched message.
pub fn decode(id: &str, raw: &[u8]) -> Result<UnreadMessage, DecodeError> {
    if raw.iter().all(u8::is_ascii_whitespace) {
        return Err(DecodeError::Empty { id: id.to_string() });
    }

    let parsed = mailparse::parse_mail(raw).map_err(|source| DecodeError::Parse {
        id: id.to_string(),
        source,
    })?;
    let headers = parsed.headers.as_slice();

    let from = headers.get_first_header("From");
    let sender = from
        .map(|h| h.get_value().trim().to_string())
        .unwrap_or_default();
    // Parse the raw header so encoded display names containing `,` or `"`
    // cannot be mistaken for address separators.
    let (sender_name, sender_address) = match from.and_then(parse_from_header) {
        Some(parsed) => parsed,
        None => (String::new(), extract_address(&sender)),
    };
    let subject = headers
        .get_first_value("Subject")
        .map(|v| v.trim().to_string())
        .unwrap_or_default();
    let message_id = headers
        .get_first_value("Message-ID")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let body = match find_plain_part(&parsed) {
        Some(part) => part_text(part),
        None => {
            debug!(id, mimetype = %parsed.ctype.mimetype, "no text/plain part, body is empty");
            String::new()
        }
    };

    Ok(UnreadMessage {
        id: id.to_string(),
        sender,
        sender_name,
        sender_address,
        subject,
        body,
        message_id,
    })
}

/// Bare address from a decoded `From` value.
///
/// `mailparse::addrparse` first; if that fails, the `<...>` segment; else the
/// trimmed value itself.
pub fn extract_address(from: &str) -> String {
    if let Ok(list) = mailparse::addrparse(from) {
        for addr in list.into_inner() {
            match addr {
                MailAddr::Single(single) => return single.addr,
                MailAddr::Group(group) => {
                    if let Some(single) = group.addrs.into_iter().next() {
                        return single.addr;
                    }
                }
            }
        }
    }

    if let (Some(start), Some(end)) = (from.rfind('<'), from.rfind('>')) {
        if end > start + 1 {
            return from[start + 1..end].trim().to_string();
        }
    }
    from.trim().to_string()
}

/// Display name and address of the first mailbox in a `From` header.
fn parse_from_header(header: &MailHeader<'_>) -> Option<(String, String)> {
    let list = mailparse::addrparse_header(header).ok()?;
    list.into_inner().into_iter().find_map(|addr| {
        let single = match addr {
            MailAddr::Single(single) => single,
            MailAddr::Group(group) => group.addrs.into_iter().next()?,
        };
        let name = single.display_name.unwrap_or_default().trim().to_string();
        Some((name, single.addr))
    })
}

/// Depth-first search for the first non-attachment `text/plain` leaf.
fn find_plain_part<'b, 'a>(part: &'b ParsedMail<'a>) -> Option<&'b ParsedMail<'a>> {
    if part.get_content_disposition().disposition == DispositionType::Attachment {
        return None;
    }
    if part.subparts.is_empty() {
        return part
            .ctype
            .mimetype
            .eq_ignore_ascii_case("text/plain")
            .then_some(part);
    }
    part.subparts.iter().find_map(|sub| find_plain_part(sub))
}

/// Transfer-decoded text of a leaf.
///
/// A declared charset is honoured; without one the bytes are taken as UTF-8.
/// Invalid sequences become U+FFFD either way.
fn part_text(part: &ParsedMail<'_>) -> String {
    let declared_charset = part.ctype.params.contains_key("charset");

    let text = if declared_charset {
        match part.get_body() {
            Ok(text) => text,
            Err(e) => {
                debug!(error = %e, "charset decoding failed, falling back to UTF-8");
                lossy_raw(part)
            }
        }
    } else {
        lossy_raw(part)
    };

    text.replace("\r\n", "\n")
}

fn lossy_raw(part: &ParsedMail<'_>) -> String {
    part.get_body_raw()
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
