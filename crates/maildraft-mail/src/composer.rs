//! Reply composition with `lettre`.

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::{Address, Message};
use mailparse::MailAddr;

use maildraft_core::UnreadMessage;

use crate::error::ComposeError;

/// Prefix added to reply subjects.
const REPLY_PREFIX: &str = "Re: ";

/// A composed reply, ready to be appended as a draft or sent.
#[derive(Clone, Debug)]
pub struct Draft {
    /// Recipient as written in `To`.
    pub recipient: String,
    pub subject: String,
    pub body: String,
    message: Message,
}

impl Draft {
    /// The RFC 5322 byte stream (headers and encoded body).
    pub fn encoded(&self) -> Vec<u8> {
        self.message.formatted()
    }

    /// The underlying `lettre` message, for SMTP transports.
    pub fn message(&self) -> &Message {
        &self.message
    }
}

/// Builds replies from a fixed sender identity.
#[derive(Clone, Debug)]
pub struct DraftComposer {
    from: Mailbox,
}

impl DraftComposer {
    /// `from` is the identity replies are written as, e.g.
    /// `"Assistant <me@example.com>"` or a bare address.
    pub fn new(from: &str) -> Result<Self, ComposeError> {
        Ok(Self {
            from: parse_mailbox("From", from)?,
        })
    }

    /// Compose a `text/plain` UTF-8 reply to `to`.
    ///
    /// `in_reply_to` is the original `Message-ID`; when given it is copied
    /// into `In-Reply-To` and `References`.
    pub fn compose(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        in_reply_to: Option<&str>,
    ) -> Result<Draft, ComposeError> {
        let recipient = parse_mailbox("To", to)?;
        self.compose_to(recipient, subject, body, in_reply_to)
    }

    /// Compose a reply to a decoded message.
    ///
    /// The recipient is built from the parsed sender name and address, so a
    /// decoded display name such as `Petrov, Ivan` is never re-parsed as an
    /// address list.
    pub fn reply_to(&self, message: &UnreadMessage, body: &str) -> Result<Draft, ComposeError> {
        let recipient = sender_mailbox(message)?;
        self.compose_to(
            recipient,
            &message.subject,
            body,
            message.message_id.as_deref(),
        )
    }

    fn compose_to(
        &self,
        recipient: Mailbox,
        subject: &str,
        body: &str,
        in_reply_to: Option<&str>,
    ) -> Result<Draft, ComposeError> {
        let subject = build_reply_subject(subject);

        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(recipient.clone())
            .subject(subject.clone());

        if let Some(id) = in_reply_to.map(format_message_id).filter(|id| !id.is_empty()) {
            builder = builder.in_reply_to(id.clone()).references(id);
        }

        let message = builder
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        Ok(Draft {
            recipient: recipient.to_string(),
            subject,
            body: body.to_string(),
            message,
        })
    }
}

/// Build the subject for a reply.
pub fn build_reply_subject(original_subject: &str) -> String {
    let original_subject = original_subject.trim();
    if original_subject.is_empty() {
        return format!("{}(no subject)", REPLY_PREFIX);
    }
    if original_subject.to_lowercase().starts_with("re:") {
        return original_subject.to_string();
    }
    format!("{}{}", REPLY_PREFIX, original_subject)
}

/// Recipient mailbox for a reply to `message`.
///
/// Falls back to parsing the full `From` value only when no usable address
/// was extracted.
fn sender_mailbox(message: &UnreadMessage) -> Result<Mailbox, ComposeError> {
    match message.sender_address.trim().parse::<Address>() {
        Ok(address) => {
            let name = Some(message.sender_name.trim())
                .filter(|name| !name.is_empty())
                .map(String::from);
            Ok(Mailbox::new(name, address))
        }
        Err(_) => parse_mailbox("To", &message.sender),
    }
}

/// Parse a mailbox, keeping the display name.
///
/// `lettre`'s own parser first; decoded headers with unquoted non-ASCII
/// names fall back to `mailparse::addrparse`.
fn parse_mailbox(field: &'static str, value: &str) -> Result<Mailbox, ComposeError> {
    let value = value.trim();
    if let Ok(mailbox) = value.parse::<Mailbox>() {
        return Ok(mailbox);
    }

    let invalid = |message: String| ComposeError::Address {
        field,
        value: value.to_string(),
        message,
    };

    let list = mailparse::addrparse(value).map_err(|e| invalid(e.to_string()))?;
    let (addr, display_name) = list
        .into_inner()
        .into_iter()
        .find_map(|addr| match addr {
            MailAddr::Single(single) => Some((single.addr, single.display_name)),
            MailAddr::Group(group) => group
                .addrs
                .into_iter()
                .next()
                .map(|single| (single.addr, single.display_name)),
        })
        .ok_or_else(|| invalid("no address found".to_string()))?;

    let address: Address = addr.parse().map_err(|e| invalid(format!("{e}")))?;
    Ok(Mailbox::new(display_name, address))
}

/// `abc@host` → `<abc@host>`; already bracketed ids are kept.
fn format_message_id(id: &str) -> String {
    let id = id.trim();
    if id.is_empty() || (id.starts_with('<') && id.ends_with('>')) {
        id.to_string()
    } else {
        format!("<{}>", id.trim_matches(|c| c == '<' || c == '>'))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode;
    use mailparse::MailHeaderMap;

    fn composer() -> DraftComposer {
        DraftComposer::new("me@example.com").unwrap()
    }

    #[test]
    fn test_reply_subject_normal() {
        assert_eq!(build_reply_subject("Meeting"), "Re: Meeting");
    }

    #[test]
    fn test_reply_subject_already_re() {
        assert_eq!(build_reply_subject("Re: Meeting"), "Re: Meeting");
        assert_eq!(build_reply_subject("RE: Meeting"), "RE: Meeting");
        assert_eq!(build_reply_subject("re:Meeting"), "re:Meeting");
    }

    #[test]
    fn test_reply_subject_empty() {
        assert_eq!(build_reply_subject(""), "Re: (no subject)");
        assert_eq!(build_reply_subject("   "), "Re: (no subject)");
    }

    #[test]
    fn test_reply_subject_not_a_prefix() {
        assert_eq!(build_reply_subject("Rebate"), "Re: Rebate");
    }

    #[test]
    fn test_format_message_id() {
        assert_eq!(format_message_id("<a@b>"), "<a@b>");
        assert_eq!(format_message_id("a@b"), "<a@b>");
        assert_eq!(format_message_id("  "), "");
    }

    #[test]
    fn test_invalid_from() {
        let err = DraftComposer::new("not an address").unwrap_err();
        assert!(matches!(err, ComposeError::Address { field: "From", .. }));
    }

    #[test]
    fn test_invalid_recipient() {
        let err = composer().compose("", "s", "b", None).unwrap_err();
        assert!(matches!(err, ComposeError::Address { field: "To", .. }));
    }

    #[test]
    fn test_compose_headers() {
        let draft = composer()
            .compose(
                "Ann Smith <ann@example.com>",
                "Meeting",
                "Friday works.",
                Some("<abc123@example.com>"),
            )
            .unwrap();

        assert_eq!(draft.subject, "Re: Meeting");
        assert!(draft.recipient.contains("ann@example.com"));

        let encoded = draft.encoded();
        let parsed = mailparse::parse_mail(&encoded).unwrap();
        let headers = parsed.headers.as_slice();
        assert_eq!(headers.get_first_value("From").as_deref(), Some("me@example.com"));
        assert!(headers.get_first_value("To").unwrap().contains("<ann@example.com>"));
        assert_eq!(headers.get_first_value("In-Reply-To").as_deref(), Some("<abc123@example.com>"));
        assert_eq!(headers.get_first_value("References").as_deref(), Some("<abc123@example.com>"));
        assert_eq!(parsed.ctype.mimetype, "text/plain");
        assert_eq!(parsed.ctype.charset.to_lowercase(), "utf-8");
    }

    #[test]
    fn test_compose_without_message_id() {
        let draft = composer().compose("ann@example.com", "Hi", "Hello", None).unwrap();
        let encoded = draft.encoded();
        let parsed = mailparse::parse_mail(&encoded).unwrap();
        assert!(parsed.headers.get_first_value("In-Reply-To").is_none());
    }

    fn unread(sender: &str, name: &str, address: &str) -> UnreadMessage {
        UnreadMessage {
            id: "1".into(),
            sender: sender.into(),
            sender_name: name.into(),
            sender_address: address.into(),
            subject: "Hello".into(),
            body: "Hi".into(),
            message_id: Some("<orig@example.ru>".into()),
        }
    }

    #[test]
    fn test_reply_to_name_with_comma() {
        let raw = "From: =?UTF-8?Q?Petrov=2C_Ivan?= <ivan@example.ru>\r\n\
                   Subject: Hello\r\n\
                   Message-ID: <orig@example.ru>\r\n\
                   \r\n\
                   Hi\r\n";
        let message = decode("1", raw.as_bytes()).unwrap();

        let draft = composer().reply_to(&message, "Thanks!").unwrap();
        assert_eq!(draft.subject, "Re: Hello");

        let encoded = draft.encoded();
        let parsed = mailparse::parse_mail(&encoded).unwrap();
        let to = parsed.headers.get_first_header("To").unwrap();
        let list = mailparse::addrparse_header(to).unwrap();
        match &list[0] {
            MailAddr::Single(single) => {
                assert_eq!(single.addr, "ivan@example.ru");
                assert_eq!(single.display_name.as_deref(), Some("Petrov, Ivan"));
            }
            other => panic!("expected a single mailbox, got {other:?}"),
        }
        assert_eq!(
            parsed.headers.get_first_value("In-Reply-To").as_deref(),
            Some("<orig@example.ru>")
        );
    }

    #[test]
    fn test_reply_to_without_name() {
        let draft = composer()
            .reply_to(&unread("ann@example.com", "", "ann@example.com"), "ok")
            .unwrap();
        assert_eq!(draft.recipient, "ann@example.com");
    }

    #[test]
    fn test_reply_to_falls_back_to_from_value() {
        let draft = composer()
            .reply_to(&unread("Ann <ann@example.com>", "", ""), "ok")
            .unwrap();
        assert!(draft.recipient.contains("ann@example.com"));
    }

    #[test]
    fn test_reply_to_without_any_address_fails() {
        let err = composer().reply_to(&unread("", "", ""), "ok").unwrap_err();
        assert!(matches!(err, ComposeError::Address { field: "To", .. }));
    }

    #[test]
    fn test_non_ascii_round_trip() {
        let draft = composer()
            .compose(
                "Иван Петров <ivan@example.ru>",
                "Привет",
                "Добрый день! Спасибо за письмо, отвечу до пятницы.",
                None,
            )
            .unwrap();

        let decoded = decode("rt", &draft.encoded()).unwrap();
        assert_eq!(decoded.subject, "Re: Привет");
        assert_eq!(decoded.sender, "me@example.com");
        assert_eq!(
            decoded.body.trim_end(),
            "Добрый день! Спасибо за письмо, отвечу до пятницы."
        );

        let encoded = draft.encoded();
        let parsed = mailparse::parse_mail(&encoded).unwrap();
        let to = parsed.headers.get_first_value("To").unwrap();
        assert!(to.contains("Иван Петров"));
        assert!(to.contains("ivan@example.ru"));
    }
}
