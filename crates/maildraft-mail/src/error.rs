//! Error types for the mailbox side of the pipeline.

/// IMAP session failures.
///
/// Raised while reading unread mail these abort the run; raised while
/// appending a draft they only fail that one message.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("failed to connect to {host}:{port}: {source}")]
    Connect {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS handshake with {host} failed: {message}")]
    Tls { host: String, message: String },

    #[error("IMAP I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("IMAP server did not answer within {0} seconds")]
    Timeout(u64),

    #[error("IMAP connection closed unexpectedly")]
    Closed,

    #[error("unexpected IMAP greeting: {0}")]
    Greeting(String),

    #[error("IMAP LOGIN rejected: {0}")]
    Auth(String),

    #[error("IMAP {command} failed: {status}")]
    Command { command: String, status: String },

    #[error("malformed IMAP response to {command}: {line}")]
    Protocol { command: String, line: String },
}

/// A fetched message could not be parsed as RFC 5322 / MIME.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("message {id} is empty")]
    Empty { id: String },

    #[error("message {id} is not valid MIME: {source}")]
    Parse {
        id: String,
        #[source]
        source: mailparse::MailParseError,
    },
}

/// A draft could not be built.
#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("invalid {field} address '{value}': {message}")]
    Address {
        field: &'static str,
        value: String,
        message: String,
    },

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),
}

/// A composed draft could not be stored or sent.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("failed to append draft to '{folder}': {source}")]
    Append {
        folder: String,
        #[source]
        source: MailError,
    },

    #[error("SMTP relay misconfigured: {0}")]
    RelayConfig(String),

    #[error("SMTP send failed: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("reply has no envelope: {0}")]
    Envelope(String),
}
