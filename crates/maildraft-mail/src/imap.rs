//! Minimal async IMAP client (raw TCP + TLS).
//!
//! Supports only the commands the pipeline needs: LOGIN, EXAMINE,
//! UID SEARCH, UID FETCH with `BODY.PEEK[]`, APPEND and LOGOUT. Nothing here
//! ever changes a flag on an existing message; there is no STORE.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::MailError;

/// Read size for message literals.
const LITERAL_CHUNK: usize = 16 * 1024;

/// Async read+write stream marker.
trait ImapStream: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send {}
impl<T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + Send> ImapStream for T {}

/// One IMAP session over plain TCP or IMAPS.
pub struct ImapClient {
    reader: BufReader<tokio::io::ReadHalf<Box<dyn ImapStream>>>,
    writer: tokio::io::WriteHalf<Box<dyn ImapStream>>,
    tag_counter: u32,
    /// Applied to the connect, the handshake and every read.
    timeout: Duration,
}

impl ImapClient {
    /// Connect to an IMAP server (plain or IMAPS/TLS) and read the greeting.
    pub async fn connect(
        host: &str,
        port: u16,
        use_ssl: bool,
        timeout: Duration,
    ) -> Result<Self, MailError> {
        let tcp = timed(timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|e| match e {
                MailError::Io(source) => MailError::Connect {
                    host: host.to_string(),
                    port,
                    source,
                },
                other => other,
            })?;

        let stream: Box<dyn ImapStream> = if use_ssl {
            let mut root_store = rustls::RootCertStore::empty();
            root_store.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

            let tls_error = |message: String| MailError::Tls {
                host: host.to_string(),
                message,
            };
            // Explicit provider: several rustls backends may be compiled in
            let provider = Arc::new(rustls::crypto::ring::default_provider());
            let config = rustls::ClientConfig::builder_with_provider(provider)
                .with_safe_default_protocol_versions()
                .map_err(|e| tls_error(e.to_string()))?
                .with_root_certificates(root_store)
                .with_no_client_auth();

            let connector = tokio_rustls::TlsConnector::from(Arc::new(config));
            let server_name = rustls::pki_types::ServerName::try_from(host.to_string())
                .map_err(|e| tls_error(format!("invalid server name: {e}")))?;
            let tls = timed(timeout, connector.connect(server_name, tcp))
                .await
                .map_err(|e| match e {
                    MailError::Io(source) => tls_error(source.to_string()),
                    other => other,
                })?;
            Box::new(tls)
        } else {
            Box::new(tcp)
        };

        let (read, write) = tokio::io::split(stream);
        let mut client = Self {
            reader: BufReader::new(read),
            writer: write,
            tag_counter: 0,
            timeout,
        };

        // Server greeting, e.g. "* OK IMAP server ready"
        let greeting = client.read_line().await?;
        if !greeting.to_ascii_uppercase().starts_with("* OK") {
            return Err(MailError::Greeting(greeting));
        }
        debug!(greeting = %greeting, "IMAP connected");

        Ok(client)
    }

    /// Read a single CRLF-terminated line (lossy UTF-8).
    async fn read_line(&mut self) -> Result<String, MailError> {
        let mut buf = Vec::new();
        let n = timed(self.timeout, self.reader.read_until(b'\n', &mut buf)).await?;
        if n == 0 {
            return Err(MailError::Closed);
        }
        let line = String::from_utf8_lossy(&buf);
        Ok(line
            .trim_end_matches("\r\n")
            .trim_end_matches('\n')
            .to_string())
    }

    /// Read exactly `n` bytes (the payload of a `{n}` literal).
    ///
    /// The timeout applies to each chunk, not to the whole literal: a large
    /// message arriving slowly but steadily is not cut off.
    async fn read_literal(&mut self, n: usize) -> Result<Vec<u8>, MailError> {
        let mut buf = Vec::with_capacity(n);
        let mut chunk = vec![0u8; LITERAL_CHUNK.min(n.max(1))];
        while buf.len() < n {
            let want = chunk.len().min(n - buf.len());
            let read = timed(self.timeout, self.reader.read(&mut chunk[..want])).await?;
            if read == 0 {
                return Err(MailError::Closed);
            }
            buf.extend_from_slice(&chunk[..read]);
        }
        Ok(buf)
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<(), MailError> {
        self.writer.write_all(data).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Send a tagged IMAP command. Returns the tag.
    async fn send_command(&mut self, cmd: &str) -> Result<String, MailError> {
        self.tag_counter += 1;
        let tag = format!("A{:04}", self.tag_counter);
        let line = format!("{} {}\r\n", tag, cmd);
        self.write_all(line.as_bytes()).await?;
        debug!(
            tag = %tag,
            command = cmd.split_whitespace().next().unwrap_or(""),
            "IMAP command sent"
        );
        Ok(tag)
    }

    /// Read responses until the tagged completion line.
    /// Returns (untagged_lines, tagged_status_line).
    async fn read_response(&mut self, tag: &str) -> Result<(Vec<String>, String), MailError> {
        let mut untagged = Vec::new();
        loop {
            let line = self.read_line().await?;
            if is_tagged(&line, tag) {
                return Ok((untagged, line));
            }
            untagged.push(line);
        }
    }

    /// Run a command without literals and require a tagged OK.
    async fn simple_command(
        &mut self,
        name: &str,
        cmd: &str,
    ) -> Result<Vec<String>, MailError> {
        let tag = self.send_command(cmd).await?;
        let (lines, status) = self.read_response(&tag).await?;
        if !status_is_ok(&status) {
            return Err(MailError::Command {
                command: name.to_string(),
                status,
            });
        }
        Ok(lines)
    }

    /// LOGIN
    pub async fn login(&mut self, user: &str, pass: &str) -> Result<(), MailError> {
        let cmd = format!("LOGIN {} {}", quote(user), quote(pass));
        match self.simple_command("LOGIN", &cmd).await {
            Err(MailError::Command { status, .. }) => Err(MailError::Auth(status)),
            other => other.map(|_| ()),
        }
    }

    /// EXAMINE mailbox (read-only open). Returns its UIDVALIDITY, if announced.
    pub async fn examine(&mut self, mailbox: &str) -> Result<Option<u32>, MailError> {
        let cmd = format!("EXAMINE {}", quote(mailbox));
        let lines = self.simple_command("EXAMINE", &cmd).await?;
        Ok(lines.iter().find_map(|line| parse_uidvalidity(line)))
    }

    /// UID SEARCH UNSEEN — returns UIDs in ascending order.
    pub async fn uid_search_unseen(&mut self) -> Result<Vec<u32>, MailError> {
        let lines = self.simple_command("UID SEARCH", "UID SEARCH UNSEEN").await?;

        let mut uids = Vec::new();
        for line in &lines {
            if line.to_ascii_uppercase().starts_with("* SEARCH") {
                uids.extend(
                    line.split_whitespace()
                        .skip(2) // skip "* SEARCH"
                        .filter_map(|s| s.parse::<u32>().ok()),
                );
            }
        }
        uids.sort_unstable();
        uids.dedup();
        Ok(uids)
    }

    /// UID FETCH a single message with `BODY.PEEK[]` so its `\Seen` flag is
    /// left alone. Returns `None` if the server sent no body (e.g. the
    /// message was expunged in the meantime).
    pub async fn uid_fetch_peek(&mut self, uid: u32) -> Result<Option<Vec<u8>>, MailError> {
        let cmd = format!("UID FETCH {} (UID BODY.PEEK[])", uid);
        let tag = self.send_command(&cmd).await?;

        let mut body = None;
        loop {
            let line = self.read_line().await?;

            // Tagged response = done
            if is_tagged(&line, &tag) {
                if !status_is_ok(&line) {
                    return Err(MailError::Command {
                        command: "UID FETCH".to_string(),
                        status: line,
                    });
                }
                break;
            }

            // Untagged FETCH response: * N FETCH (UID nnn BODY[] {size}
            if line.starts_with("* ") && line.to_ascii_uppercase().contains(" FETCH ") {
                if let Some(size) = literal_size(&line) {
                    let data = self.read_literal(size).await?;
                    // Remainder of the FETCH item list, e.g. ")" or " UID 101)"
                    let _closing = self.read_line().await?;
                    if body.is_none() {
                        body = Some(data);
                    }
                }
            }
        }

        Ok(body)
    }

    /// APPEND `data` to `mailbox` with the `\Draft` flag.
    ///
    /// Uses a synchronizing literal: the bytes are only sent after the
    /// server's `+` continuation, so a refusal (e.g. `NO [TRYCREATE]`) is
    /// reported without uploading anything.
    pub async fn append_draft(
        &mut self,
        mailbox: &str,
        internal_date: &DateTime<FixedOffset>,
        data: &[u8],
    ) -> Result<(), MailError> {
        let cmd = format!(
            "APPEND {} (\\Draft) \"{}\" {{{}}}",
            quote(mailbox),
            format_internal_date(internal_date),
            data.len()
        );
        let tag = self.send_command(&cmd).await?;

        loop {
            let line = self.read_line().await?;
            if line.starts_with('+') {
                break;
            }
            if is_tagged(&line, &tag) {
                return Err(MailError::Command {
                    command: "APPEND".to_string(),
                    status: line,
                });
            }
        }

        self.write_all(data).await?;
        self.write_all(b"\r\n").await?;

        let (_, status) = self.read_response(&tag).await?;
        if !status_is_ok(&status) {
            return Err(MailError::Command {
                command: "APPEND".to_string(),
                status,
            });
        }
        Ok(())
    }

    /// LOGOUT
    pub async fn logout(&mut self) -> Result<(), MailError> {
        let tag = self.send_command("LOGOUT").await?;
        // Server may send * BYE before the tagged OK
        let _ = self.read_response(&tag).await;
        Ok(())
    }
}

// ─────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────

async fn timed<T>(
    limit: Duration,
    fut: impl std::future::Future<Output = std::io::Result<T>>,
) -> Result<T, MailError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(MailError::from),
        Err(_) => Err(MailError::Timeout(limit.as_secs())),
    }
}

/// IMAP quoted string.
fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}

fn is_tagged(line: &str, tag: &str) -> bool {
    line.strip_prefix(tag).is_some_and(|rest| rest.starts_with(' '))
}

/// `A0003 OK ...` → true, `A0003 NO ...` / `A0003 BAD ...` → false.
fn status_is_ok(status: &str) -> bool {
    status
        .split_whitespace()
        .nth(1)
        .is_some_and(|word| word.eq_ignore_ascii_case("OK"))
}

/// `* OK [UIDVALIDITY 3857529045] UIDs valid` → 3857529045.
fn parse_uidvalidity(line: &str) -> Option<u32> {
    const MARKER: &str = "[UIDVALIDITY ";
    let start = line.to_ascii_uppercase().find(MARKER)? + MARKER.len();
    let rest = &line[start..];
    let end = rest.find(']')?;
    rest[..end].trim().parse().ok()
}

/// Size of a trailing `{n}` literal announcement.
fn literal_size(line: &str) -> Option<usize> {
    let inner = line.trim_end().strip_suffix('}')?;
    let open = inner.rfind('{')?;
    inner[open + 1..].parse().ok()
}

/// RFC 3501 `date-time`, e.g. `18-Oct-2026 09:05:00 +0300`.
pub fn format_internal_date(at: &DateTime<FixedOffset>) -> String {
    at.format("%d-%b-%Y %H:%M:%S %z").to_string()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("Drafts"), "\"Drafts\"");
        assert_eq!(quote(r#"pa"ss\word"#), r#""pa\"ss\\word""#);
    }

    #[test]
    fn test_is_tagged() {
        assert!(is_tagged("A0001 OK done", "A0001"));
        assert!(!is_tagged("A00010 OK done", "A0001"));
        assert!(!is_tagged("* 1 EXISTS", "A0001"));
    }

    #[test]
    fn test_status_is_ok() {
        assert!(status_is_ok("A0001 OK LOGIN completed"));
        assert!(status_is_ok("A0001 ok"));
        assert!(!status_is_ok("A0001 NO [TRYCREATE] Mailbox does not exist, LOOK"));
        assert!(!status_is_ok("A0001 BAD syntax"));
        assert!(!status_is_ok("A0001"));
    }

    #[test]
    fn test_parse_uidvalidity() {
        assert_eq!(
            parse_uidvalidity("* OK [UIDVALIDITY 3857529045] UIDs valid"),
            Some(3857529045)
        );
        assert_eq!(parse_uidvalidity("* ok [uidvalidity 7]"), Some(7));
        assert_eq!(parse_uidvalidity("* OK [UIDNEXT 4392] Predicted next UID"), None);
    }

    #[test]
    fn test_literal_size() {
        assert_eq!(literal_size("* 1 FETCH (UID 101 BODY[] {342}"), Some(342));
        assert_eq!(literal_size("* 1 FETCH (UID 101 BODY[] {0}  "), Some(0));
        assert_eq!(literal_size("* 1 FETCH (FLAGS (\\Seen))"), None);
        assert_eq!(literal_size("{abc}"), None);
    }

    #[test]
    fn test_format_internal_date() {
        let tz = FixedOffset::east_opt(3 * 3600).unwrap();
        let at = tz.with_ymd_and_hms(2026, 10, 8, 9, 5, 0).unwrap();
        assert_eq!(format_internal_date(&at), "08-Oct-2026 09:05:00 +0300");
    }
}
