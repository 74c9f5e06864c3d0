use std::io::{self, Read, Write};
use std::mem;
use std::net::{SocketAddr, TcpStream};
use std::time::{Duration, Instant};

use native_tls::{HandshakeError, TlsConnector, TlsStream};
use tracing::trace;

use crate::smtp_verify::error::SmtpVerifyError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl SmtpReply {
    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_transient_failure(&self) -> bool {
        (400..500).contains(&self.code)
    }

    /// 550/551/553: the mailbox itself does not exist.
    pub fn is_no_mailbox(&self) -> bool {
        matches!(self.code, 550 | 551 | 553)
    }

    pub fn has_capability(&self, cap: &str) -> bool {
        self.lines.iter().any(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|token| token.eq_ignore_ascii_case(cap))
        })
    }

    pub fn text(&self) -> String {
        self.lines.join(" ")
    }
}

#[derive(Debug)]
enum StreamState {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
    Closed,
}

/// Longest reply line accepted before the server is considered hostile.
const MAX_LINE: usize = 4096;

/// Per-host time limits: each I/O waits at most `command_timeout`, the whole
/// conversation ends at `deadline`.
#[derive(Debug, Clone, Copy)]
pub struct Deadlines {
    pub connect_timeout: Duration,
    pub command_timeout: Duration,
    pub deadline: Instant,
}

impl Deadlines {
    fn remaining(&self) -> Result<Duration, SmtpVerifyError> {
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(SmtpVerifyError::DeadlineExceeded);
        }
        Ok(remaining)
    }

    fn io_timeout(&self) -> Result<Duration, SmtpVerifyError> {
        Ok(self.remaining()?.min(self.command_timeout))
    }
}

#[derive(Debug)]
struct SmtpStream {
    state: StreamState,
    buffer: Vec<u8>,
    limits: Deadlines,
}

impl SmtpStream {
    fn connect(addr: &SocketAddr, limits: Deadlines) -> Result<Self, SmtpVerifyError> {
        let timeout = limits.remaining()?.min(limits.connect_timeout);
        let stream = TcpStream::connect_timeout(addr, timeout).map_err(|err| {
            SmtpVerifyError::Connect {
                host: addr.to_string(),
                source: err,
            }
        })?;
        Ok(Self {
            state: StreamState::Plain(stream),
            buffer: Vec::new(),
            limits,
        })
    }

    /// Socket timeouts for the next I/O, capped by what is left of the
    /// per-host deadline.
    fn arm(&self) -> Result<(), SmtpVerifyError> {
        let timeout = self.limits.io_timeout()?;
        match &self.state {
            StreamState::Plain(stream) => set_deadlines(stream, timeout),
            StreamState::Tls(stream) => set_deadlines(stream.get_ref(), timeout),
            StreamState::Closed => Err(SmtpVerifyError::Protocol("stream already closed".into())),
        }
    }

    /// Maps a socket timeout that hit the per-host deadline to
    /// [`SmtpVerifyError::DeadlineExceeded`].
    fn io_error(&self, err: io::Error) -> SmtpVerifyError {
        let timed_out = matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut);
        if timed_out && Instant::now() >= self.limits.deadline {
            SmtpVerifyError::DeadlineExceeded
        } else {
            SmtpVerifyError::io(err)
        }
    }

    fn upgrade_tls(&mut self, domain: &str, connector: &TlsConnector) -> Result<(), SmtpVerifyError> {
        self.arm()?;
        let plain = match mem::replace(&mut self.state, StreamState::Closed) {
            StreamState::Plain(stream) => stream,
            StreamState::Tls(stream) => {
                self.state = StreamState::Tls(stream);
                return Ok(());
            }
            StreamState::Closed => {
                return Err(SmtpVerifyError::Protocol("stream already closed".into()));
            }
        };

        let tls = complete_handshake(connector, domain, plain, &self.limits)?;
        // RFC 3207: tout ce qui a été bufferisé avant la poignée de main est caduc
        self.buffer.clear();
        self.state = StreamState::Tls(Box::new(tls));
        Ok(())
    }

    fn write_line(&mut self, command: &str) -> Result<(), SmtpVerifyError> {
        let mut data = Vec::with_capacity(command.len() + 2);
        data.extend_from_slice(command.as_bytes());
        data.extend_from_slice(b"\r\n");
        self.arm()?;
        let written = match &mut self.state {
            StreamState::Plain(stream) => stream.write_all(&data).and_then(|()| stream.flush()),
            StreamState::Tls(stream) => stream.write_all(&data).and_then(|()| stream.flush()),
            StreamState::Closed => {
                return Err(SmtpVerifyError::Protocol("stream already closed".into()));
            }
        };
        written.map_err(|err| self.io_error(err))
    }

    fn read_reply(&mut self) -> Result<SmtpReply, SmtpVerifyError> {
        let mut lines = Vec::new();
        let mut code: Option<u16> = None;
        loop {
            let line = self.read_line()?;
            let parsed_code = line
                .get(..3)
                .and_then(|digits| digits.parse::<u16>().ok())
                .ok_or_else(|| SmtpVerifyError::Protocol(format!("invalid reply: {line}")))?;
            match code {
                Some(existing) if existing != parsed_code => {
                    return Err(SmtpVerifyError::Protocol(format!(
                        "inconsistent reply codes: {existing} vs {parsed_code}"
                    )));
                }
                Some(_) => {}
                None => code = Some(parsed_code),
            }
            let is_last = line.as_bytes().get(3) != Some(&b'-');
            lines.push(line.get(4..).unwrap_or_default().to_string());
            if is_last {
                return Ok(SmtpReply {
                    code: parsed_code,
                    lines,
                });
            }
        }
    }

    fn read_line(&mut self) -> Result<String, SmtpVerifyError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|byte| *byte == b'\n') {
                let mut line = self.buffer.drain(..=pos).collect::<Vec<_>>();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }
            if self.buffer.len() > MAX_LINE {
                return Err(SmtpVerifyError::Protocol(format!(
                    "reply line longer than {MAX_LINE} bytes"
                )));
            }

            self.arm()?;
            let mut buf = [0u8; 512];
            let read = match &mut self.state {
                StreamState::Plain(stream) => stream.read(&mut buf),
                StreamState::Tls(stream) => stream.read(&mut buf),
                StreamState::Closed => {
                    return Err(SmtpVerifyError::Protocol("stream already closed".into()));
                }
            };
            let read = read.map_err(|err| self.io_error(err))?;
            if read == 0 {
                return Err(SmtpVerifyError::io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }
            self.buffer.extend_from_slice(&buf[..read]);
        }
    }
}

fn set_deadlines(stream: &TcpStream, timeout: Duration) -> Result<(), SmtpVerifyError> {
    stream
        .set_read_timeout(Some(timeout))
        .map_err(SmtpVerifyError::io)?;
    stream
        .set_write_timeout(Some(timeout))
        .map_err(SmtpVerifyError::io)
}

fn complete_handshake(
    connector: &TlsConnector,
    domain: &str,
    stream: TcpStream,
    limits: &Deadlines,
) -> Result<TlsStream<TcpStream>, SmtpVerifyError> {
    match connector.connect(domain, stream) {
        Ok(tls) => Ok(tls),
        Err(HandshakeError::Failure(err)) => Err(SmtpVerifyError::Tls { source: err }),
        Err(HandshakeError::WouldBlock(mut mid)) => loop {
            set_deadlines(mid.get_ref(), limits.io_timeout()?)?;
            match mid.handshake() {
                Ok(tls) => break Ok(tls),
                Err(HandshakeError::Failure(err)) => {
                    break Err(SmtpVerifyError::Tls { source: err });
                }
                Err(HandshakeError::WouldBlock(next)) => mid = next,
            }
        },
    }
}

/// One SMTP conversation with one host, with its transcript.
pub struct SmtpSession {
    host: String,
    stream: SmtpStream,
    transcript: Vec<String>,
    in_transaction: bool,
    broken: bool,
}

impl SmtpSession {
    /// Tries each address of `host` in turn, all within `limits.deadline`.
    pub fn connect(
        host: &str,
        addresses: &[SocketAddr],
        limits: Deadlines,
    ) -> Result<Self, SmtpVerifyError> {
        let mut last_err = None;
        for addr in addresses {
            match SmtpStream::connect(addr, limits) {
                Ok(stream) => {
                    return Ok(Self {
                        host: host.to_string(),
                        stream,
                        transcript: Vec::new(),
                        in_transaction: false,
                        broken: false,
                    });
                }
                Err(err @ SmtpVerifyError::DeadlineExceeded) => return Err(err),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| SmtpVerifyError::NoAddress {
            host: host.to_string(),
        }))
    }

    pub fn read_banner(&mut self) -> Result<SmtpReply, SmtpVerifyError> {
        let reply = self.stream.read_reply();
        self.track(reply)
    }

    pub fn send_command(&mut self, command: &str) -> Result<SmtpReply, SmtpVerifyError> {
        self.record("C", command);
        if command.starts_with("MAIL FROM") {
            self.in_transaction = true;
        }
        let reply = self
            .stream
            .write_line(command)
            .and_then(|()| self.stream.read_reply());
        self.track(reply)
    }

    /// `STARTTLS`, upgrading the stream on a 2xx reply. Later commands go
    /// through TLS transparently.
    pub fn starttls(&mut self, connector: &TlsConnector) -> Result<SmtpReply, SmtpVerifyError> {
        let reply = self.send_command("STARTTLS")?;
        if !reply.is_positive_completion() {
            return Ok(reply);
        }
        let host = self.host.clone();
        if let Err(err) = self.stream.upgrade_tls(&host, connector) {
            self.broken = true;
            self.record("!", &err.to_string());
            return Err(err);
        }
        self.record("!", "TLS established");
        Ok(reply)
    }

    /// `RSET` (when a transaction was opened) then `QUIT`. Best effort: a
    /// broken stream is left alone.
    pub fn close(&mut self) {
        if self.broken {
            return;
        }
        if self.in_transaction && self.send_command("RSET").is_err() {
            return;
        }
        let _ = self.send_command("QUIT");
        self.broken = true;
    }

    pub fn take_transcript(&mut self) -> Vec<String> {
        mem::take(&mut self.transcript)
    }

    fn track(
        &mut self,
        reply: Result<SmtpReply, SmtpVerifyError>,
    ) -> Result<SmtpReply, SmtpVerifyError> {
        match reply {
            Ok(reply) => {
                self.record_reply(&reply);
                Ok(reply)
            }
            Err(err) => {
                if err.breaks_session() {
                    self.broken = true;
                }
                self.record("!", &err.to_string());
                Err(err)
            }
        }
    }

    fn record(&mut self, direction: &str, message: &str) {
        trace!(host = %self.host, "{direction}: {message}");
        self.transcript
            .push(format!("[{}] {direction}: {message}", self.host));
    }

    fn record_reply(&mut self, reply: &SmtpReply) {
        if reply.lines.is_empty() {
            self.record("S", &reply.code.to_string());
        } else {
            for line in &reply.lines {
                self.record("S", &format!("{} {}", reply.code, line));
            }
        }
    }
}
