use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Instant;

use native_tls::TlsConnector;
use tracing::{debug, info};

use crate::smtp_verify::error::SmtpVerifyError;
use crate::smtp_verify::options::SmtpProbeOptions;
use crate::smtp_verify::session::{Deadlines, SmtpReply, SmtpSession};
use crate::smtp_verify::types::{ProbeTarget, SmtpDetails, SmtpStatus};
use crate::smtp_verify::util::random_local_part;

/// Checks whether a mailbox exists without sending mail. Implementations
/// never fail: every problem degrades to [`SmtpStatus::Unknown`].
pub trait MailboxProber: Send + Sync {
    fn probe(&self, target: &ProbeTarget<'_>) -> SmtpDetails;
}

/// [`MailboxProber`] speaking SMTP over `TcpStream`, with opportunistic
/// STARTTLS.
pub struct SmtpProber {
    options: SmtpProbeOptions,
    connector: TlsConnector,
}

impl SmtpProber {
    pub fn new(options: SmtpProbeOptions) -> Result<Self, SmtpVerifyError> {
        // aucune donnée n'est transmise: un certificat invalide ne doit pas faire échouer le probe
        let connector = TlsConnector::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|source| SmtpVerifyError::TlsInit { source })?;
        Ok(Self { options, connector })
    }

    pub fn options(&self) -> &SmtpProbeOptions {
        &self.options
    }

    fn probe_host(
        &self,
        host: &str,
        target: &ProbeTarget<'_>,
    ) -> (Result<HostVerdict, SmtpVerifyError>, Vec<String>) {
        let limits = Deadlines {
            connect_timeout: self.options.connect_timeout,
            command_timeout: self.options.command_timeout,
            deadline: Instant::now() + self.options.host_timeout,
        };
        let addresses = match resolve_addrs(host, self.options.port, self.options.ipv6) {
            Ok(addresses) => addresses,
            Err(err) => return (Err(err), Vec::new()),
        };
        let mut session = match SmtpSession::connect(host, &addresses, limits) {
            Ok(session) => session,
            Err(err) => return (Err(err), Vec::new()),
        };
        let verdict = self.converse(&mut session, target);
        session.close();
        (verdict, session.take_transcript())
    }

    fn converse(
        &self,
        session: &mut SmtpSession,
        target: &ProbeTarget<'_>,
    ) -> Result<HostVerdict, SmtpVerifyError> {
        let banner = session.read_banner()?;
        if !banner.is_positive_completion() {
            return Ok(HostVerdict::refused("banner", &banner));
        }

        let helo = self.options.helo_name();
        let ehlo_cmd = format!("EHLO {helo}");
        let ehlo = session.send_command(&ehlo_cmd)?;
        if ehlo.is_positive_completion() {
            if self.options.starttls && ehlo.has_capability("STARTTLS") {
                let tls = session.starttls(&self.connector)?;
                if tls.is_positive_completion() {
                    // on repart de zéro après la négociation TLS
                    session.send_command(&ehlo_cmd)?;
                }
            }
        } else {
            let helo_reply = session.send_command(&format!("HELO {helo}"))?;
            if !helo_reply.is_positive_completion() {
                return Ok(HostVerdict::refused("HELO", &helo_reply));
            }
        }

        let mail = session.send_command(&self.options.envelope())?;
        if !mail.is_positive_completion() {
            return Ok(HostVerdict::refused("MAIL FROM", &mail));
        }

        let rcpt = session.send_command(&format!("RCPT TO:<{}>", target.address()))?;
        let mut probed = vec![target.local.to_string()];
        if rcpt.is_no_mailbox() {
            return Ok(HostVerdict::Answered {
                status: SmtpStatus::Undeliverable,
                reply: rcpt,
                catch_all: None,
                probed,
            });
        }
        if !rcpt.is_positive_completion() {
            return Ok(HostVerdict::refused("RCPT TO", &rcpt));
        }

        let mut catch_all = None;
        if target.detect_catch_all {
            let decoy = random_local_part(target.local);
            let command = format!("RCPT TO:<{decoy}@{}>", target.domain);
            probed.push(decoy);
            // le verdict principal est déjà acquis, une erreur ici le laisse intact
            match session.send_command(&command) {
                Ok(reply) if reply.is_positive_completion() => catch_all = Some(true),
                Ok(reply) if reply.is_no_mailbox() => catch_all = Some(false),
                Ok(_) => {}
                Err(err) => debug!("catch-all probe on {}: {err}", target.domain),
            }
        }

        Ok(HostVerdict::Answered {
            status: SmtpStatus::Deliverable,
            reply: rcpt,
            catch_all,
            probed,
        })
    }
}

impl MailboxProber for SmtpProber {
    fn probe(&self, target: &ProbeTarget<'_>) -> SmtpDetails {
        let hosts: Vec<&str> = target
            .hosts
            .iter()
            .filter(|record| !record.is_null())
            .take(self.options.max_mx.max(1))
            .map(|record| record.exchange.as_str())
            .collect();
        if hosts.is_empty() {
            return SmtpDetails::unknown("no MX host to probe");
        }

        let mut details = SmtpDetails::default();
        let mut blocked_hosts = 0usize;

        for host in hosts {
            details.hosts_tried.push(host.to_string());
            let (verdict, transcript) = self.probe_host(host, target);
            details.transcript.extend(transcript);
            match verdict {
                Ok(HostVerdict::Answered {
                    status,
                    reply,
                    catch_all,
                    probed,
                }) => {
                    info!("{}: {status} via {host} ({})", target.address(), reply.code);
                    details.status = status;
                    details.code = Some(reply.code);
                    details.message = Some(reply.text());
                    details.mx_host = Some(host.to_string());
                    details.catch_all = catch_all;
                    details.probed_locals = probed;
                    details.reason = None;
                    return details;
                }
                Ok(HostVerdict::Refused { stage, reply }) if reply.is_transient_failure() => {
                    // greylisting ou limitation: inutile d'insister sur les MX suivants
                    debug!("{host}: temporary failure {} at {stage}", reply.code);
                    details.code = Some(reply.code);
                    details.message = Some(reply.text());
                    details.mx_host = Some(host.to_string());
                    details.reason = Some(format!("temporary failure {} at {stage}", reply.code));
                    return details;
                }
                Ok(HostVerdict::Refused { stage, reply }) => {
                    debug!("{host} blocked the probe at {stage} ({})", reply.code);
                    blocked_hosts += 1;
                    details.code = Some(reply.code);
                    details.message = Some(reply.text());
                    details.reason = Some(format!("{stage} refused with {}", reply.code));
                }
                Err(err) => {
                    debug!("{host}: {err}");
                    details.reason = Some(err.to_string());
                }
            }
        }

        details.blocked = blocked_hosts == details.hosts_tried.len();
        if details.reason.is_none() {
            details.reason = Some("no MX host answered".to_string());
        }
        details
    }
}

enum HostVerdict {
    /// RCPT TO reached a mailbox verdict.
    Answered {
        status: SmtpStatus,
        reply: SmtpReply,
        catch_all: Option<bool>,
        probed: Vec<String>,
    },
    /// The host did not let the probe reach a verdict.
    Refused {
        stage: &'static str,
        reply: SmtpReply,
    },
}

impl HostVerdict {
    fn refused(stage: &'static str, reply: &SmtpReply) -> Self {
        Self::Refused {
            stage,
            reply: reply.clone(),
        }
    }
}

fn resolve_addrs(
    host: &str,
    port: u16,
    allow_ipv6: bool,
) -> Result<Vec<SocketAddr>, SmtpVerifyError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| SmtpVerifyError::Resolve {
            host: host.to_string(),
            source,
        })?
        .filter(|addr| allow_ipv6 || addr.is_ipv4())
        .collect();
    if addrs.is_empty() {
        return Err(SmtpVerifyError::NoAddress {
            host: host.to_string(),
        });
    }
    Ok(addrs)
}
