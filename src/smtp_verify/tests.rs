use std::io::{self, BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use super::*;
use crate::mx::MxRecord;

type Script = Vec<(&'static str, &'static str)>;

/// Loopback SMTP server playing one scripted session per accepted
/// connection, in order.
fn spawn_mock_server(sessions: Vec<(&'static str, Script)>) -> (u16, thread::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock server");
    let port = listener.local_addr().expect("addr").port();
    let (ready_tx, ready_rx) = mpsc::channel();
    let handle = thread::spawn(move || {
        ready_tx.send(()).ok();
        for (banner, script) in sessions {
            let (mut stream, _) = listener.accept().expect("accept");
            handle_session(&mut stream, banner, script).expect("mock session");
        }
    });
    ready_rx.recv().expect("server ready");
    (port, handle)
}

fn handle_session(stream: &mut TcpStream, banner: &str, script: Script) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    stream.write_all(banner.as_bytes())?;
    stream.flush()?;
    for (expected, response) in script {
        let mut line = String::new();
        reader.read_line(&mut line)?;
        assert!(
            line.starts_with(expected),
            "expected command starting with '{expected}', got '{line}'"
        );
        stream.write_all(response.as_bytes())?;
        stream.flush()?;
    }
    Ok(())
}

const BANNER: &str = "220 mock.smtp.test ESMTP\r\n";

fn options(port: u16) -> SmtpProbeOptions {
    SmtpProbeOptions {
        port,
        helo_domain: Some("probe.acme.io".into()),
        mail_from: Some("bounce@acme.io".into()),
        ..SmtpProbeOptions::default()
    }
    .with_timeout(Duration::from_secs(2))
}

fn probe(port: u16, local: &str, hosts: &[MxRecord], detect_catch_all: bool) -> SmtpDetails {
    let prober = SmtpProber::new(options(port)).expect("prober");
    prober.probe(&ProbeTarget {
        local,
        domain: "acme.io",
        hosts,
        detect_catch_all,
    })
}

fn loopback() -> Vec<MxRecord> {
    vec![MxRecord::new(10, "127.0.0.1")]
}

#[test]
fn deliverable_mailbox_on_a_strict_server() {
    let (port, handle) = spawn_mock_server(vec![(
        BANNER,
        vec![
            ("EHLO probe.acme.io", "250-mock.smtp.test\r\n250 SIZE 10240000\r\n"),
            ("MAIL FROM:<bounce@acme.io>", "250 2.1.0 Ok\r\n"),
            ("RCPT TO:<john@acme.io>", "250 2.1.5 Ok\r\n"),
            ("RCPT TO:<", "550 5.1.1 No such user\r\n"),
            ("RSET", "250 2.0.0 Reset\r\n"),
            ("QUIT", "221 2.0.0 Bye\r\n"),
        ],
    )]);

    let details = probe(port, "john", &loopback(), true);
    handle.join().expect("server thread");

    assert_eq!(details.status, SmtpStatus::Deliverable);
    assert_eq!(details.code, Some(250));
    assert_eq!(details.catch_all, Some(false));
    assert_eq!(details.mx_host.as_deref(), Some("127.0.0.1"));
    assert_eq!(details.probed_locals.len(), 2);
    assert_eq!(details.probed_locals[0], "john");
    assert_ne!(details.probed_locals[1], "john");
    assert!(!details.blocked);
}

#[test]
fn decoy_accepted_means_catch_all() {
    let (port, handle) = spawn_mock_server(vec![(
        BANNER,
        vec![
            ("EHLO", "250 mock.smtp.test\r\n"),
            ("MAIL FROM:", "250 2.1.0 Ok\r\n"),
            ("RCPT TO:<john@acme.io>", "250 2.1.5 Ok\r\n"),
            ("RCPT TO:<", "250 2.1.5 Ok\r\n"),
            ("RSET", "250 2.0.0 Reset\r\n"),
            ("QUIT", "221 2.0.0 Bye\r\n"),
        ],
    )]);

    let details = probe(port, "john", &loopback(), true);
    handle.join().expect("server thread");

    assert_eq!(details.status, SmtpStatus::Deliverable);
    assert_eq!(details.catch_all, Some(true));
}

#[test]
fn unknown_user_is_undeliverable() {
    let (port, handle) = spawn_mock_server(vec![(
        BANNER,
        vec![
            ("EHLO", "250 mock.smtp.test\r\n"),
            ("MAIL FROM:", "250 2.1.0 Ok\r\n"),
            ("RCPT TO:<ghost@acme.io>", "550 5.1.1 User unknown\r\n"),
            ("RSET", "250 2.0.0 Reset\r\n"),
            ("QUIT", "221 2.0.0 Bye\r\n"),
        ],
    )]);

    let details = probe(port, "ghost", &loopback(), true);
    handle.join().expect("server thread");

    assert_eq!(details.status, SmtpStatus::Undeliverable);
    assert_eq!(details.catch_all, None);
    insta::assert_snapshot!(details.transcript.join("\n"), @r"
    [127.0.0.1] S: 220 mock.smtp.test ESMTP
    [127.0.0.1] C: EHLO probe.acme.io
    [127.0.0.1] S: 250 mock.smtp.test
    [127.0.0.1] C: MAIL FROM:<bounce@acme.io>
    [127.0.0.1] S: 250 2.1.0 Ok
    [127.0.0.1] C: RCPT TO:<ghost@acme.io>
    [127.0.0.1] S: 550 5.1.1 User unknown
    [127.0.0.1] C: RSET
    [127.0.0.1] S: 250 2.0.0 Reset
    [127.0.0.1] C: QUIT
    [127.0.0.1] S: 221 2.0.0 Bye
    ");
}

#[test]
fn greylisting_is_unknown_not_invalid() {
    let (port, handle) = spawn_mock_server(vec![(
        BANNER,
        vec![
            ("EHLO", "250 mock.smtp.test\r\n"),
            ("MAIL FROM:", "250 2.1.0 Ok\r\n"),
            ("RCPT TO:", "451 4.7.1 Greylisted, try again later\r\n"),
            ("RSET", "250 2.0.0 Reset\r\n"),
            ("QUIT", "221 2.0.0 Bye\r\n"),
        ],
    )]);

    let details = probe(port, "john", &loopback(), true);
    handle.join().expect("server thread");

    assert_eq!(details.status, SmtpStatus::Unknown);
    assert_eq!(details.code, Some(451));
    assert!(!details.blocked);
    assert!(details.reason.as_deref().unwrap_or("").contains("temporary"));
}

#[test]
fn falls_back_to_helo_without_catch_all_probe() {
    let (port, handle) = spawn_mock_server(vec![(
        BANNER,
        vec![
            ("EHLO", "502 5.5.2 Command not recognized\r\n"),
            ("HELO probe.acme.io", "250 mock.smtp.test\r\n"),
            ("MAIL FROM:", "250 Ok\r\n"),
            ("RCPT TO:<john@acme.io>", "251 User not local; will forward\r\n"),
            ("RSET", "250 Ok\r\n"),
            ("QUIT", "221 Bye\r\n"),
        ],
    )]);

    let details = probe(port, "john", &loopback(), false);
    handle.join().expect("server thread");

    assert_eq!(details.status, SmtpStatus::Deliverable);
    assert_eq!(details.code, Some(251));
    assert_eq!(details.catch_all, None);
    assert_eq!(details.probed_locals, vec!["john".to_string()]);
}

#[test]
fn refused_banner_marks_probe_blocked() {
    let (port, handle) = spawn_mock_server(vec![(
        "554 5.7.1 No SMTP service here\r\n",
        vec![("QUIT", "221 Bye\r\n")],
    )]);

    let details = probe(port, "john", &loopback(), true);
    handle.join().expect("server thread");

    assert_eq!(details.status, SmtpStatus::Unknown);
    assert!(details.blocked);
    assert_eq!(details.code, Some(554));
}

#[test]
fn next_host_is_tried_after_a_block() {
    let (port, handle) = spawn_mock_server(vec![
        (
            BANNER,
            vec![
                ("EHLO", "250 mock.smtp.test\r\n"),
                ("MAIL FROM:", "550 5.7.1 Sender rejected\r\n"),
                ("RSET", "250 Ok\r\n"),
                ("QUIT", "221 Bye\r\n"),
            ],
        ),
        (
            BANNER,
            vec![
                ("EHLO", "250 mock.smtp.test\r\n"),
                ("MAIL FROM:", "250 Ok\r\n"),
                ("RCPT TO:<john@acme.io>", "250 Ok\r\n"),
                ("RSET", "250 Ok\r\n"),
                ("QUIT", "221 Bye\r\n"),
            ],
        ),
    ]);
    let hosts = vec![MxRecord::new(10, "127.0.0.1"), MxRecord::new(20, "127.0.0.1")];

    let details = probe(port, "john", &hosts, false);
    handle.join().expect("server thread");

    assert_eq!(details.status, SmtpStatus::Deliverable);
    assert_eq!(details.hosts_tried.len(), 2);
    assert!(!details.blocked);
}

#[test]
fn unreachable_host_degrades_to_unknown() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };

    let details = probe(port, "john", &loopback(), true);

    assert_eq!(details.status, SmtpStatus::Unknown);
    assert!(!details.blocked);
    assert!(details.reason.is_some());
    assert_eq!(details.hosts_tried, vec!["127.0.0.1".to_string()]);
}

#[test]
fn no_hosts_means_nothing_to_probe() {
    let details = probe(25, "john", &[MxRecord::new(0, ".")], true);
    assert_eq!(details.status, SmtpStatus::Unknown);
    assert!(details.hosts_tried.is_empty());
}

/// Server that accepts once and hands the socket to `behave`.
fn spawn_raw_server<F>(behave: F) -> u16
where
    F: FnOnce(TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    thread::spawn(move || {
        if let Ok((stream, _)) = listener.accept() {
            behave(stream);
        }
    });
    port
}

#[test]
fn trickling_server_hits_the_host_deadline() {
    // un octet toutes les 100 ms: aucune lecture n'expire, seule l'échéance par hôte coupe
    let port = spawn_raw_server(|mut stream| {
        for _ in 0..200 {
            if stream.write_all(b"2").and_then(|()| stream.flush()).is_err() {
                return;
            }
            thread::sleep(Duration::from_millis(100));
        }
    });
    let options = SmtpProbeOptions {
        port,
        ..SmtpProbeOptions::default()
    }
    .with_timeout(Duration::from_millis(300));
    let prober = SmtpProber::new(options).expect("prober");

    let started = Instant::now();
    let details = prober.probe(&ProbeTarget {
        local: "john",
        domain: "acme.io",
        hosts: &loopback(),
        detect_catch_all: false,
    });

    assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
    assert_eq!(details.status, SmtpStatus::Unknown);
    assert_eq!(details.reason.as_deref(), Some("per-host deadline exceeded"));
    assert!(!details.blocked);
}

#[test]
fn endless_reply_line_is_cut_off() {
    let port = spawn_raw_server(|mut stream| {
        let junk = vec![b'x'; 8192];
        if stream.write_all(&junk).is_ok() {
            thread::sleep(Duration::from_secs(2));
        }
    });

    let details = probe(port, "john", &loopback(), false);

    assert_eq!(details.status, SmtpStatus::Unknown);
    let reason = details.reason.unwrap_or_default();
    assert!(reason.contains("longer than 4096 bytes"), "{reason}");
}
