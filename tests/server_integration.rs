//! Runs against a real POP3S server. The mailbox given by `TEST_USER`/`TEST_PASSWORD` must hold at
//! least one message; nothing is deleted.

use std::sync::Arc;
use std::time::Duration;

use pop3s::{AcceptAnyCertificate, ClientBuilder, Config, Error, SessionState};

fn test_host() -> String {
    std::env::var("TEST_HOST").unwrap_or("127.0.0.1".to_string())
}

fn test_pop3s_port() -> u16 {
    std::env::var("TEST_POP3S_PORT")
        .unwrap_or("3995".to_string())
        .parse()
        .unwrap_or(3995)
}

fn test_user() -> String {
    std::env::var("TEST_USER").unwrap_or("readonly-test@localhost".to_string())
}

fn test_password() -> String {
    std::env::var("TEST_PASSWORD").unwrap_or("password".to_string())
}

fn builder(password: String) -> ClientBuilder {
    let config = Config::new(test_host(), test_user(), password)
        .with_port(test_pop3s_port())
        .with_timeout(Some(Duration::from_secs(10)));
    ClientBuilder::new(config).certificate_policy(Arc::new(AcceptAnyCertificate))
}

#[test]
fn connect() {
    let session = builder(test_password()).connect().unwrap();
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[test]
fn login() {
    let mut session = builder(test_password()).login().unwrap();
    session.noop().unwrap();
    session.quit().unwrap();
}

#[test]
fn wrong_password() {
    match builder("definitely wrong".to_string()).login() {
        Err(Error::AuthRejected { .. }) => {}
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("logged in with a wrong password"),
    }
}

#[test]
fn stat_list_retr() {
    let mut session = builder(test_password()).login().unwrap();

    let stats = session.stat().unwrap();
    assert!(stats.message_count > 0);

    let info = session.list(1).unwrap();
    assert!(info.size > 0);

    session.retr(1).unwrap();
    assert!(session.responses().is_complete());
    assert!(!session.responses().body().unwrap().is_empty());

    session.quit().unwrap();
}

#[test]
fn dele_then_rset() {
    let mut session = builder(test_password()).login().unwrap();
    session.dele(1).unwrap();
    assert!(matches!(
        session.dele(1),
        Err(Error::CommandRejected { command: "DELE", .. })
    ));
    session.rset().unwrap();
    session.quit().unwrap();
}
