use std::env;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use pop3s::{AcceptAnyCertificate, ClientBuilder, Config};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let host = env::var("POP3_HOST")?;
    let port = env::var("POP3_PORT").unwrap_or_else(|_| String::from("995"));
    let port = port.parse()?;

    let username = env::var("POP3_USER")?;
    let password = env::var("POP3_PASSWORD")?;

    let timeout = env::var("POP3_TIMEOUT").unwrap_or_else(|_| String::from("30"));
    let timeout = Duration::from_secs(timeout.parse()?);

    let config = Config::new(host, username, password)
        .with_port(port)
        .with_timeout(Some(timeout));

    let mut builder = ClientBuilder::new(config);
    // handy for test servers with a self-signed certificate
    if env::var("POP3_INSECURE").is_ok() {
        builder = builder.certificate_policy(Arc::new(AcceptAnyCertificate));
    }

    let mut session = builder.login()?;

    let stats = session.stat()?;
    println!("{}", stats);

    if stats.message_count > 0 {
        let n = stats.message_count;
        let info = session.list(n)?;
        println!("{}", info);

        session.retr(n)?;
        println!(
            "message {} arrived in {} chunks",
            n,
            session.responses().len()
        );
        print!("{}", session.responses().body()?);

        session.noop()?;
        if env::var("POP3_DELETE").is_ok() {
            session.dele(n)?;
            // changed our mind
            session.rset()?;
        }
    }

    session.quit()?;

    Ok(())
}
