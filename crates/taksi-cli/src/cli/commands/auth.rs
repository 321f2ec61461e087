//! Login/logout/status command handlers.
//!
//! The CLI stands in for the mobile presentation layer: it builds a gate,
//! runs one lifecycle operation, and prints the outcome.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use taksi_core::auth::{AccountKind, AuthClient, AuthGate, Credentials, SessionStore};
use taksi_core::config::Config;

pub async fn login(config: &Config, kind: AccountKind, phone: &str) -> Result<()> {
    let client = AuthClient::new(config).context("create auth client")?;
    let store = SessionStore::open(kind);
    let gate = AuthGate::new(client, store);

    if let Some(user) = gate.current_user().context("read stored session")? {
        println!("Already logged in as {}", user.display_name());
        return Ok(());
    }

    let password = read_password().context("read password")?;
    if password.is_empty() {
        bail!("Password must not be empty");
    }

    let credentials = Credentials {
        phone: phone.to_string(),
        password,
    };

    let user = gate.login(&credentials).await?;
    println!("Logged in as {} ({})", user.display_name(), user.phone);
    Ok(())
}

pub fn logout(kind: AccountKind) -> Result<()> {
    let store = SessionStore::open(kind);

    if store.load().context("read stored session")?.is_none() {
        println!("Not logged in");
        return Ok(());
    }

    store.clear().context("clear stored session")?;
    println!("Logged out");
    Ok(())
}

pub fn status(kind: AccountKind) -> Result<()> {
    let store = SessionStore::open(kind);

    match store.load().context("read stored session")? {
        Some(session) => {
            println!(
                "Logged in as {} ({})",
                session.user.display_name(),
                session.user.phone
            );
        }
        None => println!("Not logged in"),
    }
    Ok(())
}

/// Reads the password from stdin (prompt goes to stderr so piped input
/// stays clean).
fn read_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush().ok();

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("read from stdin")?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
