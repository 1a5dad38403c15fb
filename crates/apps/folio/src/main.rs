//! Folio - prints pages of a Gmail mailbox
//!
//! A thin driver over the `mail` crate: loads settings and the stored
//! credential, then walks forward through the requested number of pages and
//! prints one line per message.

use anyhow::{Context, Result, bail};
use log::{error, info, warn};
use mail::{CancellationToken, CredentialStore, Error, GmailClient, MailConfig, MailSession, Page};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if let Err(e) = run() {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let pages: usize = match std::env::args().nth(1) {
        Some(arg) => arg
            .parse()
            .with_context(|| format!("page count must be a number, got {arg:?}"))?,
        None => 1,
    };

    config::init().context("Failed to initialize config directory")?;
    let settings = MailConfig::load().context("Failed to load settings")?;

    let store = CredentialStore::new()?;
    let credential = match store.load() {
        Ok(credential) => credential,
        Err(e) if e.requires_authorization() => {
            warn!(
                "No usable Gmail credential ({}). Authorize with your OAuth tool of choice and \
                 save the token JSON (accessToken, refreshToken, expiry) to: {}",
                e,
                store.path().display()
            );
            bail!("authorization required");
        }
        Err(e) => return Err(e.into()),
    };

    let client = GmailClient::from_config(&credential, &settings)?;
    let session = MailSession::new(client, &settings)?;
    info!(
        "Listing {} page(s) of {} messages with {} workers",
        pages, settings.page_size, settings.max_concurrent_fetches
    );

    for n in 0..pages {
        let cancel = CancellationToken::with_timeout(settings.request_timeout() * 4);
        let page = match session.next_page(&cancel) {
            Ok(page) => page,
            Err(e @ Error::Auth { .. }) => {
                return Err(e).context("Gmail rejected the stored credential");
            }
            Err(e) => return Err(e.into()),
        };

        if page.is_empty() {
            info!("No more messages");
            break;
        }
        print_page(n + 1, &page);
    }

    Ok(())
}

fn print_page(number: usize, page: &Page) {
    println!("--- page {} ---", number);
    for item in &page.items {
        let subject = if item.subject().is_empty() {
            "(no subject)"
        } else {
            item.subject()
        };
        println!("> {}: {}", item.sender_address().display_name(), subject);
    }
    for (id, e) in &page.failures {
        println!("! {}: {}", id, e);
    }
}
