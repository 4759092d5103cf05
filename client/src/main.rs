use std::path::PathBuf;

use anyhow::{bail, Context};
use chrono::Local;
use clap::{Parser, Subcommand};
use guestbook_client::display::render_message;
use guestbook_client::session::{self, Session};
use guestbook_client::{App, NodeClient};
use guestbook_common::account::AccountId;
use guestbook_common::balance::format_near_amount;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "guestbook", about = "Sign the guest book")]
struct Cli {
    /// Base URL of the guestbook node.
    #[arg(long, default_value = "http://127.0.0.1:3030")]
    node: String,

    /// Account the guest book contract is deployed under.
    #[arg(long, default_value = "guestbook.test")]
    contract: AccountId,

    /// Where the signed-in account is remembered.
    #[arg(long)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in as an account.
    Login { account: AccountId },
    /// Forget every signed-in account.
    Logout,
    /// Switch to the next signed-in account.
    Switch,
    /// Show the signed-in account and its balance.
    Whoami,
    /// List the messages in the guest book.
    Messages,
    /// Sign the guest book.
    Post {
        text: String,
        /// Tokens to attach; 0.01 or more marks the message premium.
        #[arg(long, default_value = "")]
        donation: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let session_path = cli.session_file.clone().unwrap_or_else(session::default_path);
    let mut session = Session::load(&session_path)
        .with_context(|| format!("reading session {}", session_path.display()))?;

    let app = App::new(NodeClient::new(cli.node, cli.contract));

    match cli.command {
        Command::Login { account } => {
            let view = app.sign_in(&account).await?;
            if !session.accounts.contains(&view.account_id) {
                session.accounts.push(view.account_id.clone());
            }
            session.account_id = Some(view.account_id.clone());
            session.save(&session_path)?;
            println!(
                "Signed in as {} ({} tokens)",
                view.account_id,
                format_near_amount(view.amount)
            );
        }
        Command::Logout => {
            session.account_id = None;
            session.accounts.clear();
            session.save(&session_path)?;
            println!("Signed out");
        }
        Command::Switch => {
            let Some(account) = &session.account_id else {
                bail!("not signed in; run `guestbook login <account>` first");
            };
            for known in &session.accounts {
                app.remember(known.clone());
            }
            app.sign_in(account).await?;
            let view = app.switch_account().await?;
            session.accounts = app.known_accounts();
            session.account_id = Some(view.account_id.clone());
            session.save(&session_path)?;
            println!(
                "Switched to {} ({} tokens)",
                view.account_id,
                format_near_amount(view.amount)
            );
        }
        Command::Whoami => match &session.account_id {
            Some(account) => {
                let view = app.sign_in(account).await?;
                println!("{} ({} tokens)", view.account_id, format_near_amount(view.amount));
            }
            None => println!("Not signed in"),
        },
        Command::Messages => {
            if let Some(account) = &session.account_id {
                app.sign_in(account).await?;
            }
            app.refresh_messages().await;
            match app.visible_messages() {
                Some(messages) => {
                    for message in &messages {
                        println!("{}", render_message(message, &Local));
                    }
                }
                None if app.account().is_none() => println!("Sign in to see the guest book"),
                None => println!("No messages yet"),
            }
        }
        Command::Post { text, donation } => {
            let Some(account) = &session.account_id else {
                bail!("not signed in; run `guestbook login <account>` first");
            };
            app.sign_in(account).await?;
            let response = app.add_message(&text, &donation).await?;
            for outcome in &response.outcomes {
                if let Some(message) = &outcome.message {
                    println!("{}", render_message(message, &Local));
                }
            }
        }
    }
    Ok(())
}
