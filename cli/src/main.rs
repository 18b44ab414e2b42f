use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use portal::config::ConfigError;
use portal::flow::PortalError;
use portal::storage::StorageError;
use portal::{LoginOutcome, Navigator, Page, Portal, PortalConfig, ProfileOutcome, RefreshOutcome, Screen, View, token};

#[cfg(test)]
#[path = "main_test.rs"]
mod main_test;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Setup(#[from] PortalError),
    #[error("session store failed: {0}")]
    Storage(#[from] StorageError),
    #[error("login failed")]
    LoginFailed,
    #[error("refresh failed: {0}")]
    RefreshFailed(String),
}

#[derive(Parser, Debug)]
#[command(name = "portal", about = "Mock login portal: session and profile from the terminal")]
struct Cli {
    /// Directory holding the per-origin session files.
    #[arg(long, global = true, env = "PORTAL_STORE_DIR")]
    store_dir: Option<PathBuf>,

    /// Origin whose session store is used.
    #[arg(long, global = true, env = "PORTAL_ORIGIN")]
    origin: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit the login form.
    Login {
        #[arg(long)]
        username: Option<String>,
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Load the profile dashboard.
    Dashboard,
    /// Show whether a session is stored and what its access token claims.
    Status,
    /// Exchange the refresh token for a new access token.
    Refresh,
    /// End the session.
    Logout,
}

/// Prints views the way the pages would show them.
struct TerminalScreen;

impl Screen for TerminalScreen {
    fn render(&mut self, view: View) {
        if view.is_error() {
            eprintln!("{view}");
        } else {
            println!("{view}");
        }
    }
}

/// Prints the page a browser would be sent to.
struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&mut self, page: Page) {
        println!("-> {}", page.path());
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = resolve_config(PortalConfig::from_env()?, &cli);
    let portal = Portal::from_config(&config)?;
    let (mut nav, mut screen) = (TerminalNavigator, TerminalScreen);

    match cli.command {
        Command::Login { username, password } => {
            if portal.on_login_page_load(&mut nav)? {
                return Ok(());
            }
            let username = username.unwrap_or_default();
            let password = password.unwrap_or_default();
            match portal.handle_login(&username, &password, &mut nav, &mut screen).await? {
                LoginOutcome::Authenticated => Ok(()),
                LoginOutcome::Invalid | LoginOutcome::Rejected => Err(CliError::LoginFailed),
            }
        }
        Command::Dashboard => {
            let outcome = portal.on_dashboard_load(&mut nav, &mut screen).await?;
            tracing::debug!(?outcome, "dashboard loaded");
            if outcome == ProfileOutcome::Unavailable {
                eprintln!("run `portal logout` to return to the login page");
            }
            Ok(())
        }
        Command::Status => {
            print_status(&portal)?;
            Ok(())
        }
        Command::Refresh => match portal.refresh_session().await? {
            RefreshOutcome::Refreshed => {
                println!("access token refreshed");
                Ok(())
            }
            RefreshOutcome::NoSession => {
                println!("not logged in");
                Ok(())
            }
            RefreshOutcome::Rejected(reason) => Err(CliError::RefreshFailed(reason)),
        },
        Command::Logout => {
            portal.logout(&mut nav).await?;
            Ok(())
        }
    }
}

/// Apply command-line overrides on top of the environment config.
fn resolve_config(mut config: PortalConfig, cli: &Cli) -> PortalConfig {
    if let Some(dir) = &cli.store_dir {
        config.store_dir.clone_from(dir);
    }
    if let Some(origin) = &cli.origin {
        config.origin = origin.trim_end_matches('/').to_owned();
    }
    config
}

fn print_status(portal: &Portal) -> Result<(), StorageError> {
    let Some(token) = portal.session().access_token()? else {
        println!("logged in: no");
        return Ok(());
    };
    println!("logged in: yes");
    match token::decode_unverified(&token) {
        Ok(payload) => {
            println!("{payload}");
            if payload.is_expired_at(now_secs()) {
                println!("(access token expired; run `portal refresh`)");
            }
        }
        Err(e) => println!("token payload unavailable: {e}"),
    }
    Ok(())
}

fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}
