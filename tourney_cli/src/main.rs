//! Terminal lobby for tournament registration.
//!
//! Reads commands from stdin, keeps the signed-in profile live and saves the
//! session on exit.

use std::{io::BufRead, path::PathBuf, sync::Arc};

use anyhow::{Context, Error};
use ctrlc::set_handler;
use log::{info, warn};
use pico_args::Arguments;
use tokio::sync::mpsc;
use tourney::{
    AuthManager, Catalogue, Lobby, PgStore, PlayerCountRefresher, RegistrationEngine,
    SessionState,
};
use tourney_cli::{
    app::App,
    commands::{HELP as COMMAND_HELP, parse_command},
    config::AppConfig,
    logging,
};

const HELP: &str = "\
Register for tournaments from the terminal

USAGE:
  tourney [OPTIONS]

OPTIONS:
  --db-url     URL         Database connection string   [default: env DATABASE_URL]
  --session    PATH        Session file                 [default: env TOURNEY_SESSION_FILE or .tourney/session.json]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  DATABASE_URL             PostgreSQL connection string
  PASSWORD_PEPPER          Password hashing pepper (required, 16+ characters)
  TOURNEY_CONSISTENCY      strict | relaxed          [default: strict]
  TOURNEY_CATALOGUE        JSON tournament list      [default: built-in]
  RUST_LOG                 Log filter                [default: info,sqlx=warn]
  (See .env file for all configuration options)
";

struct Args {
    database_url: Option<String>,
    session_file: Option<PathBuf>,
}

enum Input {
    Line(String),
    Eof,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        database_url: pargs.opt_value_from_str("--db-url")?,
        session_file: pargs.opt_value_from_os_str("--session", |s| {
            Ok::<_, std::convert::Infallible>(PathBuf::from(s))
        })?,
    };

    logging::init();

    let config = AppConfig::from_env(args.database_url, args.session_file)?;
    config.validate()?;
    info!(
        "Starting lobby ({} consistency, session file {})",
        config.consistency,
        config.session_file.display()
    );

    // Catching signals for exit.
    let (interrupt_tx, mut interrupt_rx) = mpsc::unbounded_channel();
    set_handler(move || {
        let _ = interrupt_tx.send(());
    })?;

    let store = Arc::new(
        PgStore::connect(&config.database)
            .await
            .context("Failed to connect to database")?
            .with_max_update_attempts(config.max_update_attempts),
    );
    store.ensure_schema().await?;

    let catalogue = match &config.catalogue_path {
        Some(path) => Catalogue::from_json_file(path)
            .with_context(|| format!("Failed to load catalogue {}", path.display()))?,
        None => Catalogue::builtin(),
    };
    info!("Loaded {} tournaments", catalogue.len());

    let engine = RegistrationEngine::new(Arc::clone(&store), Arc::new(catalogue), config.engine());
    let auth = AuthManager::new(Arc::clone(&store), config.password_pepper.clone())
        .with_poll_interval(config.profile_poll);
    let session = SessionState::load(&config.session_file)?;
    if let Some(profile) = session.profile() {
        info!("Resuming session for {}", profile.uid);
    }

    let refresher = PlayerCountRefresher::spawn(engine.clone(), config.player_count_refresh);
    let mut lobby = Lobby::new(engine, auth, session);
    lobby.refresh_registrations().await;
    if let Some(uid) = lobby.session().uid().map(str::to_string) {
        match lobby.auth().get_profile(&uid).await {
            Ok(Some(profile)) => lobby.apply_profile(profile),
            Ok(None) => {
                warn!("Saved session for {} has no profile, signing out", uid);
                lobby.sign_out();
            }
            Err(e) => warn!("Could not refresh profile for {}: {}", uid, e),
        }
    }
    let mut app = App::new(lobby, config.upi.clone()).with_refresher(refresher);

    let mut lines = spawn_stdin_reader();
    println!("{}", COMMAND_HELP.trim_end());
    prompt();

    loop {
        tokio::select! {
            input = lines.recv() => {
                let Some(Input::Line(line)) = input else {
                    break;
                };
                if line.trim().is_empty() {
                    prompt();
                    continue;
                }
                match parse_command(&line) {
                    Ok(command) => {
                        let reply = app.execute(command).await;
                        println!("{}", reply.text);
                        if reply.quit {
                            break;
                        }
                    }
                    Err(e) => println!("{e}"),
                }
                prompt();
            }
            profile = app.next_profile() => {
                app.apply_profile(profile);
            }
            _ = interrupt_rx.recv() => {
                println!();
                info!("Interrupted");
                break;
            }
        }
    }

    app.shutdown();
    app.lobby().session().save(&config.session_file)?;
    info!("Session saved to {}", config.session_file.display());
    store.close().await;
    Ok(())
}

/// Forward stdin lines from a dedicated thread
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<Input> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Input::Line(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Input::Eof);
    });
    rx
}

fn prompt() {
    use std::io::Write;
    print!("> ");
    let _ = std::io::stdout().flush();
}
