use thiserror::Error;
use tourney::TournamentId;

/// A parsed REPL line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyCommand {
    /// Show the tournament cards
    List,
    SignUp {
        email: String,
        password: String,
        name: String,
        mobile: Option<String>,
    },
    SignIn {
        email: String,
        password: String,
    },
    SignOut,
    Profile,
    /// Open the registration form for a tournament
    Join(TournamentId),
    /// Submit the registration form for the joined tournament
    Register {
        game_uid: String,
        email: String,
        utr: String,
    },
    Registrations,
    Wallet,
    /// Raw amount; validated by the wallet module
    TopUp(String),
    Help,
    Quit,
}

/// Errors that can occur during command parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Invalid tournament id '{0}'")]
    InvalidTournamentId(String),

    #[error("Unrecognized command '{0}'. Type 'help' to see available commands")]
    UnrecognizedCommand(String),
}

pub const HELP: &str = "\
Commands:
  list                                  Show tournaments
  signup EMAIL PASSWORD NAME [MOBILE]   Create an account
  signin EMAIL PASSWORD                 Sign in
  signout                               Sign out
  profile                               Show your profile
  join ID                               Pick a tournament to register for
  register GAME_UID EMAIL UTR           Submit the registration form
  registrations                         Tournaments you are registered for
  wallet                                Show your balance
  topup AMOUNT                          Get UPI payment details for a top-up
  help                                  Show this help
  quit                                  Save the session and exit
";

/// Parse a command line into a [`LobbyCommand`].
///
/// # Examples
///
/// ```
/// use tourney_cli::commands::{LobbyCommand, parse_command};
///
/// assert_eq!(parse_command("join 2"), Ok(LobbyCommand::Join(2)));
/// assert_eq!(parse_command("  list "), Ok(LobbyCommand::List));
/// ```
pub fn parse_command(input: &str) -> Result<LobbyCommand, ParseError> {
    let trimmed = input.trim();
    let parts: Vec<&str> = trimmed.split_ascii_whitespace().collect();
    let Some((&head, args)) = parts.split_first() else {
        return Err(ParseError::UnrecognizedCommand(String::new()));
    };

    match head.to_ascii_lowercase().as_str() {
        "list" | "ls" => Ok(LobbyCommand::List),
        "signup" => parse_sign_up(args),
        "signin" | "login" => match args {
            [email, password] => Ok(LobbyCommand::SignIn {
                email: email.to_string(),
                password: password.to_string(),
            }),
            _ => Err(ParseError::Usage("signin EMAIL PASSWORD")),
        },
        "signout" | "logout" => Ok(LobbyCommand::SignOut),
        "profile" | "me" => Ok(LobbyCommand::Profile),
        "join" => match args {
            [id] => id
                .parse()
                .map(LobbyCommand::Join)
                .map_err(|_| ParseError::InvalidTournamentId(id.to_string())),
            _ => Err(ParseError::Usage("join ID")),
        },
        "register" => match args {
            [game_uid, email, utr] => Ok(LobbyCommand::Register {
                game_uid: game_uid.to_string(),
                email: email.to_string(),
                utr: utr.to_string(),
            }),
            _ => Err(ParseError::Usage("register GAME_UID EMAIL UTR")),
        },
        "registrations" => Ok(LobbyCommand::Registrations),
        "wallet" | "balance" => Ok(LobbyCommand::Wallet),
        "topup" => match args {
            [amount] => Ok(LobbyCommand::TopUp(amount.to_string())),
            _ => Err(ParseError::Usage("topup AMOUNT")),
        },
        "help" | "?" => Ok(LobbyCommand::Help),
        "quit" | "exit" => Ok(LobbyCommand::Quit),
        _ => Err(ParseError::UnrecognizedCommand(trimmed.to_string())),
    }
}

/// "signup EMAIL PASSWORD NAME [MOBILE]"; NAME may span several words
/// when the last word is not a phone number
fn parse_sign_up(args: &[&str]) -> Result<LobbyCommand, ParseError> {
    let [email, password, rest @ ..] = args else {
        return Err(ParseError::Usage("signup EMAIL PASSWORD NAME [MOBILE]"));
    };
    if rest.is_empty() {
        return Err(ParseError::Usage("signup EMAIL PASSWORD NAME [MOBILE]"));
    }

    let (name, mobile) = match rest.split_last() {
        Some((last, name)) if !name.is_empty() && is_phone_number(last) => {
            (name.join(" "), Some(last.to_string()))
        }
        _ => (rest.join(" "), None),
    };

    Ok(LobbyCommand::SignUp {
        email: email.to_string(),
        password: password.to_string(),
        name,
        mobile,
    })
}

fn is_phone_number(word: &str) -> bool {
    let digits = word.strip_prefix('+').unwrap_or(word);
    digits.len() >= 7 && digits.chars().all(|c| c.is_ascii_digit())
}
