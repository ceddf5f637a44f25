//! Presentation state for a lobby front end.
//!
//! - [`SessionState`]: the signed-in profile, loaded and saved explicitly
//! - [`Lobby`]: catalogue cards, registrations, dialogs and the error banner
//! - [`PlayerCountRefresher`]: cancellable periodic count refresh

pub mod refresher;
pub mod session;
pub mod state;

pub use refresher::{DEFAULT_REFRESH_INTERVAL, PlayerCountRefresher};
pub use session::{SessionError, SessionResult, SessionState};
pub use state::{JoinOutcome, Lobby, Modal, TournamentCard};
