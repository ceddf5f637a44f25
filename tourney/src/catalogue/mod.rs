//! Static tournament catalogue.
//!
//! The catalogue is read-only for the lifetime of the process. It is either
//! the built-in deployment list or a JSON file of [`Tournament`] objects.

pub mod models;

pub use models::{Tournament, TournamentId};

use chrono::{NaiveDate, NaiveTime};
use std::{collections::HashSet, path::Path};
use thiserror::Error;

/// Catalogue errors
#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error("Failed to read catalogue: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed catalogue: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tournament id must be positive, got {0}")]
    NonPositiveId(TournamentId),

    #[error("Duplicate tournament id {0}")]
    DuplicateId(TournamentId),

    #[error("Tournament {id}: {reason}")]
    Invalid { id: TournamentId, reason: String },
}

pub type CatalogueResult<T> = Result<T, CatalogueError>;

/// Ordered, validated list of tournaments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalogue {
    tournaments: Vec<Tournament>,
}

impl Catalogue {
    /// Build a catalogue, rejecting duplicate or invalid entries
    pub fn new(tournaments: Vec<Tournament>) -> CatalogueResult<Self> {
        let mut seen = HashSet::new();
        for t in &tournaments {
            if t.id <= 0 {
                return Err(CatalogueError::NonPositiveId(t.id));
            }
            if !seen.insert(t.id) {
                return Err(CatalogueError::DuplicateId(t.id));
            }
            if t.entry_fee < 0 {
                return Err(CatalogueError::Invalid {
                    id: t.id,
                    reason: "entry fee must not be negative".to_string(),
                });
            }
            if t.prize < 0 {
                return Err(CatalogueError::Invalid {
                    id: t.id,
                    reason: "prize must not be negative".to_string(),
                });
            }
            if t.players == 0 {
                return Err(CatalogueError::Invalid {
                    id: t.id,
                    reason: "capacity must be positive".to_string(),
                });
            }
        }
        Ok(Self { tournaments })
    }

    /// The deployment catalogue
    pub fn builtin() -> Self {
        Self {
            tournaments: vec![
                Tournament {
                    id: 1,
                    game: "BGMI".to_string(),
                    players: 100,
                    prize: 10_000,
                    entry_fee: 100,
                    date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap_or_default(),
                    time: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
                    map: "Erangel".to_string(),
                },
                Tournament {
                    id: 2,
                    game: "Free Fire".to_string(),
                    players: 48,
                    prize: 5_000,
                    entry_fee: 50,
                    date: NaiveDate::from_ymd_opt(2024, 3, 16).unwrap_or_default(),
                    time: NaiveTime::from_hms_opt(20, 0, 0).unwrap_or_default(),
                    map: "Bermuda".to_string(),
                },
            ],
        }
    }

    /// Load a JSON array of tournaments
    pub fn from_json_file(path: impl AsRef<Path>) -> CatalogueResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let tournaments: Vec<Tournament> = serde_json::from_str(&raw)?;
        Self::new(tournaments)
    }

    /// Look up a tournament by id
    pub fn get(&self, id: TournamentId) -> Option<&Tournament> {
        self.tournaments.iter().find(|t| t.id == id)
    }

    /// Tournaments in catalogue order
    pub fn iter(&self) -> impl Iterator<Item = &Tournament> {
        self.tournaments.iter()
    }

    /// All tournament ids in catalogue order
    pub fn ids(&self) -> Vec<TournamentId> {
        self.tournaments.iter().map(|t| t.id).collect()
    }

    pub fn len(&self) -> usize {
        self.tournaments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tournaments.is_empty()
    }
}

impl Default for Catalogue {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_catalogue() {
        let catalogue = Catalogue::builtin();
        assert_eq!(catalogue.len(), 2);
        let bgmi = catalogue.get(1).unwrap();
        assert_eq!(bgmi.game, "BGMI");
        assert_eq!(bgmi.entry_fee, 100);
        assert_eq!(bgmi.players, 100);
        assert_eq!(catalogue.get(2).unwrap().map, "Bermuda");
        assert!(catalogue.get(3).is_none());
        assert_eq!(catalogue.ids(), vec![1, 2]);
    }

    #[test]
    fn test_builtin_passes_validation() {
        let builtin = Catalogue::builtin();
        let revalidated = Catalogue::new(builtin.iter().cloned().collect()).unwrap();
        assert_eq!(builtin, revalidated);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut list: Vec<Tournament> = Catalogue::builtin().iter().cloned().collect();
        list[1].id = 1;
        assert!(matches!(
            Catalogue::new(list),
            Err(CatalogueError::DuplicateId(1))
        ));
    }

    #[test]
    fn test_non_positive_id_rejected() {
        let mut list: Vec<Tournament> = Catalogue::builtin().iter().cloned().collect();
        list[0].id = 0;
        assert!(matches!(
            Catalogue::new(list),
            Err(CatalogueError::NonPositiveId(0))
        ));
    }

    #[test]
    fn test_negative_fee_rejected() {
        let mut list: Vec<Tournament> = Catalogue::builtin().iter().cloned().collect();
        list[0].entry_fee = -1;
        assert!(matches!(
            Catalogue::new(list),
            Err(CatalogueError::Invalid { id: 1, .. })
        ));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": 9, "game": "Apex", "players": 60, "prize": 3000,
                "entryFee": 30, "date": "2024-05-01", "time": "21:00:00", "map": "Olympus"}}]"#
        )
        .unwrap();

        let catalogue = Catalogue::from_json_file(file.path()).unwrap();
        assert_eq!(catalogue.len(), 1);
        assert_eq!(catalogue.get(9).unwrap().entry_fee, 30);
    }

    #[test]
    fn test_from_json_file_malformed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            Catalogue::from_json_file(file.path()),
            Err(CatalogueError::Json(_))
        ));
    }
}
