// Prestige - pairwise "this or that" ranking service
// Core library: entities, stores, matchup/vote/ranking logic, HTTP API

pub mod config;
pub mod entities;
pub mod error;
pub mod generator;
pub mod import;
pub mod integrity;
pub mod ranking;
pub mod store;
pub mod telemetry;
pub mod vote;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::{ConfigError, ServerConfig};
pub use entities::{Company, Matchup, Outcome, VoteStatus, Winner};
pub use error::{PrestigeError, StoreError};
pub use generator::{create_matchup, MatchupGenerator};
pub use import::{import_companies, load_csv, ImportSummary};
pub use integrity::{check_integrity, IntegrityIssue, IntegrityReport};
pub use ranking::{company_standing, list_ranked};
pub use store::{EntityStore, MatchupStore, MemoryStore, SqliteStore, Store, VoteCommit};
pub use vote::{record_vote, VoteReceipt};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
