// Store contracts consumed by the ranking core
//
// The core never talks to a database directly: it gets a `&S where S: Store`
// (or an `Arc<dyn Store>` in the server) and uses only the operations below.

pub mod memory;
pub mod sqlite;

use chrono::{DateTime, Utc};

use crate::entities::{Company, Matchup, Outcome, VoteStatus};
use crate::error::StoreResult;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Companies keyed by name
pub trait EntityStore {
    fn get_company(&self, name: &str) -> StoreResult<Option<Company>>;

    /// Full scan, in no particular order
    fn list_companies(&self) -> StoreResult<Vec<Company>>;

    /// Insert a company unless one with the same name exists.
    /// Returns whether a row was inserted.
    fn insert_company(&self, company: &Company) -> StoreResult<bool>;

    /// Atomically bump matches and wins/losses, and set winrate from the
    /// post-increment counters. Fails with `MissingCompany` if absent.
    fn apply_outcome(&self, name: &str, outcome: Outcome) -> StoreResult<()>;
}

/// Matchups keyed by verification code
pub trait MatchupStore {
    fn get_matchup(&self, verification_code: &str) -> StoreResult<Option<Matchup>>;

    fn put_matchup(&self, matchup: &Matchup) -> StoreResult<()>;

    /// Conditional transition undecided -> decided. Returns false when the
    /// code is unknown or was already decided.
    fn decide_matchup(&self, verification_code: &str, decided_at: DateTime<Utc>)
        -> StoreResult<bool>;

    fn count_matchups(&self, status: VoteStatus) -> StoreResult<u64>;
}

/// What happened when a vote was committed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteCommit {
    Applied,
    /// Another vote consumed the code first; nothing was written
    AlreadyDecided,
}

pub trait Store: EntityStore + MatchupStore + Send + Sync {
    /// Decide the matchup, then credit the winner and the loser.
    ///
    /// The default runs three independent writes in that order. If a write
    /// after the decide step fails, the matchup stays decided with the
    /// companies partly updated; `integrity::check_integrity` reports it.
    /// Stores with transactions override this to commit all-or-nothing.
    fn commit_vote(
        &self,
        verification_code: &str,
        winner: &str,
        loser: &str,
    ) -> StoreResult<VoteCommit> {
        if !self.decide_matchup(verification_code, Utc::now())? {
            return Ok(VoteCommit::AlreadyDecided);
        }
        self.apply_outcome(winner, Outcome::Win)?;
        self.apply_outcome(loser, Outcome::Loss)?;
        Ok(VoteCommit::Applied)
    }
}
