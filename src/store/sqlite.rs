// SQLite-backed store
//
// One connection behind a mutex, WAL journal. Companies and matchups live in
// two tables keyed by company name and verification code.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use super::{EntityStore, MatchupStore, Store, VoteCommit};
use crate::entities::{Company, Matchup, Outcome, VoteStatus};
use crate::error::{StoreError, StoreResult};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file and make sure the schema exists
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> StoreResult<Self> {
        setup_database(&conn)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

pub fn setup_database(conn: &Connection) -> StoreResult<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS companies (
            company TEXT PRIMARY KEY NOT NULL,
            image TEXT NOT NULL,
            matches INTEGER NOT NULL DEFAULT 0,
            wins INTEGER NOT NULL DEFAULT 0,
            losses INTEGER NOT NULL DEFAULT 0,
            winrate REAL NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS matchups (
            verification_code TEXT PRIMARY KEY NOT NULL,
            company1 TEXT NOT NULL,
            company2 TEXT NOT NULL,
            image1 TEXT NOT NULL,
            image2 TEXT NOT NULL,
            voted TEXT NOT NULL,
            created_at TEXT NOT NULL,
            decided_at TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_matchups_voted ON matchups(voted)",
        [],
    )?;

    Ok(())
}

// ============================================================================
// Row helpers (shared by the plain and transactional paths)
// ============================================================================

fn company_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Company> {
    Ok(Company {
        name: row.get(0)?,
        image: row.get(1)?,
        matches: row.get(2)?,
        wins: row.get(3)?,
        losses: row.get(4)?,
        winrate: row.get(5)?,
        rank: 0,
    })
}

/// Raw matchup columns; status and timestamps are decoded afterwards so a bad
/// value surfaces as `StoreError::Corrupt` rather than a generic sqlite error.
struct MatchupRow {
    verification_code: String,
    company1: String,
    company2: String,
    image1: String,
    image2: String,
    voted: String,
    created_at: String,
    decided_at: Option<String>,
}

impl MatchupRow {
    fn into_matchup(self) -> StoreResult<Matchup> {
        let key = self.verification_code.clone();
        let voted = self
            .voted
            .parse::<VoteStatus>()
            .map_err(|reason| StoreError::Corrupt {
                key: key.clone(),
                reason,
            })?;
        let created_at = parse_timestamp(&key, &self.created_at)?;
        let decided_at = match self.decided_at {
            Some(s) => Some(parse_timestamp(&key, &s)?),
            None => None,
        };

        Ok(Matchup {
            company1: self.company1,
            company2: self.company2,
            image1: self.image1,
            image2: self.image2,
            verification_code: self.verification_code,
            voted,
            created_at,
            decided_at,
        })
    }
}

fn parse_timestamp(key: &str, value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt {
            key: key.to_string(),
            reason: format!("bad timestamp {:?}: {}", value, e),
        })
}

fn decide_in(conn: &Connection, code: &str, decided_at: DateTime<Utc>) -> StoreResult<bool> {
    let changed = conn.execute(
        "UPDATE matchups SET voted = ?2, decided_at = ?3
         WHERE verification_code = ?1 AND voted = ?4",
        params![
            code,
            VoteStatus::Decided.as_str(),
            decided_at.to_rfc3339(),
            VoteStatus::Undecided.as_str(),
        ],
    )?;
    Ok(changed == 1)
}

/// SET expressions see the pre-update row, so winrate is computed from the
/// same counters the increments apply to.
fn apply_outcome_in(conn: &Connection, name: &str, outcome: Outcome) -> StoreResult<()> {
    let changed = conn.execute(
        "UPDATE companies
         SET matches = matches + 1,
             wins = wins + ?2,
             losses = losses + ?3,
             winrate = CAST(wins + ?2 AS REAL) / (matches + 1)
         WHERE company = ?1",
        params![name, outcome.wins_delta(), outcome.losses_delta()],
    )?;
    if changed == 0 {
        return Err(StoreError::MissingCompany(name.to_string()));
    }
    Ok(())
}

// ============================================================================
// Store implementations
// ============================================================================

impl EntityStore for SqliteStore {
    fn get_company(&self, name: &str) -> StoreResult<Option<Company>> {
        let conn = self.lock()?;
        let company = conn
            .query_row(
                "SELECT company, image, matches, wins, losses, winrate
                 FROM companies WHERE company = ?1",
                [name],
                company_from_row,
            )
            .optional()?;
        Ok(company)
    }

    fn list_companies(&self) -> StoreResult<Vec<Company>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT company, image, matches, wins, losses, winrate FROM companies",
        )?;
        let companies = stmt
            .query_map([], company_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(companies)
    }

    fn insert_company(&self, company: &Company) -> StoreResult<bool> {
        let conn = self.lock()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO companies (company, image, matches, wins, losses, winrate)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                company.name,
                company.image,
                company.matches,
                company.wins,
                company.losses,
                company.winrate,
            ],
        )?;
        Ok(inserted == 1)
    }

    fn apply_outcome(&self, name: &str, outcome: Outcome) -> StoreResult<()> {
        let conn = self.lock()?;
        apply_outcome_in(&conn, name, outcome)
    }
}

impl MatchupStore for SqliteStore {
    fn get_matchup(&self, verification_code: &str) -> StoreResult<Option<Matchup>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT verification_code, company1, company2, image1, image2,
                        voted, created_at, decided_at
                 FROM matchups WHERE verification_code = ?1",
                [verification_code],
                |row| {
                    Ok(MatchupRow {
                        verification_code: row.get(0)?,
                        company1: row.get(1)?,
                        company2: row.get(2)?,
                        image1: row.get(3)?,
                        image2: row.get(4)?,
                        voted: row.get(5)?,
                        created_at: row.get(6)?,
                        decided_at: row.get(7)?,
                    })
                },
            )
            .optional()?;

        row.map(MatchupRow::into_matchup).transpose()
    }

    fn put_matchup(&self, matchup: &Matchup) -> StoreResult<()> {
        let conn = self.lock()?;
        let result = conn.execute(
            "INSERT INTO matchups (
                verification_code, company1, company2, image1, image2,
                voted, created_at, decided_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                matchup.verification_code,
                matchup.company1,
                matchup.company2,
                matchup.image1,
                matchup.image2,
                matchup.voted.as_str(),
                matchup.created_at.to_rfc3339(),
                matchup.decided_at.map(|dt| dt.to_rfc3339()),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Duplicate(matchup.verification_code.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn decide_matchup(
        &self,
        verification_code: &str,
        decided_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let conn = self.lock()?;
        decide_in(&conn, verification_code, decided_at)
    }

    fn count_matchups(&self, status: VoteStatus) -> StoreResult<u64> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM matchups WHERE voted = ?1",
            [status.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

impl Store for SqliteStore {
    /// Decide + both statistic updates in one IMMEDIATE transaction. Any
    /// failure rolls everything back, including the decided flag.
    fn commit_vote(
        &self,
        verification_code: &str,
        winner: &str,
        loser: &str,
    ) -> StoreResult<VoteCommit> {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !decide_in(&tx, verification_code, Utc::now())? {
            return Ok(VoteCommit::AlreadyDecided);
        }
        apply_outcome_in(&tx, winner, Outcome::Win)?;
        apply_outcome_in(&tx, loser, Outcome::Loss)?;

        tx.commit()?;
        Ok(VoteCommit::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_company(&Company::new("Acme", "acme.png")).unwrap();
        store.insert_company(&Company::new("Globex", "globex.png")).unwrap();
        store
    }

    fn matchup(code: &str) -> Matchup {
        Matchup::new(
            &Company::new("Acme", "acme.png"),
            &Company::new("Globex", "globex.png"),
            code.to_string(),
        )
    }

    #[test]
    fn test_company_round_trip() {
        let store = SqliteStore::open_in_memory().unwrap();
        let company = Company {
            name: "Initech".to_string(),
            image: "https://img.example/initech.png".to_string(),
            matches: 7,
            wins: 5,
            losses: 2,
            winrate: 5.0 / 7.0,
            rank: 0,
        };

        assert!(store.insert_company(&company).unwrap());
        assert_eq!(store.get_company("Initech").unwrap(), Some(company));
        assert_eq!(store.get_company("Nobody").unwrap(), None);
    }

    #[test]
    fn test_insert_company_keeps_existing_stats() {
        let store = seeded_store();
        store.apply_outcome("Acme", Outcome::Win).unwrap();

        let inserted = store.insert_company(&Company::new("Acme", "other.png")).unwrap();

        assert!(!inserted);
        let acme = store.get_company("Acme").unwrap().unwrap();
        assert_eq!(acme.image, "acme.png");
        assert_eq!(acme.wins, 1);
    }

    #[test]
    fn test_matchup_round_trip() {
        let store = seeded_store();
        let mut decided = matchup("code-decided");
        decided.voted = VoteStatus::Decided;
        decided.decided_at = Some(Utc::now());

        store.put_matchup(&matchup("code-open")).unwrap();
        store.put_matchup(&decided).unwrap();

        let open = store.get_matchup("code-open").unwrap().unwrap();
        assert_eq!(open.voted, VoteStatus::Undecided);
        assert_eq!(store.get_matchup("code-decided").unwrap(), Some(decided));
        assert_eq!(store.get_matchup("missing").unwrap(), None);
    }

    #[test]
    fn test_put_matchup_rejects_duplicate_code() {
        let store = seeded_store();
        store.put_matchup(&matchup("code-1")).unwrap();

        let err = store.put_matchup(&matchup("code-1")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(code) if code == "code-1"));
    }

    #[test]
    fn test_decide_matchup_only_once() {
        let store = seeded_store();
        store.put_matchup(&matchup("code-1")).unwrap();

        assert!(store.decide_matchup("code-1", Utc::now()).unwrap());
        assert!(!store.decide_matchup("code-1", Utc::now()).unwrap());
        assert!(!store.decide_matchup("unknown", Utc::now()).unwrap());

        let stored = store.get_matchup("code-1").unwrap().unwrap();
        assert!(stored.is_decided());
        assert!(stored.decided_at.is_some());
        assert_eq!(store.count_matchups(VoteStatus::Decided).unwrap(), 1);
        assert_eq!(store.count_matchups(VoteStatus::Undecided).unwrap(), 0);
    }

    #[test]
    fn test_apply_outcome_recomputes_winrate() {
        let store = seeded_store();
        store.apply_outcome("Acme", Outcome::Win).unwrap();
        store.apply_outcome("Acme", Outcome::Loss).unwrap();
        store.apply_outcome("Acme", Outcome::Win).unwrap();

        let acme = store.get_company("Acme").unwrap().unwrap();
        assert_eq!((acme.matches, acme.wins, acme.losses), (3, 2, 1));
        assert!((acme.winrate - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_apply_outcome_missing_company() {
        let store = seeded_store();
        let err = store.apply_outcome("Nobody", Outcome::Win).unwrap_err();
        assert!(matches!(err, StoreError::MissingCompany(name) if name == "Nobody"));
    }

    #[test]
    fn test_commit_vote_applies_everything() {
        let store = seeded_store();
        store.put_matchup(&matchup("code-1")).unwrap();

        let commit = store.commit_vote("code-1", "Globex", "Acme").unwrap();

        assert_eq!(commit, VoteCommit::Applied);
        let globex = store.get_company("Globex").unwrap().unwrap();
        let acme = store.get_company("Acme").unwrap().unwrap();
        assert_eq!((globex.matches, globex.wins, globex.winrate), (1, 1, 1.0));
        assert_eq!((acme.matches, acme.losses, acme.winrate), (1, 1, 0.0));
        assert_eq!(
            store.commit_vote("code-1", "Globex", "Acme").unwrap(),
            VoteCommit::AlreadyDecided
        );
    }

    #[test]
    fn test_commit_vote_rolls_back_on_failure() {
        let store = seeded_store();
        store.put_matchup(&matchup("code-1")).unwrap();

        let err = store.commit_vote("code-1", "Acme", "Vanished").unwrap_err();
        assert!(matches!(err, StoreError::MissingCompany(_)));

        // Nothing from the failed commit is visible
        let stored = store.get_matchup("code-1").unwrap().unwrap();
        assert_eq!(stored.voted, VoteStatus::Undecided);
        let acme = store.get_company("Acme").unwrap().unwrap();
        assert_eq!(acme.matches, 0);
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prestige.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.insert_company(&Company::new("Acme", "acme.png")).unwrap();
            store.apply_outcome("Acme", Outcome::Win).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        let acme = store.get_company("Acme").unwrap().unwrap();
        assert_eq!(acme.wins, 1);
        assert_eq!(acme.winrate, 1.0);
    }
}
