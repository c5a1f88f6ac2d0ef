// Vote resolution
//
// Validates a vote against a pending matchup and credits both companies.
// A verification code authorizes exactly one vote.

use crate::entities::{Matchup, Winner};
use crate::error::{PrestigeError, Result};
use crate::store::{Store, VoteCommit};

/// Who won and who lost a resolved matchup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteReceipt {
    pub winner: String,
    pub loser: String,
}

/// Resolve one vote.
///
/// Order matters: the selector is validated before any read, the matchup is
/// checked before the companies, and the decided flag is committed before (or
/// together with) the statistics so a replayed code can never count twice.
pub fn record_vote<S>(store: &S, verification_code: &str, winner: i64) -> Result<VoteReceipt>
where
    S: Store + ?Sized,
{
    let winner = Winner::try_from(winner)?;

    let matchup = store
        .get_matchup(verification_code)?
        .ok_or(PrestigeError::Unauthorized)?;
    if matchup.is_decided() {
        return Err(PrestigeError::Unauthorized);
    }

    ensure_companies_exist(store, &matchup)?;

    let (winner, loser) = matchup.sides(winner);
    match store.commit_vote(verification_code, winner, loser)? {
        VoteCommit::Applied => {}
        VoteCommit::AlreadyDecided => {
            tracing::warn!("verification code consumed by a concurrent vote");
            return Err(PrestigeError::Unauthorized);
        }
    }

    tracing::info!(%winner, %loser, "vote recorded");
    Ok(VoteReceipt {
        winner: winner.to_string(),
        loser: loser.to_string(),
    })
}

fn ensure_companies_exist<S>(store: &S, matchup: &Matchup) -> Result<()>
where
    S: Store + ?Sized,
{
    for name in [&matchup.company1, &matchup.company2] {
        if store.get_company(name)?.is_none() {
            tracing::error!(company = %name, "matchup references a missing company");
            return Err(PrestigeError::NotFound(format!("company {}", name)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Company, Matchup, VoteStatus};
    use crate::store::{MatchupStore, MemoryStore, SqliteStore};
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn company(name: &str, wins: u32, losses: u32) -> Company {
        let mut company = Company::new(name, format!("{}.png", name));
        company.wins = wins;
        company.losses = losses;
        company.matches = wins + losses;
        company.winrate = company.computed_winrate();
        company
    }

    /// Store with A (3-1) and B (1-1) and one pending matchup A vs B
    fn setup<S: Store>(store: S) -> S {
        store.insert_company(&company("A", 3, 1)).unwrap();
        store.insert_company(&company("B", 1, 1)).unwrap();
        store
            .put_matchup(&Matchup::new(
                &company("A", 0, 0),
                &company("B", 0, 0),
                "T".to_string(),
            ))
            .unwrap();
        store
    }

    fn stats(store: &impl Store, name: &str) -> (u32, u32, u32, f64) {
        let c = store.get_company(name).unwrap().unwrap();
        (c.matches, c.wins, c.losses, c.winrate)
    }

    #[test]
    fn test_first_wins() {
        let store = setup(MemoryStore::new());

        let receipt = record_vote(&store, "T", 1).unwrap();

        assert_eq!(receipt.winner, "A");
        assert_eq!(receipt.loser, "B");
        assert_eq!(stats(&store, "A"), (5, 4, 1, 4.0 / 5.0));
        assert_eq!(stats(&store, "B"), (3, 1, 2, 1.0 / 3.0));
        assert!(store.get_matchup("T").unwrap().unwrap().is_decided());
    }

    #[test]
    fn test_second_wins_sqlite() {
        let store = setup(SqliteStore::open_in_memory().unwrap());

        record_vote(&store, "T", 2).unwrap();

        assert_eq!(stats(&store, "A"), (5, 3, 2, 3.0 / 5.0));
        assert_eq!(stats(&store, "B"), (3, 2, 1, 2.0 / 3.0));
        assert_eq!(
            store.get_matchup("T").unwrap().unwrap().voted,
            VoteStatus::Decided
        );
    }

    #[test]
    fn test_replay_is_rejected_without_changes() {
        let store = setup(MemoryStore::new());
        record_vote(&store, "T", 1).unwrap();
        let before = (stats(&store, "A"), stats(&store, "B"));

        for winner in [1, 2] {
            let err = record_vote(&store, "T", winner).unwrap_err();
            assert!(matches!(err, PrestigeError::Unauthorized));
        }
        assert_eq!((stats(&store, "A"), stats(&store, "B")), before);
    }

    #[test]
    fn test_invalid_winner_mutates_nothing() {
        let store = setup(MemoryStore::new());

        for winner in [0, 3, -2] {
            let err = record_vote(&store, "T", winner).unwrap_err();
            assert!(matches!(err, PrestigeError::Validation(_)));
        }
        assert!(!store.get_matchup("T").unwrap().unwrap().is_decided());
        assert_eq!(stats(&store, "A"), (4, 3, 1, 0.75));
    }

    #[test]
    fn test_invalid_winner_checked_before_code() {
        let store = MemoryStore::new();
        let err = record_vote(&store, "nope", 9).unwrap_err();
        assert!(matches!(err, PrestigeError::Validation(_)));
    }

    #[test]
    fn test_unknown_code_is_unauthorized() {
        let store = setup(MemoryStore::new());
        let err = record_vote(&store, "not-a-code", 1).unwrap_err();
        assert!(matches!(err, PrestigeError::Unauthorized));
    }

    #[test]
    fn test_missing_company_is_not_found() {
        let store = MemoryStore::with_companies([company("A", 0, 0)]);
        store
            .put_matchup(&Matchup::new(
                &company("A", 0, 0),
                &company("Ghost", 0, 0),
                "T".to_string(),
            ))
            .unwrap();

        let err = record_vote(&store, "T", 1).unwrap_err();

        assert!(matches!(err, PrestigeError::NotFound(_)));
        // Rejected before the commit point
        assert!(!store.get_matchup("T").unwrap().unwrap().is_decided());
        assert_eq!(stats(&store, "A").0, 0);
    }

    #[test]
    fn test_partial_failure_then_retry_is_rejected() {
        let store = setup(MemoryStore::new());
        store.fail_updates_for(Some("B"));

        let err = record_vote(&store, "T", 1).unwrap_err();
        assert!(matches!(err, PrestigeError::Store(_)));

        store.fail_updates_for(None);
        let err = record_vote(&store, "T", 1).unwrap_err();
        assert!(matches!(err, PrestigeError::Unauthorized));
        assert_eq!(stats(&store, "A"), (5, 4, 1, 0.8));
        assert_eq!(stats(&store, "B"), (2, 1, 1, 0.5));
    }

    #[test]
    fn test_concurrent_votes_on_one_code_count_once() {
        let store = Arc::new(setup(SqliteStore::open_in_memory().unwrap()));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    record_vote(&*store, "T", 1 + (i % 2)).is_ok()
                })
            })
            .collect();

        let successes = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();

        assert_eq!(successes, 1);
        let (a, b) = (stats(&*store, "A"), stats(&*store, "B"));
        assert_eq!(a.0 + b.0, 4 + 2 + 2);
        assert_eq!(a.1 + b.1, 3 + 1 + 1);
    }

    /// N matchups all pairing A against a distinct rival, voted for A in parallel
    fn vote_shared_company_in_parallel<S: Store + 'static>(store: S, rounds: usize) -> Arc<S> {
        store.insert_company(&company("A", 0, 0)).unwrap();
        for i in 0..rounds {
            let rival = company(&format!("R{}", i), 0, 0);
            store.insert_company(&rival).unwrap();
            store
                .put_matchup(&Matchup::new(&company("A", 0, 0), &rival, format!("code-{}", i)))
                .unwrap();
        }

        let store = Arc::new(store);
        let barrier = Arc::new(Barrier::new(rounds));
        let handles: Vec<_> = (0..rounds)
            .map(|i| {
                let store = Arc::clone(&store);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    record_vote(&*store, &format!("code-{}", i), 1)
                })
            })
            .collect();

        for handle in handles {
            let receipt = handle.join().unwrap().unwrap();
            assert_eq!(receipt.winner, "A");
        }
        store
    }

    fn assert_shared_company_credited<S: Store>(store: &S, rounds: usize) {
        let n = rounds as u32;
        assert_eq!(stats(store, "A"), (n, n, 0, 1.0));
        for i in 0..rounds {
            assert_eq!(stats(store, &format!("R{}", i)), (1, 0, 1, 0.0));
        }

        let report = crate::integrity::check_integrity(store).unwrap();
        assert!(report.is_clean(), "{:?}", report.issues);
        assert_eq!(report.decided_matchups, rounds as u64);
    }

    #[test]
    fn test_concurrent_votes_sharing_a_company_sqlite() {
        let store = vote_shared_company_in_parallel(SqliteStore::open_in_memory().unwrap(), 24);
        assert_shared_company_credited(&*store, 24);
    }

    #[test]
    fn test_concurrent_votes_sharing_a_company_memory() {
        let store = vote_shared_company_in_parallel(MemoryStore::new(), 24);
        assert_shared_company_credited(&*store, 24);
    }
}
