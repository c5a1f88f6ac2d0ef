// Matchup generation
//
// Draw two distinct companies uniformly at random, issue a fresh verification
// code, persist the pending matchup.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::entities::Matchup;
use crate::error::{PrestigeError, Result};
use crate::store::{EntityStore, MatchupStore};

/// Owns the random source used for pairing. Seed it once per process.
pub struct MatchupGenerator<R = StdRng> {
    rng: R,
}

impl MatchupGenerator<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> MatchupGenerator<R> {
    pub fn new(rng: R) -> Self {
        MatchupGenerator { rng }
    }

    pub fn create<S>(&mut self, store: &S) -> Result<Matchup>
    where
        S: EntityStore + MatchupStore + ?Sized,
    {
        create_matchup(store, &mut self.rng)
    }
}

/// Pick a pair and persist an undecided matchup for it.
///
/// Fails with `NotFound` when fewer than two companies are stored.
pub fn create_matchup<S, R>(store: &S, rng: &mut R) -> Result<Matchup>
where
    S: EntityStore + MatchupStore + ?Sized,
    R: Rng + ?Sized,
{
    let companies = store.list_companies()?;
    if companies.len() < 2 {
        return Err(PrestigeError::NotFound(format!(
            "need at least 2 companies for a matchup, found {}",
            companies.len()
        )));
    }

    // Two distinct indices, uniform without replacement
    let picks = rand::seq::index::sample(rng, companies.len(), 2);
    let first = &companies[picks.index(0)];
    let second = &companies[picks.index(1)];

    // v4 codes come from the OS CSPRNG, not from `rng`
    let matchup = Matchup::new(first, second, Uuid::new_v4().to_string());
    store.put_matchup(&matchup)?;

    tracing::debug!(
        company1 = %matchup.company1,
        company2 = %matchup.company2,
        "matchup created"
    );
    Ok(matchup)
}
