// In-memory store
//
// Everything behind one mutex. Used by tests and for running the server
// without a database file. Supports injecting a failure on statistics updates
// for a given company, to exercise the sequential vote commit path.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use super::{EntityStore, MatchupStore, Store};
use crate::entities::{Company, Matchup, Outcome, VoteStatus};
use crate::error::{StoreError, StoreResult};

#[derive(Default)]
struct MemoryState {
    companies: BTreeMap<String, Company>,
    matchups: HashMap<String, Matchup>,
    failing_updates: Option<String>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with companies (stats taken as given)
    pub fn with_companies(companies: impl IntoIterator<Item = Company>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.lock() {
            for company in companies {
                state.companies.insert(company.name.clone(), company);
            }
        }
        store
    }

    /// Make `apply_outcome` fail for this company until cleared with `None`
    pub fn fail_updates_for(&self, name: Option<&str>) {
        if let Ok(mut state) = self.state.lock() {
            state.failing_updates = name.map(str::to_string);
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, MemoryState>> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl EntityStore for MemoryStore {
    fn get_company(&self, name: &str) -> StoreResult<Option<Company>> {
        Ok(self.lock()?.companies.get(name).cloned())
    }

    fn list_companies(&self) -> StoreResult<Vec<Company>> {
        Ok(self.lock()?.companies.values().cloned().collect())
    }

    fn insert_company(&self, company: &Company) -> StoreResult<bool> {
        let mut state = self.lock()?;
        if state.companies.contains_key(&company.name) {
            return Ok(false);
        }
        let mut stored = company.clone();
        stored.rank = 0;
        state.companies.insert(stored.name.clone(), stored);
        Ok(true)
    }

    fn apply_outcome(&self, name: &str, outcome: Outcome) -> StoreResult<()> {
        let mut state = self.lock()?;
        if state.failing_updates.as_deref() == Some(name) {
            return Err(StoreError::Unavailable(format!(
                "injected failure updating {}",
                name
            )));
        }
        let company = state
            .companies
            .get_mut(name)
            .ok_or_else(|| StoreError::MissingCompany(name.to_string()))?;
        company.record(outcome);
        Ok(())
    }
}

impl MatchupStore for MemoryStore {
    fn get_matchup(&self, verification_code: &str) -> StoreResult<Option<Matchup>> {
        Ok(self.lock()?.matchups.get(verification_code).cloned())
    }

    fn put_matchup(&self, matchup: &Matchup) -> StoreResult<()> {
        let mut state = self.lock()?;
        if state.matchups.contains_key(&matchup.verification_code) {
            return Err(StoreError::Duplicate(matchup.verification_code.clone()));
        }
        state
            .matchups
            .insert(matchup.verification_code.clone(), matchup.clone());
        Ok(())
    }

    fn decide_matchup(
        &self,
        verification_code: &str,
        decided_at: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut state = self.lock()?;
        match state.matchups.get_mut(verification_code) {
            Some(matchup) if matchup.voted == VoteStatus::Undecided => {
                matchup.voted = VoteStatus::Decided;
                matchup.decided_at = Some(decided_at);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn count_matchups(&self, status: VoteStatus) -> StoreResult<u64> {
        let state = self.lock()?;
        Ok(state.matchups.values().filter(|m| m.voted == status).count() as u64)
    }
}

// Sequential commit from the trait default
impl Store for MemoryStore {}
