// Leaderboard computation
//
// Order: winrate descending, then company name ascending. Ranks are 1-based
// positions in that order, so tied winrates get consecutive ranks.

use std::cmp::Ordering;

use crate::entities::Company;
use crate::error::{PrestigeError, Result};
use crate::store::EntityStore;

/// Full leaderboard with `rank` filled in. Read-only.
pub fn list_ranked<S>(store: &S) -> Result<Vec<Company>>
where
    S: EntityStore + ?Sized,
{
    let companies = store.list_companies()?;
    if companies.is_empty() {
        return Err(PrestigeError::NotFound("no companies to rank".to_string()));
    }
    Ok(rank_companies(companies))
}

/// One company with its leaderboard position
pub fn company_standing<S>(store: &S, name: &str) -> Result<Company>
where
    S: EntityStore + ?Sized,
{
    if store.get_company(name)?.is_none() {
        return Err(PrestigeError::NotFound(format!("company {}", name)));
    }

    list_ranked(store)?
        .into_iter()
        .find(|company| company.name == name)
        .ok_or_else(|| PrestigeError::NotFound(format!("company {}", name)))
}

pub fn rank_companies(mut companies: Vec<Company>) -> Vec<Company> {
    companies.sort_by(leaderboard_order);
    for (position, company) in companies.iter_mut().enumerate() {
        company.rank = position as u32 + 1;
    }
    companies
}

fn leaderboard_order(a: &Company, b: &Company) -> Ordering {
    b.winrate
        .total_cmp(&a.winrate)
        .then_with(|| a.name.cmp(&b.name))
}
