// ⚔️ Matchup Entity - one pending "this or that" comparison
//
// The verification code is the identity and the one-time vote credential.
// Names and images are copied from the companies at creation time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::company::Company;
use crate::error::PrestigeError;

// ============================================================================
// VOTE STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteStatus {
    Undecided,
    Decided,
}

impl VoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteStatus::Undecided => "undecided",
            VoteStatus::Decided => "decided",
        }
    }
}

impl fmt::Display for VoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "undecided" => Ok(VoteStatus::Undecided),
            "decided" => Ok(VoteStatus::Decided),
            other => Err(format!("unknown vote status {:?}", other)),
        }
    }
}

// ============================================================================
// WINNER SELECTOR
// ============================================================================

/// Which side of a matchup won: 1 is `company1`, 2 is `company2`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Winner {
    First,
    Second,
}

impl TryFrom<i64> for Winner {
    type Error = PrestigeError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Winner::First),
            2 => Ok(Winner::Second),
            other => Err(PrestigeError::Validation(format!(
                "winner must be 1 or 2, got {}",
                other
            ))),
        }
    }
}

// ============================================================================
// MATCHUP ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Matchup {
    pub company1: String,
    pub company2: String,
    pub image1: String,
    pub image2: String,
    pub verification_code: String,
    pub voted: VoteStatus,

    #[serde(skip)]
    pub created_at: DateTime<Utc>,

    #[serde(skip)]
    pub decided_at: Option<DateTime<Utc>>,
}

impl Matchup {
    /// New undecided matchup between two companies
    pub fn new(first: &Company, second: &Company, verification_code: String) -> Self {
        Matchup {
            company1: first.name.clone(),
            company2: second.name.clone(),
            image1: first.image.clone(),
            image2: second.image.clone(),
            verification_code,
            voted: VoteStatus::Undecided,
            created_at: Utc::now(),
            decided_at: None,
        }
    }

    pub fn is_decided(&self) -> bool {
        self.voted == VoteStatus::Decided
    }

    /// (winner, loser) company names for a selector
    pub fn sides(&self, winner: Winner) -> (&str, &str) {
        match winner {
            Winner::First => (&self.company1, &self.company2),
            Winner::Second => (&self.company2, &self.company1),
        }
    }
}
