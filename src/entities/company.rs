// 🏢 Company Entity - the thing being ranked
//
// Name is the identity (store key). Statistics only ever grow, and the
// stored winrate always tracks wins / matches.

use serde::{Deserialize, Serialize};

// ============================================================================
// OUTCOME
// ============================================================================

/// Result of one decided matchup from a single company's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
}

impl Outcome {
    pub fn wins_delta(&self) -> u32 {
        match self {
            Outcome::Win => 1,
            Outcome::Loss => 0,
        }
    }

    pub fn losses_delta(&self) -> u32 {
        match self {
            Outcome::Win => 0,
            Outcome::Loss => 1,
        }
    }
}

// ============================================================================
// COMPANY ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    /// Unique name, also the store key
    #[serde(rename = "company")]
    pub name: String,

    /// Image reference shown next to the name
    pub image: String,

    pub matches: u32,
    pub wins: u32,
    pub losses: u32,

    /// Stored win rate, kept equal to wins / matches by every store
    pub winrate: f64,

    /// Leaderboard position. Computed at read time, never stored; 0 = unranked
    #[serde(rename = "ranking", default)]
    pub rank: u32,
}

impl Company {
    /// Freshly provisioned company with no matches played
    pub fn new(name: impl Into<String>, image: impl Into<String>) -> Self {
        Company {
            name: name.into(),
            image: image.into(),
            matches: 0,
            wins: 0,
            losses: 0,
            winrate: 0.0,
            rank: 0,
        }
    }

    /// Win rate implied by the counters
    pub fn computed_winrate(&self) -> f64 {
        winrate(self.wins, self.matches)
    }

    /// Apply one matchup result to the counters and refresh the win rate
    pub fn record(&mut self, outcome: Outcome) {
        self.matches += 1;
        self.wins += outcome.wins_delta();
        self.losses += outcome.losses_delta();
        self.winrate = self.computed_winrate();
    }
}

/// wins / matches, 0 when nothing has been played
pub fn winrate(wins: u32, matches: u32) -> f64 {
    if matches == 0 {
        0.0
    } else {
        f64::from(wins) / f64::from(matches)
    }
}
