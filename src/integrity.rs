// 🩺 Integrity check - make partial vote commits observable
//
// A vote that failed halfway (matchup decided, only one company credited)
// is never repaired automatically. This scan is how an operator finds it.
//
// Checks:
// - per company: matches == wins + losses
// - per company: stored winrate == wins / matches
// - across companies: total wins == total losses (every vote adds one of each)

use serde::Serialize;

use crate::entities::company::winrate;
use crate::entities::VoteStatus;
use crate::error::Result;
use crate::store::Store;

const WINRATE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegrityIssue {
    CounterMismatch {
        company: String,
        matches: u32,
        wins: u32,
        losses: u32,
    },
    WinrateDrift {
        company: String,
        stored: f64,
        expected: f64,
    },
    LedgerImbalance {
        total_wins: u64,
        total_losses: u64,
    },
}

impl IntegrityIssue {
    pub fn describe(&self) -> String {
        match self {
            IntegrityIssue::CounterMismatch {
                company,
                matches,
                wins,
                losses,
            } => format!(
                "{}: {} matches but {} wins + {} losses",
                company, matches, wins, losses
            ),
            IntegrityIssue::WinrateDrift {
                company,
                stored,
                expected,
            } => format!(
                "{}: stored winrate {:.6}, counters give {:.6}",
                company, stored, expected
            ),
            IntegrityIssue::LedgerImbalance {
                total_wins,
                total_losses,
            } => format!(
                "{} wins recorded against {} losses (partial vote commit?)",
                total_wins, total_losses
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IntegrityReport {
    pub companies_checked: usize,
    pub decided_matchups: u64,
    pub issues: Vec<IntegrityIssue>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} companies, {} decided matchups, {} issues",
            self.companies_checked,
            self.decided_matchups,
            self.issues.len()
        )
    }
}

pub fn check_integrity<S>(store: &S) -> Result<IntegrityReport>
where
    S: Store + ?Sized,
{
    let companies = store.list_companies()?;
    let decided_matchups = store.count_matchups(VoteStatus::Decided)?;

    let mut issues = Vec::new();
    let mut total_wins: u64 = 0;
    let mut total_losses: u64 = 0;

    for company in &companies {
        total_wins += u64::from(company.wins);
        total_losses += u64::from(company.losses);

        if u64::from(company.matches) != u64::from(company.wins) + u64::from(company.losses) {
            issues.push(IntegrityIssue::CounterMismatch {
                company: company.name.clone(),
                matches: company.matches,
                wins: company.wins,
                losses: company.losses,
            });
        }

        let expected = winrate(company.wins, company.matches);
        if (company.winrate - expected).abs() > WINRATE_TOLERANCE {
            issues.push(IntegrityIssue::WinrateDrift {
                company: company.name.clone(),
                stored: company.winrate,
                expected,
            });
        }
    }

    if total_wins != total_losses {
        issues.push(IntegrityIssue::LedgerImbalance {
            total_wins,
            total_losses,
        });
    }

    for issue in &issues {
        tracing::warn!(issue = %issue.describe(), "integrity issue");
    }

    Ok(IntegrityReport {
        companies_checked: companies.len(),
        decided_matchups,
        issues,
    })
}
