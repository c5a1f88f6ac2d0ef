// Entity Models
//
// Company: the ranked thing, keyed by name
// Matchup: a one-time comparison between two companies, keyed by verification code

pub mod company;
pub mod matchup;

pub use company::{Company, Outcome};
pub use matchup::{Matchup, VoteStatus, Winner};
