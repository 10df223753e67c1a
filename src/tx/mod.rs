//! Transaction intents and the replacement submission procedure

pub mod intent;
pub mod replace;

pub use intent::{ReplacementPair, TxIntent};
pub use replace::{ReplacementReport, ReplacementSubmitter, SubmissionOutcome};
