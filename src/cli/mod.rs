//! CLI command implementations

mod run;
pub mod style;

pub use run::{RunOptions, run_automerge};

use anstream::println;
use automerge::merge::{MAX_TRIES, Outcome, Progress};
use std::time::Duration;
use style::{CHECK, CROSS, Stylize};

/// Progress reporter printing one line per event to stdout
pub struct CliProgress;

impl Progress for CliProgress {
    fn on_backoff(&self, number: u64, delay: Duration) {
        println!(
            "{}",
            format!("Waiting {}s before retrying PR #{number}...", delay.as_secs()).muted()
        );
    }

    fn on_attempt(&self, number: u64, tries: u32) {
        println!(
            "{} {} {}",
            "Evaluating".emphasis(),
            format!("PR #{number}").accent(),
            format!("(attempt {}/{MAX_TRIES})", tries + 1).muted()
        );
    }

    fn on_outcome(&self, number: u64, outcome: &Outcome) {
        match outcome {
            Outcome::Merged { sha } => println!(
                "  {} PR #{number} merged {}",
                CHECK.success(),
                sha.as_deref().unwrap_or("(no sha)").muted()
            ),
            Outcome::DryRun { method } => println!(
                "  {} PR #{number} would be merged ({})",
                "?".warn(),
                method.map_or_else(|| "default method".to_string(), |m| m.to_string())
            ),
            Outcome::Skipped(reason) => {
                println!("  {} PR #{number}: {}", "Skipping".warn(), reason.muted());
            }
            Outcome::RetryRequested { error } => println!(
                "  {} PR #{number}: {}",
                "Merge failed, will retry".warn(),
                error.muted()
            ),
            Outcome::Failed { error } => {
                println!("  {} PR #{number}: {error}", CROSS.error());
            }
        }
    }

    fn on_separator(&self) {
        println!();
    }
}
