//! Guard command: check SQL against the single-table read-only policy

use anyhow::Result;
use tt_sql::SqlGuard;

use crate::cli::GuardArgs;
use crate::commands::common::ExitCode;

/// Execute the guard command
pub(crate) fn execute(args: &GuardArgs) -> Result<()> {
    let guard = SqlGuard::default();
    match guard.evaluate(&args.sql).into_result() {
        Ok(()) => {
            println!("allowed");
            Ok(())
        }
        Err(reason) => {
            println!("rejected: {reason}");
            Err(ExitCode(1).into())
        }
    }
}
