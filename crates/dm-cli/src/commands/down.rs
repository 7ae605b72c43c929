//! Down command implementation

use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::commands::common::{print_migrated, ExitCode, Session};

/// Execute the down command
pub(crate) async fn execute(global: &GlobalArgs) -> Result<()> {
    let session = Session::open(global)?;
    match session.migrator.down(&session.db, &session.client).await {
        Ok(reverted) => {
            if reverted.is_empty() {
                log::info!("No applied migrations to revert");
            }
            print_migrated("MIGRATED DOWN", &reverted);
            Ok(())
        }
        Err(err) => {
            eprintln!("ERROR: {}", err);
            Err(ExitCode(1).into())
        }
    }
}
