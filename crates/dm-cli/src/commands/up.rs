//! Up command implementation

use anyhow::Result;

use crate::cli::GlobalArgs;
use crate::commands::common::{print_migrated, ExitCode, Session};

/// Execute the up command
pub(crate) async fn execute(global: &GlobalArgs) -> Result<()> {
    let session = Session::open(global)?;
    match session.migrator.up(&session.db, &session.client).await {
        Ok(migrated) => {
            if migrated.is_empty() {
                log::info!("No pending migrations");
            }
            print_migrated("MIGRATED UP", &migrated);
            Ok(())
        }
        Err(err) => {
            print_migrated("MIGRATED UP", err.migrated());
            eprintln!("ERROR: {}", err);
            Err(ExitCode(1).into())
        }
    }
}
