//! Create command implementation - scaffolds a new migration file

use anyhow::{Context, Result};

use crate::cli::{CreateArgs, GlobalArgs};
use crate::commands::common::Project;

/// Execute the create command
pub(crate) async fn execute(args: &CreateArgs, global: &GlobalArgs) -> Result<()> {
    let project = Project::load(global)?;
    let migrations = project.migrations_dir();
    let id = migrations
        .create(&args.description)
        .context("Failed to create migration")?;

    println!("Created: {}/{}", project.config.migrations_dir, id);
    Ok(())
}
