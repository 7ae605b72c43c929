//! Status command implementation

use anyhow::Result;
use dm_migrate::StatusItem;

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::{ExitCode, Session};

/// Width of a rendered applied-at timestamp
const APPLIED_AT_WIDTH: usize = 24;

/// Execute the status command
pub(crate) async fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let session = Session::open(global)?;
    let items = match session.migrator.status(&session.db).await {
        Ok(items) => items,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            return Err(ExitCode(1).into());
        }
    };

    match args.output {
        StatusOutput::Table => print!("{}", format_table(&items)),
        StatusOutput::Json => println!("{}", serde_json::to_string_pretty(&items)?),
    }
    Ok(())
}

fn format_table(items: &[StatusItem]) -> String {
    let name_width = items
        .iter()
        .map(|item| item.file_name.len())
        .max()
        .unwrap_or(8)
        .max(8);

    let mut lines = Vec::with_capacity(items.len() + 2);
    lines.push(format!(
        "{:<name_width$}  APPLIED_AT",
        "FILENAME",
        name_width = name_width
    ));
    lines.push(format!(
        "{:-<name_width$}  {:-<at_width$}",
        "",
        "",
        name_width = name_width,
        at_width = APPLIED_AT_WIDTH
    ));
    for item in items {
        lines.push(format!(
            "{:<name_width$}  {}",
            item.file_name.as_str(),
            item.applied_at,
            name_width = name_width
        ));
    }
    lines.join("\n") + "\n"
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
