//! Init command implementation - scaffolds a docmigrate project

use anyhow::{Context, Result};
use dm_core::config::CONFIG_FILE_NAMES;
use dm_core::migrations_dir::DEFAULT_SQL_TEMPLATE;
use dm_core::{Config, MigrationsDir};
use std::fs;
use std::path::Path;

use crate::cli::{GlobalArgs, InitArgs};

const DEFAULT_MIGRATIONS_DIR: &str = "migrations";
const DEFAULT_EXTENSION: &str = ".sql";

/// Execute the init command
pub(crate) async fn execute(args: &InitArgs, global: &GlobalArgs) -> Result<()> {
    let project_dir = Path::new(&global.project_dir);
    if Config::should_exist(project_dir).is_ok() {
        anyhow::bail!(
            "A docmigrate config already exists in '{}'",
            project_dir.display()
        );
    }

    let name = match &args.name {
        Some(name) => name.clone(),
        None => default_project_name(project_dir)?,
    };

    fs::create_dir_all(project_dir)
        .with_context(|| format!("Failed to create directory: {}", project_dir.display()))?;

    let config_path = project_dir.join(CONFIG_FILE_NAMES[0]);
    fs::write(&config_path, render_config(&name, &args.database_path))
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    let migrations = MigrationsDir::new(project_dir.join(DEFAULT_MIGRATIONS_DIR), DEFAULT_EXTENSION);
    fs::create_dir_all(migrations.path()).with_context(|| {
        format!(
            "Failed to create directory: {}",
            migrations.path().display()
        )
    })?;
    let sample_path = migrations.path().join(migrations.sample_file_name());
    if !sample_path.exists() {
        fs::write(&sample_path, DEFAULT_SQL_TEMPLATE)
            .with_context(|| format!("Failed to write {}", sample_path.display()))?;
    }

    println!("Initialized docmigrate project '{}'", name);
    println!("  {}", config_path.display());
    println!("  {}/", migrations.path().display());
    Ok(())
}

/// Project name derived from the directory name
fn default_project_name(project_dir: &Path) -> Result<String> {
    let absolute = std::env::current_dir()
        .context("Failed to read the current directory")?
        .join(project_dir);
    Ok(absolute
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .unwrap_or("docmigrate_project")
        .to_string())
}

fn render_config(name: &str, database_path: &str) -> String {
    // Escape YAML special characters in interpolated values
    let safe_name = name.replace('\\', "\\\\").replace('"', "\\\"");
    let safe_db_path = database_path.replace('\\', "\\\\").replace('"', "\\\"");
    format!(
        r#"name: "{name}"

# Directory holding migration files, relative to this file
migrations_dir: {migrations_dir}

# Table recording applied migrations
changelog_collection_name: changelog

migration_file_extension: "{extension}"

database:
  path: "{db_path}"

# targets:
#   prod:
#     database:
#       path: "/srv/prod.duckdb"
"#,
        name = safe_name,
        migrations_dir = DEFAULT_MIGRATIONS_DIR,
        extension = DEFAULT_EXTENSION,
        db_path = safe_db_path,
    )
}

#[cfg(test)]
#[path = "init_test.rs"]
mod tests;
