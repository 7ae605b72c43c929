//! Migrations directory: listing, reading, and scaffolding migration files.
//!
//! File names are the migration identifiers. A new file is named
//! `<UTC timestamp %Y%m%d%H%M%S>-<slug><extension>`, so sorting names sorts
//! migrations by creation time.

use crate::error::{CoreError, CoreResult};
use crate::migration_id::MigrationId;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

/// Stem of the optional project-local template used by [`MigrationsDir::create`].
pub const SAMPLE_MIGRATION_STEM: &str = "sample-migration";

/// Template written by [`MigrationsDir::create`] when the project has no
/// `sample-migration` file of its own.
pub const DEFAULT_SQL_TEMPLATE: &str = "-- migrate:up\n\n\n-- migrate:down\n\n";

/// A directory of migration files with a fixed extension.
#[derive(Debug, Clone)]
pub struct MigrationsDir {
    path: PathBuf,
    extension: String,
}

impl MigrationsDir {
    /// Create a handle for `path`, matching files ending in `extension`
    /// (including the leading dot, e.g. `".sql"`).
    pub fn new(path: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            extension: extension.into(),
        }
    }

    /// Directory path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Migration file extension
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// File name of the project-local template
    pub fn sample_file_name(&self) -> String {
        format!("{}{}", SAMPLE_MIGRATION_STEM, self.extension)
    }

    /// Fail unless the directory exists.
    pub fn should_exist(&self) -> CoreResult<()> {
        if self.path.is_dir() {
            Ok(())
        } else {
            Err(CoreError::MigrationsDirNotFound {
                path: self.path.display().to_string(),
            })
        }
    }

    /// List migration identifiers, sorted ascending.
    ///
    /// Only regular files with the configured extension are listed. Hidden
    /// files and the sample template are skipped. Files without a timestamp
    /// prefix are listed with a warning.
    pub fn file_names(&self) -> CoreResult<Vec<MigrationId>> {
        let entries = fs::read_dir(&self.path).map_err(|e| CoreError::IoWithPath {
            path: self.path.display().to_string(),
            source: e,
        })?;

        let sample = self.sample_file_name();
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(String::from) else {
                log::warn!(
                    "Skipping migration file with non UTF-8 name: {}",
                    entry.path().display()
                );
                continue;
            };
            if name.starts_with('.') || name == sample || !name.ends_with(&self.extension) {
                continue;
            }
            if let Some(id) = MigrationId::try_new(name) {
                if id.timestamp_prefix().is_none() {
                    log::warn!(
                        "Migration file {} has no timestamp prefix; it sorts by name only",
                        id
                    );
                }
                names.push(id);
            }
        }
        names.sort();
        Ok(names)
    }

    /// Absolute path of a migration file.
    pub fn migration_path(&self, id: &MigrationId) -> PathBuf {
        self.path.join(id.as_str())
    }

    /// Read the contents of a migration file.
    pub fn read(&self, id: &MigrationId) -> CoreResult<String> {
        let path = self.migration_path(id);
        if !path.is_file() {
            return Err(CoreError::MigrationNotFound {
                name: id.to_string(),
            });
        }
        fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Scaffold a new migration file from the template and return its id.
    pub fn create(&self, description: &str) -> CoreResult<MigrationId> {
        self.create_at(description, Utc::now())
    }

    /// Like [`create`](Self::create) with an explicit creation time.
    pub fn create_at(&self, description: &str, now: DateTime<Utc>) -> CoreResult<MigrationId> {
        self.should_exist()?;

        let slug = slugify(description);
        if slug.is_empty() {
            return Err(CoreError::InvalidDescription {
                description: description.to_string(),
                reason: "must contain at least one letter or digit".to_string(),
            });
        }

        let id = MigrationId::new(format!(
            "{}-{}{}",
            now.format("%Y%m%d%H%M%S"),
            slug,
            self.extension
        ));
        let path = self.migration_path(&id);
        if path.exists() {
            return Err(CoreError::MigrationExists {
                path: path.display().to_string(),
            });
        }

        let template_path = self.path.join(self.sample_file_name());
        let content = if template_path.is_file() {
            fs::read_to_string(&template_path).map_err(|e| CoreError::IoWithPath {
                path: template_path.display().to_string(),
                source: e,
            })?
        } else {
            DEFAULT_SQL_TEMPLATE.to_string()
        };

        fs::write(&path, content).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        log::debug!("Created migration file {}", path.display());
        Ok(id)
    }
}

/// Turn a free-form description into a file-name slug.
///
/// Lowercases ASCII letters, keeps digits, and collapses every other run of
/// characters into a single `_`. Leading and trailing separators are dropped,
/// so the result never contains path separators.
pub fn slugify(description: &str) -> String {
    let mut slug = String::with_capacity(description.len());
    let mut pending_sep = false;
    for c in description.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}

#[cfg(test)]
#[path = "migrations_dir_test.rs"]
mod tests;
