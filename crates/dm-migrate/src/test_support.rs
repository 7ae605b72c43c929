//! Recording doubles shared by the engine tests.

use crate::changelog::{ChangelogEntry, ChangelogError, ChangelogStore};
use crate::source::{MigrationListing, MigrationSource, SourceError};
use crate::unit::{MigrationOperation, MigrationUnit};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dm_core::MigrationId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub(crate) struct TestDb {
    pub name: &'static str,
}

pub(crate) struct TestClient {
    pub name: &'static str,
}

pub(crate) const DB: TestDb = TestDb { name: "db" };
pub(crate) const CLIENT: TestClient = TestClient { name: "client" };

pub(crate) type TestOp = MigrationOperation<TestDb, TestClient>;
pub(crate) type TestUnit = MigrationUnit<TestDb, TestClient>;

/// Ordered record of every call the doubles and operations see.
#[derive(Clone, Default)]
pub(crate) struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Events that are operation runs (`up:*` / `down:*`)
    pub fn runs(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.starts_with("up:") || e.starts_with("down:"))
            .collect()
    }
}

pub(crate) fn id(name: &str) -> MigrationId {
    MigrationId::new(name)
}

pub(crate) fn at(rfc3339: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(rfc3339)
        .unwrap()
        .with_timezone(&Utc)
}

pub(crate) fn recording_op(log: &EventLog, label: String) -> TestOp {
    let log = log.clone();
    MigrationOperation::direct(move |_db, _client| {
        log.push(label.clone());
        Box::pin(async { Ok(()) })
    })
}

pub(crate) fn failing_op(log: &EventLog, label: String, message: &str) -> TestOp {
    let log = log.clone();
    let message = message.to_string();
    MigrationOperation::direct(move |_db, _client| {
        log.push(label.clone());
        let message = message.clone();
        Box::pin(async move { Err(anyhow::anyhow!(message)) })
    })
}

/// Unit whose operations record `up:<name>` and `down:<name>`.
pub(crate) fn recording_unit(log: &EventLog, name: &str) -> TestUnit {
    MigrationUnit::new(
        recording_op(log, format!("up:{}", name)),
        recording_op(log, format!("down:{}", name)),
    )
}

pub(crate) struct MockSource {
    pub exists_error: Option<String>,
    pub listing_error: Option<String>,
    names: Vec<MigrationId>,
    units: HashMap<MigrationId, TestUnit>,
    log: EventLog,
}

impl MockSource {
    pub fn new(log: &EventLog) -> Self {
        Self {
            exists_error: None,
            listing_error: None,
            names: Vec::new(),
            units: HashMap::new(),
            log: log.clone(),
        }
    }

    /// List `name` and load it as `unit`.
    pub fn with(mut self, name: &str, unit: TestUnit) -> Self {
        self.names.push(id(name));
        self.units.insert(id(name), unit);
        self
    }

    /// List recording units for every name.
    pub fn with_recording(mut self, names: &[&str]) -> Self {
        for name in names {
            let unit = recording_unit(&self.log, name);
            self = self.with(name, unit);
        }
        self
    }

    /// List `name` without a loadable unit.
    pub fn with_unloadable(mut self, name: &str) -> Self {
        self.names.push(id(name));
        self
    }
}

#[async_trait]
impl MigrationListing for MockSource {
    async fn should_exist(&self) -> Result<(), SourceError> {
        self.log.push("source.should_exist");
        match &self.exists_error {
            Some(msg) => Err(SourceError::DirectoryNotFound(msg.clone())),
            None => Ok(()),
        }
    }

    async fn file_names(&self) -> Result<Vec<MigrationId>, SourceError> {
        self.log.push("source.file_names");
        match &self.listing_error {
            Some(msg) => Err(SourceError::Listing(msg.clone())),
            None => Ok(self.names.clone()),
        }
    }
}

#[async_trait]
impl MigrationSource<TestDb, TestClient> for MockSource {
    async fn load_migration(&self, id: &MigrationId) -> Result<TestUnit, SourceError> {
        self.log.push(format!("load:{}", id));
        self.units
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::Load(format!("Cannot find module '{}'", id)))
    }
}

pub(crate) struct MockChangelog {
    pub exists_error: Option<String>,
    pub read_error: Option<String>,
    pub insert_error_for: Option<MigrationId>,
    pub delete_error: Option<String>,
    entries: Mutex<Vec<ChangelogEntry>>,
    log: EventLog,
}

impl MockChangelog {
    pub fn new(log: &EventLog) -> Self {
        Self {
            exists_error: None,
            read_error: None,
            insert_error_for: None,
            delete_error: None,
            entries: Mutex::new(Vec::new()),
            log: log.clone(),
        }
    }

    pub fn with_entry(self, name: &str, applied_at: &str) -> Self {
        self.entries
            .lock()
            .unwrap()
            .push(ChangelogEntry::new(id(name), at(applied_at)));
        self
    }

    pub fn snapshot(&self) -> Vec<ChangelogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn ids(&self) -> Vec<String> {
        self.snapshot()
            .into_iter()
            .map(|e| e.file_name.into_inner())
            .collect()
    }
}

#[async_trait]
impl ChangelogStore<TestDb> for MockChangelog {
    async fn should_exist(&self) -> Result<(), ChangelogError> {
        self.log.push("changelog.should_exist");
        match &self.exists_error {
            Some(msg) => Err(ChangelogError::Config(msg.clone())),
            None => Ok(()),
        }
    }

    async fn entries(&self, _db: &TestDb) -> Result<Vec<ChangelogEntry>, ChangelogError> {
        self.log.push("changelog.entries");
        match &self.read_error {
            Some(msg) => Err(ChangelogError::Read(msg.clone())),
            None => Ok(self.snapshot()),
        }
    }

    async fn record_applied(&self, _db: &TestDb, id: &MigrationId) -> Result<(), ChangelogError> {
        self.log.push(format!("record_applied:{}", id));
        if self.insert_error_for.as_ref() == Some(id) {
            return Err(ChangelogError::Write("insert rejected".to_string()));
        }
        self.entries
            .lock()
            .unwrap()
            .push(ChangelogEntry::new(id.clone(), Utc::now()));
        Ok(())
    }

    async fn record_reverted(&self, _db: &TestDb, id: &MigrationId) -> Result<(), ChangelogError> {
        self.log.push(format!("record_reverted:{}", id));
        if let Some(msg) = &self.delete_error {
            return Err(ChangelogError::Write(msg.clone()));
        }
        let mut entries = self.entries.lock().unwrap();
        if let Some(pos) = entries.iter().position(|e| &e.file_name == id) {
            entries.remove(pos);
        }
        Ok(())
    }
}
