//! End-to-end engine tests against DuckDB

use dm_core::{MigrationId, MigrationsDir};
use dm_db::{Database, DbClient};
use dm_migrate::{
    AppliedAt, DuckDbChangelog, ErrorKind, MigrationOperation, MigrationRegistry, MigrationUnit,
    Migrator, SqlMigrationSource,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

type Op = MigrationOperation<dyn Database, DbClient>;

fn write_migration(dir: &Path, name: &str, up: &str, down: &str) {
    fs::write(
        dir.join(name),
        format!("-- migrate:up\n{}\n\n-- migrate:down\n{}\n", up, down),
    )
    .unwrap();
}

fn sql_migrator(dir: &TempDir) -> Migrator<dyn Database, DbClient> {
    let source = SqlMigrationSource::new(MigrationsDir::new(dir.path(), ".sql"));
    Migrator::new(Arc::new(source), Arc::new(DuckDbChangelog::new("changelog")))
}

fn ids(names: &[&str]) -> Vec<MigrationId> {
    names.iter().map(|n| MigrationId::new(*n)).collect()
}

#[tokio::test]
async fn test_up_status_down_cycle() {
    let dir = tempfile::tempdir().unwrap();
    write_migration(
        dir.path(),
        "20160609113224-create_users.sql",
        "CREATE TABLE users (id INTEGER, email VARCHAR);",
        "DROP TABLE users;",
    );
    write_migration(
        dir.path(),
        "20160609113225-seed_users.sql",
        "INSERT INTO users VALUES (1, 'a@example.com');",
        "DELETE FROM users WHERE id = 1;",
    );
    let client = DbClient::open(":memory:").unwrap();
    let db = client.database().unwrap();
    let migrator = sql_migrator(&dir);

    let status = migrator.status(&db).await.unwrap();
    assert!(status.iter().all(|item| item.applied_at == AppliedAt::Pending));

    let migrated = migrator.up(&db, &client).await.unwrap();
    assert_eq!(
        migrated,
        ids(&["20160609113224-create_users.sql", "20160609113225-seed_users.sql"])
    );
    let rows = db.query_rows("SELECT COUNT(*) FROM users", &[]).await.unwrap();
    assert_eq!(rows[0][0].as_integer(), Some(1));

    let changelog_rows = db
        .query_rows("SELECT file_name FROM changelog ORDER BY rowid", &[])
        .await
        .unwrap();
    let recorded: Vec<&str> = changelog_rows
        .iter()
        .filter_map(|row| row[0].as_text())
        .collect();
    assert_eq!(
        recorded,
        vec!["20160609113224-create_users.sql", "20160609113225-seed_users.sql"]
    );

    assert!(migrator.up(&db, &client).await.unwrap().is_empty());

    let reverted = migrator.down(&db, &client).await.unwrap();
    assert_eq!(reverted, ids(&["20160609113225-seed_users.sql"]));
    let rows = db.query_rows("SELECT COUNT(*) FROM users", &[]).await.unwrap();
    assert_eq!(rows[0][0].as_integer(), Some(0));

    let status = migrator.status(&db).await.unwrap();
    assert!(!status[0].applied_at.is_pending());
    assert_eq!(status[1].applied_at.to_string(), "PENDING");
}

#[tokio::test]
async fn test_partial_failure_and_resume() {
    let dir = tempfile::tempdir().unwrap();
    write_migration(dir.path(), "1-a.sql", "CREATE TABLE a (id INT);", "DROP TABLE a;");
    write_migration(dir.path(), "2-b.sql", "CREATE TABLE a (id INT);", "");
    write_migration(dir.path(), "3-c.sql", "CREATE TABLE c (id INT);", "DROP TABLE c;");
    let client = DbClient::open(":memory:").unwrap();
    let db = client.database().unwrap();
    let migrator = sql_migrator(&dir);

    let err = migrator.up(&db, &client).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExecutionFailure);
    assert!(err.to_string().starts_with("Could not migrate up 2-b.sql: "));
    assert_eq!(err.migrated(), ids(&["1-a.sql"]).as_slice());
    assert!(!db.relation_exists("c").await.unwrap());

    let status = migrator.status(&db).await.unwrap();
    let pending: Vec<&str> = status
        .iter()
        .filter(|item| item.applied_at.is_pending())
        .map(|item| item.file_name.as_str())
        .collect();
    assert_eq!(pending, vec!["2-b.sql", "3-c.sql"]);

    write_migration(dir.path(), "2-b.sql", "CREATE TABLE b (id INT);", "DROP TABLE b;");
    let migrated = migrator.up(&db, &client).await.unwrap();
    assert_eq!(migrated, ids(&["2-b.sql", "3-c.sql"]));
}

#[tokio::test]
async fn test_missing_migrations_directory() {
    let dir = tempfile::tempdir().unwrap();
    let source = SqlMigrationSource::new(MigrationsDir::new(dir.path().join("nope"), ".sql"));
    let migrator: Migrator<dyn Database, DbClient> =
        Migrator::new(Arc::new(source), Arc::new(DuckDbChangelog::new("changelog")));
    let client = DbClient::open(":memory:").unwrap();
    let db = client.database().unwrap();

    let err = migrator.status(&db).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PrerequisiteMissing);
    assert!(err.to_string().contains("Migrations directory not found"));
}

#[tokio::test]
async fn test_registry_with_both_calling_conventions() {
    let with_client = Op::legacy(3, |_db, client, done| {
        Box::pin(async move {
            let result = match client {
                Some(client) => match client.database() {
                    Ok(conn) => conn
                        .execute_batch("CREATE TABLE via_client (id INT)")
                        .await
                        .map_err(anyhow::Error::from),
                    Err(e) => Err(e.into()),
                },
                None => Err(anyhow::anyhow!("client handle missing")),
            };
            done.finish(result);
        })
    });
    let db_only = Op::legacy(2, |db, client, done| {
        Box::pin(async move {
            let result = if client.is_some() {
                Err(anyhow::anyhow!("two-parameter migration received a client"))
            } else {
                db.execute_batch("CREATE TABLE via_db (id INT)")
                    .await
                    .map_err(anyhow::Error::from)
            };
            done.finish(result);
        })
    });
    let direct = Op::direct(|db, _client| {
        Box::pin(async move {
            db.execute_batch("CREATE TABLE via_direct (id INT)")
                .await
                .map_err(anyhow::Error::from)
        })
    });

    let registry = MigrationRegistry::new()
        .with(MigrationId::new("20200101000000-with_client"), MigrationUnit::new(with_client, Op::noop()))
        .with(MigrationId::new("20200101000001-db_only"), MigrationUnit::new(db_only, Op::noop()))
        .with(MigrationId::new("20200101000002-direct"), MigrationUnit::new(direct, Op::noop()));
    let migrator: Migrator<dyn Database, DbClient> =
        Migrator::new(Arc::new(registry), Arc::new(DuckDbChangelog::new("changelog")));

    let client = DbClient::open(":memory:").unwrap();
    let db = client.database().unwrap();
    let migrated = migrator.up(&db, &client).await.unwrap();
    assert_eq!(migrated.len(), 3);
    for table in ["via_client", "via_db", "via_direct"] {
        assert!(db.relation_exists(table).await.unwrap(), "{} missing", table);
    }
}

#[tokio::test]
async fn test_all_digit_ids_survive_repeated_runs() {
    let create = Op::direct(|db, _client| {
        Box::pin(async move {
            db.execute_batch("CREATE TABLE numbered (id INT)")
                .await
                .map_err(anyhow::Error::from)
        })
    });
    let registry = MigrationRegistry::new()
        .with(MigrationId::new("20200101000000"), MigrationUnit::new(create, Op::noop()));
    let migrator: Migrator<dyn Database, DbClient> =
        Migrator::new(Arc::new(registry), Arc::new(DuckDbChangelog::new("changelog")));

    let client = DbClient::open(":memory:").unwrap();
    let db = client.database().unwrap();
    assert_eq!(migrator.up(&db, &client).await.unwrap(), ids(&["20200101000000"]));

    let status = migrator.status(&db).await.unwrap();
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].file_name, "20200101000000");
    assert!(!status[0].applied_at.is_pending());

    assert!(migrator.up(&db, &client).await.unwrap().is_empty());
    assert_eq!(migrator.down(&db, &client).await.unwrap(), ids(&["20200101000000"]));
    assert!(migrator.status(&db).await.unwrap()[0].applied_at.is_pending());
}
