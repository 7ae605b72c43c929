//! Calls a migration operation under either calling convention.

use crate::unit::{Completion, Handle, MigrationOperation, LEGACY_ARITY_WITH_CLIENT};
use anyhow::anyhow;

/// Run `operation` against `db` and `client` and return its outcome.
///
/// Direct operations are awaited. Completion-style operations are awaited
/// and then their completion signal is awaited. Operations declaring fewer
/// than three parameters are called without the client.
pub async fn invoke<D, C>(
    operation: &MigrationOperation<D, C>,
    db: &D,
    client: &C,
) -> anyhow::Result<()>
where
    D: ?Sized + Handle,
    C: ?Sized + Handle,
{
    match operation {
        MigrationOperation::Direct(op) => op(db, client).await,
        MigrationOperation::LegacyCallback { op, arity } => {
            let client = (*arity >= LEGACY_ARITY_WITH_CLIENT).then_some(client);
            let (completion, signal) = Completion::channel();
            op(db, client, completion).await;
            match signal.await {
                Ok(result) => result,
                Err(_) => Err(anyhow!(
                    "migration completed without signalling its result"
                )),
            }
        }
    }
}

#[cfg(test)]
#[path = "invoke_test.rs"]
mod tests;
