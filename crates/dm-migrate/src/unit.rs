//! Migration units and the two operation calling conventions.

use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Bounds shared by the database and client handles the engine passes around.
pub trait Handle: Send + Sync + 'static {}

impl<T: ?Sized + Send + Sync + 'static> Handle for T {}

/// An operation that returns its outcome through its future.
pub type DirectFn<D, C> =
    dyn for<'a> Fn(&'a D, &'a C) -> BoxFuture<'a, anyhow::Result<()>> + Send + Sync;

/// An operation that reports its outcome through a [`Completion`].
pub type LegacyFn<D, C> =
    dyn for<'a> Fn(&'a D, Option<&'a C>, Completion) -> BoxFuture<'a, ()> + Send + Sync;

/// Parameter count at which a completion-style operation also receives the client.
pub const LEGACY_ARITY_WITH_CLIENT: usize = 3;

/// One direction (`up` or `down`) of a migration.
pub enum MigrationOperation<D: ?Sized + Handle, C: ?Sized + Handle> {
    /// Returns a future resolving to the outcome.
    Direct(Arc<DirectFn<D, C>>),

    /// Signals the outcome through a [`Completion`] handle.
    ///
    /// `arity` is the number of parameters the operation declares. Below
    /// three it is called without the client.
    LegacyCallback { op: Arc<LegacyFn<D, C>>, arity: usize },
}

impl<D: ?Sized + Handle, C: ?Sized + Handle> MigrationOperation<D, C> {
    /// Wrap an operation that returns its outcome.
    pub fn direct<F>(f: F) -> Self
    where
        F: for<'a> Fn(&'a D, &'a C) -> BoxFuture<'a, anyhow::Result<()>> + Send + Sync + 'static,
    {
        MigrationOperation::Direct(Arc::new(f))
    }

    /// Wrap a completion-style operation declaring `arity` parameters.
    pub fn legacy<F>(arity: usize, f: F) -> Self
    where
        F: for<'a> Fn(&'a D, Option<&'a C>, Completion) -> BoxFuture<'a, ()>
            + Send
            + Sync
            + 'static,
    {
        MigrationOperation::LegacyCallback {
            op: Arc::new(f),
            arity,
        }
    }

    /// An operation that succeeds without doing anything.
    pub fn noop() -> Self {
        Self::direct(|_, _| Box::pin(async { Ok(()) }))
    }

    /// True for the completion-style convention
    pub fn is_legacy(&self) -> bool {
        matches!(self, MigrationOperation::LegacyCallback { .. })
    }
}

impl<D: ?Sized + Handle, C: ?Sized + Handle> Clone for MigrationOperation<D, C> {
    fn clone(&self) -> Self {
        match self {
            MigrationOperation::Direct(op) => MigrationOperation::Direct(Arc::clone(op)),
            MigrationOperation::LegacyCallback { op, arity } => {
                MigrationOperation::LegacyCallback {
                    op: Arc::clone(op),
                    arity: *arity,
                }
            }
        }
    }
}

impl<D: ?Sized + Handle, C: ?Sized + Handle> fmt::Debug for MigrationOperation<D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationOperation::Direct(_) => f.write_str("Direct"),
            MigrationOperation::LegacyCallback { arity, .. } => f
                .debug_struct("LegacyCallback")
                .field("arity", arity)
                .finish(),
        }
    }
}

/// A loaded migration: the pair of operations it defines.
pub struct MigrationUnit<D: ?Sized + Handle, C: ?Sized + Handle> {
    pub up: MigrationOperation<D, C>,
    pub down: MigrationOperation<D, C>,
}

impl<D: ?Sized + Handle, C: ?Sized + Handle> MigrationUnit<D, C> {
    pub fn new(up: MigrationOperation<D, C>, down: MigrationOperation<D, C>) -> Self {
        Self { up, down }
    }
}

impl<D: ?Sized + Handle, C: ?Sized + Handle> Clone for MigrationUnit<D, C> {
    fn clone(&self) -> Self {
        Self {
            up: self.up.clone(),
            down: self.down.clone(),
        }
    }
}

impl<D: ?Sized + Handle, C: ?Sized + Handle> fmt::Debug for MigrationUnit<D, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MigrationUnit")
            .field("up", &self.up)
            .field("down", &self.down)
            .finish()
    }
}

/// Handle a completion-style operation uses to report its outcome.
///
/// Consumed on use, so an operation can signal at most once. Dropping it
/// without signalling fails the migration.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<anyhow::Result<()>>,
}

impl Completion {
    pub(crate) fn channel() -> (Self, oneshot::Receiver<anyhow::Result<()>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Signal success
    pub fn done(self) {
        self.finish(Ok(()));
    }

    /// Signal failure
    pub fn fail(self, err: impl Into<anyhow::Error>) {
        self.finish(Err(err.into()));
    }

    /// Signal an outcome
    pub fn finish(self, result: anyhow::Result<()>) {
        // The receiver only goes away if the invocation itself was dropped.
        let _ = self.tx.send(result);
    }
}
