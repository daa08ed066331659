//! Checked-out connection handle.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use tokio::sync::OwnedSemaphorePermit;

use crate::connect::Connect;
use crate::pool::{PoolInner, Pooled};

/// A connection checked out of the pool.
///
/// The handle derefs to the raw connection, so every operation — including
/// its error behavior — goes straight through to the driver. The one
/// intercepted action is release: dropping the handle checks the connection
/// back into the pool instead of destroying it. Callers therefore treat the
/// handle exactly like a connection they opened themselves and "close" it
/// the ordinary way, by letting it go out of scope.
///
/// The caller exclusively owns the handle for the duration of the checkout;
/// the pool owns the raw connection at all times and only lends usage
/// rights. Because release consumes the handle, releasing twice or using a
/// connection after release does not compile.
pub struct PoolHandle<M: Connect> {
    /// `Some` from construction until the drop glue runs.
    pooled: Option<Pooled<M::Connection>>,
    inner: Arc<PoolInner<M>>,
    /// Held for the whole checkout; declared after `pooled` so it is
    /// relinquished only after the connection is back in the idle queue.
    _permit: OwnedSemaphorePermit,
}

impl<M: Connect> PoolHandle<M> {
    pub(crate) fn new(
        pooled: Pooled<M::Connection>,
        inner: Arc<PoolInner<M>>,
        permit: OwnedSemaphorePermit,
    ) -> Self {
        Self {
            pooled: Some(pooled),
            inner,
            _permit: permit,
        }
    }

    /// Stable id of the underlying raw connection, assigned at pool
    /// construction. Useful for diagnostics and tests.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn id(&self) -> u32 {
        self.pooled
            .as_ref()
            .expect("connection present until drop")
            .id
    }

    /// Release the connection back to the pool.
    ///
    /// Equivalent to dropping the handle; provided for call sites that want
    /// the return to read as an explicit close action.
    pub fn release(self) {}
}

// `pooled` is `Some` for the handle's entire observable lifetime; only the
// drop glue takes it.
#[allow(clippy::expect_used)]
impl<M: Connect> Deref for PoolHandle<M> {
    type Target = M::Connection;

    fn deref(&self) -> &Self::Target {
        &self
            .pooled
            .as_ref()
            .expect("connection present until drop")
            .raw
    }
}

#[allow(clippy::expect_used)]
impl<M: Connect> DerefMut for PoolHandle<M> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self
            .pooled
            .as_mut()
            .expect("connection present until drop")
            .raw
    }
}

impl<M: Connect> Drop for PoolHandle<M> {
    fn drop(&mut self) {
        if let Some(pooled) = self.pooled.take() {
            self.inner.check_in(pooled);
        }
        // `_permit` drops after this body, waking one waiting acquirer.
    }
}

impl<M: Connect> std::fmt::Debug for PoolHandle<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PoolHandle").field("id", &self.id()).finish()
    }
}
