//! Task spawning abstraction.
//!
//! The channel runs its event stream in a background task. Which runtime
//! drives that task is up to the caller.

use futures::future::{AbortHandle, BoxFuture};

/// Spawns background tasks for the channel.
pub trait Spawn {
    /// Spawn a future as a background task.
    ///
    /// The future should be driven to completion. The returned
    /// [`AbortHandle`] is used to cancel it.
    fn spawn(&self, fut: BoxFuture<'static, ()>) -> AbortHandle;
}

/// A spawner backed by [`tokio::spawn`].
///
/// Outside a tokio runtime (for example when a channel is dropped after its
/// runtime has gone) nothing is spawned and the returned handle is already
/// aborted.
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSpawn;

#[cfg(feature = "tokio")]
impl Spawn for TokioSpawn {
    fn spawn(&self, fut: BoxFuture<'static, ()>) -> AbortHandle {
        use futures::future::Abortable;
        let (handle, reg) = AbortHandle::new_pair();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(Abortable::new(fut, reg));
            }
            Err(e) => {
                tracing::debug!("not spawning background task: {e}");
                handle.abort();
            }
        }
        handle
    }
}
