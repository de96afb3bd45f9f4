//! Context resolution
//!
//! Turns a [`ContextSelector`] into an owned handle. The persistent context is
//! created once with the bridge and handed out as reference-counted clones;
//! disposable contexts are created per request and released when their handle
//! is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use rquickjs::{AsyncContext, AsyncRuntime};
use tracing::trace;

use crate::error::Result;
use crate::selector::ContextSelector;

/// A context created for a single request
pub struct DisposableContext {
    context: AsyncContext,
    live: Arc<AtomicUsize>,
}

impl Drop for DisposableContext {
    fn drop(&mut self) {
        let remaining = self.live.fetch_sub(1, Ordering::SeqCst) - 1;
        trace!("Disposable context released ({} still live)", remaining);
    }
}

/// Owned reference to a native execution context
///
/// Dropping the handle releases it: a disposable context is destroyed, a
/// persistent reference is given back while the context keeps running.
pub enum ContextHandle {
    Persistent(AsyncContext),
    Disposable(DisposableContext),
}

impl ContextHandle {
    pub fn context(&self) -> &AsyncContext {
        match self {
            ContextHandle::Persistent(context) => context,
            ContextHandle::Disposable(disposable) => &disposable.context,
        }
    }
}

pub struct ContextResolver {
    runtime: AsyncRuntime,
    persistent: AsyncContext,
    live_disposable: Arc<AtomicUsize>,
}

impl ContextResolver {
    /// Wrap an already initialized persistent context
    pub fn new(runtime: AsyncRuntime, persistent: AsyncContext) -> Self {
        Self {
            runtime,
            persistent,
            live_disposable: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Obtain a handle for `selector`
    ///
    /// Page requests are served by the page engine and resolve to `None`
    /// without touching any native context.
    ///
    /// # Errors
    /// Returns [`BridgeError::Engine`](crate::BridgeError::Engine) if the engine
    /// cannot allocate a new context
    pub async fn resolve(&self, selector: ContextSelector) -> Result<Option<ContextHandle>> {
        match selector {
            ContextSelector::Persistent => Ok(Some(ContextHandle::Persistent(self.persistent.clone()))),
            ContextSelector::Disposable => {
                let context = AsyncContext::full(&self.runtime).await?;
                let live = self.live_disposable.fetch_add(1, Ordering::SeqCst) + 1;
                trace!("Disposable context created ({} live)", live);
                Ok(Some(ContextHandle::Disposable(DisposableContext {
                    context,
                    live: Arc::clone(&self.live_disposable),
                })))
            }
            ContextSelector::Page => Ok(None),
        }
    }

    pub fn runtime(&self) -> &AsyncRuntime {
        &self.runtime
    }

    pub fn persistent(&self) -> &AsyncContext {
        &self.persistent
    }

    /// Number of disposable contexts whose handles are still alive
    pub fn live_disposable_contexts(&self) -> usize {
        self.live_disposable.load(Ordering::SeqCst)
    }
}
