//! Per-request context for the semantic search path.
//!
//! The lexical query compiler has a fixed call shape, so the original query
//! text and the caller's parameters cannot be passed down to the nodes that
//! need them. Instead the searcher publishes a [`RequestContext`] keyed by
//! the executing thread for the duration of one search, and node rewriters
//! look it up. [`ContextStore::enter`] returns a guard that removes the entry
//! when dropped, including on early return and unwinding.
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::warn;

use crate::traits::SearchParams;
use crate::types::Caller;

pub struct RequestContext {
    query: String,
    params: Arc<dyn SearchParams>,
    caller: Option<Caller>,
}

impl RequestContext {
    pub fn new(query: impl Into<String>, params: Arc<dyn SearchParams>, caller: Option<Caller>) -> Self {
        Self { query: query.into(), params, caller }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn params(&self) -> &dyn SearchParams {
        self.params.as_ref()
    }

    pub fn caller(&self) -> Option<&Caller> {
        self.caller.as_ref()
    }
}

impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("query", &self.query)
            .field("params", &self.params)
            .field("caller", &self.caller.as_ref().map(|c| c.user_id.as_str()))
            .finish()
    }
}

/// Thread-keyed slots holding at most one context per thread.
#[derive(Debug, Default)]
pub struct ContextStore {
    slots: Mutex<HashMap<ThreadId, Arc<RequestContext>>>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a context for the current thread, replacing (with a warning)
    /// any context left behind by an earlier call.
    pub fn create(&self, query: impl Into<String>, params: Arc<dyn SearchParams>, caller: Option<Caller>) -> Arc<RequestContext> {
        let context = Arc::new(RequestContext::new(query, params, caller));
        let previous = self.slots.lock().insert(thread::current().id(), Arc::clone(&context));
        if let Some(previous) = previous {
            warn!(?previous, "a request context already exists on this thread, discarding it");
        }
        context
    }

    pub fn current(&self) -> Option<Arc<RequestContext>> {
        self.slots.lock().get(&thread::current().id()).cloned()
    }

    pub fn close(&self) {
        if self.slots.lock().remove(&thread::current().id()).is_none() {
            warn!("no request context exists on this thread");
        }
    }

    /// Create a context and tie its removal to the returned guard.
    pub fn enter(&self, query: impl Into<String>, params: Arc<dyn SearchParams>, caller: Option<Caller>) -> ContextGuard<'_> {
        let context = self.create(query, params, caller);
        ContextGuard { store: self, context }
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Removes the current thread's context on drop.
#[must_use = "the context is removed as soon as the guard is dropped"]
pub struct ContextGuard<'a> {
    store: &'a ContextStore,
    context: Arc<RequestContext>,
}

impl ContextGuard<'_> {
    pub fn context(&self) -> &Arc<RequestContext> {
        &self.context
    }
}

impl Drop for ContextGuard<'_> {
    fn drop(&mut self) {
        self.store.close();
    }
}
