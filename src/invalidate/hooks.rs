//! Write events, hooks and the invalidator

use crate::error::Result;
use crate::store::CheckpointStore;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Notification that a record of `kind` was written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteEvent {
    /// A record was inserted
    Created { kind: String },
    /// A record was modified
    Updated { kind: String },
    /// A record was removed
    Deleted { kind: String },
}

impl WriteEvent {
    /// Insert event
    pub fn created(kind: impl Into<String>) -> Self {
        Self::Created { kind: kind.into() }
    }

    /// Update event
    pub fn updated(kind: impl Into<String>) -> Self {
        Self::Updated { kind: kind.into() }
    }

    /// Delete event
    pub fn deleted(kind: impl Into<String>) -> Self {
        Self::Deleted { kind: kind.into() }
    }

    /// Data kind the written record belongs to
    pub fn kind(&self) -> &str {
        match self {
            Self::Created { kind } | Self::Updated { kind } | Self::Deleted { kind } => kind,
        }
    }
}

impl fmt::Display for WriteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            Self::Created { .. } => "created",
            Self::Updated { .. } => "updated",
            Self::Deleted { .. } => "deleted",
        };
        write!(f, "{} {action}", self.kind())
    }
}

/// Callback run synchronously after every record write
#[async_trait]
pub trait WriteHook: Send + Sync {
    /// Handle a completed write
    async fn on_write(&self, event: &WriteEvent) -> Result<()>;
}

/// Ordered list of hooks a storage layer notifies after each write
#[derive(Clone, Default)]
pub struct WriteHooks {
    hooks: Vec<Arc<dyn WriteHook>>,
}

impl WriteHooks {
    /// Create an empty hook list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook
    pub fn register(&mut self, hook: Arc<dyn WriteHook>) {
        self.hooks.push(hook);
    }

    /// Run every hook in registration order, stopping at the first failure
    pub async fn notify(&self, event: &WriteEvent) -> Result<()> {
        for hook in &self.hooks {
            hook.on_write(event).await?;
        }
        Ok(())
    }

    /// Number of registered hooks
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Whether no hook is registered
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }
}

impl fmt::Debug for WriteHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteHooks")
            .field("len", &self.hooks.len())
            .finish()
    }
}

/// Drops all pagination state of a kind when one of its records is written
#[derive(Clone)]
pub struct Invalidator {
    store: Arc<dyn CheckpointStore>,
}

impl Invalidator {
    /// Create an invalidator over `store`
    pub fn new(store: Arc<dyn CheckpointStore>) -> Self {
        Self { store }
    }

    /// Delete every query's state for `kind`
    pub async fn invalidate(&self, kind: &str) -> Result<()> {
        tracing::info!(kind, "Invalidating pagination checkpoints");
        self.store.delete(kind).await
    }
}

#[async_trait]
impl WriteHook for Invalidator {
    async fn on_write(&self, event: &WriteEvent) -> Result<()> {
        tracing::debug!(%event, "Write observed");
        self.invalidate(event.kind()).await
    }
}
