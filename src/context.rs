//! Cooperative cancellation.
//!
//! Long loops call [`Context::safepoint`] once per row. Every
//! `safepoint_interval` calls the context polls its [`CancellationToken`] and,
//! if cancellation was requested, returns `Err(StoreError::Cancelled)`. Callers
//! propagate that error with `?`; nothing in the crate swallows it.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::StoreConfig;
use crate::error::StoreError;

/// A shareable flag the embedding host flips to interrupt running operations.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Per-invocation execution context threaded through every long loop.
#[derive(Debug)]
pub struct Context {
    token: CancellationToken,
    interval: u32,
    ticks: Cell<u32>,
    config: StoreConfig,
}

impl Context {
    pub fn new(config: StoreConfig, token: CancellationToken) -> Self {
        let interval = config.safepoint_interval.max(1);
        Self {
            token,
            interval,
            ticks: Cell::new(0),
            config,
        }
    }

    /// A context that can only be cancelled through the returned token.
    pub fn with_token(token: CancellationToken) -> Self {
        Self::new(StoreConfig::default(), token)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// The cancellation checkpoint.
    #[inline]
    pub fn safepoint(&self) -> Result<(), StoreError> {
        let ticks = self.ticks.get() + 1;
        if ticks >= self.interval {
            self.ticks.set(0);
            if self.token.is_cancelled() {
                log::info!("Column operation cancelled at safepoint");
                return Err(StoreError::Cancelled);
            }
        } else {
            self.ticks.set(ticks);
        }
        Ok(())
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(StoreConfig::default(), CancellationToken::new())
    }
}
