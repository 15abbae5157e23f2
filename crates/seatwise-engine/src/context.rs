//! # Request Context
//!
//! Per-call deadline and the engine's notion of "now".
//!
//! ## Deadline Flow
//! ```text
//! caller                      engine                        store
//!   │  RequestContext           │                              │
//!   │  { deadline: t0 + 2s } ──►│  ctx.store("tables", fut) ──►│
//!   │                           │      timeout_at(deadline)    │
//!   │                           │◄──── Ok(rows) ───────────────│
//!   │                           │                              │
//!   │                           │  ctx.store("insert", fut) ──►│  (slow)
//!   │◄── DeadlineExceeded ──────│      deadline passes         │
//! ```
//!
//! The deadline bounds each store call, not the CPU work in between; the
//! scheduling math is fast and runs to completion.

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{timeout_at, Instant};
use tracing::warn;

use crate::error::{EngineError, EngineResult};
use crate::store::StoreResult;

// =============================================================================
// Clock
// =============================================================================

/// Source of the current UTC time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

// =============================================================================
// Request Context
// =============================================================================

/// Options carried through one engine call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext {
    /// Every store call must finish before this instant.
    pub deadline: Option<Instant>,
}

impl RequestContext {
    /// No deadline.
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        RequestContext {
            deadline: Some(deadline),
        }
    }

    /// Deadline `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    /// Awaits a store call under the deadline.
    pub async fn store<T, F>(&self, operation: &'static str, call: F) -> EngineResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        let result = match self.deadline {
            Some(deadline) => match timeout_at(deadline, call).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(operation, "Store call exceeded request deadline");
                    return Err(EngineError::DeadlineExceeded { operation });
                }
            },
            None => call.await,
        };

        result.map_err(EngineError::from)
    }
}
