//! Signature extension
//!
//! `NOT_EXTENDED -> EXTENSION_REQUESTED -> EXTENDED | EXTENSION_FAILED`.
//! A failed extension is final for the verification it belongs to.

use crate::config::VerifierConfig;
use crate::services::{Extender, ExtenderError};
use serde::{Deserialize, Serialize};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;
use tessera_core::{ErrorCode, PublicationRecord, Signature};
use thiserror::Error;
use tracing::{info, warn};

/// Where a verification is in the extension lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExtensionState {
    NotExtended,
    ExtensionRequested { from: u64, to: u64 },
    Extended { publication_time: u64 },
    ExtensionFailed { code: ErrorCode, message: String },
}

impl Default for ExtensionState {
    fn default() -> Self {
        ExtensionState::NotExtended
    }
}

/// Why extension did not produce a signature
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct ExtensionFailure {
    pub code: ErrorCode,
    pub message: String,
}

impl ExtensionFailure {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Per-verification extension driver
#[derive(Debug, Default)]
pub struct ExtensionCoordinator {
    state: ExtensionState,
    extended: Option<Signature>,
}

impl ExtensionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ExtensionState {
        &self.state
    }

    pub fn extended_signature(&self) -> Option<&Signature> {
        self.extended.as_ref()
    }

    pub fn into_extended_signature(self) -> Option<Signature> {
        self.extended
    }

    /// Extend `signature` to `target`.
    ///
    /// The fetched chain must reach `target` exactly; anything else leaves
    /// the coordinator in `EXTENSION_FAILED` with no extended signature.
    /// Repeated requests for the same target reuse the extended signature;
    /// once failed, every later request fails with the recorded code and the
    /// extender is not called again.
    pub fn extend(
        &mut self,
        extender: &dyn Extender,
        signature: &Signature,
        target: &PublicationRecord,
    ) -> Result<Signature, ExtensionFailure> {
        let from = signature.aggregation_time();
        let to = target.publication_time();

        match &self.state {
            ExtensionState::ExtensionFailed { code, message } => {
                return Err(ExtensionFailure::new(*code, message.clone()));
            }
            ExtensionState::Extended { publication_time } if *publication_time == to => {
                if let Some(extended) = &self.extended {
                    return Ok(extended.clone());
                }
            }
            _ => {}
        }

        self.state = ExtensionState::ExtensionRequested { from, to };
        info!(from, to, "requesting signature extension");

        let extended = extender
            .fetch_calendar_chain(from, to)
            .map_err(|e| ExtensionFailure::new(e.code(), e.to_string()))
            .and_then(|chain| {
                if chain.aggregation_time != from || chain.publication_time != to {
                    return Err(ExtensionFailure::new(
                        ErrorCode::ExtensionError,
                        format!(
                            "extender answered {}..{} for request {from}..{to}",
                            chain.aggregation_time, chain.publication_time
                        ),
                    ));
                }
                // a chain that does not reach the target hash is CHAIN_INCONSISTENT
                signature
                    .extend(chain, target.clone())
                    .map_err(|e| ExtensionFailure::new(e.code(), e.to_string()))
            });

        match extended {
            Ok(sig) => {
                self.state = ExtensionState::Extended {
                    publication_time: to,
                };
                self.extended = Some(sig.clone());
                Ok(sig)
            }
            Err(failure) => {
                warn!(from, to, code = %failure.code, error = %failure.message, "signature extension failed");
                self.state = ExtensionState::ExtensionFailed {
                    code: failure.code,
                    message: failure.message.clone(),
                };
                Err(failure)
            }
        }
    }
}

/// Wraps an extender with a deadline per call.
///
/// The call runs on a worker thread; a call still running at the deadline is
/// abandoned and reported as `EXTENSION_TIMEOUT`.
pub struct TimeoutExtender {
    inner: Arc<dyn Extender>,
    timeout: Duration,
}

impl TimeoutExtender {
    pub fn new(inner: Arc<dyn Extender>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    /// `None` when the configuration disables the deadline
    pub fn from_config(inner: Arc<dyn Extender>, config: &VerifierConfig) -> Option<Self> {
        config
            .extension_timeout()
            .map(|timeout| Self::new(inner, timeout))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Extender for TimeoutExtender {
    fn fetch_calendar_chain(
        &self,
        aggregation_time: u64,
        publication_time: u64,
    ) -> Result<tessera_core::CalendarChain, ExtenderError> {
        let (tx, rx) = mpsc::sync_channel(1);
        let inner = Arc::clone(&self.inner);
        thread::Builder::new()
            .name("tessera-extend".into())
            .spawn(move || {
                // receiver may be gone after a timeout
                let _ = tx.send(inner.fetch_calendar_chain(aggregation_time, publication_time));
            })
            .map_err(|e| ExtenderError::Network(format!("cannot start extension worker: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(ExtenderError::Timeout(self.timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(ExtenderError::Network(
                "extension worker exited without a result".into(),
            )),
        }
    }
}

impl std::fmt::Debug for TimeoutExtender {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("TimeoutExtender")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
