//! Rule abstraction and per-call evaluation state
use crate::context::VerificationContext;
use crate::extension::{ExtensionCoordinator, ExtensionFailure, ExtensionState};
use crate::result::RuleResult;
use tessera_core::{ErrorCode, PublicationRecord, Signature};

/// One decision step of a policy.
///
/// Rules hold no state of their own; anything that changes during a
/// verification lives in the [`VerificationSession`].
pub trait Rule: Send + Sync {
    /// Stable identifier used in traces and logs
    fn id(&self) -> &'static str;

    fn evaluate(&self, session: &mut VerificationSession<'_>) -> RuleResult;
}

/// Mutable state of a single verification call
#[derive(Debug)]
pub struct VerificationSession<'a> {
    context: &'a VerificationContext,
    extension: ExtensionCoordinator,
}

impl<'a> VerificationSession<'a> {
    pub fn new(context: &'a VerificationContext) -> Self {
        Self {
            context,
            extension: ExtensionCoordinator::new(),
        }
    }

    pub fn context(&self) -> &'a VerificationContext {
        self.context
    }

    /// The signature under evaluation: the extended one once extension succeeded
    pub fn signature(&self) -> &Signature {
        self.extension
            .extended_signature()
            .unwrap_or_else(|| self.context.signature())
    }

    pub fn extension_state(&self) -> &ExtensionState {
        self.extension.state()
    }

    /// Extend the original signature to `target` through the context's extender
    pub fn extend_to(&mut self, target: &PublicationRecord) -> Result<Signature, ExtensionFailure> {
        let extender = self.context.extender().ok_or_else(|| ExtensionFailure {
            code: ErrorCode::ExtensionError,
            message: "no extender configured".into(),
        })?;
        self.extension
            .extend(extender, self.context.signature(), target)
    }

    pub(crate) fn into_extension(self) -> ExtensionCoordinator {
        self.extension
    }
}
