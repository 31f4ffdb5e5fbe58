//! Tessera Policy: verification of keyless signatures under trust policies
//!
//! ```text
//! VerificationContext → Policy (rule chain) → PolicyEngine → VerificationResult
//!                                 ↓
//!                       ExtensionCoordinator → Extender
//! ```
//!
//! # Example
//!
//! ```
//! use tessera_core::{AggregationChain, ErrorCode, HashAlgorithm, Signature};
//! use tessera_policy::{Policy, Verdict, VerificationContext};
//!
//! let document = HashAlgorithm::Sha256.digest(b"This is my document");
//! let signature = Signature::new(AggregationChain::new(
//!     1_458_000_000,
//!     HashAlgorithm::Sha256,
//!     document.clone(),
//! ));
//!
//! let context = VerificationContext::builder()
//!     .with_document_hash(document)
//!     .with_signature(signature)
//!     .with_policy(Policy::CalendarBased)
//!     .build()?;
//!
//! // no calendar chain yet, so the calendar policy cannot decide
//! let result = tessera_policy::verify(&context);
//! assert_eq!(result.verdict(), Verdict::Na);
//! assert_eq!(result.error_code(), Some(ErrorCode::NoTrustAnchor));
//! # Ok::<(), tessera_policy::ContextError>(())
//! ```

pub mod certificate;
pub mod config;
pub mod context;
pub mod engine;
pub mod extension;
pub mod policy;
pub mod result;
pub mod rule;
pub mod rules;
pub mod services;

#[cfg(test)]
pub(crate) mod fixtures;

pub use certificate::Certificate;
pub use config::{ConfigError, VerifierConfig};
pub use context::{ContextError, VerificationContext, VerificationContextBuilder};
pub use engine::PolicyEngine;
pub use extension::{ExtensionCoordinator, ExtensionFailure, ExtensionState, TimeoutExtender};
pub use policy::Policy;
pub use result::{RuleOutcome, RuleRecord, RuleResult, Verdict, VerificationResult};
pub use rule::{Rule, VerificationSession};
pub use services::{CatalogError, CertificateStore, Extender, ExtenderError, PublicationsCatalog};

/// Verify `context` under its policy
pub fn verify(context: &VerificationContext) -> VerificationResult {
    PolicyEngine::new().verify(context)
}
