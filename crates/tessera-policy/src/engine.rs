//! Policy Engine: runs a rule chain and aggregates the verdict
use crate::context::VerificationContext;
use crate::policy::Policy;
use crate::result::{RuleOutcome, RuleRecord, Verdict, VerificationResult};
use crate::rule::{Rule, VerificationSession};
use tessera_core::ErrorCode;
use tracing::{debug, info, info_span};

/// Stateless entry point; one engine may serve any number of threads
#[derive(Debug, Default, Clone, Copy)]
pub struct PolicyEngine;

impl PolicyEngine {
    pub fn new() -> Self {
        Self
    }

    /// Verify with the context's policy
    pub fn verify(&self, context: &VerificationContext) -> VerificationResult {
        context.policy().evaluate(context)
    }
}

/// FAIL stops at the failing rule; otherwise the last NA code, if any,
/// makes the result inconclusive.
pub(crate) fn evaluate_rules(
    policy: Policy,
    rules: &[&dyn Rule],
    context: &VerificationContext,
) -> VerificationResult {
    let span = info_span!(
        "verify",
        policy = policy.name(),
        aggregation_time = context.signature().aggregation_time()
    );
    let _enter = span.enter();

    let mut session = VerificationSession::new(context);
    let mut trace = Vec::with_capacity(rules.len());
    let mut last_na: Option<ErrorCode> = None;
    let mut failure: Option<ErrorCode> = None;

    for rule in rules {
        let result = rule.evaluate(&mut session);
        debug!(
            rule = rule.id(),
            outcome = %result.outcome,
            detail = result.message.as_deref().unwrap_or(""),
            "rule evaluated"
        );
        let outcome = result.outcome;
        trace.push(RuleRecord::new(rule.id(), result));
        match outcome {
            RuleOutcome::Ok => {}
            RuleOutcome::Na(code) => last_na = Some(code),
            RuleOutcome::Fail(code) => {
                failure = Some(code);
                break;
            }
        }
    }

    let (verdict, error_code) = match (failure, last_na) {
        (Some(code), _) => (Verdict::Fail, Some(code)),
        (None, Some(code)) => (Verdict::Na, Some(code)),
        (None, None) => (Verdict::Ok, None),
    };

    let extension = session.into_extension();
    let state = extension.state().clone();
    let result = VerificationResult::new(
        policy,
        verdict,
        error_code,
        trace,
        state,
        extension.into_extended_signature(),
    );
    info!(
        id = %result.id(),
        verdict = %verdict,
        code = error_code.map(|c| c.as_str()).unwrap_or("-"),
        rules = result.trace().len(),
        "verification finished"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::result::RuleResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Stub {
        id: &'static str,
        outcome: RuleOutcome,
        calls: AtomicUsize,
    }

    impl Stub {
        fn new(id: &'static str, outcome: RuleOutcome) -> Self {
            Self {
                id,
                outcome,
                calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Rule for Stub {
        fn id(&self) -> &'static str {
            self.id
        }

        fn evaluate(&self, _session: &mut VerificationSession<'_>) -> RuleResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            RuleResult {
                outcome: self.outcome,
                message: None,
            }
        }
    }

    fn context() -> VerificationContext {
        let fx = fixtures::signed();
        VerificationContext::builder()
            .with_document_hash(fx.document)
            .with_signature(fx.signature)
            .build()
            .unwrap()
    }

    #[test]
    fn test_all_ok() {
        let a = Stub::new("a", RuleOutcome::Ok);
        let b = Stub::new("b", RuleOutcome::Ok);
        let result = evaluate_rules(Policy::CalendarBased, &[&a, &b], &context());
        assert_eq!(result.verdict(), Verdict::Ok);
        assert_eq!(result.error_code(), None);
        assert_eq!(result.trace().len(), 2);
    }

    #[test]
    fn test_fail_short_circuits() {
        let a = Stub::new("a", RuleOutcome::Na(ErrorCode::NoTrustAnchor));
        let b = Stub::new("b", RuleOutcome::Fail(ErrorCode::HashMismatch));
        let c = Stub::new("c", RuleOutcome::Ok);
        let result = evaluate_rules(Policy::CalendarBased, &[&a, &b, &c], &context());
        assert_eq!(result.verdict(), Verdict::Fail);
        assert_eq!(result.error_code(), Some(ErrorCode::HashMismatch));
        assert_eq!(result.failed_rule().unwrap().rule_id, "b");
        assert_eq!(c.calls(), 0);
    }

    #[test]
    fn test_na_continues_and_keeps_last_code() {
        let a = Stub::new("a", RuleOutcome::Na(ErrorCode::NoTrustAnchor));
        let b = Stub::new("b", RuleOutcome::Ok);
        let c = Stub::new("c", RuleOutcome::Na(ErrorCode::ExtensionError));
        let result = evaluate_rules(Policy::CalendarBased, &[&a, &b, &c], &context());
        assert_eq!(result.verdict(), Verdict::Na);
        assert_eq!(result.error_code(), Some(ErrorCode::ExtensionError));
        assert_eq!(b.calls(), 1);
        assert_eq!(c.calls(), 1);
        assert!(result.failed_rule().is_none());
    }

    #[test]
    fn test_engine_uses_context_policy() {
        let ctx = context();
        let result = PolicyEngine::new().verify(&ctx);
        assert_eq!(result.policy(), Policy::CalendarBased);
        assert!(result.is_ok());
    }

    #[test]
    fn test_engine_logs_under_subscriber() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let result = PolicyEngine::new().verify(&context());
            assert!(result.is_ok());
        });
    }
}
