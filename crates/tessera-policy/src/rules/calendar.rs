//! Calendar-chain rules
use super::fail_on;
use crate::result::RuleResult;
use crate::rule::{Rule, VerificationSession};
use tessera_core::ErrorCode;

/// Signature carries a calendar chain
pub struct CalendarChainPresentRule;

impl Rule for CalendarChainPresentRule {
    fn id(&self) -> &'static str {
        "calendar.chain_present"
    }

    fn evaluate(&self, session: &mut VerificationSession<'_>) -> RuleResult {
        if session.signature().calendar_chain().is_some() {
            RuleResult::ok()
        } else {
            RuleResult::na(ErrorCode::NoTrustAnchor, "no calendar chain")
        }
    }
}

/// A calendar root is recorded in a publication or authentication record
pub struct RecordedCalendarRootRule;

impl Rule for RecordedCalendarRootRule {
    fn id(&self) -> &'static str {
        "calendar.recorded_root_present"
    }

    fn evaluate(&self, session: &mut VerificationSession<'_>) -> RuleResult {
        let signature = session.signature();
        if signature.publication_record().is_some() || signature.calendar_auth_record().is_some() {
            RuleResult::ok()
        } else {
            RuleResult::na(ErrorCode::NoTrustAnchor, "no recorded calendar root")
        }
    }
}

/// Recomputed calendar root equals the recorded one
pub struct CalendarRootRule;

impl Rule for CalendarRootRule {
    fn id(&self) -> &'static str {
        "calendar.root_matches"
    }

    fn evaluate(&self, session: &mut VerificationSession<'_>) -> RuleResult {
        let signature = session.signature();
        let Some(calendar) = signature.calendar_chain() else {
            return RuleResult::na(ErrorCode::NoTrustAnchor, "no calendar chain");
        };
        let recorded = signature
            .publication_record()
            .map(|record| &record.publication_data)
            .or_else(|| signature.calendar_auth_record().map(|record| &record.publication_data));
        let Some(recorded) = recorded else {
            return RuleResult::na(ErrorCode::NoTrustAnchor, "no recorded calendar root");
        };
        match calendar.root() {
            Ok(root)
                if &root == recorded.publication_hash()
                    && calendar.publication_time == recorded.publication_time() =>
            {
                RuleResult::ok()
            }
            Ok(root) => RuleResult::fail(
                ErrorCode::ChainInconsistent,
                format!("calendar root {root} does not match recorded {recorded}"),
            ),
            Err(e) => fail_on(e),
        }
    }
}
