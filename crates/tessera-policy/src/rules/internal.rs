//! Internal consistency rules, shared by every policy
use super::fail_on;
use crate::result::RuleResult;
use crate::rule::{Rule, VerificationSession};
use tessera_core::ErrorCode;

/// Document hash equals the signature's input hash
pub struct DocumentHashRule;

impl Rule for DocumentHashRule {
    fn id(&self) -> &'static str {
        "internal.document_hash"
    }

    fn evaluate(&self, session: &mut VerificationSession<'_>) -> RuleResult {
        let document = session.context().document_hash();
        let input = session.signature().input_hash();
        if document == input {
            RuleResult::ok()
        } else {
            RuleResult::fail(
                ErrorCode::HashMismatch,
                format!("document hash {document} differs from signature input hash {input}"),
            )
        }
    }
}

/// Aggregation chain recomputes to a root
pub struct AggregationChainRule;

impl Rule for AggregationChainRule {
    fn id(&self) -> &'static str {
        "internal.aggregation_chain"
    }

    fn evaluate(&self, session: &mut VerificationSession<'_>) -> RuleResult {
        match session.signature().aggregation_chain().root() {
            Ok(_) => RuleResult::ok(),
            Err(e) => fail_on(e),
        }
    }
}

/// Calendar chain starts from the aggregation root at the aggregation time
pub struct CalendarChainInputRule;

impl Rule for CalendarChainInputRule {
    fn id(&self) -> &'static str {
        "internal.calendar_chain_input"
    }

    fn evaluate(&self, session: &mut VerificationSession<'_>) -> RuleResult {
        let signature = session.signature();
        let Some(calendar) = signature.calendar_chain() else {
            return RuleResult::ok();
        };
        let root = match signature.aggregation_chain().root() {
            Ok(root) => root,
            Err(e) => return fail_on(e),
        };
        if calendar.input_hash != root {
            return RuleResult::fail(
                ErrorCode::ChainInconsistent,
                format!(
                    "calendar chain input {} is not the aggregation root {root}",
                    calendar.input_hash
                ),
            );
        }
        if calendar.aggregation_time != signature.aggregation_time() {
            return RuleResult::fail(
                ErrorCode::ChainInconsistent,
                format!(
                    "calendar chain aggregation time {} differs from {}",
                    calendar.aggregation_time,
                    signature.aggregation_time()
                ),
            );
        }
        match calendar.root() {
            Ok(_) => RuleResult::ok(),
            Err(e) => fail_on(e),
        }
    }
}

/// Authentication record covers the calendar root
pub struct AuthRecordConsistencyRule;

impl Rule for AuthRecordConsistencyRule {
    fn id(&self) -> &'static str {
        "internal.auth_record"
    }

    fn evaluate(&self, session: &mut VerificationSession<'_>) -> RuleResult {
        let signature = session.signature();
        let (Some(record), Some(calendar)) =
            (signature.calendar_auth_record(), signature.calendar_chain())
        else {
            return RuleResult::ok();
        };
        let published = &record.publication_data;
        if published.publication_time() != calendar.publication_time {
            return RuleResult::fail(
                ErrorCode::ChainInconsistent,
                format!(
                    "authentication record time {} differs from calendar time {}",
                    published.publication_time(),
                    calendar.publication_time
                ),
            );
        }
        match calendar.root() {
            Ok(root) if &root == published.publication_hash() => RuleResult::ok(),
            Ok(root) => RuleResult::fail(
                ErrorCode::ChainInconsistent,
                format!(
                    "authentication record hash {} differs from calendar root {root}",
                    published.publication_hash()
                ),
            ),
            Err(e) => fail_on(e),
        }
    }
}

/// Embedded publication record covers the calendar root
pub struct PublicationRecordConsistencyRule;

impl Rule for PublicationRecordConsistencyRule {
    fn id(&self) -> &'static str {
        "internal.publication_record"
    }

    fn evaluate(&self, session: &mut VerificationSession<'_>) -> RuleResult {
        let signature = session.signature();
        let Some(record) = signature.publication_record() else {
            return RuleResult::ok();
        };
        let Some(calendar) = signature.calendar_chain() else {
            return RuleResult::fail(
                ErrorCode::ChainInconsistent,
                "publication record without a calendar chain",
            );
        };
        if record.publication_time() != calendar.publication_time {
            return RuleResult::fail(
                ErrorCode::ChainInconsistent,
                format!(
                    "publication time {} differs from calendar time {}",
                    record.publication_time(),
                    calendar.publication_time
                ),
            );
        }
        match calendar.root() {
            Ok(root) if &root == record.publication_hash() => RuleResult::ok(),
            Ok(root) => RuleResult::fail(
                ErrorCode::ChainInconsistent,
                format!(
                    "publication hash {} differs from calendar root {root}",
                    record.publication_hash()
                ),
            ),
            Err(e) => fail_on(e),
        }
    }
}
