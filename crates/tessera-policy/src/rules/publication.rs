//! Publication-anchored rules
//!
//! Both rules first try the publication embedded in the signature. When that
//! cannot decide, the signature is extended to the trusted publication if the
//! context allows it.

use super::fail_on;
use crate::result::RuleResult;
use crate::rule::{Rule, VerificationSession};
use tessera_core::{ErrorCode, PublicationRecord};

/// Extend to `target` and check the extended signature reaches it
fn extend_and_check(session: &mut VerificationSession<'_>, target: &PublicationRecord) -> RuleResult {
    if !session.context().is_extending_allowed() {
        return RuleResult::na(
            ErrorCode::NoTrustAnchor,
            format!(
                "signature not anchored to publication at {} and extending is not allowed",
                target.publication_time()
            ),
        );
    }
    let extended = match session.extend_to(target) {
        Ok(extended) => extended,
        Err(failure) => return RuleResult::fail(failure.code, failure.message),
    };
    let Some(calendar) = extended.calendar_chain() else {
        return RuleResult::fail(ErrorCode::ExtensionError, "extended signature has no calendar chain");
    };

    let aggregation_root = match extended.aggregation_chain().root() {
        Ok(root) => root,
        Err(e) => return fail_on(e),
    };
    if calendar.input_hash != aggregation_root {
        return RuleResult::fail(
            ErrorCode::ChainInconsistent,
            format!(
                "extended calendar chain input {} is not the aggregation root {aggregation_root}",
                calendar.input_hash
            ),
        );
    }
    let root = match calendar.root() {
        Ok(root) => root,
        Err(e) => return fail_on(e),
    };
    if calendar.publication_time != target.publication_time() || &root != target.publication_hash() {
        return RuleResult::fail(
            ErrorCode::ChainInconsistent,
            format!(
                "extended calendar root {root} does not match publication {}",
                target.publication_data
            ),
        );
    }
    RuleResult::ok_with_message(format!("extended to publication at {}", target.publication_time()))
}

fn compare_embedded(embedded: &PublicationRecord, trusted: &PublicationRecord) -> RuleResult {
    if embedded.publication_hash() == trusted.publication_hash() {
        RuleResult::ok()
    } else {
        RuleResult::fail(
            ErrorCode::ChainInconsistent,
            format!(
                "embedded publication {} differs from trusted {}",
                embedded.publication_data, trusted.publication_data
            ),
        )
    }
}

/// Signature is anchored to a publication from the trusted catalog
pub struct CatalogPublicationRule;

impl Rule for CatalogPublicationRule {
    fn id(&self) -> &'static str {
        "publications_file.publication"
    }

    fn evaluate(&self, session: &mut VerificationSession<'_>) -> RuleResult {
        let Some(catalog) = session.context().publications_catalog() else {
            return RuleResult::na(ErrorCode::NoTrustAnchor, "no publications catalog");
        };
        let embedded = session.signature().publication_record().cloned();

        if let Some(embedded) = &embedded {
            match catalog.find(embedded.publication_time()) {
                Ok(Some(trusted)) => return compare_embedded(embedded, &trusted),
                Ok(None) => {}
                Err(e) => return RuleResult::na(ErrorCode::NoTrustAnchor, e.to_string()),
            }
        }

        let aggregation_time = session.signature().aggregation_time();
        let target = match catalog.lookup(aggregation_time) {
            Ok(Some(target)) => target,
            Ok(None) => {
                return RuleResult::na(
                    ErrorCode::NoTrustAnchor,
                    format!("no catalog publication at or after {aggregation_time}"),
                )
            }
            Err(e) => return RuleResult::na(ErrorCode::NoTrustAnchor, e.to_string()),
        };
        if let Some(embedded) = &embedded {
            if embedded.publication_time() > target.publication_time() {
                return RuleResult::na(
                    ErrorCode::NoTrustAnchor,
                    format!(
                        "embedded publication at {} is not in the catalog",
                        embedded.publication_time()
                    ),
                );
            }
        }
        extend_and_check(session, &target)
    }
}

/// Signature is anchored to the publication supplied by the caller
pub struct UserPublicationRule;

impl Rule for UserPublicationRule {
    fn id(&self) -> &'static str {
        "user_publication.publication"
    }

    fn evaluate(&self, session: &mut VerificationSession<'_>) -> RuleResult {
        let Some(anchor) = session.context().user_publication() else {
            return RuleResult::na(ErrorCode::NoTrustAnchor, "no user publication");
        };
        let target = PublicationRecord::new(anchor.clone());
        let signature = session.signature();

        if let Some(embedded) = signature.publication_record() {
            if embedded.publication_time() == anchor.publication_time() {
                return compare_embedded(embedded, &target);
            }
            if embedded.publication_time() > anchor.publication_time() {
                return RuleResult::na(
                    ErrorCode::NoTrustAnchor,
                    format!(
                        "embedded publication at {} is newer than the user publication",
                        embedded.publication_time()
                    ),
                );
            }
        }
        if anchor.publication_time() < signature.aggregation_time() {
            return RuleResult::na(
                ErrorCode::NoTrustAnchor,
                format!(
                    "user publication at {} predates aggregation at {}",
                    anchor.publication_time(),
                    signature.aggregation_time()
                ),
            );
        }
        extend_and_check(session, &target)
    }
}
