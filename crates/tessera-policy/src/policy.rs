//! Trust policies
//!
//! Each policy is a fixed, ordered rule chain. The internal consistency rules
//! always come first.

use crate::context::VerificationContext;
use crate::engine::evaluate_rules;
use crate::result::VerificationResult;
use crate::rule::Rule;
use crate::rules::calendar::{CalendarChainPresentRule, CalendarRootRule, RecordedCalendarRootRule};
use crate::rules::internal::{
    AggregationChainRule, AuthRecordConsistencyRule, CalendarChainInputRule, DocumentHashRule,
    PublicationRecordConsistencyRule,
};
use crate::rules::key::{
    AuthRecordPresentRule, AuthRecordSignatureRule, CertificateFoundRule, CertificateValidityRule,
};
use crate::rules::publication::{CatalogPublicationRule, UserPublicationRule};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

static KEY_RULES: &[&dyn Rule] = &[
    &DocumentHashRule,
    &AggregationChainRule,
    &CalendarChainInputRule,
    &AuthRecordConsistencyRule,
    &PublicationRecordConsistencyRule,
    &CalendarChainPresentRule,
    &AuthRecordPresentRule,
    &CertificateFoundRule,
    &CertificateValidityRule,
    &AuthRecordSignatureRule,
];

static CALENDAR_RULES: &[&dyn Rule] = &[
    &DocumentHashRule,
    &AggregationChainRule,
    &CalendarChainInputRule,
    &AuthRecordConsistencyRule,
    &PublicationRecordConsistencyRule,
    &CalendarChainPresentRule,
    &RecordedCalendarRootRule,
    &CalendarRootRule,
];

static PUBLICATIONS_FILE_RULES: &[&dyn Rule] = &[
    &DocumentHashRule,
    &AggregationChainRule,
    &CalendarChainInputRule,
    &AuthRecordConsistencyRule,
    &PublicationRecordConsistencyRule,
    &CatalogPublicationRule,
];

static USER_PUBLICATION_RULES: &[&dyn Rule] = &[
    &DocumentHashRule,
    &AggregationChainRule,
    &CalendarChainInputRule,
    &AuthRecordConsistencyRule,
    &PublicationRecordConsistencyRule,
    &UserPublicationRule,
];

/// Built-in trust models
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Policy {
    /// Authentication record verified with a trusted certificate
    #[serde(rename = "KEY")]
    KeyBased,
    /// Calendar chain checked against the root recorded in the signature
    #[serde(rename = "CALENDAR")]
    CalendarBased,
    /// Anchored to a publication from a trusted catalog
    #[serde(rename = "PUBLICATIONS_FILE")]
    PublicationsFileBased,
    /// Anchored to a publication code supplied by the caller
    #[serde(rename = "USER_PUBLICATION")]
    UserProvidedPublicationBased,
}

impl Policy {
    pub const ALL: [Policy; 4] = [
        Policy::KeyBased,
        Policy::CalendarBased,
        Policy::PublicationsFileBased,
        Policy::UserProvidedPublicationBased,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Policy::KeyBased => "KEY",
            Policy::CalendarBased => "CALENDAR",
            Policy::PublicationsFileBased => "PUBLICATIONS_FILE",
            Policy::UserProvidedPublicationBased => "USER_PUBLICATION",
        }
    }

    pub fn rules(self) -> &'static [&'static dyn Rule] {
        match self {
            Policy::KeyBased => KEY_RULES,
            Policy::CalendarBased => CALENDAR_RULES,
            Policy::PublicationsFileBased => PUBLICATIONS_FILE_RULES,
            Policy::UserProvidedPublicationBased => USER_PUBLICATION_RULES,
        }
    }

    pub fn requires_publications_catalog(self) -> bool {
        self == Policy::PublicationsFileBased
    }

    pub fn requires_user_publication(self) -> bool {
        self == Policy::UserProvidedPublicationBased
    }

    pub fn requires_certificate_store(self) -> bool {
        self == Policy::KeyBased
    }

    /// Run this policy's rule chain over `context`
    pub fn evaluate(self, context: &VerificationContext) -> VerificationResult {
        evaluate_rules(self, self.rules(), context)
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Policy::ALL
            .into_iter()
            .find(|policy| policy.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown policy `{s}`"))
    }
}
