//! Verification results
//!
//! Rule outcomes aggregate into a verdict: FAIL stops the chain, NA continues
//! and is remembered, OK continues.

use crate::extension::ExtensionState;
use crate::policy::Policy;
use serde::{Deserialize, Serialize};
use std::fmt;
use tessera_core::{ErrorCode, Signature};
use uuid::Uuid;

/// Final answer of a verification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Every rule passed
    Ok,
    /// Inconclusive: some rule lacked the material to decide
    Na,
    /// A rule proved the signature wrong
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Verdict::Ok => "OK",
            Verdict::Na => "NA",
            Verdict::Fail => "FAIL",
        })
    }
}

/// Outcome of a single rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleOutcome {
    Ok,
    Na(ErrorCode),
    Fail(ErrorCode),
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuleOutcome::Ok => write!(f, "OK"),
            RuleOutcome::Na(code) => write!(f, "NA({code})"),
            RuleOutcome::Fail(code) => write!(f, "FAIL({code})"),
        }
    }
}

/// Outcome plus a diagnostic message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleResult {
    pub outcome: RuleOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RuleResult {
    pub fn ok() -> Self {
        Self {
            outcome: RuleOutcome::Ok,
            message: None,
        }
    }

    pub fn ok_with_message(message: impl Into<String>) -> Self {
        Self {
            outcome: RuleOutcome::Ok,
            message: Some(message.into()),
        }
    }

    pub fn na(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            outcome: RuleOutcome::Na(code),
            message: Some(message.into()),
        }
    }

    pub fn fail(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            outcome: RuleOutcome::Fail(code),
            message: Some(message.into()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome == RuleOutcome::Ok
    }
}

/// One entry of the rule trace
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub rule_id: String,
    #[serde(flatten)]
    pub result: RuleResult,
}

impl RuleRecord {
    pub fn new(rule_id: impl Into<String>, result: RuleResult) -> Self {
        Self {
            rule_id: rule_id.into(),
            result,
        }
    }
}

/// Result of one verification call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    id: Uuid,
    policy: Policy,
    verdict: Verdict,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_code: Option<ErrorCode>,
    trace: Vec<RuleRecord>,
    extension: ExtensionState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    extended_signature: Option<Signature>,
}

impl VerificationResult {
    pub(crate) fn new(
        policy: Policy,
        verdict: Verdict,
        error_code: Option<ErrorCode>,
        trace: Vec<RuleRecord>,
        extension: ExtensionState,
        extended_signature: Option<Signature>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            policy,
            verdict,
            error_code,
            trace,
            extension,
            extended_signature,
        }
    }

    /// Unique per call, for correlating logs
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    /// The FAIL code, or the last NA code of an inconclusive result
    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error_code
    }

    pub fn trace(&self) -> &[RuleRecord] {
        &self.trace
    }

    pub fn extension_state(&self) -> &ExtensionState {
        &self.extension
    }

    /// Signature extended during verification, for the caller to persist
    pub fn extended_signature(&self) -> Option<&Signature> {
        self.extended_signature.as_ref()
    }

    pub fn is_ok(&self) -> bool {
        self.verdict == Verdict::Ok
    }

    pub fn is_na(&self) -> bool {
        self.verdict == Verdict::Na
    }

    pub fn is_fail(&self) -> bool {
        self.verdict == Verdict::Fail
    }

    /// Rule that decided a FAIL
    pub fn failed_rule(&self) -> Option<&RuleRecord> {
        self.trace
            .last()
            .filter(|record| matches!(record.result.outcome, RuleOutcome::Fail(_)))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.verdict)?;
        if let Some(code) = self.error_code {
            write!(f, " {code}")?;
        }
        if let Some(rule) = self.failed_rule() {
            write!(f, " at {}", rule.rule_id)?;
        }
        write!(f, " [{}]", self.policy)
    }
}
