//! Certificate-based rules
use crate::certificate::Certificate;
use crate::result::RuleResult;
use crate::rule::{Rule, VerificationSession};
use tessera_core::ErrorCode;

/// Certificate for the authentication record's signer, or the NA to report
fn signer_certificate(session: &VerificationSession<'_>) -> Result<Certificate, RuleResult> {
    let record = session.signature().calendar_auth_record().ok_or_else(|| {
        RuleResult::na(ErrorCode::NoTrustAnchor, "no calendar authentication record")
    })?;
    let store = session
        .context()
        .certificate_store()
        .ok_or_else(|| RuleResult::na(ErrorCode::NoTrustAnchor, "no certificate store"))?;
    match store.find_certificate(&record.signer_id) {
        Ok(Some(certificate)) => Ok(certificate),
        Ok(None) => Err(RuleResult::na(
            ErrorCode::NoTrustAnchor,
            format!("no trusted certificate {}", display_id(&record.signer_id)),
        )),
        Err(e) => Err(RuleResult::na(ErrorCode::NoTrustAnchor, e.to_string())),
    }
}

/// Signer ids are usually ASCII names; anything else is shown as hex
fn display_id(id: &[u8]) -> String {
    match std::str::from_utf8(id) {
        Ok(text) if text.chars().all(|c| c.is_ascii_graphic()) => text.to_string(),
        _ => format!("0x{}", hex::encode(id)),
    }
}

/// Signature carries an authentication record
pub struct AuthRecordPresentRule;

impl Rule for AuthRecordPresentRule {
    fn id(&self) -> &'static str {
        "key.auth_record_present"
    }

    fn evaluate(&self, session: &mut VerificationSession<'_>) -> RuleResult {
        if session.signature().calendar_auth_record().is_some() {
            RuleResult::ok()
        } else {
            RuleResult::na(ErrorCode::NoTrustAnchor, "no calendar authentication record")
        }
    }
}

/// Signer certificate is in the trusted set
pub struct CertificateFoundRule;

impl Rule for CertificateFoundRule {
    fn id(&self) -> &'static str {
        "key.certificate_found"
    }

    fn evaluate(&self, session: &mut VerificationSession<'_>) -> RuleResult {
        match signer_certificate(session) {
            Ok(_) => RuleResult::ok(),
            Err(na) => na,
        }
    }
}

/// Certificate was valid when the signature was aggregated
pub struct CertificateValidityRule;

impl Rule for CertificateValidityRule {
    fn id(&self) -> &'static str {
        "key.certificate_validity"
    }

    fn evaluate(&self, session: &mut VerificationSession<'_>) -> RuleResult {
        let certificate = match signer_certificate(session) {
            Ok(certificate) => certificate,
            Err(na) => return na,
        };
        let at = session.signature().aggregation_time();
        if certificate.is_valid_at(at) {
            RuleResult::ok()
        } else {
            RuleResult::fail(
                ErrorCode::CertificateInvalid,
                format!("certificate {} not valid at {at}", display_id(&certificate.id)),
            )
        }
    }
}

/// Authentication record signature verifies under the certificate
pub struct AuthRecordSignatureRule;

impl Rule for AuthRecordSignatureRule {
    fn id(&self) -> &'static str {
        "key.auth_record_signature"
    }

    fn evaluate(&self, session: &mut VerificationSession<'_>) -> RuleResult {
        let certificate = match signer_certificate(session) {
            Ok(certificate) => certificate,
            Err(na) => return na,
        };
        let Some(record) = session.signature().calendar_auth_record() else {
            return RuleResult::na(ErrorCode::NoTrustAnchor, "no calendar authentication record");
        };
        match certificate.verify(&record.publication_data.canonical_bytes(), &record.signature) {
            Ok(()) => RuleResult::ok(),
            Err(e) => RuleResult::fail(
                ErrorCode::AuthRecordInvalid,
                format!("authentication record signature rejected: {e}"),
            ),
        }
    }
}
