//! End-to-end verification against the reference calendar
use ed25519_dalek::SigningKey;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tessera_calendar::{Calendar, PublicationsFile};
use tessera_core::{CalendarChain, DataHash, DataHasher, ErrorCode, HashAlgorithm, PublicationData, Signature};
use tessera_policy::{
    Extender, ExtenderError, ExtensionState, Policy, Verdict, VerificationContext, VerifierConfig,
};

const T: u64 = 1_458_000_000;
const DOCUMENT: &[u8] = b"This is my document";

fn calendar() -> Arc<Calendar> {
    Arc::new(Calendar::new(
        HashAlgorithm::Sha256,
        SigningKey::from_bytes(&[11u8; 32]),
        "tessera-cal-1",
    ))
}

fn document_hash(bytes: &[u8]) -> DataHash {
    let mut hasher = DataHasher::new(HashAlgorithm::Sha256);
    hasher.update(bytes).unwrap();
    hasher.finalize().unwrap()
}

fn signed(calendar: &Calendar) -> Signature {
    calendar.sign(T, document_hash(DOCUMENT)).unwrap()
}

struct Unreachable;

impl Extender for Unreachable {
    fn fetch_calendar_chain(&self, _from: u64, _to: u64) -> Result<CalendarChain, ExtenderError> {
        Err(ExtenderError::Network("connection refused".into()))
    }
}

struct Stalled(Arc<Calendar>);

impl Extender for Stalled {
    fn fetch_calendar_chain(&self, from: u64, to: u64) -> Result<CalendarChain, ExtenderError> {
        thread::sleep(Duration::from_millis(400));
        self.0.fetch_calendar_chain(from, to)
    }
}

#[test]
fn test_key_policy_accepts_fresh_signature() {
    let cal = calendar();
    let ctx = VerificationContext::builder()
        .with_document_hash(document_hash(DOCUMENT))
        .with_signature(signed(&cal))
        .with_policy(Policy::KeyBased)
        .with_certificate_store(cal.clone())
        .build()
        .unwrap();
    let result = tessera_policy::verify(&ctx);
    assert_eq!(result.verdict(), Verdict::Ok, "{result}");
    assert_eq!(result.extension_state(), &ExtensionState::NotExtended);
}

#[test]
fn test_flipped_bit_is_hash_mismatch() {
    let cal = calendar();
    let sig = signed(&cal);
    let mut tampered = DOCUMENT.to_vec();
    tampered[0] ^= 0x01;

    for policy in Policy::ALL {
        let ctx = VerificationContext::builder()
            .with_document_hash(document_hash(&tampered))
            .with_signature(sig.clone())
            .with_policy(policy)
            .with_certificate_store(cal.clone())
            .with_publications_catalog(cal.clone())
            .with_user_publication(PublicationData::new(T, document_hash(b"anchor")))
            .build()
            .unwrap();
        let result = tessera_policy::verify(&ctx);
        assert_eq!(result.verdict(), Verdict::Fail, "{policy}");
        assert_eq!(result.error_code(), Some(ErrorCode::HashMismatch), "{policy}");
    }
}

#[test]
fn test_catalog_policy_without_extension_is_na() {
    let cal = calendar();
    let sig = signed(&cal);
    let publication = cal.publish(T + 3_600).unwrap();
    let file = PublicationsFile::new().with_publication(publication);

    let ctx = VerificationContext::builder()
        .with_document_hash(document_hash(DOCUMENT))
        .with_signature(sig)
        .with_policy(Policy::PublicationsFileBased)
        .with_publications_catalog(Arc::new(file))
        .build()
        .unwrap();
    let result = tessera_policy::verify(&ctx);
    assert_eq!(result.verdict(), Verdict::Na);
    assert_eq!(result.error_code(), Some(ErrorCode::NoTrustAnchor));
}

#[test]
fn test_catalog_policy_extends_and_returns_signature() {
    let cal = calendar();
    let sig = signed(&cal);
    for (i, t) in [T + 10, T + 20, T + 30].into_iter().enumerate() {
        cal.sign(t, document_hash(format!("other {i}").as_bytes())).unwrap();
    }
    cal.publish(T + 3_600).unwrap();

    let ctx = VerificationContext::builder()
        .with_document_hash(document_hash(DOCUMENT))
        .with_signature(sig.clone())
        .with_policy(Policy::PublicationsFileBased)
        .with_publications_catalog(cal.clone())
        .with_extending_allowed(true)
        .with_extender(cal.clone())
        .build()
        .unwrap();
    let result = tessera_policy::verify(&ctx);
    assert_eq!(result.verdict(), Verdict::Ok, "{result}");
    assert_eq!(
        result.extension_state(),
        &ExtensionState::Extended {
            publication_time: T + 3_600
        }
    );

    let extended = result.extended_signature().unwrap().clone();
    assert!(extended.is_extended());
    assert!(extended.calendar_auth_record().is_none());
    assert!(!sig.is_extended());

    // the extended signature now verifies offline against the catalog
    let bytes = extended.to_bytes().unwrap();
    let reloaded = Signature::from_bytes(&bytes).unwrap();
    let offline = VerificationContext::builder()
        .with_document_hash(document_hash(DOCUMENT))
        .with_signature(reloaded)
        .with_policy(Policy::PublicationsFileBased)
        .with_publications_catalog(cal.clone())
        .build()
        .unwrap();
    assert!(tessera_policy::verify(&offline).is_ok());
}

#[test]
fn test_user_publication_from_code() {
    let cal = calendar();
    let sig = signed(&cal);
    let code = cal.publish(T + 86_400).unwrap().publication_data.format();
    let anchor = PublicationData::parse(&code).unwrap();

    let ctx = VerificationContext::builder()
        .with_document_hash(document_hash(DOCUMENT))
        .with_signature(sig)
        .with_policy(Policy::UserProvidedPublicationBased)
        .with_user_publication(anchor)
        .with_extending_allowed(true)
        .with_extender(cal.clone())
        .build()
        .unwrap();
    let result = tessera_policy::verify(&ctx);
    assert!(result.is_ok(), "{result}");
}

#[test]
fn test_failing_extender_is_fail_not_na() {
    let cal = calendar();
    let sig = signed(&cal);
    cal.publish(T + 60).unwrap();

    let ctx = VerificationContext::builder()
        .with_document_hash(document_hash(DOCUMENT))
        .with_signature(sig)
        .with_policy(Policy::PublicationsFileBased)
        .with_publications_catalog(cal.clone())
        .with_extending_allowed(true)
        .with_extender(Arc::new(Unreachable))
        .build()
        .unwrap();
    let result = tessera_policy::verify(&ctx);
    assert_eq!(result.verdict(), Verdict::Fail);
    assert_eq!(result.error_code(), Some(ErrorCode::ExtensionError));
    assert!(matches!(
        result.extension_state(),
        ExtensionState::ExtensionFailed {
            code: ErrorCode::ExtensionError,
            ..
        }
    ));
}

#[test]
fn test_configured_timeout() {
    let cal = calendar();
    let sig = signed(&cal);
    cal.publish(T + 60).unwrap();
    let config =
        VerifierConfig::from_yaml("extension_timeout_ms: 50\nextending_allowed: true\n").unwrap();

    let ctx = VerificationContext::builder()
        .with_config(&config)
        .with_document_hash(document_hash(DOCUMENT))
        .with_signature(sig)
        .with_policy(Policy::PublicationsFileBased)
        .with_publications_catalog(cal.clone())
        .with_extender(Arc::new(Stalled(cal.clone())))
        .build()
        .unwrap();
    let result = tessera_policy::verify(&ctx);
    assert_eq!(result.verdict(), Verdict::Fail);
    assert_eq!(result.error_code(), Some(ErrorCode::ExtensionTimeout));
}

#[test]
fn test_wrong_user_anchor_fails() {
    let cal = calendar();
    let sig = signed(&cal);
    cal.publish(T + 60).unwrap();
    let forged = PublicationData::new(T + 60, document_hash(b"not the calendar root"));

    let ctx = VerificationContext::builder()
        .with_document_hash(document_hash(DOCUMENT))
        .with_signature(sig)
        .with_policy(Policy::UserProvidedPublicationBased)
        .with_user_publication(forged)
        .with_extending_allowed(true)
        .with_extender(cal.clone())
        .build()
        .unwrap();
    let result = tessera_policy::verify(&ctx);
    assert_eq!(result.verdict(), Verdict::Fail);
    assert_eq!(result.error_code(), Some(ErrorCode::ChainInconsistent));
    // nothing a caller could persist
    assert!(result.extended_signature().is_none());
    assert!(matches!(
        result.extension_state(),
        ExtensionState::ExtensionFailed {
            code: ErrorCode::ChainInconsistent,
            ..
        }
    ));
}

#[test]
fn test_wrong_catalog_hash_yields_no_extended_signature() {
    let cal = calendar();
    let sig = signed(&cal);
    cal.publish(T + 60).unwrap();
    let forged = PublicationsFile::new().with_publication(tessera_core::PublicationRecord::new(
        PublicationData::new(T + 60, document_hash(b"not the calendar root")),
    ));

    let ctx = VerificationContext::builder()
        .with_document_hash(document_hash(DOCUMENT))
        .with_signature(sig)
        .with_policy(Policy::PublicationsFileBased)
        .with_publications_catalog(Arc::new(forged))
        .with_extending_allowed(true)
        .with_extender(cal.clone())
        .build()
        .unwrap();
    let result = tessera_policy::verify(&ctx);
    assert_eq!(result.verdict(), Verdict::Fail);
    assert_eq!(result.error_code(), Some(ErrorCode::ChainInconsistent));
    assert!(result.extended_signature().is_none());
}

#[test]
fn test_untrusted_calendar_key_is_na() {
    let cal = calendar();
    let sig = signed(&cal);
    let stranger = Calendar::new(
        HashAlgorithm::Sha256,
        SigningKey::from_bytes(&[12u8; 32]),
        "another-cal",
    );
    let store = PublicationsFile::new().with_certificate(stranger.certificate());

    let ctx = VerificationContext::builder()
        .with_document_hash(document_hash(DOCUMENT))
        .with_signature(sig)
        .with_policy(Policy::KeyBased)
        .with_certificate_store(Arc::new(store))
        .build()
        .unwrap();
    let result = tessera_policy::verify(&ctx);
    assert_eq!(result.verdict(), Verdict::Na);
    assert_eq!(result.error_code(), Some(ErrorCode::NoTrustAnchor));
}

#[test]
fn test_result_json_and_logging() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    let cal = calendar();
    let ctx = VerificationContext::builder()
        .with_document_hash(document_hash(DOCUMENT))
        .with_signature(signed(&cal))
        .with_policy(Policy::CalendarBased)
        .build()
        .unwrap();
    let result = tessera_policy::verify(&ctx);
    let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    assert_eq!(json["verdict"], "OK");
    assert_eq!(json["policy"], "CALENDAR");
    assert_eq!(json["id"], result.id().to_string());
}
