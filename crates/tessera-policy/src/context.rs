//! Verification context
use crate::config::VerifierConfig;
use crate::extension::TimeoutExtender;
use crate::policy::Policy;
use crate::services::{CertificateStore, Extender, PublicationsCatalog};
use std::sync::Arc;
use std::time::Duration;
use tessera_core::{DataHash, ErrorCode, PublicationData, Signature};
use thiserror::Error;

/// Builder validation failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContextError {
    #[error("CONTEXT/missing document hash")]
    MissingDocumentHash,

    #[error("CONTEXT/missing signature")]
    MissingSignature,

    #[error("CONTEXT/extending allowed but no extender configured")]
    MissingExtender,

    #[error("CONTEXT/policy {0} requires a publications catalog")]
    MissingPublicationsCatalog(Policy),

    #[error("CONTEXT/policy {0} requires a user publication")]
    MissingUserPublication(Policy),

    #[error("CONTEXT/policy {0} requires a certificate store")]
    MissingCertificateStore(Policy),
}

impl ContextError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::InvalidState
    }
}

/// Everything one verification needs. Immutable once built.
#[derive(Clone)]
pub struct VerificationContext {
    document_hash: DataHash,
    signature: Signature,
    policy: Policy,
    user_publication: Option<PublicationData>,
    extending_allowed: bool,
    extension_timeout: Option<Duration>,
    extender: Option<Arc<dyn Extender>>,
    publications_catalog: Option<Arc<dyn PublicationsCatalog>>,
    certificate_store: Option<Arc<dyn CertificateStore>>,
}

impl VerificationContext {
    pub fn builder() -> VerificationContextBuilder {
        VerificationContextBuilder::default()
    }

    pub fn document_hash(&self) -> &DataHash {
        &self.document_hash
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    pub fn user_publication(&self) -> Option<&PublicationData> {
        self.user_publication.as_ref()
    }

    pub fn is_extending_allowed(&self) -> bool {
        self.extending_allowed
    }

    /// Deadline applied to each extension call, if any
    pub fn extension_timeout(&self) -> Option<Duration> {
        self.extension_timeout
    }

    pub fn extender(&self) -> Option<&dyn Extender> {
        self.extender.as_deref()
    }

    pub fn publications_catalog(&self) -> Option<&dyn PublicationsCatalog> {
        self.publications_catalog.as_deref()
    }

    pub fn certificate_store(&self) -> Option<&dyn CertificateStore> {
        self.certificate_store.as_deref()
    }
}

impl std::fmt::Debug for VerificationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("VerificationContext")
            .field("document_hash", &self.document_hash)
            .field("policy", &self.policy)
            .field("aggregation_time", &self.signature.aggregation_time())
            .field("user_publication", &self.user_publication)
            .field("extending_allowed", &self.extending_allowed)
            .field("extension_timeout", &self.extension_timeout)
            .field("extender", &self.extender.is_some())
            .field("publications_catalog", &self.publications_catalog.is_some())
            .field("certificate_store", &self.certificate_store.is_some())
            .finish()
    }
}

/// Validating builder for [`VerificationContext`].
///
/// Starts from the [`VerifierConfig`] defaults, so the extension timeout is
/// 30 s unless configured otherwise.
pub struct VerificationContextBuilder {
    document_hash: Option<DataHash>,
    signature: Option<Signature>,
    policy: Option<Policy>,
    user_publication: Option<PublicationData>,
    extending_allowed: bool,
    extension_timeout: Option<Duration>,
    extender: Option<Arc<dyn Extender>>,
    publications_catalog: Option<Arc<dyn PublicationsCatalog>>,
    certificate_store: Option<Arc<dyn CertificateStore>>,
}

impl Default for VerificationContextBuilder {
    fn default() -> Self {
        let config = VerifierConfig::default();
        Self {
            document_hash: None,
            signature: None,
            policy: None,
            user_publication: None,
            extending_allowed: config.extending_allowed,
            extension_timeout: config.extension_timeout(),
            extender: None,
            publications_catalog: None,
            certificate_store: None,
        }
    }
}

impl VerificationContextBuilder {
    /// Apply configuration defaults; later `with_*` calls override them
    pub fn with_config(mut self, config: &VerifierConfig) -> Self {
        self.extending_allowed = config.extending_allowed;
        self.extension_timeout = config.extension_timeout();
        self
    }

    pub fn with_document_hash(mut self, hash: DataHash) -> Self {
        self.document_hash = Some(hash);
        self
    }

    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Defaults to [`Policy::CalendarBased`]
    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_user_publication(mut self, publication: PublicationData) -> Self {
        self.user_publication = Some(publication);
        self
    }

    pub fn with_extending_allowed(mut self, allowed: bool) -> Self {
        self.extending_allowed = allowed;
        self
    }

    pub fn with_extension_timeout(mut self, timeout: Duration) -> Self {
        self.extension_timeout = Some(timeout);
        self
    }

    /// Let extension calls run without a deadline
    pub fn without_extension_timeout(mut self) -> Self {
        self.extension_timeout = None;
        self
    }

    pub fn with_extender(mut self, extender: Arc<dyn Extender>) -> Self {
        self.extender = Some(extender);
        self
    }

    pub fn with_publications_catalog(mut self, catalog: Arc<dyn PublicationsCatalog>) -> Self {
        self.publications_catalog = Some(catalog);
        self
    }

    pub fn with_certificate_store(mut self, store: Arc<dyn CertificateStore>) -> Self {
        self.certificate_store = Some(store);
        self
    }

    pub fn build(self) -> Result<VerificationContext, ContextError> {
        let document_hash = self.document_hash.ok_or(ContextError::MissingDocumentHash)?;
        let signature = self.signature.ok_or(ContextError::MissingSignature)?;
        let policy = self.policy.unwrap_or(Policy::CalendarBased);

        if self.extending_allowed && self.extender.is_none() {
            return Err(ContextError::MissingExtender);
        }
        if policy.requires_publications_catalog() && self.publications_catalog.is_none() {
            return Err(ContextError::MissingPublicationsCatalog(policy));
        }
        if policy.requires_user_publication() && self.user_publication.is_none() {
            return Err(ContextError::MissingUserPublication(policy));
        }
        if policy.requires_certificate_store() && self.certificate_store.is_none() {
            return Err(ContextError::MissingCertificateStore(policy));
        }

        let extender = match (self.extender, self.extension_timeout) {
            (Some(inner), Some(timeout)) => {
                Some(Arc::new(TimeoutExtender::new(inner, timeout)) as Arc<dyn Extender>)
            }
            (extender, _) => extender,
        };

        Ok(VerificationContext {
            document_hash,
            signature,
            policy,
            user_publication: self.user_publication,
            extending_allowed: self.extending_allowed,
            extension_timeout: self.extension_timeout,
            extender,
            publications_catalog: self.publications_catalog,
            certificate_store: self.certificate_store,
        })
    }
}
