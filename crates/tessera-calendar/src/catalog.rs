//! Trusted publications and certificates held in memory
use std::collections::BTreeMap;
use tessera_core::{PublicationData, PublicationRecord, TesseraError};
use tessera_policy::{CatalogError, Certificate, CertificateStore, PublicationsCatalog};

/// A publications file: trusted publications plus calendar certificates
#[derive(Debug, Clone, Default)]
pub struct PublicationsFile {
    publications: BTreeMap<u64, PublicationRecord>,
    certificates: Vec<Certificate>,
}

impl PublicationsFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from printed publication codes
    pub fn from_codes<'a>(codes: impl IntoIterator<Item = &'a str>) -> Result<Self, TesseraError> {
        let mut file = Self::new();
        for code in codes {
            file.insert(PublicationRecord::new(PublicationData::parse(code.trim())?));
        }
        Ok(file)
    }

    pub fn with_publication(mut self, record: PublicationRecord) -> Self {
        self.insert(record);
        self
    }

    pub fn with_certificate(mut self, certificate: Certificate) -> Self {
        self.certificates.push(certificate);
        self
    }

    /// A later record for the same time replaces the earlier one
    pub fn insert(&mut self, record: PublicationRecord) {
        self.publications.insert(record.publication_time(), record);
    }

    pub fn len(&self) -> usize {
        self.publications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.publications.is_empty()
    }

    pub fn latest(&self) -> Option<&PublicationRecord> {
        self.publications.values().next_back()
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }
}

impl PublicationsCatalog for PublicationsFile {
    fn lookup(&self, time: u64) -> Result<Option<PublicationRecord>, CatalogError> {
        Ok(self.publications.range(time..).next().map(|(_, r)| r.clone()))
    }

    fn find(&self, publication_time: u64) -> Result<Option<PublicationRecord>, CatalogError> {
        Ok(self.publications.get(&publication_time).cloned())
    }
}

impl CertificateStore for PublicationsFile {
    fn find_certificate(&self, id: &[u8]) -> Result<Option<Certificate>, CatalogError> {
        Ok(self.certificates.iter().find(|c| c.id == id).cloned())
    }
}
