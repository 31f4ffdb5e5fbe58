//! Keyless signature model and its binary container
//!
//! Container layout: magic `TSIG`, version byte, then `tag | len_u32 | body`
//! elements in strictly increasing tag order. Decoding accepts only the
//! canonical encoding, so `to_bytes(from_bytes(b)) == b`.

use crate::chain::{AggregationChain, CalendarChain, ChainLink, LinkDirection};
use crate::codec::{Reader, Writer};
use crate::error::{Result, TesseraError};
use crate::hash::{DataHash, HashAlgorithm};
use crate::publication::{PublicationData, PublicationRecord};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

pub const CONTAINER_MAGIC: &[u8; 4] = b"TSIG";
pub const CONTAINER_VERSION: u8 = 1;

const TAG_AGGREGATION: u8 = 1;
const TAG_CALENDAR: u8 = 2;
const TAG_AUTH_RECORD: u8 = 3;
const TAG_PUBLICATION: u8 = 4;

/// Calendar root signed by the calendar operator's key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarAuthRecord {
    pub publication_data: PublicationData,
    /// Identifier of the signing certificate
    pub signer_id: Vec<u8>,
    /// Signature over `publication_data.canonical_bytes()`
    pub signature: Vec<u8>,
}

impl CalendarAuthRecord {
    pub fn new(
        publication_data: PublicationData,
        signer_id: impl Into<Vec<u8>>,
        signature: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            publication_data,
            signer_id: signer_id.into(),
            signature: signature.into(),
        }
    }
}

/// Time-stamped proof binding an input hash to a calendar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    aggregation_chain: AggregationChain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calendar_chain: Option<CalendarChain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    calendar_auth_record: Option<CalendarAuthRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    publication_record: Option<PublicationRecord>,
}

impl Signature {
    pub fn new(aggregation_chain: AggregationChain) -> Self {
        Self {
            aggregation_chain,
            calendar_chain: None,
            calendar_auth_record: None,
            publication_record: None,
        }
    }

    pub fn with_calendar_chain(mut self, chain: CalendarChain) -> Self {
        self.calendar_chain = Some(chain);
        self
    }

    pub fn with_calendar_auth_record(mut self, record: CalendarAuthRecord) -> Self {
        self.calendar_auth_record = Some(record);
        self
    }

    pub fn with_publication_record(mut self, record: PublicationRecord) -> Self {
        self.publication_record = Some(record);
        self
    }

    pub fn aggregation_chain(&self) -> &AggregationChain {
        &self.aggregation_chain
    }

    pub fn calendar_chain(&self) -> Option<&CalendarChain> {
        self.calendar_chain.as_ref()
    }

    pub fn calendar_auth_record(&self) -> Option<&CalendarAuthRecord> {
        self.calendar_auth_record.as_ref()
    }

    pub fn publication_record(&self) -> Option<&PublicationRecord> {
        self.publication_record.as_ref()
    }

    pub fn input_hash(&self) -> &DataHash {
        &self.aggregation_chain.input_hash
    }

    pub fn aggregation_time(&self) -> u64 {
        self.aggregation_chain.aggregation_time
    }

    /// Whether the signature is anchored to a publication
    pub fn is_extended(&self) -> bool {
        self.publication_record.is_some()
    }

    /// A new signature anchored to `record` through `calendar_chain`.
    ///
    /// The authentication record is dropped since it covers the replaced
    /// calendar root. The chain must start at this signature's aggregation
    /// time and end at the record's time and hash.
    pub fn extend(
        &self,
        calendar_chain: CalendarChain,
        record: PublicationRecord,
    ) -> Result<Signature> {
        if calendar_chain.aggregation_time != self.aggregation_time() {
            return Err(TesseraError::chain(format!(
                "calendar chain starts at {}, signature aggregated at {}",
                calendar_chain.aggregation_time,
                self.aggregation_time()
            )));
        }
        if calendar_chain.publication_time != record.publication_time() {
            return Err(TesseraError::chain(format!(
                "calendar chain ends at {}, publication is at {}",
                calendar_chain.publication_time,
                record.publication_time()
            )));
        }
        let root = calendar_chain.root()?;
        if &root != record.publication_hash() {
            return Err(TesseraError::chain(format!(
                "calendar root {root} differs from publication hash {}",
                record.publication_hash()
            )));
        }
        Ok(Signature {
            aggregation_chain: self.aggregation_chain.clone(),
            calendar_chain: Some(calendar_chain),
            calendar_auth_record: None,
            publication_record: Some(record),
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut w = Writer::new();
        w.raw(CONTAINER_MAGIC).u8(CONTAINER_VERSION);
        w.element(TAG_AGGREGATION, &encode_aggregation(&self.aggregation_chain)?)?;
        if let Some(chain) = &self.calendar_chain {
            w.element(TAG_CALENDAR, &encode_calendar(chain)?)?;
        }
        if let Some(record) = &self.calendar_auth_record {
            w.element(TAG_AUTH_RECORD, &encode_auth_record(record)?)?;
        }
        if let Some(record) = &self.publication_record {
            w.element(TAG_PUBLICATION, &encode_publication_record(record)?)?;
        }
        Ok(w.into_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let mut r = Reader::new(bytes);
        if r.take(CONTAINER_MAGIC.len())? != CONTAINER_MAGIC {
            return Err(TesseraError::format("not a signature container"));
        }
        let version = r.u8()?;
        if version != CONTAINER_VERSION {
            return Err(TesseraError::format(format!(
                "unsupported container version {version}"
            )));
        }

        let mut aggregation = None;
        let mut calendar = None;
        let mut auth_record = None;
        let mut publication = None;
        let mut last_tag = 0u8;
        while !r.is_empty() {
            let (tag, mut body) = r.element()?;
            if tag <= last_tag {
                return Err(TesseraError::format(format!(
                    "element {tag} out of order after {last_tag}"
                )));
            }
            last_tag = tag;
            match tag {
                TAG_AGGREGATION => aggregation = Some(decode_aggregation(&mut body)?),
                TAG_CALENDAR => calendar = Some(decode_calendar(&mut body)?),
                TAG_AUTH_RECORD => auth_record = Some(decode_auth_record(&mut body)?),
                TAG_PUBLICATION => publication = Some(decode_publication_record(&mut body)?),
                other => {
                    return Err(TesseraError::format(format!("unknown element tag {other}")))
                }
            }
            body.finish("element body")?;
        }

        let aggregation_chain =
            aggregation.ok_or_else(|| TesseraError::format("missing aggregation chain"))?;
        Ok(Signature {
            aggregation_chain,
            calendar_chain: calendar,
            calendar_auth_record: auth_record,
            publication_record: publication,
        })
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes)
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }
}

fn direction_byte(direction: LinkDirection) -> u8 {
    match direction {
        LinkDirection::Left => 0,
        LinkDirection::Right => 1,
    }
}

fn read_direction(r: &mut Reader<'_>) -> Result<LinkDirection> {
    match r.u8()? {
        0 => Ok(LinkDirection::Left),
        1 => Ok(LinkDirection::Right),
        other => Err(TesseraError::format(format!("invalid link direction {other}"))),
    }
}

fn link_count(links: &[ChainLink]) -> Result<u16> {
    u16::try_from(links.len())
        .map_err(|_| TesseraError::format(format!("{} links exceed container limit", links.len())))
}

fn encode_aggregation(chain: &AggregationChain) -> Result<Vec<u8>> {
    let mut w = Writer::new();
    w.u64(chain.aggregation_time)
        .u8(chain.algorithm.id())
        .imprint(&chain.input_hash)
        .u16(link_count(&chain.links)?);
    for link in &chain.links {
        w.u8(direction_byte(link.direction))
            .u8(link.level_correction)
            .imprint(&link.sibling);
    }
    Ok(w.into_bytes())
}

fn decode_aggregation(r: &mut Reader<'_>) -> Result<AggregationChain> {
    let aggregation_time = r.u64()?;
    let algorithm = HashAlgorithm::from_id(r.u8()?)?;
    let input_hash = r.imprint()?;
    let count = r.u16()?;
    let mut links = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let direction = read_direction(r)?;
        let level_correction = r.u8()?;
        let sibling = r.imprint()?;
        links.push(ChainLink {
            direction,
            sibling,
            level_correction,
        });
    }
    Ok(AggregationChain {
        aggregation_time,
        algorithm,
        input_hash,
        links,
    })
}

fn encode_calendar(chain: &CalendarChain) -> Result<Vec<u8>> {
    let mut w = Writer::new();
    w.u64(chain.publication_time)
        .u64(chain.aggregation_time)
        .u8(chain.algorithm.id())
        .imprint(&chain.input_hash)
        .u16(link_count(&chain.links)?);
    for link in &chain.links {
        if link.level_correction != 0 {
            return Err(TesseraError::format(
                "calendar links cannot carry a level correction",
            ));
        }
        w.u8(direction_byte(link.direction)).imprint(&link.sibling);
    }
    Ok(w.into_bytes())
}

fn decode_calendar(r: &mut Reader<'_>) -> Result<CalendarChain> {
    let publication_time = r.u64()?;
    let aggregation_time = r.u64()?;
    let algorithm = HashAlgorithm::from_id(r.u8()?)?;
    let input_hash = r.imprint()?;
    let count = r.u16()?;
    let mut links = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let direction = read_direction(r)?;
        let sibling = r.imprint()?;
        links.push(ChainLink {
            direction,
            sibling,
            level_correction: 0,
        });
    }
    Ok(CalendarChain {
        publication_time,
        aggregation_time,
        algorithm,
        input_hash,
        links,
    })
}

fn encode_publication_data(w: &mut Writer, data: &PublicationData) {
    w.u64(data.publication_time()).imprint(data.publication_hash());
}

fn decode_publication_data(r: &mut Reader<'_>) -> Result<PublicationData> {
    let time = r.u64()?;
    Ok(PublicationData::new(time, r.imprint()?))
}

fn encode_auth_record(record: &CalendarAuthRecord) -> Result<Vec<u8>> {
    let mut w = Writer::new();
    encode_publication_data(&mut w, &record.publication_data);
    w.bytes_u8(&record.signer_id, "signer id")?
        .bytes_u16(&record.signature, "signature")?;
    Ok(w.into_bytes())
}

fn decode_auth_record(r: &mut Reader<'_>) -> Result<CalendarAuthRecord> {
    let publication_data = decode_publication_data(r)?;
    let signer_id = r.bytes_u8()?.to_vec();
    let signature = r.bytes_u16()?.to_vec();
    Ok(CalendarAuthRecord {
        publication_data,
        signer_id,
        signature,
    })
}

fn encode_publication_record(record: &PublicationRecord) -> Result<Vec<u8>> {
    let mut w = Writer::new();
    encode_publication_data(&mut w, &record.publication_data);
    let count = u8::try_from(record.references.len())
        .map_err(|_| TesseraError::format("more than 255 publication references"))?;
    w.u8(count);
    for reference in &record.references {
        w.bytes_u16(reference.as_bytes(), "publication reference")?;
    }
    Ok(w.into_bytes())
}

fn decode_publication_record(r: &mut Reader<'_>) -> Result<PublicationRecord> {
    let publication_data = decode_publication_data(r)?;
    let count = r.u8()?;
    let mut references = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let raw = r.bytes_u16()?;
        let text = std::str::from_utf8(raw)
            .map_err(|e| TesseraError::format(format!("publication reference not UTF-8: {e}")))?;
        references.push(text.to_string());
    }
    Ok(PublicationRecord {
        publication_data,
        references,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn h(tag: &[u8]) -> DataHash {
        HashAlgorithm::Sha256.digest(tag)
    }

    fn sample() -> Signature {
        let agg = AggregationChain::new(1_000, HashAlgorithm::Sha256, h(b"doc"))
            .with_link(ChainLink::left(h(b"mask")))
            .with_link(ChainLink::right(h(b"peer")).with_level_correction(3));
        let root = agg.root().unwrap();
        let cal = CalendarChain::new(1_000, 1_000, HashAlgorithm::Sha256, root)
            .with_link(ChainLink::right(h(b"older")));
        let cal_root = cal.root().unwrap();
        Signature::new(agg)
            .with_calendar_chain(cal)
            .with_calendar_auth_record(CalendarAuthRecord::new(
                PublicationData::new(1_000, cal_root),
                b"cal-1".to_vec(),
                vec![9u8; 64],
            ))
    }

    #[test]
    fn test_container_round_trip() {
        let sig = sample();
        let bytes = sig.to_bytes().unwrap();
        assert_eq!(&bytes[..4], CONTAINER_MAGIC);
        let decoded = Signature::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, sig);
        assert_eq!(decoded.to_bytes().unwrap(), bytes);
    }

    #[test]
    fn test_minimal_signature() {
        let sig = Signature::new(AggregationChain::new(5, HashAlgorithm::Blake3, h(b"x")));
        let bytes = sig.to_bytes().unwrap();
        let decoded = Signature::from_bytes(&bytes).unwrap();
        assert!(decoded.calendar_chain().is_none());
        assert!(!decoded.is_extended());
    }

    #[test]
    fn test_rejects_non_canonical_input() {
        let bytes = sample().to_bytes().unwrap();

        let mut trailing = bytes.clone();
        trailing.extend_from_slice(&[TAG_PUBLICATION]);
        assert_eq!(Signature::from_bytes(&trailing).unwrap_err().code(), ErrorCode::Format);

        let mut bad_magic = bytes.clone();
        bad_magic[0] = b'X';
        assert!(Signature::from_bytes(&bad_magic).is_err());

        let mut bad_version = bytes.clone();
        bad_version[4] = 2;
        assert!(Signature::from_bytes(&bad_version).is_err());

        assert!(Signature::from_bytes(&bytes[..bytes.len() - 1]).is_err());
        assert!(Signature::from_bytes(b"TSIG\x01").is_err());
    }

    #[test]
    fn test_rejects_duplicate_or_unordered_elements() {
        let sig = sample();
        let agg = encode_aggregation(sig.aggregation_chain()).unwrap();
        let cal = encode_calendar(sig.calendar_chain().unwrap()).unwrap();

        let mut w = Writer::new();
        w.raw(CONTAINER_MAGIC).u8(CONTAINER_VERSION);
        w.element(TAG_CALENDAR, &cal).unwrap();
        w.element(TAG_AGGREGATION, &agg).unwrap();
        assert!(Signature::from_bytes(&w.into_bytes()).is_err());

        let mut w = Writer::new();
        w.raw(CONTAINER_MAGIC).u8(CONTAINER_VERSION);
        w.element(TAG_AGGREGATION, &agg).unwrap();
        w.element(TAG_AGGREGATION, &agg).unwrap();
        assert!(Signature::from_bytes(&w.into_bytes()).is_err());

        let mut w = Writer::new();
        w.raw(CONTAINER_MAGIC).u8(CONTAINER_VERSION);
        w.element(TAG_AGGREGATION, &agg).unwrap();
        w.element(9, b"").unwrap();
        assert!(Signature::from_bytes(&w.into_bytes()).is_err());
    }

    #[test]
    fn test_extend_replaces_calendar_and_drops_auth_record() {
        let sig = sample();
        let root = sig.aggregation_chain().root().unwrap();
        let chain = CalendarChain::new(2_000, 1_000, HashAlgorithm::Sha256, root)
            .with_link(ChainLink::left(h(b"newer")));
        let record = PublicationRecord::new(PublicationData::new(2_000, chain.root().unwrap()));

        let extended = sig.extend(chain.clone(), record.clone()).unwrap();
        assert!(extended.is_extended());
        assert!(extended.calendar_auth_record().is_none());
        assert_eq!(extended.calendar_chain(), Some(&chain));
        assert_eq!(extended.publication_record(), Some(&record));
        // original untouched
        assert!(sig.calendar_auth_record().is_some());
        assert!(!sig.is_extended());

        let wrong = PublicationRecord::new(PublicationData::new(3_000, h(b"other")));
        assert!(sig.extend(chain, wrong).is_err());
    }

    #[test]
    fn test_extend_rejects_foreign_publication_hash() {
        let sig = sample();
        let root = sig.aggregation_chain().root().unwrap();
        let chain = CalendarChain::new(2_000, 1_000, HashAlgorithm::Sha256, root)
            .with_link(ChainLink::left(h(b"newer")));
        // right time, wrong hash
        let forged = PublicationRecord::new(PublicationData::new(2_000, h(b"forged")));
        let err = sig.extend(chain, forged).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ChainInconsistent);
    }

    #[test]
    fn test_read_write_streams() {
        let sig = sample();
        let mut out = Vec::new();
        sig.write_to(&mut out).unwrap();
        let back = Signature::read_from(std::io::Cursor::new(out)).unwrap();
        assert_eq!(back, sig);
    }

    #[test]
    fn test_serde_json() {
        let sig = sample();
        let json = serde_json::to_string(&sig).unwrap();
        assert!(!json.contains("publication_record"));
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sig);
    }
}
