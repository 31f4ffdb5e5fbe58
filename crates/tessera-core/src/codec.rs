//! Big-endian cursor primitives for the signature container
use crate::error::{Result, TesseraError};
use crate::hash::{DataHash, HashAlgorithm};

/// Append-only encoder
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn imprint(&mut self, hash: &DataHash) -> &mut Self {
        self.raw(&hash.imprint())
    }

    /// Bytes prefixed by a one-byte length
    pub fn bytes_u8(&mut self, bytes: &[u8], what: &str) -> Result<&mut Self> {
        let len = u8::try_from(bytes.len())
            .map_err(|_| TesseraError::format(format!("{what} longer than 255 bytes")))?;
        Ok(self.u8(len).raw(bytes))
    }

    /// Bytes prefixed by a two-byte length
    pub fn bytes_u16(&mut self, bytes: &[u8], what: &str) -> Result<&mut Self> {
        let len = u16::try_from(bytes.len())
            .map_err(|_| TesseraError::format(format!("{what} longer than 65535 bytes")))?;
        Ok(self.u16(len).raw(bytes))
    }

    /// A `tag | len_u32 | body` element
    pub fn element(&mut self, tag: u8, body: &[u8]) -> Result<&mut Self> {
        let len = u32::try_from(body.len())
            .map_err(|_| TesseraError::format(format!("element {tag} body too large")))?;
        Ok(self.u8(tag).u32(len).raw(body))
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Bounds-checked decoder over a borrowed buffer
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(TesseraError::format(format!(
                "truncated input: need {n} bytes at offset {}, have {}",
                self.pos,
                self.remaining()
            )));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    pub fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    pub fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    /// An imprint whose length is implied by its algorithm id
    pub fn imprint(&mut self) -> Result<DataHash> {
        let algorithm = HashAlgorithm::from_id(self.u8()?)?;
        DataHash::new(algorithm, self.take(algorithm.length())?)
    }

    pub fn bytes_u8(&mut self) -> Result<&'a [u8]> {
        let len = self.u8()? as usize;
        self.take(len)
    }

    pub fn bytes_u16(&mut self) -> Result<&'a [u8]> {
        let len = self.u16()? as usize;
        self.take(len)
    }

    /// Next `tag | len_u32 | body` element
    pub fn element(&mut self) -> Result<(u8, Reader<'a>)> {
        let tag = self.u8()?;
        let len = usize::try_from(self.u32()?)
            .map_err(|_| TesseraError::format("element length exceeds address space"))?;
        Ok((tag, Reader::new(self.take(len)?)))
    }

    /// Fail unless every byte has been consumed
    pub fn finish(&self, what: &str) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(TesseraError::format(format!(
                "{} trailing bytes after {what}",
                self.remaining()
            )))
        }
    }
}
