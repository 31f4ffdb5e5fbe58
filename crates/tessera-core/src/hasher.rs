//! Streaming hash computation
use crate::error::{Result, TesseraError};
use crate::hash::{DataHash, HashAlgorithm};
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::io::Read;

/// Chunk size used when hashing from a reader
const READ_CHUNK: usize = 8 * 1024;

enum Engine {
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
    Blake3(Box<blake3::Hasher>),
}

impl Engine {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Sha256 => Engine::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => Engine::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => Engine::Sha512(Sha512::new()),
            HashAlgorithm::Blake3 => Engine::Blake3(Box::new(blake3::Hasher::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Engine::Sha256(h) => h.update(data),
            Engine::Sha384(h) => h.update(data),
            Engine::Sha512(h) => h.update(data),
            Engine::Blake3(h) => {
                h.update(data);
            }
        }
    }

    fn finish(self) -> Vec<u8> {
        match self {
            Engine::Sha256(h) => h.finalize().to_vec(),
            Engine::Sha384(h) => h.finalize().to_vec(),
            Engine::Sha512(h) => h.finalize().to_vec(),
            Engine::Blake3(h) => h.finalize().as_bytes().to_vec(),
        }
    }
}

/// Incremental hasher with bounded memory.
///
/// Once `finalize` has been called the hasher is spent; further `update` or
/// `finalize` calls fail with `INVALID_STATE`.
pub struct DataHasher {
    algorithm: HashAlgorithm,
    engine: Option<Engine>,
}

impl DataHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            engine: Some(Engine::new(algorithm)),
        }
    }

    pub fn digest(algorithm: HashAlgorithm, data: &[u8]) -> DataHash {
        let mut engine = Engine::new(algorithm);
        engine.update(data);
        DataHash::from_digest(algorithm, engine.finish())
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn is_finalized(&self) -> bool {
        self.engine.is_none()
    }

    pub fn update(&mut self, data: &[u8]) -> Result<&mut Self> {
        self.engine()?.update(data);
        Ok(self)
    }

    /// Hash everything a reader yields, `READ_CHUNK` bytes at a time.
    /// Returns the number of bytes consumed.
    pub fn update_reader<R: Read>(&mut self, mut reader: R) -> Result<u64> {
        let engine = self.engine()?;
        let mut buf = [0u8; READ_CHUNK];
        let mut total = 0u64;
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            engine.update(&buf[..n]);
            total += n as u64;
        }
        Ok(total)
    }

    pub fn finalize(&mut self) -> Result<DataHash> {
        let engine = self
            .engine
            .take()
            .ok_or_else(|| TesseraError::InvalidState("hasher already finalized".into()))?;
        Ok(DataHash::from_digest(self.algorithm, engine.finish()))
    }

    fn engine(&mut self) -> Result<&mut Engine> {
        self.engine
            .as_mut()
            .ok_or_else(|| TesseraError::InvalidState("hasher already finalized".into()))
    }
}

impl std::fmt::Debug for DataHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("DataHasher")
            .field("algorithm", &self.algorithm)
            .field("finalized", &self.is_finalized())
            .finish()
    }
}
