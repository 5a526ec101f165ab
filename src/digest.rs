use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use md5::{Digest as _, Md5};
use serde::{Deserialize, Serialize};

use crate::error::{Error, IoResultExt, Result};

/// MD5 digest of a published artifact
///
/// snapshot.json predates stronger hashes on the serving side, so the legacy
/// manifest format is pinned to md5.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Md5Digest([u8; 16]);

impl Md5Digest {
    /// parse from hex string
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s).map_err(|_| Error::InvalidDigest(s.to_string()))?;
        let arr: [u8; 16] = bytes
            .try_into()
            .map_err(|_| Error::InvalidDigest(s.to_string()))?;
        Ok(Self(arr))
    }

    /// digest of an in-memory buffer
    pub fn of_bytes(data: &[u8]) -> Self {
        Self(Md5::digest(data).into())
    }

    /// digest of a file's bytes, read in chunks
    pub fn of_file(path: &Path) -> Result<Self> {
        let file = File::open(path).with_path(path)?;
        let mut reader = BufReader::new(file);
        let mut hasher = Md5::new();
        let mut buf = [0u8; 64 * 1024];

        loop {
            let n = reader.read(&mut buf).with_path(path)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        Ok(Self(hasher.finalize().into()))
    }

    /// convert to lowercase hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Md5Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Md5Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Md5Digest({})", self.to_hex())
    }
}

impl Serialize for Md5Digest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Md5Digest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
