use std::fmt;

use sha2::{Digest, Sha256};

/// SHA-256 identity of a piece of content, used as a cache key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    /// Hashes a sample buffer together with its rate and a label, so equal
    /// audio rendered under different stage names gets distinct keys.
    pub fn of_samples(samples: &[f32], sample_rate: u32, label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(sample_rate.to_le_bytes());
        hasher.update((label.len() as u64).to_le_bytes());
        hasher.update(label.as_bytes());
        for sample in samples {
            hasher.update(sample.to_le_bytes());
        }
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short: String = self.0[..6].iter().map(|b| format!("{b:02x}")).collect();
        write!(f, "ContentHash({short})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_bytes_same_hash() {
        assert_eq!(ContentHash::of_bytes(b"abc"), ContentHash::of_bytes(b"abc"));
    }

    #[test]
    fn test_different_bytes_different_hash() {
        assert_ne!(ContentHash::of_bytes(b"abc"), ContentHash::of_bytes(b"abd"));
    }

    #[test]
    fn test_known_sha256_digest() {
        let hash = ContentHash::of_bytes(b"abc");
        assert_eq!(
            hash.to_string(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_sample_hash_depends_on_rate_and_label() {
        let samples = [0.1f32, -0.2, 0.3];
        let base = ContentHash::of_samples(&samples, 22050, "Gain");
        assert_eq!(base, ContentHash::of_samples(&samples, 22050, "Gain"));
        assert_ne!(base, ContentHash::of_samples(&samples, 16000, "Gain"));
        assert_ne!(base, ContentHash::of_samples(&samples, 22050, "Original"));
    }
}
