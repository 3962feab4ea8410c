use std::hash::{Hash, Hasher};

/// BLAKE3 behind the standard `Hasher` interface, so anything `Hash` can
/// be fingerprinted without a second hashing scheme in the crate.
#[derive(Default)]
pub(crate) struct Blake3Hasher(blake3::Hasher);

impl Hasher for Blake3Hasher {
    fn finish(&self) -> u64 {
        let mut output = [0u8; 8];
        self.0.finalize_xof().fill(&mut output);
        u64::from_le_bytes(output)
    }

    fn write(&mut self, bytes: &[u8]) {
        self.0.update(bytes);
    }
}

/// Stable 64-bit fingerprint of any hashable value.
pub(crate) fn fingerprint64(value: impl Hash) -> u64 {
    let mut hasher = Blake3Hasher::default();
    value.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn fingerprint_is_stable() {
        assert_eq!(fingerprint64("abc"), fingerprint64("abc"));
        assert_ne!(fingerprint64("abc"), fingerprint64("abd"));
    }
}
