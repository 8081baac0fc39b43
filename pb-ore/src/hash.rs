//! Hashing utilities.

/// Incremental xxh3 hasher that produces a [`pb_types::Xxh64Hash`].
pub struct Xxh3Hasher {
    inner: xxhash_rust::xxh3::Xxh3,
}

impl Xxh3Hasher {
    /// Create a new [`Xxh3Hasher`].
    pub const fn new() -> Self {
        Xxh3Hasher {
            inner: xxhash_rust::xxh3::Xxh3::new(),
        }
    }

    pub fn update(&mut self, input: &[u8]) {
        self.inner.update(input);
    }

    /// Hash a string, prefixed by its length so adjacent strings can't run into one another.
    pub fn update_str(&mut self, input: &str) {
        let len = u64::try_from(input.len()).expect("string longer than u64::MAX");
        self.inner.update(&len.to_le_bytes());
        self.inner.update(input.as_bytes());
    }

    pub fn digest(&self) -> pb_types::Xxh64Hash {
        pb_types::Xxh64Hash::new(self.inner.digest())
    }
}

impl Default for Xxh3Hasher {
    fn default() -> Self {
        Xxh3Hasher::new()
    }
}
