//! Types used throughout `pb`.
//!
//! The goal of this crate is to be very lightweight, so take care with adding dependencies.

use std::fmt;

mod label;

pub use label::{Label, LabelError, LabelPart};

/// A 64-bit xxhash digest, used to fingerprint values that are compared often.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Xxh64Hash(u64);

impl Xxh64Hash {
    pub const fn new(val: u64) -> Self {
        Xxh64Hash(val)
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Xxh64Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
