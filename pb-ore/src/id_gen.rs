//! ID generator utilities.

use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe generator of unique IDs.
///
/// IDs are unique for the lifetime of the generator, not across generators.
#[derive(Debug)]
pub struct AtomicGen<Id> {
    next: AtomicU64,
    phantom: std::marker::PhantomData<fn() -> Id>,
}

impl<Id> Default for AtomicGen<Id> {
    fn default() -> Self {
        AtomicGen::from_start(0)
    }
}

impl<Id> AtomicGen<Id> {
    pub const fn from_start(start: u64) -> Self {
        AtomicGen {
            next: AtomicU64::new(start),
            phantom: std::marker::PhantomData,
        }
    }
}

impl<Id: From<u64>> AtomicGen<Id> {
    pub fn next(&self) -> Id {
        let id = self.next.fetch_add(1, Ordering::Relaxed);
        assert_ne!(id, u64::MAX, "ID allocator overflowed u64");
        Id::from(id)
    }
}
