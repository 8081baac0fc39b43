//! Odds and ends used throughout `pb`.

pub mod assert;
pub mod env;
pub mod hash;
pub mod id_gen;
