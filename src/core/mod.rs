//! Shared primitives for the gates: the error taxonomy, pinned
//! compatibility literals, document decoding, VM process driving, and
//! report emission.

pub mod contract;
pub mod error;
pub mod literals;
pub mod report;
pub mod vm;
