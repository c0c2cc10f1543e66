//! Shared utilities.
//!
//! Content hashing used by generated-file descriptors and facet fingerprints.

pub mod hash;
