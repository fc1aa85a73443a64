//! # CpiLib
//!
//! CpiLib estimates cycles-per-instruction for synthetic instruction streams running against a
//! two-level cache hierarchy backed by DRAM
//!
//! It provides a generic set-associative cache which can be parameterised by a replacement policy,
//! a hierarchy composing two of these caches with a DRAM penalty, and a simulator which mixes
//! memory and non-memory instructions drawn from a pluggable address source
//!
//! The model is timing-only: no data is ever stored, only hit/miss outcomes and cycle costs. All
//! randomness comes from a single [`rng::PseudoRandomStream`] passed by reference, so a run is
//! fully reproducible given its seed and call order

/// Contains the address sources which feed the simulator
pub mod address;

/// Contains the implementation of the cache, and a utility enum for the existing cache types
pub mod cache;

/// Contains definitions for the JSON configuration format
pub mod config;

/// Contains the error types used across the library
pub mod error;

/// Contains the two-level memory hierarchy cost model
pub mod hierarchy;

/// Contains helpers for reading address trace files
pub mod io;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the deterministic pseudo-random stream shared by every consumer of randomness
pub mod rng;

/// Contains the simulator used to turn an address stream into a CPI figure
pub mod simulator;

#[cfg(test)]
mod test;

/// Contains the standard demonstration sweep used by the CLI and the benchmarks.
pub mod util;
