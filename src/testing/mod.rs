//! Testing utilities and mock implementations
//!
//! Lets tests drive the calculation service without relying on the
//! bundled evaluator's behavior.

pub mod mocks;

pub use mocks::*;
