//! Deterministic random number generation
//!
//! Uses xorshift64* for uniforms and Box-Muller for normal draws.
//! CRITICAL: All randomness in the simulator MUST go through this module.

mod xorshift;

pub use xorshift::RngManager;
