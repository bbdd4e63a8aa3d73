//! Domain layer: value objects, signing and billing rules. No I/O.

pub mod billing;
pub mod foundation;
pub mod signing;
