//! DNS adapters implementing the `MxResolver` port.
//!
//! - `HickoryMxResolver` - Real MX lookups (hickory-resolver)
//! - `StaticMxResolver` - Allow-list answers for tests and offline runs

mod hickory_mx_resolver;
mod static_mx_resolver;

pub use hickory_mx_resolver::HickoryMxResolver;
pub use static_mx_resolver::StaticMxResolver;
