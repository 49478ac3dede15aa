//! Oracle `ProviderAdapter` implementation.

mod adapter;
mod backup;
mod datatype;
mod emitter;
mod introspect_queries;

pub use adapter::{OracleAdapter, OracleConnectionStringBuilder};
pub use emitter::OracleEmitter;
