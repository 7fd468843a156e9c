//! Providers Module - External Data Sources
//!
//! Block explorer access: shared HTTP client, chain resolution, verified
//! source fetching.

pub mod chain_resolver;
pub mod explorer;
pub mod fetcher;

pub use chain_resolver::*;
pub use explorer::*;
pub use fetcher::*;
