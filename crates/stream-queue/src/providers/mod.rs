//! Stream provider capability and registry wiring.

pub mod registry;

pub use registry::{ProviderError, ProviderRegistry, StreamProvider, StreamQuery};
