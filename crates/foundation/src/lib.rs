pub mod handles;
pub mod math;

// Foundation crate: small, well-tested primitives only.
pub use handles::*;
