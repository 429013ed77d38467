pub mod compass;

pub use compass::*;
