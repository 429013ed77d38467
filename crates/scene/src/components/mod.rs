pub mod color;
pub mod drawable;
pub mod transform;
pub mod visibility;

pub use color::*;
pub use drawable::*;
pub use transform::*;
pub use visibility::*;
