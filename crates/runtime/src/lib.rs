pub mod frame;
pub mod task_queue;

pub use frame::*;
pub use task_queue::*;
