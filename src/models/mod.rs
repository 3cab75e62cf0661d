pub mod date;
pub mod project;
pub mod task;
pub mod timestamp;

pub use project::*;
pub use task::*;
