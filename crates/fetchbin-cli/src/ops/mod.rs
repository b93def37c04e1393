//! Pipeline operations shared by the commands.

pub mod context;
pub mod error;
pub mod flow;
pub mod install;

pub use context::Context;
pub use error::PipelineError;
