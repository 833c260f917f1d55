//! CLI command implementations.

mod add;
mod build;
mod create;
mod serve;

pub(crate) use add::AddArgs;
pub(crate) use build::BuildArgs;
pub(crate) use create::CreateArgs;
pub(crate) use serve::ServeArgs;
