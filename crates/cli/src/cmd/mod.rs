mod context;
mod status;

pub use context::{ContextCommand, cmd_context};
pub use status::cmd_status;
