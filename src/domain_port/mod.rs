// store

mod session_store;

pub use session_store::*;

// repo

mod session_registry;
mod user_directory;

pub use session_registry::*;
pub use user_directory::*;
