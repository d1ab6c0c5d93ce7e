//! Request handlers.

pub mod health;
pub mod process;
pub mod status;

pub use health::*;
pub use process::*;
pub use status::*;
