//! Channel abstraction for chat I/O.

pub mod channel;
pub mod cli;
pub mod max;

pub use channel::*;
pub use cli::CliChannel;
pub use max::MaxChannel;
