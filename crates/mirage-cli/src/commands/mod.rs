//! CLI command implementations.

pub mod brains;
pub mod episode;
pub mod init;
pub mod replay;
pub mod train;
pub mod world;
