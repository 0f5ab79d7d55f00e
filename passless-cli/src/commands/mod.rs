//! Subcommand implementations.

pub mod codec;
pub mod register;
pub mod signin;
pub mod status;
