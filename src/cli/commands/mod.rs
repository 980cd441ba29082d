//! Command implementations, one module per subcommand.

pub mod init;
pub mod resolve;
pub mod variants;
pub mod watch;
