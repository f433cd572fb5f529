//! Library side of the `tagbind` command.

pub mod commands;
pub mod logging;
