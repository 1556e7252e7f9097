//! Deskgate CLI - command-line front end for the desk login gate

pub mod commands;
pub mod shell;

pub use commands::{run, Cli, Commands};
pub use shell::{DeskShell, ShellCommand};
