//! dkr: Extensible Container Engine Client
//!
//! A command-line client whose resource commands are pluggable modules. Built-in modules
//! cover containers and images; user commands are external executables described by
//! manifests in the user command directory. A small session state document carries the
//! last referenced container and image between invocations.

pub mod args;
pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod registry;
pub mod state;
