#![deny(
    clippy::expect_used,
    clippy::panic,
    clippy::print_stdout,
    clippy::todo,
    clippy::unimplemented,
    clippy::unwrap_used
)]

pub mod assembly;
pub mod config;
pub mod db;
pub mod domain;
pub mod mapping;
pub mod repo;
pub mod rest;
pub mod sync;
