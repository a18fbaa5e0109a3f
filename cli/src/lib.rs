//! Command-line front end for the `stratus` search client

mod app;
pub mod core;
pub mod utils;
