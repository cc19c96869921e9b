//! Subcommand handlers

pub mod check_config;
pub mod inspect;
pub mod simulate;
