//! Core services and infrastructure

pub mod date_parser;
pub mod error_handling;
pub mod logging;
pub mod pattern_parser;
pub mod sync;
