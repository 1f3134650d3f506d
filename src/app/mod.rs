//! The `lfscan` binary: argument handling, scan execution and output

pub mod cli;
pub mod output;
pub mod startup;
