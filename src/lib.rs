pub mod app;
pub mod core;
pub mod scanner;

include!(concat!(env!("OUT_DIR"), "/version.rs"));
