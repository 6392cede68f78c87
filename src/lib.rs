#![deny(unsafe_code)]

pub mod android;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod integrate;
pub mod opts;
pub mod source;
pub mod util;

pub static NAME: &str = "smisdk-android";
