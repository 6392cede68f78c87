//! Locating and patching the Android half of a React Native project.

pub mod gradle;
pub mod locate;
pub mod manifest;
pub mod network_config;
pub mod package;
pub mod project;
pub mod strings;
