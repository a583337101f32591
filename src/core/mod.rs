// src/core/mod.rs

pub mod actions;
pub mod commons;
pub mod config_loader;
pub mod navigation;
pub mod paths;
pub mod screens;
pub mod selector;
pub mod supervisor;
#[cfg(test)]
pub mod test_support;
pub mod toplevel;
