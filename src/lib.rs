mod app;
pub mod args;
pub mod commands;
mod config;
mod error;
pub mod model;
pub mod report;
pub mod store;
mod utils;
mod web;

#[cfg(test)]
mod test;

pub use config::Config;
pub use error::{Error, ErrorType, Result};
