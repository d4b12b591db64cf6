mod config;
mod error;
mod sample;
mod server;
mod utils;

pub mod args;
pub mod commands;
pub mod model;
pub mod store;
pub mod view;

#[cfg(test)]
mod test;

pub use config::Config;
pub use error::Error;
pub use error::ErrorType;
pub use error::Result;
