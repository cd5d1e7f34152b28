pub mod config;
pub mod mail;

pub use config::Config;
pub use mail::{FilterError, Message, transform};
