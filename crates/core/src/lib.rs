mod assets;

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod handlers;
pub mod message;
pub mod render;
pub mod session;
pub mod store;

pub use crate::assets::{get_config_dir, get_data_dir};
pub use crate::client::{ChatClient, SendOutcome, TurnState};
pub use crate::error::ClientError;
