pub mod cli;
pub mod config;
pub mod database;
pub mod draft;
pub mod events;
pub mod feed;
pub mod models;
pub mod notify;
pub mod posts;
pub mod tasks;
pub mod utils;

pub use config::Config;
pub use database::Database;
pub use models::{Event, Post, Task};
pub use utils::Profile;
