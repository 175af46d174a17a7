pub mod config;
pub mod handlers;
pub mod menu;
pub mod utils;
