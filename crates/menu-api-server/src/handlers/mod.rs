pub mod health;
pub mod menu;
pub mod rpc;
