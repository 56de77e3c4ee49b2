pub mod config;
pub mod health;
pub mod secrets;
pub mod tasks;
