pub mod config;
pub mod generate;
pub mod secrets;
pub mod serve;
