pub mod attachment;
pub mod config;
pub mod error;
pub mod generator;
pub mod github;
pub mod io;
pub mod notifier;
pub mod paths;
pub mod pipeline;
pub mod publisher;
pub mod secrets;
pub mod types;
pub mod validator;

pub use error::{PagesmithError, Result};
pub use pipeline::Pipeline;
