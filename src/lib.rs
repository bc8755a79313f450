pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod navigation;
pub mod notify;
pub mod pipeline;
pub mod session;
pub mod types;

pub use config::ClientConfig;
pub use error::PipelineError;
pub use pipeline::{RequestPipeline, RequestPipelineBuilder};
pub use session::SessionStore;
