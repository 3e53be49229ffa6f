pub mod codec;
pub mod config;
pub mod error;
pub mod fallback;
pub mod pipeline;
pub mod segmentation;
pub mod server;
pub mod session;

pub use error::{Error, Result};
