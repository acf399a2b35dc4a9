pub mod aggregate;
pub mod api;
pub mod backend;
pub mod batch;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod queries;

pub use error::{GatewayError, Result};
