/// Content Index Service Library
///
/// Serves each principal a cached index of the content they can open, and
/// invalidates those indexes when content changes.
///
/// # Modules
///
/// - `handlers`: HTTP handlers for the index, client config and content events
/// - `db`: Postgres content source
/// - `middleware`: JWT authentication and request metrics
/// - `error`: Error types and HTTP mapping
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;

pub use config::Config;
pub use error::{AppError, Result};
