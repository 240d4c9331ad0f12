//! reproxied - a request-forwarding middleware
//!
//! The middleware sits at the end of an HTTP handler chain, points every inbound request
//! at a configured target origin, optionally through a forward proxy, and relays the
//! response back to the caller while preserving or overriding the `Host` header.
//!
//! The main components are organized into the following modules:
//! - `config`: Middleware settings (target, forward proxy, host header policy, log level)
//! - `endpoint`: Parsed destinations resolved from configuration strings
//! - `error`: Construction and transport error types
//! - `executor`: The replaceable transport and its default network implementation
//! - `logging`: Per-instance logger construction and log levels
//! - `middleware`: The rewrite-and-relay logic
//! - `relay`: Bounded streaming of upstream response bodies
//! - `server`: HTTP server mounting a middleware as the terminal handler

pub mod config;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod logging;
pub mod middleware;
pub mod relay;
pub mod server;

pub use config::Config;
pub use error::{ConfigurationError, TransportFailure};
pub use executor::{Executor, HttpExecutor};
pub use hyper;
pub use middleware::ReProxied;
