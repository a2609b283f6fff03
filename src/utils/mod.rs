//! The `utils` module provides the pieces shared by every other module:
//! the broker error taxonomy and tracing initialisation.

pub mod error;
pub mod logging;

pub use error::BrokerError;

#[cfg(test)]
mod tests;
