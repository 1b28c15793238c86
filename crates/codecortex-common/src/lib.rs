//! Shared utilities for codecortex crates
//!
//! - [`logging`]: tracing subscriber bootstrap and error-chain formatting
//! - [`collection`]: bounded FIFO buffer used for rolling windows
//! - [`cache`]: bounded LRU store used for learned per-key state
//! - [`validation`]: small validation traits shared by configuration types

pub mod cache;
pub mod collection;
pub mod logging;
pub mod validation;

pub use cache::{CacheStats, LruStore};
pub use collection::BoundedBuffer;
pub use logging::{format_error, LogLevel, LogOptions};
pub use validation::{
    collect_errors, NonEmptyStringValidator, RangeValidator, UnitIntervalValidator, Validatable,
    ValidationError, Validator,
};
