//! # hostnet Common
//!
//! Shared utilities for the hostnet components.
//!
//! ## Logging
//!
//! ```no_run
//! use hostnet_common::{init_logging_with_format, LogFormat};
//!
//! init_logging_with_format("info", LogFormat::Pretty).unwrap();
//! tracing::info!(host = "esx-01", "Inventory session ready");
//! ```

pub mod logging;

pub use logging::{
    init_logging,
    init_logging_json,
    init_logging_with_format,
    is_valid_level,
    LogFormat,
};
