//! notify_push listener - Main Library
//!
//! Wires the `notify-push` client into a small long-running listener.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI, config, logging, shutdown)
//! - **notify_push**: Push channel client (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use notify_push_listener::bin_common::{load_config_from_env, ConfigType, ListenerConfig};
//! use notify_push_listener::notify_push::PushClient;
//! ```

// Re-export workspace libraries for convenience
pub use notify_push;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod config;
    pub mod logging;
    pub mod shutdown;

    pub use cli::{load_config_from_env, ConfigType};
    pub use config::{ConfigError, ListenerConfig};
    pub use logging::{init_tracing, init_tracing_with_level};
    pub use shutdown::ShutdownManager;
}
