//! Configuration module for Bulletin-Watch
//!
//! Settings come from built-in defaults, an optional TOML file, and the
//! command line, in increasing order of precedence. Everything is validated
//! before the poll loop starts.
//!
//! # Example
//!
//! ```no_run
//! use bulletin_watch::config::{resolve_config, Overrides};
//! use std::path::Path;
//!
//! let path = Path::new("watch.toml");
//! let (config, _hash) = resolve_config(Some(path), Overrides::default()).unwrap();
//! println!("Writing to {}", config.output.path.display());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, OutputConfig, PageTarget, PollConfig, SourceConfig, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, resolve_config, Overrides};
