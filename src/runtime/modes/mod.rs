//! Mode routing
//!
//! - Server mode (HTTP server, default)
//! - Command mode (migrate, import-geo, generate-config)

pub mod command;
pub mod server;

pub use command::{run_generate_config, run_import_geo, run_migrate};
pub use server::run_server;
