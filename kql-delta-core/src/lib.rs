//! Schema model and delta engine for Kusto control-command scripts.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use kql_delta_core::config::{CliOverrides, KqlDeltaConfig};
//! use kql_delta_core::KqlDelta;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = KqlDeltaConfig::load(None, &CliOverrides::default())?;
//! let kd = KqlDelta::new(config);
//! let report = kd.delta().await?;
//! println!("{}", report.script);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`ddl`] — Command model: functions, tables, parameters, rendering
//! - [`quoted_text`] — String literal encoding and decoding
//! - [`parser`] — Control-command script parsing
//! - [`introspect`] — `.show database schema as json` documents
//! - [`schema`] — Schema snapshots and the delta between two of them
//! - [`gateway`] — Script file reads, writes and folder walks
//! - [`source`] — Loading snapshots from configured sources
//! - [`config`] — Configuration loading (TOML, env vars, CLI overrides)
//! - [`commands`] — Individual command implementations
//! - [`error`] — Error types

pub mod commands;
pub mod config;
pub mod ddl;
pub mod error;
pub mod gateway;
pub mod introspect;
pub mod parser;
pub mod quoted_text;
pub mod schema;
pub mod source;

use config::KqlDeltaConfig;
use error::Result;
use gateway::FileGateway;

pub use commands::check::CheckReport;
pub use commands::delta::DeltaReport;
pub use commands::export::ExportReport;
pub use config::CliOverrides;
pub use ddl::Command;
pub use error::DeltaError;
pub use schema::{DeltaAction, DeltaPlan, SchemaSnapshot};
pub use source::Side;

/// Main entry point for the kql-delta library.
///
/// Create a `KqlDelta` instance with a config and use its methods to run
/// commands programmatically.
pub struct KqlDelta {
    pub config: KqlDeltaConfig,
    gateway: FileGateway,
}

impl KqlDelta {
    /// Create an instance resolving relative paths against the working
    /// directory.
    pub fn new(config: KqlDeltaConfig) -> Self {
        Self {
            config,
            gateway: FileGateway::new(),
        }
    }

    /// Create an instance with an existing file gateway.
    pub fn with_gateway(config: KqlDeltaConfig, gateway: FileGateway) -> Self {
        Self { config, gateway }
    }

    pub fn gateway(&self) -> &FileGateway {
        &self.gateway
    }

    /// Compute the delta script and write the configured outputs.
    pub async fn delta(&self) -> Result<DeltaReport> {
        commands::delta::execute(&self.gateway, &self.config).await
    }

    /// Render one source as a canonical script.
    pub async fn export(&self, side: Side) -> Result<ExportReport> {
        commands::export::execute(&self.gateway, &self.config, side).await
    }

    /// Parse and validate the given sources.
    pub async fn check(&self, sides: &[Side]) -> Result<CheckReport> {
        commands::check::execute(&self.gateway, &self.config, sides).await
    }
}
