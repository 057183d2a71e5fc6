//! # Device Integrity Detection Kit
//!
//! Detection engine for device compromise (jailbreak). Provides the technique
//! catalog, the evidence collectors, scan orchestration and the report model.
//!
//! ## Modules
//!
//! - `catalog` - The eight detection techniques, severities and references
//! - `host` - Host environment port (`SystemHost`, `SimulatedHost`)
//! - `collectors` - One probe per technique
//! - `registry` - Collector wiring and validation
//! - `execution_api` - Scan orchestration (`ScanEngine`, `perform_scan`)
//! - `report` - Detection results, reports and JSON export
//! - `store` - Persisted scan summary port
//! - `logging` - Global logger setup
//!
//! ## Usage
//!
//! ```rust,no_run
//! use detection_kit::execution_api::{format_report, ScanEngine};
//!
//! let engine = ScanEngine::with_system_host()?;
//! let report = engine.perform_scan();
//!
//! println!("{}", format_report(&report));
//! println!("{}", report.to_json()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod catalog;
pub mod collectors;
pub mod evidence;
pub mod execution_api;
pub mod host;
pub mod logging;
pub mod registry;
pub mod report;
pub mod store;

pub use catalog::{Severity, TechniqueId};
pub use execution_api::{ExecutionMode, ScanEngine};
pub use report::{DetectionReport, DetectionResult};
