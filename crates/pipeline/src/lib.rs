//! # Pipeline
//!
//! A framework for sequential, idempotency-gated provisioning pipelines.
//!
//! This crate provides the core abstractions for declaring a fixed sequence
//! of steps, probing whether each step's effect is already in place, and
//! applying only the steps that are not yet satisfied. Execution is strictly
//! sequential and fail-fast: the first error aborts the run and no later
//! step is touched.
//!
//! ## Core Concepts
//!
//! - **Step**: a named unit with an idempotency predicate and a mutating action
//! - **Plan**: the fixed total order of steps, declared once
//! - **EventSink**: receives progress events during a run
//! - **RunSummary**: counts of satisfied vs applied steps
//!
//! ## Example
//!
//! ```
//! use pipeline::{NoSink, Plan, Step, run};
//!
//! #[derive(Debug)]
//! struct TouchFile { path: std::path::PathBuf }
//!
//! impl Step for TouchFile {
//!     fn name(&self) -> String { format!("file:{}", self.path.display()) }
//!     fn description(&self) -> String { format!("Create {}", self.path.display()) }
//!
//!     fn is_satisfied(&self) -> anyhow::Result<bool> {
//!         Ok(self.path.exists())
//!     }
//!
//!     fn apply(&self) -> anyhow::Result<()> {
//!         std::fs::write(&self.path, b"")?;
//!         Ok(())
//!     }
//! }
//!
//! let mut plan = Plan::new();
//! plan.push(Box::new(TouchFile { path: std::env::temp_dir().join("pipeline-doc") }));
//! let summary = run(&plan, &mut NoSink).unwrap();
//! assert_eq!(summary.total(), 1);
//! ```

pub mod executor;
pub mod step;

// Re-export main types at crate root
pub use executor::{EventSink, NoSink, RunSummary, run, status};
pub use step::{BoxedStep, Plan, Step, StepOutcome, StepReport, StepState};
