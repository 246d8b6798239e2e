//! Step trait and plan types for idempotent provisioning
//!
//! Every operation in a pipeline is modeled as a Step with:
//! - An idempotency predicate ("is this already in place?")
//! - A mutating action (converge the host)
//! - A uniform failure policy: abort the whole pipeline

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Core trait for all pipeline steps
///
/// A step's `apply` must only be invoked when `is_satisfied` reported
/// `false`; the executor enforces this, which is what makes a whole plan
/// safe to re-run. Steps whose action is naturally idempotent at the tool
/// level (re-running it is a no-op) report `false` unconditionally.
pub trait Step: Send + Sync {
    /// Unique identifier for this step (e.g., "package:mysql-server", "db:user")
    fn name(&self) -> String;

    /// Human-readable description
    fn description(&self) -> String;

    /// Idempotency predicate: whether the step's effect is already in place.
    ///
    /// Must not mutate anything.
    fn is_satisfied(&self) -> Result<bool>;

    /// Mutating action: converge the host toward the step's effect
    fn apply(&self) -> Result<()>;
}

/// Boxed step for storage in a plan
pub type BoxedStep = Box<dyn Step>;

/// Result of executing a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Predicate reported the effect already in place; action not run
    Satisfied,
    /// Action ran and succeeded
    Applied,
}

/// State of a step as seen by a predicate-only pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepState {
    /// Effect already in place
    Satisfied,
    /// Effect missing; a run would apply this step
    Pending,
    /// Predicate itself failed (e.g., probe command unavailable)
    Unknown { error: String },
}

/// Per-step report from a predicate-only pass
#[derive(Debug, Clone)]
pub struct StepReport {
    pub name: String,
    pub description: String,
    pub state: StepState,
}

/// A fixed, totally-ordered sequence of steps
///
/// Dependency order is structural: steps run in exactly the order they were
/// pushed. There is no scheduling, no reordering, no parallelism.
pub struct Plan {
    steps: Vec<BoxedStep>,
}

impl Plan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Append a step to the end of the plan
    pub fn push(&mut self, step: BoxedStep) {
        self.steps.push(step);
    }

    /// The steps in execution order
    pub fn steps(&self) -> &[BoxedStep] {
        &self.steps
    }

    /// Number of steps in the plan
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if the plan is empty
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Default for Plan {
    fn default() -> Self {
        Self::new()
    }
}
