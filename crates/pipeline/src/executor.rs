//! Execution engine - sequential, fail-fast, idempotency-gated

use crate::step::{Plan, StepOutcome, StepReport, StepState};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Receives progress events during a run
///
/// The executor is UI-agnostic; callers plug in a sink that prints,
/// records, or ignores events.
pub trait EventSink {
    /// A step is about to be probed/applied
    fn on_step_start(&mut self, index: usize, total: usize, name: &str, description: &str) {
        let _ = (index, total, name, description);
    }

    /// A step finished without error
    fn on_step_outcome(&mut self, name: &str, outcome: &StepOutcome) {
        let _ = (name, outcome);
    }

    /// A step's predicate or action failed; the run aborts after this event
    fn on_step_failed(&mut self, name: &str, error: &anyhow::Error) {
        let _ = (name, error);
    }
}

/// Sink that ignores all events
pub struct NoSink;

impl EventSink for NoSink {}

/// Summary of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Steps whose predicate reported the effect already in place
    pub satisfied: usize,
    /// Steps whose action ran and succeeded
    pub applied: usize,
}

impl RunSummary {
    /// Total number of steps processed
    pub fn total(&self) -> usize {
        self.satisfied + self.applied
    }

    /// Whether the run performed no mutating actions
    pub fn is_noop(&self) -> bool {
        self.applied == 0
    }
}

/// Execute a plan sequentially, aborting on the first failure
///
/// Each step is probed before it is applied; a step whose predicate reports
/// `true` is skipped entirely. On error the failed step is reported to the
/// sink and the error is returned - later steps are never probed or applied,
/// and nothing already applied is rolled back.
pub fn run<S: EventSink>(plan: &Plan, sink: &mut S) -> Result<RunSummary> {
    let total = plan.len();
    let mut summary = RunSummary::default();

    for (index, step) in plan.steps().iter().enumerate() {
        let name = step.name();
        sink.on_step_start(index + 1, total, &name, &step.description());

        let satisfied = match step
            .is_satisfied()
            .with_context(|| format!("{name}: state probe failed"))
        {
            Ok(satisfied) => satisfied,
            Err(e) => {
                sink.on_step_failed(&name, &e);
                return Err(e);
            }
        };

        if satisfied {
            summary.satisfied += 1;
            sink.on_step_outcome(&name, &StepOutcome::Satisfied);
            continue;
        }

        match step.apply().with_context(|| format!("{name} failed")) {
            Ok(()) => {
                summary.applied += 1;
                sink.on_step_outcome(&name, &StepOutcome::Applied);
            }
            Err(e) => {
                sink.on_step_failed(&name, &e);
                return Err(e);
            }
        }
    }

    Ok(summary)
}

/// Evaluate every step's predicate without mutating anything
///
/// A predicate error does not abort the pass; the step is reported as
/// `Unknown` so a status listing stays useful on a half-reachable host.
pub fn status(plan: &Plan) -> Vec<StepReport> {
    plan.steps()
        .iter()
        .map(|step| {
            let state = match step.is_satisfied() {
                Ok(true) => StepState::Satisfied,
                Ok(false) => StepState::Pending,
                Err(e) => StepState::Unknown {
                    error: format!("{e:#}"),
                },
            };
            StepReport {
                name: step.name(),
                description: step.description(),
                state,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Step;
    use anyhow::bail;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Sink that records the order in which steps were started
    #[derive(Default)]
    struct RecordingSink {
        started: Vec<String>,
        outcomes: Vec<(String, StepOutcome)>,
        failed: Vec<String>,
    }

    impl EventSink for RecordingSink {
        fn on_step_start(&mut self, _index: usize, _total: usize, name: &str, _desc: &str) {
            self.started.push(name.to_string());
        }

        fn on_step_outcome(&mut self, name: &str, outcome: &StepOutcome) {
            self.outcomes.push((name.to_string(), outcome.clone()));
        }

        fn on_step_failed(&mut self, name: &str, _error: &anyhow::Error) {
            self.failed.push(name.to_string());
        }
    }

    /// Step with a fixed predicate result and mutation counters
    struct TestStep {
        name: &'static str,
        satisfied: bool,
        fail_apply: bool,
        applies: AtomicUsize,
        probes: AtomicUsize,
    }

    impl TestStep {
        fn new(name: &'static str, satisfied: bool) -> Self {
            Self {
                name,
                satisfied,
                fail_apply: false,
                applies: AtomicUsize::new(0),
                probes: AtomicUsize::new(0),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                fail_apply: true,
                ..Self::new(name, false)
            }
        }
    }

    /// Shared wrapper so tests can inspect counters after the plan owns the step
    struct SharedStep(std::sync::Arc<TestStep>);

    impl Step for SharedStep {
        fn name(&self) -> String {
            self.0.name.to_string()
        }

        fn description(&self) -> String {
            format!("Test step {}", self.0.name)
        }

        fn is_satisfied(&self) -> Result<bool> {
            self.0.probes.fetch_add(1, Ordering::SeqCst);
            Ok(self.0.satisfied)
        }

        fn apply(&self) -> Result<()> {
            self.0.applies.fetch_add(1, Ordering::SeqCst);
            if self.0.fail_apply {
                bail!("forced failure");
            }
            Ok(())
        }
    }

    fn shared(step: TestStep) -> (std::sync::Arc<TestStep>, BoxedStep) {
        let arc = std::sync::Arc::new(step);
        (arc.clone(), Box::new(SharedStep(arc)))
    }

    use crate::step::BoxedStep;

    #[test]
    fn test_run_applies_unsatisfied_steps_in_order() {
        let (a, step_a) = shared(TestStep::new("a", false));
        let (b, step_b) = shared(TestStep::new("b", false));

        let mut plan = Plan::new();
        plan.push(step_a);
        plan.push(step_b);

        let mut sink = RecordingSink::default();
        let summary = run(&plan, &mut sink).unwrap();

        assert_eq!(summary.applied, 2);
        assert_eq!(summary.satisfied, 0);
        assert_eq!(sink.started, vec!["a", "b"]);
        assert_eq!(
            sink.outcomes,
            vec![
                ("a".to_string(), StepOutcome::Applied),
                ("b".to_string(), StepOutcome::Applied)
            ]
        );
        assert_eq!(a.applies.load(Ordering::SeqCst), 1);
        assert_eq!(b.applies.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_run_skips_satisfied_steps() {
        let (a, step_a) = shared(TestStep::new("a", true));
        let (b, step_b) = shared(TestStep::new("b", true));

        let mut plan = Plan::new();
        plan.push(step_a);
        plan.push(step_b);

        let summary = run(&plan, &mut NoSink).unwrap();

        assert_eq!(summary.satisfied, 2);
        assert!(summary.is_noop());
        // Invariant: no mutating action runs when the predicate is satisfied
        assert_eq!(a.applies.load(Ordering::SeqCst), 0);
        assert_eq!(b.applies.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_run_aborts_on_first_failure() {
        let (a, step_a) = shared(TestStep::new("a", false));
        let (b, step_b) = shared(TestStep::failing("b"));
        let (c, step_c) = shared(TestStep::new("c", false));

        let mut plan = Plan::new();
        plan.push(step_a);
        plan.push(step_b);
        plan.push(step_c);

        let mut sink = RecordingSink::default();
        let result = run(&plan, &mut sink);

        assert!(result.is_err());
        assert_eq!(sink.failed, vec!["b"]);
        // Downstream steps are never probed, let alone applied
        assert_eq!(a.applies.load(Ordering::SeqCst), 1);
        assert_eq!(b.applies.load(Ordering::SeqCst), 1);
        assert_eq!(c.probes.load(Ordering::SeqCst), 0);
        assert_eq!(c.applies.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_run_aborts_on_predicate_error() {
        struct BrokenProbe;

        impl Step for BrokenProbe {
            fn name(&self) -> String {
                "broken".to_string()
            }

            fn description(&self) -> String {
                "Broken probe".to_string()
            }

            fn is_satisfied(&self) -> Result<bool> {
                bail!("probe exploded")
            }

            fn apply(&self) -> Result<()> {
                Ok(())
            }
        }

        let (c, step_c) = shared(TestStep::new("after", false));

        let mut plan = Plan::new();
        plan.push(Box::new(BrokenProbe));
        plan.push(step_c);

        let err = run(&plan, &mut NoSink).unwrap_err();
        assert!(format!("{err:#}").contains("state probe failed"));
        assert_eq!(c.probes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_rerun_is_noop_once_satisfied() {
        // Step that becomes satisfied after its first apply
        struct Converging {
            applied: Mutex<bool>,
            applies: AtomicUsize,
        }

        impl Step for Converging {
            fn name(&self) -> String {
                "converging".to_string()
            }

            fn description(&self) -> String {
                "Converging step".to_string()
            }

            fn is_satisfied(&self) -> Result<bool> {
                Ok(*self.applied.lock().unwrap())
            }

            fn apply(&self) -> Result<()> {
                self.applies.fetch_add(1, Ordering::SeqCst);
                *self.applied.lock().unwrap() = true;
                Ok(())
            }
        }

        let step = std::sync::Arc::new(Converging {
            applied: Mutex::new(false),
            applies: AtomicUsize::new(0),
        });

        struct Wrapper(std::sync::Arc<Converging>);
        impl Step for Wrapper {
            fn name(&self) -> String {
                self.0.name()
            }
            fn description(&self) -> String {
                self.0.description()
            }
            fn is_satisfied(&self) -> Result<bool> {
                self.0.is_satisfied()
            }
            fn apply(&self) -> Result<()> {
                self.0.apply()
            }
        }

        let mut plan = Plan::new();
        plan.push(Box::new(Wrapper(step.clone())));

        let first = run(&plan, &mut NoSink).unwrap();
        assert_eq!(first.applied, 1);

        let second = run(&plan, &mut NoSink).unwrap();
        assert_eq!(second.satisfied, 1);
        assert!(second.is_noop());
        assert_eq!(step.applies.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_status_reports_without_mutating() {
        let (a, step_a) = shared(TestStep::new("a", true));
        let (b, step_b) = shared(TestStep::new("b", false));

        let mut plan = Plan::new();
        plan.push(step_a);
        plan.push(step_b);

        let reports = status(&plan);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].state, StepState::Satisfied);
        assert_eq!(reports[1].state, StepState::Pending);
        assert_eq!(a.applies.load(Ordering::SeqCst), 0);
        assert_eq!(b.applies.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_status_survives_predicate_errors() {
        struct BrokenProbe;

        impl Step for BrokenProbe {
            fn name(&self) -> String {
                "broken".to_string()
            }
            fn description(&self) -> String {
                "Broken probe".to_string()
            }
            fn is_satisfied(&self) -> Result<bool> {
                bail!("unreachable host")
            }
            fn apply(&self) -> Result<()> {
                Ok(())
            }
        }

        let (b, step_b) = shared(TestStep::new("after", true));

        let mut plan = Plan::new();
        plan.push(Box::new(BrokenProbe));
        plan.push(step_b);

        let reports = status(&plan);

        assert!(matches!(reports[0].state, StepState::Unknown { .. }));
        assert_eq!(reports[1].state, StepState::Satisfied);
        assert_eq!(b.probes.load(Ordering::SeqCst), 1);
    }
}
