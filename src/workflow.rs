//! The validation run: validate parameters, validate the request against
//! the tracker, then honor a dry-run override.
//!
//! Every step reports through a `ProgressReporter`; cancellation is only
//! sampled when a step starts, so an in-flight tracker call always finishes.
use crate::classify::RequestNumberFormats;
use crate::fetch::{fetch_request, resolve_package};
use crate::params::{PreparedParameters, WorkflowParameters};
use crate::progress::{ProgressReporter, ProgressSink};
use crate::remote::RequestTracker;
use crate::util::{build_version, elapsed_seconds, header_message, message_pad_right};
use crate::verdict::Verdict;
use anyhow::Result;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};


const MAIN_CONTEXT: &str = "ExecuteAction";
const REQUEST_CONTEXT: &str = "ValidateRequest";
const PAD_WIDTH: usize = 50;

/// Runtime facts about this invocation that do not come from the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Invocation {
    pub instance_id: i64,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    NotStarted,
    ValidatingParameters,
    ValidatingRequest,
    DryRunOverride,
    Complete,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowOutcome {
    pub state: WorkflowState,
    pub verdict: bool,
    pub elapsed_seconds: f64,
    pub error: Option<String>,
}

enum StepResult {
    Verdict(bool),
    Cancelled,
}

pub struct Workflow<'t> {
    parameters: WorkflowParameters,
    tracker: &'t dyn RequestTracker,
    formats: RequestNumberFormats,
    clock: fn() -> DateTime<Utc>,
    state: WorkflowState,
}

impl<'t> Workflow<'t> {
    pub fn new(parameters: WorkflowParameters, tracker: &'t dyn RequestTracker) -> Result<Self> {
        Ok(Self {
            parameters,
            tracker,
            formats: RequestNumberFormats::new()?,
            clock: Utc::now,
            state: WorkflowState::NotStarted,
        })
    }

    #[cfg(test)]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    fn transition(&mut self, next: WorkflowState) {
        tracing::debug!(from = ?self.state, to = ?next, "workflow state");
        self.state = next;
    }

    /// Run the whole validation. Always emits exactly one terminal event.
    pub fn run(&mut self, invocation: Invocation, sink: &mut dyn ProgressSink) -> WorkflowOutcome {
        self.state = WorkflowState::NotStarted;
        let mut reporter = ProgressReporter::new(sink);
        let clock = Instant::now();

        if reporter.step_starting_with_id("Execute", "Starting", invocation.instance_id) {
            return self.cancelled(&mut reporter, clock.elapsed());
        }
        let header = header_message(&format!(
            "Request Validator. {}, Entering Main Workflow.",
            build_version()
        ));
        if reporter.step_starting(MAIN_CONTEXT, header) {
            return self.cancelled(&mut reporter, clock.elapsed());
        }
        match self.parameters.compact_json() {
            Ok(json) => reporter.step_progress(MAIN_CONTEXT, json),
            Err(err) => tracing::warn!(error = %err, "could not render parameters"),
        }

        let (verdict, error) = match self.execute(&mut reporter, invocation.dry_run) {
            Ok(StepResult::Verdict(verdict)) => (verdict, None),
            Ok(StepResult::Cancelled) => return self.cancelled(&mut reporter, clock.elapsed()),
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "validation aborted");
                (false, Some(format!("{err:#}")))
            }
        };

        let elapsed = clock.elapsed();
        let message = header_message(&format!(
            "End Main Workflow: {}, Total Execution Time: {}",
            if verdict {
                "Complete."
            } else {
                "One or more steps failed."
            },
            elapsed_seconds(elapsed)
        ));
        reporter.finish(MAIN_CONTEXT, message, verdict, false, error.clone());
        self.transition(if verdict {
            WorkflowState::Complete
        } else {
            WorkflowState::Failed
        });
        WorkflowOutcome {
            state: self.state,
            verdict,
            elapsed_seconds: elapsed_seconds(elapsed),
            error,
        }
    }

    fn cancelled(&mut self, reporter: &mut ProgressReporter<'_>, elapsed: Duration) -> WorkflowOutcome {
        let message = header_message(&format!(
            "End Main Workflow: Cancelled, Total Execution Time: {}",
            elapsed_seconds(elapsed)
        ));
        reporter.finish(MAIN_CONTEXT, message, false, true, None);
        self.transition(WorkflowState::Cancelled);
        WorkflowOutcome {
            state: self.state,
            verdict: false,
            elapsed_seconds: elapsed_seconds(elapsed),
            error: None,
        }
    }

    fn execute(&mut self, reporter: &mut ProgressReporter<'_>, dry_run: bool) -> Result<StepResult> {
        self.transition(WorkflowState::ValidatingParameters);
        let prepared = self.validate_parameters(reporter);
        if !prepared.is_valid {
            return Ok(StepResult::Verdict(false));
        }

        self.transition(WorkflowState::ValidatingRequest);
        let StepResult::Verdict(verdict) = self.validate_request(reporter, &prepared)? else {
            return Ok(StepResult::Cancelled);
        };

        if dry_run {
            self.transition(WorkflowState::DryRunOverride);
            reporter.step_progress(
                MAIN_CONTEXT,
                "IsDryRun Flag is set.  Request is presumed to be valid.",
            );
            return Ok(StepResult::Verdict(true));
        }
        Ok(StepResult::Verdict(verdict))
    }

    fn validate_parameters(&self, reporter: &mut ProgressReporter<'_>) -> PreparedParameters {
        reporter.step_progress(MAIN_CONTEXT, header_message("Begin [PrepareAndValidate]"));
        let prepared = self.parameters.prepare();
        reporter.step_progress(
            MAIN_CONTEXT,
            message_pad_right(
                "WorkflowParameters.IsValid",
                format!(
                    "{} [RequestNumber != null] && [RequestTypeOptions.Count > 0]",
                    prepared.is_valid
                ),
                PAD_WIDTH,
            ),
        );
        reporter.step_progress(MAIN_CONTEXT, header_message("End [PrepareAndValidate]"));
        prepared
    }

    fn validate_request(
        &self,
        reporter: &mut ProgressReporter<'_>,
        prepared: &PreparedParameters,
    ) -> Result<StepResult> {
        if reporter.step_starting(REQUEST_CONTEXT, header_message("Beginning validation.")) {
            return Ok(StepResult::Cancelled);
        }
        let clock = Instant::now();
        let request_number = prepared.request_number.as_str();

        let classification = self.formats.classify(request_number, &prepared.rules);
        reporter.step_progress(REQUEST_CONTEXT, classification.audit_line(request_number));

        let package = resolve_package(self.tracker, &prepared.package_adapter_instance)?;
        reporter.step_progress(
            REQUEST_CONTEXT,
            format!(
                "Package: Resolved [{}] (Id {}) from PackageAdapterInstance [{}]",
                package.name, package.id, prepared.package_adapter_instance
            ),
        );

        let fetch = fetch_request(self.tracker, request_number);
        if let (Some(message), Some(failure)) =
            (fetch.failure_message(request_number), fetch.failure.as_ref())
        {
            if failure.is_serialization() {
                reporter.step_progress(REQUEST_CONTEXT, message);
            } else {
                reporter.step_error(REQUEST_CONTEXT, message, failure.to_string());
            }
        }

        let verdict = Verdict::evaluate(
            &package,
            &fetch.record,
            request_number,
            classification.requires_approval,
            (self.clock)(),
        );
        for line in verdict.audit_lines() {
            reporter.step_progress(REQUEST_CONTEXT, line);
        }

        reporter.step_finished(
            REQUEST_CONTEXT,
            header_message(&format!(
                "End ValidateRequest: Total Execution Time: {}",
                elapsed_seconds(clock.elapsed())
            )),
        );
        Ok(StepResult::Verdict(verdict.passed()))
    }
}
