use core::fmt;

use lgoap_core::{Blackboard, TickContext};
use lgoap_tools::TraceSink;

use crate::context::Registration;
use crate::job::PendingJob;
use crate::planner::{plan_pass, PassRequest, PlannerWorkspace};
use crate::{
    AgentId, CompiledDomain, ContainerSelection, PlanResultKind, PlannerConfig, PlannerError,
    PlannerResult, PlanningMode, Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    Idle,
    /// A synchronous pass is running.
    Planning,
    /// A pass was scheduled as a job and has not been collected yet.
    AwaitingJob,
}

/// One agent planning against a compiled domain.
///
/// Owns its live blackboard, its published [`PlannerResult`] and the workspace a pass runs in.
/// Dropping the agent waits for its in-flight job, if any.
pub struct LgoapAgent {
    id: AgentId,
    domain: CompiledDomain,
    blackboard: Blackboard,
    config: PlannerConfig,
    state: PlannerState,
    started: bool,
    replan_from: Option<usize>,
    workspace: Option<PlannerWorkspace>,
    pending: Option<PendingJob>,
    result: PlannerResult,
    sink: Option<Box<dyn TraceSink>>,
    pub(crate) registration: Option<Registration>,
}

impl fmt::Debug for LgoapAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LgoapAgent")
            .field("id", &self.id)
            .field("domain", &self.domain.name())
            .field("state", &self.state)
            .field("replan_from", &self.replan_from)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}

impl LgoapAgent {
    /// Prefer [`crate::LgoapRuntime::spawn_agent`], which assigns ids and tracks the agent.
    pub fn new(
        id: AgentId,
        domain: &CompiledDomain,
        blackboard: Blackboard,
        config: PlannerConfig,
    ) -> Result<Self> {
        config.validate().map_err(|err| PlannerError::InvalidConfig {
            reason: format!("{err:#}"),
        })?;
        let expected = domain.layout();
        let actual = blackboard.layout();
        if !std::sync::Arc::ptr_eq(expected, actual)
            && (expected.template() != actual.template() || expected.keys() != actual.keys())
        {
            return Err(PlannerError::LayoutMismatch {
                domain: domain.name().to_string(),
                expected: expected.template().to_string(),
                actual: actual.template().to_string(),
            });
        }

        Ok(Self {
            id,
            domain: domain.clone(),
            result: PlannerResult::new(domain.max_plan_sizes()),
            workspace: Some(PlannerWorkspace::new(domain, &blackboard, config.trace_capacity)),
            blackboard,
            config,
            state: PlannerState::Idle,
            started: false,
            replan_from: None,
            pending: None,
            sink: None,
            registration: None,
        })
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn state(&self) -> PlannerState {
        self.state
    }

    pub fn domain(&self) -> &CompiledDomain {
        &self.domain
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn blackboard_mut(&mut self) -> &mut Blackboard {
        &mut self.blackboard
    }

    pub fn result(&self) -> &PlannerResult {
        &self.result
    }

    /// Streams the trace events of every published pass into `sink`.
    pub fn set_trace_sink(&mut self, sink: Box<dyn TraceSink>) {
        self.sink = Some(sink);
    }

    pub fn take_trace_sink(&mut self) -> Option<Box<dyn TraceSink>> {
        self.sink.take()
    }

    /// Replan every layer on the next tick.
    pub fn request_replan(&mut self) {
        self.replan_from = Some(0);
    }

    /// Replan from `layer` down on the next tick; layers above keep their plans and cursors.
    pub fn request_layer_replan(&mut self, layer: usize) -> Result<()> {
        self.check_layer(layer)?;
        self.replan_from = Some(self.replan_from.map_or(layer, |l| l.min(layer)));
        Ok(())
    }

    /// Moves `layer`'s cursor to its next container, which is returned.
    pub fn advance(&mut self, layer: usize) -> Result<Option<usize>> {
        self.check_layer(layer)?;
        Ok(self.result.advance(layer))
    }

    /// Containers the execution layer must start after the last tick.
    pub fn handoff(&self) -> Vec<ContainerSelection> {
        self.result.handoff(&self.domain)
    }

    fn check_layer(&self, layer: usize) -> Result<()> {
        let layer_count = self.domain.layer_count();
        if layer >= layer_count {
            return Err(PlannerError::UnknownLayer { layer, layer_count });
        }
        Ok(())
    }

    /// Drives the state machine once.
    ///
    /// A pass runs on the first tick, after a replan request, or when the live blackboard
    /// reports unexpected changes (which are consumed). Otherwise, and while a job is still
    /// running, the result is `NotRequired`.
    pub fn tick(&mut self, ctx: &TickContext) -> Result<&PlannerResult> {
        if self.domain.is_disposed() {
            return Err(self.disposed());
        }

        if let Some(job) = &self.pending {
            if job.is_finished() {
                self.collect_job();
            } else {
                self.result.mark_not_required();
            }
            return Ok(&self.result);
        }

        self.blackboard.sync_instance();
        match self.planning_trigger() {
            Some(start_layer) => self.start_pass(start_layer, ctx.tick)?,
            None => self.result.mark_not_required(),
        }
        Ok(&self.result)
    }

    fn disposed(&self) -> PlannerError {
        PlannerError::DomainDisposed {
            domain: self.domain.name().to_string(),
        }
    }

    fn retry_from(&mut self, start_layer: usize) {
        self.replan_from = Some(self.replan_from.map_or(start_layer, |l| l.min(start_layer)));
    }

    /// Blocks on the in-flight job and publishes it. `None` when no job was pending.
    pub fn wait_for_job(&mut self) -> Option<&PlannerResult> {
        self.pending.as_ref()?;
        self.collect_job();
        Some(&self.result)
    }

    fn planning_trigger(&mut self) -> Option<usize> {
        let unexpected = self.blackboard.has_unexpected_changes();
        if unexpected {
            let changed = self.blackboard.take_unexpected_changes();
            tracing::debug!(agent = self.id.0, ?changed, "unexpected blackboard changes");
        }
        if !self.started || unexpected {
            self.replan_from = None;
            return Some(0);
        }
        self.replan_from.take()
    }

    fn start_pass(&mut self, start_layer: usize, tick: u64) -> Result<()> {
        let mut workspace = match self.workspace.take() {
            Some(workspace) => workspace,
            None => PlannerWorkspace::new(&self.domain, &self.blackboard, self.config.trace_capacity),
        };
        workspace.load_start_state(&self.blackboard);
        self.started = true;
        let request = PassRequest { tick, start_layer };

        match self.config.mode {
            PlanningMode::Synchronous => {
                self.state = PlannerState::Planning;
                plan_pass(&self.domain, &self.config, &mut workspace, self.result.plans(), request);
                self.finish_pass(workspace);
            }
            PlanningMode::Job => {
                let previous = self.result.plans().clone();
                let spawned = PendingJob::spawn(
                    self.id,
                    &self.domain,
                    self.config,
                    workspace,
                    previous,
                    request,
                );
                match spawned {
                    Ok(job) => {
                        self.pending = Some(job);
                        self.state = PlannerState::AwaitingJob;
                        self.result.mark_not_required();
                    }
                    Err(workspace) => {
                        // Disposed between the tick's check and registration.
                        self.workspace = Some(workspace);
                        self.retry_from(start_layer);
                        return Err(self.disposed());
                    }
                }
            }
        }
        Ok(())
    }

    fn collect_job(&mut self) {
        let Some(job) = self.pending.take() else {
            return;
        };
        let start_layer = job.start_layer;
        let stale = job.cursors != self.result.plans().cursors();
        match job.join() {
            Some(workspace) if !stale => self.finish_pass(workspace),
            Some(workspace) => {
                // Cursors moved while the job ran; its child layers follow old containers.
                tracing::debug!(agent = self.id.0, start_layer, "discarding stale planning job");
                self.workspace = Some(workspace);
                self.state = PlannerState::Idle;
                self.retry_from(start_layer);
                self.result.mark_not_required();
            }
            None => {
                // Retry the same pass with a fresh workspace next tick.
                self.state = PlannerState::Idle;
                self.retry_from(start_layer);
                self.result.mark_not_required();
            }
        }
    }

    fn finish_pass(&mut self, mut workspace: PlannerWorkspace) {
        let kind = self.result.publish(workspace.plans());
        if let Some(sink) = self.sink.as_mut() {
            workspace.trace_mut().drain_into(sink.as_mut());
        }
        if kind == PlanResultKind::NewPlan {
            tracing::debug!(agent = self.id.0, goal = ?self.result.plans().goal(), "published new plan");
        }
        self.workspace = Some(workspace);
        self.state = PlannerState::Idle;
    }
}

impl Drop for LgoapAgent {
    fn drop(&mut self) {
        if let Some(job) = self.pending.take() {
            // The pass is never published once the agent is gone.
            let _workspace = job.join();
        }
    }
}
