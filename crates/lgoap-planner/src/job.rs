//! Planning jobs: one worker thread per in-flight pass.

use std::collections::BTreeMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use crate::planner::{plan_pass, PassRequest, PlannerWorkspace};
use crate::{AgentId, CompiledDomain, PlanSet, PlannerConfig};

#[derive(Debug)]
enum JobState {
    Running,
    /// `None` when the pass panicked.
    Finished(Option<PlannerWorkspace>),
    Taken,
}

/// Completion slot shared between a job thread, its agent and the domain's registry.
#[derive(Debug)]
pub struct JobSlot {
    state: Mutex<JobState>,
    done: Condvar,
}

impl JobSlot {
    fn new() -> Self {
        Self {
            state: Mutex::new(JobState::Running),
            done: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, JobState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, workspace: Option<PlannerWorkspace>) {
        *self.lock() = JobState::Finished(workspace);
        self.done.notify_all();
    }

    pub fn is_finished(&self) -> bool {
        !matches!(*self.lock(), JobState::Running)
    }

    /// Blocks until the job has finished.
    pub fn wait(&self) {
        let mut state = self.lock();
        while matches!(*state, JobState::Running) {
            state = self.done.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// The finished workspace, once. `Some(None)` means the pass panicked.
    fn try_take(&self) -> Option<Option<PlannerWorkspace>> {
        let mut state = self.lock();
        match core::mem::replace(&mut *state, JobState::Taken) {
            JobState::Running => {
                *state = JobState::Running;
                None
            }
            JobState::Finished(workspace) => Some(workspace),
            JobState::Taken => Some(None),
        }
    }
}

/// Marks the slot finished even if the pass unwinds, so waiters never hang.
struct FinishGuard {
    slot: Arc<JobSlot>,
    workspace: Option<PlannerWorkspace>,
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.slot.finish(self.workspace.take());
    }
}

/// Registry handle of one in-flight job. Unique per domain, unlike agent ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobTicket(pub u64);

#[derive(Debug, Default)]
struct Jobs {
    next_ticket: u64,
    closed: bool,
    slots: BTreeMap<JobTicket, (AgentId, Arc<JobSlot>)>,
}

/// In-flight jobs of one compiled domain.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<Jobs>,
}

impl JobRegistry {
    fn lock(&self) -> MutexGuard<'_, Jobs> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// `None` once the registry is closed.
    fn register(&self, agent: AgentId, slot: Arc<JobSlot>) -> Option<JobTicket> {
        let mut jobs = self.lock();
        if jobs.closed {
            return None;
        }
        jobs.next_ticket += 1;
        let ticket = JobTicket(jobs.next_ticket);
        jobs.slots.insert(ticket, (agent, slot));
        Some(ticket)
    }

    fn unregister(&self, ticket: JobTicket) {
        self.lock().slots.remove(&ticket);
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().slots.is_empty()
    }

    /// Whether `agent` has a job in flight.
    pub fn contains(&self, agent: AgentId) -> bool {
        self.lock().slots.values().any(|(owner, _)| *owner == agent)
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Refuses further jobs and blocks until every registered one has finished.
    pub(crate) fn close_and_wait(&self) {
        let slots: Vec<Arc<JobSlot>> = {
            let mut jobs = self.lock();
            jobs.closed = true;
            jobs.slots.values().map(|(_, slot)| Arc::clone(slot)).collect()
        };
        // Waiting happens outside the registry lock so finishing jobs can unregister.
        for slot in slots {
            slot.wait();
        }
    }
}

/// A scheduled pass owned by an agent.
#[derive(Debug)]
pub(crate) struct PendingJob {
    agent: AgentId,
    ticket: JobTicket,
    domain: CompiledDomain,
    slot: Arc<JobSlot>,
    handle: Option<JoinHandle<()>>,
    pub(crate) start_layer: usize,
    /// Cursors of the plans the pass started from.
    pub(crate) cursors: Vec<usize>,
}

impl PendingJob {
    /// Moves `workspace` onto a new thread and runs one pass there.
    ///
    /// Hands the workspace back when the domain no longer accepts jobs.
    pub(crate) fn spawn(
        agent: AgentId,
        domain: &CompiledDomain,
        config: PlannerConfig,
        mut workspace: PlannerWorkspace,
        previous: PlanSet,
        request: PassRequest,
    ) -> Result<Self, PlannerWorkspace> {
        let slot = Arc::new(JobSlot::new());
        let Some(ticket) = domain.jobs().register(agent, Arc::clone(&slot)) else {
            return Err(workspace);
        };
        let cursors = previous.cursors();

        let job_domain = domain.clone();
        let job_slot = Arc::clone(&slot);
        let handle = thread::spawn(move || {
            let mut guard = FinishGuard {
                slot: job_slot,
                workspace: None,
            };
            plan_pass(&job_domain, &config, &mut workspace, &previous, request);
            guard.workspace = Some(workspace);
        });

        Ok(Self {
            agent,
            ticket,
            domain: domain.clone(),
            slot,
            handle: Some(handle),
            start_layer: request.start_layer,
            cursors,
        })
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.slot.is_finished()
    }

    /// Waits for the thread and takes its workspace; `None` if the pass panicked.
    pub(crate) fn join(mut self) -> Option<PlannerWorkspace> {
        self.slot.wait();
        self.finish()
    }

    fn finish(&mut self) -> Option<PlannerWorkspace> {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(agent = self.agent.0, "planning job panicked");
            }
        }
        self.domain.jobs().unregister(self.ticket);
        self.slot.try_take().flatten()
    }
}

impl Drop for PendingJob {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.slot.wait();
            // Nobody is left to publish the pass.
            let _workspace = self.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_are_unique_per_registry() {
        let registry = JobRegistry::default();
        let a = registry.register(AgentId(1), Arc::new(JobSlot::new())).unwrap();
        let b = registry.register(AgentId(1), Arc::new(JobSlot::new())).unwrap();
        assert_ne!(a, b);
        assert_eq!(registry.len(), 2);

        registry.unregister(a);
        assert!(registry.contains(AgentId(1)));
        registry.unregister(b);
        assert!(registry.is_empty());
    }

    #[test]
    fn closed_registries_refuse_jobs() {
        let registry = JobRegistry::default();
        let slot = Arc::new(JobSlot::new());
        let ticket = registry.register(AgentId(1), Arc::clone(&slot)).unwrap();
        slot.finish(None);

        registry.close_and_wait();
        assert!(registry.is_closed());
        assert!(registry.register(AgentId(2), Arc::new(JobSlot::new())).is_none());
        registry.unregister(ticket);
        assert!(registry.is_empty());
    }
}
