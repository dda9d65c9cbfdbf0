use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lgoap_core::Blackboard;

use crate::{CompiledDomain, LgoapAgent, PlannerConfig, Result};

/// Stable agent identity, unique within one [`LgoapRuntime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AgentId(pub u64);

/// Registry entry for a live agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAgent {
    pub id: AgentId,
    pub domain: String,
}

type ActiveMap = Arc<Mutex<BTreeMap<AgentId, ActiveAgent>>>;

fn lock(map: &ActiveMap) -> MutexGuard<'_, BTreeMap<AgentId, ActiveAgent>> {
    map.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Removes the agent from its runtime's registry when dropped.
#[derive(Debug)]
pub(crate) struct Registration {
    id: AgentId,
    active: ActiveMap,
}

impl Drop for Registration {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.id);
    }
}

/// Explicit planning context: assigns agent ids and tracks which agents are alive.
///
/// Nothing here is process-global; independent runtimes never see each other's agents.
#[derive(Debug, Default)]
pub struct LgoapRuntime {
    config: PlannerConfig,
    next_id: u64,
    active: ActiveMap,
}

impl LgoapRuntime {
    pub fn new(config: PlannerConfig) -> Self {
        Self {
            config,
            next_id: 0,
            active: ActiveMap::default(),
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    fn allocate_id(&mut self) -> AgentId {
        self.next_id += 1;
        AgentId(self.next_id)
    }

    /// Creates an agent planning against `domain` with its own live blackboard.
    pub fn spawn_agent(&mut self, domain: &CompiledDomain, blackboard: Blackboard) -> Result<LgoapAgent> {
        self.spawn_agent_with(domain, blackboard, self.config)
    }

    /// Like [`LgoapRuntime::spawn_agent`] with a per-agent configuration.
    pub fn spawn_agent_with(
        &mut self,
        domain: &CompiledDomain,
        blackboard: Blackboard,
        config: PlannerConfig,
    ) -> Result<LgoapAgent> {
        let id = self.allocate_id();
        let mut agent = LgoapAgent::new(id, domain, blackboard, config)?;

        lock(&self.active).insert(
            id,
            ActiveAgent {
                id,
                domain: domain.name().to_string(),
            },
        );
        agent.registration = Some(Registration {
            id,
            active: Arc::clone(&self.active),
        });
        tracing::debug!(agent = id.0, domain = domain.name(), "spawned agent");
        Ok(agent)
    }

    /// Drops `agent`, waiting for its in-flight job first.
    pub fn retire(&mut self, agent: LgoapAgent) {
        let id = agent.id();
        drop(agent);
        tracing::debug!(agent = id.0, "retired agent");
    }

    pub fn active_agents(&self) -> Vec<ActiveAgent> {
        lock(&self.active).values().cloned().collect()
    }

    pub fn active_count(&self) -> usize {
        lock(&self.active).len()
    }

    pub fn is_active(&self, id: AgentId) -> bool {
        lock(&self.active).contains_key(&id)
    }
}
