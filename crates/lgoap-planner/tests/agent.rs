mod common;

use std::sync::{Arc, Mutex};

use lgoap_core::{Blackboard, Decorator, FunctionFault, FunctionTable, Params, TickContext};
use lgoap_planner::{
    AgentId, ContainerSelection, LgoapAgent, LgoapRuntime, PlanResultKind, PlannerConfig,
    PlannerError, PlannerState, PlanningMode,
};
use lgoap_tools::{TraceEvent, TraceSink};

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<Vec<TraceEvent>>>);

impl TraceSink for SharedSink {
    fn emit(&mut self, event: TraceEvent) {
        self.0.lock().unwrap().push(event);
    }
}

fn selection(layer: usize, container: usize) -> ContainerSelection {
    ContainerSelection { layer, container }
}

fn broken_sensor(_: &Blackboard, _: &mut Params<'_>) -> Result<bool, FunctionFault> {
    panic!("sensor unplugged")
}

#[test]
fn no_pass_runs_without_a_trigger() {
    let layout = common::counter_layout();
    let domain = common::compile(&common::counter_domain(2, 4), &layout);
    let mut runtime = LgoapRuntime::default();
    let mut agent = runtime.spawn_agent(&domain, layout.new_blackboard()).unwrap();
    let mut ctx = TickContext::default();

    let first = agent.tick(&ctx).unwrap();
    assert_eq!(first.kind(), PlanResultKind::NewPlan);
    assert_eq!(first.layer(1).unwrap().indices(), &[0, 0]);
    assert_eq!(agent.handoff(), vec![selection(0, 0), selection(1, 0)]);

    ctx = ctx.next();
    let second = agent.tick(&ctx).unwrap();
    assert_eq!(second.kind(), PlanResultKind::NotRequired);
    assert_eq!(second.layer(1).unwrap().indices(), &[0, 0]);
    assert_eq!(second.publications(), 1);
    assert!(agent.handoff().is_empty());
}

#[test]
fn unexpected_changes_trigger_a_full_replan() {
    let layout = common::counter_layout();
    let domain = common::compile(&common::counter_domain(2, 4), &layout);
    let mut runtime = LgoapRuntime::default();
    let mut agent = runtime.spawn_agent(&domain, layout.new_blackboard()).unwrap();
    agent.tick(&TickContext::default()).unwrap();

    let count = layout.key::<i32>("count").unwrap();
    agent.blackboard_mut().set(count, 2);
    assert!(agent.blackboard().has_unexpected_changes());

    let result = agent.tick(&TickContext::default()).unwrap();
    assert_eq!(result.kind(), PlanResultKind::NewPlan);
    assert_eq!(result.layer(0).unwrap().kind(), PlanResultKind::Unchanged);
    assert_eq!(result.layer(1).unwrap().kind(), PlanResultKind::NewPlan);
    assert!(result.layer(1).unwrap().is_empty());
    assert!(!agent.blackboard().has_unexpected_changes());

    // The change was consumed by the pass.
    let result = agent.tick(&TickContext::default()).unwrap();
    assert_eq!(result.kind(), PlanResultKind::NotRequired);
}

#[test]
fn replan_with_the_same_outcome_keeps_cursors() {
    let layout = common::counter_layout();
    let domain = common::compile(&common::counter_domain(2, 4), &layout);
    let mut runtime = LgoapRuntime::default();
    let mut agent = runtime.spawn_agent(&domain, layout.new_blackboard()).unwrap();
    agent.tick(&TickContext::default()).unwrap();

    assert_eq!(agent.advance(1).unwrap(), Some(0));
    agent.request_replan();
    let result = agent.tick(&TickContext::default()).unwrap();

    assert_eq!(result.kind(), PlanResultKind::Unchanged);
    assert_eq!(result.layer(1).unwrap().cursor(), 1);
    assert_eq!(result.publications(), 2);
    assert!(agent.handoff().is_empty());
}

#[test]
fn layer_replan_keeps_the_layers_above() {
    let layout = common::forager_layout();
    let domain = common::compile(&common::forager_domain(), &layout);
    let mut runtime = LgoapRuntime::default();
    let mut agent = runtime.spawn_agent(&domain, layout.new_blackboard()).unwrap();

    let first = agent.tick(&TickContext::default()).unwrap();
    assert_eq!(first.layer(1).unwrap().indices(), &[0, 1]);
    assert_eq!(first.layer(2).unwrap().indices(), &[0, 1]);

    // gather is done; move on to feed and replan the concrete layer under it.
    assert_eq!(agent.advance(1).unwrap(), Some(1));
    agent.request_layer_replan(2).unwrap();
    let result = agent.tick(&TickContext::default()).unwrap();

    assert_eq!(result.layer(0).unwrap().kind(), PlanResultKind::Unchanged);
    assert_eq!(result.layer(1).unwrap().kind(), PlanResultKind::Unchanged);
    assert_eq!(result.layer(1).unwrap().cursor(), 1);
    assert_eq!(result.layer(2).unwrap().kind(), PlanResultKind::NewPlan);
    // walk_to_tree, pick_fruit, eat_fruit
    assert_eq!(result.layer(2).unwrap().indices(), &[0, 1, 2]);
    assert_eq!(agent.handoff(), vec![selection(2, 0)]);
}

#[test]
fn full_replan_plans_children_under_the_executing_container() {
    let layout = common::forager_layout();
    let domain = common::compile(&common::forager_domain(), &layout);
    let mut runtime = LgoapRuntime::default();
    let mut agent = runtime.spawn_agent(&domain, layout.new_blackboard()).unwrap();
    agent.tick(&TickContext::default()).unwrap();

    assert_eq!(agent.advance(1).unwrap(), Some(1));
    agent.request_layer_replan(2).unwrap();
    agent.tick(&TickContext::default()).unwrap();

    agent.request_replan();
    let result = agent.tick(&TickContext::default()).unwrap();

    // gather, feed is still the plan and feed is still executing.
    assert_eq!(result.layer(1).unwrap().kind(), PlanResultKind::Unchanged);
    assert_eq!(result.layer(1).unwrap().current(), Some(1));
    assert_eq!(result.layer(2).unwrap().kind(), PlanResultKind::Unchanged);
    assert_eq!(result.layer(2).unwrap().indices(), &[0, 1, 2]);
    assert_eq!(result.kind(), PlanResultKind::Unchanged);
    assert!(agent.handoff().is_empty());
}

#[test]
fn job_passes_outrun_by_the_cursor_are_replanned() {
    let layout = common::forager_layout();
    let domain = common::compile(&common::forager_domain(), &layout);
    let mut runtime = LgoapRuntime::new(PlannerConfig::default().with_mode(PlanningMode::Job));
    let mut agent = runtime.spawn_agent(&domain, layout.new_blackboard()).unwrap();
    agent.tick(&TickContext::default()).unwrap();
    agent.wait_for_job().unwrap();

    agent.request_replan();
    agent.tick(&TickContext::default()).unwrap();
    assert_eq!(agent.advance(1).unwrap(), Some(1));
    let discarded = agent.wait_for_job().unwrap();
    assert_eq!(discarded.kind(), PlanResultKind::NotRequired);
    assert_eq!(discarded.publications(), 1);
    assert_eq!(agent.state(), PlannerState::Idle);

    agent.tick(&TickContext::default()).unwrap();
    let result = agent.wait_for_job().unwrap();
    assert_eq!(result.layer(1).unwrap().kind(), PlanResultKind::Unchanged);
    assert_eq!(result.layer(1).unwrap().cursor(), 1);
    assert_eq!(result.layer(2).unwrap().kind(), PlanResultKind::NewPlan);
    assert_eq!(result.layer(2).unwrap().indices(), &[0, 1, 2]);
    assert_eq!(agent.handoff(), vec![selection(2, 0)]);
}

#[test]
fn panicking_functions_plan_the_same_in_both_modes() {
    let mut functions = FunctionTable::with_builtins();
    functions.register_decorator("broken_sensor", &[], broken_sensor);
    let functions = Arc::new(functions);
    let layout = common::counter_layout();
    let mut definition = common::counter_domain(3, 4);
    definition.bottom_layer.tasks[1]
        .action
        .precondition
        .push(Decorator::new("broken_sensor"));
    let domain = definition.compile(&layout, &functions).unwrap();
    let mut runtime = LgoapRuntime::default();

    let mut sync_agent = runtime.spawn_agent(&domain, layout.new_blackboard()).unwrap();
    let expected = sync_agent.tick(&TickContext::default()).unwrap().clone();
    assert_eq!(expected.kind(), PlanResultKind::NewPlan);
    // jump never passes its precondition.
    assert_eq!(expected.layer(1).unwrap().indices(), &[0, 0, 0]);

    let config = PlannerConfig::default().with_mode(PlanningMode::Job);
    let mut job_agent = runtime
        .spawn_agent_with(&domain, layout.new_blackboard(), config)
        .unwrap();
    job_agent.tick(&TickContext::default()).unwrap();
    assert_eq!(job_agent.wait_for_job().unwrap(), &expected);
}

#[test]
fn invalid_configs_are_rejected() {
    let layout = common::counter_layout();
    let domain = common::compile(&common::counter_domain(2, 4), &layout);
    let mut runtime = LgoapRuntime::default();

    let zero_heuristic = PlannerConfig {
        unachieved_heuristic: 0.0,
        ..PlannerConfig::default()
    };
    let err = runtime
        .spawn_agent_with(&domain, layout.new_blackboard(), zero_heuristic)
        .unwrap_err();
    assert!(matches!(
        err,
        PlannerError::InvalidConfig { ref reason } if reason.contains("unachieved_heuristic")
    ));
    assert_eq!(runtime.active_count(), 0);

    let nan_heuristic = PlannerConfig {
        unachieved_heuristic: f32::NAN,
        ..PlannerConfig::default()
    };
    assert!(LgoapAgent::new(AgentId(9), &domain, layout.new_blackboard(), nan_heuristic).is_err());

    let no_iterations = PlannerConfig {
        max_ida_iterations: 0,
        ..PlannerConfig::default()
    };
    assert!(matches!(
        LgoapAgent::new(AgentId(9), &domain, layout.new_blackboard(), no_iterations),
        Err(PlannerError::InvalidConfig { .. })
    ));
}

#[test]
fn layer_requests_are_range_checked() {
    let layout = common::forager_layout();
    let domain = common::compile(&common::forager_domain(), &layout);
    let mut runtime = LgoapRuntime::default();
    let mut agent = runtime.spawn_agent(&domain, layout.new_blackboard()).unwrap();

    assert_eq!(
        agent.request_layer_replan(3),
        Err(PlannerError::UnknownLayer {
            layer: 3,
            layer_count: 3
        })
    );
    assert!(matches!(
        agent.advance(7),
        Err(PlannerError::UnknownLayer { layer: 7, .. })
    ));
}

#[test]
fn job_mode_publishes_the_same_plan_later() {
    let layout = common::forager_layout();
    let domain = common::compile(&common::forager_domain(), &layout);
    let mut runtime = LgoapRuntime::default();

    let mut sync_agent = runtime.spawn_agent(&domain, layout.new_blackboard()).unwrap();
    let expected = sync_agent.tick(&TickContext::default()).unwrap().plans().clone();

    let config = PlannerConfig::default().with_mode(PlanningMode::Job);
    let mut job_agent = runtime
        .spawn_agent_with(&domain, layout.new_blackboard(), config)
        .unwrap();
    let scheduled = job_agent.tick(&TickContext::default()).unwrap();
    assert_eq!(scheduled.kind(), PlanResultKind::NotRequired);
    assert_eq!(scheduled.publications(), 0);
    assert_eq!(job_agent.state(), PlannerState::AwaitingJob);

    let published = job_agent.wait_for_job().unwrap();
    assert_eq!(published.kind(), PlanResultKind::NewPlan);
    assert_eq!(published.plans(), &expected);
    assert_eq!(job_agent.state(), PlannerState::Idle);
    assert!(domain.jobs().is_empty());
    assert!(job_agent.wait_for_job().is_none());
}

#[test]
fn finished_jobs_are_collected_by_tick() {
    let layout = common::counter_layout();
    let domain = common::compile(&common::counter_domain(3, 4), &layout);
    let mut runtime = LgoapRuntime::new(PlannerConfig::default().with_mode(PlanningMode::Job));
    let mut agent = runtime.spawn_agent(&domain, layout.new_blackboard()).unwrap();

    agent.tick(&TickContext::default()).unwrap();
    let mut published = None;
    for _ in 0..1000 {
        let result = agent.tick(&TickContext::default()).unwrap();
        if result.kind() != PlanResultKind::NotRequired {
            published = Some(result.clone());
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(1));
    }

    let published = published.unwrap();
    assert_eq!(published.kind(), PlanResultKind::NewPlan);
    assert_eq!(published.layer(1).unwrap().indices(), &[1]);
}

#[test]
fn dropping_an_agent_waits_for_its_job() {
    let layout = common::counter_layout();
    let domain = common::compile(&common::counter_domain(3, 4), &layout);
    let mut runtime = LgoapRuntime::new(PlannerConfig::default().with_mode(PlanningMode::Job));
    let mut agent = runtime.spawn_agent(&domain, layout.new_blackboard()).unwrap();
    let id = agent.id();

    agent.tick(&TickContext::default()).unwrap();
    runtime.retire(agent);

    assert!(!domain.jobs().contains(id));
    assert!(!runtime.is_active(id));
}

#[test]
fn published_passes_stream_into_the_trace_sink() {
    let layout = common::counter_layout();
    let domain = common::compile(&common::counter_domain(3, 4), &layout);
    let mut runtime = LgoapRuntime::default();
    let mut agent = runtime.spawn_agent(&domain, layout.new_blackboard()).unwrap();
    let sink = SharedSink::default();
    agent.set_trace_sink(Box::new(sink.clone()));

    agent.tick(&TickContext::default()).unwrap();
    let events = sink.0.lock().unwrap().clone();
    assert_eq!(events.first().map(|e| e.tag.as_ref()), Some("lgoap.plan.start"));
    assert_eq!(events.last().map(|e| e.tag.as_ref()), Some("lgoap.layer.planned"));

    agent.tick(&TickContext::default()).unwrap();
    assert_eq!(sink.0.lock().unwrap().len(), events.len());
}

#[test]
fn agents_reject_blackboards_of_another_template() {
    let domain = common::compile(&common::forager_domain(), &common::forager_layout());
    let mut runtime = LgoapRuntime::default();

    let err = runtime
        .spawn_agent(&domain, common::counter_layout().new_blackboard())
        .unwrap_err();
    assert_eq!(
        err,
        PlannerError::LayoutMismatch {
            domain: "forager".into(),
            expected: "Forager".into(),
            actual: "Counter".into(),
        }
    );
    assert_eq!(runtime.active_count(), 0);
}

#[test]
fn disposed_domains_refuse_ticks() {
    let layout = common::counter_layout();
    let domain = common::compile(&common::counter_domain(3, 4), &layout);
    let mut runtime = LgoapRuntime::default();
    let mut agent = runtime.spawn_agent(&domain, layout.new_blackboard()).unwrap();

    domain.dispose();
    assert!(domain.is_disposed());
    assert_eq!(
        agent.tick(&TickContext::default()).unwrap_err(),
        PlannerError::DomainDisposed {
            domain: "counter".into()
        }
    );
}
