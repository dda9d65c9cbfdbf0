#![cfg(feature = "planner")]

use std::sync::Arc;

use lgoap::prelude::*;

#[test]
fn prelude_covers_authoring_to_handoff() {
    let layout = TemplateLibrary::new()
        .with(
            BlackboardTemplate::new("Guard")
                .with_key(KeyDecl::boolean("alarm", false).broadcast())
                .with_key(KeyDecl::boolean("door_locked", false)),
        )
        .compile("Guard")
        .unwrap();

    let domain = DomainDefinition::new(
        "guard",
        "Guard",
        TaskLayer::new(2).with_task(
            Task::concrete("lock_door")
                .requires(builtins::is_unset("door_locked"))
                .costs(builtins::constant_score(1.0))
                .effect(builtins::set_bool("door_locked", true)),
        ),
    )
    .with_goal(
        Goal::new("secure")
            .with_insistence(builtins::score_if("alarm", 5.0))
            .with_target(builtins::is_set("door_locked")),
    )
    .compile(&layout, &Arc::new(FunctionTable::with_builtins()))
    .unwrap();

    let mut runtime = LgoapRuntime::new(PlannerConfig::default());
    let mut agent = runtime.spawn_agent(&domain, layout.new_blackboard()).unwrap();
    let result = agent.tick(&TickContext::default()).unwrap();
    assert_eq!(result.kind(), PlanResultKind::NewPlan);
    assert_eq!(
        agent.handoff(),
        vec![
            ContainerSelection {
                layer: 0,
                container: 0
            },
            ContainerSelection {
                layer: 1,
                container: 0
            },
        ]
    );
}
