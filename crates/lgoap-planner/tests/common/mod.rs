#![allow(dead_code)]

use std::sync::Arc;

use lgoap_core::builtins::{self, Comparison};
use lgoap_core::{BlackboardLayout, BlackboardTemplate, FunctionTable, KeyDecl, TemplateLibrary};
use lgoap_planner::{CompiledDomain, DomainDefinition, Goal, Task, TaskLayer};

pub fn functions() -> Arc<FunctionTable> {
    Arc::new(FunctionTable::with_builtins())
}

/// One broadcast integer, `count`.
pub fn counter_layout() -> Arc<BlackboardLayout> {
    TemplateLibrary::new()
        .with(BlackboardTemplate::new("Counter").with_key(KeyDecl::integer("count", 0).broadcast()))
        .compile("Counter")
        .unwrap()
}

/// Goals + one concrete layer of `inc` (+1, cost 1) and `jump` (+3, cost 2) reaching `count >= target`.
pub fn counter_domain(target: i32, max_plan_size: usize) -> DomainDefinition {
    DomainDefinition::new(
        "counter",
        "Counter",
        TaskLayer::new(max_plan_size)
            .with_task(
                Task::concrete("inc")
                    .costs(builtins::constant_score(1.0))
                    .effect(builtins::add_int("count", 1)),
            )
            .with_task(
                Task::concrete("jump")
                    .costs(builtins::constant_score(2.0))
                    .effect(builtins::add_int("count", 3)),
            ),
    )
    .with_goal(
        Goal::new("reach")
            .with_insistence(builtins::constant_score(1.0))
            .with_target(builtins::compare_int("count", Comparison::GreaterOrEqual, target)),
    )
}

/// Like [`counter_domain`] with `inc` as the only task.
pub fn increment_only_domain(target: i32, max_plan_size: usize) -> DomainDefinition {
    let mut domain = counter_domain(target, max_plan_size);
    domain.bottom_layer.tasks.truncate(1);
    domain
}

pub fn forager_layout() -> Arc<BlackboardLayout> {
    TemplateLibrary::new()
        .with(
            BlackboardTemplate::new("Forager")
                .with_key(KeyDecl::boolean("hungry", true).broadcast())
                .with_key(KeyDecl::boolean("has_food", false))
                .with_key(KeyDecl::boolean("at_tree", false))
                .with_key(KeyDecl::boolean("rested", false)),
        )
        .compile("Forager")
        .unwrap()
}

/// Three layers: goals (`eat`, `rest`), abstract `gather`/`feed`/`nap`, concrete steps.
pub fn forager_domain() -> DomainDefinition {
    let abstract_layer = TaskLayer::new(3)
        .with_task(
            Task::abstract_task("gather")
                .requires(builtins::is_unset("has_food"))
                .costs(builtins::constant_score(1.0))
                .effect(builtins::set_bool("has_food", true))
                .with_target(builtins::is_set("has_food")),
        )
        .with_task(
            Task::abstract_task("feed")
                .requires(builtins::is_set("has_food"))
                .costs(builtins::constant_score(1.0))
                .effect(builtins::set_bool("has_food", false))
                .effect(builtins::set_bool("hungry", false))
                .with_target(builtins::is_unset("hungry")),
        )
        .with_task(
            Task::abstract_task("nap")
                .costs(builtins::constant_score(2.0))
                .effect(builtins::set_bool("rested", true))
                .with_target(builtins::is_set("rested")),
        );

    let concrete_layer = TaskLayer::new(4)
        .with_task(
            Task::concrete("walk_to_tree")
                .requires(builtins::is_unset("at_tree"))
                .costs(builtins::constant_score(1.0))
                .effect(builtins::set_bool("at_tree", true)),
        )
        .with_task(
            Task::concrete("pick_fruit")
                .requires(builtins::is_set("at_tree"))
                .costs(builtins::constant_score(1.0))
                .effect(builtins::set_bool("has_food", true)),
        )
        .with_task(
            Task::concrete("eat_fruit")
                .requires(builtins::is_set("has_food"))
                .costs(builtins::constant_score(1.0))
                .effect(builtins::set_bool("has_food", false))
                .effect(builtins::set_bool("hungry", false)),
        )
        .with_task(
            Task::concrete("sleep")
                .costs(builtins::constant_score(3.0))
                .effect(builtins::set_bool("rested", true)),
        );

    DomainDefinition::new("forager", "Forager", concrete_layer)
        .with_intermediate_layer(abstract_layer)
        .with_goal(
            Goal::new("eat")
                .with_insistence(builtins::score_if("hungry", 10.0))
                .with_target(builtins::is_unset("hungry")),
        )
        .with_goal(
            Goal::new("rest")
                .with_insistence(builtins::constant_score(1.0))
                .with_target(builtins::is_set("rested")),
        )
}

pub fn compile(domain: &DomainDefinition, layout: &Arc<BlackboardLayout>) -> CompiledDomain {
    domain.compile(layout, &functions()).unwrap()
}
