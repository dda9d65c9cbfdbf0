mod common;

use lgoap_core::TickContext;
use lgoap_planner::{select_goal, LgoapRuntime, PlannerConfig};
use proptest::prelude::*;

/// (increment, cost) of the counter domain's `inc` and `jump` tasks.
const STEPS: [(i32, u32); 2] = [(1, 1), (3, 2)];

fn cheapest_cost(target: i32, max_len: usize) -> Option<u32> {
    let mut best = None;
    let mut frontier = vec![(0i32, 0u32)];
    for _ in 0..=max_len {
        let mut next = Vec::new();
        for &(count, cost) in &frontier {
            if count >= target {
                best = Some(best.map_or(cost, |b: u32| b.min(cost)));
                continue;
            }
            next.extend(STEPS.iter().map(|&(inc, c)| (count + inc, cost + c)));
        }
        frontier = next;
    }
    best
}

proptest! {
    #[test]
    fn goal_selection_is_the_first_maximum(scores in prop::collection::vec(-100.0f32..100.0, 1..12)) {
        let chosen = select_goal(scores.iter().copied());
        let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        prop_assert_eq!(scores[chosen], max);
        prop_assert!(scores[..chosen].iter().all(|&s| s < max));
    }

    #[test]
    fn nan_scores_lose_to_any_number(
        scores in prop::collection::vec(-100.0f32..100.0, 1..8),
        nan_at in 0usize..8,
    ) {
        let mut with_nan = scores.clone();
        with_nan.insert(nan_at.min(scores.len()), f32::NAN);
        prop_assert!(!with_nan[select_goal(with_nan.iter().copied())].is_nan());
    }

    #[test]
    fn counter_plans_are_valid_and_cheapest(target in 1i32..=12) {
        let layout = common::counter_layout();
        let domain = common::compile(&common::counter_domain(target, 4), &layout);
        let mut runtime = LgoapRuntime::new(PlannerConfig::default());
        let mut agent = runtime.spawn_agent(&domain, layout.new_blackboard()).unwrap();
        let result = agent.tick(&TickContext::default()).unwrap();

        let plan = result.layer(1).unwrap().indices();
        prop_assert!(plan.len() <= 4);
        let (reached, cost) = plan.iter().fold((0, 0), |(count, cost), &task| {
            let (inc, c) = STEPS[task as usize];
            (count + inc, cost + c)
        });
        prop_assert!(reached >= target);
        prop_assert_eq!(Some(cost), cheapest_cost(target, 4));
    }
}
