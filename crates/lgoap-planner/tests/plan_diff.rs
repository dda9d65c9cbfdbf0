mod common;

use lgoap_planner::{ContainerSelection, PlanResultKind, PlanSet, PlannerResult};

fn plans(layers: &[&[usize]]) -> PlanSet {
    let mut set = PlanSet::with_capacities(&[1, 4, 4]);
    for (index, containers) in layers.iter().enumerate() {
        set.layer_mut(index).unwrap().assign(containers.iter().copied());
    }
    set
}

fn kinds(result: &PlannerResult) -> Vec<PlanResultKind> {
    result.plans().layers().iter().map(|l| l.kind()).collect()
}

#[test]
fn first_publication_is_a_new_plan_everywhere() {
    let mut result = PlannerResult::new(&[1, 4, 4]);
    assert_eq!(result.kind(), PlanResultKind::NotRequired);

    let kind = result.publish(&plans(&[&[0], &[1, 2], &[3]]));
    assert_eq!(kind, PlanResultKind::NewPlan);
    assert_eq!(kinds(&result), vec![PlanResultKind::NewPlan; 3]);
    assert_eq!(result.publications(), 1);
}

#[test]
fn identical_pass_is_unchanged() {
    let mut result = PlannerResult::new(&[1, 4, 4]);
    let next = plans(&[&[0], &[1, 2], &[3, 0]]);
    result.publish(&next);

    assert_eq!(result.publish(&next), PlanResultKind::Unchanged);
    assert_eq!(kinds(&result), vec![PlanResultKind::Unchanged; 3]);
}

#[test]
fn layers_below_the_first_divergence_restart() {
    let mut result = PlannerResult::new(&[1, 4, 4]);
    result.publish(&plans(&[&[0], &[1, 2], &[3, 0]]));

    let kind = result.publish(&plans(&[&[0], &[1, 0], &[3, 0]]));
    assert_eq!(kind, PlanResultKind::NewPlan);
    assert_eq!(
        kinds(&result),
        vec![
            PlanResultKind::Unchanged,
            PlanResultKind::NewPlan,
            PlanResultKind::NewPlan,
        ]
    );
    assert_eq!(result.layer(1).unwrap().indices(), &[1, 0]);
    assert_eq!(result.layer(2).unwrap().indices(), &[3, 0]);
    assert_eq!(result.layer(2).unwrap().cursor(), 0);
}

#[test]
fn mark_not_required_keeps_plans() {
    let mut result = PlannerResult::new(&[1, 4, 4]);
    result.publish(&plans(&[&[0], &[1], &[2]]));
    result.mark_not_required();

    assert_eq!(result.kind(), PlanResultKind::NotRequired);
    assert_eq!(kinds(&result), vec![PlanResultKind::NotRequired; 3]);
    assert_eq!(result.layer(1).unwrap().indices(), &[1]);
}

#[test]
fn first_divergence_compares_containers_only() {
    let a = plans(&[&[0], &[1, 2], &[]]);
    let mut b = a.clone();
    b.layer_mut(1).unwrap().advance();
    assert_eq!(a.first_divergence(&b), None);

    let c = plans(&[&[0], &[1, 2], &[4]]);
    assert_eq!(a.first_divergence(&c), Some(2));
}

#[test]
fn handoff_skips_containers_the_domain_does_not_have() {
    let layout = common::forager_layout();
    let domain = common::compile(&common::forager_domain(), &layout);

    let mut result = PlannerResult::new(domain.max_plan_sizes());
    let mut next = PlanSet::with_capacities(domain.max_plan_sizes());
    next.layer_mut(0).unwrap().assign([1]);
    next.layer_mut(1).unwrap().assign([9]);
    next.layer_mut(2).unwrap().assign([3]);
    result.publish(&next);

    assert_eq!(
        result.handoff(&domain),
        vec![
            ContainerSelection {
                layer: 0,
                container: 1
            },
            ContainerSelection {
                layer: 2,
                container: 3
            },
        ]
    );
}

#[test]
fn handoff_only_reports_new_plans() {
    let layout = common::forager_layout();
    let domain = common::compile(&common::forager_domain(), &layout);

    let mut result = PlannerResult::new(domain.max_plan_sizes());
    let mut first = PlanSet::with_capacities(domain.max_plan_sizes());
    first.layer_mut(0).unwrap().assign([0]);
    first.layer_mut(1).unwrap().assign([0, 1]);
    first.layer_mut(2).unwrap().assign([0, 1]);
    result.publish(&first);

    let mut second = first.clone();
    second.layer_mut(2).unwrap().assign([0, 1, 2]);
    result.publish(&second);

    assert_eq!(
        result.handoff(&domain),
        vec![ContainerSelection {
            layer: 2,
            container: 0
        }]
    );
}
