use lgoap_core::stream::{compile_to_buffer, Collection, CollectionView};
use lgoap_core::{
    builtins, BlackboardTemplate, FunctionTable, KeyDecl, KeyValue, PrepareContext,
    TemplateLibrary, ValidationReport,
};
use proptest::prelude::*;

fn key_strategy() -> impl Strategy<Value = KeyValue> {
    prop_oneof![
        any::<bool>().prop_map(KeyValue::Boolean),
        (-1.0e6f32..1.0e6).prop_map(KeyValue::Float),
        any::<i32>().prop_map(KeyValue::Integer),
        prop::array::uniform3(-1.0e3f32..1.0e3).prop_map(KeyValue::Vector),
    ]
}

proptest! {
    #[test]
    fn defaults_round_trip_through_compiled_layout(values in prop::collection::vec(key_strategy(), 1..24)) {
        let mut template = BlackboardTemplate::new("Generated");
        for (i, value) in values.iter().enumerate() {
            let mut decl = KeyDecl::new(format!("k{i}"), value.key_type());
            decl.default = Some(*value);
            template = template.with_key(decl);
        }
        let layout = TemplateLibrary::new().with(template).compile("Generated").unwrap();

        let expected: usize = values.iter().map(|v| v.key_type().size()).sum();
        prop_assert_eq!(layout.size(), expected);

        let bb = layout.new_blackboard();
        for (i, value) in values.iter().enumerate() {
            prop_assert_eq!(bb.get_value(&format!("k{i}")).unwrap(), *value);
        }
    }

    #[test]
    fn frame_walk_visits_every_frame(rhs in prop::collection::vec(any::<i32>(), 0..16)) {
        let layout = TemplateLibrary::new()
            .with(BlackboardTemplate::new("B").with_key(KeyDecl::integer("n", 0)))
            .compile("B")
            .unwrap();
        let functions = FunctionTable::with_builtins();
        let ctx = PrepareContext { layout: &layout, functions: &functions };
        let mut report = ValidationReport::new();

        let frames: Collection<_> = rhs
            .iter()
            .map(|v| {
                builtins::compare_int("n", builtins::Comparison::Equal, *v)
                    .prepare("p", ctx, &mut report)
                    .unwrap()
            })
            .collect();
        let buffer = compile_to_buffer(&frames);
        let view = CollectionView::new(&buffer);

        prop_assert_eq!(view.len(), rhs.len());
        prop_assert_eq!(view.frames().count(), rhs.len());
        prop_assert_eq!(view.size(), buffer.len());
    }
}
