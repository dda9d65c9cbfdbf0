use lgoap_core::stream::{compile_to_buffer_observed, Compile, Cursor};
use lgoap_tools::CompileRegistry;

struct Node {
    name: &'static str,
    payload: usize,
    children: Vec<Node>,
}

impl Compile for Node {
    fn size_for_compilation(&self) -> usize {
        self.payload + self.children.iter().map(Compile::size_for_compilation).sum::<usize>()
    }

    fn compile(&self, cursor: &mut Cursor<'_>) {
        cursor.begin(self.name);
        cursor.write_bytes(&vec![0xAB; self.payload]);
        for child in &self.children {
            child.compile(cursor);
        }
        cursor.end();
    }
}

#[test]
fn registry_records_nested_ranges() {
    let tree = Node {
        name: "domain",
        payload: 1,
        children: vec![
            Node { name: "goals", payload: 4, children: vec![] },
            Node {
                name: "layer 1",
                payload: 2,
                children: vec![Node { name: "task 0", payload: 3, children: vec![] }],
            },
        ],
    };

    let mut registry = CompileRegistry::new();
    let buffer = compile_to_buffer_observed(&tree, &mut registry);
    assert_eq!(buffer.len(), 10);

    let summary: Vec<(&str, usize, usize, usize)> = registry
        .records()
        .iter()
        .map(|r| (r.name.as_str(), r.start, r.end, r.depth))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("domain", 0, 10, 0),
            ("goals", 1, 5, 1),
            ("layer 1", 5, 10, 1),
            ("task 0", 7, 10, 2),
        ]
    );

    let names: Vec<&str> = registry.containing(8).map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["domain", "layer 1", "task 0"]);
    assert!(registry.render().contains("task 0"));
}
