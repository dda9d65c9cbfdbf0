use core::fmt::Write as _;

use lgoap_core::CompileObserver;

/// Byte range one named sub-object occupies in a compiled buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRecord {
    pub name: String,
    pub start: usize,
    pub end: usize,
    /// Nesting depth; top-level objects are 0.
    pub depth: usize,
}

impl CompileRecord {
    pub fn size(&self) -> usize {
        self.end - self.start
    }
}

/// Diagnostic side registry filled while a buffer is written.
///
/// Records are kept in the order objects were opened, so parents precede their children.
#[derive(Debug, Default)]
pub struct CompileRegistry {
    records: Vec<CompileRecord>,
    open: Vec<usize>,
}

impl CompileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[CompileRecord] {
        &self.records
    }

    pub fn find(&self, name: &str) -> Option<&CompileRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Records whose range contains `offset`, outermost first.
    pub fn containing(&self, offset: usize) -> impl Iterator<Item = &CompileRecord> {
        self.records
            .iter()
            .filter(move |r| r.start <= offset && offset < r.end)
    }

    /// Indented `start..end name` listing.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for record in &self.records {
            let _ = writeln!(
                out,
                "{:indent$}{:>6}..{:<6} {}",
                "",
                record.start,
                record.end,
                record.name,
                indent = record.depth * 2
            );
        }
        out
    }
}

impl CompileObserver for CompileRegistry {
    fn begin(&mut self, name: &str, start: usize) {
        self.open.push(self.records.len());
        self.records.push(CompileRecord {
            name: name.to_string(),
            start,
            end: start,
            depth: self.open.len() - 1,
        });
    }

    fn end(&mut self, end: usize) {
        if let Some(index) = self.open.pop() {
            self.records[index].end = end;
        }
    }
}
