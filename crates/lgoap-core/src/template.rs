use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{BlackboardLayout, KeyDecl, ValidationIssue, ValidationReport};

/// Authored, inheritable declaration of a blackboard's key set.
///
/// `keys` holds slots rather than keys: authored data may leave a slot empty, which validation
/// reports.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BlackboardTemplate {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub parent: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub keys: Vec<Option<KeyDecl>>,
}

impl BlackboardTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_key(mut self, key: KeyDecl) -> Self {
        self.keys.push(Some(key));
        self
    }

    pub fn with_empty_slot(mut self) -> Self {
        self.keys.push(None);
        self
    }
}

/// Every template known to the host, addressed by name.
///
/// Parents are referenced by name, so inheritance cycles can be authored; [`validate`] reports
/// them instead of looping.
///
/// [`validate`]: TemplateLibrary::validate
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(transparent))]
pub struct TemplateLibrary {
    templates: BTreeMap<String, BlackboardTemplate>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, template: BlackboardTemplate) -> Option<BlackboardTemplate> {
        self.templates.insert(template.name.clone(), template)
    }

    pub fn with(mut self, template: BlackboardTemplate) -> Self {
        self.insert(template);
        self
    }

    pub fn get(&self, name: &str) -> Option<&BlackboardTemplate> {
        self.templates.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlackboardTemplate> {
        self.templates.values()
    }

    /// Ancestor chain of `name`, root first.
    fn chain(&self, name: &str) -> Result<Vec<&BlackboardTemplate>, ValidationIssue> {
        let mut seen: Vec<&str> = Vec::new();
        let mut chain = Vec::new();
        let mut current = name;

        loop {
            if let Some(pos) = seen.iter().position(|s| *s == current) {
                let mut cycle: Vec<String> = seen[pos..].iter().map(|s| s.to_string()).collect();
                cycle.push(current.to_string());
                return Err(ValidationIssue::CyclicInheritance {
                    template: current.to_string(),
                    chain: cycle,
                });
            }

            let Some(template) = self.templates.get(current) else {
                return Err(match seen.last() {
                    Some(child) => ValidationIssue::MissingParent {
                        template: child.to_string(),
                        parent: current.to_string(),
                    },
                    None => ValidationIssue::UnknownTemplate {
                        template: current.to_string(),
                    },
                });
            };

            seen.push(current);
            chain.push(template);
            match template.parent.as_deref() {
                Some(parent) => current = parent,
                None => break,
            }
        }

        chain.reverse();
        Ok(chain)
    }

    /// Checks the keys a template declares itself, against its (acyclic) ancestors.
    fn check_keys(chain: &[&BlackboardTemplate], report: &mut ValidationReport) {
        let Some((template, ancestors)) = chain.split_last() else {
            return;
        };

        let mut declared: BTreeMap<&str, &str> = BTreeMap::new();
        for ancestor in ancestors {
            for decl in ancestor.keys.iter().flatten() {
                declared
                    .entry(decl.name.as_str())
                    .or_insert(ancestor.name.as_str());
            }
        }

        for (slot, decl) in template.keys.iter().enumerate() {
            let Some(decl) = decl else {
                report.push_unique(ValidationIssue::EmptyKey {
                    template: template.name.clone(),
                    slot,
                });
                continue;
            };

            if !decl.key_type.is_valid() {
                report.push_unique(ValidationIssue::InvalidKeyType {
                    template: template.name.clone(),
                    key: decl.name.clone(),
                });
            } else if let Some(default) = decl.default {
                if default.key_type() != decl.key_type {
                    report.push_unique(ValidationIssue::DefaultTypeMismatch {
                        template: template.name.clone(),
                        key: decl.name.clone(),
                        expected: decl.key_type,
                        actual: default.key_type(),
                    });
                }
            }

            if let Some(first) = declared.get(decl.name.as_str()) {
                report.push_unique(ValidationIssue::DuplicateKey {
                    key: decl.name.clone(),
                    template: template.name.clone(),
                    first_declared_in: first.to_string(),
                });
            } else {
                declared.insert(decl.name.as_str(), template.name.as_str());
            }
        }
    }

    /// Validates every template. Each cycle is reported once, at its recursion point.
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();
        let mut cyclic: BTreeSet<String> = BTreeSet::new();

        for name in self.templates.keys() {
            if cyclic.contains(name) {
                continue;
            }
            match self.chain(name) {
                Ok(chain) => Self::check_keys(&chain, &mut report),
                Err(issue) => {
                    if let ValidationIssue::CyclicInheritance { chain, .. } = &issue {
                        cyclic.extend(chain.iter().cloned());
                    }
                    report.push_unique(issue);
                }
            }
        }

        report
    }

    /// Validates `name` and its ancestors only.
    pub fn validate_template(&self, name: &str) -> ValidationReport {
        let mut report = ValidationReport::new();
        match self.chain(name) {
            Ok(chain) => {
                for depth in 1..=chain.len() {
                    Self::check_keys(&chain[..depth], &mut report);
                }
            }
            Err(issue) => report.push(issue),
        }
        report
    }

    /// Validates then compiles `name`, parents first.
    pub fn compile(&self, name: &str) -> Result<Arc<BlackboardLayout>, ValidationReport> {
        let report = self.validate_template(name);
        if !report.is_ok() {
            return Err(report);
        }
        let mut cache = BTreeMap::new();
        Ok(self.compile_cached(name, &mut cache))
    }

    /// Validates and compiles every template; ancestors are compiled once and shared.
    pub fn compile_all(&self) -> Result<BTreeMap<String, Arc<BlackboardLayout>>, ValidationReport> {
        let report = self.validate();
        if !report.is_ok() {
            return Err(report);
        }
        let mut cache = BTreeMap::new();
        for name in self.templates.keys() {
            self.compile_cached(name, &mut cache);
        }
        Ok(cache)
    }

    fn compile_cached(
        &self,
        name: &str,
        cache: &mut BTreeMap<String, Arc<BlackboardLayout>>,
    ) -> Arc<BlackboardLayout> {
        if let Some(layout) = cache.get(name) {
            return Arc::clone(layout);
        }
        // Validated: the template exists and its chain is acyclic.
        let template = &self.templates[name];
        let parent = template
            .parent
            .as_deref()
            .map(|p| self.compile_cached(p, cache));
        let layout = Arc::new(BlackboardLayout::compile(template, parent.as_deref()));
        cache.insert(name.to_string(), Arc::clone(&layout));
        layout
    }
}
