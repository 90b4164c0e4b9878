use std::collections::HashMap;

use cranelift_entity::{entity_impl, PrimaryMap};

use crate::ast::{GrammarFile, Rule};
use crate::error::Diagnostic;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct RuleHandle(u32);

entity_impl! { RuleHandle }

/// The rule table: every parsed rule held by owned slot in an arena, indexed
/// by name. References between rules stay as names looked up on demand, so
/// the mutually recursive rule graph carries no ownership cycles.
#[derive(Debug)]
pub struct Grammar {
    rules: PrimaryMap<RuleHandle, Rule>,
    by_name: HashMap<String, RuleHandle>,
    start: RuleHandle,
    options: Vec<String>,
}

impl Grammar {
    /// Builds the table, rejecting duplicate rule names. The start rule is
    /// the rule literally named `@` if present, else the first rule in file
    /// order.
    pub fn new(file: GrammarFile) -> Result<Grammar, Diagnostic> {
        let mut rules = PrimaryMap::new();
        let mut by_name = HashMap::new();

        for rule in file.rules {
            if by_name.contains_key(&rule.name) {
                return Err(Diagnostic::in_rule(rule.line, "duplicate rule name", &rule.name));
            }
            let name = rule.name.clone();
            let handle = rules.push(rule);
            by_name.insert(name, handle);
        }

        let start = by_name
            .get("@")
            .copied()
            .or_else(|| rules.keys().next())
            .ok_or_else(|| Diagnostic::message("no starting rule was found"))?;

        Ok(Grammar {
            rules,
            by_name,
            start,
            options: file.options,
        })
    }

    pub fn start(&self) -> RuleHandle {
        self.start
    }

    pub fn lookup(&self, name: &str) -> Option<RuleHandle> {
        self.by_name.get(name).copied()
    }

    pub fn keys(&self) -> cranelift_entity::Keys<RuleHandle> {
        self.rules.keys()
    }

    /// Rules in file order.
    pub fn iter(&self) -> cranelift_entity::Iter<'_, RuleHandle, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Leading `+option` declarations, acknowledged but not interpreted.
    pub fn options(&self) -> &[String] {
        &self.options
    }
}

impl std::ops::Index<RuleHandle> for Grammar {
    type Output = Rule;
    fn index(&self, index: RuleHandle) -> &Self::Output {
        &self.rules[index]
    }
}
