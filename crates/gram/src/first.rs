//! FIRST-set resolution.
//!
//! For every rule, computes the set of terminal identities that can appear as
//! the first matched token when the rule is entered, plus whether the rule
//! can match zero tokens. Grammars a single-token-lookahead recursive-descent
//! parser could not handle deterministically are rejected: left-recursive
//! cycles, repeating constructs that can match nothing, and alternatives
//! whose FIRST-sets overlap.

use cranelift_entity::SecondaryMap;
use indexmap::IndexMap;

use crate::ast::{Rule, Sequence, Term, TermKind};
use crate::error::Diagnostic;
use crate::grammar::{Grammar, RuleHandle};

/// An ordered set of terminal identities. Each entry remembers the rule whose
/// sequence contributed it; that back-reference exists only so ambiguity
/// diagnostics can name both branches.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FirstSet {
    terms: IndexMap<String, String>,
    /// Whether the construct can match the empty sequence.
    pub has_epsilon: bool,
}

impl FirstSet {
    /// Terminal identities in resolution order.
    pub fn terminals(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn contains(&self, terminal: &str) -> bool {
        self.terms.contains_key(terminal)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Per-rule resolution state. The write-once memo and the transient
/// in-progress marker live in one enum so "resolved but still resolving" is
/// unrepresentable.
#[derive(Clone, Default)]
enum ResolveState {
    #[default]
    Unresolved,
    Resolving,
    Resolved(FirstSet),
}

/// Computes the FIRST-set of every rule. Resolution is seeded at the start
/// rule and then runs over every rule in file order, so unreachable rules are
/// still validated.
pub fn resolve(grammar: &Grammar) -> Result<SecondaryMap<RuleHandle, FirstSet>, Diagnostic> {
    let mut resolver = Resolver {
        grammar,
        states: SecondaryMap::new(),
    };

    resolver.rule_first(grammar.start())?;
    for handle in grammar.keys() {
        resolver.rule_first(handle)?;
    }

    let mut sets = SecondaryMap::new();
    for handle in grammar.keys() {
        if let ResolveState::Resolved(set) = &resolver.states[handle] {
            sets[handle] = set.clone();
        }
    }
    Ok(sets)
}

struct Resolver<'a> {
    grammar: &'a Grammar,
    states: SecondaryMap<RuleHandle, ResolveState>,
}

impl<'a> Resolver<'a> {
    fn rule_first(&mut self, handle: RuleHandle) -> Result<FirstSet, Diagnostic> {
        let grammar = self.grammar;
        let rule = &grammar[handle];
        match &self.states[handle] {
            ResolveState::Resolved(set) => return Ok(set.clone()),
            ResolveState::Resolving => {
                return Err(Diagnostic::in_rule(
                    rule.line,
                    "left-recursive cycle found",
                    &rule.name,
                ));
            }
            ResolveState::Unresolved => {}
        }

        self.states[handle] = ResolveState::Resolving;
        let set = self.alts_first(rule, &rule.alts)?;
        self.states[handle] = ResolveState::Resolved(set.clone());
        Ok(set)
    }

    /// The FIRST-set of `a | b | ...` is the union of the alternatives' sets;
    /// nullable iff at least one alternative is.
    fn alts_first(&mut self, rule: &'a Rule, alts: &'a [Sequence]) -> Result<FirstSet, Diagnostic> {
        let mut first = FirstSet::default();
        for seq in alts {
            let set = self.seq_first(rule, seq)?;
            first.has_epsilon |= set.has_epsilon;
            merge(rule, &mut first, &set)?;
        }
        Ok(first)
    }

    /// Scans terms left to right, accumulating contributed terminals. The
    /// scan closes at the first required term whose match is non-nullable;
    /// if every term is optional or nullable, the whole sequence is nullable.
    fn seq_first(&mut self, rule: &'a Rule, seq: &'a [Term]) -> Result<FirstSet, Diagnostic> {
        let mut first = FirstSet {
            has_epsilon: true,
            ..FirstSet::default()
        };

        for term in seq {
            if let Some(terminal) = term.terminal_name() {
                insert(rule, &mut first, terminal, &rule.name)?;
                if term.min > 0 {
                    first.has_epsilon = false;
                    break;
                }
                continue;
            }

            let (set, what) = match &term.kind {
                TermKind::Ref { to, .. } => {
                    let Some(target) = self.grammar.lookup(to) else {
                        return Err(Diagnostic::in_rule(
                            rule.line,
                            format!("non-terminal '{to}' not found"),
                            &rule.name,
                        ));
                    };
                    (self.rule_first(target)?, "non-terminal")
                }
                TermKind::Group { alts, .. } => (self.alts_first(rule, alts)?, "group"),
                // terminal_name covered literals and @-class references
                TermKind::Literal(_) => continue,
            };

            merge(rule, &mut first, &set)?;
            if term.max > 1 && set.has_epsilon {
                return Err(Diagnostic::in_rule(
                    rule.line,
                    format!("repeating {what} can match the empty sequence"),
                    &rule.name,
                ));
            }
            if term.min > 0 && !set.has_epsilon {
                first.has_epsilon = false;
                break;
            }
        }

        Ok(first)
    }
}

/// Folds `src` into `dst`, keeping each entry's original provenance.
fn merge(rule: &Rule, dst: &mut FirstSet, src: &FirstSet) -> Result<(), Diagnostic> {
    for (terminal, origin) in &src.terms {
        insert(rule, dst, terminal, origin)?;
    }
    Ok(())
}

/// A repeated terminal identity means two branches would need more than one
/// token of lookahead to tell apart, which this front-end rejects.
fn insert(rule: &Rule, dst: &mut FirstSet, terminal: &str, origin: &str) -> Result<(), Diagnostic> {
    if let Some(previous) = dst.terms.get(terminal) {
        return Err(Diagnostic::in_rule(
            rule.line,
            format!(
                "ambiguous grammar: the same token '{terminal}' appears on multiple branches: \
                 in rule '{previous}' and in rule '{origin}'"
            ),
            &rule.name,
        ));
    }
    dst.terms.insert(terminal.to_owned(), origin.to_owned());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use pretty_assertions::assert_eq;

    fn first_of(src: &str, rule: &str) -> FirstSet {
        let compiled = compile(src).unwrap();
        let grammar = &compiled.grammar;
        let handle = grammar.lookup(rule).unwrap();
        compiled.first(handle).clone()
    }

    fn terminals(set: &FirstSet) -> Vec<&str> {
        set.terminals().collect()
    }

    #[test]
    fn disjoint_alternatives_accepted() {
        let set = first_of(
            "a ::= \"x\" b | \"y\" c\nb ::= \"b\"\nc ::= \"c\"\n",
            "a",
        );
        assert_eq!(terminals(&set), vec!["x", "y"]);
        assert!(!set.has_epsilon);
    }

    #[test]
    fn ambiguous_alternatives_rejected() {
        let err = compile("a ::= \"x\" \"a\" | \"x\" \"b\"\n").unwrap_err();
        assert_eq!(
            err.message,
            "ambiguous grammar: the same token 'x' appears on multiple branches: \
             in rule 'a' and in rule 'a'"
        );
        assert_eq!(err.rule.as_deref(), Some("a"));
    }

    #[test]
    fn ambiguity_names_both_contributing_rules() {
        let err = compile("a ::= b | c\nb ::= \"x\"\nc ::= \"x\"\n").unwrap_err();
        assert_eq!(
            err.message,
            "ambiguous grammar: the same token 'x' appears on multiple branches: \
             in rule 'b' and in rule 'c'"
        );
        assert_eq!(err.rule.as_deref(), Some("a"));
    }

    #[test]
    fn left_recursion_rejected() {
        let err = compile("a ::= a \"x\" | \"y\"\n").unwrap_err();
        assert_eq!(err.message, "left-recursive cycle found");
        assert_eq!(err.rule.as_deref(), Some("a"));
    }

    #[test]
    fn indirect_left_recursion_rejected() {
        let err = compile("a ::= b \"x\"\nb ::= c\nc ::= a\n").unwrap_err();
        assert_eq!(err.message, "left-recursive cycle found");
    }

    #[test]
    fn recursion_behind_a_required_terminal_is_fine() {
        let set = first_of("expr ::= \"(\" expr \")\" | \"n\"\n", "expr");
        assert_eq!(terminals(&set), vec!["(", "n"]);
    }

    #[test]
    fn all_optional_sequence_is_nullable() {
        let set = first_of("a ::= \"x\"? \"y\"*\n", "a");
        assert_eq!(terminals(&set), vec!["x", "y"]);
        assert!(set.has_epsilon);
    }

    #[test]
    fn required_terminal_closes_the_scan() {
        let set = first_of("a ::= \"x\"? \"z\" \"y\"?\n", "a");
        assert_eq!(terminals(&set), vec!["x", "z"]);
        assert!(!set.has_epsilon);
    }

    #[test]
    fn nullable_reference_keeps_the_scan_open() {
        let set = first_of("a ::= opt \"z\"\nopt ::= \"o\"?\n", "a");
        assert_eq!(terminals(&set), vec!["o", "z"]);
        assert!(!set.has_epsilon);
    }

    #[test]
    fn repeating_nullable_reference_rejected() {
        let err = compile("a ::= opt+\nopt ::= \"o\"?\n").unwrap_err();
        assert_eq!(err.message, "repeating non-terminal can match the empty sequence");
        assert_eq!(err.rule.as_deref(), Some("a"));
    }

    #[test]
    fn repeating_nullable_group_rejected() {
        let err = compile("a ::= (\"x\"?)+\n").unwrap_err();
        assert_eq!(err.message, "repeating group can match the empty sequence");
    }

    #[test]
    fn repeating_terminal_is_fine() {
        let set = first_of("a ::= \"x\"+\n", "a");
        assert_eq!(terminals(&set), vec!["x"]);
        assert!(!set.has_epsilon);
    }

    #[test]
    fn undefined_reference_rejected() {
        let err = compile("a ::= missing\n").unwrap_err();
        assert_eq!(err.message, "non-terminal 'missing' not found");
        assert_eq!(err.rule.as_deref(), Some("a"));
    }

    #[test]
    fn reference_is_case_sensitive() {
        let err = compile("name ::= Word\nword ::= \"w\"\n").unwrap_err();
        assert_eq!(err.message, "non-terminal 'Word' not found");
    }

    #[test]
    fn terminal_class_reference_is_atomic() {
        let set = first_of("name ::= @word\n", "name");
        assert_eq!(terminals(&set), vec!["@word"]);
        assert!(!set.has_epsilon);
    }

    #[test]
    fn memoized_set_is_stable_across_queries() {
        // The start rule is resolved when seeded and again in the file-order
        // sweep; `b` and `c` both query `a`'s memo. No duplicate-terminal
        // error may fire on the later queries, and the sets must agree.
        let src = "@ ::= a\na ::= \"x\"\nb ::= a \"y\"\nc ::= a \"z\"\n";
        let compiled = compile(src).unwrap();
        let a = compiled.first(compiled.grammar.lookup("a").unwrap());
        let b = compiled.first(compiled.grammar.lookup("b").unwrap());
        let c = compiled.first(compiled.grammar.lookup("c").unwrap());
        assert_eq!(terminals(a), vec!["x"]);
        assert_eq!(terminals(b), vec!["x"]);
        assert_eq!(terminals(c), vec!["x"]);

        let again = compile(src).unwrap();
        assert_eq!(
            compiled.first(compiled.grammar.lookup("a").unwrap()),
            again.first(again.grammar.lookup("a").unwrap()),
        );
    }

    #[test]
    fn dead_rules_are_still_validated() {
        let err = compile("@ ::= \"x\"\ndead ::= dead \"y\"\n").unwrap_err();
        assert_eq!(err.message, "left-recursive cycle found");
        assert_eq!(err.rule.as_deref(), Some("dead"));
    }

    #[test]
    fn group_merges_into_enclosing_sequence() {
        let set = first_of("a ::= ( \"x\" | \"y\" ) \"z\"\n", "a");
        assert_eq!(terminals(&set), vec!["x", "y"]);
    }

    #[test]
    fn optional_group_keeps_the_scan_open() {
        let set = first_of("a ::= [ \"x\" | \"y\" ] \"z\"\n", "a");
        assert_eq!(terminals(&set), vec!["x", "y", "z"]);
        assert!(!set.has_epsilon);
    }

    #[test]
    fn duplicate_within_one_sequence_rejected() {
        let err = compile("a ::= \"x\"? \"x\"\n").unwrap_err();
        assert!(err.message.starts_with("ambiguous grammar"));
    }

    #[test]
    fn end_to_end_example() {
        let src = "@ ::= greet\ngreet ::= \"hello\" name\nname ::= @word\n";
        let compiled = compile(src).unwrap();
        let report: Vec<(String, Vec<String>)> = compiled
            .iter_first()
            .map(|(name, set)| {
                (
                    name.to_owned(),
                    set.terminals().map(str::to_owned).collect(),
                )
            })
            .collect();
        assert_eq!(
            report,
            vec![
                ("@".to_owned(), vec!["hello".to_owned()]),
                ("greet".to_owned(), vec!["hello".to_owned()]),
                ("name".to_owned(), vec!["@word".to_owned()]),
            ]
        );
    }
}
