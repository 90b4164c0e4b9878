//! Front-end for a grammar-definition language used to specify
//! recursive-descent parsers.
//!
//! A source file is compiled in strictly forward passes:
//! lexer → grammar parser → rule table → FIRST-set resolver. The analysis
//! decides, at every choice point of every rule, which terminal selects
//! which alternative with one token of lookahead, and rejects grammars where
//! that is impossible (left recursion, overlapping FIRST-sets, repeating
//! constructs that can match nothing). Compilation is fail-fast: the first
//! [`Diagnostic`] aborts the file.

pub mod ast;
pub mod error;
pub mod first;
pub mod grammar;
pub mod lexer;
pub mod parser;

use cranelift_entity::SecondaryMap;

pub use error::Diagnostic;
pub use first::FirstSet;
pub use grammar::{Grammar, RuleHandle};

/// A successfully analyzed grammar: the rule table plus every rule's
/// FIRST-set.
#[derive(Debug)]
pub struct Compiled {
    pub grammar: Grammar,
    first: SecondaryMap<RuleHandle, FirstSet>,
}

impl Compiled {
    pub fn first(&self, handle: RuleHandle) -> &FirstSet {
        &self.first[handle]
    }

    /// Per-rule FIRST-sets in file order, for the diagnostic report.
    pub fn iter_first(&self) -> impl Iterator<Item = (&str, &FirstSet)> {
        self.grammar
            .iter()
            .map(|(handle, rule)| (rule.name.as_str(), &self.first[handle]))
    }
}

/// Compiles one grammar source text end to end.
pub fn compile(src: &str) -> Result<Compiled, Diagnostic> {
    let file = parser::parse(src)?;
    let grammar = Grammar::new(file)?;
    let first = first::resolve(&grammar)?;
    Ok(Compiled { grammar, first })
}
