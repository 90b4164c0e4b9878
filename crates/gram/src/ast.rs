//! AST produced by the grammar parser.
//!
//! Nodes are immutable after parsing. A [`TermKind::Ref`] holds a rule *name*,
//! not a pointer; names are resolved against the rule table at analysis time,
//! which is what lets rules reference each other cyclically without creating
//! an ownership cycle.

/// Repetition bound meaning "no upper limit" (`+` and `*` arities).
pub const UNBOUNDED: u32 = u32::MAX;

/// A whole parsed source file: the leading `+option` declarations and the
/// rules in file order. Rule order matters only for picking a default start
/// rule and for report output.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GrammarFile {
    pub options: Vec<String>,
    pub rules: Vec<Rule>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub alts: Alternation,
    /// Declared with `::-`: uses of the rule should be flattened into the
    /// caller by a downstream generator. No effect on FIRST-set analysis.
    pub inline: bool,
    pub line: u32,
}

/// `seq1 | seq2 | ...` — always at least one sequence.
pub type Alternation = Vec<Sequence>;

/// An ordered run of terms — always at least one term.
pub type Sequence = Vec<Term>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Term {
    pub kind: TermKind,
    /// Capture name: the `:name` rename, or the referenced rule's own name.
    pub name: Option<String>,
    pub min: u32,
    pub max: u32,
    pub line: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TermKind {
    /// Reference to a named rule, or to an external terminal class when the
    /// name starts with `@`. `inline` records a leading `%` marker.
    Ref { to: String, inline: bool },
    /// A fixed terminal string (decoded from a quoted literal).
    Literal(String),
    /// A parenthesized sub-grammar; `[...]` is sugar for `min = 0`. The
    /// delimiter is a separator literal recorded for repeated matches, with
    /// no effect on FIRST-set analysis.
    Group {
        alts: Alternation,
        delimiter: Option<String>,
    },
}

impl Term {
    /// Terminal identity of this term, if it is one: a literal's text or the
    /// name of an `@`-prefixed terminal-class reference.
    pub fn terminal_name(&self) -> Option<&str> {
        match &self.kind {
            TermKind::Literal(text) => Some(text),
            TermKind::Ref { to, .. } if to.starts_with('@') => Some(to),
            _ => None,
        }
    }
}
