use std::fmt::{self, Display};

/// A fatal compilation diagnostic.
///
/// Every error produced by the front-end has this one shape; errors differ
/// only in which contextual fields are attached. Rendered as
/// `<line>: <message>[ after '<prev>'][, found '<cur>'][ in rule '<name>']`;
/// the caller that knows the source file name prepends it via [`report`].
///
/// [`report`]: Diagnostic::report
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: Option<u32>,
    pub message: String,
    /// Raw text of the token consumed before the failure.
    pub after: Option<String>,
    /// Raw text of the token that was actually found.
    pub found: Option<String>,
    /// Name of the rule being analyzed when the failure was detected.
    pub rule: Option<String>,
}

impl Diagnostic {
    /// A file-level diagnostic with no line attribution.
    pub fn message(message: impl ToString) -> Diagnostic {
        Diagnostic {
            line: None,
            message: message.to_string(),
            after: None,
            found: None,
            rule: None,
        }
    }

    pub fn at(line: u32, message: impl ToString) -> Diagnostic {
        Diagnostic {
            line: Some(line),
            ..Diagnostic::message(message)
        }
    }

    /// A diagnostic attributed to a rule, as emitted by the rule table and
    /// the FIRST-set resolver.
    pub fn in_rule(line: u32, message: impl ToString, rule: &str) -> Diagnostic {
        Diagnostic {
            rule: Some(rule.to_owned()),
            ..Diagnostic::at(line, message)
        }
    }

    /// Formats the diagnostic prefixed with the source file name, matching
    /// the `<source-name>:<line>: <message> ...` report shape.
    pub fn report(&self, source: &str) -> String {
        match self.line {
            Some(_) => format!("{source}:{self}"),
            None => format!("{source}: {self}"),
        }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(line) = self.line {
            write!(f, "{line}: ")?;
        }
        f.write_str(&self.message)?;
        if let Some(after) = &self.after {
            write!(f, " after '{after}'")?;
        }
        if let Some(found) = &self.found {
            write!(f, ", found '{found}'")?;
        }
        if let Some(rule) = &self.rule {
            write!(f, " in rule '{rule}'")?;
        }
        Ok(())
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn display_with_full_context() {
        let diag = Diagnostic {
            line: Some(3),
            message: "expecting end of line to end rule 'a'".to_owned(),
            after: Some("b".to_owned()),
            found: Some("::=".to_owned()),
            rule: None,
        };
        assert_eq!(
            diag.to_string(),
            "3: expecting end of line to end rule 'a' after 'b', found '::='"
        );
        assert_eq!(
            diag.report("lang.gram"),
            "lang.gram:3: expecting end of line to end rule 'a' after 'b', found '::='"
        );
    }

    #[test]
    fn display_without_line() {
        let diag = Diagnostic::message("no starting rule was found");
        assert_eq!(diag.report("lang.gram"), "lang.gram: no starting rule was found");
    }

    #[test]
    fn display_with_rule_context() {
        let diag = Diagnostic::in_rule(7, "duplicate rule name", "expr");
        assert_eq!(diag.to_string(), "7: duplicate rule name in rule 'expr'");
    }
}
