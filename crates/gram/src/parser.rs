use crate::ast::{Alternation, GrammarFile, Rule, Sequence, Term, TermKind, UNBOUNDED};
use crate::error::Diagnostic;
use crate::lexer::{Lexer, TokenKind};

use TokenKind::*;

/// Parses grammar source into a [`GrammarFile`].
///
/// Fail-fast: the first syntax (or lexical) error aborts the whole parse.
pub fn parse(src: &str) -> Result<GrammarFile, Diagnostic> {
    let mut parser = Parser::new(src)?;
    parser.file()
}

/// Recursive-descent parser over the token stream. One method per production;
/// `expect` consumes or fails naming the expected construct, `eat` is the
/// non-failing variant used for `*`/`?`/alternation lookahead.
struct Parser<'a> {
    lexer: Lexer<'a>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Result<Parser<'a>, Diagnostic> {
        let mut lexer = Lexer::new(src);
        lexer.advance()?;
        Ok(Parser { lexer })
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.lexer.token == kind
    }

    fn eat(&mut self, kind: TokenKind) -> Result<bool, Diagnostic> {
        if self.at(kind) {
            self.lexer.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), Diagnostic> {
        if self.at(kind) {
            self.lexer.advance()?;
            Ok(())
        } else {
            Err(self.error(format!("expecting {what}")))
        }
    }

    /// `expect` for tokens with a payload: yields the decoded value.
    fn expect_value(&mut self, kind: TokenKind, what: &str) -> Result<String, Diagnostic> {
        if self.at(kind) {
            let value = std::mem::take(&mut self.lexer.value);
            self.lexer.advance()?;
            Ok(value)
        } else {
            Err(self.error(format!("expecting {what}")))
        }
    }

    fn word(&mut self, what: &str) -> Result<String, Diagnostic> {
        self.expect_value(Word, what)
    }

    fn error(&self, message: impl ToString) -> Diagnostic {
        self.lexer.diagnostic(message)
    }

    fn skip_eol(&mut self) -> Result<(), Diagnostic> {
        while self.eat(Eol)? {}
        Ok(())
    }

    // file ::= EOL* ( '+' word:option EOL* )* rule+
    fn file(&mut self) -> Result<GrammarFile, Diagnostic> {
        self.skip_eol()?;
        let mut options = Vec::new();
        while self.eat(Plus)? {
            options.push(self.word("an option name")?);
            self.skip_eol()?;
        }

        let mut rules = vec![self.rule()?];
        loop {
            self.skip_eol()?;
            if self.at(Eof) {
                break;
            }
            rules.push(self.rule()?);
        }
        Ok(GrammarFile { options, rules })
    }

    // rule ::= EOL* word:name ( '::=' | '::-' ) alts ( EOF | EOL )
    fn rule(&mut self) -> Result<Rule, Diagnostic> {
        self.skip_eol()?;
        let line = self.lexer.line;
        let name = self.word("a name at the beginning of a rule")?;
        let inline = self.eat(DefineInline)?;
        if !inline {
            self.expect(Define, "::= or ::- after rule name")?;
        }
        let alts = self.alts()?;
        if !self.at(Eof) {
            self.expect(Eol, &format!("end of line to end rule '{name}'"))?;
        }
        Ok(Rule {
            name,
            alts,
            inline,
            line,
        })
    }

    // alts ::= sequence ( '|' sequence )*
    fn alts(&mut self) -> Result<Alternation, Diagnostic> {
        let mut alts = vec![self.sequence()?];
        while self.eat(Pipe)? {
            alts.push(self.sequence()?);
        }
        Ok(alts)
    }

    // sequence ::= term+
    fn sequence(&mut self) -> Result<Sequence, Diagnostic> {
        let mut seq = Vec::new();
        loop {
            match self.atom(seq.is_empty())? {
                Some(atom) => seq.push(self.suffixes(atom)?),
                None => break,
            }
        }
        Ok(seq)
    }

    // atom ::= [ '%' ] word:name           -> ref
    //        | text                        -> literal
    //        | '(' alts [ '...' text ] ')' -> group (min=1)
    //        | '[' alts [ '...' text ] ']' -> group (min=0)
    fn atom(&mut self, required: bool) -> Result<Option<Term>, Diagnostic> {
        let line = self.lexer.line;
        if self.at(Word) || self.at(Percent) {
            let inline = self.eat(Percent)?;
            let to = self.word("a term-name (rule reference)")?;
            return Ok(Some(Term {
                name: Some(to.clone()),
                kind: TermKind::Ref { to, inline },
                min: 1,
                max: 1,
                line,
            }));
        }
        if self.at(Text) {
            let text = self.expect_value(Text, "a literal")?;
            return Ok(Some(Term {
                kind: TermKind::Literal(text),
                name: None,
                min: 1,
                max: 1,
                line,
            }));
        }
        if self.eat(LParen)? {
            return self.group(RParen, 1, line).map(Some);
        }
        if self.eat(LBracket)? {
            return self.group(RBracket, 0, line).map(Some);
        }
        if required {
            return Err(self.error("expecting a term (rule-name, literal token or group expression)"));
        }
        Ok(None)
    }

    fn group(&mut self, end: TokenKind, min: u32, line: u32) -> Result<Term, Diagnostic> {
        let alts = self.alts()?;
        let delimiter = if self.eat(Ellipsis)? {
            Some(self.expect_value(Text, "a delimiter (text literal)")?)
        } else {
            None
        };
        let what = match end {
            RParen => "')' to end group",
            _ => "']' to end group",
        };
        self.expect(end, what)?;
        Ok(Term {
            kind: TermKind::Group { alts, delimiter },
            name: None,
            min,
            max: 1,
            line,
        })
    }

    // term ::= atom [ ':' word:name ] [ '?' | '+' | '*' ]:arity
    //
    // An arity suffix overwrites min/max entirely, so `[x]+` is {1,inf}.
    fn suffixes(&mut self, mut term: Term) -> Result<Term, Diagnostic> {
        if self.eat(Colon)? {
            term.name = Some(self.word("a name (term renaming)")?);
        }
        if self.eat(Question)? {
            term.min = 0;
            term.max = 1;
        } else if self.eat(Plus)? {
            term.min = 1;
            term.max = UNBOUNDED;
        } else if self.eat(Star)? {
            term.min = 0;
            term.max = UNBOUNDED;
        }
        Ok(term)
    }
}
