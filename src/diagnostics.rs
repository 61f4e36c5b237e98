//! Diagnostic collection and rendering.
//!
//! Errors never stop a compilation by themselves: they are recorded against
//! the token the parser is looking at, and the parser resynchronizes on a
//! caller-chosen set of token kinds.
use std::fmt;
use colored::Colorize;
use crate::lexer::{Step, Token, TokenKind, TokenStream, UnexpectedEof};

/// Width of the `line %3d: ` prefix; the caret line is indented past it.
const GUTTER: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Unrecognized character, surfaced when the parser cannot use it.
    Lexical,
    /// Missing or unexpected token.
    Syntax,
    /// Well-formed but inconsistent: duplicates, dangling references, bad facets.
    Semantic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: Category,
    pub line: usize,
    pub column: usize,
    pub message: String,
    /// Text of the offending line, without its terminator.
    pub source_line: String,
}

impl Diagnostic {
    fn header(&self) -> String {
        format!("line {:3}: {}", self.line, self.source_line)
    }

    fn pointer(&self) -> String {
        format!("{}↑:{}", " ".repeat(self.column + GUTTER), self.message)
    }

    /// Same layout as [`Display`](fmt::Display) with the caret line highlighted.
    pub fn render_colored(&self) -> String {
        format!("{}\n{}", self.header(), self.pointer().red().bold())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\n{}", self.header(), self.pointer())
    }
}

/// Per-compilation error sink. Holds the source split into lines so any
/// already-seen line can be quoted.
pub struct Reporter<'src> {
    lines: Vec<&'src str>,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Reporter<'src> {
    pub fn new(source: &'src str) -> Self {
        Self { lines: source.split('\n').collect(), diagnostics: Vec::new() }
    }

    /// Record a diagnostic at `at` without touching the token stream.
    pub fn record(&mut self, at: &Token, category: Category, message: impl Into<String>) {
        let message = message.into();
        let source_line = at
            .line
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map(|l| l.trim_end_matches('\r').to_string())
            .unwrap_or_default();
        tracing::debug!(line = at.line, column = at.column, ?category, "{message}");
        self.diagnostics.push(Diagnostic {
            category,
            line: at.line,
            column: at.column,
            message,
            source_line,
        });
    }

    /// Record an error at the current token, then skip until a token in
    /// `recovery` is current. An empty `recovery` set skips nothing.
    ///
    /// Meeting end of file here means the construct being parsed can never be
    /// finished, so the pass is halted instead.
    pub fn error(
        &mut self,
        tokens: &mut TokenStream<'_>,
        category: Category,
        message: &str,
        recovery: &[TokenKind],
    ) -> Step<()> {
        let at = tokens.current().clone();
        match at.kind {
            TokenKind::Eof => return Err(UnexpectedEof),
            TokenKind::Undef => self.record(
                &at,
                Category::Lexical,
                format!("unrecognized character '{}', {message}", at.lexeme),
            ),
            _ => self.record(&at, category, message),
        }
        if !recovery.is_empty() {
            tokens.skip_until(recovery);
        }
        Ok(())
    }

    pub fn syntax_error(
        &mut self,
        tokens: &mut TokenStream<'_>,
        message: &str,
        recovery: &[TokenKind],
    ) -> Step<()> {
        self.error(tokens, Category::Syntax, message, recovery)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn caret_sits_under_the_column() {
        let source = "start = {\n  a: @\n}";
        let mut reporter = Reporter::new(source);
        let mut tokens = TokenStream::new(source);
        tokens.skip_until(&[TokenKind::At]);
        reporter.syntax_error(&mut tokens, "ident or json type expected", &[]).unwrap();

        let rendered = reporter.diagnostics()[0].to_string();
        assert_eq!(
            rendered,
            "line   2:   a: @\n               ↑:ident or json type expected"
        );
    }

    #[test]
    fn undef_tokens_are_lexical() {
        let source = "a = $";
        let mut reporter = Reporter::new(source);
        let mut tokens = TokenStream::new(source);
        tokens.skip_until(&[TokenKind::Undef]);
        reporter
            .syntax_error(&mut tokens, "ident or json type expected", &[TokenKind::Ident])
            .unwrap();
        let d = &reporter.diagnostics()[0];
        assert_eq!(d.category, Category::Lexical);
        assert_eq!(d.message, "unrecognized character '$', ident or json type expected");
        assert!(tokens.at(TokenKind::Eof));
    }

    #[test]
    fn syntax_error_at_eof_halts() {
        let source = "a =";
        let mut reporter = Reporter::new(source);
        let mut tokens = TokenStream::new(source);
        tokens.skip_until(&[]);
        assert_eq!(
            reporter.syntax_error(&mut tokens, "ident or json type expected", &[]),
            Err(UnexpectedEof)
        );
        assert_eq!(reporter.error_count(), 0);
    }
}
