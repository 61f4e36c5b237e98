//! Hand-written tokenizer for JSON-RNC source.
//!
//! The lexer never fails: anything it cannot classify comes out as a
//! [`TokenKind::Undef`] token and the parser decides whether that is an error.
//! Whitespace, comments and newlines are consumed here and never reach the
//! parser; exactly one [`TokenKind::Eof`] token closes the stream.
use std::fmt;

// ------------------------------- Tokens ---------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// `"..."` or `'...'`
    Str,
    /// `/.../`
    Regex,
    Number,
    Ident,

    // reserved words
    KwInteger,
    KwNumber,
    KwString,
    KwNull,
    KwBoolean,
    KwStart,

    Question,
    OpenBrace,
    CloseBrace,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,
    VertBar,
    Equal,
    Star,
    At,
    Comma,
    Colon,

    /// A character no other rule accepts.
    Undef,
    Eof,
}

impl TokenKind {
    pub fn is_primitive_keyword(self) -> bool {
        matches!(
            self,
            Self::KwInteger | Self::KwNumber | Self::KwString | Self::KwNull | Self::KwBoolean
        )
    }

    fn reserved(word: &str) -> Option<Self> {
        match word {
            "integer" => Some(Self::KwInteger),
            "number" => Some(Self::KwNumber),
            "string" => Some(Self::KwString),
            "null" => Some(Self::KwNull),
            "boolean" => Some(Self::KwBoolean),
            "start" => Some(Self::KwStart),
            _ => None,
        }
    }

    fn punctuation(c: char) -> Option<Self> {
        Some(match c {
            '?' => Self::Question,
            '{' => Self::OpenBrace,
            '}' => Self::CloseBrace,
            '[' => Self::OpenBracket,
            ']' => Self::CloseBracket,
            '(' => Self::OpenParen,
            ')' => Self::CloseParen,
            '|' => Self::VertBar,
            '=' => Self::Equal,
            '*' => Self::Star,
            '@' => Self::At,
            ',' => Self::Comma,
            ':' => Self::Colon,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    /// 1-based.
    pub line: usize,
    /// 0-based character offset within the line.
    pub column: usize,
}

impl Token {
    /// The lexeme with its delimiters removed for quoted strings and regex
    /// literals; the raw lexeme otherwise. Escapes are left untouched.
    pub fn value(&self) -> &str {
        match self.kind {
            TokenKind::Str | TokenKind::Regex => &self.lexeme[1..self.lexeme.len() - 1],
            _ => &self.lexeme,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}:{}:{}:{})", self.kind, self.lexeme, self.line, self.column)
    }
}

// ------------------------------- Lexer ----------------------------------- //

const ACCENTED: &str = "èêéàâçîôùïëüÈÊÉÀÂÇÎÔÙÏËÜ";

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || ACCENTED.contains(c)
}

fn is_ident_start(c: char) -> bool {
    is_letter(c) || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    is_letter(c) || c.is_ascii_digit() || c == '_' || c == '-'
}

/// Lazy token sequence over a fully buffered source.
pub struct Lexer<'src> {
    src: &'src str,
    pos: usize,
    line: usize,
    line_start: usize,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self { src, pos: 0, line: 1, line_start: 0, finished: false }
    }

    fn column_of(&self, byte_pos: usize) -> usize {
        self.src[self.line_start..byte_pos].chars().count()
    }

    /// Classify the text at the head of `rest` and return its kind and byte length.
    fn scan(rest: &str, head: char) -> (TokenKind, usize) {
        let fallback = (TokenKind::Undef, head.len_utf8());
        match head {
            '"' | '\'' => scan_quoted(rest, head).map_or(fallback, |n| (TokenKind::Str, n)),
            '/' => scan_regex(rest).map_or(fallback, |n| (TokenKind::Regex, n)),
            '-' | '0'..='9' => scan_number(rest).map_or(fallback, |n| (TokenKind::Number, n)),
            c if is_ident_start(c) => {
                let len = rest
                    .char_indices()
                    .find(|&(_, c)| !is_ident_continue(c))
                    .map_or(rest.len(), |(i, _)| i);
                (TokenKind::Ident, len)
            }
            c => TokenKind::punctuation(c).map_or(fallback, |kind| (kind, 1)),
        }
    }
}

/// Non-greedy up to the nearest unescaped matching quote. A backslash escapes
/// any character except a newline.
fn scan_quoted(rest: &str, quote: char) -> Option<usize> {
    let mut chars = rest.char_indices().skip(1);
    while let Some((i, c)) = chars.next() {
        match c {
            c if c == quote => return Some(i + 1),
            '\\' => match chars.next() {
                Some((_, '\n')) | None => return None,
                Some(_) => {}
            },
            _ => {}
        }
    }
    None
}

/// Up to the next `/` on the same line.
fn scan_regex(rest: &str) -> Option<usize> {
    for (i, c) in rest.char_indices().skip(1) {
        match c {
            '/' => return Some(i + 1),
            '\n' => return None,
            _ => {}
        }
    }
    None
}

/// `-?[0-9]+(\.[0-9]*)?`
fn scan_number(rest: &str) -> Option<usize> {
    let bytes = rest.as_bytes();
    let mut i = usize::from(bytes.first() == Some(&b'-'));
    let digits_start = i;
    while bytes.get(i).is_some_and(u8::is_ascii_digit) {
        i += 1;
    }
    if i == digits_start {
        return None;
    }
    if bytes.get(i) == Some(&b'.') {
        i += 1;
        while bytes.get(i).is_some_and(u8::is_ascii_digit) {
            i += 1;
        }
    }
    Some(i)
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        loop {
            let rest = &self.src[self.pos..];
            let Some(head) = rest.chars().next() else {
                if self.finished {
                    return None;
                }
                self.finished = true;
                return Some(Token {
                    kind: TokenKind::Eof,
                    lexeme: " ".to_string(),
                    line: self.line,
                    column: 0,
                });
            };
            match head {
                '\n' => {
                    self.pos += 1;
                    self.line += 1;
                    self.line_start = self.pos;
                    continue;
                }
                ' ' | '\t' | '\r' => {
                    self.pos += 1;
                    continue;
                }
                '#' => {
                    self.pos += rest.find('\n').unwrap_or(rest.len());
                    continue;
                }
                _ => {}
            }

            let (kind, len) = Self::scan(rest, head);
            let lexeme = &rest[..len];
            let kind = match kind {
                TokenKind::Ident => TokenKind::reserved(lexeme).unwrap_or(kind),
                other => other,
            };
            let token = Token {
                kind,
                lexeme: lexeme.to_string(),
                line: self.line,
                column: self.column_of(self.pos),
            };
            self.pos += len;
            return Some(token);
        }
    }
}

// ---------------------------- Token stream -------------------------------- //

/// Raised when the parser tries to move past the end-of-file token, or meets
/// it in the middle of an unfinished construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unexpected end of file")]
pub struct UnexpectedEof;

pub type Step<T> = Result<T, UnexpectedEof>;

/// Single-token lookahead over a [`Lexer`].
pub struct TokenStream<'src> {
    lexer: Lexer<'src>,
    current: Token,
}

impl<'src> TokenStream<'src> {
    pub fn new(src: &'src str) -> Self {
        let mut lexer = Lexer::new(src);
        // a fresh lexer always yields at least the EOF token
        let current = lexer.next().unwrap_or(Token {
            kind: TokenKind::Eof,
            lexeme: " ".to_string(),
            line: 1,
            column: 0,
        });
        Self { lexer, current }
    }

    pub fn current(&self) -> &Token {
        &self.current
    }

    pub fn kind(&self) -> TokenKind {
        self.current.kind
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    pub fn at_any(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.current.kind)
    }

    /// Move to the next token and hand back the one just consumed.
    pub fn advance(&mut self) -> Step<Token> {
        if self.at(TokenKind::Eof) {
            return Err(UnexpectedEof);
        }
        let next = self.lexer.next().ok_or(UnexpectedEof)?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    /// Consume the current token if it has the given kind.
    pub fn eat(&mut self, kind: TokenKind) -> Step<bool> {
        if self.at(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Skip tokens until one of `recovery` (or end of file) is current.
    pub fn skip_until(&mut self, recovery: &[TokenKind]) {
        while !self.at(TokenKind::Eof) && !self.at_any(recovery) {
            if self.advance().is_err() {
                break;
            }
        }
    }
}

// -------------------------------- Tests ---------------------------------- //

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use TokenKind::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).map(|t| t.kind).collect()
    }

    #[test]
    fn definition_tokens() {
        assert_eq!(
            kinds("start = { name: string, age?: integer @(minimum=0) }"),
            vec![
                KwStart, Equal, OpenBrace, Ident, Colon, KwString, Comma, Ident, Question, Colon,
                KwInteger, At, OpenParen, Ident, Equal, Number, CloseParen, CloseBrace, Eof
            ]
        );
    }

    #[test]
    fn positions_track_lines_and_columns() {
        let tokens: Vec<Token> = Lexer::new("a = b\n  # comment\n\tc").collect();
        let pos: Vec<(usize, usize)> = tokens.iter().map(|t| (t.line, t.column)).collect();
        assert_eq!(pos, vec![(1, 0), (1, 2), (1, 4), (3, 1), (3, 0)]);
        assert_eq!(tokens.last().map(|t| t.kind), Some(Eof));
    }

    #[test]
    fn quoted_strings_and_escapes() {
        let tokens: Vec<Token> = Lexer::new(r#""a\"b" 'it''s'"#).collect();
        assert_eq!(tokens[0].kind, Str);
        assert_eq!(tokens[0].value(), r#"a\"b"#);
        assert_eq!(tokens[1].value(), "it");
        assert_eq!(tokens[2].value(), "s");
    }

    #[test]
    fn unterminated_quote_is_undef() {
        assert_eq!(kinds("\"abc"), vec![Undef, Ident, Eof]);
        assert_eq!(kinds("/ab\nc/"), vec![Undef, Ident, Ident, Undef, Eof]);
    }

    #[test]
    fn regex_literal_keeps_inner_text() {
        let tokens: Vec<Token> = Lexer::new(r"/^\d+$/").collect();
        assert_eq!(tokens[0].kind, Regex);
        assert_eq!(tokens[0].value(), r"^\d+$");
    }

    #[test]
    fn numbers_before_identifiers() {
        let tokens: Vec<Token> = Lexer::new("-12.5 3. 42abc -x").collect();
        let lexemes: Vec<(&str, TokenKind)> =
            tokens.iter().map(|t| (t.lexeme.as_str(), t.kind)).collect();
        assert_eq!(
            lexemes,
            vec![
                ("-12.5", Number),
                ("3.", Number),
                ("42", Number),
                ("abc", Ident),
                ("-", Undef),
                ("x", Ident),
                (" ", Eof)
            ]
        );
    }

    #[test]
    fn accented_identifiers_and_keywords() {
        let tokens: Vec<Token> = Lexer::new("prénom_1 code-postal null starter").collect();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Ident, Ident, KwNull, Ident, Eof]);
        assert_eq!(tokens[1].column, 9);
    }

    #[test]
    fn stream_refuses_to_pass_eof() {
        let mut stream = TokenStream::new("x");
        assert_eq!(stream.advance().map(|t| t.kind), Ok(Ident));
        assert!(stream.at(Eof));
        assert_eq!(stream.advance(), Err(UnexpectedEof));
    }

    #[test]
    fn skip_until_stops_at_recovery_or_eof() {
        let mut stream = TokenStream::new("a b } c");
        stream.skip_until(&[CloseBrace]);
        assert!(stream.at(CloseBrace));
        stream.skip_until(&[Star]);
        assert!(stream.at(Eof));
    }
}
