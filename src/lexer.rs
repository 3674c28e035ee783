// ABOUTME: Lexer turning Kuzur source text into a position-bearing token stream

use nom::{
    branch::alt,
    bytes::complete::{escaped, tag, take_while, take_while1},
    character::complete::{anychar, char, digit1, none_of, one_of},
    combinator::{opt, recognize},
    IResult, Parser,
};

use crate::error::KuzurError;
use crate::token::{Token, TokenKind};

/// Tokenized source with a cursor, exposing the lookahead operations the
/// parser drives it with.
pub struct Lexer {
    tokens: Vec<Token>,
    pos: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Result<Self, KuzurError> {
        let tokens = tokenize(source)?;
        Ok(Lexer { tokens, pos: 0 })
    }

    /// Current token without consuming it. The trailing EOF token makes this
    /// total.
    pub fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    /// Token `offset` positions ahead, clamped to EOF.
    pub fn peek_ahead(&self, offset: usize) -> &Token {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    /// Consume and return the current token. Once EOF is reached, further
    /// calls keep returning it.
    pub fn next(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// Consume the current token if its kind is one of `kinds`.
    pub fn eat(&mut self, kinds: &[TokenKind]) -> Option<Token> {
        if kinds.contains(&self.peek().kind) {
            Some(self.next())
        } else {
            None
        }
    }

    /// Consume the current token, failing unless it has the given kind.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token, KuzurError> {
        let tok = self.next();
        if tok.kind != kind {
            return Err(KuzurError::syntax(
                format!("expected {}, found {}", kind, tok.describe()),
                tok.pos,
            ));
        }
        Ok(tok)
    }
}

/// Scan the whole input. Whitespace, newlines, and comments are discarded;
/// everything else becomes a token carrying its byte offset. Comments are
/// tried before operators so `//` is never split into two `/` tokens.
fn tokenize(source: &str) -> Result<Vec<Token>, KuzurError> {
    let mut tokens = Vec::new();
    let mut rest = source;

    while !rest.is_empty() {
        let pos = source.len() - rest.len();

        if let Ok((next, _)) = scan_skip(rest) {
            rest = next;
            continue;
        }
        if let Ok((next, _)) = scan_comment(rest) {
            rest = next;
            continue;
        }
        if let Ok((next, lexeme)) = scan_number(rest) {
            tokens.push(Token {
                kind: TokenKind::Number,
                value: lexeme.to_string(),
                pos,
            });
            rest = next;
            continue;
        }
        if let Ok((next, raw)) = scan_string(rest) {
            tokens.push(Token {
                kind: TokenKind::Str,
                value: decode_escapes(raw, pos)?,
                pos,
            });
            rest = next;
            continue;
        }
        if let Ok((next, lexeme)) = scan_ident(rest) {
            let kind = TokenKind::keyword(lexeme).unwrap_or(TokenKind::Ident);
            tokens.push(Token {
                kind,
                value: lexeme.to_string(),
                pos,
            });
            rest = next;
            continue;
        }
        if let Ok((next, lexeme)) = scan_op(rest) {
            tokens.push(Token {
                kind: TokenKind::Op,
                value: lexeme.to_string(),
                pos,
            });
            rest = next;
            continue;
        }

        match rest.chars().next() {
            Some(ch) => return Err(KuzurError::Lex { ch, pos }),
            None => break,
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        value: String::new(),
        pos: source.len(),
    });
    Ok(tokens)
}

/// Whitespace, including newlines. The grammar is not newline-sensitive.
fn scan_skip(input: &str) -> IResult<&str, &str> {
    take_while1(|c| c == ' ' || c == '\t' || c == '\r' || c == '\n')(input)
}

/// A `//` comment running to end of line.
fn scan_comment(input: &str) -> IResult<&str, &str> {
    recognize((tag("//"), take_while(|c| c != '\n'))).parse(input)
}

/// One or more digits, optionally followed by `.` and more digits.
fn scan_number(input: &str) -> IResult<&str, &str> {
    recognize((digit1, opt((char('.'), digit1)))).parse(input)
}

/// Letter or underscore, then letters, digits, or underscores.
fn scan_ident(input: &str) -> IResult<&str, &str> {
    recognize((
        one_of("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_"),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

/// Two-character operators first so `==` never lexes as two `=` tokens.
fn scan_op(input: &str) -> IResult<&str, &str> {
    alt((
        tag("=="),
        tag("!="),
        tag("<="),
        tag(">="),
        tag("&&"),
        tag("||"),
        recognize(one_of("+-*/%<>=!();,{}")),
    ))
    .parse(input)
}

/// A quoted string in either quote style. Returns the raw contents between
/// the quotes, escapes still encoded.
fn scan_string(input: &str) -> IResult<&str, &str> {
    alt((scan_double_quoted, scan_single_quoted)).parse(input)
}

fn scan_double_quoted(input: &str) -> IResult<&str, &str> {
    let (input, _) = char('"')(input)?;

    // Handle empty strings
    if let Ok((input, _)) = char::<_, nom::error::Error<_>>('"')(input) {
        return Ok((input, ""));
    }

    let (input, content) = escaped(none_of("\"\\"), '\\', anychar)(input)?;
    let (input, _) = char('"')(input)?;
    Ok((input, content))
}

fn scan_single_quoted(input: &str) -> IResult<&str, &str> {
    let (input, _) = char('\'')(input)?;

    if let Ok((input, _)) = char::<_, nom::error::Error<_>>('\'')(input) {
        return Ok((input, ""));
    }

    let (input, content) = escaped(none_of("'\\"), '\\', anychar)(input)?;
    let (input, _) = char('\'')(input)?;
    Ok((input, content))
}

/// Decode backslash escapes in raw string contents.
/// Handles: \n, \t, \r, \\, \", \', \0, \xNN, \u{...}
fn decode_escapes(raw: &str, pos: usize) -> Result<String, KuzurError> {
    let mut result = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            Some('0') => result.push('\0'),
            Some('x') => {
                let hex: String = chars.by_ref().take(2).collect();
                let code = u8::from_str_radix(&hex, 16)
                    .map_err(|_| bad_escape(&format!("\\x{}", hex), pos))?;
                result.push(code as char);
            }
            Some('u') => {
                if chars.next() != Some('{') {
                    return Err(bad_escape("\\u", pos));
                }
                let hex: String = chars.by_ref().take_while(|c| *c != '}').collect();
                let code = u32::from_str_radix(&hex, 16)
                    .map_err(|_| bad_escape(&format!("\\u{{{}}}", hex), pos))?;
                let decoded =
                    char::from_u32(code).ok_or_else(|| bad_escape(&format!("\\u{{{}}}", hex), pos))?;
                result.push(decoded);
            }
            // Unknown escapes keep the escaped character
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }

    Ok(result)
}

fn bad_escape(escape: &str, pos: usize) -> KuzurError {
    KuzurError::syntax(format!("invalid escape sequence '{}'", escape), pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source)
            .expect("lexes cleanly")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn values(source: &str) -> Vec<String> {
        tokenize(source)
            .expect("lexes cleanly")
            .into_iter()
            .map(|t| t.value)
            .collect()
    }

    #[test]
    fn test_numbers() {
        assert_eq!(values("42 3.25"), vec!["42", "3.25", ""]);
        assert_eq!(
            kinds("42 3.25"),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn test_keywords_reclassified() {
        assert_eq!(
            kinds("while func whiles"),
            vec![
                TokenKind::While,
                TokenKind::Func,
                TokenKind::Ident,
                TokenKind::Eof
            ]
        );
    }

    #[test]
    fn test_two_char_operators_win() {
        assert_eq!(values("a<=b"), vec!["a", "<=", "b", ""]);
        assert_eq!(values("a==b"), vec!["a", "==", "b", ""]);
        assert_eq!(values("a = b"), vec!["a", "=", "b", ""]);
        assert_eq!(values("x&&y||z"), vec!["x", "&&", "y", "||", "z", ""]);
    }

    #[test]
    fn test_comments_and_whitespace_discarded() {
        let toks = tokenize("x = 1 // trailing comment\ny = 2").unwrap();
        let values: Vec<&str> = toks.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["x", "=", "1", "y", "2", ""]);
    }

    #[test]
    fn test_comment_not_split_into_divisions() {
        assert_eq!(kinds("// just a comment"), vec![TokenKind::Eof]);
        // A lone slash is still an operator
        assert_eq!(values("a / b"), vec!["a", "/", "b", ""]);
    }

    #[test]
    fn test_string_double_quoted_with_escapes() {
        let toks = tokenize(r#""line\none""#).unwrap();
        assert_eq!(toks[0].kind, TokenKind::Str);
        assert_eq!(toks[0].value, "line\none");
    }

    #[test]
    fn test_string_single_quoted() {
        let toks = tokenize(r#"'it\'s'"#).unwrap();
        assert_eq!(toks[0].kind, TokenKind::Str);
        assert_eq!(toks[0].value, "it's");
    }

    #[test]
    fn test_string_empty_and_quote_escape() {
        assert_eq!(tokenize(r#""""#).unwrap()[0].value, "");
        assert_eq!(tokenize(r#""a\"b""#).unwrap()[0].value, "a\"b");
    }

    #[test]
    fn test_string_hex_and_unicode_escapes() {
        assert_eq!(tokenize(r#""\x41""#).unwrap()[0].value, "A");
        assert_eq!(tokenize(r#""\u{1F600}""#).unwrap()[0].value, "\u{1F600}");
    }

    #[test]
    fn test_positions_are_byte_offsets() {
        let toks = tokenize("ab  = 12").unwrap();
        assert_eq!(toks[0].pos, 0); // ab
        assert_eq!(toks[1].pos, 4); // =
        assert_eq!(toks[2].pos, 6); // 12
        assert_eq!(toks[3].pos, 8); // EOF at source length
        assert_eq!(toks[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_unrecognized_character_fails() {
        match tokenize("x = @") {
            Err(KuzurError::Lex { ch, pos }) => {
                assert_eq!(ch, '@');
                assert_eq!(pos, 4);
            }
            other => panic!("expected lex error, got {:?}", other),
        }
    }

    #[test]
    fn test_cursor_operations() {
        let mut lexer = Lexer::new("x = 1").unwrap();
        assert_eq!(lexer.peek().value, "x");
        assert_eq!(lexer.peek_ahead(1).value, "=");

        let tok = lexer.next();
        assert_eq!(tok.value, "x");
        assert!(lexer.eat(&[TokenKind::Number]).is_none());
        assert!(lexer.eat(&[TokenKind::Op]).is_some());
        assert!(lexer.expect(TokenKind::Number).is_ok());

        // Cursor parks on EOF and stays there
        assert_eq!(lexer.peek().kind, TokenKind::Eof);
        assert_eq!(lexer.next().kind, TokenKind::Eof);
        assert_eq!(lexer.next().kind, TokenKind::Eof);
    }

    #[test]
    fn test_expect_failure_reports_position() {
        let mut lexer = Lexer::new("while").unwrap();
        match lexer.expect(TokenKind::Ident) {
            Err(KuzurError::Syntax { message, pos }) => {
                assert!(message.contains("IDENT"), "message: {}", message);
                assert_eq!(pos, 0);
            }
            other => panic!("expected syntax error, got {:?}", other),
        }
    }
}
