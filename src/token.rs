//! Lexer for the accepted source dialect.
//!
//! Produces a token stream with byte spans; a [`LineIndex`] maps spans back
//! to 1-based source lines for diagnostics and note attribution.

use logos::Logos;

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\u{000C}]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*[^/])*\*/")]
pub enum Token {
    // Keywords
    #[token("function")]
    Function,
    #[token("class")]
    Class,
    #[token("const")]
    Const,
    #[token("let")]
    Let,
    #[token("var")]
    Var,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("return")]
    Return,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("this")]
    This,

    // Constructs outside the dialect, kept as keywords so the parser can
    // reject them with a precise diagnostic.
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("do")]
    Do,
    #[token("import")]
    Import,
    #[token("export")]
    Export,
    #[token("throw")]
    Throw,
    #[token("try")]
    Try,

    // Punctuation
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token(";")]
    Semi,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("?")]
    Question,
    #[token("=>")]
    FatArrow,

    // Operators
    #[token("===")]
    EqEqEq,
    #[token("==")]
    EqEq,
    #[token("=")]
    Assign,
    #[token("!==")]
    NotEqEq,
    #[token("!=")]
    NotEq,
    #[token("!")]
    Bang,
    #[token("<=")]
    Le,
    #[token("<<")]
    Shl,
    #[token("<")]
    Lt,
    #[token(">=")]
    Ge,
    #[token(">>")]
    Shr,
    #[token(">")]
    Gt,
    #[token("&&")]
    AndAnd,
    #[token("&")]
    Amp,
    #[token("||")]
    OrOr,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice().to_owned())]
    Ident(String),

    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().to_owned())]
    Number(String),

    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| strip_quotes(lex.slice()))]
    #[regex(r#"'([^'\\\n]|\\.)*'"#, |lex| strip_quotes(lex.slice()))]
    Str(String),
}

fn strip_quotes(slice: &str) -> String {
    slice[1..slice.len() - 1].to_owned()
}

/// A lexed token with its byte span.
pub type Spanned = (Token, std::ops::Range<usize>);

/// Tokenize the whole input. Unlexable bytes are reported with their line.
pub fn tokenize(source: &str) -> Result<Vec<Spanned>, LexError> {
    let index = LineIndex::new(source);
    let mut out = Vec::new();
    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(token) => out.push((token, span)),
            Err(()) => {
                return Err(LexError {
                    line: index.line_of(span.start),
                    fragment: source[span.clone()].to_owned(),
                })
            }
        }
    }
    Ok(out)
}

/// An unlexable input fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub line: u32,
    pub fragment: String,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: unrecognized input `{}`", self.line, self.fragment)
    }
}

/// Maps byte offsets to 1-based line numbers.
#[derive(Debug, Clone)]
pub struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    #[must_use]
    pub fn new(source: &str) -> Self {
        let mut starts = vec![0];
        for (offset, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                starts.push(offset + 1);
            }
        }
        Self { starts }
    }

    #[must_use]
    pub fn line_of(&self, offset: usize) -> u32 {
        let idx = match self.starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        u32::try_from(idx).unwrap_or(u32::MAX - 1) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .expect("lex")
            .into_iter()
            .map(|(t, _)| t)
            .collect()
    }

    #[test]
    fn lexes_function_header() {
        let toks = kinds("function test(a: number) {}");
        assert_eq!(
            toks,
            vec![
                Token::Function,
                Token::Ident("test".to_string()),
                Token::LParen,
                Token::Ident("a".to_string()),
                Token::Colon,
                Token::Ident("number".to_string()),
                Token::RParen,
                Token::LBrace,
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn longest_match_on_comparison_operators() {
        assert_eq!(
            kinds("a <= b < c === d != e"),
            vec![
                Token::Ident("a".to_string()),
                Token::Le,
                Token::Ident("b".to_string()),
                Token::Lt,
                Token::Ident("c".to_string()),
                Token::EqEqEq,
                Token::Ident("d".to_string()),
                Token::NotEq,
                Token::Ident("e".to_string()),
            ]
        );
    }

    #[test]
    fn skips_comments_and_whitespace() {
        let toks = kinds("// leading\nconst x /* mid */ = 5;");
        assert_eq!(
            toks,
            vec![
                Token::Const,
                Token::Ident("x".to_string()),
                Token::Assign,
                Token::Number("5".to_string()),
                Token::Semi,
            ]
        );
    }

    #[test]
    fn string_literals_both_quote_styles() {
        assert_eq!(
            kinds(r#""abc" 'd'"#),
            vec![Token::Str("abc".to_string()), Token::Str("d".to_string())]
        );
    }

    #[test]
    fn rejects_unknown_bytes_with_line() {
        let err = tokenize("const a = 1;\n@").expect_err("should fail");
        assert_eq!(err.line, 2);
        assert_eq!(err.fragment, "@");
    }

    #[test]
    fn line_index_maps_offsets() {
        let source = "ab\ncd\nef";
        let index = LineIndex::new(source);
        assert_eq!(index.line_of(0), 1);
        assert_eq!(index.line_of(2), 1);
        assert_eq!(index.line_of(3), 2);
        assert_eq!(index.line_of(7), 3);
    }
}
