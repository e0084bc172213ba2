use logos::Logos;
use smol_str::SmolStr;

/// Source span as byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn len(self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// The text this span covers in `source`.
    pub fn slice(self, source: &str) -> &str {
        &source[self.start as usize..self.end as usize]
    }
}

#[derive(Logos, Debug, Clone, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token {
    #[token("{")]
    LCurly,
    #[token("}")]
    RCurly,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBrack,
    #[token("]")]
    RBrack,

    #[token(".")]
    Dot,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token("@")]
    At,
    #[token("->")]
    Arrow,

    #[token("==")]
    Eq,
    #[token("!=")]
    Ne,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,

    #[token("=")]
    Assign,

    #[token("domain")]
    KwDomain,
    #[token("let")]
    KwLet,
    #[token("mod")]
    KwMod,
    #[token("typevar")]
    KwTypevar,

    /// Numeric literal. Lexed so it can be reported, but no grammar rule accepts it.
    #[regex(r"[0-9]+", |lex| SmolStr::new(lex.slice()))]
    Number(SmolStr),

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| SmolStr::new(lex.slice()))]
    Ident(SmolStr),
}

impl Token {
    /// Upper-case kind name, as shown by `--dump-tokens` and in parse errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Token::LCurly => "LCURLY",
            Token::RCurly => "RCURLY",
            Token::LParen => "LPAREN",
            Token::RParen => "RPAREN",
            Token::LBrack => "LBRACK",
            Token::RBrack => "RBRACK",
            Token::Dot => "DOT",
            Token::Comma => "COMMA",
            Token::Colon => "COLON",
            Token::Semicolon => "SEMICOLON",
            Token::At => "AT",
            Token::Arrow => "ARROW",
            Token::Eq => "EQ",
            Token::Ne => "NE",
            Token::Lt => "LT",
            Token::Gt => "GT",
            Token::Le => "LE",
            Token::Ge => "GE",
            Token::Assign => "ASSIGN",
            Token::KwDomain => "KW_DOMAIN",
            Token::KwLet => "KW_LET",
            Token::KwMod => "KW_MOD",
            Token::KwTypevar => "KW_TYPEVAR",
            Token::Number(_) => "LIT_NUM",
            Token::Ident(_) => "IDENT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("unclosed comment; missing `*/`")]
    UnclosedComment { span: Span },

    #[error("unknown character `{ch}`")]
    UnknownCharacter { ch: char, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnclosedComment { span } | LexError::UnknownCharacter { span, .. } => *span,
        }
    }
}

/// Lex source code into a list of (token, span) pairs, stopping at the first error.
pub fn lex(source: &str) -> Result<Vec<(Token, Span)>, LexError> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);

    while let Some(result) = lexer.next() {
        let range = lexer.span();
        let span = Span::new(range.start as u32, range.end as u32);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => return Err(classify_error(source, span)),
        }
    }

    Ok(tokens)
}

fn classify_error(source: &str, span: Span) -> LexError {
    let rest = &source[span.start as usize..];
    if rest.starts_with("/*") {
        return LexError::UnclosedComment {
            span: Span::new(span.start, source.len() as u32),
        };
    }
    let ch = rest.chars().next().unwrap_or('\0');
    LexError::UnknownCharacter {
        ch,
        span: Span::new(span.start, span.start + ch.len_utf8() as u32),
    }
}
