//! Token definitions for the Varde surface language.

use core::fmt;

use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token<'s> {
    #[token("func")]
    Func,
    #[token("struct")]
    Struct,
    #[token("enum")]
    Enum,
    #[token("var")]
    Var,
    #[token("begin")]
    Begin,
    #[token("end")]
    End,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("break")]
    Break,
    #[token("continue")]
    Continue,
    #[token("return")]
    Return,
    #[token("print")]
    Print,

    #[token(":=")]
    Assign,
    #[token("=")]
    Eq,
    #[token("!=")]
    Neq,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token(":")]
    Colon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("^")]
    Caret,
    #[token("&")]
    Ampersand,
    #[token("@")]
    At,

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Num(i64),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident(&'s str),

    /// A double-quoted string literal, quotes included in the slice.
    #[regex(r#""[^"\n]*""#)]
    Str(&'s str),
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Func => write!(f, "'func'"),
            Token::Struct => write!(f, "'struct'"),
            Token::Enum => write!(f, "'enum'"),
            Token::Var => write!(f, "'var'"),
            Token::Begin => write!(f, "'begin'"),
            Token::End => write!(f, "'end'"),
            Token::If => write!(f, "'if'"),
            Token::Then => write!(f, "'then'"),
            Token::Else => write!(f, "'else'"),
            Token::While => write!(f, "'while'"),
            Token::Do => write!(f, "'do'"),
            Token::Break => write!(f, "'break'"),
            Token::Continue => write!(f, "'continue'"),
            Token::Return => write!(f, "'return'"),
            Token::Print => write!(f, "'print'"),
            Token::Assign => write!(f, "':='"),
            Token::Eq => write!(f, "'='"),
            Token::Neq => write!(f, "'!='"),
            Token::Shl => write!(f, "'<<'"),
            Token::Shr => write!(f, "'>>'"),
            Token::Less => write!(f, "'<'"),
            Token::Greater => write!(f, "'>'"),
            Token::Plus => write!(f, "'+'"),
            Token::Minus => write!(f, "'-'"),
            Token::Star => write!(f, "'*'"),
            Token::Slash => write!(f, "'/'"),
            Token::Colon => write!(f, "':'"),
            Token::Comma => write!(f, "','"),
            Token::Dot => write!(f, "'.'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::Caret => write!(f, "'^'"),
            Token::Ampersand => write!(f, "'&'"),
            Token::At => write!(f, "'@'"),
            Token::Num(n) => write!(f, "number {n}"),
            Token::Ident(name) => write!(f, "identifier '{name}'"),
            Token::Str(_) => write!(f, "string literal"),
        }
    }
}

/// Maps byte positions to 1-based line numbers.
pub struct LineMap {
    line_starts: Vec<usize>,
}

impl LineMap {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        for (at, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push(at + 1);
            }
        }
        LineMap { line_starts }
    }

    pub fn line_of(&self, byte_pos: usize) -> i64 {
        match self.line_starts.binary_search(&byte_pos) {
            Ok(line) => line as i64 + 1,
            Err(line) => line as i64,
        }
    }
}
