use chumsky::prelude::*;
use std::{borrow::Cow, fmt};

pub(crate) type Span = SimpleSpan;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token<'src> {
    BracketRoundOpen,
    BracketRoundClose,
    BracketCurlyOpen,
    BracketCurlyClose,
    BracketSquareOpen,
    BracketSquareClose,
    Int(i64),
    Float(f64),
    Str(String),
    Ident(&'src str),
    Break,
    Catch,
    Const,
    Continue,
    Delete,
    Do,
    Else,
    False,
    Finally,
    For,
    Function,
    If,
    In,
    Let,
    Null,
    Return,
    Throw,
    True,
    Try,
    Typeof,
    Undefined,
    Var,
    While,
    StrictEqual,
    StrictNotEqual,
    Equal,
    NotEqual,
    LessOrEqual,
    GreaterOrEqual,
    Less,
    Greater,
    And,
    Or,
    Not,
    Increment,
    Decrement,
    PlusAssign,
    MinusAssign,
    AsteriskAssign,
    SlashAssign,
    PercentAssign,
    Assign,
    Plus,
    Minus,
    Asterisk,
    Slash,
    Percent,
    Question,
    Colon,
    Semicolon,
    Comma,
    Dot,
}

impl<'src> Token<'src> {
    pub(crate) fn into_cow_str(&self) -> Cow<'src, str> {
        match self {
            Self::BracketRoundOpen => "(".into(),
            Self::BracketRoundClose => ")".into(),
            Self::BracketCurlyOpen => "{".into(),
            Self::BracketCurlyClose => "}".into(),
            Self::BracketSquareOpen => "[".into(),
            Self::BracketSquareClose => "]".into(),
            Self::Int(number) => number.to_string().into(),
            Self::Float(number) => number.to_string().into(),
            Self::Str(text) => format!("'{text}'").into(),
            Self::Ident(identifier) => (*identifier).into(),
            Self::Break => "break".into(),
            Self::Catch => "catch".into(),
            Self::Const => "const".into(),
            Self::Continue => "continue".into(),
            Self::Delete => "delete".into(),
            Self::Do => "do".into(),
            Self::Else => "else".into(),
            Self::False => "false".into(),
            Self::Finally => "finally".into(),
            Self::For => "for".into(),
            Self::Function => "function".into(),
            Self::If => "if".into(),
            Self::In => "in".into(),
            Self::Let => "let".into(),
            Self::Null => "null".into(),
            Self::Return => "return".into(),
            Self::Throw => "throw".into(),
            Self::True => "true".into(),
            Self::Try => "try".into(),
            Self::Typeof => "typeof".into(),
            Self::Undefined => "undefined".into(),
            Self::Var => "var".into(),
            Self::While => "while".into(),
            Self::StrictEqual => "===".into(),
            Self::StrictNotEqual => "!==".into(),
            Self::Equal => "==".into(),
            Self::NotEqual => "!=".into(),
            Self::LessOrEqual => "<=".into(),
            Self::GreaterOrEqual => ">=".into(),
            Self::Less => "<".into(),
            Self::Greater => ">".into(),
            Self::And => "&&".into(),
            Self::Or => "||".into(),
            Self::Not => "!".into(),
            Self::Increment => "++".into(),
            Self::Decrement => "--".into(),
            Self::PlusAssign => "+=".into(),
            Self::MinusAssign => "-=".into(),
            Self::AsteriskAssign => "*=".into(),
            Self::SlashAssign => "/=".into(),
            Self::PercentAssign => "%=".into(),
            Self::Assign => "=".into(),
            Self::Plus => "+".into(),
            Self::Minus => "-".into(),
            Self::Asterisk => "*".into(),
            Self::Slash => "/".into(),
            Self::Percent => "%".into(),
            Self::Question => "?".into(),
            Self::Colon => ":".into(),
            Self::Semicolon => ";".into(),
            Self::Comma => ",".into(),
            Self::Dot => ".".into(),
        }
    }

    /// Reserved words, which are still usable as property names.
    pub(crate) fn is_keyword(&self) -> bool {
        matches!(
            self,
            Self::Break
                | Self::Catch
                | Self::Const
                | Self::Continue
                | Self::Delete
                | Self::Do
                | Self::Else
                | Self::False
                | Self::Finally
                | Self::For
                | Self::Function
                | Self::If
                | Self::In
                | Self::Let
                | Self::Null
                | Self::Return
                | Self::Throw
                | Self::True
                | Self::Try
                | Self::Typeof
                | Self::Undefined
                | Self::Var
                | Self::While
        )
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.into_cow_str())
    }
}

fn keyword_or_identifier(word: &str) -> Token<'_> {
    match word {
        "break" => Token::Break,
        "catch" => Token::Catch,
        "const" => Token::Const,
        "continue" => Token::Continue,
        "delete" => Token::Delete,
        "do" => Token::Do,
        "else" => Token::Else,
        "false" => Token::False,
        "finally" => Token::Finally,
        "for" => Token::For,
        "function" => Token::Function,
        "if" => Token::If,
        "in" => Token::In,
        "let" => Token::Let,
        "null" => Token::Null,
        "return" => Token::Return,
        "throw" => Token::Throw,
        "true" => Token::True,
        "try" => Token::Try,
        "typeof" => Token::Typeof,
        "undefined" => Token::Undefined,
        "var" => Token::Var,
        "while" => Token::While,
        identifier => Token::Ident(identifier),
    }
}

pub(crate) fn lexer<'src>(
) -> impl Parser<'src, &'src str, Vec<(Token<'src>, Span)>, extra::Err<Rich<'src, char, Span>>> {
    let bracket = choice((
        just('(').to(Token::BracketRoundOpen),
        just(')').to(Token::BracketRoundClose),
        just('{').to(Token::BracketCurlyOpen),
        just('}').to(Token::BracketCurlyClose),
        just('[').to(Token::BracketSquareOpen),
        just(']').to(Token::BracketSquareClose),
    ));

    // Longest first, so `===` wins over `==` and `=`
    let comparator = choice((
        just("===").to(Token::StrictEqual),
        just("!==").to(Token::StrictNotEqual),
        just("==").to(Token::Equal),
        just("!=").to(Token::NotEqual),
        just("<=").to(Token::LessOrEqual),
        just(">=").to(Token::GreaterOrEqual),
        just('<').to(Token::Less),
        just('>').to(Token::Greater),
    ));

    let logical_operator = choice((
        just("&&").to(Token::And),
        just("||").to(Token::Or),
        just('!').to(Token::Not),
    ));

    let arithmetic_operator = choice((
        just("++").to(Token::Increment),
        just("--").to(Token::Decrement),
        just("+=").to(Token::PlusAssign),
        just("-=").to(Token::MinusAssign),
        just("*=").to(Token::AsteriskAssign),
        just("/=").to(Token::SlashAssign),
        just("%=").to(Token::PercentAssign),
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Asterisk),
        just('/').to(Token::Slash),
        just('%').to(Token::Percent),
    ));

    let punctuation = choice((
        just('=').to(Token::Assign),
        just('?').to(Token::Question),
        just(':').to(Token::Colon),
        just(';').to(Token::Semicolon),
        just(',').to(Token::Comma),
        just('.').to(Token::Dot),
    ));

    let hex_number = just('0')
        .ignore_then(one_of("xX"))
        .ignore_then(text::digits(16).to_slice())
        .try_map(|digits: &str, span| {
            i64::from_str_radix(digits, 16)
                .map(Token::Int)
                .map_err(|_| Rich::custom(span, format!("invalid hex literal `0x{digits}`")))
        });

    let fraction = just('.').then(text::digits(10));
    let exponent = one_of("eE")
        .then(one_of("+-").or_not())
        .then(text::digits(10));

    // Integral literals stay integers unless they overflow
    let number = text::digits(10)
        .then(fraction.clone().or_not())
        .ignored()
        .or(fraction.ignored())
        .then(exponent.or_not())
        .to_slice()
        .try_map(|literal: &str, span| {
            literal
                .parse::<i64>()
                .map(Token::Int)
                .or_else(|_| literal.parse::<f64>().map(Token::Float))
                .map_err(|_| Rich::custom(span, format!("invalid number `{literal}`")))
        });

    let escape = just('\\').ignore_then(choice((
        just('n').to('\n'),
        just('t').to('\t'),
        just('r').to('\r'),
        just('0').to('\0'),
        just('u').ignore_then(text::digits(16).exactly(4).to_slice().try_map(
            |hex: &str, span| {
                u32::from_str_radix(hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| Rich::custom(span, "invalid unicode escape"))
            },
        )),
        none_of('\n'),
    )));

    let quoted = |quote: char| {
        just(quote)
            .ignore_then(
                none_of([quote, '\\', '\n'])
                    .or(escape.clone())
                    .repeated()
                    .collect::<String>(),
            )
            .then_ignore(just(quote))
            .map(Token::Str)
    };
    let string = choice((quoted('"'), quoted('\'')));

    let identifier_or_keyword = any()
        .filter(|character: &char| character.is_alphabetic() || *character == '_' || *character == '$')
        .then(
            any()
                .filter(|character: &char| {
                    character.is_alphanumeric() || *character == '_' || *character == '$'
                })
                .repeated(),
        )
        .to_slice()
        .map(keyword_or_identifier);

    let line_comment = just("//")
        .then(any().and_is(just('\n').not()).repeated())
        .ignored();
    let block_comment = just("/*")
        .then(any().and_is(just("*/").not()).repeated())
        .then(just("*/"))
        .ignored();
    let trivia = choice((
        text::whitespace().at_least(1).ignored(),
        line_comment,
        block_comment,
    ))
    .repeated();

    let token = choice((
        hex_number,
        number,
        string,
        identifier_or_keyword,
        bracket,
        comparator,
        logical_operator,
        arithmetic_operator,
        punctuation,
    ));

    trivia
        .clone()
        .ignore_then(
            token
                .map_with(|token, extra| (token, extra.span()))
                .then_ignore(trivia)
                .repeated()
                .collect::<Vec<_>>(),
        )
        .then_ignore(end())
}
