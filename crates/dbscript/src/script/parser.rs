use super::{
    ast::{BinaryOp, DeclKind, Expr, FunctionDef, Literal, LogicalOp, Program, Stmt, UnaryOp},
    lexer::{lexer, Span, Token},
};
use dbscript_core::{Error, Result};

use chumsky::{input::ValueInput, pratt::*, prelude::*};
use std::{fmt, rc::Rc};

pub(crate) type ParseError<'src, T> = Rich<'src, T, Span>;

/// Tokenizes and parses `source`, rejecting sources nested deeper than
/// `max_nesting` before any recursive descent starts.
pub(crate) fn parse(source: &str, max_nesting: usize) -> Result<Program> {
    let tokens = lexer()
        .parse(source)
        .into_result()
        .map_err(|errors| syntax_error(source, errors))?;

    check_nesting(source, &tokens, max_nesting)?;

    let eoi = Span::from(source.len()..source.len());
    let body = parser()
        .parse(tokens.as_slice().map(eoi, |(token, span)| (token, span)))
        .into_result()
        .map_err(|errors| syntax_error(source, errors))?;
    Ok(Program { body })
}

fn syntax_error<T: fmt::Display>(source: &str, errors: Vec<ParseError<'_, T>>) -> Error {
    match errors.first() {
        Some(error) => {
            let (line, column) = position(source, error.span().start);
            Error::evaluation(format!("syntax error at {line}:{column}: {}", error.reason()))
        }
        None => Error::evaluation("syntax error"),
    }
}

/// 1-based line and column of a byte offset.
fn position(source: &str, offset: usize) -> (usize, usize) {
    let before = source.get(..offset).unwrap_or(source);
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |last| last.chars().count()) + 1;
    (line, column)
}

#[derive(Debug, Default)]
struct Level {
    /// Operators and statement keywords still open at this bracket level
    chain: usize,

    /// Opened by the condition of `if`, `while`, `for` or `catch`
    header: bool,
}

/// Bounds how deeply the parser will have to recurse.
///
/// Every open bracket counts, as does every operator or statement keyword
/// whose operand is parsed recursively (`=`, `?`, prefix operators, `if`,
/// `else`, loops). An operator's count is released when its expression ends
/// at a `;`, a `,`, or where a new statement starts right after an operand.
fn check_nesting(source: &str, tokens: &[(Token<'_>, Span)], limit: usize) -> Result<()> {
    let mut levels = vec![Level::default()];
    let mut prev: Option<&Token<'_>> = None;
    let mut after_header = false;

    for (token, span) in tokens {
        let operand_before = prev.is_some_and(Token::ends_operand);
        if operand_before && !after_header && token.starts_statement() {
            if let Some(level) = levels.last_mut() {
                level.chain = 0;
            }
        }
        after_header = false;

        match token {
            Token::BracketRoundOpen | Token::BracketSquareOpen | Token::BracketCurlyOpen => {
                levels.push(Level {
                    chain: 0,
                    header: *token == Token::BracketRoundOpen
                        && matches!(prev, Some(Token::If | Token::While | Token::For | Token::Catch)),
                });
            }
            Token::BracketRoundClose | Token::BracketSquareClose | Token::BracketCurlyClose => {
                if levels.len() > 1 {
                    after_header = levels.pop().is_some_and(|level| level.header);
                }
            }
            Token::Semicolon | Token::Comma => {
                if let Some(level) = levels.last_mut() {
                    level.chain = 0;
                }
            }
            token if token.opens_operand(operand_before) => {
                if let Some(level) = levels.last_mut() {
                    level.chain += 1;
                }
            }
            _ => {}
        }

        let depth = levels.len() + levels.iter().map(|level| level.chain).sum::<usize>();
        if depth > limit {
            let (line, column) = position(source, span.start);
            return Err(Error::evaluation(format!(
                "nesting too deep at {line}:{column}: more than {limit} levels"
            )));
        }
        prev = Some(token);
    }
    Ok(())
}

impl Token<'_> {
    fn ends_operand(&self) -> bool {
        matches!(
            self,
            Token::Int(_)
                | Token::Float(_)
                | Token::Str(_)
                | Token::Ident(_)
                | Token::True
                | Token::False
                | Token::Null
                | Token::Undefined
                | Token::BracketRoundClose
                | Token::BracketSquareClose
                | Token::BracketCurlyClose
                | Token::Increment
                | Token::Decrement
        )
    }

    /// Tokens that cannot continue an expression, so after an operand they
    /// begin the next statement.
    fn starts_statement(&self) -> bool {
        matches!(
            self,
            Token::Int(_)
                | Token::Float(_)
                | Token::Str(_)
                | Token::Ident(_)
                | Token::True
                | Token::False
                | Token::Null
                | Token::Undefined
                | Token::Not
                | Token::Typeof
                | Token::Delete
                | Token::Function
                | Token::Var
                | Token::Let
                | Token::Const
                | Token::If
                | Token::While
                | Token::For
                | Token::Do
                | Token::Break
                | Token::Continue
                | Token::Return
                | Token::Throw
                | Token::Try
        )
    }

    /// Whether the operand after this token is parsed by a nested call.
    fn opens_operand(&self, operand_before: bool) -> bool {
        match self {
            Token::Assign
            | Token::PlusAssign
            | Token::MinusAssign
            | Token::AsteriskAssign
            | Token::SlashAssign
            | Token::PercentAssign
            | Token::Question
            | Token::Not
            | Token::Typeof
            | Token::Delete
            | Token::If
            | Token::Else
            | Token::While
            | Token::For
            | Token::Do => true,
            Token::Plus | Token::Minus | Token::Increment | Token::Decrement => !operand_before,
            _ => false,
        }
    }
}

enum Suffix {
    Member(String),
    Index(Expr),
    Call(Vec<Expr>),
}

fn is_assignable(expr: &Expr) -> bool {
    matches!(expr, Expr::Ident(_) | Expr::Member(..) | Expr::Index(..))
}

fn parser<'src, I>() -> impl Parser<'src, I, Vec<Stmt>, extra::Err<ParseError<'src, Token<'src>>>>
where
    I: ValueInput<'src, Token = Token<'src>, Span = Span>,
{
    recursive(|statement| {
        let bracket_round_open = just(Token::BracketRoundOpen);
        let bracket_round_close = just(Token::BracketRoundClose);
        let bracket_curly_open = just(Token::BracketCurlyOpen);
        let bracket_curly_close = just(Token::BracketCurlyClose);
        let bracket_square_open = just(Token::BracketSquareOpen);
        let bracket_square_close = just(Token::BracketSquareClose);
        let comma = just(Token::Comma);
        let semicolon = just(Token::Semicolon);

        // Semicolons are optional between statements
        let end_of_statement = semicolon.clone().or_not().ignored();

        let identifier = select! { Token::Ident(identifier) => identifier.to_string() }
            .labelled("an identifier");
        let keyword = any()
            .filter(Token::is_keyword)
            .map(|keyword: Token<'src>| keyword.to_string());
        let property_name = select! {
            Token::Ident(identifier) => identifier.to_string(),
            Token::Str(text) => text,
            Token::Int(number) => number.to_string(),
        }
        .or(keyword.clone());
        let member_name = identifier.clone().or(keyword).labelled("a property name");

        let block = statement
            .clone()
            .repeated()
            .collect::<Vec<Stmt>>()
            .delimited_by(bracket_curly_open.clone(), bracket_curly_close.clone())
            .boxed();

        let parameters = identifier
            .clone()
            .separated_by(comma.clone())
            .collect::<Vec<_>>()
            .delimited_by(bracket_round_open.clone(), bracket_round_close.clone());

        let function = just(Token::Function)
            .ignore_then(identifier.clone().or_not())
            .then(parameters.clone())
            .then(block.clone())
            .map(|((name, params), body)| Rc::new(FunctionDef { name, params, body }));

        let expression = recursive(|expression| {
            let arguments = expression
                .clone()
                .separated_by(comma.clone())
                .allow_trailing()
                .collect::<Vec<Expr>>();

            let literal = select! {
                Token::Int(number) => Literal::Int(number),
                Token::Float(number) => Literal::Float(number),
                Token::Str(text) => Literal::Str(text.into()),
                Token::True => Literal::Bool(true),
                Token::False => Literal::Bool(false),
                Token::Null => Literal::Null,
                Token::Undefined => Literal::Undefined,
            }
            .map(Expr::Literal);

            let array = arguments
                .clone()
                .delimited_by(bracket_square_open.clone(), bracket_square_close.clone())
                .map(Expr::Array);

            let object = property_name
                .then_ignore(just(Token::Colon))
                .then(expression.clone())
                .separated_by(comma.clone())
                .allow_trailing()
                .collect::<Vec<_>>()
                .delimited_by(bracket_curly_open.clone(), bracket_curly_close.clone())
                .map(Expr::Object);

            let nested = expression
                .clone()
                .delimited_by(bracket_round_open.clone(), bracket_round_close.clone());

            let primary = choice((
                literal,
                identifier.clone().map(Expr::Ident),
                function.clone().map(Expr::Function),
                array,
                object,
                nested,
            ))
            .labelled("an expression");

            let suffix = choice((
                just(Token::Dot).ignore_then(member_name).map(Suffix::Member),
                expression
                    .clone()
                    .delimited_by(bracket_square_open.clone(), bracket_square_close.clone())
                    .map(Suffix::Index),
                arguments
                    .delimited_by(bracket_round_open.clone(), bracket_round_close.clone())
                    .map(Suffix::Call),
            ));

            let call = primary
                .foldl(suffix.repeated(), |expr, suffix| match suffix {
                    Suffix::Member(name) => Expr::Member(Box::new(expr), name),
                    Suffix::Index(index) => Expr::Index(Box::new(expr), Box::new(index)),
                    Suffix::Call(args) => Expr::Call(Box::new(expr), args),
                })
                .boxed();

            let update = select! { Token::Increment => true, Token::Decrement => false };

            let prefix_update = update.clone().then(call.clone()).try_map(|(increment, target), span| {
                if is_assignable(&target) {
                    Ok(Expr::Update {
                        increment,
                        prefix: true,
                        target: Box::new(target),
                    })
                } else {
                    Err(Rich::custom(span, "invalid update target"))
                }
            });

            let postfix_update = call.then(update.or_not()).try_map(|(target, update), span| match update {
                None => Ok(target),
                Some(increment) if is_assignable(&target) => Ok(Expr::Update {
                    increment,
                    prefix: false,
                    target: Box::new(target),
                }),
                Some(_) => Err(Rich::custom(span, "invalid update target")),
            });

            let binary = prefix_update
                .or(postfix_update)
                .pratt((
                    // Precedence 1 (lowest): logical or
                    infix(left(1), just(Token::Or), |l, _, r, _| {
                        Expr::Logical(LogicalOp::Or, Box::new(l), Box::new(r))
                    }),
                    // Precedence 2: logical and
                    infix(left(2), just(Token::And), |l, _, r, _| {
                        Expr::Logical(LogicalOp::And, Box::new(l), Box::new(r))
                    }),
                    // Precedence 3: equality
                    infix(
                        left(3),
                        select! {
                            Token::Equal => BinaryOp::Eq,
                            Token::NotEqual => BinaryOp::Ne,
                            Token::StrictEqual => BinaryOp::StrictEq,
                            Token::StrictNotEqual => BinaryOp::StrictNe,
                        },
                        |l, op, r, _| Expr::Binary(op, Box::new(l), Box::new(r)),
                    ),
                    // Precedence 4: relational operators and `in`
                    infix(
                        left(4),
                        select! {
                            Token::Less => BinaryOp::Lt,
                            Token::LessOrEqual => BinaryOp::Le,
                            Token::Greater => BinaryOp::Gt,
                            Token::GreaterOrEqual => BinaryOp::Ge,
                            Token::In => BinaryOp::In,
                        },
                        |l, op, r, _| Expr::Binary(op, Box::new(l), Box::new(r)),
                    ),
                    // Precedence 5: additive operators
                    infix(
                        left(5),
                        select! {
                            Token::Plus => BinaryOp::Add,
                            Token::Minus => BinaryOp::Sub,
                        },
                        |l, op, r, _| Expr::Binary(op, Box::new(l), Box::new(r)),
                    ),
                    // Precedence 6: multiplicative operators
                    infix(
                        left(6),
                        select! {
                            Token::Asterisk => BinaryOp::Mul,
                            Token::Slash => BinaryOp::Div,
                            Token::Percent => BinaryOp::Rem,
                        },
                        |l, op, r, _| Expr::Binary(op, Box::new(l), Box::new(r)),
                    ),
                    // Precedence 7 (highest): prefix operators
                    prefix(
                        7,
                        select! {
                            Token::Not => UnaryOp::Not,
                            Token::Minus => UnaryOp::Neg,
                            Token::Plus => UnaryOp::Plus,
                        },
                        |op, rhs, _| Expr::Unary(op, Box::new(rhs)),
                    ),
                    prefix(7, just(Token::Typeof), |_, rhs, _| Expr::Typeof(Box::new(rhs))),
                    prefix(7, just(Token::Delete), |_, rhs, _| Expr::Delete(Box::new(rhs))),
                ))
                .boxed();

            let conditional = binary
                .then(
                    just(Token::Question)
                        .ignore_then(expression.clone())
                        .then_ignore(just(Token::Colon))
                        .then(expression.clone())
                        .or_not(),
                )
                .map(|(test, branches)| match branches {
                    Some((consequent, alternate)) => {
                        Expr::Conditional(Box::new(test), Box::new(consequent), Box::new(alternate))
                    }
                    None => test,
                });

            let assignment_operator = select! {
                Token::Assign => None,
                Token::PlusAssign => Some(BinaryOp::Add),
                Token::MinusAssign => Some(BinaryOp::Sub),
                Token::AsteriskAssign => Some(BinaryOp::Mul),
                Token::SlashAssign => Some(BinaryOp::Div),
                Token::PercentAssign => Some(BinaryOp::Rem),
            };

            // Right-associative: `a = b += 1` assigns `b` first
            conditional
                .then(assignment_operator.then(expression).or_not())
                .try_map(|(target, assignment), span| match assignment {
                    None => Ok(target),
                    Some((op, value)) if is_assignable(&target) => {
                        Ok(Expr::Assign(op, Box::new(target), Box::new(value)))
                    }
                    Some(_) => Err(Rich::custom(span, "invalid assignment target")),
                })
        });

        let condition = expression
            .clone()
            .delimited_by(bracket_round_open.clone(), bracket_round_close.clone());

        let declaration_kind = select! {
            Token::Var => DeclKind::Var,
            Token::Let => DeclKind::Let,
            Token::Const => DeclKind::Const,
        };

        let declarators = declaration_kind
            .clone()
            .then(
                identifier
                    .clone()
                    .then(just(Token::Assign).ignore_then(expression.clone()).or_not())
                    .separated_by(comma.clone())
                    .at_least(1)
                    .collect::<Vec<_>>(),
            )
            .try_map(|(kind, bindings), span| {
                if kind == DeclKind::Const {
                    if let Some((name, _)) = bindings.iter().find(|(_, init)| init.is_none()) {
                        return Err(Rich::custom(
                            span,
                            format!("missing initializer in const declaration of `{name}`"),
                        ));
                    }
                }
                Ok(Stmt::Decl(kind, bindings))
            })
            .boxed();

        let empty = semicolon.clone().to(Stmt::Empty);

        let block_statement = block.clone().map(Stmt::Block);

        let declaration = declarators.clone().then_ignore(end_of_statement.clone());

        let function_declaration = just(Token::Function)
            .ignore_then(identifier.clone())
            .then(parameters)
            .then(block.clone())
            .map(|((name, params), body)| {
                Stmt::Function(Rc::new(FunctionDef {
                    name: Some(name),
                    params,
                    body,
                }))
            });

        let if_ = just(Token::If)
            .ignore_then(condition.clone())
            .then(statement.clone())
            .then(just(Token::Else).ignore_then(statement.clone()).or_not())
            .map(|((test, consequent), alternate)| {
                Stmt::If(test, Box::new(consequent), alternate.map(Box::new))
            });

        let while_ = just(Token::While)
            .ignore_then(condition.clone())
            .then(statement.clone())
            .map(|(test, body)| Stmt::While(test, Box::new(body)));

        let do_while = just(Token::Do)
            .ignore_then(statement.clone())
            .then_ignore(just(Token::While))
            .then(condition)
            .then_ignore(end_of_statement.clone())
            .map(|(body, test)| Stmt::DoWhile(Box::new(body), test));

        let for_in = just(Token::For)
            .ignore_then(
                declaration_kind
                    .or_not()
                    .then(identifier.clone())
                    .then_ignore(just(Token::In))
                    .then(expression.clone())
                    .delimited_by(bracket_round_open.clone(), bracket_round_close.clone()),
            )
            .then(statement.clone())
            .map(|(((decl, name), object), body)| Stmt::ForIn {
                decl,
                name,
                object,
                body: Box::new(body),
            });

        let for_ = just(Token::For)
            .ignore_then(
                declarators
                    .or(expression.clone().map(Stmt::Expr))
                    .map(Box::new)
                    .or_not()
                    .then_ignore(semicolon.clone())
                    .then(expression.clone().or_not())
                    .then_ignore(semicolon.clone())
                    .then(expression.clone().or_not())
                    .delimited_by(bracket_round_open.clone(), bracket_round_close.clone()),
            )
            .then(statement.clone())
            .map(|(((init, test), update), body)| Stmt::For {
                init,
                test,
                update,
                body: Box::new(body),
            });

        let break_ = just(Token::Break)
            .then_ignore(end_of_statement.clone())
            .to(Stmt::Break);

        let continue_ = just(Token::Continue)
            .then_ignore(end_of_statement.clone())
            .to(Stmt::Continue);

        let return_ = just(Token::Return)
            .ignore_then(expression.clone().or_not())
            .then_ignore(end_of_statement.clone())
            .map(Stmt::Return);

        let throw = just(Token::Throw)
            .ignore_then(expression.clone())
            .then_ignore(end_of_statement.clone())
            .map(Stmt::Throw);

        let try_ = just(Token::Try)
            .ignore_then(block.clone())
            .then(
                just(Token::Catch)
                    .ignore_then(
                        identifier
                            .delimited_by(bracket_round_open, bracket_round_close)
                            .or_not(),
                    )
                    .then(block.clone())
                    .or_not(),
            )
            .then(just(Token::Finally).ignore_then(block).or_not())
            .try_map(|((block, catch), finalizer), span| {
                let (param, handler) = match catch {
                    Some((param, handler)) => (param, Some(handler)),
                    None if finalizer.is_none() => {
                        return Err(Rich::custom(span, "`try` needs a `catch` or `finally` block"))
                    }
                    None => (None, None),
                };
                Ok(Stmt::Try {
                    block,
                    param,
                    handler,
                    finalizer,
                })
            });

        let expression_statement = expression
            .then_ignore(end_of_statement)
            .map(Stmt::Expr);

        choice((
            empty,
            block_statement,
            declaration,
            function_declaration,
            if_,
            while_,
            do_while,
            for_in,
            for_,
            break_,
            continue_,
            return_,
            throw,
            try_,
            expression_statement,
        ))
        .boxed()
    })
    .repeated()
    .collect()
    .then_ignore(end())
}
