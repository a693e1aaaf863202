//! A Pratt-style recursive-descent parser over a [`Position`] cursor.
//! Precedence climbs, low to high: block, statement (`=`), tuple (`,`),
//! `else`, comparison (`<`), addition (`+`), `.`, postfix (`?`, call),
//! primary (literals, `{ }`, `( )`, keyword forms).
//!
//! Parse errors never abort: a malformed node becomes `Expr::Error` and the
//! cursor advances by at least one character, so the whole source is always
//! consumed and a best-effort tree comes back alongside the error list.

use crate::diagnostics::CompileError;

use super::ast::{BinaryOp, Expr, Span, UnaryOp};
use super::position::Position;

pub fn parse(source: &str) -> (Span, Vec<CompileError>) {
    let mut errors = Vec::new();
    let start = Position::start(source);
    let (span, end) = parse_block_body(start, &mut errors, None);
    if !skip_ws(end).is_empty() {
        errors.push(CompileError::parse("unexpected trailing input", end));
    }
    (span, errors)
}

fn skip_ws(pos: Position<'_>) -> Position<'_> {
    let mut cur = pos;
    while matches!(cur.peek(), Some(c) if c.is_whitespace()) {
        cur = cur.next().1;
    }
    cur
}

/// Parses statements until `terminator` (or end of input if `None`),
/// consuming `terminator` itself when present.
fn parse_block_body<'a>(
    pos: Position<'a>,
    errors: &mut Vec<CompileError>,
    terminator: Option<char>,
) -> (Span, Position<'a>) {
    let start = skip_ws(pos);
    let mut cur = start;
    let mut items = Vec::new();
    loop {
        cur = skip_ws(cur);
        if cur.is_empty() {
            break;
        }
        if terminator == cur.peek() {
            cur = cur.next().1;
            break;
        }
        let (item, next) = parse_assign(cur, errors);
        items.push(item);
        cur = next;
    }
    (Span::new(start, cur, Expr::Block(items)), cur)
}

fn parse_assign<'a>(pos: Position<'a>, errors: &mut Vec<CompileError>) -> (Span, Position<'a>) {
    let start = pos;
    let (left, mut cur) = parse_tuple(pos, errors);
    cur = skip_ws(cur);
    if cur.peek() == Some('=') {
        cur = cur.next().1;
        let (right, next) = parse_assign(cur, errors);
        return (
            Span::new(
                start,
                next,
                Expr::Binary { op: BinaryOp::Assign, left: Box::new(left), right: Box::new(right) },
            ),
            next,
        );
    }
    (left, cur)
}

fn parse_tuple<'a>(pos: Position<'a>, errors: &mut Vec<CompileError>) -> (Span, Position<'a>) {
    let start = pos;
    let (first, mut cur) = parse_else(pos, errors);
    let mut items = vec![first];
    loop {
        let probe = skip_ws(cur);
        if probe.peek() == Some(',') {
            cur = probe.next().1;
            let (next_item, next) = parse_else(cur, errors);
            items.push(next_item);
            cur = next;
        } else {
            break;
        }
    }
    if items.len() == 1 {
        (items.pop().unwrap(), cur)
    } else {
        (Span::new(start, cur, Expr::Tuple(items)), cur)
    }
}

fn parse_else<'a>(pos: Position<'a>, errors: &mut Vec<CompileError>) -> (Span, Position<'a>) {
    let start = pos;
    let (left, mut cur) = parse_comparison(pos, errors);
    if let Some(after) = consume_keyword(cur, "else") {
        cur = after;
        let (right, next) = parse_else(cur, errors);
        return (
            Span::new(
                start,
                next,
                Expr::Binary { op: BinaryOp::Else, left: Box::new(left), right: Box::new(right) },
            ),
            next,
        );
    }
    (left, cur)
}

fn parse_comparison<'a>(pos: Position<'a>, errors: &mut Vec<CompileError>) -> (Span, Position<'a>) {
    let start = pos;
    let (left, cur) = parse_addition(pos, errors);
    let probe = skip_ws(cur);
    if probe.peek() == Some('<') {
        let after = probe.next().1;
        let (right, next) = parse_addition(after, errors);
        return (
            Span::new(
                start,
                next,
                Expr::Binary { op: BinaryOp::Less, left: Box::new(left), right: Box::new(right) },
            ),
            next,
        );
    }
    (left, cur)
}

fn parse_addition<'a>(pos: Position<'a>, errors: &mut Vec<CompileError>) -> (Span, Position<'a>) {
    let start = pos;
    let (mut left, mut cur) = parse_dot(pos, errors);
    loop {
        let probe = skip_ws(cur);
        if probe.peek() == Some('+') {
            let after = probe.next().1;
            let (right, next) = parse_dot(after, errors);
            left = Span::new(
                start,
                next,
                Expr::Binary { op: BinaryOp::Add, left: Box::new(left), right: Box::new(right) },
            );
            cur = next;
        } else {
            break;
        }
    }
    (left, cur)
}

fn parse_dot<'a>(pos: Position<'a>, errors: &mut Vec<CompileError>) -> (Span, Position<'a>) {
    let start = pos;
    let (mut left, mut cur) = parse_postfix(pos, errors);
    loop {
        let probe = skip_ws(cur);
        if probe.peek() == Some('.') {
            let after = probe.next().1;
            let (right, next) = parse_postfix(after, errors);
            left = Span::new(
                start,
                next,
                Expr::Binary { op: BinaryOp::Dot, left: Box::new(left), right: Box::new(right) },
            );
            cur = next;
        } else {
            break;
        }
    }
    (left, cur)
}

fn parse_postfix<'a>(pos: Position<'a>, errors: &mut Vec<CompileError>) -> (Span, Position<'a>) {
    let start = pos;
    let (mut expr, mut cur) = parse_primary(pos, errors);
    loop {
        let probe = skip_ws(cur);
        match probe.peek() {
            Some('?') => {
                cur = probe.next().1;
                expr = Span::new(
                    start,
                    cur,
                    Expr::Unary { op: UnaryOp::Maybe, operand: Box::new(expr) },
                );
            }
            Some('(') => {
                let (args, next) = parse_bracket(probe, errors);
                cur = next;
                expr = Span::new(
                    start,
                    cur,
                    Expr::Binary { op: BinaryOp::Call, left: Box::new(expr), right: Box::new(args) },
                );
            }
            _ => break,
        }
    }
    (expr, cur)
}

/// Parses a parenthesized group: `()`, `(expr)`, or `(a, b, ...)`.
fn parse_bracket<'a>(pos: Position<'a>, errors: &mut Vec<CompileError>) -> (Span, Position<'a>) {
    let start = pos;
    debug_assert_eq!(pos.peek(), Some('('));
    let mut cur = pos.next().1;
    let probe = skip_ws(cur);
    if probe.peek() == Some(')') {
        cur = probe.next().1;
        return (Span::new(start, cur, Expr::Tuple(Vec::new())), cur);
    }
    let (inner, next) = parse_tuple(cur, errors);
    cur = skip_ws(next);
    if cur.peek() == Some(')') {
        cur = cur.next().1;
    } else {
        errors.push(CompileError::parse("expected ')'", cur));
    }
    (inner, cur)
}

fn parse_primary<'a>(pos: Position<'a>, errors: &mut Vec<CompileError>) -> (Span, Position<'a>) {
    let start = skip_ws(pos);
    match start.peek() {
        None => (Span::error(start, start, "unexpected end of input"), start),
        Some(c) if c.is_ascii_digit() => parse_integer(start),
        Some('(') => parse_bracket(start, errors),
        Some('{') => {
            let after_brace = start.next().1;
            parse_block_body(after_brace, errors, Some('}'))
        }
        Some(c) if c.is_ascii_alphabetic() => parse_word(start, errors),
        Some(c) => {
            let end = start.next().1;
            errors.push(CompileError::parse(format!("unexpected character '{c}'"), start));
            (Span::error(start, end, format!("unexpected character '{c}'")), end)
        }
    }
}

fn parse_integer(pos: Position<'_>) -> (Span, Position<'_>) {
    let mut cur = pos;
    while matches!(cur.peek(), Some(c) if c.is_ascii_digit()) {
        cur = cur.next().1;
    }
    let text = pos.between(cur);
    let value: i64 = text.parse().unwrap_or(0);
    (Span::new(pos, cur, Expr::IntegerLiteral(value)), cur)
}

fn read_word(pos: Position<'_>) -> (&str, Position<'_>) {
    let mut cur = pos;
    while matches!(cur.peek(), Some(c) if c.is_ascii_alphanumeric()) {
        cur = cur.next().1;
    }
    (pos.between(cur), cur)
}

/// If the word at `pos` is exactly `keyword` and not a longer identifier,
/// returns the cursor just past it.
fn consume_keyword<'a>(pos: Position<'a>, keyword: &str) -> Option<Position<'a>> {
    let probe = skip_ws(pos);
    let (word, after) = read_word(probe);
    if word == keyword {
        Some(after)
    } else {
        None
    }
}

fn parse_word<'a>(pos: Position<'a>, errors: &mut Vec<CompileError>) -> (Span, Position<'a>) {
    let (word, end) = read_word(pos);
    match word {
        "true" => (Span::new(pos, end, Expr::BooleanLiteral(true)), end),
        "false" => (Span::new(pos, end, Expr::BooleanLiteral(false)), end),
        "if" => {
            let (cond, after_cond) = parse_comparison(end, errors);
            let (body, after_body) = parse_postfix(after_cond, errors);
            (
                Span::new(
                    pos,
                    after_body,
                    Expr::Binary { op: BinaryOp::If, left: Box::new(cond), right: Box::new(body) },
                ),
                after_body,
            )
        }
        "while" => {
            let (cond, after_cond) = parse_comparison(end, errors);
            let (body, after_body) = parse_postfix(after_cond, errors);
            (
                Span::new(
                    pos,
                    after_body,
                    Expr::Binary { op: BinaryOp::While, left: Box::new(cond), right: Box::new(body) },
                ),
                after_body,
            )
        }
        "fn" => {
            let (params, after_params) = parse_postfix(end, errors);
            let (body, after_body) = parse_postfix(after_params, errors);
            (
                Span::new(
                    pos,
                    after_body,
                    Expr::Binary { op: BinaryOp::Fn, left: Box::new(params), right: Box::new(body) },
                ),
                after_body,
            )
        }
        "struct" => {
            let (body, after_body) = parse_postfix(end, errors);
            (Span::new(pos, after_body, Expr::Struct(Box::new(body))), after_body)
        }
        "" => {
            errors.push(CompileError::parse("expected identifier", pos));
            let next = pos.next().1;
            (Span::error(pos, next, "expected identifier"), next)
        }
        _ => (Span::new(pos, end, Expr::Identifier(word.to_string())), end),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Span {
        let (span, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
        span
    }

    #[test]
    fn parses_arithmetic_left_associatively() {
        let span = parse_ok("1 + 2 + 3");
        match &span.expr {
            Expr::Block(items) => assert_eq!(items.len(), 1),
            other => panic!("expected block, got {other:?}"),
        }
    }

    #[test]
    fn parses_assignment_and_identifier_reference() {
        let span = parse_ok("x = 10\nx + 5");
        let Expr::Block(items) = &span.expr else { panic!("expected block") };
        assert_eq!(items.len(), 2);
        assert!(matches!(
            items[0].expr,
            Expr::Binary { op: BinaryOp::Assign, .. }
        ));
    }

    #[test]
    fn parses_if_else_chain() {
        let span = parse_ok("if 0 < 1 { 1 } else { 2 }");
        let Expr::Block(items) = &span.expr else { panic!("expected block") };
        assert!(matches!(items[0].expr, Expr::Binary { op: BinaryOp::Else, .. }));
    }

    #[test]
    fn parses_call_expression() {
        let span = parse_ok("f(4)");
        let Expr::Block(items) = &span.expr else { panic!("expected block") };
        assert!(matches!(items[0].expr, Expr::Binary { op: BinaryOp::Call, .. }));
    }

    #[test]
    fn unmatched_bracket_is_recorded_as_parse_error() {
        let (_, errors) = parse("(1 + 2");
        assert!(!errors.is_empty());
    }
}
