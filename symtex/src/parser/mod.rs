//! Markup parsing.
//!
//! The pest grammar recognizes the displayed-math subset the engine
//! consumes; the builders here lower the parse tree into graph nodes.
//! Chains (comma, sum, product) come out flat, single-element chains
//! collapse to their only element, and scripts become five-slot index
//! nodes.

use pest::iterators::Pair;
use pest::Parser as _;
use pest_derive::Parser;

use crate::error::SymtexError;
use crate::limits::ResourceLimits;
use crate::notation::{Head, Notation, Term, TermNode};
use crate::value::Value;
use crate::SymtexResult;

#[derive(Parser)]
#[grammar = "src/parser/symtex.pest"]
struct MarkupParser;

/// Parses `input` into a fresh notation, returning the root term.
pub fn parse(input: &str, limits: &ResourceLimits) -> SymtexResult<(Term, Notation)> {
    let mut notation = Notation::new();
    let root = parse_into(input, limits, &mut notation)?;
    Ok((root, notation))
}

/// Parses `input`, registering nodes in the supplied notation.
pub fn parse_into(
    input: &str,
    limits: &ResourceLimits,
    notation: &mut Notation,
) -> SymtexResult<Term> {
    if input.len() > limits.max_input_bytes {
        return Err(SymtexError::InputTooLarge {
            actual: input.len(),
            limit: limits.max_input_bytes,
        });
    }
    let mut pairs =
        MarkupParser::parse(Rule::formula, input).map_err(convert_error)?;
    let formula = pairs
        .next()
        .ok_or_else(|| SymtexError::engine("empty parse result"))?;
    let statement = formula
        .into_inner()
        .find(|p| p.as_rule() == Rule::statement)
        .ok_or_else(|| SymtexError::engine("formula without statement"))?;
    build_statement(statement, notation)
}

fn convert_error(e: pest::error::Error<Rule>) -> SymtexError {
    let (line, col) = match e.line_col {
        pest::error::LineColLocation::Pos((l, c)) => (l, c),
        pest::error::LineColLocation::Span((l, c), _) => (l, c),
    };
    SymtexError::parse(e.variant.message().to_string(), line, col)
}

fn build_statement(pair: Pair<Rule>, n: &mut Notation) -> SymtexResult<Term> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| SymtexError::engine("empty statement"))?;
    match inner.as_rule() {
        Rule::command_form => build_command(inner, n),
        Rule::subformula => build_subformula(inner, n),
        other => Err(SymtexError::engine(format!("unexpected rule {other:?}"))),
    }
}

fn build_command(pair: Pair<Rule>, n: &mut Notation) -> SymtexResult<Term> {
    let mut inner = pair.into_inner();
    let name = inner
        .next()
        .ok_or_else(|| SymtexError::engine("command without name"))?
        .as_str()
        .to_string();
    // Slot 0 always holds the attribute list, empty when absent.
    let mut args = vec![Term::Empty];
    for p in inner {
        match p.as_rule() {
            Rule::attr_block => {
                if let Some(cl) = p.into_inner().next() {
                    args[0] = build_comma_list(cl, n)?;
                }
            }
            Rule::command_args => {
                for sf in p.into_inner() {
                    args.push(build_subformula(sf, n)?);
                }
            }
            _ => {}
        }
    }
    Ok(n.define_node(TermNode::new(Head::op(name), args)))
}

fn build_subformula(pair: Pair<Rule>, n: &mut Notation) -> SymtexResult<Term> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| SymtexError::engine("empty subformula"))?;
    match inner.as_rule() {
        Rule::negation => {
            let body = inner
                .into_inner()
                .next()
                .ok_or_else(|| SymtexError::engine("empty negation"))?;
            let t = build_subformula(body, n)?;
            Ok(n.define(Head::Negation, vec![t]))
        }
        Rule::comparison => {
            let mut parts = inner.into_inner();
            let lhs_pair = parts
                .next()
                .ok_or_else(|| SymtexError::engine("comparison without lhs"))?;
            let op = parts
                .next()
                .ok_or_else(|| SymtexError::engine("comparison without operator"))?
                .as_str()
                .to_string();
            let rhs_pair = parts
                .next()
                .ok_or_else(|| SymtexError::engine("comparison without rhs"))?;
            let lhs = build_additive(lhs_pair, n)?;
            let rhs = build_comma_list(rhs_pair, n)?;
            let node = TermNode::new(Head::Comparison, vec![lhs, rhs]).with_prop("op", op);
            Ok(n.define_node(node))
        }
        Rule::comma_list => build_comma_list(inner, n),
        other => Err(SymtexError::engine(format!("unexpected rule {other:?}"))),
    }
}

fn build_comma_list(pair: Pair<Rule>, n: &mut Notation) -> SymtexResult<Term> {
    let mut elems = Vec::new();
    for p in pair.into_inner() {
        elems.push(build_additive(p, n)?);
    }
    match elems.len() {
        0 => Err(SymtexError::engine("empty comma list")),
        1 => Ok(elems.pop().unwrap_or(Term::Empty)),
        _ => Ok(n.define(Head::CommaList, elems)),
    }
}

fn build_additive(pair: Pair<Rule>, n: &mut Notation) -> SymtexResult<Term> {
    let mut operands: Vec<(Option<char>, Term)> = Vec::new();
    let mut pending: Option<char> = None;
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::sign => pending = p.as_str().chars().next(),
            Rule::composite => {
                let t = build_composite(p, n)?;
                operands.push((pending.take(), t));
            }
            _ => {}
        }
    }
    let wrap = |n: &mut Notation, sign: char, t: Term| {
        let head = if sign == '-' { Head::Minus } else { Head::Plus };
        n.define(head, vec![t])
    };
    if operands.len() == 1 {
        let (sign, t) = operands.remove(0);
        return Ok(match sign {
            Some(s) => wrap(n, s, t),
            None => t,
        });
    }
    let mut elems = Vec::with_capacity(operands.len());
    for (i, (sign, t)) in operands.into_iter().enumerate() {
        match sign {
            Some(s) => elems.push(wrap(n, s, t)),
            None if i == 0 => elems.push(t),
            None => return Err(SymtexError::engine("sum operand without sign")),
        }
    }
    Ok(n.define(Head::SumList, elems))
}

fn build_composite(pair: Pair<Rule>, n: &mut Notation) -> SymtexResult<Term> {
    let mut inner = pair.into_inner();
    let first = inner
        .next()
        .ok_or_else(|| SymtexError::engine("empty composite"))?;
    let mut left = build_product(first, n)?;
    while let Some(op) = inner.next() {
        let right = inner
            .next()
            .ok_or_else(|| SymtexError::engine("dangling multiplication operator"))?;
        let right = build_product(right, n)?;
        let head = if op.as_str() == "/" { Head::Slash } else { Head::Star };
        left = n.define(head, vec![left, right]);
    }
    Ok(left)
}

fn build_product(pair: Pair<Rule>, n: &mut Notation) -> SymtexResult<Term> {
    let mut factors = Vec::new();
    for p in pair.into_inner() {
        factors.push(build_expression(p, n)?);
    }
    match factors.len() {
        0 => Err(SymtexError::engine("empty product")),
        1 => Ok(factors.pop().unwrap_or(Term::Empty)),
        _ => Ok(n.define(Head::ProductList, factors)),
    }
}

fn build_expression(pair: Pair<Rule>, n: &mut Notation) -> SymtexResult<Term> {
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| SymtexError::engine("empty expression"))?;
    match inner.as_rule() {
        Rule::ellipsis => Ok(Term::sym(inner.as_str())),
        Rule::binary_op => {
            let mut parts = inner.into_inner();
            let name = parts
                .next()
                .ok_or_else(|| SymtexError::engine("operator without name"))?
                .as_str()
                .to_string();
            let a = parts
                .next()
                .map(|p| build_expression(p, n))
                .transpose()?
                .ok_or_else(|| SymtexError::engine("operator without first operand"))?;
            let b = parts
                .next()
                .map(|p| build_expression(p, n))
                .transpose()?
                .ok_or_else(|| SymtexError::engine("operator without second operand"))?;
            Ok(n.define_node(TermNode::new(Head::op(name), vec![a, b])))
        }
        Rule::unary_op => {
            let mut parts = inner.into_inner();
            let name = parts
                .next()
                .ok_or_else(|| SymtexError::engine("operator without name"))?
                .as_str()
                .to_string();
            let a = parts
                .next()
                .map(|p| build_expression(p, n))
                .transpose()?
                .ok_or_else(|| SymtexError::engine("operator without operand"))?;
            Ok(n.define_node(TermNode::new(Head::op(name), vec![a])))
        }
        Rule::text_node => {
            let mut parts = inner.into_inner();
            let name = parts
                .next()
                .ok_or_else(|| SymtexError::engine("text without style name"))?
                .as_str()
                .to_string();
            let body = parts.next().map(|p| p.as_str().to_string()).unwrap_or_default();
            Ok(n.define_node(TermNode::new(Head::op(name), vec![Term::Text(body)])))
        }
        Rule::operatorname => {
            let mut parts = inner.into_inner();
            let name = parts
                .next()
                .ok_or_else(|| SymtexError::engine("operatorname without name"))?
                .as_str()
                .to_string();
            let args_pair = parts
                .next()
                .ok_or_else(|| SymtexError::engine("operatorname without arguments"))?;
            let args = build_comma_list(args_pair, n)?;
            let node = TermNode::new(Head::Apply, vec![Term::sym(name), args])
                .with_prop("fmt", "operatorname");
            Ok(n.define_node(node))
        }
        Rule::style => Ok(Term::sym(inner.as_str())),
        Rule::scripted => build_scripted(inner, n),
        other => Err(SymtexError::engine(format!("unexpected rule {other:?}"))),
    }
}

fn build_scripted(pair: Pair<Rule>, n: &mut Notation) -> SymtexResult<Term> {
    let mut parts = pair.into_inner();
    let base = parts
        .next()
        .map(|p| build_scalar(p, n))
        .transpose()?
        .ok_or_else(|| SymtexError::engine("scripted expression without base"))?;
    let Some(script) = parts.next() else {
        return Ok(base);
    };
    let variant = script
        .into_inner()
        .next()
        .ok_or_else(|| SymtexError::engine("empty script"))?;
    let sup_first = variant.as_rule() == Rule::sup_first;
    let mut script_args = variant.into_inner();
    let first = script_args
        .next()
        .map(|p| build_script_arg(p, n))
        .transpose()?
        .ok_or_else(|| SymtexError::engine("script without argument"))?;
    let second = script_args
        .next()
        .map(|p| build_script_arg(p, n))
        .transpose()?
        .unwrap_or(Term::Empty);
    let (sup, sub) = if sup_first { (first, second) } else { (second, first) };
    Ok(n.define(Head::Index, vec![base, Term::Empty, Term::Empty, sup, sub]))
}

fn build_script_arg(pair: Pair<Rule>, n: &mut Notation) -> SymtexResult<Term> {
    let scalar = pair
        .into_inner()
        .next()
        .ok_or_else(|| SymtexError::engine("empty script argument"))?;
    build_scalar(scalar, n)
}

fn build_scalar(pair: Pair<Rule>, n: &mut Notation) -> SymtexResult<Term> {
    let (line, col) = pair.as_span().start_pos().line_col();
    let inner = pair
        .into_inner()
        .next()
        .ok_or_else(|| SymtexError::engine("empty scalar"))?;
    match inner.as_rule() {
        Rule::number => Value::from_literal(inner.as_str())
            .map(Term::Num)
            .ok_or_else(|| SymtexError::parse("numeric literal out of range", line, col)),
        Rule::backref => {
            let index = inner
                .into_inner()
                .next()
                .and_then(|p| p.as_str().parse::<i64>().ok())
                .ok_or_else(|| SymtexError::parse("malformed back-reference", line, col))?;
            Ok(n.define(Head::BackRef, vec![Term::int(index)]))
        }
        Rule::paren_group => {
            let body = inner
                .into_inner()
                .next()
                .map(|p| build_comma_list(p, n))
                .transpose()?
                .ok_or_else(|| SymtexError::parse("empty parentheses", line, col))?;
            Ok(n.define_node(TermNode::new(Head::Group, vec![body]).with_prop("br", "()")))
        }
        Rule::brace_group => {
            let body = inner
                .into_inner()
                .next()
                .map(|p| build_statement(p, n))
                .transpose()?
                .ok_or_else(|| SymtexError::parse("empty braces", line, col))?;
            Ok(n.define_node(TermNode::new(Head::Group, vec![body]).with_prop("br", "{}")))
        }
        Rule::vert_group => {
            let body = inner
                .into_inner()
                .next()
                .map(|p| build_additive(p, n))
                .transpose()?
                .ok_or_else(|| SymtexError::parse("empty bars", line, col))?;
            Ok(n.define_node(TermNode::new(Head::Group, vec![body]).with_prop("br", "||")))
        }
        Rule::literal => Ok(Term::sym(inner.as_str())),
        other => Err(SymtexError::engine(format!("unexpected rule {other:?}"))),
    }
}
