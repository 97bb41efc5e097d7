use canon_ast::{Context, ExprId, Operator};
use canon_numeric::{NumericValue, DEFAULT_PRECISION};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0, one_of},
    combinator::{map, not, opt, recognize},
    multi::{fold_many0, separated_list0},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

use crate::error::ParseError;

/// Names the parser maps to well-known constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Known {
    Pi,
    E,
    I,
    True,
    False,
    Infinity,
    ComplexInfinity,
    NaN,
}

// Intermediate tree; lowered into the context once parsing succeeded.
#[derive(Debug, Clone)]
enum ParseNode {
    Number(String),
    Text(String),
    Known(Known),
    Symbol(String),
    Add(Box<ParseNode>, Box<ParseNode>),
    Sub(Box<ParseNode>, Box<ParseNode>),
    Mul(Box<ParseNode>, Box<ParseNode>),
    Div(Box<ParseNode>, Box<ParseNode>),
    Pow(Box<ParseNode>, Box<ParseNode>),
    Neg(Box<ParseNode>),
    Call(String, Vec<ParseNode>),
    List(Vec<ParseNode>),
    Relation(Operator, Box<ParseNode>, Box<ParseNode>),
    And(Box<ParseNode>, Box<ParseNode>),
    Or(Box<ParseNode>, Box<ParseNode>),
    Not(Box<ParseNode>),
}

/// How parsed text becomes expression nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Turn single-letter identifiers (other than `e` and `i`) into `_x`
    /// wildcards, as the rule syntax does.
    pub wildcards: bool,
    /// Significant digits kept for decimal literals longer than a double holds.
    pub precision: u32,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            wildcards: false,
            precision: DEFAULT_PRECISION,
        }
    }
}

/// The three parts of `match -> replacement; condition`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleSyntax {
    pub pattern: ExprId,
    pub replacement: ExprId,
    pub condition: Option<ExprId>,
}

impl ParseNode {
    fn lower(self, ctx: &mut Context, options: &ParseOptions) -> Result<ExprId, ParseError> {
        let id = match self {
            ParseNode::Number(text) => number(ctx, &text, options)?,
            ParseNode::Text(s) => ctx.string(&s),
            ParseNode::Known(k) => match k {
                Known::Pi => ctx.pi(),
                Known::E => ctx.e(),
                Known::I => ctx.imaginary_unit(),
                Known::True => ctx.true_(),
                Known::False => ctx.false_(),
                Known::Infinity => ctx.positive_infinity(),
                Known::ComplexInfinity => ctx.complex_infinity(),
                Known::NaN => ctx.nan(),
            },
            ParseNode::Symbol(name) => {
                if options.wildcards && is_single_letter(&name) {
                    ctx.var(&format!("_{}", name))
                } else {
                    ctx.var(&name)
                }
            }
            ParseNode::Neg(inner) => match *inner {
                // `-3` is a literal, not `Negate(3)`
                ParseNode::Number(text) => number(ctx, &format!("-{}", text), options)?,
                other => {
                    let id = other.lower(ctx, options)?;
                    ctx.function(Operator::Negate, vec![id])
                }
            },
            ParseNode::Not(inner) => {
                let id = inner.lower(ctx, options)?;
                ctx.function(Operator::Not, vec![id])
            }
            ParseNode::Add(l, r) => binary(ctx, options, Operator::Add, *l, *r)?,
            ParseNode::Sub(l, r) => binary(ctx, options, Operator::Subtract, *l, *r)?,
            ParseNode::Mul(l, r) => binary(ctx, options, Operator::Multiply, *l, *r)?,
            ParseNode::Div(l, r) => binary(ctx, options, Operator::Divide, *l, *r)?,
            ParseNode::Pow(b, e) => binary(ctx, options, Operator::Power, *b, *e)?,
            ParseNode::And(l, r) => binary(ctx, options, Operator::And, *l, *r)?,
            ParseNode::Or(l, r) => binary(ctx, options, Operator::Or, *l, *r)?,
            ParseNode::Relation(op, l, r) => binary(ctx, options, op, *l, *r)?,
            ParseNode::List(items) => {
                let ids = lower_all(ctx, options, items)?;
                ctx.function(Operator::List, ids)
            }
            ParseNode::Call(name, args) => {
                let ids = lower_all(ctx, options, args)?;
                match function_operator(&name) {
                    Some(op) => ctx.function(op, ids),
                    None => ctx.call(&name, ids),
                }
            }
        };
        Ok(id)
    }
}

fn number(ctx: &mut Context, text: &str, options: &ParseOptions) -> Result<ExprId, ParseError> {
    let value = NumericValue::parse(text, options.precision)
        .map_err(|e| ParseError::NomError(e.to_string()))?;
    Ok(ctx.num(value))
}

fn binary(
    ctx: &mut Context,
    options: &ParseOptions,
    op: Operator,
    lhs: ParseNode,
    rhs: ParseNode,
) -> Result<ExprId, ParseError> {
    let l = lhs.lower(ctx, options)?;
    let r = rhs.lower(ctx, options)?;
    Ok(ctx.function(op, vec![l, r]))
}

fn lower_all(
    ctx: &mut Context,
    options: &ParseOptions,
    nodes: Vec<ParseNode>,
) -> Result<Vec<ExprId>, ParseError> {
    nodes.into_iter().map(|n| n.lower(ctx, options)).collect()
}

fn is_single_letter(name: &str) -> bool {
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphabetic())
}

/// Lower-case function names of the infix notation. Capitalized built-in
/// names (`Multiply(2, x)`) are accepted as well.
fn function_operator(name: &str) -> Option<Operator> {
    let op = match name {
        "sqrt" => Operator::Sqrt,
        "root" => Operator::Root,
        "exp" => Operator::Exp,
        "ln" => Operator::Ln,
        "log" => Operator::Log,
        "abs" => Operator::Abs,
        "conj" | "conjugate" => Operator::Conjugate,
        "sin" => Operator::Sin,
        "cos" => Operator::Cos,
        "tan" => Operator::Tan,
        "sinh" => Operator::Sinh,
        "cosh" => Operator::Cosh,
        "tanh" => Operator::Tanh,
        "arcsin" | "asin" => Operator::Arcsin,
        "arccos" | "acos" => Operator::Arccos,
        "arctan" | "atan" => Operator::Arctan,
        _ => return Operator::builtin(name),
    };
    Some(op)
}

fn keyword(name: &str) -> Option<ParseNode> {
    let known = match name {
        "pi" => Known::Pi,
        "e" => Known::E,
        "i" => Known::I,
        "true" => Known::True,
        "false" => Known::False,
        "oo" | "Infinity" => Known::Infinity,
        "ComplexInfinity" => Known::ComplexInfinity,
        "NaN" => Known::NaN,
        _ => return None,
    };
    Some(ParseNode::Known(known))
}

// Numeric literals: 12, 2.5, .5, 8., 1e-3
fn parse_number(input: &str) -> IResult<&str, ParseNode> {
    let mantissa = alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    ));
    let exponent = tuple((one_of("eE"), opt(one_of("+-")), digit1));
    map(recognize(pair(mantissa, opt(exponent))), |text: &str| {
        ParseNode::Number(text.to_string())
    })(input)
}

fn parse_string(input: &str) -> IResult<&str, ParseNode> {
    map(
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
        |s: &str| ParseNode::Text(s.to_string()),
    )(input)
}

// Identifiers start with a letter or underscore: x, x1, _a, __rest
fn parse_identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn parse_arguments(input: &str) -> IResult<&str, Vec<ParseNode>> {
    delimited(
        char('('),
        separated_list0(preceded(multispace0, char(',')), parse_logic),
        preceded(multispace0, char(')')),
    )(input)
}

// A call when the name is directly followed by `(`, else a constant or symbol
fn parse_name(input: &str) -> IResult<&str, ParseNode> {
    let (rest, name) = parse_identifier(input)?;
    if let Ok((rest, args)) = parse_arguments(rest) {
        return Ok((rest, ParseNode::Call(name.to_string(), args)));
    }
    let node = keyword(name).unwrap_or_else(|| ParseNode::Symbol(name.to_string()));
    Ok((rest, node))
}

fn parse_parens(input: &str) -> IResult<&str, ParseNode> {
    delimited(char('('), parse_logic, preceded(multispace0, char(')')))(input)
}

fn parse_abs(input: &str) -> IResult<&str, ParseNode> {
    map(
        delimited(char('|'), parse_expr, preceded(multispace0, char('|'))),
        |e| ParseNode::Call("abs".to_string(), vec![e]),
    )(input)
}

fn parse_list(input: &str) -> IResult<&str, ParseNode> {
    map(
        delimited(
            char('['),
            separated_list0(preceded(multispace0, char(',')), parse_logic),
            preceded(multispace0, char(']')),
        ),
        ParseNode::List,
    )(input)
}

fn parse_atom(input: &str) -> IResult<&str, ParseNode> {
    preceded(
        multispace0,
        alt((
            parse_number,
            parse_string,
            parse_name,
            parse_parens,
            parse_abs,
            parse_list,
        )),
    )(input)
}

fn parse_caret(input: &str) -> IResult<&str, char> {
    preceded(multispace0, char('^'))(input)
}

// Power is right-associative: 2^3^2 = 2^(3^2)
fn parse_power(input: &str) -> IResult<&str, ParseNode> {
    let (input, base) = parse_atom(input)?;
    match preceded(parse_caret, parse_exponent)(input) {
        Ok((rest, exp)) => Ok((rest, ParseNode::Pow(Box::new(base), Box::new(exp)))),
        Err(nom::Err::Error(_)) => Ok((input, base)),
        Err(e) => Err(e),
    }
}

// Exponents may carry a sign: x^-1
fn parse_exponent(input: &str) -> IResult<&str, ParseNode> {
    preceded(
        multispace0,
        alt((
            map(preceded(char('-'), parse_exponent), |e| {
                ParseNode::Neg(Box::new(e))
            }),
            preceded(char('+'), parse_exponent),
            parse_power,
        )),
    )(input)
}

fn parse_minus(input: &str) -> IResult<&str, char> {
    // `->` separates the two sides of a rule
    terminated(char('-'), not(char('>')))(input)
}

fn parse_unary(input: &str) -> IResult<&str, ParseNode> {
    preceded(
        multispace0,
        alt((
            map(preceded(parse_minus, parse_unary), |e| {
                ParseNode::Neg(Box::new(e))
            }),
            preceded(char('+'), parse_unary),
            parse_power,
        )),
    )(input)
}

fn allows_implicit_product(node: &ParseNode) -> bool {
    match node {
        ParseNode::Number(_) => true,
        ParseNode::Neg(inner) => allows_implicit_product(inner),
        _ => false,
    }
}

// A number directly followed by a name or parenthesis multiplies: 2x, 3(x+1)
fn parse_factor(input: &str) -> IResult<&str, ParseNode> {
    let (mut input, mut acc) = parse_unary(input)?;
    while allows_implicit_product(&acc)
        && input.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_' || c == '(')
    {
        let (rest, next) = parse_power(input)?;
        acc = ParseNode::Mul(Box::new(acc), Box::new(next));
        input = rest;
    }
    Ok((input, acc))
}

fn parse_term(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = parse_factor(input)?;
    fold_many0(
        pair(
            preceded(multispace0, alt((char('*'), char('/')))),
            parse_factor,
        ),
        move || init.clone(),
        |acc, (op, val)| match op {
            '*' => ParseNode::Mul(Box::new(acc), Box::new(val)),
            _ => ParseNode::Div(Box::new(acc), Box::new(val)),
        },
    )(input)
}

fn parse_expr(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = parse_term(input)?;
    fold_many0(
        pair(preceded(multispace0, alt((char('+'), parse_minus))), parse_term),
        move || init.clone(),
        |acc, (op, val)| match op {
            '+' => ParseNode::Add(Box::new(acc), Box::new(val)),
            _ => ParseNode::Sub(Box::new(acc), Box::new(val)),
        },
    )(input)
}

fn parse_relop(input: &str) -> IResult<&str, Operator> {
    preceded(
        multispace0,
        alt((
            map(tag("=="), |_| Operator::Equal),
            map(tag("!="), |_| Operator::NotEqual),
            map(tag("<="), |_| Operator::LessEqual),
            map(tag(">="), |_| Operator::GreaterEqual),
            map(char('<'), |_| Operator::Less),
            map(char('>'), |_| Operator::Greater),
            map(char('='), |_| Operator::Equal),
        )),
    )(input)
}

fn parse_relation(input: &str) -> IResult<&str, ParseNode> {
    let (input, lhs) = parse_expr(input)?;
    match pair(parse_relop, parse_expr)(input) {
        Ok((rest, (op, rhs))) => Ok((
            rest,
            ParseNode::Relation(op, Box::new(lhs), Box::new(rhs)),
        )),
        Err(nom::Err::Error(_)) => Ok((input, lhs)),
        Err(e) => Err(e),
    }
}

fn parse_not(input: &str) -> IResult<&str, ParseNode> {
    preceded(
        multispace0,
        alt((
            map(
                preceded(terminated(char('!'), not(char('='))), parse_not),
                |e| ParseNode::Not(Box::new(e)),
            ),
            parse_relation,
        )),
    )(input)
}

fn parse_and(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = parse_not(input)?;
    fold_many0(
        preceded(preceded(multispace0, tag("&&")), parse_not),
        move || init.clone(),
        |acc, val| ParseNode::And(Box::new(acc), Box::new(val)),
    )(input)
}

fn parse_logic(input: &str) -> IResult<&str, ParseNode> {
    let (input, init) = parse_and(input)?;
    fold_many0(
        preceded(preceded(multispace0, tag("||")), parse_and),
        move || init.clone(),
        |acc, val| ParseNode::Or(Box::new(acc), Box::new(val)),
    )(input)
}

fn parse_arrow(input: &str) -> IResult<&str, &str> {
    preceded(multispace0, tag("->"))(input)
}

fn parse_condition(input: &str) -> IResult<&str, Option<ParseNode>> {
    opt(preceded(preceded(multispace0, char(';')), parse_logic))(input)
}

fn nom_error(e: nom::Err<nom::error::Error<&str>>) -> ParseError {
    ParseError::NomError(format!("{}", e))
}

fn expect_end(remaining: &str) -> Result<(), ParseError> {
    let remaining = remaining.trim();
    if remaining.is_empty() {
        Ok(())
    } else {
        Err(ParseError::UnconsumedInput(remaining.to_string()))
    }
}

/// Parse infix text into raw (non-canonical) nodes.
pub fn parse(input: &str, ctx: &mut Context) -> Result<ExprId, ParseError> {
    parse_with(input, ctx, &ParseOptions::default())
}

pub fn parse_with(
    input: &str,
    ctx: &mut Context,
    options: &ParseOptions,
) -> Result<ExprId, ParseError> {
    let (remaining, node) = parse_logic(input).map_err(nom_error)?;
    expect_end(remaining)?;
    node.lower(ctx, options)
}

/// Parse `match -> replacement` with an optional `; condition`.
///
/// Single-letter identifiers other than `e` and `i` become wildcards on all
/// three sides, so `a*x -> 2*x; x > 0` reads as `_a*_x -> 2*_x; _x > 0`.
pub fn parse_rule(input: &str, ctx: &mut Context) -> Result<RuleSyntax, ParseError> {
    let options = ParseOptions {
        wildcards: true,
        ..ParseOptions::default()
    };
    let (rest, pattern) = parse_logic(input).map_err(nom_error)?;
    let rest = match parse_arrow(rest) {
        Ok((rest, _)) => rest,
        Err(_) => {
            return Err(ParseError::MalformedRule(format!(
                "expected `->` in {:?}",
                input
            )))
        }
    };
    let (rest, replacement) = parse_logic(rest).map_err(nom_error)?;
    let (rest, condition) = parse_condition(rest).map_err(nom_error)?;
    expect_end(rest)?;

    let pattern = pattern.lower(ctx, &options)?;
    let replacement = replacement.lower(ctx, &options)?;
    let condition = match condition {
        Some(c) => Some(c.lower(ctx, &options)?),
        None => None,
    };
    Ok(RuleSyntax {
        pattern,
        replacement,
        condition,
    })
}
