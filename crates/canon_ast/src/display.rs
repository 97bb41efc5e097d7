//! Infix rendering for diagnostics and tests.
//!
//! Not a serializer: the output is meant for humans and for the parser's rule
//! syntax (`x^2 + 2*x + 1`, `sin(x)/cos(x)`, `f(x, y)`).

use crate::context::Context;
use crate::expr::{Expr, ExprId};
use crate::operator::Operator;
use std::fmt;

pub struct DisplayExpr<'a> {
    pub context: &'a Context,
    pub id: ExprId,
}

impl Context {
    pub fn display(&self, id: ExprId) -> DisplayExpr<'_> {
        DisplayExpr { context: self, id }
    }
}

impl fmt::Display for DisplayExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self.context, self.id)
    }
}

const PREC_RELATION: u8 = 0;
const PREC_SUM: u8 = 1;
const PREC_PRODUCT: u8 = 2;
const PREC_UNARY: u8 = 3;
const PREC_POWER: u8 = 4;
const PREC_ATOM: u8 = 5;

fn precedence(ctx: &Context, id: ExprId) -> u8 {
    match ctx.get(id) {
        Expr::Number(n) => {
            if n.is_negative() {
                PREC_UNARY
            } else if (n.is_exact() && !n.is_integer()) || n.is_complex() {
                PREC_PRODUCT
            } else {
                PREC_ATOM
            }
        }
        Expr::Function(op, ops) => match op {
            Operator::Add | Operator::Subtract => PREC_SUM,
            Operator::Multiply | Operator::Divide => PREC_PRODUCT,
            Operator::Negate => PREC_UNARY,
            Operator::Power => PREC_POWER,
            op if op.is_relational() && ops.len() == 2 => PREC_RELATION,
            _ => PREC_ATOM,
        },
        _ => PREC_ATOM,
    }
}

fn write_child(f: &mut fmt::Formatter<'_>, ctx: &Context, id: ExprId, min: u8) -> fmt::Result {
    if precedence(ctx, id) < min {
        write!(f, "(")?;
        write_expr(f, ctx, id)?;
        write!(f, ")")
    } else {
        write_expr(f, ctx, id)
    }
}

fn relation_symbol(op: Operator) -> &'static str {
    match op {
        Operator::Equal => "==",
        Operator::NotEqual => "!=",
        Operator::Less => "<",
        Operator::LessEqual => "<=",
        Operator::Greater => ">",
        _ => ">=",
    }
}

fn write_expr(f: &mut fmt::Formatter<'_>, ctx: &Context, id: ExprId) -> fmt::Result {
    match ctx.get(id) {
        Expr::Number(n) => write!(f, "{}", n),
        Expr::Symbol(s) => write!(f, "{}", ctx.symbol_name(*s)),
        Expr::String(s) => write!(f, "{:?}", s),
        Expr::Dictionary(entries) => {
            write!(f, "{{")?;
            for (i, (k, v)) in entries.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:?}: ", k)?;
                write_expr(f, ctx, *v)?;
            }
            write!(f, "}}")
        }
        Expr::Function(op, ops) => write_function(f, ctx, *op, ops),
    }
}

fn write_function(
    f: &mut fmt::Formatter<'_>,
    ctx: &Context,
    op: Operator,
    ops: &[ExprId],
) -> fmt::Result {
    match (op, ops) {
        (Operator::Add, [first, rest @ ..]) => {
            write_child(f, ctx, *first, PREC_SUM)?;
            for &term in rest {
                match negated_term(ctx, term) {
                    Some(Negated::Operand(inner)) => {
                        write!(f, " - ")?;
                        write_child(f, ctx, inner, PREC_PRODUCT)?;
                    }
                    Some(Negated::Number(text)) => write!(f, " - {}", text)?,
                    None => {
                        write!(f, " + ")?;
                        write_child(f, ctx, term, PREC_SUM)?;
                    }
                }
            }
            Ok(())
        }
        (Operator::Subtract, [a, b]) => {
            write_child(f, ctx, *a, PREC_SUM)?;
            write!(f, " - ")?;
            write_child(f, ctx, *b, PREC_PRODUCT)
        }
        (Operator::Multiply, [first, rest @ ..]) => {
            write_child(f, ctx, *first, PREC_PRODUCT)?;
            for &factor in rest {
                write!(f, "*")?;
                write_child(f, ctx, factor, PREC_POWER)?;
            }
            Ok(())
        }
        (Operator::Divide, [a, b]) => {
            write_child(f, ctx, *a, PREC_PRODUCT)?;
            write!(f, "/")?;
            write_child(f, ctx, *b, PREC_POWER)
        }
        (Operator::Negate, [a]) => {
            write!(f, "-")?;
            write_child(f, ctx, *a, PREC_POWER)
        }
        (Operator::Power, [base, exp]) => {
            write_child(f, ctx, *base, PREC_ATOM)?;
            write!(f, "^")?;
            write_child(f, ctx, *exp, PREC_ATOM)
        }
        (op, [a, b]) if op.is_relational() => {
            write_child(f, ctx, *a, PREC_SUM)?;
            write!(f, " {} ", relation_symbol(op))?;
            write_child(f, ctx, *b, PREC_SUM)
        }
        (op, ops) => {
            let name = ctx.operator_name(op);
            match op {
                Operator::Sqrt => write!(f, "sqrt(")?,
                Operator::Root => write!(f, "root(")?,
                Operator::Abs => write!(f, "|")?,
                _ => write!(f, "{}(", name)?,
            }
            for (i, &arg) in ops.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write_expr(f, ctx, arg)?;
            }
            if op == Operator::Abs {
                write!(f, "|")
            } else {
                write!(f, ")")
            }
        }
    }
}

enum Negated {
    Operand(ExprId),
    Number(String),
}

/// Terms rendered as subtraction inside a sum.
fn negated_term(ctx: &Context, id: ExprId) -> Option<Negated> {
    match ctx.get(id) {
        Expr::Function(Operator::Negate, ops) if ops.len() == 1 => Some(Negated::Operand(ops[0])),
        Expr::Number(n) if n.is_negative() => Some(Negated::Number(n.neg().to_string())),
        _ => None,
    }
}
