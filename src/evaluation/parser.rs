//! Grammar-driven parser for infix arithmetic
//!
//! The grammar lives in `arithmetic.pest`; pest produces the parse tree and
//! this module lowers it into an [`Ast`] of two-operand nodes. Unary minus
//! applied to a literal folds into the literal; applied to anything else it
//! becomes `0 - x` so every interior node maps onto exactly one task.

use super::EvalError;
use crate::tasks::Operation;
use pest::error::{Error as PestError, InputLocation};
use pest::iterators::Pair;
use pest::Parser;

/// Deepest parenthesis nesting accepted
pub const MAX_NESTING: usize = 128;

/// Most binary operations a single expression may contain
pub const MAX_OPERATIONS: usize = 1024;

#[derive(pest_derive::Parser)]
#[grammar = "evaluation/arithmetic.pest"]
struct FormulaParser;

/// Parsed arithmetic expression
#[derive(Debug, Clone, PartialEq)]
pub enum Ast {
    Number(f64),
    Binary {
        operation: Operation,
        lhs: Box<Ast>,
        rhs: Box<Ast>,
    },
}

impl Ast {
    fn binary(operation: Operation, lhs: Ast, rhs: Ast) -> Self {
        Ast::Binary {
            operation,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Number of binary operations, i.e. the number of tasks this tree plans into
    pub fn operation_count(&self) -> usize {
        match self {
            Ast::Number(_) => 0,
            Ast::Binary { lhs, rhs, .. } => 1 + lhs.operation_count() + rhs.operation_count(),
        }
    }
}

/// Parse a textual expression into an [`Ast`]
pub fn parse(input: &str) -> Result<Ast, EvalError> {
    if input.trim().is_empty() {
        return Err(EvalError::parse("empty expression", 0));
    }
    check_nesting(input)?;

    let expr = FormulaParser::parse(Rule::formula, input)
        .map_err(|e| syntax_error(input, e))?
        .next()
        .and_then(|formula| formula.into_inner().next())
        .ok_or_else(|| EvalError::parse("empty expression", 0))?;

    Lowering::default().chain(expr)
}

/// Reject deep parenthesis nesting before the recursive grammar sees it
fn check_nesting(input: &str) -> Result<(), EvalError> {
    let mut depth = 0usize;
    for (offset, c) in input.char_indices() {
        match c {
            '(' => {
                depth += 1;
                if depth > MAX_NESTING {
                    return Err(EvalError::parse("expression is nested too deeply", offset));
                }
            }
            ')' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    Ok(())
}

fn syntax_error(input: &str, err: PestError<Rule>) -> EvalError {
    let position = match err.location {
        InputLocation::Pos(pos) => pos,
        InputLocation::Span((start, _)) => start,
    };
    let found = match input.get(position..).and_then(|rest| rest.chars().next()) {
        Some(c) => format!("unexpected character '{c}'"),
        None => "unexpected end of expression".to_string(),
    };

    let err = err.renamed_rules(|rule| {
        let name = match rule {
            Rule::additive | Rule::multiplicative => "operator",
            Rule::sign => "sign",
            Rule::number => "number",
            Rule::EOI => "end of expression",
            _ => "expression",
        };
        name.to_string()
    });
    EvalError::parse(format!("{found}; {}", err.variant.message()), position)
}

#[derive(Default)]
struct Lowering {
    operations: usize,
}

impl Lowering {
    /// Lower `expr` or `term`: an operand followed by operator/operand pairs
    fn chain(&mut self, pair: Pair<'_, Rule>) -> Result<Ast, EvalError> {
        let start = pair.as_span().start();
        let mut inner = pair.into_inner();
        let first = inner.next().ok_or_else(|| malformed(start))?;
        let mut lhs = self.operand(first)?;

        while let Some(op) = inner.next() {
            let offset = op.as_span().start();
            let operation = operator(&op)?;
            let rhs = inner.next().ok_or_else(|| malformed(offset))?;
            let rhs = self.operand(rhs)?;
            lhs = self.combine(operation, lhs, rhs, offset)?;
        }
        Ok(lhs)
    }

    fn operand(&mut self, pair: Pair<'_, Rule>) -> Result<Ast, EvalError> {
        match pair.as_rule() {
            Rule::expr | Rule::term => self.chain(pair),
            Rule::unary => self.unary(pair),
            Rule::number => number(&pair),
            _ => Err(malformed(pair.as_span().start())),
        }
    }

    fn unary(&mut self, pair: Pair<'_, Rule>) -> Result<Ast, EvalError> {
        let start = pair.as_span().start();
        let mut signs = Vec::new();
        let mut operand = None;

        for inner in pair.into_inner() {
            match inner.as_rule() {
                Rule::sign => signs.push((inner.as_str() == "-", inner.as_span().start())),
                _ => operand = Some(self.operand(inner)?),
            }
        }

        // Innermost sign applies first
        let mut ast = operand.ok_or_else(|| malformed(start))?;
        for (negate, offset) in signs.into_iter().rev() {
            if !negate {
                continue;
            }
            ast = match ast {
                Ast::Number(n) => Ast::Number(-n),
                other => self.combine(Operation::Subtract, Ast::Number(0.0), other, offset)?,
            };
        }
        Ok(ast)
    }

    fn combine(
        &mut self,
        op: Operation,
        lhs: Ast,
        rhs: Ast,
        offset: usize,
    ) -> Result<Ast, EvalError> {
        self.operations += 1;
        if self.operations > MAX_OPERATIONS {
            return Err(EvalError::parse(
                format!("expression has more than {MAX_OPERATIONS} operations"),
                offset,
            ));
        }
        Ok(Ast::binary(op, lhs, rhs))
    }
}

fn operator(pair: &Pair<'_, Rule>) -> Result<Operation, EvalError> {
    pair.as_str()
        .chars()
        .next()
        .and_then(Operation::from_symbol)
        .ok_or_else(|| malformed(pair.as_span().start()))
}

fn number(pair: &Pair<'_, Rule>) -> Result<Ast, EvalError> {
    let literal = pair.as_str();
    let offset = pair.as_span().start();
    match literal.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Ast::Number(value)),
        Ok(_) => Err(EvalError::parse(
            format!("number '{literal}' is out of range"),
            offset,
        )),
        Err(_) => Err(EvalError::parse(
            format!("malformed number '{literal}'"),
            offset,
        )),
    }
}

fn malformed(offset: usize) -> EvalError {
    EvalError::parse("malformed parse tree", offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Ast {
        Ast::Number(n)
    }

    #[test]
    fn test_precedence() {
        let ast = parse("2 + 3 * 4").unwrap();
        assert_eq!(
            ast,
            Ast::binary(
                Operation::Add,
                num(2.0),
                Ast::binary(Operation::Multiply, num(3.0), num(4.0))
            )
        );
    }

    #[test]
    fn test_left_associativity() {
        let ast = parse("8 - 4 - 2").unwrap();
        assert_eq!(
            ast,
            Ast::binary(
                Operation::Subtract,
                Ast::binary(Operation::Subtract, num(8.0), num(4.0)),
                num(2.0)
            )
        );
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let ast = parse("(2 + 3) * 4").unwrap();
        assert_eq!(ast.operation_count(), 2);
        assert!(matches!(
            ast,
            Ast::Binary {
                operation: Operation::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn test_unary_minus_folds_into_literal() {
        assert_eq!(parse("-3").unwrap(), num(-3.0));
        assert_eq!(parse("--3").unwrap(), num(3.0));
        assert_eq!(parse("+3").unwrap(), num(3.0));
    }

    #[test]
    fn test_unary_minus_on_group_becomes_subtraction() {
        let ast = parse("-(1 + 2)").unwrap();
        assert_eq!(
            ast,
            Ast::binary(
                Operation::Subtract,
                num(0.0),
                Ast::binary(Operation::Add, num(1.0), num(2.0))
            )
        );
    }

    #[test]
    fn test_decimal_and_exponent_literals() {
        assert_eq!(parse("1.5").unwrap(), num(1.5));
        assert_eq!(parse("2e3").unwrap(), num(2000.0));
        assert_eq!(parse("2.5E-1").unwrap(), num(0.25));
    }

    #[test]
    fn test_empty_input_rejected() {
        assert!(matches!(parse(""), Err(EvalError::Parse { .. })));
        assert!(matches!(parse("   "), Err(EvalError::Parse { .. })));
    }

    #[test]
    fn test_dangling_operator_rejected() {
        let err = parse("2 + ").unwrap_err();
        assert!(matches!(err, EvalError::Parse { position: 4, .. }));
    }

    #[test]
    fn test_unbalanced_parentheses_rejected() {
        assert!(parse("(1 + 2").is_err());
        assert!(parse("1 + 2)").is_err());
        assert!(parse("()").is_err());
    }

    #[test]
    fn test_syntax_error_reports_position() {
        let err = parse("(1 + 2").unwrap_err();
        assert!(matches!(err, EvalError::Parse { position: 6, .. }));
        assert!(err.to_string().contains("unexpected end of expression"));

        let err = parse("1 + * 2").unwrap_err();
        assert!(matches!(err, EvalError::Parse { position: 4, .. }));
    }

    #[test]
    fn test_long_sign_runs_parse() {
        let input = format!("{}3", "-".repeat(1_000));
        assert_eq!(parse(&input).unwrap(), num(3.0));
    }

    #[test]
    fn test_unknown_character_rejected() {
        let err = parse("2 ^ 3").unwrap_err();
        assert!(err.to_string().contains('^'));
    }

    #[test]
    fn test_malformed_number_rejected() {
        assert!(parse("1.2.3").is_err());
        assert!(parse(".").is_err());
    }

    #[test]
    fn test_out_of_range_literal_rejected() {
        assert!(parse("1e999").is_err());
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let input = format!("{}1{}", "(".repeat(MAX_NESTING + 1), ")".repeat(MAX_NESTING + 1));
        let err = parse(&input).unwrap_err();
        assert!(err.to_string().contains("nested too deeply"));

        let ok = format!("{}1{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(parse(&ok).unwrap(), num(1.0));
    }

    #[test]
    fn test_operation_limit() {
        let at_limit = vec!["1"; MAX_OPERATIONS + 1].join("+");
        assert_eq!(parse(&at_limit).unwrap().operation_count(), MAX_OPERATIONS);

        let over_limit = vec!["1"; MAX_OPERATIONS + 2].join("+");
        assert!(parse(&over_limit).is_err());
    }

    #[test]
    fn test_adjacent_numbers_rejected() {
        assert!(matches!(parse("1 2"), Err(EvalError::Parse { .. })));
    }
}
