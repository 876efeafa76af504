use core::fmt;
use std::cmp::Ordering;

use crate::value::Datum;

// Parsed filter expression, before binding
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Comparison {
        op: ComparisonOperator,
        left: Operand,
        right: Operand,
    },
    // operand [NOT] BETWEEN lower AND upper
    Between {
        operand: Operand,
        lower: Operand,
        upper: Operand,
        negated: bool,
    },
    Logical {
        op: LogicalOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    Not(Box<Expression>),
}

impl Expression {
    pub fn and(left: Expression, right: Expression) -> Self {
        Expression::Logical {
            op: LogicalOperator::And,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Expression::Logical {
            op: LogicalOperator::Or,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn negate(inner: Expression) -> Self {
        Expression::Not(Box::new(inner))
    }

    /// Visits every operand in textual order.
    pub fn operands(&self) -> Vec<&Operand> {
        let mut operands = Vec::new();
        self.collect_operands(&mut operands);
        operands
    }

    fn collect_operands<'a>(&'a self, operands: &mut Vec<&'a Operand>) {
        match self {
            Expression::Comparison { left, right, .. } => {
                operands.push(left);
                operands.push(right);
            }
            Expression::Between {
                operand,
                lower,
                upper,
                ..
            } => {
                operands.push(operand);
                operands.push(lower);
                operands.push(upper);
            }
            Expression::Logical { left, right, .. } => {
                left.collect_operands(operands);
                right.collect_operands(operands);
            }
            Expression::Not(inner) => inner.collect_operands(operands),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Field(FieldName),
    Literal { value: Datum, position: usize },
    // %n
    Parameter { index: usize, position: usize },
}

impl Operand {
    pub fn position(&self) -> usize {
        match self {
            Operand::Field(name) => name.position(),
            Operand::Literal { position, .. } | Operand::Parameter { position, .. } => *position,
        }
    }
}

// Dotted and indexed member path: a.b[0].c
#[derive(Debug, Clone, PartialEq)]
pub struct FieldName {
    pub segments: Vec<PathSegment>,
}

impl FieldName {
    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    pub fn position(&self) -> usize {
        self.segments.first().map_or(0, |segment| segment.position)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathSegment {
    pub name: String,
    pub position: usize,
    pub subscripts: Vec<Subscript>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Subscript {
    pub index: usize,
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ComparisonOperator {
    #[strum(serialize = "=")]
    Equal,
    #[strum(serialize = "<>")]
    NotEqual,
    #[strum(serialize = "<")]
    LessThan,
    #[strum(serialize = "<=")]
    LessThanEqual,
    #[strum(serialize = ">")]
    GreaterThan,
    #[strum(serialize = ">=")]
    GreaterThanEqual,
    #[strum(serialize = "LIKE")]
    Like,
    #[strum(serialize = "MATCH")]
    Match,
}

impl ComparisonOperator {
    /// Whether an ordering satisfies a relational operator. Pattern operators
    /// are decided by their compiled pattern and never accept an ordering.
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            ComparisonOperator::Equal => ordering == Ordering::Equal,
            ComparisonOperator::NotEqual => ordering != Ordering::Equal,
            ComparisonOperator::LessThan => ordering == Ordering::Less,
            ComparisonOperator::LessThanEqual => ordering != Ordering::Greater,
            ComparisonOperator::GreaterThan => ordering == Ordering::Greater,
            ComparisonOperator::GreaterThanEqual => ordering != Ordering::Less,
            ComparisonOperator::Like | ComparisonOperator::Match => false,
        }
    }

    pub fn is_pattern(self) -> bool {
        matches!(self, ComparisonOperator::Like | ComparisonOperator::Match)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum LogicalOperator {
    And,
    Or,
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Comparison { op, left, right } => write!(f, "{} {} {}", left, op, right),
            Expression::Between {
                operand,
                lower,
                upper,
                negated,
            } => {
                let not = if *negated { "NOT " } else { "" };
                write!(f, "{} {}BETWEEN {} AND {}", operand, not, lower, upper)
            }
            Expression::Logical { op, left, right } => write!(f, "({} {} {})", left, op, right),
            Expression::Not(inner) => write!(f, "NOT ({})", inner),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Field(name) => write!(f, "{}", name),
            Operand::Literal { value, .. } => write!(f, "{}", value),
            Operand::Parameter { index, .. } => write!(f, "%{}", index),
        }
    }
}

// Canonical path text; also the dedup key of bound fields
impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", segment.name)?;
            for subscript in &segment.subscripts {
                write!(f, "[{}]", subscript.index)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(path: &[(&str, Option<usize>)]) -> Operand {
        Operand::Field(FieldName::new(
            path.iter()
                .map(|(name, index)| PathSegment {
                    name: name.to_string(),
                    position: 0,
                    subscripts: index
                        .iter()
                        .map(|index| Subscript {
                            index: *index,
                            position: 0,
                        })
                        .collect(),
                })
                .collect(),
        ))
    }

    #[test]
    fn test_field_name_display() {
        let operand = field(&[("a", None), ("b", Some(0)), ("c", None)]);
        assert_eq!(operand.to_string(), "a.b[0].c");
    }

    #[test]
    fn test_expression_display() {
        let comparison = Expression::Comparison {
            op: ComparisonOperator::GreaterThanEqual,
            left: field(&[("x", None)]),
            right: Operand::Parameter {
                index: 1,
                position: 5,
            },
        };
        let expression = Expression::negate(Expression::or(
            comparison.clone(),
            Expression::Between {
                operand: field(&[("y", None)]),
                lower: Operand::Literal {
                    value: Datum::UnsignedInteger(1),
                    position: 0,
                },
                upper: Operand::Literal {
                    value: Datum::UnsignedInteger(2),
                    position: 0,
                },
                negated: true,
            },
        ));
        assert_eq!(
            expression.to_string(),
            "NOT ((x >= %1 OR y NOT BETWEEN 1 AND 2))"
        );
        assert_eq!(expression.operands().len(), 5);
    }

    #[test]
    fn test_operator_accepts() {
        assert!(ComparisonOperator::LessThanEqual.accepts(Ordering::Equal));
        assert!(ComparisonOperator::NotEqual.accepts(Ordering::Less));
        assert!(!ComparisonOperator::GreaterThan.accepts(Ordering::Equal));
        assert!(!ComparisonOperator::Like.accepts(Ordering::Equal));
        assert!(ComparisonOperator::Match.is_pattern());
    }
}
