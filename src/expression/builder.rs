//! Lowers a parsed [`Expression`] into a [`ConditionTree`], binding fields and
//! type-checking every comparison on the way.

use std::collections::BTreeMap;

use tracing::debug;

use crate::ast::{ComparisonOperator, Expression, FieldName, LogicalOperator, Operand};
use crate::binder::{BindError, Binder};
use crate::condition::{
    ConditionId, ConditionTree, CompoundOperator, FieldId, Predicate, ValueRef,
};
use crate::field::Field;
use crate::parameter::Parameter;
use crate::pattern::Pattern;
use crate::value::{Datum, Value, ValueKind};

/// How one parameter is used by the expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterUse {
    pub kinds: Vec<ValueKind>,
    // First reference in the text
    pub position: Option<usize>,
}

/// Two parameters compared with each other; checked once both are settled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterPair {
    pub left: usize,
    pub right: usize,
    pub position: usize,
}

/// A char literal compared with a parameter. The literal takes the
/// parameter's kind once it is settled: a string parameter widens it to a
/// one-character string, a char parameter leaves it a char.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CharLiteral {
    pub parameter: usize,
    pub condition: ConditionId,
    pub byte: u8,
    pub position: usize,
}

#[derive(Debug)]
pub struct Built {
    pub tree: ConditionTree,
    pub fields: Vec<Field>,
    pub field_index: BTreeMap<String, FieldId>,
    pub parameters: Vec<Parameter>,
    pub parameter_pairs: Vec<ParameterPair>,
    pub char_literals: Vec<CharLiteral>,
}

// An operand after binding
#[derive(Debug, Clone)]
enum Bound {
    Field { id: FieldId, kind: ValueKind },
    Parameter { index: usize, position: usize },
    Literal { value: Datum, position: usize },
}

impl Bound {
    fn kind(&self) -> Option<ValueKind> {
        match self {
            Bound::Field { kind, .. } => Some(*kind),
            Bound::Parameter { .. } => None,
            Bound::Literal { value, .. } => Some(value.kind()),
        }
    }

    fn into_ref(self) -> ValueRef {
        match self {
            Bound::Field { id, .. } => ValueRef::Field(id),
            Bound::Parameter { index, .. } => ValueRef::Parameter(index),
            Bound::Literal { value, .. } => ValueRef::Literal(Value::constant(value)),
        }
    }
}

pub struct ExpressionBuilder {
    binder: Binder,
    tree: ConditionTree,
    fields: Vec<Field>,
    field_index: BTreeMap<String, FieldId>,
    // First textual position of each field
    field_positions: Vec<usize>,
    uses: Vec<ParameterUse>,
    parameter_pairs: Vec<ParameterPair>,
    char_literals: Vec<CharLiteral>,
}

impl ExpressionBuilder {
    pub fn new(binder: Binder, supplied_parameters: usize) -> Self {
        Self {
            binder,
            tree: ConditionTree::new(),
            fields: Vec::new(),
            field_index: BTreeMap::new(),
            field_positions: Vec::new(),
            uses: vec![ParameterUse::default(); supplied_parameters],
            parameter_pairs: Vec::new(),
            char_literals: Vec::new(),
        }
    }

    /// Lowers the whole expression and settles the supplied parameters.
    pub fn build(
        mut self,
        expression: &Expression,
        parameters: Vec<(String, Datum)>,
    ) -> Result<Built, BindError> {
        let root = self.lower(expression)?;
        self.tree.set_root(root);

        let parameters = settle_parameters(parameters, &self.uses, &self.parameter_pairs)?;
        for (id, pattern) in compile_parameter_patterns(&self.tree, &parameters)? {
            self.tree.set_pattern(id, pattern);
        }
        for (id, datum) in settle_char_literals(&self.char_literals, &parameters)? {
            self.tree.set_literal(id, datum);
        }

        debug!(
            "built condition tree with {} nodes, {} fields, {} parameters",
            self.tree.len(),
            self.fields.len(),
            parameters.len()
        );
        Ok(Built {
            tree: self.tree,
            fields: self.fields,
            field_index: self.field_index,
            parameters,
            parameter_pairs: self.parameter_pairs,
            char_literals: self.char_literals,
        })
    }

    fn lower(&mut self, expression: &Expression) -> Result<ConditionId, BindError> {
        match expression {
            Expression::Comparison { op, left, right } => self.lower_comparison(*op, left, right),
            Expression::Between {
                operand,
                lower,
                upper,
                negated: false,
            } => {
                let low = self.lower_comparison(ComparisonOperator::GreaterThanEqual, operand, lower)?;
                let high = self.lower_comparison(ComparisonOperator::LessThanEqual, operand, upper)?;
                Ok(self.tree.push_compound(CompoundOperator::And, vec![low, high]))
            }
            Expression::Between {
                operand,
                lower,
                upper,
                negated: true,
            } => {
                let low = self.lower_comparison(ComparisonOperator::LessThan, operand, lower)?;
                let high = self.lower_comparison(ComparisonOperator::GreaterThan, operand, upper)?;
                Ok(self.tree.push_compound(CompoundOperator::Or, vec![low, high]))
            }
            Expression::Logical { op, left, right } => {
                let left = self.lower(left)?;
                let right = self.lower(right)?;
                let op = match op {
                    LogicalOperator::And => CompoundOperator::And,
                    LogicalOperator::Or => CompoundOperator::Or,
                };
                Ok(self.tree.push_compound(op, vec![left, right]))
            }
            Expression::Not(inner) => {
                let inner = self.lower(inner)?;
                Ok(self.tree.push_compound(CompoundOperator::Not, vec![inner]))
            }
        }
    }

    fn lower_comparison(
        &mut self,
        op: ComparisonOperator,
        left: &Operand,
        right: &Operand,
    ) -> Result<ConditionId, BindError> {
        let left = self.bind_operand(left)?;
        let right = self.bind_operand(right)?;

        let (predicate, char_literal) = if op.is_pattern() {
            (self.pattern_predicate(op, left, right)?, None)
        } else {
            let (left, right, char_literal) = self.check_comparison(left, right)?;
            (Predicate::new(op, left.into_ref(), right.into_ref()), char_literal)
        };

        let fields: Vec<FieldId> = predicate.fields().collect();
        let id = self.tree.push_predicate(predicate);
        if let Some((parameter, byte, position)) = char_literal {
            self.char_literals.push(CharLiteral {
                parameter,
                condition: id,
                byte,
                position,
            });
        }
        for field in fields {
            if let Some(field) = self.fields.get_mut(field) {
                field.add_parent(id);
            }
        }
        Ok(id)
    }

    // Kinds of both sides must be compatible; a char literal meeting a string
    // widens to a string. A char literal meeting a parameter is returned as
    // (parameter, byte, position) and settled with the parameter.
    fn check_comparison(
        &mut self,
        left: Bound,
        right: Bound,
    ) -> Result<(Bound, Bound, Option<(usize, u8, usize)>), BindError> {
        let left = widen_literal(left, right.kind());
        let right = widen_literal(right, left.kind());
        let mut char_literal = None;

        match (&left, &right) {
            (
                Bound::Parameter {
                    index: left_index,
                    position,
                },
                Bound::Parameter {
                    index: right_index, ..
                },
            ) => self.parameter_pairs.push(ParameterPair {
                left: *left_index,
                right: *right_index,
                position: *position,
            }),
            (Bound::Parameter { index, .. }, other) | (other, Bound::Parameter { index, .. }) => {
                match other {
                    Bound::Literal {
                        value: Datum::Char(byte),
                        position,
                    } => char_literal = Some((*index, *byte, *position)),
                    _ => {
                        if let Some(kind) = other.kind() {
                            self.record_use(*index, kind);
                        }
                    }
                }
            }
            (known, other) => {
                if let (Some(left_kind), Some(right_kind)) = (known.kind(), other.kind()) {
                    if !left_kind.is_compatible_with(right_kind) {
                        return Err(BindError::TypeMismatch {
                            left: left_kind,
                            right: right_kind,
                            position: self.position_of(other),
                        });
                    }
                }
            }
        }
        Ok((left, right, char_literal))
    }

    fn pattern_predicate(
        &mut self,
        op: ComparisonOperator,
        left: Bound,
        right: Bound,
    ) -> Result<Predicate, BindError> {
        let left = widen_literal(left, Some(ValueKind::String));
        match left.kind() {
            Some(ValueKind::String) => {}
            Some(kind) => {
                return Err(BindError::TypeMismatch {
                    left: kind,
                    right: ValueKind::String,
                    position: self.position_of(&left),
                })
            }
            None => {
                if let Bound::Parameter { index, .. } = left {
                    self.record_use(index, ValueKind::String);
                }
            }
        }

        match right {
            Bound::Literal { value, position } => {
                let source = match &value {
                    Datum::String(text) => text.clone(),
                    Datum::Char(byte) => char::from(*byte).to_string(),
                    other => {
                        return Err(BindError::TypeMismatch {
                            left: ValueKind::String,
                            right: other.kind(),
                            position,
                        })
                    }
                };
                let pattern = Pattern::compile(op, &source).map_err(|e| BindError::InvalidPattern {
                    pattern: source.clone(),
                    reason: e.to_string(),
                    position,
                })?;
                let right = Bound::Literal {
                    value: Datum::String(source),
                    position,
                };
                Ok(Predicate::new(op, left.into_ref(), right.into_ref()).with_pattern(pattern))
            }
            Bound::Parameter { index, .. } => {
                self.record_use(index, ValueKind::String);
                Ok(Predicate::new(op, left.into_ref(), right.into_ref()))
            }
            Bound::Field { .. } => Err(BindError::InvalidPattern {
                pattern: self.signature_of(&right),
                reason: "pattern must be a literal or a parameter".to_string(),
                position: self.position_of(&right),
            }),
        }
    }

    fn bind_operand(&mut self, operand: &Operand) -> Result<Bound, BindError> {
        match operand {
            Operand::Field(name) => self.intern_field(name),
            Operand::Parameter { index, position } => {
                let supplied = self.uses.len();
                let entry = self
                    .uses
                    .get_mut(*index)
                    .ok_or(BindError::ParameterOutOfRange {
                        index: *index,
                        supplied,
                        position: *position,
                    })?;
                entry.position.get_or_insert(*position);
                Ok(Bound::Parameter {
                    index: *index,
                    position: *position,
                })
            }
            Operand::Literal { value, position } => Ok(Bound::Literal {
                value: value.clone(),
                position: *position,
            }),
        }
    }

    // Identical paths share one field
    fn intern_field(&mut self, name: &FieldName) -> Result<Bound, BindError> {
        let signature = name.to_string();
        if let Some(&id) = self.field_index.get(&signature) {
            return Ok(Bound::Field {
                id,
                kind: self.fields[id].kind(),
            });
        }
        let path = self.binder.resolve(name)?;
        let id = self.fields.len();
        let kind = path.kind();
        self.fields.push(Field::new(path));
        self.field_index.insert(signature, id);
        self.field_positions.push(name.position());
        Ok(Bound::Field { id, kind })
    }

    fn record_use(&mut self, index: usize, kind: ValueKind) {
        if let Some(entry) = self.uses.get_mut(index) {
            if !entry.kinds.contains(&kind) {
                entry.kinds.push(kind);
            }
        }
    }

    fn position_of(&self, bound: &Bound) -> usize {
        match bound {
            Bound::Field { id, .. } => self.field_positions.get(*id).copied().unwrap_or_default(),
            Bound::Parameter { position, .. } | Bound::Literal { position, .. } => *position,
        }
    }

    fn signature_of(&self, bound: &Bound) -> String {
        match bound {
            Bound::Field { id, .. } => self
                .fields
                .get(*id)
                .map(|field| field.signature().to_string())
                .unwrap_or_default(),
            Bound::Parameter { index, .. } => format!("%{}", index),
            Bound::Literal { value, .. } => value.to_string(),
        }
    }
}

fn widen_literal(bound: Bound, other: Option<ValueKind>) -> Bound {
    match (bound, other) {
        (
            Bound::Literal {
                value: Datum::Char(byte),
                position,
            },
            Some(ValueKind::String),
        ) => Bound::Literal {
            value: Datum::String(char::from(byte).to_string()),
            position,
        },
        (bound, _) => bound,
    }
}

/// Settles every supplied parameter against the kinds it meets.
pub fn settle_parameters(
    parsed: Vec<(String, Datum)>,
    uses: &[ParameterUse],
    pairs: &[ParameterPair],
) -> Result<Vec<Parameter>, BindError> {
    let parameters = parsed
        .into_iter()
        .enumerate()
        .map(|(index, (source, datum))| {
            let usage = uses.get(index).cloned().unwrap_or_default();
            Parameter::settle(source, datum, usage.kinds, usage.position)
        })
        .collect::<Result<Vec<_>, _>>()?;

    for pair in pairs {
        if let (Some(left), Some(right)) = (parameters.get(pair.left), parameters.get(pair.right)) {
            if !left.kind().is_compatible_with(right.kind()) {
                return Err(BindError::TypeMismatch {
                    left: left.kind(),
                    right: right.kind(),
                    position: pair.position,
                });
            }
        }
    }
    Ok(parameters)
}

/// Gives each char literal compared with a parameter the parameter's settled
/// kind. Parameters that are neither chars nor strings cannot meet one.
pub fn settle_char_literals(
    char_literals: &[CharLiteral],
    parameters: &[Parameter],
) -> Result<Vec<(ConditionId, Datum)>, BindError> {
    char_literals
        .iter()
        .filter_map(|literal| {
            parameters
                .get(literal.parameter)
                .map(|parameter| (literal, parameter.kind()))
        })
        .map(|(literal, kind)| match kind {
            ValueKind::Char => Ok((literal.condition, Datum::Char(literal.byte))),
            ValueKind::String => Ok((
                literal.condition,
                Datum::String(char::from(literal.byte).to_string()),
            )),
            other => Err(BindError::TypeMismatch {
                left: other,
                right: ValueKind::Char,
                position: literal.position,
            }),
        })
        .collect()
}

/// Compiles the patterns supplied through parameters.
pub fn compile_parameter_patterns(
    tree: &ConditionTree,
    parameters: &[Parameter],
) -> Result<Vec<(ConditionId, Pattern)>, BindError> {
    tree.predicates()
        .filter_map(|(id, predicate)| {
            let index = predicate.pattern_parameter()?;
            Some((id, predicate.op, index))
        })
        .map(|(id, op, index)| {
            let parameter = parameters.get(index);
            let source = parameter
                .and_then(|parameter| parameter.value().datum())
                .and_then(Datum::as_str)
                .unwrap_or_default();
            Pattern::compile(op, source)
                .map(|pattern| (id, pattern))
                .map_err(|e| BindError::InvalidPattern {
                    pattern: source.to_string(),
                    reason: e.to_string(),
                    position: parameter.and_then(Parameter::position).unwrap_or_default(),
                })
        })
        .collect()
}
