//! # Condition Tree
//!
//! The bound, evaluable form of an expression: predicates at the leaves,
//! `NOT`/`AND`/`OR` compounds above them, stored in an arena and addressed by
//! [`ConditionId`]. Every node carries a tri-state [`ConditionState`] that is
//! reset before each evaluation pass and only moves from `Undecided` to a
//! decided state within a pass.
//!
//! Fields hold the ids of the predicates that read them; when a field is
//! loaded those predicates are re-examined and decisions propagate upward.
//! Compounds short-circuit: `AND` decides on the first false child, `OR` on
//! the first true one.

use crate::ast::ComparisonOperator;
use crate::field::Field;
use crate::parameter::Parameter;
use crate::pattern::Pattern;
use crate::value::{Datum, Value};

pub type ConditionId = usize;
pub type FieldId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ConditionState {
    #[default]
    Undecided,
    False,
    True,
}

impl ConditionState {
    pub fn is_decided(self) -> bool {
        self != ConditionState::Undecided
    }

    pub fn negate(self) -> Self {
        match self {
            ConditionState::Undecided => ConditionState::Undecided,
            ConditionState::False => ConditionState::True,
            ConditionState::True => ConditionState::False,
        }
    }
}

impl From<bool> for ConditionState {
    fn from(value: bool) -> Self {
        if value {
            ConditionState::True
        } else {
            ConditionState::False
        }
    }
}

/// Where a predicate operand reads its value from.
#[derive(Debug, Clone)]
pub enum ValueRef {
    Field(FieldId),
    Parameter(usize),
    Literal(Value),
}

/// The shared values predicates read during a pass.
#[derive(Debug, Clone, Copy)]
pub struct Operands<'a> {
    pub fields: &'a [Field],
    pub parameters: &'a [Parameter],
}

impl<'a> Operands<'a> {
    pub fn value<'b>(&self, operand: &'b ValueRef) -> Option<&'b Value>
    where
        'a: 'b,
    {
        match operand {
            ValueRef::Field(id) => self.fields.get(*id).map(Field::value),
            ValueRef::Parameter(index) => self.parameters.get(*index).map(Parameter::value),
            ValueRef::Literal(value) => Some(value),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Predicate {
    pub op: ComparisonOperator,
    pub left: ValueRef,
    pub right: ValueRef,
    // Compiled right operand of LIKE and MATCH
    pattern: Option<Pattern>,
}

impl Predicate {
    pub fn new(op: ComparisonOperator, left: ValueRef, right: ValueRef) -> Self {
        Self {
            op,
            left,
            right,
            pattern: None,
        }
    }

    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn pattern(&self) -> Option<&Pattern> {
        self.pattern.as_ref()
    }

    /// Decides the predicate, or `None` while an operand has no value.
    /// Operands that hold values but cannot be ordered (NaN) decide false.
    pub fn decide(&self, operands: &Operands<'_>) -> Option<bool> {
        let left = operands.value(&self.left)?.datum()?;
        let right = operands.value(&self.right)?.datum()?;
        if self.op.is_pattern() {
            let text = left.as_str()?;
            return Some(self.pattern.as_ref()?.is_match(text));
        }
        Some(
            left.compare(right)
                .is_some_and(|ordering| self.op.accepts(ordering)),
        )
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldId> + '_ {
        [&self.left, &self.right]
            .into_iter()
            .filter_map(|operand| match operand {
                ValueRef::Field(id) => Some(*id),
                _ => None,
            })
    }

    /// Parameter holding this predicate's pattern, if any.
    pub fn pattern_parameter(&self) -> Option<usize> {
        match (&self.right, self.op.is_pattern()) {
            (ValueRef::Parameter(index), true) => Some(*index),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum CompoundOperator {
    Not,
    And,
    Or,
}

#[derive(Debug, Clone)]
pub struct Compound {
    pub op: CompoundOperator,
    pub children: Vec<ConditionId>,
    // Children decided so far in this pass
    decided: usize,
}

impl Compound {
    pub fn new(op: CompoundOperator, children: Vec<ConditionId>) -> Self {
        Self {
            op,
            children,
            decided: 0,
        }
    }

    pub fn decided_children(&self) -> usize {
        self.decided
    }

    /// Records one child's decision and returns the compound's new state.
    fn transition(&mut self, child: ConditionState) -> ConditionState {
        self.decided += 1;
        match (self.op, child) {
            (CompoundOperator::Not, state) => state.negate(),
            (CompoundOperator::And, ConditionState::False) => ConditionState::False,
            (CompoundOperator::Or, ConditionState::True) => ConditionState::True,
            (_, state) if self.decided >= self.children.len() => state,
            _ => ConditionState::Undecided,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Condition {
    Predicate(Predicate),
    Compound(Compound),
}

#[derive(Debug, Clone)]
pub struct ConditionNode {
    pub condition: Condition,
    pub state: ConditionState,
    pub parent: Option<ConditionId>,
}

#[derive(Debug, Clone, Default)]
pub struct ConditionTree {
    nodes: Vec<ConditionNode>,
    root: ConditionId,
    // Predicates over literals and parameters only
    constants: Vec<ConditionId>,
}

impl ConditionTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_predicate(&mut self, predicate: Predicate) -> ConditionId {
        let id = self.nodes.len();
        if predicate.fields().next().is_none() {
            self.constants.push(id);
        }
        self.nodes.push(ConditionNode {
            condition: Condition::Predicate(predicate),
            state: ConditionState::Undecided,
            parent: None,
        });
        id
    }

    pub fn push_compound(&mut self, op: CompoundOperator, children: Vec<ConditionId>) -> ConditionId {
        let id = self.nodes.len();
        for child in &children {
            if let Some(node) = self.nodes.get_mut(*child) {
                node.parent = Some(id);
            }
        }
        self.nodes.push(ConditionNode {
            condition: Condition::Compound(Compound::new(op, children)),
            state: ConditionState::Undecided,
            parent: None,
        });
        id
    }

    pub fn set_root(&mut self, root: ConditionId) {
        self.root = root;
    }

    pub fn root(&self) -> ConditionId {
        self.root
    }

    pub fn root_state(&self) -> ConditionState {
        self.state(self.root)
    }

    pub fn state(&self, id: ConditionId) -> ConditionState {
        self.nodes.get(id).map_or(ConditionState::Undecided, |node| node.state)
    }

    pub fn node(&self, id: ConditionId) -> Option<&ConditionNode> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn predicates(&self) -> impl Iterator<Item = (ConditionId, &Predicate)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(id, node)| match &node.condition {
                Condition::Predicate(predicate) => Some((id, predicate)),
                Condition::Compound(_) => None,
            })
    }

    /// Returns every node to `Undecided` before a pass.
    pub fn reset(&mut self) {
        for node in &mut self.nodes {
            node.state = ConditionState::Undecided;
            if let Condition::Compound(compound) = &mut node.condition {
                compound.decided = 0;
            }
        }
    }

    /// Decides the predicates that read no fields.
    pub fn seed(&mut self, operands: &Operands<'_>) {
        for index in 0..self.constants.len() {
            let id = self.constants[index];
            self.value_changed(id, operands);
        }
    }

    /// Re-examines a predicate after one of its fields was loaded.
    pub fn value_changed(&mut self, id: ConditionId, operands: &Operands<'_>) {
        let Some(node) = self.nodes.get_mut(id) else {
            return;
        };
        if node.state.is_decided() {
            return;
        }
        let Condition::Predicate(predicate) = &node.condition else {
            return;
        };
        if let Some(result) = predicate.decide(operands) {
            node.state = result.into();
            self.propagate(id);
        }
    }

    // Walks a fresh decision up until a compound stays undecided or was
    // already decided
    fn propagate(&mut self, mut id: ConditionId) {
        while let Some(node) = self.nodes.get(id) {
            let state = node.state;
            let Some(parent_id) = node.parent else {
                return;
            };
            let Some(parent) = self.nodes.get_mut(parent_id) else {
                return;
            };
            if parent.state.is_decided() {
                return;
            }
            let Condition::Compound(compound) = &mut parent.condition else {
                return;
            };
            let next = compound.transition(state);
            if !next.is_decided() {
                return;
            }
            parent.state = next;
            id = parent_id;
        }
    }

    /// Replaces the literal operands of a predicate.
    pub fn set_literal(&mut self, id: ConditionId, datum: Datum) {
        if let Some(ConditionNode {
            condition: Condition::Predicate(predicate),
            ..
        }) = self.nodes.get_mut(id)
        {
            for operand in [&mut predicate.left, &mut predicate.right] {
                if let ValueRef::Literal(value) = operand {
                    *value = Value::constant(datum.clone());
                }
            }
        }
    }

    /// Replaces the pattern of a predicate.
    pub fn set_pattern(&mut self, id: ConditionId, pattern: Pattern) {
        if let Some(ConditionNode {
            condition: Condition::Predicate(predicate),
            ..
        }) = self.nodes.get_mut(id)
        {
            predicate.pattern = Some(pattern);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_OPERANDS: Operands<'static> = Operands {
        fields: &[],
        parameters: &[],
    };

    fn literal(value: u64) -> ValueRef {
        ValueRef::Literal(Value::constant(Datum::UnsignedInteger(value)))
    }

    fn constant(tree: &mut ConditionTree, result: bool) -> ConditionId {
        let right = if result { 1 } else { 2 };
        tree.push_predicate(Predicate::new(
            ComparisonOperator::Equal,
            literal(1),
            literal(right),
        ))
    }

    #[test]
    fn test_compound_transitions() {
        let mut and = Compound::new(CompoundOperator::And, vec![0, 1]);
        assert_eq!(and.transition(ConditionState::True), ConditionState::Undecided);
        assert_eq!(and.transition(ConditionState::True), ConditionState::True);

        let mut and = Compound::new(CompoundOperator::And, vec![0, 1]);
        assert_eq!(and.transition(ConditionState::False), ConditionState::False);

        let mut or = Compound::new(CompoundOperator::Or, vec![0, 1]);
        assert_eq!(or.transition(ConditionState::False), ConditionState::Undecided);
        assert_eq!(or.decided_children(), 1);
        assert_eq!(or.transition(ConditionState::False), ConditionState::False);

        let mut or = Compound::new(CompoundOperator::Or, vec![0, 1]);
        assert_eq!(or.transition(ConditionState::True), ConditionState::True);

        let mut not = Compound::new(CompoundOperator::Not, vec![0]);
        assert_eq!(not.transition(ConditionState::True), ConditionState::False);
    }

    #[test]
    fn test_seed_decides_constant_tree() {
        let mut tree = ConditionTree::new();
        let yes = constant(&mut tree, true);
        let no = constant(&mut tree, false);
        let not = tree.push_compound(CompoundOperator::Not, vec![no]);
        let and = tree.push_compound(CompoundOperator::And, vec![yes, not]);
        tree.set_root(and);

        tree.seed(&NO_OPERANDS);
        assert_eq!(tree.root_state(), ConditionState::True);
        assert_eq!(tree.state(not), ConditionState::True);

        tree.reset();
        assert_eq!(tree.root_state(), ConditionState::Undecided);
        assert_eq!(tree.state(yes), ConditionState::Undecided);
    }

    #[test]
    fn test_decided_compound_ignores_later_children() {
        let mut tree = ConditionTree::new();
        let yes = constant(&mut tree, true);
        let no = constant(&mut tree, false);
        let or = tree.push_compound(CompoundOperator::Or, vec![yes, no]);
        tree.set_root(or);

        tree.seed(&NO_OPERANDS);
        assert_eq!(tree.root_state(), ConditionState::True);
        let Some(ConditionNode {
            condition: Condition::Compound(compound),
            ..
        }) = tree.node(or)
        else {
            panic!("expected compound");
        };
        assert_eq!(compound.decided_children(), 1);
    }

    #[test]
    fn test_nan_decides_false() {
        let nan = ValueRef::Literal(Value::constant(Datum::FloatingPoint(f64::NAN)));
        for op in [
            ComparisonOperator::Equal,
            ComparisonOperator::NotEqual,
            ComparisonOperator::LessThan,
            ComparisonOperator::GreaterThanEqual,
        ] {
            let predicate = Predicate::new(op, nan.clone(), literal(1));
            assert_eq!(predicate.decide(&NO_OPERANDS), Some(false));
        }
    }

    #[test]
    fn test_missing_operand_stays_undecided() {
        let predicate = Predicate::new(ComparisonOperator::Equal, ValueRef::Parameter(0), literal(1));
        assert_eq!(predicate.decide(&NO_OPERANDS), None);

        let unset = ValueRef::Literal(Value::unset(crate::value::ValueKind::UnsignedInteger));
        let predicate = Predicate::new(ComparisonOperator::Equal, unset, literal(1));
        assert_eq!(predicate.decide(&NO_OPERANDS), None);
    }

    #[test]
    fn test_pattern_predicate() {
        let text = ValueRef::Literal(Value::constant(Datum::String("hello".to_string())));
        let pattern = Pattern::compile(ComparisonOperator::Like, "he%").unwrap();
        let predicate = Predicate::new(ComparisonOperator::Like, text, ValueRef::Parameter(0))
            .with_pattern(pattern);
        assert_eq!(predicate.pattern_parameter(), Some(0));
        assert_eq!(predicate.pattern().map(Pattern::as_str), Some("(?s)^he.*$"));
    }
}
