//! # Filter Expression
//!
//! The unit of creation, update and evaluation: one condition tree, the
//! deduplicated fields it reads and the ordered parameter list. Building is
//! all or nothing; a failed [`FilterExpression::bind`] or
//! [`FilterExpression::rebind_parameters`] leaves the expression as it was.

pub mod builder;

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::{debug, instrument};

use self::builder::{
    compile_parameter_patterns, settle_char_literals, settle_parameters, CharLiteral,
    ExpressionBuilder, ParameterPair, ParameterUse,
};
use crate::adapter::MessageType;
use crate::binder::{BindError, Binder};
use crate::condition::{ConditionTree, FieldId};
use crate::error::FilterResult;
use crate::field::Field;
use crate::parameter::Parameter;
use crate::parser::parse_filter_expression;

#[derive(Debug, Clone, Default)]
pub struct FilterExpression {
    pub(crate) text: String,
    pub(crate) tree: ConditionTree,
    pub(crate) fields: Vec<Field>,
    // Path signature to field, one entry per distinct path
    pub(crate) field_index: BTreeMap<String, FieldId>,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) parameter_pairs: Vec<ParameterPair>,
    pub(crate) char_literals: Vec<CharLiteral>,
    pub(crate) message_type: Option<Arc<MessageType>>,
}

impl FilterExpression {
    /// Parses `text` and binds it to `message_type` with the given parameter
    /// strings.
    pub fn build<S: AsRef<str>>(
        text: &str,
        message_type: &Arc<MessageType>,
        parameters: &[S],
    ) -> FilterResult<Self> {
        let mut expression = Self::default();
        expression.bind(text, message_type, parameters)?;
        Ok(expression)
    }

    /// Binds this expression to new text. On error nothing changes.
    #[instrument(level = "debug", skip(self, message_type, parameters), fields(message_type = %message_type.name))]
    pub fn bind<S: AsRef<str>>(
        &mut self,
        text: &str,
        message_type: &Arc<MessageType>,
        parameters: &[S],
    ) -> FilterResult<()> {
        let ast = parse_filter_expression(text)?;
        let parsed = Parameter::parse_all(parameters)?;
        let builder = ExpressionBuilder::new(Binder::new(message_type.clone()), parsed.len());
        let built = builder.build(&ast, parsed)?;

        self.text = text.to_string();
        self.tree = built.tree;
        self.fields = built.fields;
        self.field_index = built.field_index;
        self.parameters = built.parameters;
        self.parameter_pairs = built.parameter_pairs;
        self.char_literals = built.char_literals;
        self.message_type = Some(message_type.clone());
        debug!("bound expression '{}'", self.text);
        Ok(())
    }

    /// Replaces the parameter values while keeping the tree. Every parameter
    /// the text references must be supplied and keep a compatible kind.
    #[instrument(level = "debug", skip(self, parameters))]
    pub fn rebind_parameters<S: AsRef<str>>(&mut self, parameters: &[S]) -> FilterResult<()> {
        let parsed = Parameter::parse_all(parameters)?;

        if let Some(missing) = self
            .parameters
            .iter()
            .enumerate()
            .skip(parsed.len())
            .find(|(_, parameter)| parameter.is_referenced())
        {
            let (index, parameter) = missing;
            return Err(BindError::ParameterOutOfRange {
                index,
                supplied: parsed.len(),
                position: parameter.position().unwrap_or_default(),
            }
            .into());
        }

        let uses: Vec<ParameterUse> = self
            .parameters
            .iter()
            .map(|parameter| ParameterUse {
                kinds: parameter.uses().to_vec(),
                position: parameter.position(),
            })
            .collect();
        let parameters = settle_parameters(parsed, &uses, &self.parameter_pairs)?;
        let patterns = compile_parameter_patterns(&self.tree, &parameters)?;
        let literals = settle_char_literals(&self.char_literals, &parameters)?;

        self.parameters = parameters;
        for (id, pattern) in patterns {
            self.tree.set_pattern(id, pattern);
        }
        for (id, datum) in literals {
            self.tree.set_literal(id, datum);
        }
        debug!("rebound {} parameters", self.parameters.len());
        Ok(())
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Parameter strings as supplied.
    pub fn parameters(&self) -> Vec<String> {
        self.parameters
            .iter()
            .map(|parameter| parameter.source().to_string())
            .collect()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, signature: &str) -> Option<&Field> {
        self.field_index
            .get(signature)
            .and_then(|id| self.fields.get(*id))
    }

    pub fn tree(&self) -> &ConditionTree {
        &self.tree
    }

    pub fn message_type(&self) -> Option<&Arc<MessageType>> {
        self.message_type.as_ref()
    }

    pub fn is_bound(&self) -> bool {
        self.message_type.is_some()
    }

    /// Returns the expression to the unbound state.
    pub fn clear(&mut self) {
        self.text.clear();
        self.tree = ConditionTree::default();
        self.fields.clear();
        self.field_index.clear();
        self.parameters.clear();
        self.parameter_pairs.clear();
        self.char_literals.clear();
        self.message_type = None;
    }
}
