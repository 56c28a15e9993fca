//! Schema checks for a parsed filter.
//!
//! Property paths are walked through the entity type behind the requested
//! entity set, function calls are checked against the [`FunctionCatalog`]
//! (name, arity, argument type families) and IN-lists must hold literals
//! compatible with the left-hand side.

use odata_csdl::{
    ComplexType, EDM_NULL, EDM_UNKNOWN, EdmFamily, EdmKind, EntityType, Property, SchemaModel,
    StructuredType,
};

use crate::ast::{FilterNode, FunctionCall};
use crate::catalog::{FunctionCatalog, FunctionMapping};
use crate::error::{ExpressionError, ValidationError};
use crate::literal::{
    infer_literal_type, infer_literal_type_for, is_literal, is_null, is_quoted, literal_fits,
    unquote,
};

/// Units accepted as the second argument of `distance`.
pub const DISTANCE_UNITS: [&str; 2] = ["m", "d"];

const EDM_BOOLEAN: &str = "Edm.Boolean";

/// Where a property path currently points while it is being walked.
#[derive(Clone, Copy)]
enum NavTarget<'s> {
    Entity(&'s EntityType),
    Complex(&'s ComplexType),
    Property(&'s Property),
}

pub struct FilterValidator<'a> {
    schema: &'a SchemaModel,
    catalog: &'a FunctionCatalog,
}

impl<'a> FilterValidator<'a> {
    #[must_use]
    pub fn new(schema: &'a SchemaModel, catalog: &'a FunctionCatalog) -> Self {
        Self { schema, catalog }
    }

    /// Check `tree` against the entity type behind `entity_set`.
    ///
    /// # Errors
    /// - [`ValidationError::EntitySetNotFound`] if the set is not declared.
    /// - [`ValidationError::EntityTypeNotFound`] if the set points at an
    ///   entity type the schema does not declare.
    /// - [`ValidationError::InvalidExpression`] for the first failing
    ///   expression, left operands before right ones.
    pub fn validate(&self, tree: &FilterNode, entity_set: &str) -> Result<(), ValidationError> {
        let set = self
            .schema
            .entity_set(entity_set)
            .ok_or_else(|| ValidationError::EntitySetNotFound(entity_set.to_owned()))?;
        let entity = self.schema.entity_type(&set.entity_type).ok_or_else(|| {
            ValidationError::EntityTypeNotFound {
                entity_set: set.name.clone(),
                entity_type: set.entity_type.clone(),
            }
        })?;
        self.check(tree, entity)?;
        Ok(())
    }

    fn check(&self, node: &FilterNode, entity: &EntityType) -> Result<(), ExpressionError> {
        match node {
            FilterNode::Primary(text) => {
                if is_literal(text) {
                    return Ok(());
                }
                self.walk_path(text, entity).map(|_| ())
            }
            FilterNode::Function(call) => self.check_function(call, entity),
            FilterNode::Not(inner) | FilterNode::Group(inner) => self.check(inner, entity),
            FilterNode::Comparison { left, right, .. } | FilterNode::Logical { left, right, .. } => {
                self.check(left, entity)?;
                self.check(right, entity)
            }
            FilterNode::In { left, values } => self.check_in(left, values, entity),
        }
    }

    /// Walk a slash-separated path and return the last property reached.
    /// Literal segments are skipped.
    fn walk_path<'s>(
        &'s self,
        path: &str,
        entity: &'s EntityType,
    ) -> Result<Option<&'s Property>, ExpressionError> {
        let mut target = NavTarget::Entity(entity);
        let mut last = None;

        for segment in path.split('/').map(str::trim) {
            if is_literal(segment) {
                continue;
            }
            let owner: &dyn StructuredType = match target {
                NavTarget::Entity(t) => t,
                NavTarget::Complex(t) => t,
                NavTarget::Property(p) if p.is_primitive() => {
                    return Err(ExpressionError::PrimitiveNavigation {
                        property: p.name.clone(),
                        type_name: p.type_name.clone(),
                        segment: segment.to_owned(),
                    });
                }
                NavTarget::Property(p) => {
                    return Err(ExpressionError::UnknownComplexType {
                        property: p.name.clone(),
                        type_name: p.type_name.clone(),
                    });
                }
            };
            let property =
                owner
                    .property(segment)
                    .ok_or_else(|| ExpressionError::PropertyNotFound {
                        segment: segment.to_owned(),
                        owner: owner.type_name().to_owned(),
                    })?;
            target = if property.is_primitive() {
                NavTarget::Property(property)
            } else {
                self.schema
                    .resolve_complex_type(&property.type_name)
                    .map_or(NavTarget::Property(property), NavTarget::Complex)
            };
            last = Some(property);
        }
        Ok(last)
    }

    fn check_function(&self, call: &FunctionCall, entity: &EntityType) -> Result<(), ExpressionError> {
        let mapping = self
            .catalog
            .get(&call.name)
            .ok_or_else(|| ExpressionError::UnknownFunction(call.name.clone()))?;

        for arg in &call.args {
            self.check(arg, entity)?;
        }

        if call.args.is_empty() && mapping.arity() == 1 {
            let Some(inner) = recovered_argument(call).filter(|inner| is_quoted(inner)) else {
                return Err(ExpressionError::ArgumentCount {
                    function: call.name.clone(),
                    expected: 1,
                    actual: 0,
                });
            };
            let kind = infer_literal_type_for(inner, mapping.argument_family(0));
            return check_argument_type(mapping, 0, kind.type_name());
        }

        if call.args.len() != mapping.arity() {
            return Err(ExpressionError::ArgumentCount {
                function: call.name.clone(),
                expected: mapping.arity(),
                actual: call.args.len(),
            });
        }

        for (index, arg) in call.args.iter().enumerate() {
            if mapping.is_distance() && index == 1 {
                let unit = unquote(&arg.to_string());
                if !DISTANCE_UNITS.contains(&unit.as_str()) {
                    return Err(ExpressionError::DistanceUnit(unit));
                }
            }
            let actual = match arg {
                FilterNode::Primary(text) if is_quoted(text) => {
                    infer_literal_type_for(text, mapping.argument_family(index))
                        .type_name()
                        .to_owned()
                }
                _ => self.expression_type(arg, entity),
            };
            check_argument_type(mapping, index, &actual)?;
        }
        Ok(())
    }

    fn check_in(
        &self,
        left: &FilterNode,
        values: &[String],
        entity: &EntityType,
    ) -> Result<(), ExpressionError> {
        self.check(left, entity)?;
        let declared = EdmKind::from_type_name(&self.expression_type(left, entity));

        for value in values {
            if !is_literal(value) {
                return Err(ExpressionError::NotALiteral(value.clone()));
            }
            if !literal_fits(declared, value) {
                return Err(ExpressionError::InTypeMismatch {
                    value: unquote(value),
                    path: left.to_string(),
                });
            }
        }
        Ok(())
    }

    /// EDM type name an expression evaluates to, or `Edm.Unknown`.
    fn expression_type(&self, node: &FilterNode, entity: &EntityType) -> String {
        match node {
            FilterNode::Primary(text) if is_null(text) => EDM_NULL.to_owned(),
            FilterNode::Primary(text) if is_literal(text) => {
                infer_literal_type(text).type_name().to_owned()
            }
            FilterNode::Primary(path) => self
                .walk_path(path, entity)
                .ok()
                .flatten()
                .map_or_else(|| EDM_UNKNOWN.to_owned(), |p| p.type_name.clone()),
            FilterNode::Function(call) => self
                .catalog
                .get(&call.name)
                .map_or_else(|| EDM_UNKNOWN.to_owned(), |m| m.return_type.clone()),
            FilterNode::Group(inner) => self.expression_type(inner, entity),
            FilterNode::Not(_)
            | FilterNode::Comparison { .. }
            | FilterNode::Logical { .. }
            | FilterNode::In { .. } => EDM_BOOLEAN.to_owned(),
        }
    }
}

/// Text between the outer parentheses of a call whose arguments the parser
/// did not produce.
pub fn recovered_argument(call: &FunctionCall) -> Option<&str> {
    let open = call.raw.find('(')?;
    let close = call.raw.rfind(')')?;
    let inner = call.raw.get(open + 1..close)?.trim();
    (!inner.is_empty()).then_some(inner)
}

fn check_argument_type(
    mapping: &FunctionMapping,
    index: usize,
    actual: &str,
) -> Result<(), ExpressionError> {
    let Some(expected) = mapping.argument_types.get(index) else {
        return Ok(());
    };
    if type_accepts(expected, actual) {
        return Ok(());
    }
    Err(ExpressionError::ArgumentType {
        position: index + 1,
        function: mapping.name.clone(),
        actual: actual.to_owned(),
        expected: expected.clone(),
    })
}

/// Family-level compatibility. Integers are accepted where a decimal is
/// expected; names outside the known families must match exactly.
fn type_accepts(expected: &str, actual: &str) -> bool {
    let want = EdmFamily::from_type_name(expected);
    let have = EdmFamily::from_type_name(actual);
    match (want, have) {
        (EdmFamily::Unknown, _) => expected.trim().eq_ignore_ascii_case(actual.trim()),
        (EdmFamily::Decimal, EdmFamily::Integer) => true,
        _ => want == have,
    }
}
