use thiserror::Error;

/// Raised by the filter parser.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("Unexpected token found: '{0}'.")]
    UnexpectedToken(String),

    #[error("Failed to parse filter query.")]
    FailedToParse,

    #[error("Filter expression is nested deeper than {0} levels.")]
    TooDeep(usize),
}

/// A problem found while checking one expression of a filter against the
/// schema. Wrapped by [`ValidationError::InvalidExpression`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpressionError {
    #[error("Property '{segment}' not found in EntityType '{owner}'")]
    PropertyNotFound { segment: String, owner: String },

    #[error("Property '{property}' of type '{type_name}' has no member '{segment}'")]
    PrimitiveNavigation {
        property: String,
        type_name: String,
        segment: String,
    },

    #[error("ComplexType '{type_name}' of property '{property}' not found in the CSDL model")]
    UnknownComplexType { property: String, type_name: String },

    #[error("Unknown function '{0}'.")]
    UnknownFunction(String),

    #[error("Function '{function}' expects {expected} arguments, but {actual} were provided.")]
    ArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error(
        "Argument {position} of function '{function}' has type '{actual}', but expected '{expected}'."
    )]
    ArgumentType {
        position: usize,
        function: String,
        actual: String,
        expected: String,
    },

    #[error("Invalid unit '{0}' for distance. Allowed: 'm' (meters), 'd' (degrees).")]
    DistanceUnit(String),

    #[error("'{0}' must be a literal value.")]
    NotALiteral(String),

    #[error("Type mismatch in IN clause: '{value}' does not match type of '{path}'")]
    InTypeMismatch { value: String, path: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("EntitySet '{0}' not found in the CSDL model.")]
    EntitySetNotFound(String),

    #[error("EntityType '{entity_type}' of EntitySet '{entity_set}' not found in the CSDL model.")]
    EntityTypeNotFound {
        entity_set: String,
        entity_type: String,
    },

    #[error("Invalid filter expression: {0}")]
    InvalidExpression(#[from] ExpressionError),
}

/// Raised while turning a validated tree into SQL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("Unknown property '{0}'.")]
    UnknownProperty(String),

    #[error("Unknown function '{0}'.")]
    UnknownFunction(String),

    #[error("Function '{function}' expects {expected} arguments, but {actual} were provided.")]
    ArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown operator '{0}'.")]
    UnknownOperator(String),

    #[error("Operator '{0}' cannot be used to compare with null.")]
    NullComparison(String),

    #[error("'{0}' must be a literal value.")]
    NotALiteral(String),

    #[error("Type mismatch in IN clause: '{value}' does not match type of '{path}'")]
    InTypeMismatch { value: String, path: String },
}

/// Any failure of the parse, validate and compile pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("Filter expression is too long ({length} characters, maximum {max}).")]
    TooLong { length: usize, max: usize },

    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}
