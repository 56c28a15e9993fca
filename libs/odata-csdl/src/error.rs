use thiserror::Error;

/// Reasons a CSDL document is rejected. The first failing declaration wins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CsdlError {
    #[error("Invalid CSDL format.")]
    InvalidFormat,

    #[error("EntityContainer name is required.")]
    EntityContainerNameRequired,

    #[error("EntitySet name is required.")]
    EntitySetNameRequired,

    #[error("EntitySet EntityType is required.")]
    EntitySetEntityTypeRequired,

    #[error("EntityType name is required.")]
    EntityTypeNameRequired,

    #[error("Property type is required for EntityType '{0}'.")]
    EntityPropertyTypeRequired(String),

    #[error("Property name is required for EntityType '{0}'.")]
    EntityPropertyNameRequired(String),

    #[error("ComplexType name is required.")]
    ComplexTypeNameRequired,

    #[error("Property name is required for ComplexType '{0}'.")]
    ComplexPropertyNameRequired(String),

    #[error("Property type is required for Property '{property}' in ComplexType '{complex_type}'.")]
    ComplexPropertyTypeRequired {
        property: String,
        complex_type: String,
    },

    #[error("Function name is required.")]
    FunctionNameRequired,

    #[error("Function return type is required for Function '{0}'.")]
    FunctionReturnTypeRequired(String),

    #[error("Parameter type is required for Parameter '{parameter}' in Function '{function}'.")]
    ParameterTypeRequired { parameter: String, function: String },

    /// Anything the XML layer could not make sense of.
    #[error("An error occurred while parsing the CSDL: {0}")]
    Parse(String),
}

impl From<quick_xml::DeError> for CsdlError {
    fn from(e: quick_xml::DeError) -> Self {
        CsdlError::Parse(e.to_string())
    }
}
