//! Error types for Strand.

/// A specialized Result type for Strand operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while binding a model to a template.
///
/// Most runtime conditions in Strand are contained locally (a malformed
/// interpolation is simply static text), so these errors only surface from
/// the explicit APIs: compiling against a root and writing model paths.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The root element selector did not match any node.
    #[error("Root element '{selector}' not found")]
    RootNotFound { selector: String },

    /// A model path named a property that does not exist.
    #[error("Property '{path}' not found")]
    UnknownProperty { path: String },

    /// A path segment descended into a value that is not an object.
    #[error("Property '{path}' is not an object")]
    NotAnObject { path: String },

    /// The selector syntax is not supported.
    #[error("Invalid selector '{selector}'")]
    InvalidSelector { selector: String },
}

impl Error {
    /// Create a root-not-found error.
    pub fn root_not_found(selector: impl Into<String>) -> Self {
        Self::RootNotFound {
            selector: selector.into(),
        }
    }

    /// Create an unknown-property error.
    pub fn unknown_property(path: impl Into<String>) -> Self {
        Self::UnknownProperty { path: path.into() }
    }

    /// Create a not-an-object error.
    pub fn not_an_object(path: impl Into<String>) -> Self {
        Self::NotAnObject { path: path.into() }
    }

    /// Create an invalid-selector error.
    pub fn invalid_selector(selector: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
        }
    }
}
