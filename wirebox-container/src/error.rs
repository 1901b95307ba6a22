//! Error types for Wirebox container operations.
//!
//! Two kinds of failure are visible to callers: something could not be
//! found ([`ContainerError::is_not_found`]) or the container was misused.
//! Construction and literal-kind failures from the reflection layer are
//! surfaced unmodified.

use std::fmt;

use crate::value::LiteralKind;

/// Main error type for all Wirebox operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Nothing known to the container can produce the identifier.
    #[error("{}", .0)]
    NotFound(NotFoundError),

    /// A reflected parameter has no supplied value, no registered
    /// resolution and no default.
    #[error("{}", .0)]
    ParameterUnresolvable(UnresolvableParameterError),

    /// Configuration-time contract violation.
    #[error("{0}")]
    Misuse(String),

    /// Reflective instantiation or invocation failed.
    #[error("Failed to construct {class}: {source}")]
    Construction {
        class: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A typed literal did not carry a value of its declared kind.
    #[error("Literal of kind {actual} does not satisfy the declared kind {expected}")]
    TypeMismatch {
        expected: LiteralKind,
        actual: String,
    },
}

impl ContainerError {
    pub(crate) fn not_found(id: impl Into<String>, lookup: Lookup) -> Self {
        ContainerError::NotFound(NotFoundError::new(id, lookup))
    }

    pub(crate) fn misuse(message: impl Into<String>) -> Self {
        ContainerError::Misuse(message.into())
    }

    pub(crate) fn construction(
        class: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        ContainerError::Construction {
            class: class.into(),
            source: source.into(),
        }
    }

    /// True for [`NotFound`](ContainerError::NotFound) and its
    /// [`ParameterUnresolvable`](ContainerError::ParameterUnresolvable)
    /// specialization.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ContainerError::NotFound(_) | ContainerError::ParameterUnresolvable(_)
        )
    }

    /// True for configuration-time misuse, such as a lying provider.
    pub fn is_misuse(&self) -> bool {
        matches!(self, ContainerError::Misuse(_))
    }
}

/// What kind of lookup failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// `get`/`has` style lookup across every source.
    Service,
    /// A definition was required, e.g. by `extend`.
    Definition,
    /// A class-name reference inside an argument list.
    Argument,
}

/// Error when an identifier cannot be located.
#[derive(Debug)]
pub struct NotFoundError {
    /// The identifier that was requested.
    pub id: String,
    /// Which lookup failed.
    pub lookup: Lookup,
    /// Known aliases that look like `id`.
    pub suggestions: Vec<String>,
}

impl NotFoundError {
    pub(crate) fn new(id: impl Into<String>, lookup: Lookup) -> Self {
        Self {
            id: id.into(),
            lookup,
            suggestions: Vec::new(),
        }
    }

    pub(crate) fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lookup {
            Lookup::Service => write!(
                f,
                "Alias ({}) is not being managed by the container or delegates",
                self.id
            )?,
            Lookup::Definition => write!(
                f,
                "Unable to extend alias ({}) as it is not being managed as a definition",
                self.id
            )?,
            Lookup::Argument => {
                write!(f, "Unable to resolve a value for argument ({})", self.id)?
            }
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        if self.lookup != Lookup::Argument {
            write!(
                f,
                "\n  Hint: Did you forget to call .add(\"{}\", ...) or register a provider for it?",
                self.id
            )?;
        }
        Ok(())
    }
}

/// Error when reflection cannot derive a value for a parameter.
#[derive(Debug)]
pub struct UnresolvableParameterError {
    /// Name of the formal parameter.
    pub parameter: String,
    /// Function or method declaring it.
    pub function: String,
}

impl fmt::Display for UnresolvableParameterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unable to resolve a value for parameter ({}) in the function/method ({})",
            self.parameter, self.function,
        )?;
        write!(
            f,
            "\n  Hint: Supply it by name, register its type, or give it a default"
        )
    }
}

/// Convenient Result type for Wirebox operations.
pub type Result<T> = std::result::Result<T, ContainerError>;
