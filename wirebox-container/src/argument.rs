//! Argument values and the argument resolver.
//!
//! An [`Argument`] says how to obtain one positional value: pass it
//! through, look a name up in the container, or look it up with a
//! fallback. [`resolve_arguments`] turns a list of arguments into values;
//! [`reflect_arguments`] derives that list from a signature first.

use std::collections::HashMap;

use tracing::trace;

use crate::error::{ContainerError, Lookup, Result, UnresolvableParameterError};
use crate::reflection::{Signature, TypeHint};
use crate::registry::Resolver;
use crate::value::{Callable, Instance, LiteralKind, Value};

/// How to obtain one argument value.
#[derive(Debug, Clone)]
pub enum Argument {
    /// A bare literal. Strings naming something the lookup knows are
    /// resolved through it; everything else passes through.
    Plain(Value),
    /// A literal that is never looked up.
    Raw(Value),
    /// A name that must resolve through the lookup.
    ClassRef(String),
    /// A name resolved through the lookup, or `fallback` when unknown.
    ClassRefWithDefault { name: String, fallback: Value },
    /// A literal whose kind was checked at construction.
    Typed { value: Value, kind: LiteralKind },
}

impl Argument {
    /// A literal that is never resolved.
    pub fn raw(value: impl Into<Value>) -> Self {
        Argument::Raw(value.into())
    }

    /// A reference that fails when the name is unknown.
    pub fn class_ref(name: impl Into<String>) -> Self {
        Argument::ClassRef(name.into())
    }

    /// A reference falling back to `fallback` when the name is unknown.
    pub fn with_default(name: impl Into<String>, fallback: impl Into<Value>) -> Self {
        Argument::ClassRefWithDefault {
            name: name.into(),
            fallback: fallback.into(),
        }
    }

    /// A literal that must be of `kind`.
    ///
    /// # Errors
    /// [`ContainerError::TypeMismatch`] when `value` has another kind.
    ///
    /// ```
    /// use wirebox_container::argument::Argument;
    /// use wirebox_container::value::LiteralKind;
    ///
    /// assert!(Argument::typed(8080, LiteralKind::Int).is_ok());
    /// assert!(Argument::typed("8080", LiteralKind::Int).is_err());
    /// ```
    pub fn typed(value: impl Into<Value>, kind: LiteralKind) -> Result<Self> {
        let value = value.into();
        if value.kind() != Some(kind) {
            return Err(ContainerError::TypeMismatch {
                expected: kind,
                actual: value.kind_name(),
            });
        }
        Ok(Argument::Typed { value, kind })
    }

    /// Drops the wrapper without consulting any lookup; references become
    /// their names.
    pub fn into_value(self) -> Value {
        match self {
            Argument::Plain(value) | Argument::Raw(value) | Argument::Typed { value, .. } => value,
            Argument::ClassRef(name) | Argument::ClassRefWithDefault { name, .. } => {
                Value::Str(name)
            }
        }
    }

    /// Resolves this argument against `lookup`.
    pub fn resolve(&self, lookup: &dyn Resolver) -> Result<Value> {
        match self {
            Argument::Plain(Value::Str(id)) if lookup.has(id) => {
                trace!(id = %id, "Resolving plain string argument through lookup");
                lookup.get(id)
            }
            Argument::Plain(value) | Argument::Raw(value) | Argument::Typed { value, .. } => {
                Ok(value.clone())
            }
            Argument::ClassRef(name) => {
                if lookup.has(name) {
                    lookup.get(name)
                } else {
                    Err(ContainerError::not_found(name.clone(), Lookup::Argument))
                }
            }
            Argument::ClassRefWithDefault { name, fallback } => {
                if lookup.has(name) {
                    lookup.get(name)
                } else {
                    trace!(name = %name, "Falling back to default argument value");
                    Ok(fallback.clone())
                }
            }
        }
    }
}

impl From<Value> for Argument {
    fn from(value: Value) -> Self {
        Argument::Plain(value)
    }
}

macro_rules! plain_argument_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Argument {
                fn from(value: $ty) -> Self {
                    Argument::Plain(Value::from(value))
                }
            }
        )*
    };
}

plain_argument_from!(bool, i64, i32, u32, f64, &str, String, Vec<Value>, Instance, Callable);

/// Resolves `items` in order against `lookup`.
///
/// The output corresponds positionally to the input.
pub fn resolve_arguments(items: &[Argument], lookup: &dyn Resolver) -> Result<Vec<Value>> {
    items.iter().map(|item| item.resolve(lookup)).collect()
}

/// Derives arguments for `signature` and resolves them.
///
/// For each parameter, in declaration order:
/// 1. a value supplied under the parameter's name is used raw;
/// 2. a class-typed parameter becomes a class reference, with its default
///    as fallback when it has one;
/// 3. a builtin-typed parameter without default is looked up by its type
///    name;
/// 4. a parameter with a default uses it raw.
///
/// # Errors
/// [`ContainerError::ParameterUnresolvable`] when none of these apply.
pub fn reflect_arguments(
    signature: &Signature,
    supplied: &HashMap<String, Value>,
    lookup: &dyn Resolver,
) -> Result<Vec<Value>> {
    let mut arguments = Vec::with_capacity(signature.parameters().len());

    for parameter in signature.parameters() {
        if let Some(value) = supplied.get(parameter.name()) {
            arguments.push(Argument::Raw(value.clone()));
            continue;
        }

        let argument = match (parameter.type_hint(), parameter.default()) {
            (Some(TypeHint::Class(class)), Some(default)) => {
                Argument::with_default(class.clone(), default.clone())
            }
            (Some(TypeHint::Class(class)), None) => Argument::class_ref(class.clone()),
            (Some(TypeHint::Builtin(type_name)), None) if lookup.has(type_name) => {
                Argument::class_ref(type_name.clone())
            }
            (_, Some(default)) => Argument::Raw(default.clone()),
            (_, None) => {
                return Err(ContainerError::ParameterUnresolvable(
                    UnresolvableParameterError {
                        parameter: parameter.name().to_string(),
                        function: signature.function().to_string(),
                    },
                ));
            }
        };
        arguments.push(argument);
    }

    resolve_arguments(&arguments, lookup)
}
