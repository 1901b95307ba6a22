//! Runtime values handled by the container.
//!
//! Everything a definition produces, every argument it consumes and every
//! object an inflector touches is a [`Value`]. Objects are shared,
//! type-erased [`Instance`]s tagged with their class name so the
//! reflection layer can answer "is-a" questions about them.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::argument::Argument;
use crate::error::Result;
use crate::reflection::Signature;

/// Runtime kind of a literal, used by typed literal arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    Array,
    Bool,
    Callable,
    Float,
    Int,
    Object,
    String,
}

impl fmt::Display for LiteralKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LiteralKind::Array => "array",
            LiteralKind::Bool => "bool",
            LiteralKind::Callable => "callable",
            LiteralKind::Float => "float",
            LiteralKind::Int => "int",
            LiteralKind::Object => "object",
            LiteralKind::String => "string",
        };
        f.write_str(name)
    }
}

/// A shared object resolved by the container.
///
/// Cloning an `Instance` clones the handle, never the object. Two handles
/// are the *same* instance when [`Instance::ptr_eq`] holds.
///
/// # Examples
/// ```
/// use wirebox_container::value::Instance;
///
/// struct Mailer;
///
/// let a = Instance::new("Mailer", Mailer);
/// let b = a.clone();
/// assert!(a.ptr_eq(&b));
/// assert_eq!(a.class(), "Mailer");
/// assert!(a.downcast_ref::<Mailer>().is_some());
/// ```
#[derive(Clone)]
pub struct Instance {
    class: Arc<str>,
    object: Arc<dyn Any + Send + Sync>,
}

impl Instance {
    /// Wraps `object` as an instance of `class`.
    pub fn new<T: Any + Send + Sync>(class: impl Into<Arc<str>>, object: T) -> Self {
        Self {
            class: class.into(),
            object: Arc::new(object),
        }
    }

    /// Wraps an already shared object.
    pub fn from_arc(class: impl Into<Arc<str>>, object: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            class: class.into(),
            object,
        }
    }

    /// Name of the class this instance was built as.
    #[inline]
    pub fn class(&self) -> &str {
        &self.class
    }

    /// Borrows the object as `T`, if it is one.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.object.downcast_ref::<T>()
    }

    /// Returns a typed shared handle to the object, if it is a `T`.
    pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.object.clone().downcast::<T>().ok()
    }

    /// Reference equality.
    #[inline]
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.object) as *const (),
            Arc::as_ptr(&other.object) as *const (),
        )
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Instance({} @ {:p})", self.class, Arc::as_ptr(&self.object) as *const ())
    }
}

type CallableBody = dyn Fn(Vec<Value>) -> Result<Argument> + Send + Sync;

/// A function value with a reflected signature.
///
/// The body may return a plain [`Value`] or any [`Argument`]; returning
/// [`Argument::Raw`] marks the result as final so a definition hands it
/// back untouched.
///
/// # Examples
/// ```
/// use wirebox_container::reflection::{Parameter, Signature};
/// use wirebox_container::value::{Callable, Value};
///
/// let greet = Callable::new(
///     Signature::new("greet").param(Parameter::new("name").builtin("string")),
///     |args| Ok(Value::from(format!("hello {}", args[0].as_str().unwrap_or("?")))),
/// );
/// assert_eq!(greet.name(), "greet");
/// ```
#[derive(Clone)]
pub struct Callable {
    signature: Arc<Signature>,
    body: Arc<CallableBody>,
}

impl Callable {
    pub fn new<F, R>(signature: Signature, body: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<R> + Send + Sync + 'static,
        R: Into<Argument>,
    {
        Self {
            signature: Arc::new(signature),
            body: Arc::new(move |args| body(args).map(Into::into)),
        }
    }

    /// The reflected signature.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// Function name used in diagnostics.
    pub fn name(&self) -> &str {
        self.signature.function()
    }

    /// Invokes the body with positional arguments.
    ///
    /// Missing trailing arguments are filled from parameter defaults.
    pub fn call(&self, args: Vec<Value>) -> Result<Argument> {
        let args = self.signature.complete(args)?;
        (self.body)(args)
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.body) as *const (),
            Arc::as_ptr(&other.body) as *const (),
        )
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("function", &self.name())
            .field("parameters", &self.signature.parameters().len())
            .finish()
    }
}

/// A value flowing through the container.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<Value>),
    Object(Instance),
    Callable(Callable),
}

impl Value {
    /// Runtime kind; `None` for [`Value::Null`].
    pub fn kind(&self) -> Option<LiteralKind> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(LiteralKind::Bool),
            Value::Int(_) => Some(LiteralKind::Int),
            Value::Float(_) => Some(LiteralKind::Float),
            Value::Str(_) => Some(LiteralKind::String),
            Value::Array(_) => Some(LiteralKind::Array),
            Value::Object(_) => Some(LiteralKind::Object),
            Value::Callable(_) => Some(LiteralKind::Callable),
        }
    }

    /// Kind name for diagnostics.
    pub fn kind_name(&self) -> String {
        self.kind()
            .map_or_else(|| "null".to_string(), |kind| kind.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Object(instance) => Some(instance),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Value::Callable(callable) => Some(callable),
            _ => None,
        }
    }

    /// Borrows the object as `T` when this is an [`Value::Object`].
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_instance().and_then(Instance::downcast_ref)
    }
}

/// Literals compare by value, objects and callables by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Callable(a), Value::Callable(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value $(as $cast)?)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    i64 => Int,
    i32 => Int as i64,
    u32 => Int as i64,
    f64 => Float,
    String => Str,
    Vec<Value> => Array,
    Instance => Object,
    Callable => Callable,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflection::Parameter;

    struct Mailer;

    #[test]
    fn value_kinds() {
        assert_eq!(Value::from(1).kind(), Some(LiteralKind::Int));
        assert_eq!(Value::from(1.5).kind(), Some(LiteralKind::Float));
        assert_eq!(Value::from("x").kind(), Some(LiteralKind::String));
        assert_eq!(Value::from(true).kind(), Some(LiteralKind::Bool));
        assert_eq!(Value::from(vec![Value::Null]).kind(), Some(LiteralKind::Array));
        assert_eq!(Value::Null.kind(), None);
        assert_eq!(Value::Null.kind_name(), "null");
    }

    #[test]
    fn objects_compare_by_identity() {
        let a = Value::from(Instance::new("Mailer", Mailer));
        let b = Value::from(Instance::new("Mailer", Mailer));
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn downcast_through_value() {
        let value = Value::from(Instance::new("Mailer", Mailer));
        assert!(value.downcast_ref::<Mailer>().is_some());
        assert!(value.downcast_ref::<String>().is_none());
        assert!(Value::from("Mailer").downcast_ref::<Mailer>().is_none());
    }

    #[test]
    fn downcast_arc_shares_object() {
        let instance = Instance::new("Counter", 7u8);
        let shared = instance.downcast_arc::<u8>().unwrap();
        assert_eq!(*shared, 7);
    }

    #[test]
    fn callable_fills_defaults() {
        let add = Callable::new(
            Signature::new("add")
                .param(Parameter::new("a").builtin("int"))
                .param(Parameter::new("b").builtin("int").default_value(10)),
            |args| {
                let sum = args[0].as_int().unwrap_or(0) + args[1].as_int().unwrap_or(0);
                Ok(Value::from(sum))
            },
        );

        match add.call(vec![Value::from(1)]).unwrap() {
            Argument::Plain(value) => assert_eq!(value, Value::from(11)),
            other => panic!("Expected a plain value, got: {other:?}"),
        }
    }

    #[test]
    fn callable_missing_required_argument() {
        let f = Callable::new(
            Signature::new("needs_one").param(Parameter::new("a")),
            |_| Ok(Value::Null),
        );
        assert!(f.call(vec![]).is_err());
    }

    #[test]
    fn option_into_value() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::from("x"));
    }
}
