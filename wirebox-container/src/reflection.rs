//! Runtime type catalogue standing in for host reflection.
//!
//! Rust has no runtime reflection, so classes the container may build are
//! described up front with a [`ClassDescriptor`]: its supertypes, its
//! constructor signature and body, its methods and its property setters.
//! The container only talks to the narrow [`Reflector`] trait;
//! [`TypeCatalog`] is the stock implementation.
//!
//! # Examples
//! ```
//! use wirebox_container::reflection::{ClassDescriptor, Parameter, Reflector, Signature, TypeCatalog};
//! use wirebox_container::value::Value;
//!
//! struct Greeter { greeting: String }
//!
//! let catalog = TypeCatalog::new();
//! catalog.register(
//!     ClassDescriptor::new("Greeter")
//!         .implements("Service")
//!         .constructor(
//!             Signature::new("Greeter::new")
//!                 .param(Parameter::new("greeting").builtin("string").default_value("hello")),
//!             |args| Ok(Greeter { greeting: args[0].as_str().unwrap_or_default().to_string() }),
//!         ),
//! );
//!
//! let greeter = catalog.construct("Greeter", vec![]).unwrap();
//! assert!(catalog.is_a(&greeter, "Service"));
//! assert_eq!(greeter.downcast_ref::<Greeter>().unwrap().greeting, "hello");
//! ```

use std::any::{Any, type_name};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace};

use crate::error::{ContainerError, Result};
use crate::value::{Instance, Value};

/// Declared type of a parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeHint {
    /// A class or interface name.
    Class(String),
    /// A scalar or union type name such as `"int"` or `"int|string"`.
    Builtin(String),
}

/// One formal parameter of a function, method or constructor.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: String,
    type_hint: Option<TypeHint>,
    default: Option<Value>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            default: None,
        }
    }

    /// Declares a class or interface type.
    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.type_hint = Some(TypeHint::Class(class.into()));
        self
    }

    /// Declares a scalar or union type.
    pub fn builtin(mut self, type_name: impl Into<String>) -> Self {
        self.type_hint = Some(TypeHint::Builtin(type_name.into()));
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_hint(&self) -> Option<&TypeHint> {
        self.type_hint.as_ref()
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Ordered formal parameters of a named function.
#[derive(Debug, Clone, Default)]
pub struct Signature {
    function: String,
    parameters: Vec<Parameter>,
}

impl Signature {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            parameters: Vec::new(),
        }
    }

    pub fn param(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Name of the enclosing function or method.
    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Fills missing trailing arguments from defaults.
    ///
    /// # Errors
    /// [`ContainerError::Construction`] when a parameter without default
    /// receives no argument.
    pub fn complete(&self, mut args: Vec<Value>) -> Result<Vec<Value>> {
        for parameter in self.parameters.iter().skip(args.len()) {
            match &parameter.default {
                Some(default) => args.push(default.clone()),
                None => {
                    let required = self
                        .parameters
                        .iter()
                        .filter(|p| p.default.is_none())
                        .count();
                    return Err(ContainerError::construction(
                        self.function.clone(),
                        format!(
                            "expects at least {required} argument(s), {} given",
                            args.len()
                        ),
                    ));
                }
            }
        }
        Ok(args)
    }
}

type ConstructorFn = dyn Fn(Vec<Value>) -> Result<Instance> + Send + Sync;
type MethodFn = dyn Fn(&Instance, Vec<Value>) -> Result<Value> + Send + Sync;
type SetterFn = dyn Fn(&Instance, Value) -> Result<()> + Send + Sync;

struct Constructor {
    signature: Signature,
    body: Arc<ConstructorFn>,
}

struct Method {
    signature: Signature,
    body: Arc<MethodFn>,
}

/// Describes one class to the catalogue.
///
/// A descriptor without a constructor describes an interface or abstract
/// type: it takes part in "is-a" checks but cannot be instantiated.
pub struct ClassDescriptor {
    name: String,
    supertypes: Vec<String>,
    constructor: Option<Constructor>,
    methods: HashMap<String, Method>,
    properties: HashMap<String, Arc<SetterFn>>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            supertypes: Vec::new(),
            constructor: None,
            methods: HashMap::new(),
            properties: HashMap::new(),
        }
    }

    /// Declares a parent class.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.supertypes.push(parent.into());
        self
    }

    /// Declares an implemented interface.
    pub fn implements(self, interface: impl Into<String>) -> Self {
        self.extends(interface)
    }

    /// Sets the constructor; `body` receives positional arguments.
    pub fn constructor<T, F>(mut self, signature: Signature, body: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(Vec<Value>) -> Result<T> + Send + Sync + 'static,
    {
        let class: Arc<str> = Arc::from(self.name.as_str());
        self.constructor = Some(Constructor {
            signature,
            body: Arc::new(move |args: Vec<Value>| Ok(Instance::new(class.clone(), body(args)?))),
        });
        self
    }

    /// Adds a method callable on instances holding a `T`.
    pub fn method<T, F>(mut self, name: impl Into<String>, signature: Signature, body: F) -> Self
    where
        T: Any,
        F: Fn(&T, Vec<Value>) -> Result<Value> + Send + Sync + 'static,
    {
        let name = name.into();
        let member = format!("{}::{}", self.name, name);
        self.methods.insert(
            name,
            Method {
                signature,
                body: Arc::new(move |instance: &Instance, args: Vec<Value>| {
                    body(receiver::<T>(instance, &member)?, args)
                }),
            },
        );
        self
    }

    /// Adds a property setter on instances holding a `T`.
    pub fn property<T, F>(mut self, name: impl Into<String>, setter: F) -> Self
    where
        T: Any,
        F: Fn(&T, Value) -> Result<()> + Send + Sync + 'static,
    {
        let name = name.into();
        let member = format!("{}::${}", self.name, name);
        self.properties.insert(
            name,
            Arc::new(move |instance: &Instance, value: Value| {
                setter(receiver::<T>(instance, &member)?, value)
            }),
        );
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn supertypes(&self) -> &[String] {
        &self.supertypes
    }

    /// False for interfaces and abstract types.
    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }
}

impl fmt::Debug for ClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDescriptor")
            .field("name", &self.name)
            .field("supertypes", &self.supertypes)
            .field("instantiable", &self.is_instantiable())
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("properties", &self.properties.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn receiver<'a, T: Any>(instance: &'a Instance, member: &str) -> Result<&'a T> {
    instance.downcast_ref::<T>().ok_or_else(|| {
        ContainerError::construction(
            instance.class().to_string(),
            format!("{member} expects a receiver of type {}", type_name::<T>()),
        )
    })
}

/// The reflection capability the container depends on.
pub trait Reflector: Send + Sync {
    /// True if `class` can be described, instantiable or not.
    fn class_exists(&self, class: &str) -> bool;

    /// Constructor signature of `class`.
    fn constructor_signature(&self, class: &str) -> Result<Signature>;

    /// Instantiates `class` with positional arguments.
    fn construct(&self, class: &str, args: Vec<Value>) -> Result<Instance>;

    /// Subtype test: `instance` is a `type_name` or inherits from it.
    fn is_a(&self, instance: &Instance, type_name: &str) -> bool;

    /// Invokes `method` on `instance`.
    fn invoke_method(&self, instance: &Instance, method: &str, args: Vec<Value>) -> Result<Value>;

    /// Assigns `value` to `property` on `instance`.
    fn set_property(&self, instance: &Instance, property: &str, value: Value) -> Result<()>;
}

/// Thread-safe catalogue of class descriptors.
#[derive(Default)]
pub struct TypeCatalog {
    classes: DashMap<String, Arc<ClassDescriptor>>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a class description.
    pub fn register(&self, descriptor: ClassDescriptor) -> &Self {
        debug!(
            class = %descriptor.name,
            supertypes = ?descriptor.supertypes,
            instantiable = descriptor.is_instantiable(),
            "Registered class"
        );
        self.classes.insert(descriptor.name.clone(), Arc::new(descriptor));
        self
    }

    pub fn descriptor(&self, class: &str) -> Option<Arc<ClassDescriptor>> {
        self.classes.get(class).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Descriptors of `class` and its known ancestors, nearest first.
    fn lineage(&self, class: &str) -> Vec<Arc<ClassDescriptor>> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([class.to_string()]);
        let mut lineage = Vec::new();

        while let Some(name) = queue.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(descriptor) = self.descriptor(&name) {
                queue.extend(descriptor.supertypes.iter().cloned());
                lineage.push(descriptor);
            }
        }
        lineage
    }

    fn instantiable(&self, class: &str) -> Result<Arc<ClassDescriptor>> {
        let descriptor = self.descriptor(class).ok_or_else(|| {
            ContainerError::construction(class.to_string(), format!("class {class} does not exist"))
        })?;
        if !descriptor.is_instantiable() {
            return Err(ContainerError::construction(
                class.to_string(),
                format!("{class} is not instantiable"),
            ));
        }
        Ok(descriptor)
    }
}

impl Reflector for TypeCatalog {
    fn class_exists(&self, class: &str) -> bool {
        self.classes.contains_key(class)
    }

    fn constructor_signature(&self, class: &str) -> Result<Signature> {
        let descriptor = self.instantiable(class)?;
        Ok(descriptor
            .constructor
            .as_ref()
            .map(|ctor| ctor.signature.clone())
            .unwrap_or_default())
    }

    fn construct(&self, class: &str, args: Vec<Value>) -> Result<Instance> {
        let descriptor = self.instantiable(class)?;
        let Some(ctor) = descriptor.constructor.as_ref() else {
            return Err(ContainerError::construction(
                class.to_string(),
                format!("{class} is not instantiable"),
            ));
        };
        trace!(class = %class, args = args.len(), "Constructing instance");
        let args = ctor.signature.complete(args)?;
        (ctor.body)(args)
    }

    fn is_a(&self, instance: &Instance, type_name: &str) -> bool {
        if instance.class() == type_name {
            return true;
        }

        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([instance.class().to_string()]);
        while let Some(name) = queue.pop_front() {
            if name == type_name {
                return true;
            }
            if !seen.insert(name.clone()) {
                continue;
            }
            if let Some(descriptor) = self.descriptor(&name) {
                queue.extend(descriptor.supertypes.iter().cloned());
            }
        }
        false
    }

    fn invoke_method(&self, instance: &Instance, method: &str, args: Vec<Value>) -> Result<Value> {
        let lineage = self.lineage(instance.class());
        let Some(found) = lineage.iter().find_map(|d| d.methods.get(method)) else {
            return Err(ContainerError::construction(
                instance.class().to_string(),
                format!("call to undefined method {}::{method}", instance.class()),
            ));
        };
        trace!(class = %instance.class(), method = %method, "Invoking method");
        let args = found.signature.complete(args)?;
        (found.body)(instance, args)
    }

    fn set_property(&self, instance: &Instance, property: &str, value: Value) -> Result<()> {
        let lineage = self.lineage(instance.class());
        let Some(setter) = lineage.iter().find_map(|d| d.properties.get(property)) else {
            return Err(ContainerError::construction(
                instance.class().to_string(),
                format!("undefined property {}::${property}", instance.class()),
            ));
        };
        trace!(class = %instance.class(), property = %property, "Setting property");
        setter(instance, value)
    }
}

impl fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeCatalog")
            .field("classes", &self.classes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct Dog {
        name: Mutex<String>,
    }

    fn catalog() -> TypeCatalog {
        let catalog = TypeCatalog::new();
        catalog
            .register(ClassDescriptor::new("Animal"))
            .register(ClassDescriptor::new("Pet").extends("Animal"))
            .register(
                ClassDescriptor::new("Dog")
                    .extends("Pet")
                    .implements("Loud")
                    .constructor(
                        Signature::new("Dog::new")
                            .param(Parameter::new("name").builtin("string").default_value("rex")),
                        |args| {
                            Ok(Dog {
                                name: Mutex::new(args[0].as_str().unwrap_or_default().to_string()),
                            })
                        },
                    )
                    .method::<Dog, _>(
                        "rename",
                        Signature::new("Dog::rename").param(Parameter::new("name")),
                        |dog, args| {
                            *dog.name.lock() = args[0].as_str().unwrap_or_default().to_string();
                            Ok(Value::Null)
                        },
                    )
                    .property::<Dog, _>("name", |dog, value| {
                        *dog.name.lock() = value.as_str().unwrap_or_default().to_string();
                        Ok(())
                    }),
            );
        catalog
    }

    #[test]
    fn construct_with_defaults() {
        let catalog = catalog();
        let dog = catalog.construct("Dog", vec![]).unwrap();
        assert_eq!(dog.class(), "Dog");
        assert_eq!(*dog.downcast_ref::<Dog>().unwrap().name.lock(), "rex");
    }

    #[test]
    fn construct_unknown_class_fails() {
        let err = catalog().construct("Cat", vec![]).unwrap_err();
        assert!(matches!(err, ContainerError::Construction { .. }));
    }

    #[test]
    fn construct_interface_fails() {
        let catalog = catalog();
        assert!(catalog.class_exists("Animal"));
        let err = catalog.construct("Animal", vec![]).unwrap_err();
        assert!(format!("{err}").contains("not instantiable"));
        assert!(catalog.constructor_signature("Animal").is_err());
    }

    #[test]
    fn is_a_walks_supertypes() {
        let catalog = catalog();
        let dog = catalog.construct("Dog", vec![]).unwrap();
        assert!(catalog.is_a(&dog, "Dog"));
        assert!(catalog.is_a(&dog, "Pet"));
        assert!(catalog.is_a(&dog, "Animal"));
        assert!(catalog.is_a(&dog, "Loud"));
        assert!(!catalog.is_a(&dog, "Cat"));
    }

    #[test]
    fn methods_and_properties() {
        let catalog = catalog();
        let dog = catalog.construct("Dog", vec![Value::from("fido")]).unwrap();

        catalog
            .invoke_method(&dog, "rename", vec![Value::from("max")])
            .unwrap();
        assert_eq!(*dog.downcast_ref::<Dog>().unwrap().name.lock(), "max");

        catalog
            .set_property(&dog, "name", Value::from("buddy"))
            .unwrap();
        assert_eq!(*dog.downcast_ref::<Dog>().unwrap().name.lock(), "buddy");

        assert!(catalog.invoke_method(&dog, "fetch", vec![]).is_err());
        assert!(catalog.set_property(&dog, "age", Value::from(3)).is_err());
    }

    #[test]
    fn method_arity_is_checked() {
        let catalog = catalog();
        let dog = catalog.construct("Dog", vec![]).unwrap();
        let err = catalog.invoke_method(&dog, "rename", vec![]).unwrap_err();
        assert!(format!("{err}").contains("Dog::rename"));
    }

    #[test]
    fn receiver_type_is_checked() {
        let catalog = catalog();
        let impostor = Instance::new("Dog", 42u8);
        assert!(catalog.set_property(&impostor, "name", Value::from("x")).is_err());
    }

    #[test]
    fn supertype_cycles_terminate() {
        let catalog = TypeCatalog::new();
        catalog
            .register(
                ClassDescriptor::new("A")
                    .extends("B")
                    .constructor(Signature::new("A::new"), |_| Ok(())),
            )
            .register(ClassDescriptor::new("B").extends("A"));
        let a = catalog.construct("A", vec![]).unwrap();
        assert!(catalog.is_a(&a, "B"));
        assert!(!catalog.is_a(&a, "C"));
    }
}
