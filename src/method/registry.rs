//! Registry of callable methods keyed by exact signature.

use crate::expression::{EvalError, EvalResult, SynthesisError, SynthesisResult};
use crate::types::{TypeDesc, Value};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Implementation of a registered method.
///
/// Receives the receiver (`None` for static methods) and the evaluated arguments.
pub type MethodFn = dyn Fn(Option<&Value>, &[&Value]) -> EvalResult<Value> + Send + Sync;

/// How a method is invoked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dispatch {
    /// Called on a receiver value
    Instance,
    /// Called without a receiver
    Static,
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatch::Instance => write!(f, "an instance method"),
            Dispatch::Static => write!(f, "a static method"),
        }
    }
}

/// Method descriptor: declaring type, name and ordered parameter types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodKey {
    pub declaring: TypeDesc,
    pub name: String,
    pub parameters: Vec<TypeDesc>,
}

struct MethodDef {
    key: MethodKey,
    dispatch: Dispatch,
    return_type: TypeDesc,
    func: Box<MethodFn>,
}

/// Shared handle to a resolved method
#[derive(Clone)]
pub struct MethodRef(Arc<MethodDef>);

impl MethodRef {
    pub fn key(&self) -> &MethodKey {
        &self.0.key
    }

    pub fn declaring(&self) -> &TypeDesc {
        &self.0.key.declaring
    }

    pub fn name(&self) -> &str {
        &self.0.key.name
    }

    pub fn parameters(&self) -> &[TypeDesc] {
        &self.0.key.parameters
    }

    pub fn dispatch(&self) -> Dispatch {
        self.0.dispatch
    }

    pub fn return_type(&self) -> &TypeDesc {
        &self.0.return_type
    }

    /// `Type.Name` for messages
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.declaring(), self.name())
    }

    /// Invoke the implementation.
    ///
    /// Instance methods fail on a null or missing receiver, and a result that
    /// does not fit the declared return type is rejected rather than coerced.
    pub fn invoke(&self, receiver: Option<&Value>, args: &[&Value]) -> EvalResult<Value> {
        if self.dispatch() == Dispatch::Instance && receiver.map_or(true, Value::is_null) {
            return Err(EvalError::NullReference {
                target: self.qualified_name(),
            });
        }

        if args.len() != self.parameters().len() {
            return Err(EvalError::MethodFailed {
                method: self.qualified_name(),
                message: format!(
                    "expected {} arguments, got {}",
                    self.parameters().len(),
                    args.len()
                ),
            });
        }

        let result = (self.0.func)(receiver, args)?;
        if !result.is_compatible_with(self.return_type()) {
            return Err(EvalError::TypeMismatch {
                expected: self.return_type().to_string(),
                actual: format!("{:?}", result),
                context: format!("result of {}", self.qualified_name()),
            });
        }
        Ok(result)
    }
}

impl PartialEq for MethodRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.key == other.0.key && self.0.dispatch == other.0.dispatch)
    }
}

impl fmt::Debug for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let params: Vec<String> = self.parameters().iter().map(|p| p.to_string()).collect();
        write!(
            f,
            "MethodRef({:?} {}({}) -> {})",
            self.dispatch(),
            self.qualified_name(),
            params.join(", "),
            self.return_type()
        )
    }
}

/// Mapping from method descriptor to implementation.
///
/// Built once at configuration time and shared read-only afterwards.
#[derive(Default)]
pub struct MethodRegistry {
    methods: HashMap<MethodKey, MethodRef>,
}

impl MethodRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in string, numeric and boolean methods
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::method::builtins::define_builtins(&mut registry);
        debug!("method registry initialized with {} built-ins", registry.len());
        registry
    }

    /// Register a method called on a receiver of the declaring type
    pub fn register_instance<F>(
        &mut self,
        declaring: TypeDesc,
        name: impl Into<String>,
        parameters: Vec<TypeDesc>,
        return_type: TypeDesc,
        func: F,
    ) -> SynthesisResult<MethodRef>
    where
        F: Fn(&Value, &[&Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        self.register(
            MethodKey {
                declaring,
                name: name.into(),
                parameters,
            },
            Dispatch::Instance,
            return_type,
            move |receiver, args| match receiver {
                Some(receiver) => func(receiver, args),
                None => Err(EvalError::NullReference {
                    target: "instance method receiver".to_string(),
                }),
            },
        )
    }

    /// Register a method called without a receiver
    pub fn register_static<F>(
        &mut self,
        declaring: TypeDesc,
        name: impl Into<String>,
        parameters: Vec<TypeDesc>,
        return_type: TypeDesc,
        func: F,
    ) -> SynthesisResult<MethodRef>
    where
        F: Fn(&[&Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        self.register(
            MethodKey {
                declaring,
                name: name.into(),
                parameters,
            },
            Dispatch::Static,
            return_type,
            move |_, args| func(args),
        )
    }

    fn register<F>(
        &mut self,
        key: MethodKey,
        dispatch: Dispatch,
        return_type: TypeDesc,
        func: F,
    ) -> SynthesisResult<MethodRef>
    where
        F: Fn(Option<&Value>, &[&Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        if self.methods.contains_key(&key) {
            return Err(SynthesisError::DuplicateMethod {
                declaring: key.declaring,
                name: key.name,
                parameters: key.parameters,
            });
        }
        Ok(self.define(key, dispatch, return_type, func))
    }

    /// Insert a method, replacing any existing one with the same signature
    pub(super) fn define<F>(
        &mut self,
        key: MethodKey,
        dispatch: Dispatch,
        return_type: TypeDesc,
        func: F,
    ) -> MethodRef
    where
        F: Fn(Option<&Value>, &[&Value]) -> EvalResult<Value> + Send + Sync + 'static,
    {
        trace!(
            "registering {:?} method {}.{}",
            dispatch,
            key.declaring,
            key.name
        );
        let method = MethodRef(Arc::new(MethodDef {
            key: key.clone(),
            dispatch,
            return_type,
            func: Box::new(func),
        }));
        self.methods.insert(key, method.clone());
        method
    }

    /// Add the built-in methods to a registry that already holds custom ones.
    ///
    /// Fails without modifying the registry if any built-in signature is taken.
    pub fn register_builtins(&mut self) -> SynthesisResult<()> {
        let builtins = Self::with_builtins();
        if let Some(key) = builtins
            .methods
            .keys()
            .find(|key| self.methods.contains_key(*key))
        {
            return Err(SynthesisError::DuplicateMethod {
                declaring: key.declaring.clone(),
                name: key.name.clone(),
                parameters: key.parameters.clone(),
            });
        }
        self.methods.extend(builtins.methods);
        Ok(())
    }

    /// Resolve a method by exact declaring type, name and parameter types.
    ///
    /// No partial matching and no numeric widening is performed.
    pub fn resolve(
        &self,
        declaring: &TypeDesc,
        name: &str,
        parameters: &[TypeDesc],
    ) -> SynthesisResult<MethodRef> {
        let key = MethodKey {
            declaring: declaring.clone(),
            name: name.to_string(),
            parameters: parameters.to_vec(),
        };

        match self.methods.get(&key) {
            Some(method) => {
                trace!("resolved {:?}", method);
                Ok(method.clone())
            }
            None => {
                debug!(
                    "no method {}.{} with {} parameter(s)",
                    declaring,
                    name,
                    parameters.len()
                );
                Err(SynthesisError::MethodNotFound {
                    declaring: key.declaring,
                    name: key.name,
                    parameters: key.parameters,
                })
            }
        }
    }

    /// All registered overloads of `name` on `declaring`
    pub fn overloads(&self, declaring: &TypeDesc, name: &str) -> Vec<MethodRef> {
        let mut found: Vec<MethodRef> = self
            .methods
            .values()
            .filter(|m| m.declaring() == declaring && m.name() == name)
            .cloned()
            .collect();
        found.sort_by_key(|m| m.parameters().len());
        found
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with_double() -> MethodRegistry {
        let mut registry = MethodRegistry::new();
        registry
            .register_instance(
                TypeDesc::Int32,
                "IsDoubleOf",
                vec![TypeDesc::Int32],
                TypeDesc::Boolean,
                |receiver, args| match (receiver, args) {
                    (Value::Int32(a), [Value::Int32(b)]) => Ok(Value::Boolean(*a == b * 2)),
                    _ => Err(EvalError::MethodFailed {
                        method: "Int32.IsDoubleOf".to_string(),
                        message: "bad operands".to_string(),
                    }),
                },
            )
            .unwrap();
        registry
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = registry_with_double();
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());

        let method = registry
            .resolve(&TypeDesc::Int32, "IsDoubleOf", &[TypeDesc::Int32])
            .unwrap();
        assert_eq!(method.dispatch(), Dispatch::Instance);
        assert_eq!(method.return_type(), &TypeDesc::Boolean);
        assert_eq!(method.qualified_name(), "Int32.IsDoubleOf");

        let result = method
            .invoke(Some(&Value::Int32(8)), &[&Value::Int32(4)])
            .unwrap();
        assert_eq!(result, Value::Boolean(true));
    }

    #[test]
    fn test_resolve_requires_exact_signature() {
        let registry = registry_with_double();

        let err = registry
            .resolve(&TypeDesc::Int32, "IsDoubleOf", &[TypeDesc::Int64])
            .unwrap_err();
        assert!(matches!(err, SynthesisError::MethodNotFound { .. }));

        let err = registry
            .resolve(&TypeDesc::Int32, "IsDoubleOf", &[])
            .unwrap_err();
        assert!(matches!(err, SynthesisError::MethodNotFound { .. }));

        let err = registry
            .resolve(&TypeDesc::Int64, "IsDoubleOf", &[TypeDesc::Int32])
            .unwrap_err();
        assert!(matches!(err, SynthesisError::MethodNotFound { .. }));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = registry_with_double();
        let err = registry
            .register_static(
                TypeDesc::Int32,
                "IsDoubleOf",
                vec![TypeDesc::Int32],
                TypeDesc::Boolean,
                |_| Ok(Value::Boolean(false)),
            )
            .unwrap_err();
        assert_eq!(
            err,
            SynthesisError::DuplicateMethod {
                declaring: TypeDesc::Int32,
                name: "IsDoubleOf".to_string(),
                parameters: vec![TypeDesc::Int32],
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_invoke_null_receiver() {
        let registry = registry_with_double();
        let method = registry
            .resolve(&TypeDesc::Int32, "IsDoubleOf", &[TypeDesc::Int32])
            .unwrap();

        let err = method.invoke(Some(&Value::Null), &[&Value::Int32(1)]).unwrap_err();
        assert_eq!(
            err,
            EvalError::NullReference {
                target: "Int32.IsDoubleOf".to_string()
            }
        );

        let err = method.invoke(None, &[&Value::Int32(1)]).unwrap_err();
        assert!(matches!(err, EvalError::NullReference { .. }));
    }

    #[test]
    fn test_invoke_rejects_wrong_result_type() {
        let mut registry = MethodRegistry::new();
        let method = registry
            .register_static(
                TypeDesc::String,
                "Truthy",
                vec![TypeDesc::String],
                TypeDesc::Boolean,
                |_| Ok(Value::Int32(1)),
            )
            .unwrap();

        let err = method.invoke(None, &[&Value::from("x")]).unwrap_err();
        assert!(matches!(err, EvalError::TypeMismatch { .. }));
    }

    #[test]
    fn test_register_builtins_into_custom_registry() {
        let mut registry = registry_with_double();
        registry.register_builtins().unwrap();
        assert_eq!(registry.len(), MethodRegistry::with_builtins().len() + 1);

        // Second merge collides with itself
        let before = registry.len();
        let err = registry.register_builtins().unwrap_err();
        assert!(matches!(err, SynthesisError::DuplicateMethod { .. }));
        assert_eq!(registry.len(), before);
    }

    #[test]
    fn test_overloads() {
        let registry = MethodRegistry::with_builtins();
        let overloads = registry.overloads(&TypeDesc::String, "Contains");
        assert_eq!(overloads.len(), 2);
        assert_eq!(overloads[0].parameters(), &[TypeDesc::String]);
        assert_eq!(overloads[1].parameters().len(), 2);

        assert!(registry.overloads(&TypeDesc::String, "Frobnicate").is_empty());
    }
}
