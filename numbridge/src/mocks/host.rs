use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::iter;
use std::sync::Arc;

use thiserror::Error;

use crate::core::HostRuntime;

#[derive(Debug)]
struct TypeObject {
    qualified_name: String,
    doc: String,
    base: Option<MockExceptionType>,
}

/// Exception type object of the mock host.
///
/// Clones share identity; two separately created types are never equal even
/// when their names match.
#[derive(Debug, Clone)]
pub struct MockExceptionType(Arc<TypeObject>);

impl MockExceptionType {
    fn new(qualified_name: &str, doc: &str, base: Option<&MockExceptionType>) -> Self {
        Self(Arc::new(TypeObject {
            qualified_name: qualified_name.to_owned(),
            doc: doc.to_owned(),
            base: base.cloned(),
        }))
    }

    /// Unqualified name.
    #[must_use]
    pub fn name(&self) -> &str {
        let qualified = self.qualified_name();
        qualified.rsplit_once('.').map_or(qualified, |(_, name)| name)
    }

    /// Qualified name (`module.Name`).
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.0.qualified_name
    }

    /// Docstring.
    #[must_use]
    pub fn doc(&self) -> &str {
        &self.0.doc
    }

    /// Direct base type, `None` for the root.
    #[must_use]
    pub fn base(&self) -> Option<&MockExceptionType> {
        self.0.base.as_ref()
    }

    /// Type identity.
    #[must_use]
    pub fn is(&self, other: &MockExceptionType) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether `self` is `other` or derives from it.
    #[must_use]
    pub fn is_subclass_of(&self, other: &MockExceptionType) -> bool {
        iter::successors(Some(self), |ty| ty.base()).any(|ty| ty.is(other))
    }
}

impl PartialEq for MockExceptionType {
    fn eq(&self, other: &Self) -> bool {
        self.is(other)
    }
}

impl Eq for MockExceptionType {}

/// Exception instance of the mock host.
#[derive(Debug, Clone)]
pub struct MockException {
    ty: MockExceptionType,
    message: String,
    cause: Option<Box<MockException>>,
}

impl MockException {
    /// Exact type of this exception.
    #[must_use]
    pub const fn exception_type(&self) -> &MockExceptionType {
        &self.ty
    }

    /// Message the exception was constructed with.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Attached cause.
    #[must_use]
    pub fn cause(&self) -> Option<&MockException> {
        self.cause.as_deref()
    }

    /// This exception followed by its causes, outermost first.
    pub fn chain(&self) -> impl Iterator<Item = &MockException> {
        iter::successors(Some(self), |exc| exc.cause())
    }

    /// Whether a handler for `ty` would catch this exception.
    #[must_use]
    pub fn is_instance(&self, ty: &MockExceptionType) -> bool {
        self.ty.is_subclass_of(ty)
    }
}

impl fmt::Display for MockException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.ty.qualified_name(), self.message)
    }
}

/// Module namespace of the mock host.
#[derive(Debug, Default)]
pub struct MockModule {
    name: String,
    attrs: RefCell<BTreeMap<String, MockExceptionType>>,
}

impl MockModule {
    /// Create an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: RefCell::default(),
        }
    }

    /// Module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type bound under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<MockExceptionType> {
        self.attrs.borrow().get(name).cloned()
    }

    /// Bind `ty` under `name`, replacing any previous binding.
    pub fn insert(&self, name: impl Into<String>, ty: MockExceptionType) {
        self.attrs.borrow_mut().insert(name.into(), ty);
    }

    /// Remove the binding of `name`, returning the type it held.
    pub fn remove(&self, name: &str) -> Option<MockExceptionType> {
        self.attrs.borrow_mut().remove(name)
    }

    /// Bound names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.attrs.borrow().keys().cloned().collect()
    }
}

/// Failure injected into the mock host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MockHostError {
    /// Type creation was configured to fail for this qualified name.
    #[error("cannot create exception type `{0}`")]
    TypeCreation(String),

    /// Binding was configured to fail for this name.
    #[error("cannot bind `{0}` into module")]
    Bind(String),
}

/// In-process host runtime.
#[derive(Debug, Clone)]
pub struct MockHost {
    root: MockExceptionType,
    fail_on: Option<String>,
    fail_bind_on: Option<String>,
}

impl MockHost {
    /// Create a host whose root exception type is `builtins.Exception`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: MockExceptionType::new("builtins.Exception", "Common base class for all exceptions.", None),
            fail_on: None,
            fail_bind_on: None,
        }
    }

    /// Create a host that refuses to create the type named `qualified_name`.
    pub fn failing_on(qualified_name: impl Into<String>) -> Self {
        Self {
            fail_on: Some(qualified_name.into()),
            ..Self::new()
        }
    }

    /// Create a host that refuses to bind anything under `name`.
    pub fn failing_bind_on(name: impl Into<String>) -> Self {
        Self {
            fail_bind_on: Some(name.into()),
            ..Self::new()
        }
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRuntime for MockHost {
    type Module = MockModule;
    type ExceptionType = MockExceptionType;
    type Exception = MockException;
    type Error = MockHostError;

    fn root_exception_type(&self) -> MockExceptionType {
        self.root.clone()
    }

    fn is_bound(&self, module: &MockModule, name: &str) -> Result<bool, MockHostError> {
        Ok(module.attrs.borrow().contains_key(name))
    }

    fn create_exception_type(
        &self,
        qualified_name: &str,
        doc: &str,
        base: &MockExceptionType,
    ) -> Result<MockExceptionType, MockHostError> {
        if self.fail_on.as_deref() == Some(qualified_name) {
            return Err(MockHostError::TypeCreation(qualified_name.to_owned()));
        }
        Ok(MockExceptionType::new(qualified_name, doc, Some(base)))
    }

    fn bind(&self, module: &MockModule, name: &str, ty: &MockExceptionType) -> Result<(), MockHostError> {
        if self.fail_bind_on.as_deref() == Some(name) {
            return Err(MockHostError::Bind(name.to_owned()));
        }
        module.insert(name, ty.clone());
        Ok(())
    }

    fn unbind(&self, module: &MockModule, name: &str) -> Result<(), MockHostError> {
        module.remove(name);
        Ok(())
    }

    fn new_exception(&self, ty: &MockExceptionType, message: &str) -> MockException {
        MockException {
            ty: ty.clone(),
            message: message.to_owned(),
            cause: None,
        }
    }

    fn set_cause(&self, exception: &mut MockException, cause: MockException) {
        exception.cause = Some(Box::new(cause));
    }
}
