//! The seam between the translation layer and a host runtime.

/// A host runtime whose exception system receives translated native errors.
///
/// The registry creates and binds exception types through this trait and the
/// translator builds exception instances with it. Implementations ship for
/// CPython (`python::PyHost`, feature `python`) and for tests
/// ([`MockHost`](crate::mocks::MockHost)).
pub trait HostRuntime {
    /// Handle to a module namespace.
    type Module;
    /// Exception type object.
    type ExceptionType;
    /// Exception instance, ready to be raised in the host.
    type Exception;
    /// Failure reported by the host while installing types.
    type Error;

    /// Root type that the registered base exception derives from.
    fn root_exception_type(&self) -> Self::ExceptionType;

    /// Whether `name` is already bound in `module`.
    fn is_bound(&self, module: &Self::Module, name: &str) -> Result<bool, Self::Error>;

    /// Create a new exception type.
    ///
    /// `qualified_name` has the form `module.Name`.
    fn create_exception_type(
        &self,
        qualified_name: &str,
        doc: &str,
        base: &Self::ExceptionType,
    ) -> Result<Self::ExceptionType, Self::Error>;

    /// Bind `ty` into `module` under `name`.
    fn bind(
        &self,
        module: &Self::Module,
        name: &str,
        ty: &Self::ExceptionType,
    ) -> Result<(), Self::Error>;

    /// Remove the binding of `name` from `module`.
    ///
    /// Used to roll back a partially completed registration.
    fn unbind(&self, module: &Self::Module, name: &str) -> Result<(), Self::Error>;

    /// Construct an exception of type `ty` carrying `message` unchanged.
    fn new_exception(&self, ty: &Self::ExceptionType, message: &str) -> Self::Exception;

    /// Attach `cause` as the cause of `exception`.
    fn set_cause(&self, exception: &mut Self::Exception, cause: Self::Exception);
}
