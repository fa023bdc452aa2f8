//! Python host binding using PyO3.
//!
//! Installs the native exception hierarchy into a Python module and exposes
//! [`guard`], which every bound function uses to run native code.
//!
//! # Usage from Python
//!
//! ```python
//! import numbridge
//!
//! try:
//!     numbridge.raise_native_error("DimensionError", "shapes (2,3) and (4,5) are incompatible")
//! except numbridge.DimensionError as exc:
//!     print(exc)                                   # shapes (2,3) and (4,5) are incompatible
//!     assert isinstance(exc, numbridge.NumbridgeError)
//! ```
//!
//! # Writing bound functions
//!
//! ```rust,ignore
//! #[pyfunction(pass_module)]
//! fn matmul(module: &Bound<'_, PyModule>, a: Vec<f32>, b: Vec<f32>) -> PyResult<Vec<f32>> {
//!     numbridge::python::guard(module, || core_matmul(&a, &b))
//! }
//! ```

use std::ffi::CString;
use std::fmt;

use pyo3::exceptions::{PyException, PyRuntimeError};
use pyo3::prelude::*;
use pyo3::types::PyType;

use crate::config::BridgeConfig;
use crate::core::{BoundaryTranslator, ExceptionRegistry, HostRuntime};
use crate::error::{BoxError, ErrorKind, NativeError};

/// Module attribute holding the registry.
const REGISTRY_ATTR: &str = "__numbridge_registry__";

/// CPython as a [`HostRuntime`].
#[derive(Clone, Copy)]
pub struct PyHost<'py> {
    py: Python<'py>,
}

impl fmt::Debug for PyHost<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PyHost").finish_non_exhaustive()
    }
}

impl<'py> PyHost<'py> {
    /// Wrap a GIL token.
    #[must_use]
    pub const fn new(py: Python<'py>) -> Self {
        Self { py }
    }
}

impl<'py> HostRuntime for PyHost<'py> {
    type Module = Bound<'py, PyModule>;
    type ExceptionType = Py<PyType>;
    type Exception = PyErr;
    type Error = PyErr;

    fn root_exception_type(&self) -> Py<PyType> {
        self.py.get_type::<PyException>().unbind()
    }

    fn is_bound(&self, module: &Bound<'py, PyModule>, name: &str) -> PyResult<bool> {
        module.hasattr(name)
    }

    fn create_exception_type(
        &self,
        qualified_name: &str,
        doc: &str,
        base: &Py<PyType>,
    ) -> PyResult<Py<PyType>> {
        let name = CString::new(qualified_name)?;
        let doc = CString::new(doc)?;
        PyErr::new_type(self.py, &name, Some(doc.as_c_str()), Some(base.bind(self.py)), None)
    }

    fn bind(&self, module: &Bound<'py, PyModule>, name: &str, ty: &Py<PyType>) -> PyResult<()> {
        module.add(name, ty.clone_ref(self.py))
    }

    fn unbind(&self, module: &Bound<'py, PyModule>, name: &str) -> PyResult<()> {
        module.delattr(name)
    }

    fn new_exception(&self, ty: &Py<PyType>, message: &str) -> PyErr {
        PyErr::from_type(ty.bind(self.py).clone(), message.to_owned())
    }

    fn set_cause(&self, exception: &mut PyErr, cause: PyErr) {
        exception.set_cause(self.py, Some(cause));
    }
}

/// Registry and configuration stored in the module namespace.
#[pyclass(frozen, name = "_ExceptionRegistry", module = "numbridge")]
struct RegistryHandle {
    registry: ExceptionRegistry<Py<PyType>>,
    config: BridgeConfig,
}

/// Install the exception hierarchy into `module`.
///
/// Reads [`BridgeConfig::from_env`] and qualifies the type names with the
/// module's own `__name__`. Call once from the module initializer.
///
/// # Errors
///
/// Returns the Python error raised while creating or binding a type.
///
/// # Panics
///
/// Panics if the module has already been initialized.
pub fn init_module(module: &Bound<'_, PyModule>) -> PyResult<()> {
    let config = BridgeConfig::from_env().with_module_name(module.name()?.to_string());
    init_module_with_config(module, config)
}

/// Install the exception hierarchy into `module` using `config`.
///
/// Type names are qualified with `config.module_name` as given.
///
/// # Errors
///
/// Returns the Python error raised while creating or binding a type.
///
/// # Panics
///
/// Panics if the module has already been initialized.
pub fn init_module_with_config(module: &Bound<'_, PyModule>, config: BridgeConfig) -> PyResult<()> {
    let host = PyHost::new(module.py());
    let registry = ExceptionRegistry::initialize(&host, module, &config)?;
    module.add(REGISTRY_ATTR, RegistryHandle { registry, config })
}

/// Run native code and raise any error it returns as the registered Python
/// exception.
///
/// # Errors
///
/// Returns the translated exception, or `RuntimeError` if `module` was never
/// initialized.
pub fn guard<R, E, F>(module: &Bound<'_, PyModule>, call: F) -> PyResult<R>
where
    F: FnOnce() -> Result<R, E>,
    E: Into<BoxError>,
{
    let handle = registry_handle(module)?;
    let handle = handle.get();
    let translator = BoundaryTranslator::new(&handle.registry, &handle.config);
    translator.guard(&PyHost::new(module.py()), call)
}

fn registry_handle<'py>(module: &Bound<'py, PyModule>) -> PyResult<Bound<'py, RegistryHandle>> {
    let attr = module.getattr(REGISTRY_ATTR).map_err(|_| {
        PyRuntimeError::new_err("numbridge exception registry is not initialized; call init_module first")
    })?;
    Ok(attr.downcast_into::<RegistryHandle>()?)
}

/// Version of the native library.
#[pyfunction]
fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Raise a native error of the named kind through the host boundary.
///
/// `kind` is a registered exception name such as `"DtypeError"`. Names that
/// match no kind raise the generic `NumbridgeError`.
///
/// # Example
/// ```python
/// with pytest.raises(numbridge.DeviceError, match="cuda:3"):
///     numbridge.raise_native_error("DeviceError", "cuda:3 is not available")
/// ```
#[pyfunction(pass_module)]
fn raise_native_error(module: &Bound<'_, PyModule>, kind: &str, message: &str) -> PyResult<()> {
    guard(module, || -> Result<(), BoxError> {
        match kind.parse::<ErrorKind>() {
            Ok(kind) => Err(NativeError::new(kind, message).into()),
            Err(_) => Err(message.into()),
        }
    })
}

#[pymodule]
fn numbridge(m: &Bound<'_, PyModule>) -> PyResult<()> {
    init_module(m)?;

    m.add_function(wrap_pyfunction!(version, m)?)?;
    m.add_function(wrap_pyfunction!(raise_native_error, m)?)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use pyo3::types::PyDict;

    use super::*;

    fn with_module(test: impl for<'py> FnOnce(Python<'py>, &Bound<'py, PyModule>)) {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let module = PyModule::new(py, "numbridge").unwrap();
            init_module_with_config(&module, BridgeConfig::default()).unwrap();
            module
                .add_function(wrap_pyfunction!(raise_native_error, &module).unwrap())
                .unwrap();
            test(py, &module);
        });
    }

    #[test]
    fn test_dimension_error_scenario() {
        with_module(|py, module| {
            let err = guard(module, || -> Result<(), NativeError> {
                Err(NativeError::dimension("shapes (2,3) and (4,5) are incompatible"))
            })
            .unwrap_err();

            let expected = module.getattr("DimensionError").unwrap();
            let base = module.getattr("NumbridgeError").unwrap();
            assert!(err.get_type(py).is(&expected));
            assert!(err.get_type(py).is_subclass(&base).unwrap());
            assert_eq!(err.value(py).to_string(), "shapes (2,3) and (4,5) are incompatible");
        });
    }

    #[test]
    fn test_foreign_error_uses_generic_type() {
        with_module(|py, module| {
            let err = guard(module, || -> Result<(), BoxError> { Err("unexpected backend fault".into()) })
                .unwrap_err();

            let base = module.getattr("NumbridgeError").unwrap();
            assert!(err.get_type(py).is(&base));
            assert_eq!(err.value(py).to_string(), "unexpected backend fault");
        });
    }

    #[test]
    fn test_cause_is_attached() {
        with_module(|py, module| {
            let err = guard(module, || -> Result<(), NativeError> {
                Err(NativeError::backend("kernel launch failed")
                    .with_source(NativeError::out_of_memory("cannot allocate 4096 bytes")))
            })
            .unwrap_err();

            let cause = err.cause(py).expect("cause should be chained");
            let oom = module.getattr("OutOfMemoryError").unwrap();
            assert!(cause.get_type(py).is(&oom));
            assert_eq!(cause.value(py).to_string(), "cannot allocate 4096 bytes");
        });
    }

    #[test]
    fn test_exceptions_catchable_from_python() {
        with_module(|py, module| {
            let globals = PyDict::new(py);
            globals.set_item("nb", module).unwrap();
            py.run(
                c"
for name in ['ContextError', 'BackendError', 'DeviceError', 'DimensionError', 'DtypeError',
             'NotImplementedError', 'GradientError', 'GradientCheckError', 'OutOfMemoryError']:
    expected = getattr(nb, name)
    assert issubclass(expected, nb.NumbridgeError)
    assert issubclass(nb.NumbridgeError, Exception)
    assert expected.__module__ == 'numbridge'
    try:
        nb.raise_native_error(name, 'message for ' + name)
    except nb.NumbridgeError as exc:
        assert type(exc) is expected, type(exc)
        assert str(exc) == 'message for ' + name
    else:
        raise AssertionError('nothing raised for ' + name)

try:
    nb.raise_native_error('FutureError', 'unexpected backend fault')
except nb.NumbridgeError as exc:
    assert type(exc) is nb.NumbridgeError
    assert str(exc) == 'unexpected backend fault'
",
                Some(&globals),
                None,
            )
            .unwrap();
        });
    }

    #[test]
    fn test_double_initialization_is_fatal() {
        with_module(|_py, module| {
            let before = module.getattr("DtypeError").unwrap();

            let second = panic::catch_unwind(AssertUnwindSafe(|| {
                init_module_with_config(module, BridgeConfig::default())
            }));
            assert!(second.is_err());
            assert!(module.getattr("DtypeError").unwrap().is(&before));
        });
    }

    #[test]
    fn test_init_module_qualifies_with_module_name() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let module = PyModule::new(py, "tensorlib").unwrap();
            init_module(&module).unwrap();

            let dimension = module.getattr("DimensionError").unwrap();
            let owner: String = dimension.getattr("__module__").unwrap().extract().unwrap();
            assert_eq!(owner, "tensorlib");
        });
    }

    #[test]
    fn test_namespace_inspection_error_propagates() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let module = PyModule::new(py, "locked").unwrap();
            let globals = PyDict::new(py);
            py.run(
                c"def __getattr__(name):\n    raise ValueError('namespace is locked')\n",
                Some(&globals),
                None,
            )
            .unwrap();
            let getattr = globals.get_item("__getattr__").unwrap().unwrap();
            module.setattr("__getattr__", getattr).unwrap();

            let err = init_module_with_config(&module, BridgeConfig::default()).unwrap_err();
            assert!(err.is_instance_of::<pyo3::exceptions::PyValueError>(py));
        });
    }

    #[test]
    fn test_debug_does_not_expose_interpreter() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            assert_eq!(format!("{:?}", PyHost::new(py)), "PyHost { .. }");
        });
    }

    #[test]
    fn test_guard_requires_initialized_module() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let module = PyModule::new(py, "uninitialized").unwrap();
            let err = guard(&module, || Ok::<_, NativeError>(())).unwrap_err();
            assert!(err.is_instance_of::<PyRuntimeError>(py));
        });
    }
}
