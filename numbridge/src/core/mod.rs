//! Host-agnostic translation layer.
//!
//! This module holds the two components that sit between the native core and
//! a host runtime:
//!
//! - [`registry`] - Exception type registry: creates and binds one host
//!   exception type per [`ErrorKind`](crate::ErrorKind) and answers lookups.
//! - [`translator`] - Boundary translator: wraps native calls and converts
//!   escaping errors into host exceptions.
//! - [`host`] - The [`HostRuntime`] trait both components are written against.
//!
//! # Example
//!
//! ```
//! use numbridge::core::{BoundaryTranslator, ExceptionRegistry};
//! use numbridge::mocks::{MockHost, MockModule};
//! use numbridge::{BridgeConfig, NativeError};
//!
//! let host = MockHost::new();
//! let module = MockModule::new("numbridge");
//! let config = BridgeConfig::default();
//!
//! let registry = ExceptionRegistry::initialize(&host, &module, &config)?;
//! let translator = BoundaryTranslator::new(&registry, &config);
//!
//! let err = translator
//!     .guard(&host, || -> Result<(), NativeError> {
//!         Err(NativeError::dimension("shapes (2,3) and (4,5) are incompatible"))
//!     })
//!     .unwrap_err();
//!
//! assert_eq!(err.exception_type().name(), "DimensionError");
//! assert_eq!(err.message(), "shapes (2,3) and (4,5) are incompatible");
//! # Ok::<(), numbridge::mocks::MockHostError>(())
//! ```

pub mod host;
pub mod registry;
pub mod translator;

pub use host::HostRuntime;
pub use registry::{ExceptionRegistry, RegisteredException};
pub use translator::BoundaryTranslator;
