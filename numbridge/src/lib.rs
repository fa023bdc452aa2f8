//! Error translation between a native numerical core and a dynamic host.
//!
//! `numbridge` sits at the boundary between native tensor code and a host
//! runtime such as CPython. Native code fails with a [`NativeError`] carrying
//! an [`ErrorKind`]; at the boundary each kind is raised as its own host
//! exception type, all of which derive from a single base type, so host code
//! can catch one specific failure or every library failure at once.
//!
//! # Architecture
//!
//! - [`error`]: The closed set of native error kinds and the [`NativeError`] type.
//! - [`core`](crate::core): Host-agnostic registry and boundary translator, written against
//!   the [`HostRuntime`] trait.
//! - [`config`]: [`BridgeConfig`] with environment overrides.
//! - [`mocks`]: An in-process host for tests and benchmarks.
//! - `python`: The CPython binding (feature `python`).
//!
//! # Rust Usage
//!
//! ```rust,ignore
//! use numbridge::python::guard;
//! use numbridge::NativeError;
//!
//! #[pyfunction(pass_module)]
//! fn broadcast_add(module: &Bound<'_, PyModule>, lhs: Vec<usize>, rhs: Vec<usize>) -> PyResult<Vec<usize>> {
//!     guard(module, || {
//!         if lhs != rhs {
//!             return Err(NativeError::dimension(format!("shapes {lhs:?} and {rhs:?} are incompatible")));
//!         }
//!         Ok(lhs)
//!     })
//! }
//! ```
//!
//! # Python Usage
//!
//! Build with maturin:
//! ```bash
//! cd numbridge
//! maturin develop --release
//! ```
//!
//! Then in Python:
//! ```python
//! import numbridge
//!
//! try:
//!     numbridge.raise_native_error("DtypeError", "expected float32, got int64")
//! except numbridge.NumbridgeError as exc:
//!     print(type(exc).__name__, exc)   # DtypeError expected float32, got int64
//! ```
//!
//! # Features
//!
//! - `candle` (default): Classify `candle_core::Error` values by variant.
//! - `python`: Build the PyO3 binding.
//! - `extension-module`: Build as a loadable Python extension.

#![cfg_attr(feature = "python", allow(clippy::useless_conversion))] // PyO3 macro generates false positives

// =============================================================================
// CORE RUST API
// =============================================================================

pub mod config;
pub mod core;
pub mod error;
pub mod mocks;

pub use crate::config::BridgeConfig;
pub use crate::core::{BoundaryTranslator, ExceptionRegistry, HostRuntime, RegisteredException};
pub use crate::error::{classify, BoxError, ErrorKind, NativeError, Result, UnknownErrorKind};

// =============================================================================
// PYTHON BINDINGS (PyO3) - Only compiled with "python" feature
// =============================================================================

#[cfg(feature = "python")]
pub mod python;
