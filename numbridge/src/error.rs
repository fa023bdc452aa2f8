//! Native error kinds raised by the numerical core.
//!
//! The core reports failures through [`NativeError`], which pairs a kind from
//! the closed [`ErrorKind`] set with a human-readable message and an optional
//! underlying cause. The host boundary relies on three properties of this
//! type:
//!
//! - `Display` prints the message verbatim, with no category prefix.
//! - [`ErrorKind`] is closed, so the host mapping is an exhaustive `match`.
//! - `source()` exposes the wrapped cause, so it can be chained on the host side.
//!
//! ## Kinds
//!
//! ```text
//! NumbridgeError          (Other: base and generic fallback)
//! ├── ContextError
//! ├── BackendError
//! ├── DeviceError
//! ├── DimensionError
//! ├── DtypeError
//! ├── NotImplementedError
//! ├── GradientError
//! ├── GradientCheckError
//! └── OutOfMemoryError
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed error accepted at the host boundary.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Result type alias for native operations.
pub type Result<T> = std::result::Result<T, NativeError>;

/// Category of a native error.
///
/// Every kind has a stable host-visible exception name. `Other` is the common
/// base of all the others and doubles as the fallback for errors that do not
/// belong to any category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// No dedicated category.
    #[serde(rename = "NumbridgeError")]
    Other,
    /// Invalid or missing execution context.
    #[serde(rename = "ContextError")]
    Context,
    /// Backend lookup, loading or execution failure.
    #[serde(rename = "BackendError")]
    Backend,
    /// Device unavailable or mismatched.
    #[serde(rename = "DeviceError")]
    Device,
    /// Shape, rank or axis mismatch.
    #[serde(rename = "DimensionError")]
    Dimension,
    /// Unsupported or mismatched element type.
    #[serde(rename = "DtypeError")]
    Dtype,
    /// Operation not implemented for the given inputs or backend.
    #[serde(rename = "NotImplementedError")]
    NotImplemented,
    /// Failure while computing or accumulating gradients.
    #[serde(rename = "GradientError")]
    Gradient,
    /// Numerical gradient check did not match the analytical gradient.
    #[serde(rename = "GradientCheckError")]
    GradientCheck,
    /// Memory allocation failed on the host or a device.
    #[serde(rename = "OutOfMemoryError")]
    OutOfMemory,
}

impl ErrorKind {
    /// Number of kinds.
    pub const COUNT: usize = 10;

    /// All kinds in registration order, base first.
    pub const ALL: [ErrorKind; Self::COUNT] = [
        Self::Other,
        Self::Context,
        Self::Backend,
        Self::Device,
        Self::Dimension,
        Self::Dtype,
        Self::NotImplemented,
        Self::Gradient,
        Self::GradientCheck,
        Self::OutOfMemory,
    ];

    /// Position of this kind in [`ErrorKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Other => 0,
            Self::Context => 1,
            Self::Backend => 2,
            Self::Device => 3,
            Self::Dimension => 4,
            Self::Dtype => 5,
            Self::NotImplemented => 6,
            Self::Gradient => 7,
            Self::GradientCheck => 8,
            Self::OutOfMemory => 9,
        }
    }

    /// Public name of the host exception type for this kind.
    #[must_use]
    pub const fn exception_name(self) -> &'static str {
        match self {
            Self::Other => "NumbridgeError",
            Self::Context => "ContextError",
            Self::Backend => "BackendError",
            Self::Device => "DeviceError",
            Self::Dimension => "DimensionError",
            Self::Dtype => "DtypeError",
            Self::NotImplemented => "NotImplementedError",
            Self::Gradient => "GradientError",
            Self::GradientCheck => "GradientCheckError",
            Self::OutOfMemory => "OutOfMemoryError",
        }
    }

    /// Docstring attached to the host exception type.
    #[must_use]
    pub const fn doc(self) -> &'static str {
        match self {
            Self::Other => "Base class of all errors raised by the numbridge native core.",
            Self::Context => "Raised when an execution context is missing or invalid.",
            Self::Backend => "Raised when a backend cannot be found, loaded or run.",
            Self::Device => "Raised when a device is unavailable or devices do not match.",
            Self::Dimension => "Raised when array shapes, ranks or axes are incompatible.",
            Self::Dtype => "Raised when an element type is unsupported or types do not match.",
            Self::NotImplemented => "Raised when an operation is not implemented for its inputs.",
            Self::Gradient => "Raised when gradients cannot be computed or accumulated.",
            Self::GradientCheck => "Raised when a numerical gradient check fails.",
            Self::OutOfMemory => "Raised when a memory allocation fails.",
        }
    }

    /// Whether this is the generic base kind.
    #[must_use]
    pub const fn is_generic(self) -> bool {
        matches!(self, Self::Other)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.exception_name())
    }
}

/// A string that names no [`ErrorKind`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown error kind: {0}")]
pub struct UnknownErrorKind(pub String);

impl FromStr for ErrorKind {
    type Err = UnknownErrorKind;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.exception_name() == s)
            .ok_or_else(|| UnknownErrorKind(s.to_owned()))
    }
}

/// Error raised by the native core.
///
/// # Example
///
/// ```
/// use numbridge::{ErrorKind, NativeError};
///
/// let err = NativeError::dimension("shapes (2,3) and (4,5) are incompatible");
/// assert_eq!(err.kind(), ErrorKind::Dimension);
/// assert_eq!(err.to_string(), "shapes (2,3) and (4,5) are incompatible");
/// ```
#[derive(Debug, Error)]
#[error("{message}")]
pub struct NativeError {
    kind: ErrorKind,
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl NativeError {
    /// Create an error of the given kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create an uncategorized error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Other, message)
    }

    /// Create a context error.
    pub fn context(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Context, message)
    }

    /// Create a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Backend, message)
    }

    /// Create a device error.
    pub fn device(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Device, message)
    }

    /// Create a dimension error.
    pub fn dimension(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Dimension, message)
    }

    /// Create a dtype error.
    pub fn dtype(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Dtype, message)
    }

    /// Create a not-implemented error.
    pub fn not_implemented(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotImplemented, message)
    }

    /// Create a gradient error.
    pub fn gradient(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Gradient, message)
    }

    /// Create a gradient-check error.
    pub fn gradient_check(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GradientCheck, message)
    }

    /// Create an out-of-memory error.
    pub fn out_of_memory(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OutOfMemory, message)
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Message as given at the raise site.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Determine the kind of an arbitrary error.
///
/// A [`NativeError`] reports its own kind. With the `candle` feature, candle
/// tensor errors are mapped onto the closed kind set. Anything else is
/// [`ErrorKind::Other`].
#[must_use]
pub fn classify(err: &(dyn StdError + 'static)) -> ErrorKind {
    if let Some(native) = err.downcast_ref::<NativeError>() {
        return native.kind();
    }
    #[cfg(feature = "candle")]
    if let Some(tensor) = err.downcast_ref::<candle_core::Error>() {
        return classify_candle(tensor);
    }
    ErrorKind::Other
}

#[cfg(feature = "candle")]
fn classify_candle(err: &candle_core::Error) -> ErrorKind {
    use candle_core::Error as E;

    match err {
        E::UnexpectedDType { .. } | E::DTypeMismatchBinaryOp { .. } | E::UnsupportedDTypeForOp(..) => {
            ErrorKind::Dtype
        }
        E::ShapeMismatchBinaryOp { .. }
        | E::ShapeMismatchCat { .. }
        | E::UnexpectedNumberOfDims { .. }
        | E::UnexpectedShape { .. }
        | E::DimOutOfRange { .. }
        | E::BroadcastIncompatibleShapes { .. } => ErrorKind::Dimension,
        E::DeviceMismatchBinaryOp { .. } => ErrorKind::Device,
        E::NotCompiledWithCudaSupport | E::NotCompiledWithMetalSupport | E::Cuda(_) => {
            ErrorKind::Backend
        }
        E::WithBacktrace { inner, .. } | E::Context { inner, .. } => classify_candle(inner),
        _ => ErrorKind::Other,
    }
}
