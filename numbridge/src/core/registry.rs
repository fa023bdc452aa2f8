//! Exception type registry.
//!
//! Owns the mapping from [`ErrorKind`] to host exception type. The mapping is
//! built once by [`ExceptionRegistry::initialize`], which also installs every
//! type into a host module namespace, and is read-only afterwards.

use tracing::{debug, error, info, warn};

use super::host::HostRuntime;
use crate::config::BridgeConfig;
use crate::error::ErrorKind;

/// One registered host exception type.
#[derive(Debug, Clone)]
pub struct RegisteredException<T> {
    kind: ErrorKind,
    qualified_name: String,
    ty: T,
}

impl<T> RegisteredException<T> {
    /// Native kind this type stands for.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Name the type is bound under in the module namespace.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.exception_name()
    }

    /// Fully qualified name (`module.Name`).
    #[must_use]
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Host type object.
    #[must_use]
    pub const fn exception_type(&self) -> &T {
        &self.ty
    }
}

/// Immutable mapping from native error kind to host exception type.
///
/// Entries are stored in [`ErrorKind::ALL`] order, so the base type comes
/// first and every other type derives from it.
#[derive(Debug)]
pub struct ExceptionRegistry<T> {
    entries: Vec<RegisteredException<T>>,
}

impl<T> ExceptionRegistry<T> {
    /// Create every host exception type, bind it into `module` and record it.
    ///
    /// Must run exactly once per module namespace, during single-threaded
    /// module setup, before any guarded call. All types are created before
    /// any is bound, and a failed bind removes the bindings made so far, so
    /// a failed call leaves `module` as it found it and can be retried.
    ///
    /// # Errors
    ///
    /// Returns the host's error if a type cannot be created or bound, or if
    /// the module namespace cannot be inspected.
    ///
    /// # Panics
    ///
    /// Panics if `module` already holds any of the registered names. A second
    /// initialization is a setup bug; the existing bindings are left as they
    /// were.
    pub fn initialize<H>(
        host: &H,
        module: &H::Module,
        config: &BridgeConfig,
    ) -> Result<Self, H::Error>
    where
        H: HostRuntime<ExceptionType = T>,
    {
        for kind in ErrorKind::ALL {
            if host.is_bound(module, kind.exception_name())? {
                error!(
                    module = %config.module_name,
                    name = kind.exception_name(),
                    "exception registry initialized twice"
                );
                panic!(
                    "exception registry already initialized for module `{}` ({} is bound)",
                    config.module_name,
                    kind.exception_name()
                );
            }
        }

        let root = host.root_exception_type();
        let mut entries: Vec<RegisteredException<T>> = Vec::with_capacity(ErrorKind::COUNT);

        for kind in ErrorKind::ALL {
            let qualified_name = format!("{}.{}", config.module_name, kind.exception_name());
            let base = entries.first().map_or(&root, |base| &base.ty);

            let ty = host.create_exception_type(&qualified_name, kind.doc(), base)?;
            entries.push(RegisteredException {
                kind,
                qualified_name,
                ty,
            });
        }

        for (position, entry) in entries.iter().enumerate() {
            if let Err(err) = host.bind(module, entry.name(), &entry.ty) {
                error!(
                    module = %config.module_name,
                    name = entry.name(),
                    "binding exception type failed, rolling back"
                );
                for bound in &entries[..position] {
                    if host.unbind(module, bound.name()).is_err() {
                        warn!(name = bound.name(), "could not remove partial binding");
                    }
                }
                return Err(err);
            }
            debug!(
                kind = %entry.kind,
                qualified_name = %entry.qualified_name,
                "registered host exception type"
            );
        }

        info!(
            module = %config.module_name,
            count = entries.len(),
            "exception registry initialized"
        );
        Ok(Self { entries })
    }

    /// Host type registered for `kind`.
    ///
    /// Total over the closed kind set; [`ErrorKind::Other`] resolves to the
    /// common base, which is also the fallback for uncategorized errors.
    #[must_use]
    pub fn lookup(&self, kind: ErrorKind) -> &T {
        &self.entry(kind).ty
    }

    /// Registration record for `kind`.
    #[must_use]
    pub fn entry(&self, kind: ErrorKind) -> &RegisteredException<T> {
        &self.entries[kind.index()]
    }

    /// Name the type for `kind` is bound under.
    #[must_use]
    pub fn exception_name(&self, kind: ErrorKind) -> &'static str {
        self.entry(kind).name()
    }

    /// Common base type of every registered exception.
    #[must_use]
    pub fn base(&self) -> &T {
        self.lookup(ErrorKind::Other)
    }

    /// Registered types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredException<T>> {
        self.entries.iter()
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false once initialized; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
