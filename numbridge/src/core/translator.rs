//! Boundary translator.
//!
//! Every native call reachable from the host runs inside
//! [`BoundaryTranslator::guard`]. Errors escaping the call are classified,
//! looked up in the [`ExceptionRegistry`] and rebuilt as host exceptions with
//! the original message and, when enabled, the translated cause chain.
//! The translator holds no mutable state and is safe to share across threads
//! whenever the registry is.

use std::any::Any;
use std::error::Error as StdError;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error};

use super::host::HostRuntime;
use super::registry::ExceptionRegistry;
use crate::config::BridgeConfig;
use crate::error::{classify, BoxError, ErrorKind};

/// Converts native errors into host exceptions at the call boundary.
#[derive(Debug)]
pub struct BoundaryTranslator<'r, T> {
    registry: &'r ExceptionRegistry<T>,
    chain_causes: bool,
    max_cause_depth: usize,
    catch_panics: bool,
}

impl<'r, T> BoundaryTranslator<'r, T> {
    /// Create a translator over an initialized registry.
    #[must_use]
    pub fn new(registry: &'r ExceptionRegistry<T>, config: &BridgeConfig) -> Self {
        Self {
            registry,
            chain_causes: config.chain_causes,
            max_cause_depth: config.max_cause_depth,
            catch_panics: config.catch_panics,
        }
    }

    /// Registry used for lookups.
    #[must_use]
    pub const fn registry(&self) -> &'r ExceptionRegistry<T> {
        self.registry
    }

    /// Run a native call and translate any error it produces.
    ///
    /// The successful value is passed through unchanged. A [`NativeError`]
    /// becomes the host type registered for its kind; any other error type
    /// becomes the generic base type. Messages are copied verbatim.
    ///
    /// When panic capture is enabled, a panic inside `call` is raised as the
    /// generic base type carrying the panic message.
    ///
    /// # Errors
    ///
    /// Returns the translated host exception when `call` fails.
    ///
    /// [`NativeError`]: crate::NativeError
    pub fn guard<H, F, R, E>(&self, host: &H, call: F) -> Result<R, H::Exception>
    where
        H: HostRuntime<ExceptionType = T>,
        F: FnOnce() -> Result<R, E>,
        E: Into<BoxError>,
    {
        let outcome = if self.catch_panics {
            match panic::catch_unwind(AssertUnwindSafe(call)) {
                Ok(outcome) => outcome,
                Err(payload) => return Err(self.translate_panic(host, payload.as_ref())),
            }
        } else {
            call()
        };

        outcome.map_err(|err| {
            let err: BoxError = err.into();
            self.translate(host, &*err)
        })
    }

    /// Build the host exception for `err`.
    pub fn translate<H>(&self, host: &H, err: &(dyn StdError + 'static)) -> H::Exception
    where
        H: HostRuntime<ExceptionType = T>,
    {
        self.translate_at_depth(host, err, 0)
    }

    fn translate_at_depth<H>(
        &self,
        host: &H,
        err: &(dyn StdError + 'static),
        depth: usize,
    ) -> H::Exception
    where
        H: HostRuntime<ExceptionType = T>,
    {
        let kind = classify(err);
        let message = err.to_string();
        debug!(kind = %kind, depth, message = %message, "translating native error");

        let mut exception = host.new_exception(self.registry.lookup(kind), &message);
        if self.chain_causes && depth < self.max_cause_depth {
            if let Some(source) = err.source() {
                let cause = self.translate_at_depth(host, source, depth + 1);
                host.set_cause(&mut exception, cause);
            }
        }
        exception
    }

    fn translate_panic<H>(&self, host: &H, payload: &(dyn Any + Send)) -> H::Exception
    where
        H: HostRuntime<ExceptionType = T>,
    {
        let message = panic_message(payload);
        error!(message = %message, "native call panicked");
        host.new_exception(self.registry.lookup(ErrorKind::Other), &message)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "native call panicked".to_owned()
    }
}
