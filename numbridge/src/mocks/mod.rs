//! Mock host runtime for testing without an embedded interpreter.
//!
//! [`MockHost`] models the parts of a dynamic host's exception system that the
//! translation layer depends on: type identity, single inheritance, module
//! namespaces and cause chains.

mod host;

pub use host::{MockException, MockExceptionType, MockHost, MockHostError, MockModule};
