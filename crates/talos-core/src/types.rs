//! Type identity and dynamic values.
//!
//! Talos replaces reflective dispatch with explicit tables built at
//! registration time. [`TypeDescriptor`] is the identity those tables are
//! keyed by, and [`AnyValue`]/[`Args`] carry the dynamically typed values a
//! handler receives and returns.

use crate::CallError;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Explicit identity of a declared parameter or return type.
///
/// Two descriptors are equal iff they describe the same Rust type, so
/// parameterized types are distinct identities (`Vec<u8>` is not `Vec<String>`).
/// This is what the binary-type set and the item parser table key on.
///
/// # Example
///
/// ```rust
/// use talos_core::TypeDescriptor;
///
/// let bytes = TypeDescriptor::of::<Vec<u8>>();
/// assert_eq!(bytes, TypeDescriptor::of::<Vec<u8>>());
/// assert_ne!(bytes, TypeDescriptor::of::<Vec<String>>());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    id: TypeId,
    name: &'static str,
}

impl TypeDescriptor {
    /// Creates the descriptor for `T`.
    #[must_use]
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// Returns true if this descriptor describes `T`.
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Returns the diagnostic name of the described type.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A dynamically typed value crossing the dispatch boundary.
pub type AnyValue = Box<dyn Any + Send>;

/// The callable a resource operation is bound to.
///
/// Built once at registration; each invocation receives a fresh [`Args`]
/// assembled from the request and returns the operation's result value or a
/// [`CallError`]. Only application and fatal failures may cross this
/// boundary; client-input problems are reported by the binding layer before
/// the handler runs.
pub type HandlerFn = Arc<dyn Fn(Args) -> Result<AnyValue, CallError> + Send + Sync>;

/// Positional arguments assembled for one endpoint invocation.
///
/// Each slot corresponds to one declared parameter, in declaration order.
/// Handlers take values out by index; a type mismatch is a fatal error
/// (the binding plan guarantees slot types, so a mismatch means the handler
/// disagrees with its own declaration).
///
/// A fresh `Args` is built per call, so concurrent invocations of the same
/// endpoint share no mutable state.
pub struct Args {
    slots: Vec<Option<AnyValue>>,
}

impl Args {
    /// Wraps assembled argument values.
    #[must_use]
    pub fn new(values: Vec<AnyValue>) -> Self {
        Self {
            slots: values.into_iter().map(Some).collect(),
        }
    }

    /// Returns the number of argument slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Takes the argument at `index` as a `T`.
    pub fn take<T: 'static>(&mut self, index: usize) -> Result<T, CallError> {
        let value = self
            .slots
            .get_mut(index)
            .and_then(Option::take)
            .ok_or_else(|| {
                CallError::fatal(anyhow::anyhow!("argument slot {index} is empty"))
            })?;
        value.downcast::<T>().map(|b| *b).map_err(|_| {
            CallError::fatal(anyhow::anyhow!(
                "argument slot {index} does not hold a {}",
                std::any::type_name::<T>()
            ))
        })
    }

    /// Takes the variadic argument at `index` as a `Vec<T>`.
    ///
    /// Variadic slots hold the greedily captured trailing items, each parsed
    /// with the element parser.
    pub fn take_variadic<T: 'static>(&mut self, index: usize) -> Result<Vec<T>, CallError> {
        let elements: Vec<AnyValue> = self.take(index)?;
        elements
            .into_iter()
            .map(|v| {
                v.downcast::<T>().map(|b| *b).map_err(|_| {
                    CallError::fatal(anyhow::anyhow!(
                        "variadic slot {index} holds an element that is not a {}",
                        std::any::type_name::<T>()
                    ))
                })
            })
            .collect()
    }
}
