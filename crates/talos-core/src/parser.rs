//! Item parser registry.
//!
//! Path items arrive as strings and are bound positionally to typed
//! parameters. The [`ParserRegistry`] is the pure function table resolving a
//! declared parameter type to its string parser. It is populated once at
//! configuration time and read without synchronization while serving.

use crate::{AnyValue, TypeDescriptor};
use std::any::TypeId;
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;

/// Parses one path item string into a typed value.
///
/// The error string names only what went wrong with the value; the binding
/// layer attaches the parameter name.
pub type ParseFn = Arc<dyn Fn(&str) -> Result<AnyValue, String> + Send + Sync>;

/// Table of item parsers keyed by target type.
///
/// Booleans, the integer widths, floats, and `String` are pre-registered;
/// callers may add parsers for their own types. Item parameters whose type
/// has no entry here are rejected at registration, which also excludes
/// types that only make sense as payloads (a `Vec<MyStruct>` item is a
/// configuration error unless a parser is registered for it).
///
/// # Example
///
/// ```rust
/// use talos_core::{ParserRegistry, TypeDescriptor};
///
/// let mut parsers = ParserRegistry::new();
/// parsers.register::<char, _>(|s| {
///     let mut chars = s.chars();
///     match (chars.next(), chars.next()) {
///         (Some(c), None) => Ok(c),
///         _ => Err("expected exactly one character".to_string()),
///     }
/// });
/// assert!(parsers.contains(&TypeDescriptor::of::<char>()));
/// assert!(parsers.contains(&TypeDescriptor::of::<i32>()));
/// ```
#[derive(Clone)]
pub struct ParserRegistry {
    parsers: HashMap<TypeId, ParseFn>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserRegistry {
    /// Creates a registry with the built-in parsers.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            parsers: HashMap::new(),
        };
        registry.register_from_str::<bool>();
        registry.register_from_str::<i8>();
        registry.register_from_str::<i16>();
        registry.register_from_str::<i32>();
        registry.register_from_str::<i64>();
        registry.register_from_str::<u8>();
        registry.register_from_str::<u16>();
        registry.register_from_str::<u32>();
        registry.register_from_str::<u64>();
        registry.register_from_str::<f32>();
        registry.register_from_str::<f64>();
        registry.register::<String, _>(|s| Ok(s.to_string()));
        registry
    }

    /// Registers a parser for `T`, replacing any existing one.
    pub fn register<T, F>(&mut self, parse: F)
    where
        T: Send + 'static,
        F: Fn(&str) -> Result<T, String> + Send + Sync + 'static,
    {
        self.parsers.insert(
            TypeId::of::<T>(),
            Arc::new(move |s| parse(s).map(|v| Box::new(v) as AnyValue)),
        );
    }

    /// Registers `T`'s `FromStr` implementation as its parser.
    pub fn register_from_str<T>(&mut self)
    where
        T: FromStr + Send + 'static,
        T::Err: Display,
    {
        self.register::<T, _>(|s| s.parse::<T>().map_err(|e| e.to_string()));
    }

    /// Returns the parser for a declared type, if one is registered.
    #[must_use]
    pub fn lookup(&self, ty: &TypeDescriptor) -> Option<ParseFn> {
        self.parsers.get(&ty.id()).cloned()
    }

    /// Returns true if a parser is registered for the type.
    #[must_use]
    pub fn contains(&self, ty: &TypeDescriptor) -> bool {
        self.parsers.contains_key(&ty.id())
    }
}

impl std::fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParserRegistry")
            .field("parsers", &self.parsers.len())
            .finish()
    }
}
