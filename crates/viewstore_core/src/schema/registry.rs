//! Registry of field types by name.

use super::types::{BuiltinType, FieldType};
use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;
use std::sync::Arc;

/// Field types addressable by name.
///
/// [`TypeRegistry::default`] holds the four built-in types. Additional types
/// are added with [`TypeRegistry::register`]; existing types are never
/// modified by doing so.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, Arc<dyn FieldType>>,
}

impl TypeRegistry {
    /// Creates a registry with no types.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            types: HashMap::new(),
        }
    }

    /// Creates a registry holding the built-in types.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        for ty in BuiltinType::ALL {
            registry.register(ty);
        }
        registry
    }

    /// Registers a type under its own name.
    ///
    /// Returns the type previously registered under that name.
    pub fn register<T: FieldType + 'static>(&mut self, ty: T) -> Option<Arc<dyn FieldType>> {
        self.register_shared(Arc::new(ty))
    }

    /// Registers an already shared type under its own name.
    pub fn register_shared(&mut self, ty: Arc<dyn FieldType>) -> Option<Arc<dyn FieldType>> {
        self.types.insert(ty.name().to_string(), ty)
    }

    /// Looks up a type by name.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownType`] if no type has that name.
    pub fn get(&self, name: &str) -> CoreResult<Arc<dyn FieldType>> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| CoreError::UnknownType { name: name.into() })
    }

    /// Returns true if a type with that name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Returns the registered type names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
