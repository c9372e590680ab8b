//! The assumed generation scope and the visibility reachability matrix.

use std::sync::Arc;

use carton_model::TypeDescriptor;
use carton_model::Visibility;
use carton_model::hash::HashSet;

// -----------------------------------------------------------------------------
// GenerationScope

/// Where the emitted encode/decode code is assumed to live.
///
/// Reachability of a member from this scope follows one matrix:
///
/// | visibility | reachable |
/// |---|---|
/// | `Public`  | always |
/// | `Module`  | scope module equals the declaring type's module |
/// | `Inherit` | scope extends the declaring type, or shares its module |
/// | `Private` | never |
///
/// # Examples
///
/// ```
/// use carton_plan::scope::GenerationScope;
///
/// let scope = GenerationScope::in_module("org.acme").extending("Base");
/// assert_eq!(scope.module(), Some("org.acme"));
/// assert_eq!(scope.extends(), Some("Base"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct GenerationScope {
    module: Option<Arc<str>>,
    extends: Option<Arc<str>>,
}

impl GenerationScope {
    /// A scope in no particular module, reaching only public members.
    pub fn foreign() -> Self {
        Self::default()
    }

    /// A scope co-located in `module`.
    pub fn in_module(module: &str) -> Self {
        Self {
            module: Some(Arc::from(module)),
            extends: None,
        }
    }

    /// Declare that the generated code is itself a subtype of `type_name`.
    pub fn extending(mut self, type_name: &str) -> Self {
        self.extends = Some(Arc::from(type_name));
        self
    }

    #[inline]
    pub fn module(&self) -> Option<&str> {
        self.module.as_deref()
    }

    #[inline]
    pub fn extends(&self) -> Option<&str> {
        self.extends.as_deref()
    }

    /// Whether a member with `visibility` declared by `declaring` is
    /// reachable from this scope. `ancestry` is the resolved name set of the
    /// scope's own inheritance chain.
    pub fn can_reach(
        &self,
        visibility: Visibility,
        declaring: &TypeDescriptor,
        ancestry: &HashSet<Arc<str>>,
    ) -> bool {
        match visibility {
            Visibility::Public => true,
            Visibility::Module => self.shares_module(declaring),
            Visibility::Inherit => {
                self.shares_module(declaring) || ancestry.contains(&**declaring.name())
            }
            Visibility::Private => false,
        }
    }

    fn shares_module(&self, declaring: &TypeDescriptor) -> bool {
        self.module.as_deref() == Some(&**declaring.module())
    }
}

// -----------------------------------------------------------------------------
// Tests
