//! Per-type diagnostics collection.
//!
//! Resolution failures are collected, never thrown mid-walk: a type's plan is
//! always produced from its resolvable properties, and the caller decides
//! whether any diagnostic blocks downstream generation.

use std::fmt;
use std::sync::Arc;

use carton_model::ModelError;

// -----------------------------------------------------------------------------
// Diagnostic

/// The failure category of one diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A candidate property has no reachable read or write mechanism.
    Inaccessible,
    /// Two declarations at the same declaring type, name, and kind.
    Ambiguous,
    /// The property's value type has no container encoding.
    UnsupportedType,
    /// The parent chain revisits a type already seen.
    CyclicInheritance,
    /// A type or parent link names no registered declaration.
    UnknownType,
    /// Decode consumed a read-only property without restoring it.
    ReadOnlySkipped,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inaccessible => f.write_str("no reachable read or write mechanism"),
            Self::Ambiguous => f.write_str("ambiguous declarations of the same name and kind"),
            Self::UnsupportedType => f.write_str("value type has no container encoding"),
            Self::CyclicInheritance => f.write_str("cyclic inheritance chain"),
            Self::UnknownType => f.write_str("unknown type in hierarchy input"),
            Self::ReadOnlySkipped => f.write_str("read-only property skipped during decode"),
        }
    }
}

/// One recorded resolution or decode failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    type_name: Arc<str>,
    property: Option<Arc<str>>,
    kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(type_name: Arc<str>, property: Option<Arc<str>>, kind: DiagnosticKind) -> Self {
        Self {
            type_name,
            property,
            kind,
        }
    }

    /// A diagnostic for a whole-type failure reported by the model.
    pub fn from_model_error(error: &ModelError) -> Self {
        match error {
            ModelError::CyclicInheritance { type_name, .. } => {
                Self::new(type_name.clone(), None, DiagnosticKind::CyclicInheritance)
            }
            ModelError::UnknownParent { type_name, .. } => {
                Self::new(type_name.clone(), None, DiagnosticKind::UnknownType)
            }
            ModelError::UnknownType(name) | ModelError::DuplicateType(name) => {
                Self::new(name.clone(), None, DiagnosticKind::UnknownType)
            }
        }
    }

    /// The offending type.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The offending property, absent for whole-type failures.
    #[inline]
    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    #[inline]
    pub fn kind(&self) -> DiagnosticKind {
        self.kind
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.property {
            Some(property) => write!(f, "`{}.{}`: {}", self.type_name, property, self.kind),
            None => write!(f, "`{}`: {}", self.type_name, self.kind),
        }
    }
}

// -----------------------------------------------------------------------------
// Diagnostics

/// An accumulating collector of [`Diagnostic`]s for one analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Record a per-property failure.
    pub fn report(&mut self, type_name: &Arc<str>, property: &Arc<str>, kind: DiagnosticKind) {
        self.push(Diagnostic::new(
            type_name.clone(),
            Some(property.clone()),
            kind,
        ));
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }

    /// All diagnostics recorded for `property`.
    pub fn for_property<'a>(&'a self, property: &'a str) -> impl Iterator<Item = &'a Diagnostic> {
        self.entries
            .iter()
            .filter(move |d| d.property() == Some(property))
    }
}

// -----------------------------------------------------------------------------
// Tests
