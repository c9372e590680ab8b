//! Memoized plan computation with single-flight semantics.
//!
//! Plans are computed once per type, ahead of use. The cache guarantees
//! at-most-one concurrent computation per type key: concurrent requests for
//! the same uncached key block on one `OnceLock` until the first computation
//! completes, then share its result. Requests for different keys proceed
//! independently.

use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use log::{debug, trace};

use carton_model::TypeModel;
use carton_model::hash::HashMap;

use crate::diag::Diagnostic;
use crate::naming::NamingConvention;
use crate::property::SerializationPlan;
use crate::resolve::Resolver;
use crate::scope::GenerationScope;

// -----------------------------------------------------------------------------
// PlanOutcome

/// The complete result of analyzing one type: the plan built from its
/// resolvable properties plus every diagnostic recorded along the way.
///
/// Empty diagnostics mean full success. Whether any diagnostic is fatal to
/// downstream generation is the caller's policy, not this engine's.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: SerializationPlan,
    pub diagnostics: Vec<Diagnostic>,
}

impl PlanOutcome {
    /// Whether the type resolved without a single diagnostic.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

// -----------------------------------------------------------------------------
// PlanCache

/// A read-mostly store mapping type identity to its computed [`PlanOutcome`].
#[derive(Debug, Default)]
pub struct PlanCache {
    entries: RwLock<HashMap<Arc<str>, Arc<OnceLock<Arc<PlanOutcome>>>>>,
}

impl PlanCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached outcome for `key`, if one has been computed.
    pub fn get(&self, key: &str) -> Option<Arc<PlanOutcome>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(key).and_then(|cell| cell.get().cloned())
    }

    /// Fetch `key`'s outcome, running `compute` at most once across all
    /// concurrent callers for this key.
    pub fn get_or_compute(
        &self,
        key: Arc<str>,
        compute: impl FnOnce() -> PlanOutcome,
    ) -> Arc<PlanOutcome> {
        let cell = {
            let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
            entries.get(&*key).cloned()
        };
        let cell = match cell {
            Some(cell) => {
                trace!("plan cache hit for `{key}`");
                cell
            }
            None => {
                let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
                entries
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(OnceLock::new()))
                    .clone()
            }
        };
        // Losers of the race block here and share the winner's result.
        cell.get_or_init(|| {
            debug!("computing serialization plan for `{key}`");
            Arc::new(compute())
        })
        .clone()
    }

    /// Number of keys with a completed computation.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.values().filter(|cell| cell.get().is_some()).count()
    }
}

// -----------------------------------------------------------------------------
// Analyzer

/// The full analysis pipeline: hierarchy model, generation scope, naming
/// convention, and the memoizing plan cache.
///
/// # Examples
///
/// ```
/// use carton_model::{TypeDecl, TypeModel, ValueType, Visibility};
/// use carton_plan::cache::Analyzer;
/// use carton_plan::scope::GenerationScope;
///
/// let mut model = TypeModel::new();
/// model.register(
///     TypeDecl::new("Point", "geo")
///         .field("x", ValueType::I64, Visibility::Public)
///         .field("y", ValueType::I64, Visibility::Public),
/// ).unwrap();
///
/// let analyzer = Analyzer::new(model, GenerationScope::in_module("geo"));
/// let outcome = analyzer.plan_for("Point");
/// assert!(outcome.is_clean());
/// assert_eq!(outcome.plan.len(), 2);
/// ```
#[derive(Debug)]
pub struct Analyzer {
    model: TypeModel,
    scope: GenerationScope,
    naming: NamingConvention,
    cache: PlanCache,
}

impl Analyzer {
    pub fn new(model: TypeModel, scope: GenerationScope) -> Self {
        Self {
            model,
            scope,
            naming: NamingConvention::default(),
            cache: PlanCache::new(),
        }
    }

    /// Replace the accessor naming convention.
    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    #[inline]
    pub fn model(&self) -> &TypeModel {
        &self.model
    }

    #[inline]
    pub fn scope(&self) -> &GenerationScope {
        &self.scope
    }

    /// The plan and diagnostics for `type_name`, computed lazily on first
    /// request and memoized. A malformed hierarchy (cycle, unknown link)
    /// yields an empty plan with the corresponding diagnostic; analysis of
    /// other types is unaffected.
    pub fn plan_for(&self, type_name: &str) -> Arc<PlanOutcome> {
        let key: Arc<str> = Arc::from(type_name);
        self.cache.get_or_compute(key.clone(), || {
            match self.model.descriptor(type_name) {
                Ok(descriptor) => {
                    let resolver = Resolver::new(&self.model, &self.scope, &self.naming);
                    let (plan, diagnostics) = resolver.resolve(&descriptor);
                    PlanOutcome {
                        plan,
                        diagnostics: diagnostics.into_vec(),
                    }
                }
                Err(err) => PlanOutcome {
                    plan: SerializationPlan::empty(key.clone()),
                    diagnostics: vec![Diagnostic::from_model_error(&err)],
                },
            }
        })
    }
}

// -----------------------------------------------------------------------------
// Tests
