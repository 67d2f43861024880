//! Build-once plan cache.
//!
//! Every type gets one cell. The map lock is only held to fetch or insert
//! the cell; the build itself runs inside `OnceLock::get_or_init`, so each
//! plan (or its error) is built at most once and published safely to every
//! concurrent caller.

use crate::{
    error::PlanError,
    model::compile_model,
    plan::{ImplementationPlan, PlanOptions, Planner},
};
use derive_more::Display;
use rayon::prelude::*;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::{
        Arc, OnceLock, PoisonError, RwLock,
        atomic::{AtomicUsize, Ordering},
    },
};
use tracing::debug;
use typedconf_core::model::TypeModel;
use typedconf_schema::{error::ErrorTree, fingerprint::fingerprint, node::Schema};

type Cell<T> = Arc<OnceLock<Result<Arc<T>, PlanError>>>;
type Cells<T> = RwLock<BTreeMap<String, Cell<T>>>;

///
/// CacheStats
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
#[display("{builds} built, {hits} hits, {size} cached")]
pub struct CacheStats {
    pub hits: usize,
    pub builds: usize,
    pub size: usize,
}

///
/// PlanCache
///

#[derive(Debug)]
pub struct PlanCache {
    schema: RwLock<Arc<Schema>>,
    validated: RwLock<Arc<OnceLock<Result<(), ErrorTree>>>>,
    options: PlanOptions,
    plans: Cells<ImplementationPlan>,
    models: Cells<TypeModel>,
    hits: AtomicUsize,
    builds: AtomicUsize,
}

impl PlanCache {
    #[must_use]
    pub fn new(schema: Schema, options: PlanOptions) -> Self {
        Self {
            schema: RwLock::new(Arc::new(schema)),
            validated: RwLock::new(Arc::default()),
            options,
            plans: RwLock::default(),
            models: RwLock::default(),
            hits: AtomicUsize::new(0),
            builds: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema.read().unwrap_or_else(PoisonError::into_inner))
    }

    #[must_use]
    pub const fn options(&self) -> PlanOptions {
        self.options
    }

    /// Schema validation, run once per schema.
    pub fn validate(&self) -> Result<(), PlanError> {
        let cell = Arc::clone(&self.validated.read().unwrap_or_else(PoisonError::into_inner));
        let schema = self.schema();

        cell.get_or_init(|| schema.validate())
            .clone()
            .map_err(PlanError::InvalidSchema)
    }

    /// Plan for `path`, built at most once.
    pub fn plan(&self, path: &str) -> Result<Arc<ImplementationPlan>, PlanError> {
        self.validate()?;

        let cell = Self::cell(&self.plans, path);
        if let Some(done) = cell.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return done.clone();
        }

        cell.get_or_init(|| {
            self.builds.fetch_add(1, Ordering::Relaxed);
            self.build_plan(path).map(Arc::new)
        })
        .clone()
    }

    /// Runtime model for `path`, compiled from its plan.
    pub fn model(&self, path: &str) -> Result<Arc<TypeModel>, PlanError> {
        let cell = Self::cell(&self.models, path);

        cell.get_or_init(|| {
            let plan = self.plan(path)?;
            let primary = match &plan.primary {
                Some(primary) => self
                    .model(primary)
                    .map_err(|e| ancestor_failed(path, primary, e))?,
                None => TypeModel::root(),
            };

            Ok(Arc::new(compile_model(&plan, primary)))
        })
        .clone()
    }

    /// Plan every implementation-bearing type in parallel. Results are in
    /// path order.
    #[must_use]
    pub fn plan_all(&self) -> Vec<(String, Result<Arc<ImplementationPlan>, PlanError>)> {
        let schema = self.schema();
        let paths: Vec<String> = schema
            .implemented_types()
            .map(|(path, _)| path.to_string())
            .collect();

        paths
            .into_par_iter()
            .map(|path| {
                let result = self.plan(&path);
                (path, result)
            })
            .collect()
    }

    /// Drop the cached plan of `path` and of every descendant.
    pub fn invalidate(&self, path: &str) {
        let schema = self.schema();
        let mut stale = schema.descendants(path);
        stale.insert(path.to_string());

        self.drop_cells(&stale);
    }

    /// Swap in a new schema, dropping plans of types whose fingerprint
    /// changed or that were removed, plus their descendants.
    pub fn replace_schema(&self, schema: Schema) {
        let old = self.schema();

        let mut stale = BTreeSet::new();
        for (path, _) in old.types() {
            let unchanged = matches!(
                (fingerprint(&old, path), fingerprint(&schema, path)),
                (Ok(a), Ok(b)) if a == b
            );
            if !unchanged {
                stale.insert(path.to_string());
                stale.extend(old.descendants(path));
            }
        }

        *self.schema.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(schema);
        *self.validated.write().unwrap_or_else(PoisonError::into_inner) = Arc::default();
        debug!(stale = stale.len(), "schema replaced");

        self.drop_cells(&stale);
    }

    /// Number of plans built so far.
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            builds: self.build_count(),
            size: self.plans.read().unwrap_or_else(PoisonError::into_inner).len(),
        }
    }

    //
    // internals
    //

    fn build_plan(&self, path: &str) -> Result<ImplementationPlan, PlanError> {
        let schema = self.schema();
        let planner = Planner::new(&schema, self.options);

        // the primary goes through the cache so chains are shared
        let primary = match crate::select::select_primary(&schema, path) {
            Some(primary) if schema.get(path).is_some_and(|ty| ty.requires_implementation()) => {
                Some(self.plan(&primary).map_err(|e| ancestor_failed(path, &primary, e))?)
            }
            _ => None,
        };

        planner.plan_with(path, primary.as_deref())
    }

    fn cell<T>(cells: &Cells<T>, path: &str) -> Cell<T> {
        if let Some(cell) = cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            return Arc::clone(cell);
        }

        let mut cells = cells.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cells.entry(path.to_string()).or_default())
    }

    fn drop_cells(&self, stale: &BTreeSet<String>) {
        let mut plans = self.plans.write().unwrap_or_else(PoisonError::into_inner);
        let mut models = self.models.write().unwrap_or_else(PoisonError::into_inner);
        for path in stale {
            plans.remove(path);
            models.remove(path);
        }
    }
}

fn ancestor_failed(path: &str, ancestor: &str, source: PlanError) -> PlanError {
    PlanError::AncestorFailed {
        type_path: path.to_string(),
        ancestor: ancestor.to_string(),
        source: Box::new(source),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use crate::classify::ValueShape;
    use typedconf_schema::{
        node::{Property, SchemaType},
        types::{Primitive, PropertyKind},
    };

    fn schema(port: &str) -> Schema {
        Schema::new()
            .with_type(SchemaType::new("c", "Base").property_with(Property::plain("name", "Text")))
            .with_type(
                SchemaType::new("c", "Server")
                    .extends("c.Base")
                    .property_with(Property::plain("port", port)),
            )
            .with_type(SchemaType::new("c", "Other").property_with(Property::plain("x", "Int32")))
    }

    #[test]
    fn plans_are_built_once() {
        let cache = PlanCache::new(schema("Nat16"), PlanOptions::default());

        let a = cache.plan("c.Server").expect("plannable");
        let b = cache.plan("c.Server").expect("plannable");

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.build_count(), 2, "server and its primary, once each");
    }

    #[test]
    fn concurrent_requests_share_one_build() {
        let cache = PlanCache::new(schema("Nat16"), PlanOptions::default());

        let plans: Vec<_> = thread::scope(|s| {
            let handles: Vec<_> = (0..8).map(|_| s.spawn(|| cache.plan("c.Server"))).collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("thread finished").expect("plannable"))
                .collect()
        });

        assert!(plans.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(cache.build_count(), 2);
    }

    #[test]
    fn invalidation_reaches_descendants() {
        let cache = PlanCache::new(schema("Nat16"), PlanOptions::default());
        let server = cache.plan("c.Server").expect("plannable");
        let other = cache.plan("c.Other").expect("plannable");

        cache.invalidate("c.Base");

        assert!(!Arc::ptr_eq(&server, &cache.plan("c.Server").expect("plannable")));
        assert!(Arc::ptr_eq(&other, &cache.plan("c.Other").expect("plannable")));
    }

    #[test]
    fn replacing_the_schema_drops_only_changed_types() {
        let cache = PlanCache::new(schema("Nat16"), PlanOptions::default());
        let base = cache.plan("c.Base").expect("plannable");
        let server = cache.plan("c.Server").expect("plannable");

        cache.replace_schema(schema("Nat32"));

        assert!(Arc::ptr_eq(&base, &cache.plan("c.Base").expect("plannable")));
        assert!(!Arc::ptr_eq(&server, &cache.plan("c.Server").expect("plannable")));
    }

    #[test]
    fn replacing_the_schema_refreshes_types_that_refer_to_a_changed_type() {
        let library = |key_type: &str| {
            Schema::new()
                .with_type(
                    SchemaType::new("k", "Entry").property_with(Property::plain("name", key_type)),
                )
                .with_type(
                    SchemaType::new("k", "Book").property_with(
                        Property::new("entries", PropertyKind::List, "k.Entry")
                            .accessors()
                            .keyed("name", "entry"),
                    ),
                )
        };
        let cache = PlanCache::new(library("Text"), PlanOptions::default());
        let before = cache.plan("k.Book").expect("plannable");

        cache.replace_schema(library("Int32"));

        let after = cache.plan("k.Book").expect("plannable");
        let fresh = PlanCache::new(library("Int32"), PlanOptions::default())
            .plan("k.Book")
            .expect("plannable");
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(*after, *fresh);
        let key = after.properties[0].key.as_ref().expect("entries are keyed");
        assert_eq!(key.shape, ValueShape::Primitive(Primitive::Int32));
    }

    #[test]
    fn stats_count_builds_and_hits() {
        let cache = PlanCache::new(schema("Nat16"), PlanOptions::default());
        cache.plan("c.Server").expect("plannable");
        cache.plan("c.Server").expect("plannable");
        cache.plan("c.Base").expect("plannable");

        let stats = cache.stats();
        assert_eq!(
            stats,
            CacheStats {
                hits: 2,
                builds: 2,
                size: 2,
            }
        );
        assert_eq!(stats.to_string(), "2 built, 2 hits, 2 cached");
    }

    #[test]
    fn invalid_schemas_are_never_planned() {
        let bad = Schema::new().with_type(SchemaType::new("c", "A").extends("c.Missing"));
        let cache = PlanCache::new(bad, PlanOptions::default());

        assert!(matches!(cache.plan("c.A"), Err(PlanError::InvalidSchema(_))));
        assert_eq!(cache.build_count(), 0);
    }

    #[test]
    fn plan_all_is_in_path_order() {
        let cache = PlanCache::new(schema("Nat16"), PlanOptions::default());
        let paths: Vec<_> = cache.plan_all().into_iter().map(|(p, _)| p).collect();

        assert_eq!(paths, vec!["c.Base", "c.Other", "c.Server"]);
    }

    #[test]
    fn models_follow_the_primary_chain() {
        let cache = PlanCache::new(schema("Nat16"), PlanOptions::default());
        let server = cache.model("c.Server").expect("compilable");
        let base = cache.model("c.Base").expect("compilable");

        let primary = server.primary.as_ref().expect("server has a primary");
        assert!(Arc::ptr_eq(primary, &base));
        assert!(base.primary.as_ref().is_some_and(|root| root.is_root()));
    }
}
