//! Registry: concurrent name → metric index with typed factories
//!
//! Metrics are registered under a qualified name `"<owner-type>.<name>"`,
//! where the owner type is rendered from the factory's type parameter with
//! reference indirection stripped. Registering `new_counter::<Server>` and
//! looking up `find::<&Server>` therefore meet at the same entry.
//!
//! The registry holds a single reader-writer lock over the name map:
//! registration is exclusive, lookup and listing are shared. Registry
//! operations never take per-metric locks.
//!
//! A process-wide default registry is available through
//! [`default_registry`] and the free factory functions; it is initialized
//! on first use and never torn down.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use vitals_core::{Error, Result};

use crate::counter::Counter;
use crate::distribution::Distribution;
use crate::gauge::Gauge;
use crate::meter::Meter;

/// The kind of a registered metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// A [`Counter`]
    Counter,
    /// A [`Distribution`]
    Distribution,
    /// A [`Gauge`]
    Gauge,
    /// A [`Meter`]
    Meter,
}

impl MetricKind {
    /// Canonical kind string, as reported by [`Registry::list`].
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Distribution => "distribution",
            MetricKind::Gauge => "gauge",
            MetricKind::Meter => "meter",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered metric of exactly one kind.
///
/// Cloning is cheap: the variants hold `Arc`s to the shared metric.
#[derive(Clone)]
pub enum Metric {
    /// A counter
    Counter(Arc<Counter>),
    /// A distribution
    Distribution(Arc<Distribution>),
    /// A gauge
    Gauge(Arc<Gauge>),
    /// A meter
    Meter(Arc<Meter>),
}

impl Metric {
    /// The metric's kind.
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Distribution(_) => MetricKind::Distribution,
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::Meter(_) => MetricKind::Meter,
        }
    }

    /// Reset the metric, whatever its kind.
    pub fn reset(&self) {
        match self {
            Metric::Counter(c) => c.reset(),
            Metric::Distribution(d) => d.reset(),
            Metric::Gauge(g) => g.reset(),
            Metric::Meter(m) => m.reset(),
        }
    }

    /// The counter behind this metric, if it is one.
    pub fn as_counter(&self) -> Option<&Arc<Counter>> {
        match self {
            Metric::Counter(c) => Some(c),
            _ => None,
        }
    }

    /// The distribution behind this metric, if it is one.
    pub fn as_distribution(&self) -> Option<&Arc<Distribution>> {
        match self {
            Metric::Distribution(d) => Some(d),
            _ => None,
        }
    }

    /// The gauge behind this metric, if it is one.
    pub fn as_gauge(&self) -> Option<&Arc<Gauge>> {
        match self {
            Metric::Gauge(g) => Some(g),
            _ => None,
        }
    }

    /// The meter behind this metric, if it is one.
    pub fn as_meter(&self) -> Option<&Arc<Meter>> {
        match self {
            Metric::Meter(m) => Some(m),
            _ => None,
        }
    }
}

impl fmt::Debug for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Metric::{}", self.kind())
    }
}

/// Render the owner type with reference indirection stripped, e.g.
/// `&&mut Server` and `Server` both become the canonical `Server` path.
fn owner_type_name<T: ?Sized>() -> &'static str {
    let mut name = std::any::type_name::<T>();
    while let Some(stripped) = name.strip_prefix('&') {
        name = stripped.strip_prefix("mut ").unwrap_or(stripped);
    }
    name
}

/// The qualified registry name for an owner type and a metric name.
pub fn qualified_name<T: ?Sized>(name: &str) -> String {
    format!("{}.{}", owner_type_name::<T>(), name)
}

/// Concurrent index of qualified metric names.
#[derive(Debug)]
pub struct Registry {
    name: String,
    metrics: RwLock<HashMap<String, Metric>>,
}

impl Registry {
    /// Create an empty registry with a human-readable name.
    pub fn new(name: impl Into<String>) -> Self {
        Registry {
            name: name.into(),
            metrics: RwLock::new(HashMap::new()),
        }
    }

    /// The registry's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert a metric under a qualified name iff the name is free.
    fn register(&self, qualified: String, metric: Metric) -> Result<()> {
        let mut metrics = self.metrics.write();
        if metrics.contains_key(&qualified) {
            return Err(Error::already_registered(qualified));
        }
        debug!(
            registry = %self.name,
            name = %qualified,
            kind = metric.kind().as_str(),
            "metric registered"
        );
        metrics.insert(qualified, metric);
        Ok(())
    }

    // =========================================================================
    // Typed factories
    // =========================================================================

    /// Create and register a [`Counter`] owned by type `T`.
    pub fn new_counter<T: ?Sized>(&self, name: &str) -> Result<Arc<Counter>> {
        let counter = Arc::new(Counter::new());
        self.register(qualified_name::<T>(name), Metric::Counter(counter.clone()))?;
        Ok(counter)
    }

    /// Create and register a [`Distribution`] owned by type `T`.
    pub fn new_distribution<T: ?Sized>(&self, name: &str) -> Result<Arc<Distribution>> {
        let distribution = Arc::new(Distribution::new());
        self.register(
            qualified_name::<T>(name),
            Metric::Distribution(distribution.clone()),
        )?;
        Ok(distribution)
    }

    /// Create and register a [`Gauge`] owned by type `T`.
    pub fn new_gauge<T: ?Sized>(&self, name: &str) -> Result<Arc<Gauge>> {
        let gauge = Arc::new(Gauge::new());
        self.register(qualified_name::<T>(name), Metric::Gauge(gauge.clone()))?;
        Ok(gauge)
    }

    /// Create and register a [`Meter`] owned by type `T`.
    pub fn new_meter<T: ?Sized>(&self, name: &str) -> Result<Arc<Meter>> {
        let meter = Arc::new(Meter::new());
        self.register(qualified_name::<T>(name), Metric::Meter(meter.clone()))?;
        Ok(meter)
    }

    // =========================================================================
    // Lookup and listing
    // =========================================================================

    /// All `(qualified-name, kind)` pairs, sorted by name.
    pub fn list(&self) -> Vec<(String, MetricKind)> {
        let metrics = self.metrics.read();
        let mut list: Vec<(String, MetricKind)> = metrics
            .iter()
            .map(|(name, metric)| (name.clone(), metric.kind()))
            .collect();
        list.sort_by(|a, b| a.0.cmp(&b.0));
        list
    }

    /// All `(qualified-name, metric)` pairs, sorted by name, for reporting
    /// collaborators that iterate and snapshot.
    pub fn metrics(&self) -> Vec<(String, Metric)> {
        let metrics = self.metrics.read();
        let mut list: Vec<(String, Metric)> = metrics
            .iter()
            .map(|(name, metric)| (name.clone(), metric.clone()))
            .collect();
        list.sort_by(|a, b| a.0.cmp(&b.0));
        list
    }

    /// Look up a metric by owner type and name.
    pub fn find<T: ?Sized>(&self, name: &str) -> Option<Metric> {
        self.find_by_qualified_name(&qualified_name::<T>(name))
    }

    /// Look up a metric by its full qualified name.
    pub fn find_by_qualified_name(&self, qualified: &str) -> Option<Metric> {
        self.metrics.read().get(qualified).cloned()
    }
}

// ============================================================================
// Default registry
// ============================================================================

static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(|| Registry::new("default"));

/// The process-wide default registry.
///
/// A convenience facade: initialized before any metric factory can observe
/// it, never torn down.
pub fn default_registry() -> &'static Registry {
    &DEFAULT_REGISTRY
}

/// Create and register a [`Counter`] in the default registry.
pub fn new_counter<T: ?Sized>(name: &str) -> Result<Arc<Counter>> {
    default_registry().new_counter::<T>(name)
}

/// Create and register a [`Distribution`] in the default registry.
pub fn new_distribution<T: ?Sized>(name: &str) -> Result<Arc<Distribution>> {
    default_registry().new_distribution::<T>(name)
}

/// Create and register a [`Gauge`] in the default registry.
pub fn new_gauge<T: ?Sized>(name: &str) -> Result<Arc<Gauge>> {
    default_registry().new_gauge::<T>(name)
}

/// Create and register a [`Meter`] in the default registry.
pub fn new_meter<T: ?Sized>(name: &str) -> Result<Arc<Meter>> {
    default_registry().new_meter::<T>(name)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use vitals_core::Timestamp;

    struct TestOwner;

    fn test_init() -> Registry {
        let registry = Registry::new("test-registry");
        registry.new_counter::<TestOwner>("internal_type").unwrap();
        registry
            .new_distribution::<&TestOwner>("ptr_to_internal_type")
            .unwrap();
        registry.new_gauge::<Timestamp>("external_type").unwrap();
        registry
            .new_meter::<&Timestamp>("ptr_to_external_type")
            .unwrap();
        registry
    }

    #[test]
    fn test_registry_name() {
        assert_eq!(test_init().name(), "test-registry");
    }

    #[test]
    fn test_owner_type_name_strips_indirection() {
        assert_eq!(owner_type_name::<&TestOwner>(), owner_type_name::<TestOwner>());
        assert_eq!(
            owner_type_name::<&mut &TestOwner>(),
            owner_type_name::<TestOwner>()
        );
        assert_eq!(owner_type_name::<str>(), "str");
        assert_eq!(owner_type_name::<&str>(), "str");
    }

    #[test]
    fn test_registry_list() {
        let registry = test_init();
        let list = registry.list();
        assert_eq!(list.len(), 4);

        let expected = [
            (qualified_name::<TestOwner>("internal_type"), MetricKind::Counter),
            (
                qualified_name::<TestOwner>("ptr_to_internal_type"),
                MetricKind::Distribution,
            ),
            (qualified_name::<Timestamp>("external_type"), MetricKind::Gauge),
            (
                qualified_name::<Timestamp>("ptr_to_external_type"),
                MetricKind::Meter,
            ),
        ];
        for entry in &expected {
            assert!(list.contains(entry), "missing {:?} in {:?}", entry, list);
        }

        // Sorted by qualified name.
        let names: Vec<&String> = list.iter().map(|(name, _)| name).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_registry_find() {
        let registry = test_init();
        assert!(registry.find::<Timestamp>("external_type").is_some());
        // Registered under &Timestamp, found through the canonical type.
        assert!(registry.find::<Timestamp>("ptr_to_external_type").is_some());
        assert!(registry.find::<&Timestamp>("ptr_to_external_type").is_some());
        // Wrong owner type misses.
        assert!(registry.find::<Registry>("internal_type").is_none());
    }

    #[test]
    fn test_registry_find_by_qualified_name() {
        let registry = test_init();
        let qualified = qualified_name::<TestOwner>("internal_type");
        let metric = registry.find_by_qualified_name(&qualified).unwrap();
        assert_eq!(metric.kind(), MetricKind::Counter);
        assert!(metric.as_counter().is_some());
        assert!(metric.as_gauge().is_none());
    }

    #[test]
    fn test_registry_rejects_name_collision() {
        let registry = test_init();
        let err = registry
            .new_gauge::<TestOwner>("internal_type")
            .unwrap_err();
        assert!(err.is_already_registered());

        // A different owner type is a different qualified name.
        assert!(registry.new_gauge::<Registry>("internal_type").is_ok());
    }

    #[test]
    fn test_registered_metric_is_shared() {
        let registry = test_init();
        let counter = registry
            .find::<TestOwner>("internal_type")
            .and_then(|metric| metric.as_counter().cloned())
            .unwrap();
        counter.set(41);

        let again = registry
            .find::<TestOwner>("internal_type")
            .and_then(|metric| metric.as_counter().cloned())
            .unwrap();
        assert_eq!(again.snapshot().value, 41);
    }

    #[test]
    fn test_metric_reset_dispatches() {
        let registry = test_init();
        let metric = registry.find::<TestOwner>("internal_type").unwrap();
        metric.as_counter().unwrap().set(10);
        metric.reset();
        assert_eq!(metric.as_counter().unwrap().snapshot().value, 0);
    }

    #[test]
    fn test_default_registry_is_shared() {
        struct DefaultOwner;
        let counter = new_counter::<DefaultOwner>("shared").unwrap();
        counter.set(7);

        let found = default_registry()
            .find::<DefaultOwner>("shared")
            .and_then(|metric| metric.as_counter().cloned())
            .unwrap();
        assert_eq!(found.snapshot().value, 7);

        // Same name collides on the shared instance.
        assert!(new_counter::<DefaultOwner>("shared").is_err());
    }

    #[test]
    fn test_metric_kind_strings() {
        assert_eq!(MetricKind::Counter.as_str(), "counter");
        assert_eq!(MetricKind::Distribution.as_str(), "distribution");
        assert_eq!(MetricKind::Gauge.as_str(), "gauge");
        assert_eq!(MetricKind::Meter.as_str(), "meter");
    }
}
