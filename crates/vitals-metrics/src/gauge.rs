//! Gauge: a caller-supplied producer of an instantaneous value
//!
//! A gauge holds a producer function and the value it most recently
//! returned. [`Gauge::update`] invokes the producer exactly once under
//! exclusive access and stores the result along with the invocation time;
//! snapshots hand back the stored value without re-invoking anything.
//!
//! Produced values only need to render themselves ([`Gaugable`] is any
//! `Display + Send + Sync` type), so a gauge can report strings, numbers,
//! or richer structs with a `Display` impl.

use parking_lot::RwLock;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;
use tracing::trace;
use vitals_core::Timestamp;

/// A value a gauge can hold: anything stringifiable and shareable.
pub trait Gaugable: fmt::Display + Send + Sync {}

impl<T: fmt::Display + Send + Sync> Gaugable for T {}

type GaugeFunction = Box<dyn Fn() -> Arc<dyn Gaugable> + Send + Sync>;

/// Point-in-time copy of a [`Gauge`].
#[derive(Clone)]
pub struct GaugeSnapshot {
    /// The last produced value, `None` if the gauge was never updated
    pub value: Option<Arc<dyn Gaugable>>,
    /// Time of the last update; epoch if never updated
    pub last_updated: Timestamp,
}

impl GaugeSnapshot {
    /// Render the stored value through its `Display` impl.
    pub fn value_string(&self) -> Option<String> {
        self.value.as_ref().map(|v| v.to_string())
    }
}

impl fmt::Debug for GaugeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GaugeSnapshot")
            .field("value", &self.value_string())
            .field("last_updated", &self.last_updated)
            .finish()
    }
}

impl Serialize for GaugeSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GaugeSnapshot", 2)?;
        state.serialize_field("value", &self.value_string())?;
        state.serialize_field("last_updated", &self.last_updated)?;
        state.end()
    }
}

struct GaugeInner {
    value: Option<Arc<dyn Gaugable>>,
    function: Option<GaugeFunction>,
    last_updated: Timestamp,
}

/// Stores a single, instantaneous value, refreshed on demand by a stored
/// producer function.
pub struct Gauge {
    inner: RwLock<GaugeInner>,
}

impl fmt::Debug for Gauge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Gauge")
            .field("value", &inner.value.as_ref().map(|v| v.to_string()))
            .field("last_updated", &inner.last_updated)
            .finish()
    }
}

impl Default for Gauge {
    fn default() -> Self {
        Self::new()
    }
}

impl Gauge {
    /// Create a gauge with no producer and no value.
    pub fn new() -> Self {
        Gauge {
            inner: RwLock::new(GaugeInner {
                value: None,
                function: None,
                last_updated: Timestamp::EPOCH,
            }),
        }
    }

    /// Clear the stored value and update time. The producer function is
    /// kept.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.value = None;
        inner.last_updated = Timestamp::EPOCH;
    }

    /// Associate a producer function with the gauge.
    ///
    /// The function is called on every [`Gauge::update`]. Stateful
    /// producers should carry their state behind interior mutability.
    pub fn set_function<F, G>(&self, function: F)
    where
        F: Fn() -> G + Send + Sync + 'static,
        G: Gaugable + 'static,
    {
        let erased: GaugeFunction = Box::new(move || Arc::new(function()) as Arc<dyn Gaugable>);
        self.inner.write().function = Some(erased);
    }

    /// Invoke the producer once and store its value and the current time.
    /// No-op if no producer has been set.
    pub fn update(&self) {
        self.update_at(Timestamp::now());
    }

    fn update_at(&self, now: Timestamp) {
        let mut inner = self.inner.write();
        let produced = inner.function.as_ref().map(|function| function());
        if let Some(value) = produced {
            trace!("gauge updated");
            inner.value = Some(value);
            inner.last_updated = now;
        }
    }

    /// Take a copy of the stored value and update time.
    pub fn snapshot(&self) -> GaugeSnapshot {
        let inner = self.inner.read();
        GaugeSnapshot {
            value: inner.value.clone(),
            last_updated: inner.last_updated,
        }
    }
}
