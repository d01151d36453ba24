use crate::{
    error::{MetricsError, Result},
    instrument::{InstrumentDescriptor, InstrumentHandle},
    snapshot::{Resource, Snapshot},
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

#[derive(Default)]
struct Instruments {
    by_name: HashMap<String, usize>,
    ordered: Vec<InstrumentHandle>,
}

/// Owns every instrument of the process.
///
/// Constructed once by the entry point and shared as `Arc<Registry>`; there
/// is no global instance.
#[derive(Default)]
pub struct Registry {
    resource: Resource,
    instruments: RwLock<Instruments>,
}

impl Registry {
    pub fn new(resource: Resource) -> Self {
        Self {
            resource,
            instruments: RwLock::new(Instruments::default()),
        }
    }

    /// Registers an instrument, or returns the existing one when an
    /// instrument of the same name and kind is already present.
    pub fn register(&self, descriptor: InstrumentDescriptor) -> Result<InstrumentHandle> {
        descriptor.validate()?;

        let mut instruments = self
            .instruments
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(&index) = instruments.by_name.get(&descriptor.name) {
            let existing = &instruments.ordered[index];
            if existing.kind() != descriptor.kind {
                return Err(MetricsError::DuplicateNameConflict {
                    name: descriptor.name,
                    existing: existing.kind(),
                    requested: descriptor.kind,
                });
            }
            if existing.descriptor() != &descriptor {
                warn!(
                    "Instrument '{}' re-registered with different metadata, keeping the original",
                    descriptor.name
                );
            }
            return Ok(existing.clone());
        }

        debug!("Registering {} '{}'", descriptor.kind, descriptor.name);

        let name = descriptor.name.clone();
        let handle = InstrumentHandle::new(descriptor);
        let index = instruments.ordered.len();
        instruments.ordered.push(handle.clone());
        instruments.by_name.insert(name, index);

        Ok(handle)
    }

    pub fn lookup(&self, name: &str) -> Result<InstrumentHandle> {
        let instruments = self
            .instruments
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        instruments
            .by_name
            .get(name)
            .map(|&index| instruments.ordered[index].clone())
            .ok_or_else(|| MetricsError::NotFound(name.to_string()))
    }

    /// Instrument names in registration order.
    pub fn list(&self) -> Vec<String> {
        self.handles()
            .iter()
            .map(|handle| handle.name().to_string())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.handles().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds a snapshot of every registered instrument.
    pub fn collect(&self) -> Snapshot {
        let metrics = self
            .handles()
            .iter()
            .map(InstrumentHandle::collect)
            .collect();

        Snapshot {
            timestamp: Utc::now(),
            resource: self.resource.clone(),
            metrics,
        }
    }

    fn handles(&self) -> Vec<InstrumentHandle> {
        self.instruments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .ordered
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::InstrumentKind;
    use crate::labels::LabelSet;

    #[test]
    fn test_registration_is_idempotent() {
        let registry = Registry::default();
        let labels = LabelSet::from([("method", "GET")]);

        let first = registry
            .register(InstrumentDescriptor::counter("requests_total").build())
            .unwrap();
        first.add(7.0, &labels).unwrap();

        let second = registry
            .register(InstrumentDescriptor::counter("requests_total").build())
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.len(), 1);

        let snapshot = registry.collect();
        let metric = snapshot.metric("requests_total").unwrap();
        assert_eq!(metric.point(&labels).unwrap().value.as_sum(), Some(7.0));
    }

    #[test]
    fn test_kind_conflict() {
        let registry = Registry::default();
        registry
            .register(InstrumentDescriptor::counter("requests_total").build())
            .unwrap();

        let err = registry
            .register(InstrumentDescriptor::histogram("requests_total").build())
            .unwrap_err();

        match err {
            MetricsError::DuplicateNameConflict {
                name,
                existing,
                requested,
            } => {
                assert_eq!(name, "requests_total");
                assert_eq!(existing, InstrumentKind::Counter);
                assert_eq!(requested, InstrumentKind::Histogram);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_metadata_mismatch_keeps_original() {
        let registry = Registry::default();
        registry
            .register(
                InstrumentDescriptor::counter("requests_total")
                    .description("original")
                    .build(),
            )
            .unwrap();
        let again = registry
            .register(
                InstrumentDescriptor::counter("requests_total")
                    .description("changed")
                    .build(),
            )
            .unwrap();

        assert_eq!(again.descriptor().description, "original");
    }

    #[test]
    fn test_lookup() {
        let registry = Registry::default();
        let handle = registry
            .register(InstrumentDescriptor::up_down_counter("cpu_usage").build())
            .unwrap();

        assert_eq!(registry.lookup("cpu_usage").unwrap(), handle);
        assert!(matches!(
            registry.lookup("missing"),
            Err(MetricsError::NotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn test_invalid_descriptor_is_not_registered() {
        let registry = Registry::default();
        assert!(registry
            .register(InstrumentDescriptor::counter("bad name").build())
            .is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_collect_follows_registration_order() {
        let registry = Registry::new(Resource::service("otel-demo", "1.0.0"));
        for name in ["requests_total", "cpu_usage", "request_duration"] {
            registry
                .register(InstrumentDescriptor::counter(name).build())
                .unwrap();
        }

        let snapshot = registry.collect();
        let names: Vec<_> = snapshot.metrics.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["requests_total", "cpu_usage", "request_duration"]);
        assert_eq!(snapshot.resource.service_name(), Some("otel-demo"));
        assert!(snapshot.is_empty());
    }
}
