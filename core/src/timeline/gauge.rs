//! Job gauges
//!
//! A gauge is a set of bounded resources that abilities spend and generate.
//! Going out of bounds is clamped with a warning, or rejected in strict mode.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::ability::GaugeUpdatable;

/// Resource values at one point in time, by name.
pub type GaugeSnapshot = BTreeMap<String, f64>;

/// Errors raised by gauge updates
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GaugeError {
    #[error("{resource} would overflow: {attempted} exceeds max {max}")]
    Overflow {
        resource: String,
        attempted: f64,
        max: f64,
    },
    #[error("{resource} would underflow: {attempted} is below zero")]
    Underflow { resource: String, attempted: f64 },
    #[error("unknown gauge resource '{resource}'")]
    UnknownResource { resource: String },
}

/// A resource value forced back into bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeClamp {
    pub resource: String,
    pub attempted: f64,
    pub clamped: f64,
}

/// Job gauge state owned by one run.
pub trait Gauge: Clone + Send + Sync + fmt::Debug {
    /// Whether every cost of `ability` can be paid right now.
    fn can_pay<A: GaugeUpdatable + ?Sized>(&self, ability: &A) -> bool;

    /// Apply `ability`'s resource changes.
    ///
    /// Out-of-bounds results are clamped and reported unless `strict`, in
    /// which case nothing changes and an error is returned.
    fn update<A: GaugeUpdatable + ?Sized>(
        &mut self,
        ability: &A,
        strict: bool,
    ) -> Result<Vec<GaugeClamp>, GaugeError>;

    fn snapshot(&self) -> GaugeSnapshot;
}

/// Gauge for jobs without resources.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGauge;

impl Gauge for NoGauge {
    fn can_pay<A: GaugeUpdatable + ?Sized>(&self, _ability: &A) -> bool {
        true
    }

    fn update<A: GaugeUpdatable + ?Sized>(
        &mut self,
        _ability: &A,
        _strict: bool,
    ) -> Result<Vec<GaugeClamp>, GaugeError> {
        Ok(Vec::new())
    }

    fn snapshot(&self) -> GaugeSnapshot {
        GaugeSnapshot::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Resource {
    value: f64,
    max: f64,
}

/// Named bounded resources in `[0, max]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceGauge {
    resources: BTreeMap<String, Resource>,
}

impl ResourceGauge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resource(mut self, name: impl Into<String>, max: f64, initial: f64) -> Self {
        self.resources.insert(
            name.into(),
            Resource {
                value: initial.clamp(0.0, max),
                max,
            },
        );
        self
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.resources.get(name).map(|r| r.value)
    }

    pub fn has_resource(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }
}

impl Gauge for ResourceGauge {
    fn can_pay<A: GaugeUpdatable + ?Sized>(&self, ability: &A) -> bool {
        ability
            .resource_deltas()
            .iter()
            .filter(|delta| delta.amount < 0.0)
            .all(|delta| {
                self.resources
                    .get(&delta.resource)
                    .is_some_and(|r| r.value + delta.amount >= 0.0)
            })
    }

    fn update<A: GaugeUpdatable + ?Sized>(
        &mut self,
        ability: &A,
        strict: bool,
    ) -> Result<Vec<GaugeClamp>, GaugeError> {
        let mut next = self.resources.clone();
        let mut clamps = Vec::new();

        for delta in ability.resource_deltas() {
            let Some(resource) = next.get_mut(&delta.resource) else {
                return Err(GaugeError::UnknownResource {
                    resource: delta.resource.clone(),
                });
            };

            let attempted = resource.value + delta.amount;
            if attempted > resource.max {
                if strict {
                    return Err(GaugeError::Overflow {
                        resource: delta.resource.clone(),
                        attempted,
                        max: resource.max,
                    });
                }
                resource.value = resource.max;
            } else if attempted < 0.0 {
                if strict {
                    return Err(GaugeError::Underflow {
                        resource: delta.resource.clone(),
                        attempted,
                    });
                }
                resource.value = 0.0;
            } else {
                resource.value = attempted;
                continue;
            }

            clamps.push(GaugeClamp {
                resource: delta.resource.clone(),
                attempted,
                clamped: resource.value,
            });
        }

        self.resources = next;
        Ok(clamps)
    }

    fn snapshot(&self) -> GaugeSnapshot {
        self.resources
            .iter()
            .map(|(name, r)| (name.clone(), r.value))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{Ability, ResourceDelta};

    fn make_gauge() -> ResourceGauge {
        ResourceGauge::new().with_resource("heat", 100.0, 50.0)
    }

    fn make_user(amount: f64) -> Ability {
        let delta = if amount < 0.0 {
            ResourceDelta::cost("heat", amount)
        } else {
            ResourceDelta::gain("heat", amount)
        };
        Ability::gcd(1, "Heat User", 100.0).with_resource(delta)
    }

    #[test]
    fn test_spend_and_generate() {
        let mut gauge = make_gauge();
        assert!(gauge.update(&make_user(30.0), false).unwrap().is_empty());
        assert_eq!(gauge.value("heat"), Some(80.0));
        gauge.update(&make_user(-50.0), false).unwrap();
        assert_eq!(gauge.value("heat"), Some(30.0));
    }

    #[test]
    fn test_overflow_clamps_when_lenient() {
        let mut gauge = make_gauge();
        let clamps = gauge.update(&make_user(70.0), false).unwrap();
        assert_eq!(gauge.value("heat"), Some(100.0));
        assert_eq!(
            clamps,
            vec![GaugeClamp {
                resource: "heat".to_string(),
                attempted: 120.0,
                clamped: 100.0,
            }]
        );
    }

    #[test]
    fn test_strict_mode_rejects_without_mutating() {
        let mut gauge = make_gauge();
        let err = gauge.update(&make_user(-60.0), true).unwrap_err();
        assert!(matches!(err, GaugeError::Underflow { .. }));
        assert_eq!(gauge.value("heat"), Some(50.0), "Failed update leaves state untouched");
    }

    #[test]
    fn test_can_pay() {
        let gauge = make_gauge();
        assert!(gauge.can_pay(&make_user(-50.0)));
        assert!(!gauge.can_pay(&make_user(-51.0)));
        assert!(gauge.can_pay(&make_user(80.0)), "Generation never blocks");
    }

    #[test]
    fn test_unknown_resource() {
        let mut gauge = make_gauge();
        let ability = Ability::gcd(2, "Other", 100.0).with_resource(ResourceDelta::gain("soul", 10.0));
        assert!(!gauge.can_pay(&Ability::gcd(3, "X", 0.0).with_resource(ResourceDelta::cost("soul", 5.0))));
        assert!(matches!(
            gauge.update(&ability, false),
            Err(GaugeError::UnknownResource { .. })
        ));
    }
}
