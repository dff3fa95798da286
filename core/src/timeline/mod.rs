//! Timeline processing
//!
//! - **Processor**: `CycleProcessor` sequences GCD/oGCD uses on the clock
//! - **Gauge**: bounded job resources
//! - **Records**: the use log and the finalized run

mod gauge;
mod processor;
mod record;

#[cfg(test)]
mod processor_tests;

pub use gauge::{Gauge, GaugeClamp, GaugeError, GaugeSnapshot, NoGauge, ResourceGauge};
pub use processor::CycleProcessor;
pub use record::{
    AbilityUseRecord, CompletedRun, DOT_TICK_INTERVAL, DamageSummary, SimWarning, UseOutcome,
};
