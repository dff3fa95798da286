//! Run-fatal simulation errors

use thiserror::Error;

use crate::combo::ComboError;
use crate::cooldowns::CooldownError;
use crate::timeline::GaugeError;

/// Errors that abort a single simulation run
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    #[error("cooldown error: {0}")]
    Cooldown(#[from] CooldownError),

    #[error("combo error: {0}")]
    Combo(#[from] ComboError),

    #[error("gauge error at {time:.2}s using {ability}: {source}")]
    Gauge {
        ability: String,
        time: f64,
        #[source]
        source: GaugeError,
    },
}

/// Render an error with its source chain on one line.
///
/// Causes already spelled out by their parent's message are not repeated.
pub fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
