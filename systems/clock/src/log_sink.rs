//! Default narrative log sink.

use firebot_core::{LogLevel, LogSink};
use tracing::{error, info, warn};

/// Forwards narrative lines to `tracing` under the `firebot` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogSink;

impl LogSink for TracingLogSink {
    fn log(&mut self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => error!(target: "firebot", "{message}"),
            LogLevel::Warning => warn!(target: "firebot", "{message}"),
            LogLevel::System | LogLevel::Info | LogLevel::Path => {
                info!(target: "firebot", kind = level.as_str(), "{message}");
            }
        }
    }
}
