//! Dispatch logging plugin.
//!
//! Records the action before it enters the rest of the chain and the state
//! after the chain returns. Where the records go is decided by the injected
//! `Recorder`, never by the plugin itself.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;

use crate::action::{Action, ActionKind};
use crate::error::Result;
use crate::plugin::{Next, Plugin};
use crate::store::Store;

/// One observation made by `LoggerPlugin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    Dispatching { reactor: String, action: String },
    NextState { reactor: String, state: String },
}

/// Receives dispatch observations.
pub trait Recorder: Send + Sync {
    fn record(&self, event: DispatchEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Logger settings. Every field has a default; partial configs fill the rest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Message attached to the pre-dispatch record. Default `"Dispatching:"`.
    pub dispatch_label: String,
    /// Message attached to the post-dispatch record. Default `"Next state:"`.
    pub next_state_label: String,
    /// Level for both records. Default `info`.
    pub level: LogLevel,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            dispatch_label: "Dispatching:".to_string(),
            next_state_label: "Next state:".to_string(),
            level: LogLevel::Info,
        }
    }
}

/// Emits records as `tracing` events.
#[derive(Debug, Clone, Default)]
pub struct TracingRecorder {
    config: LoggerConfig,
}

impl TracingRecorder {
    pub fn new(config: LoggerConfig) -> Self {
        Self { config }
    }
}

macro_rules! emit {
    ($level:expr, $($arg:tt)+) => {
        match $level {
            LogLevel::Trace => tracing::trace!($($arg)+),
            LogLevel::Debug => tracing::debug!($($arg)+),
            LogLevel::Info => tracing::info!($($arg)+),
            LogLevel::Warn => tracing::warn!($($arg)+),
            LogLevel::Error => tracing::error!($($arg)+),
        }
    };
}

impl Recorder for TracingRecorder {
    fn record(&self, event: DispatchEvent) {
        let level = self.config.level;
        match event {
            DispatchEvent::Dispatching { reactor, action } => {
                emit!(level, reactor = %reactor, action = %action, "{}", self.config.dispatch_label)
            }
            DispatchEvent::NextState { reactor, state } => {
                emit!(level, reactor = %reactor, state = %state, "{}", self.config.next_state_label)
            }
        }
    }
}

/// In-memory recorder for tests. Thread-safe.
#[derive(Debug, Default)]
pub struct MemoryRecorder {
    events: Mutex<Vec<DispatchEvent>>,
}

impl MemoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, oldest first.
    pub fn events(&self) -> Vec<DispatchEvent> {
        self.events.lock().clone()
    }
}

impl Recorder for MemoryRecorder {
    fn record(&self, event: DispatchEvent) {
        self.events.lock().push(event);
    }
}

// Lets tests keep a handle on the recorder for assertions.
impl<R: Recorder + ?Sized> Recorder for Arc<R> {
    fn record(&self, event: DispatchEvent) {
        (**self).record(event)
    }
}

/// Records every action passing through, and the state once the rest of the
/// chain has run.
#[derive(Debug, Clone)]
pub struct LoggerPlugin<R> {
    recorder: R,
}

impl<R: Recorder> LoggerPlugin<R> {
    pub fn new(recorder: R) -> Self {
        Self { recorder }
    }
}

impl<S, K, P, R> Plugin<S, K, P> for LoggerPlugin<R>
where
    S: Debug,
    K: ActionKind,
    P: Debug,
    R: Recorder,
{
    fn name(&self) -> &str {
        "logger"
    }

    fn intercept(
        &self,
        store: &Store<S, K, P>,
        action: Action<K, P>,
        next: Next<'_, S, K, P>,
    ) -> Result<()> {
        self.recorder.record(DispatchEvent::Dispatching {
            reactor: store.name().to_string(),
            action: format!("{action:?}"),
        });
        let result = next.run(action);
        self.recorder.record(DispatchEvent::NextState {
            reactor: store.name().to_string(),
            state: format!("{:?}", store.get_state()),
        });
        result
    }
}

/// A logger writing to `tracing` with the given settings.
pub fn reactor_logger(config: LoggerConfig) -> LoggerPlugin<TracingRecorder> {
    LoggerPlugin::new(TracingRecorder::new(config))
}
