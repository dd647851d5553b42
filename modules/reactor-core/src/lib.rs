//! Unidirectional state-container engine.
//!
//! A `Reactor` holds one immutable state value, accepts typed actions, computes
//! the next state through pure reducers and notifies subscribers of every
//! transition. Dispatch runs through an ordered plugin chain (first plugin is
//! the outermost wrapper). A `CombinedReactor` fans one action out to every
//! member reactor that recognizes it and exposes a composite state/action
//! surface over them.
//!
//! Consumers declare their domain by implementing `ActionKind` (a closed enum
//! of action types) and building a `ReducerMap` for each reactor.

pub mod action;
pub mod combine;
pub mod creators;
pub mod error;
pub mod plugin;
pub mod plugins;
pub mod reactor;
pub mod reducer;
pub mod store;
pub mod subscription;

pub use action::{Action, ActionKind, Payload, State};
pub use combine::{
    combine_reactors, CombineOptions, CombinedActions, CombinedReactor, CombinedReactorBuilder,
    CombinedState, DynActions, MemberHandle, StateSlice,
};
pub use creators::{ActionCreator, ActionCreators};
pub use error::{ReactorError, Result};
pub use plugin::{plugin_fn, FnPlugin, Next, Plugin};
pub use plugins::logger::{
    reactor_logger, DispatchEvent, LogLevel, LoggerConfig, LoggerPlugin, MemoryRecorder, Recorder,
    TracingRecorder,
};
pub use reactor::{create_reactor, Reactor, ReactorBuilder};
pub use reducer::{ReducerMap, ReducerMapBuilder};
pub use store::Store;
pub use subscription::{SubscriberSet, Subscription};
