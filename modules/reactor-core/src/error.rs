//! Typed errors for reactor construction and dispatch.

use thiserror::Error;

/// Errors surfaced by reactors, combinators and action creators.
///
/// Dispatching an action type a reactor does not recognize is not an error;
/// it is silently ignored.
#[derive(Debug, Error)]
pub enum ReactorError {
    /// The same action kind was registered twice in one reducer map
    #[error("duplicate reducer for action `{kind}`")]
    DuplicateReducer { kind: &'static str },

    /// Two members of a combined reactor share a name
    #[error("duplicate member reactor: {name}")]
    DuplicateMember { name: String },

    /// A fallible reducer returned an error; that reactor's state is unchanged
    #[error("reducer for `{kind}` failed in reactor `{reactor}`: {source}")]
    Reducer {
        reactor: String,
        kind: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A payload resolver failed; nothing was dispatched
    #[error("resolver for `{kind}` failed: {source}")]
    Resolver {
        kind: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// A plugin rejected the action
    #[error("plugin `{plugin}` rejected `{kind}`: {source}")]
    Plugin {
        plugin: String,
        kind: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

/// Result type alias for reactor operations.
pub type Result<T, E = ReactorError> = std::result::Result<T, E>;
