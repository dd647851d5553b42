//! Action types and the bounds shared by state and payload values.

use std::fmt::Debug;
use std::hash::Hash;

/// A closed set of action types, one variant per reducer key.
///
/// Implemented by an application enum. The name is only used for logs and
/// error messages; routing is always by variant.
pub trait ActionKind: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    fn name(&self) -> &'static str;
}

/// Anything a reactor can hold as its state.
pub trait State: Debug + Send + Sync + 'static {}

impl<T: Debug + Send + Sync + 'static> State for T {}

/// Anything that can travel as an action payload.
pub trait Payload: Debug + Send + Sync + 'static {}

impl<T: Debug + Send + Sync + 'static> Payload for T {}

/// The dispatch object: which reducer to run and what to hand it.
#[derive(Debug, Clone, PartialEq)]
pub struct Action<K, P> {
    pub kind: K,
    pub payload: P,
}

impl<K: ActionKind, P> Action<K, P> {
    pub fn new(kind: K, payload: P) -> Self {
        Self { kind, payload }
    }

    /// The action type name, as reported by `ActionKind::name`.
    pub fn type_name(&self) -> &'static str {
        self.kind.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    enum Kind {
        Increment,
        Rename,
    }

    impl ActionKind for Kind {
        fn name(&self) -> &'static str {
            match self {
                Kind::Increment => "increment",
                Kind::Rename => "rename",
            }
        }
    }

    #[test]
    fn type_name_follows_kind() {
        assert_eq!(Action::new(Kind::Increment, 1).type_name(), "increment");
        assert_eq!(Action::new(Kind::Rename, "x").type_name(), "rename");
    }
}
