//! Demo domain: a counter and a status label sharing one action vocabulary.

use reactor_core::{ActionKind, ReducerMap, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AppAction {
    Increment,
    Decrement,
    IncrementByAmount,
    IncrementByAmountAsync,
    SetStatus,
    Reset,
}

impl ActionKind for AppAction {
    fn name(&self) -> &'static str {
        match self {
            AppAction::Increment => "increment",
            AppAction::Decrement => "decrement",
            AppAction::IncrementByAmount => "incrementByAmount",
            AppAction::IncrementByAmountAsync => "incrementByAmountAsync",
            AppAction::SetStatus => "setStatus",
            AppAction::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppPayload {
    None,
    Amount(i64),
    Status(String),
}

impl AppPayload {
    fn amount(&self) -> anyhow::Result<i64> {
        match self {
            AppPayload::Amount(n) => Ok(*n),
            other => anyhow::bail!("expected an amount, got {other:?}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CounterState {
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusState {
    pub text: String,
    pub changes: u32,
}

pub fn counter_reducers() -> Result<ReducerMap<CounterState, AppAction, AppPayload>> {
    ReducerMap::builder()
        .on(AppAction::Increment, |s: &CounterState, _: &AppPayload| CounterState {
            value: s.value + 1,
        })
        .on(AppAction::Decrement, |s: &CounterState, _: &AppPayload| CounterState {
            value: s.value - 1,
        })
        .try_on(AppAction::IncrementByAmount, |s: &CounterState, p: &AppPayload| {
            Ok(CounterState {
                value: s.value + p.amount()?,
            })
        })
        .try_on(AppAction::IncrementByAmountAsync, |s: &CounterState, p: &AppPayload| {
            Ok(CounterState {
                value: s.value + p.amount()?,
            })
        })
        .on(AppAction::Reset, |_: &CounterState, _: &AppPayload| CounterState { value: 0 })
        .build()
}

pub fn status_reducers() -> Result<ReducerMap<StatusState, AppAction, AppPayload>> {
    ReducerMap::builder()
        .try_on(AppAction::SetStatus, |s: &StatusState, p: &AppPayload| match p {
            AppPayload::Status(text) => Ok(StatusState {
                text: text.clone(),
                changes: s.changes + 1,
            }),
            other => anyhow::bail!("expected a status, got {other:?}"),
        })
        .on(AppAction::Reset, |s: &StatusState, _: &AppPayload| StatusState {
            text: "idle".to_string(),
            changes: s.changes + 1,
        })
        .build()
}
