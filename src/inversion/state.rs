//! Single-slot handoff cell between a supplying side and a consuming side
//!
//! One outstanding item at a time: the supplier must never overwrite an
//! unconsumed slot, and the consumer must never take twice without an
//! intervening supply.

use crate::error::ProtocolError;
use std::fmt;

/// The four states of a [`RendezvousState`]. `AtEnd` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateKind {
    AwaitingValue,
    HasValue,
    AtError,
    AtEnd,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::AwaitingValue => "AWAITING_VALUE",
            Self::HasValue => "HAS_VALUE",
            Self::AtError => "AT_ERROR",
            Self::AtEnd => "AT_END",
        };
        f.write_str(s)
    }
}

/// What the consuming side receives from [`RendezvousState::take_next`].
#[derive(Debug, PartialEq)]
pub enum Handoff<T, E> {
    Value(T),
    Error(E),
    End,
}

#[derive(Debug)]
enum Slot<T, E> {
    Awaiting,
    Value(T),
    Error(E),
    End,
}

/// Four-state single-slot mailbox.
#[derive(Debug)]
pub struct RendezvousState<T, E> {
    slot: Slot<T, E>,
}

impl<T, E> RendezvousState<T, E> {
    pub fn new() -> Self {
        Self {
            slot: Slot::Awaiting,
        }
    }

    pub fn state(&self) -> StateKind {
        match self.slot {
            Slot::Awaiting => StateKind::AwaitingValue,
            Slot::Value(_) => StateKind::HasValue,
            Slot::Error(_) => StateKind::AtError,
            Slot::End => StateKind::AtEnd,
        }
    }

    pub fn is_at_end(&self) -> bool {
        matches!(self.slot, Slot::End)
    }

    pub fn register_value(&mut self, value: T) -> Result<(), ProtocolError> {
        self.expect_awaiting("register_value")?;
        self.slot = Slot::Value(value);
        Ok(())
    }

    pub fn register_error(&mut self, err: E) -> Result<(), ProtocolError> {
        self.expect_awaiting("register_error")?;
        self.slot = Slot::Error(err);
        Ok(())
    }

    pub fn register_end(&mut self) -> Result<(), ProtocolError> {
        self.expect_awaiting("register_end")?;
        self.slot = Slot::End;
        Ok(())
    }

    /// Take the held item.
    ///
    /// A value returns the cell to `AwaitingValue`; an error moves it to
    /// `AtEnd`, so it is handed out exactly once.
    pub fn take_next(&mut self) -> Result<Handoff<T, E>, ProtocolError> {
        match std::mem::replace(&mut self.slot, Slot::Awaiting) {
            Slot::Awaiting => Err(ProtocolError::ValueNotProvided),
            Slot::Value(v) => Ok(Handoff::Value(v)),
            Slot::Error(e) => {
                self.slot = Slot::End;
                Ok(Handoff::Error(e))
            }
            Slot::End => {
                self.slot = Slot::End;
                Ok(Handoff::End)
            }
        }
    }

    fn expect_awaiting(&self, call: &'static str) -> Result<(), ProtocolError> {
        match self.state() {
            StateKind::AwaitingValue => Ok(()),
            state => Err(ProtocolError::UnexpectedState { call, state }),
        }
    }
}

impl<T, E> Default for RendezvousState<T, E> {
    fn default() -> Self {
        Self::new()
    }
}
