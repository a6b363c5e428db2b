//! # Pending Operations
//!
//! Two operations cannot complete on the spot:
//!
//! - **Add**: the definitive id of a new record is assigned by the data source,
//!   which may answer later (a remote store, a sync queue).
//! - **Delete**: a destructive change waits behind a user confirmation.
//!
//! Both are modelled as explicit pending state in a [`PendingTable`]. Opening an
//! operation returns a [`Ticket`]; the ticket is then settled exactly once, either
//! by resolving it (`take`) or by cancelling it. Settling a ticket a second time is
//! harmless and reports [`Settlement::AlreadySettled`], so a late or duplicated
//! answer from a collaborator never changes state twice.

use crate::error::{Result, SprigError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t{}", self.0)
    }
}

/// Outcome of settling a ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement<T> {
    Applied(T),
    AlreadySettled,
}

impl<T> Settlement<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Settlement::Applied(_))
    }
}

#[derive(Debug)]
enum Slot<T> {
    Waiting(T),
    Resolved,
    Cancelled,
}

#[derive(Debug)]
pub struct PendingTable<T> {
    next: u64,
    slots: BTreeMap<Ticket, Slot<T>>,
}

impl<T> Default for PendingTable<T> {
    fn default() -> Self {
        Self {
            next: 1,
            slots: BTreeMap::new(),
        }
    }
}

impl<T> PendingTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self, payload: T) -> Ticket {
        let ticket = Ticket(self.next);
        self.next += 1;
        self.slots.insert(ticket, Slot::Waiting(payload));
        ticket
    }

    /// The payload of a ticket that is still waiting.
    pub fn peek(&self, ticket: Ticket) -> Option<&T> {
        match self.slots.get(&ticket) {
            Some(Slot::Waiting(payload)) => Some(payload),
            _ => None,
        }
    }

    /// Resolves a ticket, handing back its payload.
    ///
    /// Returns `Ok(None)` when the ticket was already resolved or cancelled.
    pub fn take(&mut self, ticket: Ticket) -> Result<Option<T>> {
        let slot = self
            .slots
            .get_mut(&ticket)
            .ok_or(SprigError::UnknownTicket(ticket))?;
        match std::mem::replace(slot, Slot::Resolved) {
            Slot::Waiting(payload) => Ok(Some(payload)),
            settled => {
                *slot = settled;
                Ok(None)
            }
        }
    }

    /// Puts a payload back after a resolution attempt failed.
    pub fn reopen(&mut self, ticket: Ticket, payload: T) {
        self.slots.insert(ticket, Slot::Waiting(payload));
    }

    pub fn cancel(&mut self, ticket: Ticket) -> Result<Settlement<T>> {
        let slot = self
            .slots
            .get_mut(&ticket)
            .ok_or(SprigError::UnknownTicket(ticket))?;
        match std::mem::replace(slot, Slot::Cancelled) {
            Slot::Waiting(payload) => Ok(Settlement::Applied(payload)),
            settled => {
                *slot = settled;
                Ok(Settlement::AlreadySettled)
            }
        }
    }

    pub fn waiting(&self) -> impl Iterator<Item = (Ticket, &T)> {
        self.slots.iter().filter_map(|(ticket, slot)| match slot {
            Slot::Waiting(payload) => Some((*ticket, payload)),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_resolves_once() {
        let mut table = PendingTable::new();
        let ticket = table.open("draft");

        assert_eq!(table.peek(ticket), Some(&"draft"));
        assert_eq!(table.take(ticket).unwrap(), Some("draft"));
        assert_eq!(table.take(ticket).unwrap(), None);
        assert_eq!(table.peek(ticket), None);
    }

    #[test]
    fn cancel_then_take_is_noop() {
        let mut table = PendingTable::new();
        let ticket = table.open(5);

        assert_eq!(table.cancel(ticket).unwrap(), Settlement::Applied(5));
        assert_eq!(table.peek(ticket), None);
        assert_eq!(table.take(ticket).unwrap(), None);
        assert_eq!(table.cancel(ticket).unwrap(), Settlement::AlreadySettled);
        assert_eq!(table.waiting().count(), 0);
    }

    #[test]
    fn unknown_ticket_is_an_error() {
        let mut table: PendingTable<()> = PendingTable::new();
        let other = PendingTable::<()>::new().open(());
        match table.take(other) {
            Err(SprigError::UnknownTicket(t)) => assert_eq!(t, other),
            _ => panic!("Expected UnknownTicket"),
        }
    }

    #[test]
    fn reopen_restores_waiting_state() {
        let mut table = PendingTable::new();
        let ticket = table.open("x");
        let payload = table.take(ticket).unwrap().unwrap();
        table.reopen(ticket, payload);

        assert_eq!(table.waiting().count(), 1);
        assert_eq!(table.take(ticket).unwrap(), Some("x"));
    }

    #[test]
    fn tickets_are_distinct() {
        let mut table = PendingTable::new();
        let a = table.open(1);
        let b = table.open(2);
        assert_ne!(a, b);
        let waiting: Vec<_> = table.waiting().map(|(_, v)| *v).collect();
        assert_eq!(waiting, vec![1, 2]);
    }
}
