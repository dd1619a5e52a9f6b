//! Slot bookkeeping for the two connected players
//!
//! This module tracks which connection holds which player slot, including:
//! - Slot assignment on connect, always filling the lowest free slot first
//! - Slot release when a connection ends for any reason
//! - Per-connection activity counters used for session logging
//!
//! The manager never holds more than two clients. Connections beyond that
//! are held back by the accept loop before they ever reach it.

use log::info;
use shared::Slot;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Number of player slots in a match.
pub const MAX_PLAYERS: usize = 2;

/// A connection that currently owns a player slot
///
/// Each client records:
/// - The slot it occupies and the peer address the server sees for it
/// - When it connected and when it last completed a tick
/// - How many ticks it has played and how many matches it has lost
#[derive(Debug, Clone)]
pub struct Client {
    /// Slot this connection drives
    pub slot: Slot,
    /// Peer address, also the identity reported in the handshake
    pub addr: SocketAddr,
    /// Time the slot was assigned
    pub connected_at: Instant,
    /// Last time this connection finished a tick
    pub last_seen: Instant,
    /// Completed ticks
    pub ticks: u64,
    /// Matches this connection lost
    pub losses: u32,
}

impl Client {
    pub fn new(slot: Slot, addr: SocketAddr, now: Instant) -> Self {
        Self {
            slot,
            addr,
            connected_at: now,
            last_seen: now,
            ticks: 0,
            losses: 0,
        }
    }

    /// Records one finished tick at `now`.
    pub fn touch(&mut self, now: Instant) {
        self.last_seen = now;
        self.ticks += 1;
    }

    /// Time between the slot assignment and the last finished tick.
    pub fn session_length(&self) -> Duration {
        self.last_seen.saturating_duration_since(self.connected_at)
    }
}

/// Owns the slot table of a match
///
/// Slot one is always handed out before slot two, so the first connection
/// to arrive at an empty server drives the left-hand ship.
#[derive(Debug, Default)]
pub struct ClientManager {
    slots: [Option<Client>; MAX_PLAYERS],
}

impl ClientManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns the lowest free slot to `addr`
    ///
    /// Returns None when both slots are taken or when `addr` already holds
    /// a slot, since a peer address identifies exactly one player.
    pub fn add_client(&mut self, addr: SocketAddr, now: Instant) -> Option<Slot> {
        if self.find_client_by_addr(addr).is_some() {
            return None;
        }

        let slot = Slot::ALL
            .into_iter()
            .find(|slot| self.slots[slot.index()].is_none())?;

        info!("{} assigned to {}", addr, slot);
        self.slots[slot.index()] = Some(Client::new(slot, addr, now));
        Some(slot)
    }

    /// Frees a slot, returning the client that held it.
    pub fn remove_client(&mut self, slot: Slot) -> Option<Client> {
        let client = self.slots[slot.index()].take()?;
        info!(
            "{} released {} after {} ticks",
            client.addr, slot, client.ticks
        );
        Some(client)
    }

    pub fn get(&self, slot: Slot) -> Option<&Client> {
        self.slots[slot.index()].as_ref()
    }

    pub fn find_client_by_addr(&self, addr: SocketAddr) -> Option<Slot> {
        self.slots
            .iter()
            .flatten()
            .find(|client| client.addr == addr)
            .map(|client| client.slot)
    }

    pub fn record_tick(&mut self, slot: Slot, now: Instant) {
        if let Some(client) = self.slots[slot.index()].as_mut() {
            client.touch(now);
        }
    }

    pub fn record_loss(&mut self, slot: Slot) {
        if let Some(client) = self.slots[slot.index()].as_mut() {
            client.losses += 1;
        }
    }

    /// Returns the number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == MAX_PLAYERS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_client_creation() {
        let now = Instant::now();
        let client = Client::new(Slot::Two, test_addr(), now);

        assert_eq!(client.slot, Slot::Two);
        assert_eq!(client.addr, test_addr());
        assert_eq!(client.ticks, 0);
        assert_eq!(client.losses, 0);
        assert_eq!(client.session_length(), Duration::ZERO);
    }

    #[test]
    fn test_client_touch() {
        let now = Instant::now();
        let mut client = Client::new(Slot::One, test_addr(), now);

        client.touch(now + Duration::from_millis(16));
        client.touch(now + Duration::from_millis(33));

        assert_eq!(client.ticks, 2);
        assert_eq!(client.session_length(), Duration::from_millis(33));
    }

    #[test]
    fn test_client_manager_creation() {
        let manager = ClientManager::new();
        assert!(manager.is_empty());
        assert!(!manager.is_full());
        assert_eq!(manager.len(), 0);
    }

    #[test]
    fn test_slots_fill_in_order() {
        let mut manager = ClientManager::new();
        let now = Instant::now();

        assert_eq!(manager.add_client(test_addr(), now), Some(Slot::One));
        assert_eq!(manager.add_client(test_addr2(), now), Some(Slot::Two));
        assert!(manager.is_full());
    }

    #[test]
    fn test_third_client_rejected() {
        let mut manager = ClientManager::new();
        let now = Instant::now();
        manager.add_client(test_addr(), now);
        manager.add_client(test_addr2(), now);

        let third: SocketAddr = "127.0.0.1:8082".parse().unwrap();
        assert_eq!(manager.add_client(third, now), None);
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_duplicate_addr_rejected() {
        let mut manager = ClientManager::new();
        let now = Instant::now();
        manager.add_client(test_addr(), now);

        assert_eq!(manager.add_client(test_addr(), now), None);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_freed_slot_is_reused() {
        let mut manager = ClientManager::new();
        let now = Instant::now();
        manager.add_client(test_addr(), now);
        manager.add_client(test_addr2(), now);

        let removed = manager.remove_client(Slot::One).unwrap();
        assert_eq!(removed.addr, test_addr());
        assert!(manager.get(Slot::One).is_none());

        let newcomer: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        assert_eq!(manager.add_client(newcomer, now), Some(Slot::One));
        assert_eq!(manager.find_client_by_addr(test_addr2()), Some(Slot::Two));
    }

    #[test]
    fn test_remove_empty_slot() {
        let mut manager = ClientManager::new();
        assert!(manager.remove_client(Slot::Two).is_none());
    }

    #[test]
    fn test_counters() {
        let mut manager = ClientManager::new();
        let now = Instant::now();
        manager.add_client(test_addr(), now);

        manager.record_tick(Slot::One, now);
        manager.record_tick(Slot::One, now);
        manager.record_loss(Slot::One);
        manager.record_tick(Slot::Two, now);

        let client = manager.get(Slot::One).unwrap();
        assert_eq!(client.ticks, 2);
        assert_eq!(client.losses, 1);
    }
}
