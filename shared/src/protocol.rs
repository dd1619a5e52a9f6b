//! Wire records exchanged between the server and its two clients.
//!
//! Field names follow the JSON layout the game clients already speak, so the
//! short keys (`ex`, `ecolor`, `health1`, ...) are part of the protocol.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::{AddrParseError, IpAddr, SocketAddr};

use crate::{INITIAL_HEALTH, INITIAL_LEVEL, INITIAL_WAVE_LENGTH};

/// Marker an empty slot carries on the wire.
pub const EMPTY_SLOT: &str = "0.0.0.0";

/// Scancode positions read from a legacy full-keyboard snapshot.
pub const SCANCODE_A: usize = 4;
pub const SCANCODE_D: usize = 7;
pub const SCANCODE_S: usize = 22;
pub const SCANCODE_W: usize = 26;
pub const SCANCODE_SPACE: usize = 44;

/// One of the two fixed player identities of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    One,
    Two,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::One, Slot::Two];

    pub fn index(self) -> usize {
        match self {
            Slot::One => 0,
            Slot::Two => 1,
        }
    }

    pub fn other(self) -> Slot {
        match self {
            Slot::One => Slot::Two,
            Slot::Two => Slot::One,
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.index() + 1)
    }
}

/// Connection identity bound to a slot, `None` while the slot is free.
///
/// Serialized as the `"0.0.0.0"` marker when empty and as an `[ip, port]`
/// pair when occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlotAddr(pub Option<SocketAddr>);

impl SlotAddr {
    pub const EMPTY: SlotAddr = SlotAddr(None);

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn matches(&self, addr: SocketAddr) -> bool {
        self.0 == Some(addr)
    }
}

impl fmt::Display for SlotAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(addr) => write!(f, "{addr}"),
            None => f.write_str(EMPTY_SLOT),
        }
    }
}

impl Serialize for SlotAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            None => serializer.serialize_str(EMPTY_SLOT),
            Some(addr) => (addr.ip().to_string(), addr.port()).serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SlotAddrRepr {
    Marker(String),
    Addr(String, u16),
}

impl<'de> Deserialize<'de> for SlotAddr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match SlotAddrRepr::deserialize(deserializer)? {
            SlotAddrRepr::Marker(marker) if marker == EMPTY_SLOT => Ok(SlotAddr::EMPTY),
            SlotAddrRepr::Marker(other) => Err(D::Error::custom(format!(
                "unexpected slot marker {other:?}"
            ))),
            SlotAddrRepr::Addr(ip, port) => ip
                .parse::<IpAddr>()
                .map(|ip| SlotAddr(Some(SocketAddr::new(ip, port))))
                .map_err(D::Error::custom),
        }
    }
}

/// Per-slot fields of [`MatchState`] gathered in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerView {
    pub x: i32,
    pub y: i32,
    pub health: i32,
    pub lost: bool,
    pub win: bool,
}

/// The authoritative match record broadcast to both clients every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub ready: bool,
    pub level: u32,
    pub wave_length: u32,
    pub user1: SlotAddr,
    pub user2: SlotAddr,
    pub x1: i32,
    pub y1: i32,
    pub health1: i32,
    pub lost1: bool,
    pub x2: i32,
    pub y2: i32,
    pub health2: i32,
    pub lost2: bool,
    pub win1: bool,
    pub win2: bool,
}

impl Default for MatchState {
    fn default() -> Self {
        Self {
            ready: false,
            level: INITIAL_LEVEL,
            wave_length: INITIAL_WAVE_LENGTH,
            user1: SlotAddr::EMPTY,
            user2: SlotAddr::EMPTY,
            x1: 0,
            y1: 0,
            health1: INITIAL_HEALTH,
            lost1: false,
            x2: 0,
            y2: 0,
            health2: INITIAL_HEALTH,
            lost2: false,
            win1: false,
            win2: false,
        }
    }
}

impl MatchState {
    pub fn user(&self, slot: Slot) -> SlotAddr {
        match slot {
            Slot::One => self.user1,
            Slot::Two => self.user2,
        }
    }

    pub fn set_user(&mut self, slot: Slot, addr: SlotAddr) {
        match slot {
            Slot::One => self.user1 = addr,
            Slot::Two => self.user2 = addr,
        }
    }

    /// Finds the slot a connection identity occupies.
    pub fn slot_of(&self, addr: SocketAddr) -> Option<Slot> {
        Slot::ALL.into_iter().find(|slot| self.user(*slot).matches(addr))
    }

    pub fn any_slot_empty(&self) -> bool {
        self.user1.is_empty() || self.user2.is_empty()
    }

    pub fn player(&self, slot: Slot) -> PlayerView {
        match slot {
            Slot::One => PlayerView {
                x: self.x1,
                y: self.y1,
                health: self.health1,
                lost: self.lost1,
                win: self.win1,
            },
            Slot::Two => PlayerView {
                x: self.x2,
                y: self.y2,
                health: self.health2,
                lost: self.lost2,
                win: self.win2,
            },
        }
    }

    pub fn set_player(&mut self, slot: Slot, x: i32, y: i32, health: i32) {
        let health = health.max(0);
        match slot {
            Slot::One => {
                self.x1 = x;
                self.y1 = y;
                self.health1 = health;
            }
            Slot::Two => {
                self.x2 = x;
                self.y2 = y;
                self.health2 = health;
            }
        }
    }

    pub fn lost(&self, slot: Slot) -> bool {
        self.player(slot).lost
    }

    pub fn any_lost(&self) -> bool {
        self.lost1 || self.lost2
    }

    pub fn set_lost(&mut self, slot: Slot, lost: bool) {
        match slot {
            Slot::One => self.lost1 = lost,
            Slot::Two => self.lost2 = lost,
        }
    }

    pub fn set_win(&mut self, slot: Slot, win: bool) {
        match slot {
            Slot::One => self.win1 = win,
            Slot::Two => self.win2 = win,
        }
    }

    pub fn clear_outcome(&mut self) {
        self.lost1 = false;
        self.lost2 = false;
        self.win1 = false;
        self.win2 = false;
    }
}

/// Per-tick readiness/connection record sent by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlRecord {
    pub connection: bool,
    pub ready: bool,
}

impl ControlRecord {
    pub fn connected(ready: bool) -> Self {
        Self {
            connection: true,
            ready,
        }
    }

    pub fn leaving() -> Self {
        Self {
            connection: false,
            ready: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("action vector of length {0} is neither the named form nor a keyboard snapshot")]
pub struct InvalidActionVector(pub usize);

/// Which actions a player holds down this tick.
///
/// Travels as a JSON array of booleans in `[left, right, up, down, fire]`
/// order. A full keyboard snapshot (longer than the space scancode) is
/// accepted as well and read at the A/D/W/S/Space scancodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<bool>", into = "Vec<bool>")]
pub struct ActionState {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub fire: bool,
}

impl ActionState {
    pub const NAMED_LEN: usize = 5;

    pub fn is_idle(&self) -> bool {
        *self == ActionState::default()
    }
}

impl TryFrom<Vec<bool>> for ActionState {
    type Error = InvalidActionVector;

    fn try_from(flags: Vec<bool>) -> Result<Self, Self::Error> {
        match flags.len() {
            ActionState::NAMED_LEN => Ok(Self {
                left: flags[0],
                right: flags[1],
                up: flags[2],
                down: flags[3],
                fire: flags[4],
            }),
            len if len > SCANCODE_SPACE => Ok(Self {
                left: flags[SCANCODE_A],
                right: flags[SCANCODE_D],
                up: flags[SCANCODE_W],
                down: flags[SCANCODE_S],
                fire: flags[SCANCODE_SPACE],
            }),
            len => Err(InvalidActionVector(len)),
        }
    }
}

impl From<ActionState> for Vec<bool> {
    fn from(actions: ActionState) -> Self {
        vec![
            actions.left,
            actions.right,
            actions.up,
            actions.down,
            actions.fire,
        ]
    }
}

/// Handshake reply telling a client which identity the server sees for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddrRecord {
    pub ip: String,
    pub port: u16,
}

impl AddrRecord {
    pub fn to_socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        Ok(SocketAddr::new(self.ip.parse()?, self.port))
    }
}

impl From<SocketAddr> for AddrRecord {
    fn from(addr: SocketAddr) -> Self {
        Self {
            ip: addr.ip().to_string(),
            port: addr.port(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaserRecord {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyColor {
    Red,
    Green,
    Blue,
}

impl EnemyColor {
    pub const ALL: [EnemyColor; 3] = [EnemyColor::Red, EnemyColor::Green, EnemyColor::Blue];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyRecord {
    pub ex: i32,
    pub ey: i32,
    pub ecolor: EnemyColor,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elasers: Vec<LaserRecord>,
}

/// Everything one connection receives per tick, in send order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickUpdate {
    pub state: MatchState,
    pub own_lasers: Vec<LaserRecord>,
    pub opponent_lasers: Vec<LaserRecord>,
    pub enemies: Vec<EnemyRecord>,
}
