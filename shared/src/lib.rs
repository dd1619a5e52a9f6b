//! Types and wire plumbing shared by the duel server and its clients.
//!
//! The playfield constants live here so that both sides agree on the
//! coordinate space that positions in [`MatchState`] refer to.

pub mod framing;
pub mod protocol;

pub use framing::{FrameError, FramedStream, DISCONNECT_MESSAGE, GREETING, HEADER_LEN};
pub use protocol::{
    ActionState, AddrRecord, ControlRecord, EnemyColor, EnemyRecord, InvalidActionVector,
    LaserRecord, MatchState, PlayerView, Slot, SlotAddr, TickUpdate,
};

pub const WIDTH: i32 = 750;
pub const HEIGHT: i32 = 750;

/// Sprite footprints as (width, height).
pub const PLAYER_HULL: (i32, i32) = (100, 90);
pub const ENEMY_HULL: (i32, i32) = (50, 40);
pub const LASER_FRAME: (i32, i32) = (100, 90);

pub const INITIAL_HEALTH: i32 = 100;
pub const LASER_DAMAGE: i32 = 10;

pub const INITIAL_LEVEL: u32 = 0;
pub const INITIAL_WAVE_LENGTH: u32 = 10;
pub const WAVE_INCREMENT: u32 = 10;

/// Spawn point of the ship in slot one and slot two.
pub const SPAWN_POINTS: [(i32, i32); 2] = [(220, 630), (400, 630)];

/// Default upper bound for a single frame payload.
pub const DEFAULT_MAX_FRAME_LEN: usize = 1024 * 1024;
