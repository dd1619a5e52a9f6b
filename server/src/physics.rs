//! Pixel-mask collision for ships and lasers.
//!
//! Two bodies collide when their masks share at least one solid pixel once
//! the second mask is translated by the offset between the two origins.
//! Bounding boxes alone are never enough to register a hit.

use shared::{ENEMY_HULL, LASER_FRAME, PLAYER_HULL};
use std::sync::OnceLock;

/// Widest mask a single `u128` row can hold.
pub const MAX_MASK_WIDTH: u32 = 128;

/// A bitmap of solid pixels, one `u128` per row with bit `x` set for pixel `x`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    rows: Vec<u128>,
}

impl Mask {
    /// Builds a mask by asking `solid` about every pixel. Widths beyond
    /// [`MAX_MASK_WIDTH`] are cut down to it.
    pub fn from_fn(width: u32, height: u32, mut solid: impl FnMut(u32, u32) -> bool) -> Self {
        let width = width.min(MAX_MASK_WIDTH);
        let rows = (0..height)
            .map(|y| {
                (0..width)
                    .filter(|&x| solid(x, y))
                    .fold(0u128, |row, x| row | (1u128 << x))
            })
            .collect();

        Self {
            width,
            height,
            rows,
        }
    }

    pub fn filled(width: u32, height: u32) -> Self {
        Self::from_fn(width, height, |_, _| true)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width
            && self
                .rows
                .get(y as usize)
                .is_some_and(|row| row & (1u128 << x) != 0)
    }

    /// Number of solid pixels.
    pub fn count(&self) -> u32 {
        self.rows.iter().map(|row| row.count_ones()).sum()
    }

    /// Returns true if any solid pixel of `other`, placed at `offset`
    /// relative to this mask's origin, lands on a solid pixel of this mask.
    pub fn overlaps(&self, other: &Mask, offset: (i32, i32)) -> bool {
        let (ox, oy) = offset;

        let x_start = ox.max(0);
        let x_end = (self.width as i32).min(ox + other.width as i32);
        let y_start = oy.max(0);
        let y_end = (self.height as i32).min(oy + other.height as i32);
        if x_start >= x_end || y_start >= y_end {
            return false;
        }

        (y_start..y_end).any(|y| {
            let mine = self.rows[y as usize];
            let theirs = other.rows[(y - oy) as usize];
            let shifted = if ox >= 0 {
                theirs.checked_shl(ox as u32).unwrap_or(0)
            } else {
                theirs.checked_shr(ox.unsigned_abs()).unwrap_or(0)
            };
            mine & shifted != 0
        })
    }
}

/// Collision shape families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hull {
    Player,
    Enemy,
    Laser,
}

impl Hull {
    pub fn size(self) -> (i32, i32) {
        match self {
            Hull::Player => PLAYER_HULL,
            Hull::Enemy => ENEMY_HULL,
            Hull::Laser => LASER_FRAME,
        }
    }

    pub fn width(self) -> i32 {
        self.size().0
    }

    pub fn height(self) -> i32 {
        self.size().1
    }

    pub fn mask(self) -> &'static Mask {
        static MASKS: OnceLock<[Mask; 3]> = OnceLock::new();
        let masks = MASKS.get_or_init(|| [player_mask(), enemy_mask(), laser_mask()]);
        match self {
            Hull::Player => &masks[0],
            Hull::Enemy => &masks[1],
            Hull::Laser => &masks[2],
        }
    }
}

// Nose up, widening towards the engines.
fn player_mask() -> Mask {
    let (w, h) = PLAYER_HULL;
    let center = w / 2;
    Mask::from_fn(w as u32, h as u32, |x, y| {
        (x as i32 - center).abs() <= 6 + (y as i32 * (center - 6)) / h
    })
}

// Nose down, mirrored from the player silhouette.
fn enemy_mask() -> Mask {
    let (w, h) = ENEMY_HULL;
    let center = w / 2;
    Mask::from_fn(w as u32, h as u32, |x, y| {
        (x as i32 - center).abs() <= 4 + ((h - 1 - y as i32) * (center - 4)) / h
    })
}

// A narrow beam in the middle of a mostly transparent frame.
fn laser_mask() -> Mask {
    let (w, h) = LASER_FRAME;
    Mask::from_fn(w as u32, h as u32, |x, y| {
        (x as i32 - w / 2).abs() <= 5 && y as i32 >= 10 && (y as i32) < h - 10
    })
}

/// Something with a position and a collision shape.
pub trait Body {
    fn origin(&self) -> (i32, i32);
    fn hull(&self) -> Hull;
}

/// Pixel-accurate collision test between two bodies.
pub fn collide<A: Body + ?Sized, B: Body + ?Sized>(a: &A, b: &B) -> bool {
    let (ax, ay) = a.origin();
    let (bx, by) = b.origin();
    a.hull().mask().overlaps(b.hull().mask(), (bx - ax, by - ay))
}
