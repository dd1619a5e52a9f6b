//! Scripted input for headless clients
//!
//! Picks each tick's readiness and held actions from the latest view, the
//! way a player watching the screen would.

use crate::game::{ClientGameState, Screen};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{ActionState, EnemyRecord, PlayerView, ENEMY_HULL, PLAYER_HULL};

// Horizontal slack before the ship bothers to line up with its target
const AIM_DEADZONE: i32 = 6;
// How far off-centre a target may be and still draw fire
const FIRE_WINDOW: i32 = 20;
// Enemies this close above the ship are dodged instead of chased
const DANGER_ZONE: i32 = 120;

/// Decides what a headless player presses each tick
pub struct InputManager {
    rng: StdRng,
    ready_delay: u32,
    lobby_ticks: u32,
    wander: Option<(bool, u32)>,
}

impl InputManager {
    /// `ready_delay` is how many lobby ticks pass before pressing ready.
    /// At least one tick is always spent unready so the server sees the
    /// key released between matches.
    pub fn new(ready_delay: u32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            ready_delay: ready_delay.max(1),
            lobby_ticks: 0,
            wander: None,
        }
    }

    pub fn ready_intent(&mut self, view: &ClientGameState) -> bool {
        match view.screen {
            Screen::WaitingForOpponent => {
                self.lobby_ticks = 0;
                false
            }
            Screen::Playing => {
                self.lobby_ticks = 0;
                !view.round_over()
            }
            Screen::Lobby => {
                self.lobby_ticks += 1;
                self.lobby_ticks > self.ready_delay
            }
        }
    }

    pub fn next_actions(&mut self, view: &ClientGameState) -> ActionState {
        if view.screen != Screen::Playing || view.round_over() {
            return ActionState::default();
        }
        let Some(me) = view.me() else {
            return ActionState::default();
        };

        let mut actions = ActionState::default();
        let center = me.x + PLAYER_HULL.0 / 2;

        if let Some(threat) = closest_threat(&view.enemies, &me) {
            // Step away from whichever side the threat is on
            let threat_center = threat.ex + ENEMY_HULL.0 / 2;
            if threat_center >= center {
                actions.left = true;
            } else {
                actions.right = true;
            }
            actions.down = true;
            return actions;
        }

        match lowest_visible(&view.enemies) {
            Some(target) => {
                let offset = target.ex + ENEMY_HULL.0 / 2 - center;
                actions.left = offset < -AIM_DEADZONE;
                actions.right = offset > AIM_DEADZONE;
                actions.fire = offset.abs() <= FIRE_WINDOW;
            }
            None => self.wander(&mut actions),
        }
        actions
    }

    // Drifts sideways for a random number of ticks when nothing is in view
    fn wander(&mut self, actions: &mut ActionState) {
        let (left, ticks) = match self.wander.take() {
            Some((left, ticks)) if ticks > 0 => (left, ticks),
            _ => (self.rng.gen_bool(0.5), self.rng.gen_range(10..40)),
        };
        actions.left = left;
        actions.right = !left;
        self.wander = Some((left, ticks - 1));
    }
}

fn lowest_visible(enemies: &[EnemyRecord]) -> Option<&EnemyRecord> {
    enemies
        .iter()
        .filter(|enemy| enemy.ey + ENEMY_HULL.1 > 0)
        .max_by_key(|enemy| enemy.ey)
}

fn closest_threat<'a>(enemies: &'a [EnemyRecord], me: &PlayerView) -> Option<&'a EnemyRecord> {
    enemies
        .iter()
        .filter(|enemy| {
            let bottom = enemy.ey + ENEMY_HULL.1;
            let overlaps_x = enemy.ex < me.x + PLAYER_HULL.0 && enemy.ex + ENEMY_HULL.0 > me.x;
            overlaps_x && bottom <= me.y && me.y - bottom < DANGER_ZONE
        })
        .max_by_key(|enemy| enemy.ey)
}
