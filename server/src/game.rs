use crate::client_manager::{Client, ClientManager};
use crate::config::SimulationConfig;
use crate::entity::{Enemy, Player, Ship, RAM_DAMAGE};
use crate::physics::collide;
use crate::rendezvous::TickRendezvous;
use crate::utils::{capped_delta, scaled_velocity};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::{
    ActionState, EnemyColor, MatchState, Slot, SlotAddr, TickUpdate, INITIAL_LEVEL,
    INITIAL_WAVE_LENGTH, WAVE_INCREMENT, WIDTH,
};
use std::net::SocketAddr;
use std::time::Instant;

// Enemy spawn area: x in [50, WIDTH - 100), y in [-1500, -100)
const SPAWN_X_MIN: i32 = 50;
const SPAWN_X_MARGIN: i32 = 100;
const SPAWN_Y_MIN: i32 = -1500;
const SPAWN_Y_MAX: i32 = -100;

/// Where a connection stands in the match, as seen by its handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionPhase {
    Handshake,
    WaitingReady,
    Active,
    Lost,
    Disconnected,
}

impl ConnectionPhase {
    pub fn of(state: &MatchState, slot: Slot) -> Self {
        if state.lost(slot) {
            ConnectionPhase::Lost
        } else if state.ready {
            ConnectionPhase::Active
        } else {
            ConnectionPhase::WaitingReady
        }
    }
}

// A ready report only counts after the slot has been seen not ready, so a
// client still holding "ready" from the last match cannot restart it alone.
#[derive(Debug, Clone, Copy, Default)]
struct ReadyLatch {
    armed: bool,
    pressed: bool,
}

impl ReadyLatch {
    fn armed() -> Self {
        ReadyLatch {
            armed: true,
            pressed: false,
        }
    }

    fn report(&mut self, ready: bool) {
        if !ready {
            self.armed = true;
            self.pressed = false;
        } else if self.armed {
            self.pressed = true;
        }
    }
}

pub struct GameState {
    state: MatchState,
    players: [Player; 2],
    enemies: Vec<Enemy>,
    clients: ClientManager,
    rendezvous: TickRendezvous,
    latches: [ReadyLatch; 2],
    enemy_vel: i32,
    last_advance: Option<Instant>,
    advances: u64,
    rng: StdRng,
    config: SimulationConfig,
}

impl GameState {
    pub fn new(config: SimulationConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    pub fn with_seed(config: SimulationConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimulationConfig, rng: StdRng) -> Self {
        let mut game = Self {
            state: MatchState::default(),
            players: Slot::ALL.map(Player::spawn),
            enemies: Vec::new(),
            clients: ClientManager::new(),
            rendezvous: TickRendezvous::new(),
            latches: [ReadyLatch::default(); 2],
            enemy_vel: 0,
            last_advance: None,
            advances: 0,
            rng,
            config,
        };
        game.sync_players();
        game
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn player(&self, slot: Slot) -> &Player {
        &self.players[slot.index()]
    }

    pub fn enemies(&self) -> &[Enemy] {
        &self.enemies
    }

    pub fn clients(&self) -> &ClientManager {
        &self.clients
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn enemy_vel(&self) -> i32 {
        self.enemy_vel
    }

    // Number of world advances run so far
    pub fn advances(&self) -> u64 {
        self.advances
    }

    pub fn phase_of(&self, slot: Slot) -> ConnectionPhase {
        ConnectionPhase::of(&self.state, slot)
    }

    // Binds `addr` to the lowest free slot and puts a fresh ship there
    pub fn connect(&mut self, addr: SocketAddr, now: Instant) -> Option<Slot> {
        let slot = self.clients.add_client(addr, now)?;
        let i = slot.index();

        self.state.set_user(slot, SlotAddr(Some(addr)));
        self.players[i] = Player::spawn(slot);
        self.latches[i] = ReadyLatch::armed();
        self.rendezvous.join(slot);
        self.sync_players();
        Some(slot)
    }

    // Frees the slot and resets everything the departed player touched
    pub fn disconnect(&mut self, slot: Slot) -> Option<Client> {
        let i = slot.index();
        let client = self.clients.remove_client(slot);

        self.state.set_user(slot, SlotAddr::EMPTY);
        self.state.clear_outcome();
        self.state.level = INITIAL_LEVEL;
        self.state.wave_length = INITIAL_WAVE_LENGTH;
        self.enemy_vel = 0;
        self.enemies.clear();
        self.players[i] = Player::spawn(slot);
        self.latches[i] = ReadyLatch::default();
        self.rendezvous.leave(slot);
        self.sync_players();

        info!("{} left, match reset", slot);
        client
    }

    // First half of a tick: takes the readiness report, starts or resets
    // the match as needed, and tells the handler what phase it is in.
    pub fn begin_tick(&mut self, slot: Slot, ready: bool) -> ConnectionPhase {
        if !self.state.ready {
            self.latches[slot.index()].report(ready);

            let both_pressed = self.latches.iter().all(|latch| latch.pressed);
            if both_pressed && !self.state.any_slot_empty() {
                self.start_match();
            }
        }

        self.enforce_reset();
        self.sync_players();
        self.phase_of(slot)
    }

    // Second half of a tick: moves the caller's ship, advances the world if
    // this arrival completes the generation, moves the caller's shots and
    // settles the outcome.
    pub fn play_tick(
        &mut self,
        slot: Slot,
        actions: &ActionState,
        player_vel: i32,
        now: Instant,
    ) -> TickUpdate {
        self.enforce_reset();
        let i = slot.index();

        if self.phase_of(slot) == ConnectionPhase::Active {
            self.players[i].steer(actions, player_vel);
        }

        self.clients.record_tick(slot, now);
        if self.rendezvous.arrive(slot) {
            self.advance_world(now);
        }

        if self.state.ready {
            let vel = -self.config.laser_speed;
            let hits = self.players[i].move_lasers_through(vel, &mut self.enemies);
            if hits > 0 {
                debug!("{} destroyed {} enemies", slot, hits);
            }
        }

        // The advance may have hit either ship, so both are settled here
        self.check_loss(slot);
        self.check_loss(slot.other());
        self.sync_players();
        self.snapshot_for(slot)
    }

    // The per-connection view: state, own shots, opponent shots, enemies
    pub fn snapshot_for(&self, slot: Slot) -> TickUpdate {
        TickUpdate {
            state: self.state.clone(),
            own_lasers: self.players[slot.index()].laser_records(),
            opponent_lasers: self.players[slot.other().index()].laser_records(),
            enemies: self.enemies.iter().map(Enemy::record).collect(),
        }
    }

    fn start_match(&mut self) {
        for latch in &mut self.latches {
            latch.pressed = false;
        }

        self.state.ready = true;
        self.state.clear_outcome();
        self.state.level = INITIAL_LEVEL;
        self.state.wave_length = INITIAL_WAVE_LENGTH;
        self.enemies.clear();
        self.players = Slot::ALL.map(Player::spawn);
        self.spawn_wave();

        info!(
            "Match started: level {}, {} enemies",
            self.state.level,
            self.enemies.len()
        );
    }

    fn enforce_reset(&mut self) {
        if !self.state.ready {
            self.state.level = INITIAL_LEVEL;
            self.state.wave_length = INITIAL_WAVE_LENGTH;
            self.state.lost1 = false;
            self.state.lost2 = false;
            self.enemy_vel = 0;
        } else if self.state.any_slot_empty() || self.state.any_lost() {
            self.reset_match();
        }
    }

    // Back to the lobby. Win flags survive so the clients can show who won.
    fn reset_match(&mut self) {
        info!(
            "Match over at level {} (player 1 won: {}, player 2 won: {})",
            self.state.level, self.state.win1, self.state.win2
        );

        self.state.ready = false;
        self.state.lost1 = false;
        self.state.lost2 = false;
        self.state.level = INITIAL_LEVEL;
        self.state.wave_length = INITIAL_WAVE_LENGTH;
        self.enemy_vel = 0;
        self.enemies.clear();
        self.players = Slot::ALL.map(Player::spawn);
        self.latches = [ReadyLatch::default(); 2];
    }

    fn advance_world(&mut self, now: Instant) {
        self.advances += 1;
        let dt = capped_delta(self.last_advance, now, self.config.max_delta);
        self.last_advance = Some(now);

        if !self.state.ready {
            self.enemy_vel = 0;
            return;
        }

        self.enemy_vel = scaled_velocity(self.config.enemy_rate, dt);
        if self.enemies.is_empty() {
            self.spawn_wave();
        }

        let vel = self.enemy_vel;
        let occupied = Slot::ALL.map(|slot| !self.state.user(slot).is_empty());
        let players = &mut self.players;
        self.enemies.retain_mut(|enemy| {
            enemy.move_by(vel);
            for (player, occupied) in players.iter_mut().zip(occupied) {
                if occupied && collide(&*enemy, &*player) {
                    player.take_damage(RAM_DAMAGE);
                    return false;
                }
            }
            !enemy.below_playfield()
        });

        if self.config.enemy_fire_chance > 0 {
            self.enemy_fire();
        }
    }

    fn enemy_fire(&mut self) {
        let chance = self.config.enemy_fire_chance;
        let vel = self.config.laser_speed;

        let [one, two] = &mut self.players;
        let mut targets: Vec<&mut Player> = Vec::with_capacity(2);
        if !self.state.user1.is_empty() {
            targets.push(one);
        }
        if !self.state.user2.is_empty() {
            targets.push(two);
        }

        for enemy in &mut self.enemies {
            if self.rng.gen_range(0..chance) == 0 {
                enemy.shoot();
            }
            enemy.move_lasers(vel, targets.as_mut_slice());
        }
    }

    fn spawn_wave(&mut self) {
        self.state.level += 1;
        self.state.wave_length += WAVE_INCREMENT;

        for _ in 0..self.state.wave_length {
            let x = self.rng.gen_range(SPAWN_X_MIN..WIDTH - SPAWN_X_MARGIN);
            let y = self.rng.gen_range(SPAWN_Y_MIN..SPAWN_Y_MAX);
            let color = EnemyColor::ALL[self.rng.gen_range(0..EnemyColor::ALL.len())];
            self.enemies.push(Enemy::new(x, y, color));
        }

        debug!(
            "Spawned wave of {} at level {}",
            self.state.wave_length, self.state.level
        );
    }

    // Only the first slot to reach zero health loses
    fn check_loss(&mut self, slot: Slot) -> bool {
        let dead = self.players[slot.index()].health() <= 0;
        if !self.state.ready || !dead || self.state.any_lost() {
            return false;
        }

        self.state.set_lost(slot, true);
        self.state.set_win(slot.other(), true);
        self.clients.record_loss(slot);
        info!("{} lost at level {}", slot, self.state.level);
        true
    }

    fn sync_players(&mut self) {
        for slot in Slot::ALL {
            let player = &self.players[slot.index()];
            self.state
                .set_player(slot, player.x(), player.y(), player.health());
        }
    }
}
