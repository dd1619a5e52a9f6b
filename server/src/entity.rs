use crate::physics::{collide, Body, Hull};
use shared::{
    ActionState, EnemyColor, EnemyRecord, LaserRecord, Slot, HEIGHT, INITIAL_HEALTH,
    LASER_DAMAGE, SPAWN_POINTS, WIDTH,
};

// Ticks a ship must wait between two shots
pub const COOLDOWN: u32 = 20;

// Damage taken when an enemy rams a player
pub const RAM_DAMAGE: i32 = 10;

// Enemy shots leave from slightly left of the hull origin
pub const ENEMY_MUZZLE_OFFSET: i32 = -20;

// Room kept free below a player's hull
const BOTTOM_MARGIN: i32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Laser {
    pub x: i32,
    pub y: i32,
}

impl Laser {
    pub fn new(x: i32, y: i32) -> Self {
        Laser { x, y }
    }

    pub fn move_by(&mut self, vel: i32) {
        self.y += vel;
    }

    pub fn off_screen(&self) -> bool {
        !(0..=HEIGHT).contains(&self.y)
    }

    pub fn record(&self) -> LaserRecord {
        LaserRecord {
            x: self.x,
            y: self.y,
        }
    }
}

impl Body for Laser {
    fn origin(&self) -> (i32, i32) {
        (self.x, self.y)
    }

    fn hull(&self) -> Hull {
        Hull::Laser
    }
}

// State every ship carries regardless of side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipCore {
    pub x: i32,
    pub y: i32,
    pub health: i32,
    pub cooldown_counter: u32,
    pub lasers: Vec<Laser>,
}

impl ShipCore {
    pub fn new(x: i32, y: i32, health: i32) -> Self {
        ShipCore {
            x,
            y,
            health,
            cooldown_counter: 0,
            lasers: Vec::new(),
        }
    }
}

pub trait Ship: Body {
    fn core(&self) -> &ShipCore;
    fn core_mut(&mut self) -> &mut ShipCore;

    // Where new shots appear
    fn muzzle(&self) -> (i32, i32) {
        (self.core().x, self.core().y)
    }

    fn health(&self) -> i32 {
        self.core().health
    }

    fn lasers(&self) -> &[Laser] {
        &self.core().lasers
    }

    fn take_damage(&mut self, amount: i32) {
        let core = self.core_mut();
        core.health = (core.health - amount).max(0);
    }

    // Counter runs from 1 up to COOLDOWN, then resets to 0 (ready)
    fn cooldown(&mut self) {
        let core = self.core_mut();
        if core.cooldown_counter >= COOLDOWN {
            core.cooldown_counter = 0;
        } else if core.cooldown_counter > 0 {
            core.cooldown_counter += 1;
        }
    }

    fn shoot(&mut self) -> bool {
        if self.core().cooldown_counter != 0 {
            return false;
        }
        let (x, y) = self.muzzle();
        let core = self.core_mut();
        core.lasers.push(Laser::new(x, y));
        core.cooldown_counter = 1;
        true
    }

    // Moves every shot by `vel`, dropping the ones that leave the screen or
    // hit one of `targets`. Returns the number of hits.
    fn move_lasers<T: Ship>(&mut self, vel: i32, targets: &mut [&mut T]) -> usize {
        self.cooldown();
        let mut hits = 0;
        self.core_mut().lasers.retain_mut(|laser| {
            laser.move_by(vel);
            if laser.off_screen() {
                return false;
            }
            match targets.iter_mut().find(|target| collide(&*laser, &***target)) {
                Some(target) => {
                    target.take_damage(LASER_DAMAGE);
                    hits += 1;
                    false
                }
                None => true,
            }
        });
        hits
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    core: ShipCore,
    max_health: i32,
}

impl Player {
    pub fn new(x: i32, y: i32) -> Self {
        Player {
            core: ShipCore::new(x, y, INITIAL_HEALTH),
            max_health: INITIAL_HEALTH,
        }
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn spawn(slot: Slot) -> Self {
        let (x, y) = SPAWN_POINTS[slot.index()];
        Player::new(x, y)
    }

    pub fn x(&self) -> i32 {
        self.core.x
    }

    pub fn y(&self) -> i32 {
        self.core.y
    }

    // Applies one tick of held actions. Each direction only moves if the
    // hull stays inside the playfield afterwards.
    pub fn steer(&mut self, actions: &ActionState, vel: i32) {
        let (width, height) = (self.hull().width(), self.hull().height());
        let core = &mut self.core;

        if actions.left && core.x - vel > 0 {
            core.x -= vel;
        }
        if actions.right && core.x + vel + width < WIDTH {
            core.x += vel;
        }
        if actions.up && core.y - vel > 0 {
            core.y -= vel;
        }
        if actions.down && core.y + vel + height + BOTTOM_MARGIN < HEIGHT {
            core.y += vel;
        }
        if actions.fire {
            self.shoot();
        }
    }

    // Player shots travel upward and can only hit enemies. An enemy struck
    // by a shot is destroyed together with the shot.
    pub fn move_lasers_through(&mut self, vel: i32, enemies: &mut Vec<Enemy>) -> usize {
        self.cooldown();
        let mut hits = 0;
        self.core.lasers.retain_mut(|laser| {
            laser.move_by(vel);
            if laser.off_screen() {
                return false;
            }
            match enemies.iter().position(|enemy| collide(&*laser, enemy)) {
                Some(index) => {
                    enemies.remove(index);
                    hits += 1;
                    false
                }
                None => true,
            }
        });
        hits
    }

    pub fn laser_records(&self) -> Vec<LaserRecord> {
        self.core.lasers.iter().map(Laser::record).collect()
    }
}

impl Body for Player {
    fn origin(&self) -> (i32, i32) {
        (self.core.x, self.core.y)
    }

    fn hull(&self) -> Hull {
        Hull::Player
    }
}

impl Ship for Player {
    fn core(&self) -> &ShipCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShipCore {
        &mut self.core
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enemy {
    core: ShipCore,
    pub color: EnemyColor,
}

impl Enemy {
    pub fn new(x: i32, y: i32, color: EnemyColor) -> Self {
        Enemy {
            core: ShipCore::new(x, y, INITIAL_HEALTH),
            color,
        }
    }

    pub fn x(&self) -> i32 {
        self.core.x
    }

    pub fn y(&self) -> i32 {
        self.core.y
    }

    pub fn move_by(&mut self, vel: i32) {
        self.core.y += vel;
    }

    // True once the hull's bottom edge has passed the playfield
    pub fn below_playfield(&self) -> bool {
        self.core.y + self.hull().height() > HEIGHT
    }

    pub fn record(&self) -> EnemyRecord {
        EnemyRecord {
            ex: self.core.x,
            ey: self.core.y,
            ecolor: self.color,
            elasers: self.core.lasers.iter().map(Laser::record).collect(),
        }
    }
}

impl Body for Enemy {
    fn origin(&self) -> (i32, i32) {
        (self.core.x, self.core.y)
    }

    fn hull(&self) -> Hull {
        Hull::Enemy
    }
}

impl Ship for Enemy {
    fn core(&self) -> &ShipCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ShipCore {
        &mut self.core
    }

    fn muzzle(&self) -> (i32, i32) {
        (self.core.x + ENEMY_MUZZLE_OFFSET, self.core.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(f: impl FnOnce(&mut ActionState)) -> ActionState {
        let mut actions = ActionState::default();
        f(&mut actions);
        actions
    }

    #[test]
    fn test_player_spawn_points() {
        let one = Player::spawn(Slot::One);
        let two = Player::spawn(Slot::Two);
        assert_eq!((one.x(), one.y()), (220, 630));
        assert_eq!((two.x(), two.y()), (400, 630));
        assert_eq!(one.health(), INITIAL_HEALTH);
        assert_eq!(one.max_health(), INITIAL_HEALTH);
        assert!(one.lasers().is_empty());
    }

    #[test]
    fn test_steer_moves_by_velocity() {
        let mut player = Player::new(300, 300);
        player.steer(&press(|a| a.left = true), 5);
        player.steer(&press(|a| a.up = true), 5);
        assert_eq!((player.x(), player.y()), (295, 295));

        player.steer(&press(|a| a.right = true), 3);
        player.steer(&press(|a| a.down = true), 3);
        assert_eq!((player.x(), player.y()), (298, 298));
    }

    #[test]
    fn test_steer_respects_bounds() {
        let mut player = Player::new(3, 3);
        player.steer(
            &press(|a| {
                a.left = true;
                a.up = true;
            }),
            3,
        );
        assert_eq!((player.x(), player.y()), (3, 3));

        // 650 + 3 + 100 is past the right edge, 645 + 3 + 90 + 15 past the bottom.
        let mut player = Player::new(650, 645);
        player.steer(
            &press(|a| {
                a.right = true;
                a.down = true;
            }),
            3,
        );
        assert_eq!((player.x(), player.y()), (650, 645));
    }

    #[test]
    fn test_zero_velocity_does_not_move() {
        let mut player = Player::new(300, 300);
        player.steer(
            &press(|a| {
                a.left = true;
                a.down = true;
            }),
            0,
        );
        assert_eq!((player.x(), player.y()), (300, 300));
    }

    #[test]
    fn test_shoot_respects_cooldown() {
        let mut player = Player::new(300, 500);
        assert!(player.shoot());
        assert!(!player.shoot());
        assert_eq!(player.lasers().len(), 1);

        let mut enemies = Vec::new();
        for _ in 0..COOLDOWN - 1 {
            player.move_lasers_through(0, &mut enemies);
            assert!(!player.shoot());
        }
        player.move_lasers_through(0, &mut enemies);
        assert!(player.shoot());
        assert_eq!(player.lasers().len(), 2);
    }

    #[test]
    fn test_player_laser_destroys_one_enemy() {
        let mut player = Player::new(300, 500);
        player.shoot();

        // Both enemies sit on the beam; only the first is destroyed.
        let mut enemies = vec![
            Enemy::new(325, 480, EnemyColor::Red),
            Enemy::new(325, 485, EnemyColor::Blue),
        ];
        let hits = player.move_lasers_through(-10, &mut enemies);

        assert_eq!(hits, 1);
        assert_eq!(enemies.len(), 1);
        assert_eq!(enemies[0].color, EnemyColor::Blue);
        assert!(player.lasers().is_empty());
    }

    #[test]
    fn test_laser_leaving_screen_is_dropped() {
        let mut player = Player::new(300, 5);
        player.shoot();
        player.move_lasers_through(-10, &mut Vec::new());
        assert!(player.lasers().is_empty());
    }

    #[test]
    fn test_enemy_muzzle_offset() {
        let mut enemy = Enemy::new(200, 100, EnemyColor::Green);
        assert!(enemy.shoot());
        assert_eq!(enemy.lasers()[0], Laser::new(180, 100));
    }

    #[test]
    fn test_enemy_laser_damages_player() {
        let mut enemy = Enemy::new(220, 540, EnemyColor::Red);
        enemy.shoot();
        let mut player = Player::new(200, 600);

        let hits = enemy.move_lasers(10, &mut [&mut player]);

        assert_eq!(hits, 1);
        assert_eq!(player.health(), INITIAL_HEALTH - LASER_DAMAGE);
        assert!(enemy.lasers().is_empty());
    }

    #[test]
    fn test_health_floors_at_zero() {
        let mut player = Player::new(0, 0);
        for _ in 0..15 {
            player.take_damage(RAM_DAMAGE);
        }
        assert_eq!(player.health(), 0);
        assert_eq!(player.max_health(), INITIAL_HEALTH);
    }

    #[test]
    fn test_enemy_below_playfield() {
        let mut enemy = Enemy::new(100, HEIGHT - 40, EnemyColor::Blue);
        assert!(!enemy.below_playfield());
        enemy.move_by(1);
        assert!(enemy.below_playfield());
    }

    #[test]
    fn test_enemy_record_fields() {
        let enemy = Enemy::new(120, -400, EnemyColor::Green);
        let record = enemy.record();
        assert_eq!((record.ex, record.ey), (120, -400));
        assert_eq!(record.ecolor, EnemyColor::Green);
        assert!(record.elasers.is_empty());
    }
}
