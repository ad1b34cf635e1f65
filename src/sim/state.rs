//! Game state and core simulation types
//!
//! Tanks, bullets, the per-tank bullet pool and the round state that ties
//! them to a maze.

use std::f32::consts::FRAC_PI_2;

use glam::Vec2;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Hitbox;
use super::geometry::rect_corners;
use super::maze::{Direction, Maze, WallId};
use crate::settings::ArenaConfig;
use crate::{normalize_angle, polar_to_cartesian};

/// Controls sampled for one tank for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TankInput {
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub forward: bool,
    pub backward: bool,
    pub shoot: bool,
}

/// Position and heading, restored when a move is blocked
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub pos: Vec2,
    pub rotation: f32,
}

/// A tank: square body facing along its local +x
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tank {
    pub id: usize,
    pub pos: Vec2,
    /// Heading in radians
    pub rotation: f32,
    /// Displacement applied by the next `advance`
    pub vel: Vec2,
    pub half_width: f32,
    pub active: bool,
}

impl Tank {
    pub fn new(id: usize, width: f32) -> Self {
        Self {
            id,
            pos: Vec2::ZERO,
            rotation: 0.0,
            vel: Vec2::ZERO,
            half_width: width / 2.0,
            active: true,
        }
    }

    pub fn pose(&self) -> Pose {
        Pose {
            pos: self.pos,
            rotation: self.rotation,
        }
    }

    /// Undo a move
    pub fn revert(&mut self, pose: Pose) {
        self.pos = pose.pos;
        self.rotation = pose.rotation;
    }

    /// Unit vector the tank faces
    pub fn forward(&self) -> Vec2 {
        polar_to_cartesian(1.0, self.rotation)
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::Rectangle {
            half_extents: Vec2::splat(self.half_width),
        }
    }

    pub fn corners(&self) -> [Vec2; 4] {
        rect_corners(self.pos, Vec2::splat(self.half_width), self.rotation)
    }

    /// Turn and pick this tick's velocity. Returns whether the tank fires.
    ///
    /// Reverse wins when both drive keys are held.
    pub fn apply_input(&mut self, input: &TankInput, config: &ArenaConfig) -> bool {
        if input.rotate_right {
            self.rotation += config.tank_rotation_speed;
        }
        if input.rotate_left {
            self.rotation -= config.tank_rotation_speed;
        }
        self.rotation = normalize_angle(self.rotation);

        self.vel = if input.backward {
            -self.forward() * config.tank_speed * config.tank_reverse_factor
        } else if input.forward {
            self.forward() * config.tank_speed
        } else {
            Vec2::ZERO
        };

        input.shoot
    }

    pub fn advance(&mut self) {
        self.pos += self.vel;
    }

    /// Spawn point of a bullet: just outside the front face
    pub fn muzzle(&self, bullet_radius: f32) -> Vec2 {
        self.pos + self.forward() * (self.half_width + bullet_radius)
    }

    pub fn is_hit_by(&self, bullet: &Bullet) -> bool {
        self.hitbox()
            .overlaps(self.pos, self.rotation, &bullet.hitbox(), bullet.pos, 0.0)
    }
}

/// A bullet in flight (or parked in its owner's pool)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    /// Shot id, fresh for every shot
    pub id: u32,
    /// Index of the tank that owns this slot
    pub owner: usize,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub active: bool,
    pub ttl_ticks: u32,
}

impl Bullet {
    fn parked(owner: usize, radius: f32) -> Self {
        Self {
            id: 0,
            owner,
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius,
            active: false,
            ttl_ticks: 0,
        }
    }

    pub fn advance(&mut self) {
        self.pos += self.vel;
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    pub fn hitbox(&self) -> Hitbox {
        Hitbox::Circle { radius: self.radius }
    }
}

/// Fixed set of bullet slots per tank, with its own shot id counter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulletPool {
    bullets: Vec<Bullet>,
    next_id: u32,
}

impl BulletPool {
    pub fn new(config: &ArenaConfig) -> Self {
        let bullets = (0..config.tank_count)
            .flat_map(|owner| {
                (0..config.bullets_per_tank).map(move |_| Bullet::parked(owner, config.bullet_radius))
            })
            .collect();
        Self { bullets, next_id: 1 }
    }

    fn next_shot_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Launch a bullet from `origin` along `rotation` using one of `owner`'s
    /// free slots. `None` when all of them are in flight.
    pub fn fire(&mut self, owner: usize, origin: Vec2, rotation: f32, config: &ArenaConfig) -> Option<u32> {
        let slot = self.bullets.iter().position(|b| b.owner == owner && !b.active)?;
        let id = self.next_shot_id();

        let bullet = &mut self.bullets[slot];
        bullet.id = id;
        bullet.pos = origin;
        bullet.vel = polar_to_cartesian(config.bullet_speed, rotation);
        bullet.active = true;
        bullet.ttl_ticks = config.bullet_ttl_ticks;
        Some(id)
    }

    /// Count down lifetimes, parking expired bullets
    pub fn age(&mut self) {
        for bullet in self.bullets.iter_mut().filter(|b| b.active) {
            bullet.ttl_ticks = bullet.ttl_ticks.saturating_sub(1);
            if bullet.ttl_ticks == 0 {
                bullet.active = false;
            }
        }
    }

    /// Park every bullet (new level). Shot ids keep counting.
    pub fn reset(&mut self) {
        for bullet in &mut self.bullets {
            bullet.active = false;
            bullet.vel = Vec2::ZERO;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bullet> {
        self.bullets.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Bullet> {
        self.bullets.iter_mut()
    }

    pub fn active(&self) -> impl Iterator<Item = &Bullet> {
        self.bullets.iter().filter(|b| b.active)
    }

    /// Active bullet fired as shot `id`
    pub fn shot_mut(&mut self, id: u32) -> Option<&mut Bullet> {
        self.bullets.iter_mut().find(|b| b.active && b.id == id)
    }

    pub fn in_flight(&self, owner: usize) -> usize {
        self.active().filter(|b| b.owner == owner).count()
    }
}

/// Round progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// More than one tank alive
    Running,
    /// Deciding kill happened; the level keeps running until the timer ends
    Ending { ticks_left: u32 },
}

/// Things that happened during a tick, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    LevelStarted { round: u32, rows: usize, cols: usize },
    ShotFired { tank: usize, bullet: u32 },
    /// A move was undone because the hull touched a wall
    TankBlocked { tank: usize, wall: WallId },
    BulletBounced { bullet: u32, face: Direction },
    TankDestroyed { tank: usize, bullet: u32, shooter: usize },
    /// Level finished; the winner (if any) has already been credited
    RoundOver { winner: Option<usize> },
}

/// Complete game state (deterministic for a seed and input sequence)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub config: ArenaConfig,
    pub(crate) rng: Pcg32,
    pub maze: Maze,
    /// Indexed by tank id
    pub tanks: Vec<Tank>,
    pub bullets: BulletPool,
    /// Indexed by tank id
    pub scores: Vec<u32>,
    pub phase: RoundPhase,
    /// Levels played so far, the current one included
    pub round: u32,
    /// Simulation tick counter
    pub time_ticks: u64,
}

impl GameState {
    /// Create a game and set up its first level
    ///
    /// A config that fails `ArenaConfig::validate` is replaced by the
    /// defaults, as `ArenaConfig::load` does for a bad file.
    pub fn new(seed: u64, config: ArenaConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(err) => {
                log::warn!("Ignoring invalid arena config: {}", err);
                ArenaConfig::default()
            }
        };
        let mut rng = Pcg32::seed_from_u64(seed);
        let (rows, cols) = Maze::random_dimensions(&mut rng);
        let maze = Maze::generate(rows, cols, config.metrics(), &mut rng);
        let tanks = (0..config.tank_count)
            .map(|id| Tank::new(id, config.tank_width))
            .collect();

        let mut state = Self {
            seed,
            bullets: BulletPool::new(&config),
            scores: vec![0; config.tank_count],
            config,
            rng,
            maze,
            tanks,
            phase: RoundPhase::Running,
            round: 1,
            time_ticks: 0,
        };
        state.place_tanks();

        log::info!(
            "Game seeded with {}: level {}x{}, {} tanks",
            seed,
            rows,
            cols,
            state.tanks.len()
        );
        state
    }

    /// Fresh maze, tanks revived at random distinct cells, bullets parked
    pub fn setup_level(&mut self) -> GameEvent {
        let (rows, cols) = Maze::random_dimensions(&mut self.rng);
        self.maze = Maze::generate(rows, cols, self.config.metrics(), &mut self.rng);
        self.bullets.reset();
        self.phase = RoundPhase::Running;
        self.round += 1;
        self.place_tanks();

        log::info!("Level {} set up: {}x{} maze", self.round, rows, cols);
        GameEvent::LevelStarted {
            round: self.round,
            rows,
            cols,
        }
    }

    fn place_tanks(&mut self) {
        let mut cells: Vec<(usize, usize)> = (1..=self.maze.rows())
            .flat_map(|i| (1..=self.maze.cols()).map(move |j| (i, j)))
            .collect();
        cells.shuffle(&mut self.rng);

        // More tanks than cells only happens with odd configs; they share
        for (tank, &(row, col)) in self.tanks.iter_mut().zip(cells.iter().cycle()) {
            tank.pos = self.maze.cell_center(row, col);
            tank.rotation = FRAC_PI_2;
            tank.vel = Vec2::ZERO;
            tank.active = true;
        }
    }

    pub fn alive(&self) -> impl Iterator<Item = &Tank> {
        self.tanks.iter().filter(|t| t.active)
    }
}
