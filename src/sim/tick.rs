//! Fixed timestep simulation tick
//!
//! Core round loop that advances the simulation deterministically.

use super::collision::first_wall_overlap;
use super::reflect::{launch, reflect};
use super::state::{GameEvent, GameState, RoundPhase, TankInput};

/// Advance the game by one fixed step
///
/// `inputs` is indexed by tank id; missing entries mean no input.
pub fn tick(state: &mut GameState, inputs: &[TankInput]) -> Vec<GameEvent> {
    let mut events = Vec::new();
    state.time_ticks += 1;

    move_tanks(state, inputs, &mut events);
    move_bullets(state, &mut events);
    state.bullets.age();

    match state.phase {
        RoundPhase::Running => {
            if state.alive().count() <= 1 {
                log::info!("Round {} decided at tick {}", state.round, state.time_ticks);
                state.phase = RoundPhase::Ending {
                    ticks_left: state.config.round_end_ticks,
                };
            }
        }
        RoundPhase::Ending { ticks_left } if ticks_left > 1 => {
            state.phase = RoundPhase::Ending {
                ticks_left: ticks_left - 1,
            };
        }
        RoundPhase::Ending { .. } => {
            let winner = state.alive().next().map(|t| t.id);
            if let Some(id) = winner {
                state.scores[id] += 1;
            }
            log::info!("Round {} over, winner {:?}, scores {:?}", state.round, winner, state.scores);
            events.push(GameEvent::RoundOver { winner });
            events.push(state.setup_level());
        }
    }

    events
}

fn move_tanks(state: &mut GameState, inputs: &[TankInput], events: &mut Vec<GameEvent>) {
    let GameState {
        config,
        maze,
        tanks,
        bullets,
        ..
    } = state;

    for tank in tanks.iter_mut().filter(|t| t.active) {
        let input = inputs.get(tank.id).copied().unwrap_or_default();
        let before = tank.pose();

        // Bullets leave from the pre-move muzzle, travelling out from the hull
        // centre so a barrel pressed against a wall cannot shoot through it
        if tank.apply_input(&input, config) {
            let muzzle = tank.muzzle(config.bullet_radius);
            if let Some(id) = bullets.fire(tank.id, muzzle, tank.rotation, config) {
                events.push(GameEvent::ShotFired { tank: tank.id, bullet: id });
                if let Some(bullet) = bullets.shot_mut(id) {
                    for hit in launch(bullet, tank.pos, maze) {
                        events.push(GameEvent::BulletBounced { bullet: id, face: hit.face });
                    }
                }
            }
        }

        tank.advance();
        if let Some(wall) = first_wall_overlap(&tank.corners(), tank.pos, maze) {
            log::debug!("Tank {} blocked by wall {:?}", tank.id, wall);
            tank.revert(before);
            events.push(GameEvent::TankBlocked { tank: tank.id, wall });
        }
    }
}

fn move_bullets(state: &mut GameState, events: &mut Vec<GameEvent>) {
    let GameState {
        maze, tanks, bullets, ..
    } = state;

    for bullet in bullets.iter_mut().filter(|b| b.active) {
        bullet.advance();
        if let Some(hit) = reflect(bullet, maze) {
            events.push(GameEvent::BulletBounced {
                bullet: bullet.id,
                face: hit.face,
            });
        }

        if let Some(tank) = tanks.iter_mut().find(|t| t.active && t.is_hit_by(bullet)) {
            log::debug!("Tank {} destroyed by bullet {} of tank {}", tank.id, bullet.id, bullet.owner);
            tank.active = false;
            bullet.active = false;
            events.push(GameEvent::TankDestroyed {
                tank: tank.id,
                bullet: bullet.id,
                shooter: bullet.owner,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ArenaConfig;
    use crate::sim::{CellCoord, Direction, Maze};
    use glam::Vec2;
    use std::f32::consts::PI;

    fn idle() -> Vec<TankInput> {
        vec![TankInput::default(); 2]
    }

    /// Pin both tanks in known cells of the current maze
    fn place(state: &mut GameState, a: (usize, usize), b: (usize, usize)) {
        state.tanks[0].pos = state.maze.cell_center(a.0, a.1);
        state.tanks[1].pos = state.maze.cell_center(b.0, b.1);
    }

    #[test]
    fn test_new_game_places_tanks() {
        let state = GameState::new(12345, ArenaConfig::default());
        assert_eq!(state.tanks.len(), 2);
        assert_eq!(state.phase, RoundPhase::Running);
        assert_eq!(state.round, 1);
        assert!(state.maze.is_connected());

        let cells: Vec<_> = state
            .tanks
            .iter()
            .map(|t| state.maze.metrics().scene_to_cell(t.pos))
            .collect();
        assert_ne!(cells[0], cells[1]);
        for (tank, cell) in state.tanks.iter().zip(&cells) {
            assert!(state.maze.contains(*cell));
            assert_eq!(tank.pos, state.maze.cell_center(cell.row as usize, cell.col as usize));
            assert!(tank.active);
        }
    }

    #[test]
    fn test_idle_tick_changes_nothing() {
        let mut state = GameState::new(7, ArenaConfig::default());
        let before: Vec<Vec2> = state.tanks.iter().map(|t| t.pos).collect();
        let events = tick(&mut state, &idle());
        assert!(events.is_empty());
        assert_eq!(state.time_ticks, 1);
        let after: Vec<Vec2> = state.tanks.iter().map(|t| t.pos).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_tank_stops_at_wall() {
        let mut state = GameState::new(3, ArenaConfig::default());
        let far_corner = (state.maze.rows(), state.maze.cols());
        place(&mut state, (1, 1), far_corner);
        // Face the outer left wall and drive into it
        state.tanks[0].rotation = PI - 1e-3;
        let mut inputs = idle();
        inputs[0].forward = true;

        let mut blocked = false;
        for _ in 0..30 {
            let events = tick(&mut state, &inputs);
            blocked |= events
                .iter()
                .any(|e| matches!(e, GameEvent::TankBlocked { tank: 0, .. }));
        }
        assert!(blocked);

        let tank = &state.tanks[0];
        let face = state.maze.metrics().wall_thickness;
        let min_x = tank.corners().iter().map(|c| c.x).fold(f32::MAX, f32::min);
        assert!(min_x > face, "hull at {min_x} went into the wall");
    }

    #[test]
    fn test_shot_kills_tank_and_round_restarts() {
        let config = ArenaConfig {
            round_end_ticks: 5,
            ..ArenaConfig::default()
        };
        let mut state = GameState::new(99, config);
        // Only (1,1)|(1,2) is open: shooter in (1,1) fires right at (1,2)
        state.maze = Maze::with_passages(
            3,
            3,
            state.config.metrics(),
            [(1, 1, Direction::Right)],
        );
        place(&mut state, (1, 1), (1, 2));
        state.tanks[0].rotation = 0.0;

        let mut inputs = idle();
        inputs[0].shoot = true;
        let events = tick(&mut state, &inputs);
        assert!(events.contains(&GameEvent::ShotFired { tank: 0, bullet: 1 }));

        let mut destroyed = None;
        for _ in 0..30 {
            for event in tick(&mut state, &idle()) {
                if let GameEvent::TankDestroyed { tank, shooter, .. } = event {
                    destroyed = Some((tank, shooter));
                }
            }
            if destroyed.is_some() {
                break;
            }
        }
        assert_eq!(destroyed, Some((1, 0)));
        assert!(matches!(state.phase, RoundPhase::Ending { .. }));
        assert_eq!(state.bullets.active().count(), 0);

        let mut over = Vec::new();
        for _ in 0..5 {
            over.extend(tick(&mut state, &idle()));
        }
        assert!(over.contains(&GameEvent::RoundOver { winner: Some(0) }));
        assert_eq!(state.scores, vec![1, 0]);
        assert_eq!(state.round, 2);
        assert_eq!(state.phase, RoundPhase::Running);
        assert!(state.tanks.iter().all(|t| t.active));
    }

    /// Tank 0 alone in sealed (2, 2), hull `gap` short of the right face
    fn cornered_shooter(gap: f32, rotation: f32) -> GameState {
        let mut state = GameState::new(21, ArenaConfig::default());
        state.maze = Maze::with_passages(3, 3, state.config.metrics(), []);
        place(&mut state, (2, 2), (3, 3));
        state.tanks[0].rotation = rotation;

        let face = state.maze.cell_center(2, 2).x + state.maze.metrics().half_interior();
        let reach = state.tanks[0].corners().iter().map(|c| c.x).fold(f32::MIN, f32::max);
        state.tanks[0].pos.x += face - gap - reach;
        state
    }

    fn assert_bullets_in(state: &GameState, cell: CellCoord) {
        for bullet in state.bullets.active() {
            assert_eq!(
                state.maze.metrics().scene_to_cell(bullet.pos),
                cell,
                "bullet {} escaped to {:?}",
                bullet.id,
                bullet.pos
            );
        }
    }

    #[test]
    fn test_point_blank_shot_bounces_back() {
        for gap in [0.5, 1.0, 5.0] {
            let mut state = cornered_shooter(gap, 0.0);
            let mut inputs = idle();
            inputs[0].shoot = true;

            let events = tick(&mut state, &inputs);
            assert!(events.contains(&GameEvent::BulletBounced {
                bullet: 1,
                face: Direction::Right
            }));
            // The shot comes straight back into the shooter
            assert!(events.contains(&GameEvent::TankDestroyed {
                tank: 0,
                bullet: 1,
                shooter: 0
            }));
            assert_bullets_in(&state, CellCoord::new(2, 2));
        }
    }

    #[test]
    fn test_angled_shot_against_wall_stays_in_cell() {
        for rotation in [0.1, 0.2, -0.15] {
            let mut state = cornered_shooter(0.5, rotation);
            let mut inputs = idle();
            inputs[0].shoot = true;

            tick(&mut state, &inputs);
            assert_bullets_in(&state, CellCoord::new(2, 2));
            for _ in 0..120 {
                tick(&mut state, &idle());
                assert_bullets_in(&state, CellCoord::new(2, 2));
            }
        }
    }

    #[test]
    fn test_bullets_expire() {
        let config = ArenaConfig {
            bullet_ttl_ticks: 6,
            ..ArenaConfig::default()
        };
        let mut state = GameState::new(5, config);
        state.maze = Maze::with_passages(3, 3, state.config.metrics(), []);
        place(&mut state, (2, 2), (3, 3));
        // Fire at the closed right side of the cell; one bounce, no hit
        state.tanks[0].rotation = 0.0;

        let mut inputs = idle();
        inputs[0].shoot = true;
        tick(&mut state, &inputs);
        assert_eq!(state.bullets.in_flight(0), 1);
        for _ in 0..5 {
            tick(&mut state, &idle());
        }
        assert_eq!(state.bullets.in_flight(0), 0);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut a = GameState::new(99999, ArenaConfig::default());
        let mut b = GameState::new(99999, ArenaConfig::default());

        let script = [
            TankInput { forward: true, ..Default::default() },
            TankInput { rotate_left: true, shoot: true, ..Default::default() },
            TankInput { backward: true, rotate_right: true, ..Default::default() },
            TankInput { shoot: true, forward: true, ..Default::default() },
        ];

        for step in 0..600 {
            let inputs = [script[step % 4], script[(step / 3) % 4]];
            let ea = tick(&mut a, &inputs);
            let eb = tick(&mut b, &inputs);
            assert_eq!(ea, eb);
        }

        assert_eq!(a.maze, b.maze);
        assert_eq!(a.scores, b.scores);
        for (ta, tb) in a.tanks.iter().zip(&b.tanks) {
            assert_eq!(ta.pose(), tb.pose());
        }
    }
}
