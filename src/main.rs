//! Tank Arena entry point
//!
//! Headless demo: generates a level, prints it and plays scripted tanks for a
//! minute of simulated time.
//!
//! Usage: `tank-arena [seed] [config.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use std::time::{SystemTime, UNIX_EPOCH};

    use tank_arena::ArenaConfig;
    use tank_arena::consts::SIM_TPS;
    use tank_arena::sim::{GameEvent, GameState, TankInput, tick};

    env_logger::init();
    log::info!("Tank Arena (native) starting...");

    let mut args = std::env::args().skip(1);
    let seed = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0)
        });
    let config = args
        .next()
        .map(|path| ArenaConfig::load(path))
        .unwrap_or_default();

    let mut state = GameState::new(seed, config);
    println!("Seed {seed}, round {}:\n{}", state.round, state.maze);

    let mut blocked = vec![false; state.tanks.len()];
    for step in 0..60 * SIM_TPS as u64 {
        let inputs: Vec<TankInput> = (0..state.tanks.len())
            .map(|id| scripted_input(id, step, blocked[id]))
            .collect();
        blocked.iter_mut().for_each(|b| *b = false);

        for event in tick(&mut state, &inputs) {
            match event {
                GameEvent::TankBlocked { tank, .. } => blocked[tank] = true,
                GameEvent::TankDestroyed { tank, shooter, .. } => {
                    println!("tick {step}: tank {shooter} destroyed tank {tank}");
                }
                GameEvent::LevelStarted { round, .. } => {
                    println!("Round {round}:\n{}", state.maze);
                }
                _ => {}
            }
        }
    }

    println!("Final scores after {} rounds: {:?}", state.round, state.scores);
}

/// Drive forward, turn away from walls, shoot now and then
#[cfg(not(target_arch = "wasm32"))]
fn scripted_input(id: usize, step: u64, blocked: bool) -> tank_arena::sim::TankInput {
    let phase = step + id as u64 * 37;
    tank_arena::sim::TankInput {
        forward: !blocked,
        rotate_right: blocked || phase % 90 < 15,
        shoot: phase % 75 == 0,
        ..Default::default()
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The library is the product on the web; there is no standalone entry point
}
