//! Headless прогон арены
//!
//! Открытая карта с director'ом: цель стоит в центре, волны растут.
//! Необязательный аргумент: путь к RON конфигу.

use arena_simulation::*;
use bevy::prelude::*;

fn main() {
    let config = match std::env::args().nth(1) {
        Some(path) => match ArenaConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("{}", err);
                std::process::exit(1);
            }
        },
        None => ArenaConfig::default(),
    };

    let seed = config.seed;
    println!("Starting arena headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    set_log_level(LogLevel::Info);
    app.add_plugins(SimulationPlugin::new(config));

    let target = app
        .world_mut()
        .spawn((
            Transform::default(),
            ArenaTarget,
            TargetMotion::default(),
            Health::new(100),
            Knockback::default(),
        ))
        .id();
    enter_open_map(app.world_mut(), target);

    // 3 минуты при 60Hz
    for tick in 0..10_800 {
        run_fixed_ticks(&mut app, 1);

        if tick % 600 == 0 {
            let director = app.world().get_resource::<SpawnDirector>();
            let level = director.map(|director| director.level()).unwrap_or(1.0);
            let alive = director.map(|director| director.live().len()).unwrap_or(0);
            println!("Tick {}: level {}, {} enemies alive", tick, level, alive);
        }
    }

    let stats = *app.world().resource::<RunStats>();
    println!(
        "Simulation complete! run time {:.1}s, {} kills",
        stats.run_time, stats.enemies_killed
    );
}
