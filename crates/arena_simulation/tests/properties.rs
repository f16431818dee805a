//! Property-based тесты (proptest)
//!
//! - idle длительность агента всегда в [min, max]
//! - фаза босса не убывает при любой последовательности урона
//! - темп director'а не проваливается ниже полов

use arena_simulation::*;
use bevy::prelude::*;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

proptest! {
    #[test]
    fn idle_duration_within_bounds(min in 0.0f32..5.0, span in 0.0f32..5.0, seed in any::<u64>()) {
        let tuning = AgentTuning {
            min_idle_time: min,
            max_idle_time: min + span,
            ..AgentTuning::default()
        };
        let agent = CombatAgent::new(tuning, AttackBehavior::weapon_slash(), Vec3::ZERO);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        for _ in 0..1000 {
            let idle = agent.sample_idle_duration(&mut rng);
            prop_assert!(idle >= min && idle <= min + span, "idle {} outside [{}, {}]", idle, min, min + span);
        }
    }

    #[test]
    fn boss_phase_never_decreases(hits in prop::collection::vec(0.0f32..250.0, 1..40)) {
        let mut brain = BossBrain::new(BossTuning::default(), Vec3::ZERO);
        let mut last_phase = brain.phase();

        for amount in hits {
            brain.take_damage(amount);
            let phase = brain.phase();
            prop_assert!(phase >= last_phase, "phase dropped {} → {}", last_phase, phase);
            prop_assert!((1..=3).contains(&phase));

            let fraction = brain.health_fraction();
            if fraction <= 0.33 {
                prop_assert_eq!(phase, 3);
            } else if fraction <= 0.66 {
                prop_assert!(phase >= 2);
            }
            last_phase = phase;
        }
    }

    #[test]
    fn director_pacing_respects_floors(level_ups in 0usize..200) {
        let tuning = DirectorTuning::default();
        let mut director = SpawnDirector::new(tuning.clone(), None);
        let mut previous = director.pacing();

        for _ in 0..level_ups {
            director.increase_difficulty();
            let pacing = director.pacing();
            prop_assert!(pacing.spawn_interval >= tuning.min_spawn_interval);
            prop_assert!(pacing.spawn_distance >= tuning.min_spawn_distance);
            prop_assert!(pacing.spawn_interval <= previous.spawn_interval);
            prop_assert!(pacing.enemies_per_spawn > previous.enemies_per_spawn);
            previous = pacing;
        }
        prop_assert_eq!(director.level(), 1.0 + level_ups as f32);
    }

    #[test]
    fn scaled_damage_within_half_of_exact(base in 0u32..10_000, multiplier in 0.0f32..4.0) {
        let scaled = scale_damage(base, multiplier);
        let exact = base as f32 * multiplier;
        prop_assert!((scaled as f32 - exact).abs() <= 0.5 + exact * 1e-6);
    }
}
