//! Tests for BossBrain (phases, policy timing, containment, scaling).

#[cfg(test)]
mod tests {
    use super::super::attacks::{BossAttack, BossCue};
    use super::super::brain::*;
    use super::super::scaler::BossScaling;
    use bevy::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const DT: f32 = 1.0 / 60.0;

    struct Arena {
        boss: BossBrain,
        transform: Transform,
        rng: ChaCha8Rng,
    }

    impl Arena {
        fn new(tuning: BossTuning) -> Self {
            Self {
                boss: BossBrain::new(tuning, Vec3::ZERO),
                transform: Transform::default(),
                rng: ChaCha8Rng::seed_from_u64(7),
            }
        }

        fn tick(&mut self, target: Option<Vec3>) -> Vec<BossEvent> {
            let mut ctx = BossContext {
                transform: &mut self.transform,
                target,
                rng: &mut self.rng,
            };
            self.boss.tick(DT, &mut ctx)
        }

        fn run(&mut self, target: Vec3, ticks: usize) -> Vec<BossEvent> {
            (0..ticks).flat_map(|_| self.tick(Some(target))).collect()
        }

        fn start(&mut self, attack: BossAttack, target: Vec3) -> bool {
            let mut ctx = BossContext {
                transform: &mut self.transform,
                target: Some(target),
                rng: &mut self.rng,
            };
            self.boss.start_attack(attack, &mut ctx)
        }
    }

    fn stationary() -> BossTuning {
        BossTuning {
            move_speed: 0.0,
            ..BossTuning::default()
        }
    }

    #[test]
    fn test_phase_boundaries_are_inclusive() {
        let mut boss = BossBrain::new(BossTuning::default(), Vec3::ZERO);

        boss.take_damage(339.0);
        assert_eq!(boss.phase(), 1);

        boss.take_damage(1.0);
        assert_eq!(boss.current_health(), 660.0);
        assert_eq!(boss.phase(), 2);

        boss.take_damage(330.0);
        assert_eq!(boss.current_health(), 330.0);
        assert_eq!(boss.phase(), 3);

        boss.take_damage(100.0);
        assert_eq!(boss.phase(), 3);
    }

    #[test]
    fn test_phase_damage_derived_from_originals() {
        let mut boss = BossBrain::new(BossTuning::default(), Vec3::ZERO);

        boss.take_damage(400.0);
        assert_eq!(boss.damage().kick, 130);
        assert_eq!(boss.damage().jump, 195);
        assert_eq!(boss.small_shot_burst(), 4);

        boss.take_damage(300.0);
        boss.take_damage(50.0);
        boss.take_damage(50.0);
        // 100 * 1.6, не 130 * 1.6
        assert_eq!(boss.damage().kick, 160);
        assert_eq!(boss.damage().small_shot, 40);
        assert_eq!(boss.small_shot_burst(), 5);
        assert!((boss.move_speed() - 4.5).abs() < 1e-5);
        assert!((boss.attack_cooldown() - 1.4).abs() < 1e-5);
        assert_eq!(boss.original_damage().kick, 100);
    }

    #[test]
    fn test_big_hit_skips_to_phase_three() {
        let mut boss = BossBrain::new(BossTuning::default(), Vec3::ZERO);
        boss.take_damage(800.0);
        assert_eq!(boss.phase(), 3);
        let phases: Vec<_> = boss
            .drain_events()
            .into_iter()
            .filter_map(|event| match event {
                BossEvent::PhaseChanged { phase } => Some(phase),
                _ => None,
            })
            .collect();
        assert_eq!(phases, vec![3]);
    }

    #[test]
    fn test_lethal_damage_is_terminal() {
        let mut arena = Arena::new(BossTuning::default());
        let target = Vec3::new(0.0, 0.0, -3.0);
        arena.tick(Some(target));
        assert!(arena.boss.is_attacking());

        assert!(arena.boss.take_damage(5000.0));
        assert!(arena.boss.is_dead());
        assert!(!arena.boss.is_attacking());
        assert!(arena.boss.drain_events().contains(&BossEvent::Died));

        assert!(!arena.boss.take_damage(10.0));
        assert!(arena.run(target, 60).is_empty());
    }

    #[test]
    fn test_melee_target_attacked_immediately() {
        let mut arena = Arena::new(BossTuning::default());
        let events = arena.tick(Some(Vec3::new(0.0, 0.0, -3.0)));
        assert!(events
            .iter()
            .any(|event| matches!(event, BossEvent::AttackStarted(BossAttack::Kick | BossAttack::Jump))));
        assert!(!arena.boss.can_attack());
    }

    #[test]
    fn test_target_outside_arena_is_ignored() {
        let mut arena = Arena::new(BossTuning::default());
        let events = arena.run(Vec3::new(0.0, 0.0, -30.0), 120);
        assert!(events.is_empty());
        assert_eq!(arena.boss.attacks_started(), 0);
        assert_eq!(arena.transform.translation, Vec3::ZERO);
    }

    #[test]
    fn test_area_status_change_reported_once() {
        let mut arena = Arena::new(stationary());
        let inside = arena.tick(Some(Vec3::new(0.0, 0.0, -18.0)));
        assert!(inside.contains(&BossEvent::AreaStatusChanged { inside: true }));

        let mut outside = arena.tick(Some(Vec3::new(0.0, 0.0, -40.0)));
        outside.extend(arena.tick(Some(Vec3::new(0.0, 0.0, -40.0))));
        let changes = outside
            .iter()
            .filter(|event| matches!(event, BossEvent::AreaStatusChanged { .. }))
            .count();
        assert_eq!(changes, 1);
        assert!(!arena.boss.target_in_area());
    }

    #[test]
    fn test_cooldown_gates_ranged_attacks() {
        let mut arena = Arena::new(stationary());
        let target = Vec3::new(0.0, 0.0, -10.0);

        let mut finished = false;
        for _ in 0..240 {
            let events = arena.tick(Some(target));
            if events.iter().any(|event| matches!(event, BossEvent::AttackFinished(_))) {
                finished = true;
                break;
            }
        }
        assert!(finished);
        assert_eq!(arena.boss.attacks_started(), 1);

        arena.run(target, 90);
        assert_eq!(arena.boss.attacks_started(), 1);

        arena.run(target, 60);
        assert_eq!(arena.boss.attacks_started(), 2);
    }

    #[test]
    fn test_melee_cuts_cooldown_short() {
        let mut arena = Arena::new(stationary());
        let far = Vec3::new(0.0, 0.0, -10.0);

        for _ in 0..240 {
            let events = arena.tick(Some(far));
            if events.iter().any(|event| matches!(event, BossEvent::AttackFinished(_))) {
                break;
            }
        }
        assert!(!arena.boss.can_attack());

        // Цель подошла вплотную: атака сразу, cooldown обрывается
        arena.tick(Some(Vec3::new(0.0, 0.0, -3.0)));
        assert_eq!(arena.boss.attacks_started(), 2);
        assert!(arena.boss.can_attack());
    }

    #[test]
    fn test_boss_walks_towards_target() {
        let mut arena = Arena::new(BossTuning::default());
        // вне detection range, но внутри арены: только движение
        arena.transform.translation = Vec3::new(0.0, 0.0, 20.0);
        let target = Vec3::new(0.0, 0.0, -2.0);
        arena.tick(Some(target));
        assert!((arena.transform.translation.z - (20.0 - 3.0 * DT)).abs() < 1e-4);
        assert_eq!(arena.boss.attacks_started(), 0);
    }

    #[test]
    fn test_jump_arcs_and_lands() {
        let mut arena = Arena::new(stationary());
        let target = Vec3::new(0.0, 0.0, -7.5);
        assert!(arena.start(BossAttack::Jump, target));

        // 0.3 takeoff + 0.7 → середина полёта 1.4 сек
        let mut events = arena.run(target, 60);
        assert!(arena.boss.is_airborne());
        assert!(arena.transform.translation.y > 4.5, "y = {}", arena.transform.translation.y);

        events.extend(arena.run(target, 50));
        assert!(!arena.boss.is_airborne());
        assert!((arena.transform.translation - target).length() < 1e-4);
        assert!(events.contains(&BossEvent::Strike {
            damage: 150,
            knockback: Vec3::ZERO
        }));
        assert!(events.contains(&BossEvent::Cue(BossCue::Land)));

        events.extend(arena.run(target, 50));
        assert!(events.contains(&BossEvent::AttackFinished(BossAttack::Jump)));
    }

    #[test]
    fn test_kick_misses_when_target_steps_out() {
        let mut arena = Arena::new(stationary());
        assert!(arena.start(BossAttack::Kick, Vec3::new(0.0, 0.0, -3.0)));
        // До hit-check цель отошла дальше kick_range
        let events = arena.run(Vec3::new(0.0, 0.0, -6.0), 40);
        assert!(events.contains(&BossEvent::Cue(BossCue::KickCheck)));
        assert!(!events.iter().any(|event| matches!(event, BossEvent::Strike { .. })));
    }

    #[test]
    fn test_second_attack_rejected_while_busy() {
        let mut arena = Arena::new(stationary());
        let target = Vec3::new(0.0, 0.0, -10.0);
        assert!(arena.start(BossAttack::BigShot, target));
        assert!(!arena.start(BossAttack::Kick, target));
        assert_eq!(arena.boss.current_attack(), Some(BossAttack::BigShot));
    }

    #[test]
    fn test_small_shot_burst_fires_from_muzzle() {
        let mut arena = Arena::new(stationary());
        let target = Vec3::new(0.0, 0.0, -10.0);
        assert!(arena.start(BossAttack::SmallShot, target));
        let events = arena.run(target, 120);

        let shots: Vec<_> = events
            .iter()
            .filter_map(|event| match event {
                BossEvent::Fire { origin, damage, blast, .. } => Some((*origin, *damage, *blast)),
                _ => None,
            })
            .collect();
        assert_eq!(shots.len(), 3);
        for (origin, damage, blast) in shots {
            assert_eq!(origin, Vec3::new(0.0, 1.5, 0.0));
            assert_eq!(damage, 25);
            assert!(blast.is_none());
        }
    }

    #[test]
    fn test_containment_clamps_horizontally() {
        let boss = BossBrain::new(BossTuning::default(), Vec3::ZERO);
        let mut transform = Transform::from_xyz(30.0, 2.0, 0.0);
        boss.stay_in_bounds(&mut transform);
        assert!((transform.translation - Vec3::new(25.0, 2.0, 0.0)).length() < 1e-5);

        let mut inside = Transform::from_xyz(10.0, 0.0, -10.0);
        boss.stay_in_bounds(&mut inside);
        assert_eq!(inside.translation, Vec3::new(10.0, 0.0, -10.0));
    }

    #[test]
    fn test_scaler_applies_once() {
        let scaling = BossScaling::default();
        let mut boss = BossBrain::new(BossTuning::default(), Vec3::ZERO);

        assert!(!scaling.apply(&mut boss, 1.0));
        assert!(scaling.apply(&mut boss, 5.0));
        assert!((boss.max_health() - 1800.0).abs() < 1e-3);
        assert_eq!(boss.current_health(), boss.max_health());
        assert_eq!(boss.damage().kick, 160);
        assert_eq!(boss.original_damage().kick, 160);
        assert!((boss.move_speed() - 3.6).abs() < 1e-4);
        assert!((boss.attack_cooldown() - 1.76).abs() < 1e-4);

        assert!(!scaling.apply(&mut boss, 5.0));
        assert_eq!(boss.damage().kick, 160);
    }

    #[test]
    fn test_scaler_cooldown_floor() {
        let multipliers = BossScaling::default().multipliers(40.0);
        assert_eq!(multipliers.cooldown, 0.3);
    }
}
