//! Tests for AttackTimeline / AttackSequencer.

#[cfg(test)]
mod tests {
    use super::super::timeline::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Cue {
        Windup,
        Hit,
        Recover,
    }

    fn swing() -> AttackTimeline<Cue> {
        AttackTimeline::new()
            .then(0.0, Cue::Windup)
            .then(0.4, Cue::Hit)
            .then(0.6, Cue::Recover)
    }

    #[test]
    fn test_timeline_offsets_and_duration() {
        let timeline = swing();
        assert_eq!(timeline.len(), 3);
        assert!((timeline.duration() - 1.0).abs() < 1e-6);
        assert_eq!(timeline.offset_of(1), Some(0.4));
        assert_eq!(timeline.offset_of(3), None);
    }

    #[test]
    fn test_steps_fire_at_their_offsets() {
        let mut sequencer = AttackSequencer::new();
        sequencer.start(swing()).unwrap();

        let first = sequencer.advance(0.0);
        assert_eq!(first.actions, vec![Cue::Windup]);
        assert!(!first.completed);

        // 0.1 .. 0.3: ничего
        for _ in 0..3 {
            assert!(sequencer.advance(0.1).actions.is_empty());
        }
        // 0.4: hit
        assert_eq!(sequencer.advance(0.1).actions, vec![Cue::Hit]);

        for _ in 0..5 {
            assert!(sequencer.advance(0.1).actions.is_empty());
        }
        let last = sequencer.advance(0.1);
        assert_eq!(last.actions, vec![Cue::Recover]);
        assert!(last.completed);
        assert!(!sequencer.is_running());
    }

    #[test]
    fn test_large_tick_fires_steps_in_order() {
        let mut sequencer = AttackSequencer::new();
        sequencer.start(swing()).unwrap();

        let tick = sequencer.advance(5.0);
        assert_eq!(tick.actions, vec![Cue::Windup, Cue::Hit, Cue::Recover]);
        assert!(tick.completed);
    }

    #[test]
    fn test_overshoot_carries_into_next_step() {
        let mut sequencer = AttackSequencer::new();
        sequencer.start(swing()).unwrap();
        sequencer.advance(0.0);

        // 0.5 секунды: hit (0.4) уже прошёл, recover (1.0) ещё нет
        assert_eq!(sequencer.advance(0.5).actions, vec![Cue::Hit]);
        assert!(sequencer.advance(0.45).actions.is_empty());
        assert_eq!(sequencer.advance(0.05).actions, vec![Cue::Recover]);
    }

    #[test]
    fn test_start_rejected_while_busy() {
        let mut sequencer = AttackSequencer::new();
        sequencer.start(swing()).unwrap();
        sequencer.advance(0.0);

        let result = sequencer.start(swing());
        assert_eq!(result, Err(SequencerError::Busy { remaining: 2 }));
        assert_eq!(sequencer.started_count(), 1);
    }

    #[test]
    fn test_empty_timeline_rejected() {
        let mut sequencer: AttackSequencer<Cue> = AttackSequencer::new();
        assert_eq!(sequencer.start(AttackTimeline::new()), Err(SequencerError::Empty));
        assert!(!sequencer.is_running());
    }

    #[test]
    fn test_cancel_discards_remaining_steps() {
        let mut sequencer = AttackSequencer::new();
        sequencer.start(swing()).unwrap();
        sequencer.advance(0.0);
        sequencer.advance(0.2);

        assert_eq!(sequencer.cancel(), 2);
        assert!(!sequencer.is_running());

        // Отменённые шаги никогда не исполняются
        for _ in 0..20 {
            let tick = sequencer.advance(0.1);
            assert!(tick.actions.is_empty());
            assert!(!tick.completed);
        }
        assert_eq!(sequencer.cancelled_count(), 1);
    }

    #[test]
    fn test_restart_after_cancel_begins_from_first_step() {
        let mut sequencer = AttackSequencer::new();
        sequencer.start(swing()).unwrap();
        sequencer.advance(0.0);
        sequencer.advance(0.4);
        sequencer.cancel();

        sequencer.start(swing()).unwrap();
        assert_eq!(sequencer.advance(0.0).actions, vec![Cue::Windup]);
    }

    #[test]
    fn test_cancel_when_idle_is_noop() {
        let mut sequencer: AttackSequencer<Cue> = AttackSequencer::new();
        assert_eq!(sequencer.cancel(), 0);
        assert_eq!(sequencer.cancelled_count(), 0);
    }
}
