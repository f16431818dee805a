//! AttackTimeline + AttackSequencer.

use thiserror::Error;

/// Допуск на накопленную ошибку float при сравнении offset'ов
const STEP_EPSILON: f32 = 1e-4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequencerError {
    #[error("attack timeline already running ({remaining} steps left)")]
    Busy { remaining: usize },
    #[error("attack timeline has no steps")]
    Empty,
}

/// Шаг таймлайна: подождать `wait` секунд, затем выполнить `action`
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineStep<A> {
    pub wait: f32,
    pub action: A,
}

/// Упорядоченный список шагов
///
/// Инвариант: шаги исполняются строго по порядку, offset шага i =
/// сумма wait[0..=i] (переизбыток тика переносится на следующий шаг).
#[derive(Debug, Clone, PartialEq)]
pub struct AttackTimeline<A> {
    steps: Vec<TimelineStep<A>>,
    cursor: usize,
    countdown: f32,
    elapsed: f32,
}

impl<A> Default for AttackTimeline<A> {
    fn default() -> Self {
        Self {
            steps: Vec::new(),
            cursor: 0,
            countdown: 0.0,
            elapsed: 0.0,
        }
    }
}

impl<A: Clone> AttackTimeline<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: добавить шаг (отрицательный wait трактуется как 0)
    pub fn then(mut self, wait: f32, action: A) -> Self {
        self.push(wait, action);
        self
    }

    pub fn push(&mut self, wait: f32, action: A) {
        let wait = wait.max(0.0);
        if self.steps.is_empty() {
            self.countdown = wait;
        }
        self.steps.push(TimelineStep { wait, action });
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Полная длительность (сумма всех wait)
    pub fn duration(&self) -> f32 {
        self.steps.iter().map(|step| step.wait).sum()
    }

    /// Offset шага с индексом `index` от старта
    pub fn offset_of(&self, index: usize) -> Option<f32> {
        (index < self.steps.len()).then(|| self.steps[..=index].iter().map(|step| step.wait).sum())
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn remaining_steps(&self) -> usize {
        self.steps.len() - self.cursor
    }

    pub fn is_finished(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    pub fn steps(&self) -> &[TimelineStep<A>] {
        &self.steps
    }

    /// Продвинуть время, собрать actions, чьи offset'ы наступили
    fn advance(&mut self, delta: f32, due: &mut Vec<A>) {
        if self.is_finished() {
            return;
        }

        self.elapsed += delta;
        self.countdown -= delta;

        while !self.is_finished() && self.countdown <= STEP_EPSILON {
            due.push(self.steps[self.cursor].action.clone());
            self.cursor += 1;
            if let Some(next) = self.steps.get(self.cursor) {
                self.countdown += next.wait;
            }
        }
    }
}

/// Результат одного тика sequencer'а
#[derive(Debug, Clone, PartialEq)]
pub struct SequencerTick<A> {
    pub actions: Vec<A>,
    /// Таймлайн только что исполнил последний шаг
    pub completed: bool,
}

impl<A> Default for SequencerTick<A> {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
            completed: false,
        }
    }
}

/// Владелец активного таймлайна (не больше одного на агента)
#[derive(Debug, Clone, PartialEq)]
pub struct AttackSequencer<A> {
    active: Option<AttackTimeline<A>>,
    started: u32,
    cancelled: u32,
}

impl<A> Default for AttackSequencer<A> {
    fn default() -> Self {
        Self {
            active: None,
            started: 0,
            cancelled: 0,
        }
    }
}

impl<A: Clone> AttackSequencer<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// "attack in progress"
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&AttackTimeline<A>> {
        self.active.as_ref()
    }

    pub fn started_count(&self) -> u32 {
        self.started
    }

    pub fn cancelled_count(&self) -> u32 {
        self.cancelled
    }

    /// Запуск таймлайна. Пока активен другой: отказ (Busy).
    ///
    /// Шаги с нулевым offset исполняются первым `advance` (обычно `advance(0.0)`
    /// в том же тике, что и старт).
    pub fn start(&mut self, timeline: AttackTimeline<A>) -> Result<(), SequencerError> {
        if let Some(active) = &self.active {
            return Err(SequencerError::Busy {
                remaining: active.remaining_steps(),
            });
        }
        if timeline.is_empty() {
            return Err(SequencerError::Empty);
        }
        self.active = Some(timeline);
        self.started += 1;
        Ok(())
    }

    pub fn advance(&mut self, delta: f32) -> SequencerTick<A> {
        let mut tick = SequencerTick::default();
        let Some(timeline) = self.active.as_mut() else {
            return tick;
        };

        timeline.advance(delta, &mut tick.actions);
        if timeline.is_finished() {
            self.active = None;
            tick.completed = true;
        }
        tick
    }

    /// Отмена: оставшиеся шаги отбрасываются. Возвращает число отброшенных шагов.
    pub fn cancel(&mut self) -> usize {
        match self.active.take() {
            Some(timeline) => {
                self.cancelled += 1;
                timeline.remaining_steps()
            }
            None => 0,
        }
    }
}
