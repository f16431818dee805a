//! Attack Sequencer: отменяемые timed-step таймлайны атак.
//!
//! Замена корутинам: атака = упорядоченный список шагов (wait, action),
//! владелец тикает sequencer раз в FixedUpdate и исполняет выпавшие actions.
//! Отмена отбрасывает все оставшиеся шаги, возобновления нет.

pub mod timeline;

#[cfg(test)]
mod timeline_tests;

pub use timeline::*;
