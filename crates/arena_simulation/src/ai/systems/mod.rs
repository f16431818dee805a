//! AI systems (ECS обвязка вокруг мозгов)

pub mod flyer;
pub mod fsm;
pub mod reactions;

// Re-export all systems
pub use flyer::*;
pub use fsm::*;
pub use reactions::*;
