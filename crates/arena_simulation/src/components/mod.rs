//! Общие ECS компоненты (акторы, движение).

pub mod actor;
pub mod movement;


pub use actor::*;
pub use movement::*;
