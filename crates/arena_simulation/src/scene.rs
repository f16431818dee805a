//! Scene transitions (fire-and-forget запросы к загрузчику сцен)

use bevy::prelude::*;

pub const OPEN_MAP_SCENE: &str = "Scenes/Maps/Open";
pub const BOSS_ARENA_SCENE: &str = "BossArena";
pub const GAME_OVER_SCENE: &str = "Scenes/GameOver";

/// Запрос на смену сцены (загрузчик вне симуляции)
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct SceneTransition {
    pub scene: String,
}

impl SceneTransition {
    pub fn to(scene: &str) -> Self {
        Self { scene: scene.to_string() }
    }
}

/// Игрок вошёл в портал к боссу
#[derive(Event, Debug, Clone, Copy)]
pub struct PortalEntered;

/// Полный рестарт забега (главное меню / game over → новая игра)
#[derive(Event, Debug, Clone, Copy)]
pub struct RunRestarted;
