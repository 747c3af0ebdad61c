//! Per-match configuration.

/// Configuration for one room's match. Fixed for the room's lifetime.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Cards dealt to every player when the match starts.
    pub cards_per_player: usize,

    /// The ceiling the running stack may never exceed.
    pub max_stack_value: i32,

    /// Minimum seated players required to start.
    pub min_players: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            cards_per_player: 3,
            max_stack_value: 99,
            min_players: 2,
        }
    }
}
