//! The pure game state machine.
//!
//! [`Game`] holds every rule of the match: joining, dealing, play
//! validation, card effects, turn advancement, elimination, and game
//! end. It has no channels and no I/O; the actor in [`crate::actor`]
//! drives it and broadcasts the events it returns.

use ninetynine_protocol::{Card, GameSnapshot, GameStatus, PlayerStatus};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::config::GameConfig;
use crate::deck;
use crate::error::GameError;
use crate::player::Player;

/// Something that happened inside the game and should be announced to
/// the room, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    PlayerJoined { name: String },
    PlayerRejoined { name: String },
    Started,
    CardPlayed { name: String },
    PlayerOut { name: String },
    PlayerLeft { name: String },
    Ended,
}

impl GameEvent {
    /// The action label broadcast with the event.
    pub fn label(&self) -> String {
        match self {
            Self::PlayerJoined { name } => format!("player {name} joined"),
            Self::PlayerRejoined { name } => format!("player {name} rejoined"),
            Self::Started => "game started".to_string(),
            Self::CardPlayed { name } => format!("player {name} played a card"),
            Self::PlayerOut { name } => format!("player {name} is out"),
            Self::PlayerLeft { name } => format!("player {name} left"),
            Self::Ended => "game ended".to_string(),
        }
    }
}

/// Full game state for one room.
#[derive(Debug)]
pub struct Game {
    config: GameConfig,
    players: Vec<Player>,
    status: GameStatus,
    current_player_index: usize,
    /// +1 clockwise, -1 counter-clockwise.
    current_direction: i32,
    stack_value: i32,
    last_played_card: Option<Card>,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            players: Vec::new(),
            status: GameStatus::Waiting,
            current_player_index: 0,
            current_direction: 1,
            stack_value: 0,
            last_played_card: None,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn current_player_index(&self) -> usize {
        self.current_player_index
    }

    /// Seats a player, or resumes their existing seat if the same id is
    /// already at the table (a reconnect).
    pub fn register(&mut self, player: Player) -> GameEvent {
        if let Some(existing) = self
            .players
            .iter()
            .find(|p| p.player_id == player.player_id)
        {
            return GameEvent::PlayerRejoined {
                name: existing.player_name.clone(),
            };
        }
        let name = player.player_name.clone();
        self.players.push(player);
        GameEvent::PlayerJoined { name }
    }

    /// Starts the match: deals every player a fresh hand and opens play.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.status != GameStatus::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() < self.config.min_players {
            return Err(GameError::NotEnoughPlayers);
        }

        for player in &mut self.players {
            player.hand = (0..self.config.cards_per_player)
                .map(|_| deck::draw(rng))
                .collect();
            player.is_out = false;
            player.status = PlayerStatus::Playing;
        }
        self.status = GameStatus::Playing;
        self.stack_value = 0;
        self.last_played_card = None;

        let mut events = vec![GameEvent::Started];
        // With a zeroed stack every card is legal, but a custom config
        // could open on a seat with no legal card.
        if !self.seat_can_play(self.current_player_index) {
            self.advance_turn(&mut events);
        }
        Ok(events)
    }

    /// Whether the given player may legally play the given card right now.
    pub fn is_valid_play(&self, player_id: &str, card: &Card) -> bool {
        if self.status != GameStatus::Playing || self.players.is_empty() {
            return false;
        }
        let current = &self.players[self.current_player_index];
        if current.player_id != player_id || !current.holds(card) {
            return false;
        }
        card.is_special || card.value + self.stack_value <= self.config.max_stack_value
    }

    /// Validates and applies one play: card effect, hand replacement,
    /// then turn advancement with eliminations.
    pub fn play_card<R: Rng + ?Sized>(
        &mut self,
        player_id: &str,
        card: Card,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        if !self.is_valid_play(player_id, &card) {
            return Err(GameError::InvalidPlay);
        }

        let name = self.players[self.current_player_index]
            .player_name
            .clone();

        if card.is_special {
            match card.value {
                0 => {}
                1 => self.current_direction = -self.current_direction,
                2 => self.shuffle_seats(rng),
                3 => self.stack_value = self.config.max_stack_value,
                _ => {}
            }
        } else {
            self.stack_value += card.value;
        }

        // A shuffle may have moved the seat; find the player by id to
        // swap the played card for a fresh draw.
        let player = self
            .players
            .iter_mut()
            .find(|p| p.player_id == player_id)
            .ok_or(GameError::InvalidPlay)?;
        let pos = player
            .hand
            .iter()
            .position(|c| c == &card)
            .ok_or(GameError::InvalidPlay)?;
        player.hand[pos] = deck::draw(rng);

        self.last_played_card = Some(card);

        let mut events = vec![GameEvent::CardPlayed { name }];
        self.advance_turn(&mut events);
        Ok(events)
    }

    /// Removes or retires a seat when its player disconnects.
    pub fn handle_leave(&mut self, player_id: &str) -> Vec<GameEvent> {
        let Some(pos) = self
            .players
            .iter()
            .position(|p| p.player_id == player_id)
        else {
            return Vec::new();
        };

        match self.status {
            GameStatus::Waiting => {
                let player = self.players.remove(pos);
                if self.current_player_index >= self.players.len() {
                    self.current_player_index = 0;
                }
                vec![GameEvent::PlayerLeft {
                    name: player.player_name,
                }]
            }
            GameStatus::Playing => {
                let player = &mut self.players[pos];
                player.is_out = true;
                player.status = PlayerStatus::Left;
                let name = player.player_name.clone();

                let mut events = vec![GameEvent::PlayerLeft { name }];
                if pos == self.current_player_index {
                    self.advance_turn(&mut events);
                } else if self.active_players() <= 1 {
                    self.end_game(&mut events);
                }
                events
            }
            GameStatus::Ended => {
                let player = &mut self.players[pos];
                player.is_out = true;
                player.status = PlayerStatus::Left;
                vec![GameEvent::PlayerLeft {
                    name: player.player_name.clone(),
                }]
            }
        }
    }

    /// Builds the broadcast view. `viewer` selects whose hand appears in
    /// `player_cards`; `None` produces the spectator view with no cards.
    pub fn snapshot(&self, viewer: Option<&str>) -> GameSnapshot {
        let player_cards = viewer
            .and_then(|id| self.players.iter().find(|p| p.player_id == id))
            .map(|p| p.hand.clone())
            .unwrap_or_default();

        GameSnapshot {
            players: self.players.iter().map(Player::snapshot).collect(),
            player_cards,
            status: self.status,
            current_player_index: self.current_player_index,
            current_direction: self.current_direction,
            stack_value: self.stack_value,
            max_stack_value: self.config.max_stack_value,
            last_played_card: self.last_played_card,
        }
    }

    /// Seats still in the running.
    fn active_players(&self) -> usize {
        self.players.iter().filter(|p| !p.is_out).count()
    }

    fn card_is_playable(&self, card: &Card) -> bool {
        card.is_special || card.value + self.stack_value <= self.config.max_stack_value
    }

    fn seat_can_play(&self, index: usize) -> bool {
        self.players[index]
            .hand
            .iter()
            .any(|c| self.card_is_playable(c))
    }

    /// Reorders the table, keeping the turn on the same player.
    fn shuffle_seats<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let current_id = self.players[self.current_player_index]
            .player_id
            .clone();
        self.players.shuffle(rng);
        self.current_player_index = self
            .players
            .iter()
            .position(|p| p.player_id == current_id)
            .unwrap_or(0);
    }

    /// Steps to the next seat that can play, eliminating any seat whose
    /// whole hand would bust the stack. Ends the game when at most one
    /// seat remains in the running.
    fn advance_turn(&mut self, events: &mut Vec<GameEvent>) {
        let len = self.players.len();
        for _ in 0..len {
            if self.active_players() <= 1 {
                self.end_game(events);
                return;
            }

            self.current_player_index = step_index(
                self.current_player_index,
                self.current_direction,
                len,
            );

            let seat = &self.players[self.current_player_index];
            if seat.is_out {
                continue;
            }
            if self.seat_can_play(self.current_player_index) {
                return;
            }

            let seat = &mut self.players[self.current_player_index];
            seat.is_out = true;
            seat.status = PlayerStatus::Out;
            events.push(GameEvent::PlayerOut {
                name: seat.player_name.clone(),
            });
        }
        self.end_game(events);
    }

    fn end_game(&mut self, events: &mut Vec<GameEvent>) {
        if self.status != GameStatus::Ended {
            self.status = GameStatus::Ended;
            events.push(GameEvent::Ended);
        }
    }
}

/// One seat step in the given direction, wrapping at the table edges.
fn step_index(index: usize, direction: i32, len: usize) -> usize {
    (index as i32 + direction).rem_euclid(len as i32) as usize
}
