pub mod action;
pub mod game_state;
pub mod log;
pub mod player;
