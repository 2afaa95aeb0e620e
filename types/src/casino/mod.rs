mod card;
mod constants;
mod event;
mod game;
mod player;

pub use card::*;
pub use constants::*;
pub use event::*;
pub use game::*;
pub use player::*;
