// Chess engine with tree search and a self-improving evaluation.
//
// `game_repr` adapts the `chess` crate's board into a push/pop position
// stack, `agent` holds the players: the searching `TreePlayer` with its
// learning overlay and a random baseline.

pub mod agent;
pub mod error;
pub mod game_repr;

pub use error::{EngineError, Result};
