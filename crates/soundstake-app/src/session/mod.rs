//! Game session runtime
//!
//! The trial/turn state machine, the session controller that wires it to the
//! audio engine, and the shared state frontends consume.

pub mod controller;
pub mod events;
pub mod state;
pub mod turn;

pub use controller::SessionController;
pub use events::{SessionBus, SessionEvent};
pub use state::{SessionCommand, SessionSnapshot};
pub use turn::{GuessOutcome, Phase, SkipOutcome, Team, Trial, TurnEngine};
