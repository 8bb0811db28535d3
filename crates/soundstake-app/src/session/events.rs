//! Session event broadcasting
//!
//! `SessionBus` broadcasts discrete `SessionEvent`s to subscribers. The bus
//! is constructed at the application root and handed to the controller —
//! there is no process-wide registry.

use std::sync::Mutex;

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::turn::{Phase, Team};

/// Discrete events broadcast to subscribers
#[derive(Debug, Clone)]
pub enum SessionEvent {
    PhaseChanged(Phase),
    /// The turn passed to the given team
    TurnChanged(Team),
    BalancesChanged {
        a: i32,
        b: i32,
    },
    GameOver {
        winner: Team,
    },
    Error(String),
}

/// Broadcast mechanism for session events
pub struct SessionBus {
    subscribers: Mutex<Vec<Sender<SessionEvent>>>,
}

impl Default for SessionBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBus {
    /// Create a new bus with no subscribers
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to events. Returns a receiver that will get all future events.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = unbounded();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        rx
    }

    /// Emit an event to all subscribers. Removes disconnected subscribers.
    pub fn emit(&self, event: SessionEvent) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribe_and_emit() {
        let bus = SessionBus::new();
        let rx = bus.subscribe();

        bus.emit(SessionEvent::PhaseChanged(Phase::Guessing));

        let evt = rx.recv().unwrap();
        assert!(matches!(evt, SessionEvent::PhaseChanged(Phase::Guessing)));
    }

    #[test]
    fn multiple_subscribers() {
        let bus = SessionBus::new();
        let rx1 = bus.subscribe();
        let rx2 = bus.subscribe();

        bus.emit(SessionEvent::TurnChanged(Team::B));

        assert!(matches!(rx1.recv().unwrap(), SessionEvent::TurnChanged(Team::B)));
        assert!(matches!(rx2.recv().unwrap(), SessionEvent::TurnChanged(Team::B)));
    }

    #[test]
    fn disconnected_subscriber_cleanup() {
        let bus = SessionBus::new();
        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        drop(rx1);

        bus.emit(SessionEvent::GameOver { winner: Team::A });

        let subs = bus.subscribers.lock().unwrap();
        assert_eq!(subs.len(), 1);
    }

    #[test]
    fn emit_with_no_subscribers_is_fine() {
        let bus = SessionBus::new();
        bus.emit(SessionEvent::Error("nobody listening".to_string()));
    }

    #[test]
    fn events_arrive_in_order() {
        let bus = SessionBus::new();
        let rx = bus.subscribe();

        bus.emit(SessionEvent::BalancesChanged { a: 29, b: 30 });
        bus.emit(SessionEvent::BalancesChanged { a: 26, b: 30 });

        if let SessionEvent::BalancesChanged { a, .. } = rx.recv().unwrap() {
            assert_eq!(a, 29);
        }
        if let SessionEvent::BalancesChanged { a, .. } = rx.recv().unwrap() {
            assert_eq!(a, 26);
        }
    }
}
