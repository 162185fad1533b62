//! Reconnect watchdog.
//!
//! Runs on the watchdog cadence. A healthy (active) session is left alone;
//! otherwise the current connection's readiness decides what happens:
//!
//! | Readiness    | Action                                                        |
//! |--------------|---------------------------------------------------------------|
//! | `Open`       | inactive but open (restart sent): request close               |
//! | `Closing`    | count; at the limit discard it and connect again this tick   |
//! | `Closed`     | discard                                                       |
//! | none         | connect                                                       |
//! | `Connecting` | count; at the limit request close once and reset the count   |
//!
//! The two counters are independent. A slow handshake gets twice the
//! patience of a wedged close.

use crate::constants::{STUCK_CLOSING_LIMIT, STUCK_CONNECTING_LIMIT};

use super::connection::Readiness;
use super::session::{Effect, Session};

/// Run one watchdog tick against the session.
pub fn tick(session: &mut Session) -> Vec<Effect> {
    if session.is_active() {
        return Vec::new();
    }

    let Some(readiness) = session.readiness() else {
        return session.create_connection();
    };

    match readiness {
        Readiness::Open => {
            log::info!("[Watchdog] Open link is inactive, closing");
            session.request_close()
        }
        Readiness::Closing => {
            let Some(conn) = session.connection_mut() else {
                return Vec::new();
            };
            let id = conn.id();
            let count = conn.bump_stuck_closing();
            if count < STUCK_CLOSING_LIMIT {
                log::debug!("[Watchdog] {} closing ({}/{})", id, count, STUCK_CLOSING_LIMIT);
                return Vec::new();
            }

            log::warn!("[Watchdog] {} stuck closing, discarding", id);
            let mut effects = Vec::new();
            if let Some(id) = session.discard_connection() {
                effects.push(Effect::Discard { id });
            }
            effects.extend(session.create_connection());
            effects
        }
        Readiness::Closed => match session.discard_connection() {
            Some(id) => {
                log::debug!("[Watchdog] Discarding closed {}", id);
                vec![Effect::Discard { id }]
            }
            None => Vec::new(),
        },
        Readiness::Connecting => {
            let Some(conn) = session.connection_mut() else {
                return Vec::new();
            };
            let id = conn.id();
            let count = conn.bump_stuck_connecting();
            if count < STUCK_CONNECTING_LIMIT {
                log::debug!(
                    "[Watchdog] {} connecting ({}/{})",
                    id,
                    count,
                    STUCK_CONNECTING_LIMIT
                );
                return Vec::new();
            }

            log::warn!("[Watchdog] {} stuck connecting, closing", id);
            conn.reset_stuck_connecting();
            session.request_close()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::link::events::{ConnectionId, LinkEvent};
    use crate::link::session::LinkTiming;
    use std::time::Duration;
    use tokio::time::Instant;

    fn session() -> Session {
        Session::new("ws://device:81/", LinkTiming::default())
    }

    fn opens(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|e| matches!(e, Effect::Open { .. }))
            .count()
    }

    fn current_id(session: &Session) -> ConnectionId {
        session.connection().map(|c| c.id()).unwrap()
    }

    #[test]
    fn test_idle_tick_creates_connection() {
        let mut session = session();
        let effects = tick(&mut session);
        assert_eq!(opens(&effects), 1);
        assert_eq!(session.readiness(), Some(Readiness::Connecting));
    }

    #[test]
    fn test_active_session_is_left_alone() {
        let mut session = session();
        tick(&mut session);
        let id = current_id(&session);
        session.handle_event(LinkEvent::Opened { id }, Instant::now());

        for _ in 0..50 {
            assert!(tick(&mut session).is_empty());
        }
        assert_eq!(session.readiness(), Some(Readiness::Open));
    }

    #[test]
    fn test_stuck_connecting_closes_exactly_once() {
        let mut session = session();
        tick(&mut session);
        let id = current_id(&session);

        for _ in 1..STUCK_CONNECTING_LIMIT {
            assert!(tick(&mut session).is_empty());
        }
        let effects = tick(&mut session);
        assert_eq!(effects, vec![Effect::Close { id }]);
        assert_eq!(session.readiness(), Some(Readiness::Closing));
        assert_eq!(session.connection().unwrap().stuck_connecting(), 0);

        // Closing now; the connecting counter must not trigger again.
        for _ in 1..STUCK_CLOSING_LIMIT {
            let effects = tick(&mut session);
            assert!(!effects.contains(&Effect::Close { id }));
        }
    }

    #[test]
    fn test_stuck_closing_discards_and_reconnects() {
        let mut session = session();
        tick(&mut session);
        let id = current_id(&session);
        session.handle_event(LinkEvent::Opened { id }, Instant::now());
        session.request_close();
        session.note_command(crate::command::CommandChannel::User, "a");

        for _ in 1..STUCK_CLOSING_LIMIT {
            assert!(tick(&mut session).is_empty());
        }
        let effects = tick(&mut session);
        assert_eq!(effects.first(), Some(&Effect::Discard { id }));
        assert_eq!(opens(&effects), 1);
        assert_ne!(current_id(&session), id);
        assert_eq!(session.readiness(), Some(Readiness::Connecting));
    }

    #[test]
    fn test_closed_is_discarded_then_replaced() {
        let mut session = session();
        tick(&mut session);
        let id = current_id(&session);
        session.handle_event(
            LinkEvent::Closed {
                id,
                reason: "refused".into(),
            },
            Instant::now(),
        );

        assert_eq!(tick(&mut session), vec![Effect::Discard { id }]);
        assert_eq!(session.readiness(), None);
        assert_eq!(opens(&tick(&mut session)), 1);
    }

    #[test]
    fn test_inactive_open_link_is_closed() {
        let mut session = session();
        tick(&mut session);
        let id = current_id(&session);
        session.handle_event(LinkEvent::Opened { id }, Instant::now());
        session.note_command(crate::command::CommandChannel::User, "1");

        assert_eq!(tick(&mut session), vec![Effect::Close { id }]);
    }

    #[test]
    fn test_liveness_timeout_leads_to_one_new_connection() {
        let mut session = session();
        let start = Instant::now();
        tick(&mut session);
        let id = current_id(&session);
        session.handle_event(LinkEvent::Opened { id }, start);

        let expired = start + Duration::from_millis(6000);
        let effects = session.poll_liveness(expired);
        assert!(effects.contains(&Effect::Close { id }));
        assert!(session.poll_liveness(expired).is_empty());

        session.handle_event(
            LinkEvent::Closed {
                id,
                reason: "closed".into(),
            },
            expired,
        );

        let mut created = 0;
        for _ in 0..10 {
            created += opens(&tick(&mut session));
        }
        assert_eq!(created, 1);
        assert_eq!(session.readiness(), Some(Readiness::Connecting));
    }
}
