//! Snapshot diffing.
//!
//! [`ChannelDiffEngine::compute`] turns the previous and current membership of
//! a channel into an ordered list of notifications:
//!
//! 1. every `NewUserJoined` (ascending user id),
//! 2. every `UserLeft` (ascending user id),
//! 3. at most one aggregate: `UsersConnected` when the channel went from empty
//!    to non-empty, `UsersAllLeft` when it went from non-empty to empty.
//!
//! Without a baseline nothing is emitted, so a restart or storage gap never
//! fabricates events.

use super::{ChannelSnapshot, Notification};

/// Pure, stateless diff of two channel snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChannelDiffEngine;

impl ChannelDiffEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute the notifications that lead from `previous` to `current`.
    ///
    /// `previous` is `None` when the channel was never observed or its stored
    /// state expired.
    pub fn compute(
        &self,
        previous: Option<&ChannelSnapshot>,
        current: &ChannelSnapshot,
    ) -> Vec<Notification> {
        let Some(previous) = previous else {
            return Vec::new();
        };

        let channel_id = current.channel_id();
        let mut notifications = Vec::new();

        notifications.extend(
            current
                .users()
                .filter(|user| !previous.contains(user.id))
                .map(|user| Notification::NewUserJoined {
                    channel_id,
                    user: user.clone(),
                }),
        );

        notifications.extend(
            previous
                .users()
                .filter(|user| !current.contains(user.id))
                .map(|user| Notification::UserLeft {
                    channel_id,
                    user: user.clone(),
                }),
        );

        match (previous.is_empty(), current.is_empty()) {
            (true, false) => notifications.push(Notification::UsersConnected {
                channel_id,
                users: current.users().cloned().collect(),
            }),
            (false, true) => notifications.push(Notification::UsersAllLeft { channel_id }),
            _ => {}
        }

        notifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;

    fn snapshot(users: &[(i64, &str)]) -> ChannelSnapshot {
        ChannelSnapshot::capture(1, users.iter().map(|(id, name)| User::new(*id, *name)))
    }

    fn joined(id: i64, name: &str) -> Notification {
        Notification::NewUserJoined {
            channel_id: 1,
            user: User::new(id, name),
        }
    }

    fn left(id: i64, name: &str) -> Notification {
        Notification::UserLeft {
            channel_id: 1,
            user: User::new(id, name),
        }
    }

    #[test]
    fn test_no_baseline_yields_nothing() {
        let engine = ChannelDiffEngine::new();

        assert!(engine.compute(None, &snapshot(&[])).is_empty());
        assert!(engine.compute(None, &snapshot(&[(1, "a"), (2, "b")])).is_empty());
    }

    #[test]
    fn test_same_ids_yield_nothing() {
        let engine = ChannelDiffEngine::new();
        let previous = snapshot(&[(1, "a"), (2, "b")]);
        // Renames are not membership changes.
        let current = snapshot(&[(2, "bee"), (1, "a")]);

        assert!(engine.compute(Some(&previous), &current).is_empty());
    }

    #[test]
    fn test_join_into_populated_channel() {
        let engine = ChannelDiffEngine::new();
        let previous = snapshot(&[(1, "a")]);
        let current = snapshot(&[(1, "a"), (2, "b")]);

        assert_eq!(
            engine.compute(Some(&previous), &current),
            vec![joined(2, "b")]
        );
    }

    #[test]
    fn test_first_user_connects() {
        let engine = ChannelDiffEngine::new();
        let previous = snapshot(&[]);
        let current = snapshot(&[(1, "a")]);

        assert_eq!(
            engine.compute(Some(&previous), &current),
            vec![
                joined(1, "a"),
                Notification::UsersConnected {
                    channel_id: 1,
                    users: vec![User::new(1, "a")],
                },
            ]
        );
    }

    #[test]
    fn test_everyone_leaves() {
        let engine = ChannelDiffEngine::new();
        let previous = snapshot(&[(1, "a"), (2, "b")]);
        let current = snapshot(&[]);

        let notifications = engine.compute(Some(&previous), &current);

        assert_eq!(notifications.len(), 3);
        assert!(notifications[..2].contains(&left(1, "a")));
        assert!(notifications[..2].contains(&left(2, "b")));
        assert_eq!(
            notifications[2],
            Notification::UsersAllLeft { channel_id: 1 }
        );
    }

    #[test]
    fn test_empty_to_empty() {
        let engine = ChannelDiffEngine::new();

        assert!(engine.compute(Some(&snapshot(&[])), &snapshot(&[])).is_empty());
    }

    #[test]
    fn test_churn_without_aggregate() {
        let engine = ChannelDiffEngine::new();
        let previous = snapshot(&[(1, "a"), (2, "b")]);
        let current = snapshot(&[(2, "b"), (3, "c"), (4, "d")]);

        let notifications = engine.compute(Some(&previous), &current);

        assert_eq!(notifications.len(), 3);
        // Joins come before leaves.
        assert!(notifications[..2].contains(&joined(3, "c")));
        assert!(notifications[..2].contains(&joined(4, "d")));
        assert_eq!(notifications[2], left(1, "a"));
        assert!(notifications.iter().all(|n| !n.is_aggregate()));
    }

    #[test]
    fn test_full_swap_has_no_aggregate() {
        let engine = ChannelDiffEngine::new();
        let previous = snapshot(&[(1, "a")]);
        let current = snapshot(&[(2, "b")]);

        assert_eq!(
            engine.compute(Some(&previous), &current),
            vec![joined(2, "b"), left(1, "a")]
        );
    }
}
