//! Property tests for lobby membership (pure domain, no locking).
//!
//! Properties tested:
//! - Exactly one host whenever the lobby is non-empty
//! - Host transfer goes to the earliest remaining joiner
//! - Nicknames stay unique and capacity is never exceeded
//! - Removing an absent connection is a no-op

use proptest::prelude::*;
use uuid::Uuid;

use crate::domain::lobby::{ConnId, Lobby, LobbyId, Player};
use crate::domain::test_gens::{membership_ops, MembershipOp};

const MAX_PLAYERS: usize = 10;

fn assert_lobby_invariants(lobby: &Lobby) -> Result<(), TestCaseError> {
    prop_assert!(!lobby.is_empty(), "empty lobbies must be destroyed");
    prop_assert!(lobby.len() <= MAX_PLAYERS);

    let hosts = lobby.players().iter().filter(|p| p.is_host).count();
    prop_assert_eq!(hosts, 1, "exactly one host in a non-empty lobby");

    let mut names: Vec<&str> = lobby.players().iter().map(|p| p.nickname.as_str()).collect();
    names.sort_unstable();
    names.dedup();
    prop_assert_eq!(names.len(), lobby.len(), "nicknames are unique");
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: any sequence of joins and leaves preserves the host and
    /// uniqueness invariants, and an emptied lobby is gone.
    #[test]
    fn prop_membership_invariants(ops in membership_ops()) {
        let mut lobby: Option<Lobby> = None;
        let mut seen: Vec<ConnId> = Vec::new();

        for op in ops {
            match op {
                MembershipOp::Join(n) => {
                    let conn = Uuid::new_v4();
                    seen.push(conn);
                    let player = Player::new(conn, format!("p{n}"), 0);
                    match lobby.as_mut() {
                        None => {
                            lobby = Some(Lobby::open(
                                LobbyId::parse("PROP01").unwrap(),
                                player,
                                MAX_PLAYERS,
                            ));
                        }
                        Some(existing) => {
                            let before = existing.len();
                            if existing.admit(player).is_ok() {
                                prop_assert_eq!(existing.len(), before + 1);
                                prop_assert_eq!(existing.players().last().map(|p| p.conn_id), Some(conn));
                            } else {
                                prop_assert_eq!(existing.len(), before);
                            }
                        }
                    }
                }
                MembershipOp::Leave(pick) => {
                    if seen.is_empty() {
                        continue;
                    }
                    let conn = *pick.get(&seen);
                    if let Some(existing) = lobby.as_mut() {
                        let was_member = existing.member(conn).is_some();
                        let departure = existing.remove(conn);
                        prop_assert_eq!(departure.is_some(), was_member);

                        if let Some(departure) = departure {
                            if let Some(new_host) = departure.new_host {
                                prop_assert!(departure.player.is_host);
                                prop_assert_eq!(
                                    existing.players().first().map(|p| p.conn_id),
                                    Some(new_host.conn_id)
                                );
                            }
                            // Second removal of the same connection is a no-op
                            prop_assert!(existing.remove(conn).is_none());
                        }

                        if existing.is_empty() {
                            lobby = None;
                        }
                    }
                }
            }

            if let Some(existing) = lobby.as_ref() {
                assert_lobby_invariants(existing)?;
            }
        }
    }
}
