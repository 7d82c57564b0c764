// Turn engine: start, rolls, loss, delayed game over and host stop

use backend::domain::ConnId;
use backend::errors::ErrorCode;
use backend::services::{GameOverReason, LobbyEvent};
use backend::test_support::recording_coordinator;

use crate::common::{test_config, WAIT};
use crate::support::lobby::{assert_code, lobby_with, play_to_the_end, turn_holder};

#[tokio::test]
async fn scenario_c_start_shuffles_and_first_rolls_are_bounded() {
    let (coordinator, recorder) = recording_coordinator(test_config(21));
    let (lobby, conns) = lobby_with(&coordinator, &["Alice", "Bob"]);

    coordinator.start_game(&lobby, conns[0], 100).unwrap();

    let snapshot = coordinator.lobby_snapshot(&lobby).unwrap();
    let order: Vec<ConnId> = snapshot.players.iter().map(|p| p.connection_id).collect();
    let mut sorted_order = order.clone();
    sorted_order.sort();
    let mut sorted_conns = conns.clone();
    sorted_conns.sort();
    assert_eq!(sorted_order, sorted_conns, "start order is a permutation");

    let game = snapshot.game.as_ref().unwrap();
    assert!(game.is_active);
    assert!(game.is_first_turn);
    assert_eq!(game.starting_bound, 100);
    assert_eq!(game.current_turn, 0);
    assert_eq!(game.next_bound, 100);

    // Everyone learns the same order
    for conn in &conns {
        let events = recorder.events_for(*conn);
        let Some(LobbyEvent::GameStarted {
            starting_bound,
            current_turn,
            players,
            ..
        }) = events.last()
        else {
            panic!("expected game_started, got {events:?}");
        };
        assert_eq!(*starting_bound, 100);
        assert_eq!(*current_turn, 0);
        let seen: Vec<ConnId> = players.iter().map(|p| p.connection_id).collect();
        assert_eq!(seen, order);
    }

    let first = coordinator.player_action(&lobby, order[0]).unwrap();
    assert!((1..=100).contains(&first.value));
    assert_eq!(first.range_start, 1);
    assert_eq!(first.range_end, 100);
    assert_eq!(first.connection_id, order[0]);

    if first.value > 1 {
        assert_eq!(turn_holder(&coordinator, &lobby), order[1]);
        let second = coordinator.player_action(&lobby, order[1]).unwrap();
        assert!((1..=first.value).contains(&second.value));
        assert_eq!(second.range_end, first.value);
    }
}

#[tokio::test]
async fn non_final_roll_emits_turn_changed_then_current_roll() {
    let (coordinator, recorder) = recording_coordinator(test_config(22));
    let (lobby, conns) = lobby_with(&coordinator, &["Alice", "Bob", "Carol"]);
    coordinator.start_game(&lobby, conns[0], 1_000_000_000).unwrap();
    recorder.clear();

    let holder = turn_holder(&coordinator, &lobby);
    let roll = coordinator.player_action(&lobby, holder).unwrap();
    assert!(roll.value > 1);

    for conn in &conns {
        assert_eq!(recorder.kinds_for(*conn), vec!["turn_changed", "current_roll"]);
        let events = recorder.events_for(*conn);
        match &events[0] {
            LobbyEvent::TurnChanged {
                current_turn,
                roll: Some(carried),
                ..
            } => {
                assert_eq!(*current_turn, 1);
                assert_eq!(carried, &roll);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    let snapshot = coordinator.lobby_snapshot(&lobby).unwrap();
    let game = snapshot.game.unwrap();
    assert!(!game.is_first_turn);
    assert_eq!(game.last_roll, Some(roll.value));
    assert_eq!(game.next_bound, roll.value);
    assert_eq!(game.rolls.len(), 1);
}

#[tokio::test]
async fn turns_cycle_through_start_order() {
    let (coordinator, _recorder) = recording_coordinator(test_config(23));
    let (lobby, conns) = lobby_with(&coordinator, &["Alice", "Bob", "Carol"]);
    coordinator.start_game(&lobby, conns[0], u32::MAX as i64).unwrap();

    let order: Vec<ConnId> = coordinator
        .lobby_snapshot(&lobby)
        .unwrap()
        .players
        .iter()
        .map(|p| p.connection_id)
        .collect();

    for step in 0..6 {
        let expected = order[step % order.len()];
        assert_eq!(turn_holder(&coordinator, &lobby), expected);
        let roll = coordinator.player_action(&lobby, expected).unwrap();
        if roll.value == 1 {
            break;
        }
    }
}

#[tokio::test]
async fn out_of_turn_roll_is_rejected_and_nothing_is_sent() {
    let (coordinator, recorder) = recording_coordinator(test_config(24));
    let (lobby, conns) = lobby_with(&coordinator, &["Alice", "Bob"]);
    coordinator.start_game(&lobby, conns[0], 500).unwrap();
    recorder.clear();

    let holder = turn_holder(&coordinator, &lobby);
    let waiting = conns.iter().copied().find(|c| *c != holder).unwrap();
    let before = coordinator.lobby_snapshot(&lobby).unwrap();

    assert_code(coordinator.player_action(&lobby, waiting), ErrorCode::NotYourTurn);
    assert_code(
        coordinator.player_action(&lobby, uuid::Uuid::new_v4()),
        ErrorCode::NotYourTurn,
    );
    assert_eq!(coordinator.lobby_snapshot(&lobby).unwrap(), before);
    assert!(recorder.is_empty());
}

#[tokio::test]
async fn scenario_d_reaching_one_ends_game_and_game_over_follows_later() {
    let (coordinator, recorder) = recording_coordinator(test_config(25));
    let (lobby, conns) = lobby_with(&coordinator, &["Alice", "Bob", "Carol"]);
    coordinator.start_game(&lobby, conns[0], 20).unwrap();
    recorder.clear();

    play_to_the_end(&coordinator, &lobby);

    let snapshot = coordinator.lobby_snapshot(&lobby).unwrap();
    let game = snapshot.game.as_ref().unwrap();
    assert!(!game.is_active);
    assert_eq!(game.rolls.last().unwrap().value, 1);
    let losers: Vec<ConnId> = snapshot
        .players
        .iter()
        .filter(|p| p.is_loser)
        .map(|p| p.connection_id)
        .collect();
    assert_eq!(losers.len(), 1);
    let loser = losers[0];
    assert_eq!(game.rolls.last().unwrap().connection_id, loser);

    // The game is over for turn purposes right away
    assert_code(coordinator.player_action(&lobby, loser), ErrorCode::NotActive);

    // No await has happened yet, so the delayed task cannot have run
    for conn in &conns {
        let events = recorder.events_for(*conn);
        let reached: Vec<(ConnId, bool)> = events
            .iter()
            .filter_map(|e| match e {
                LobbyEvent::PlayerReachedOne {
                    connection_id,
                    is_you,
                    ..
                } => Some((*connection_id, *is_you)),
                _ => None,
            })
            .collect();
        assert_eq!(reached, vec![(loser, *conn == loser)]);
        assert!(!events.iter().any(|e| matches!(e, LobbyEvent::GameOver { .. })));
    }

    let delivered = recorder
        .wait_until(WAIT, |events| {
            conns.iter().all(|conn| {
                events.iter().any(|(to, e)| {
                    to == conn
                        && matches!(
                            e,
                            LobbyEvent::GameOver {
                                reason: GameOverReason::Loser { connection_id, .. },
                                ..
                            } if *connection_id == loser
                        )
                })
            })
        })
        .await;
    assert!(delivered, "game_over should reach every member");

    for conn in &conns {
        let kinds = recorder.kinds_for(*conn);
        assert_eq!(&kinds[kinds.len() - 2..], &["player_reached_one", "game_over"]);
    }
}

#[tokio::test]
async fn bound_of_one_loses_on_the_first_roll() {
    let (coordinator, _recorder) = recording_coordinator(test_config(26));
    let (lobby, conns) = lobby_with(&coordinator, &["Alice", "Bob"]);
    coordinator.start_game(&lobby, conns[0], 1).unwrap();

    let holder = turn_holder(&coordinator, &lobby);
    let roll = coordinator.player_action(&lobby, holder).unwrap();
    assert_eq!(roll.value, 1);
    assert_eq!(roll.range_end, 1);

    let snapshot = coordinator.lobby_snapshot(&lobby).unwrap();
    assert!(!snapshot.game.unwrap().is_active);
    assert!(snapshot
        .players
        .iter()
        .any(|p| p.connection_id == holder && p.is_loser));
}

#[tokio::test]
async fn restart_after_loss_clears_loser_flag() {
    let (coordinator, _recorder) = recording_coordinator(test_config(27));
    let (lobby, conns) = lobby_with(&coordinator, &["Alice", "Bob"]);
    coordinator.start_game(&lobby, conns[0], 10).unwrap();
    play_to_the_end(&coordinator, &lobby);

    // Allowed inside the post-loss window
    coordinator.start_game(&lobby, conns[0], 10).unwrap();

    let snapshot = coordinator.lobby_snapshot(&lobby).unwrap();
    let game = snapshot.game.unwrap();
    assert!(game.is_active);
    assert!(game.rolls.is_empty());
    assert!(snapshot.players.iter().all(|p| !p.is_loser));
}

#[tokio::test]
async fn start_rules_checked_in_order() {
    let (coordinator, _recorder) = recording_coordinator(test_config(28));
    let (lobby, conns) = lobby_with(&coordinator, &["Alice"]);

    // Non-host is rejected before anything else
    assert_code(
        coordinator.start_game(&lobby, uuid::Uuid::new_v4(), 0),
        ErrorCode::NotHost,
    );
    assert_code(
        coordinator.start_game(&lobby, conns[0], 0),
        ErrorCode::NotEnoughPlayers,
    );

    coordinator
        .join_lobby(uuid::Uuid::new_v4(), "Bob", &lobby, 0)
        .unwrap();
    assert_code(coordinator.start_game(&lobby, conns[0], 0), ErrorCode::InvalidBound);
    assert_code(
        coordinator.start_game(&lobby, conns[0], u32::MAX as i64 + 1),
        ErrorCode::InvalidBound,
    );

    coordinator.start_game(&lobby, conns[0], 100).unwrap();
    assert_code(
        coordinator.start_game(&lobby, conns[0], 100),
        ErrorCode::GameAlreadyActive,
    );
}

#[tokio::test]
async fn host_stop_broadcasts_game_over_without_loser() {
    let (coordinator, recorder) = recording_coordinator(test_config(29));
    let (lobby, conns) = lobby_with(&coordinator, &["Alice", "Bob"]);
    coordinator.start_game(&lobby, conns[0], 1_000).unwrap();
    recorder.clear();

    assert_code(coordinator.stop_game(&lobby, conns[1]), ErrorCode::NotHost);
    coordinator.stop_game(&lobby, conns[0]).unwrap();

    for conn in &conns {
        let events = recorder.events_for(*conn);
        assert!(matches!(
            events.as_slice(),
            [LobbyEvent::GameOver {
                reason: GameOverReason::HostStopped,
                ..
            }]
        ));
    }
    let snapshot = coordinator.lobby_snapshot(&lobby).unwrap();
    assert!(!snapshot.game.unwrap().is_active);
    assert!(snapshot.players.iter().all(|p| !p.is_loser));

    assert_code(coordinator.stop_game(&lobby, conns[0]), ErrorCode::NotActive);
    assert_code(coordinator.player_action(&lobby, conns[0]), ErrorCode::NotActive);
}
