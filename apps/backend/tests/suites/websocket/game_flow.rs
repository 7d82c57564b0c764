// Game lifecycle over live sockets: start, rolls, loss and host stop

use backend::infra::state::build_state;
use serde_json::{json, Value};

use crate::common::{TEST_GAME_OVER_DELAY, WAIT};
use crate::support::websocket::start_test_server;
use crate::support::websocket_client::WebSocketClient;

struct Table {
    lobby_id: Value,
    host: WebSocketClient,
    host_id: String,
    guest: WebSocketClient,
    guest_id: String,
}

impl Table {
    /// Two connected clients sharing one lobby, Alice hosting.
    async fn seat(url: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let (mut host, host_id) = WebSocketClient::connect_ready(url, WAIT).await?;
        host.send_json(&json!({"type": "create_lobby", "nickname": "Alice"}))
            .await?;
        let lobby_id = host.expect_type("lobby_created", WAIT).await?["lobby_id"].clone();

        let (mut guest, guest_id) = WebSocketClient::connect_ready(url, WAIT).await?;
        guest
            .send_json(&json!({"type": "join_lobby", "nickname": "Bob", "lobby_id": lobby_id}))
            .await?;
        guest.expect_type("lobby_joined", WAIT).await?;
        host.expect_type("player_joined", WAIT).await?;

        Ok(Self {
            lobby_id,
            host,
            host_id,
            guest,
            guest_id,
        })
    }

    async fn start(&mut self, bound: i64) -> Result<Value, Box<dyn std::error::Error>> {
        self.host
            .send_json(&json!({
                "type": "start_game",
                "lobby_id": self.lobby_id,
                "starting_bound": bound,
            }))
            .await?;
        let started = self.host.expect_type("game_started", WAIT).await?;
        let seen = self.guest.expect_type("game_started", WAIT).await?;
        assert_eq!(started, seen);
        Ok(started)
    }

    /// The client whose connection id is `conn_id`.
    fn client(&mut self, conn_id: &Value) -> &mut WebSocketClient {
        if conn_id == self.host_id.as_str() {
            &mut self.host
        } else {
            &mut self.guest
        }
    }
}

#[tokio::test]
async fn start_roll_and_turn_pass() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state()
        .with_game_over_delay(TEST_GAME_OVER_DELAY)
        .with_rng_seed(202)
        .build()
        .await?;
    let (server_handle, url, _join) = start_test_server(state).await?;
    let mut table = Table::seat(&url).await?;

    let started = table.start(1_000_000_000).await?;
    assert_eq!(started["starting_bound"], 1_000_000_000u32);
    assert_eq!(started["current_turn"], 0);
    let order = started["players"].as_array().ok_or("no players")?.clone();
    assert_eq!(order.len(), 2);
    let first = order[0]["connection_id"].clone();
    let second = order[1]["connection_id"].clone();
    assert!(first == table.host_id.as_str() || first == table.guest_id.as_str());

    let lobby_id = table.lobby_id.clone();
    table
        .client(&second)
        .send_json(&json!({"type": "player_action", "lobby_id": lobby_id}))
        .await?;
    let err = table.client(&second).expect_type("lobby_error", WAIT).await?;
    assert_eq!(err["code"], "NOT_YOUR_TURN");

    table
        .client(&first)
        .send_json(&json!({"type": "player_action", "lobby_id": lobby_id}))
        .await?;
    for client in [&mut table.host, &mut table.guest] {
        let turn = client.expect_type("turn_changed", WAIT).await?;
        assert_eq!(turn["current_turn"], 1);
        assert_eq!(turn["turn_holder"], second);
        assert_eq!(turn["roll"]["connection_id"], first);
        let roll = client.expect_type("current_roll", WAIT).await?;
        assert_eq!(roll["roll"], turn["roll"]);
        assert_eq!(roll["roll"]["range_start"], 1);
        assert_eq!(roll["roll"]["range_end"], 1_000_000_000u32);
    }

    server_handle.stop(true).await;
    Ok(())
}

#[tokio::test]
async fn reaching_one_then_delayed_game_over() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state()
        .with_game_over_delay(TEST_GAME_OVER_DELAY)
        .with_rng_seed(203)
        .build()
        .await?;
    let (server_handle, url, _join) = start_test_server(state).await?;
    let mut table = Table::seat(&url).await?;

    // A bound of one makes the first roll the last
    let started = table.start(1).await?;
    let roller = started["players"][0]["connection_id"].clone();
    let lobby_id = table.lobby_id.clone();
    table
        .client(&roller)
        .send_json(&json!({"type": "player_action", "lobby_id": lobby_id}))
        .await?;

    let host_id = table.host_id.clone();
    for (client, me) in [
        (&mut table.host, host_id),
        (&mut table.guest, table.guest_id.clone()),
    ] {
        let reached = client.expect_type("player_reached_one", WAIT).await?;
        assert_eq!(reached["connection_id"], roller);
        assert_eq!(reached["roll"]["value"], 1);
        assert_eq!(reached["is_you"], roller == me.as_str());

        let over = client.expect_type("game_over", WAIT).await?;
        assert_eq!(over["reason"], "loser");
        assert_eq!(over["loser_connection_id"], roller);
    }

    server_handle.stop(true).await;
    Ok(())
}

#[tokio::test]
async fn host_can_stop_the_game() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state().with_rng_seed(204).build().await?;
    let (server_handle, url, _join) = start_test_server(state).await?;
    let mut table = Table::seat(&url).await?;
    table.start(500).await?;
    let lobby_id = table.lobby_id.clone();

    table
        .guest
        .send_json(&json!({"type": "stop_game", "lobby_id": lobby_id}))
        .await?;
    let err = table.guest.expect_type("lobby_error", WAIT).await?;
    assert_eq!(err["code"], "NOT_HOST");

    table
        .host
        .send_json(&json!({"type": "stop_game", "lobby_id": lobby_id}))
        .await?;
    for client in [&mut table.host, &mut table.guest] {
        let over = client.expect_type("game_over", WAIT).await?;
        assert_eq!(over["reason"], "host_stopped");
        assert!(over.get("loser").is_none());
    }

    // Nothing is running any more
    table
        .host
        .send_json(&json!({"type": "player_action", "lobby_id": lobby_id}))
        .await?;
    let err = table.host.expect_type("lobby_error", WAIT).await?;
    assert_eq!(err["code"], "NOT_ACTIVE");

    server_handle.stop(true).await;
    Ok(())
}

#[tokio::test]
async fn start_is_validated() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state().build().await?;
    let (server_handle, url, _join) = start_test_server(state).await?;
    let mut table = Table::seat(&url).await?;
    let lobby_id = table.lobby_id.clone();

    table
        .guest
        .send_json(&json!({"type": "start_game", "lobby_id": lobby_id, "starting_bound": 100}))
        .await?;
    let err = table.guest.expect_type("lobby_error", WAIT).await?;
    assert_eq!(err["code"], "NOT_HOST");

    table
        .host
        .send_json(&json!({"type": "start_game", "lobby_id": lobby_id, "starting_bound": 0}))
        .await?;
    let err = table.host.expect_type("lobby_error", WAIT).await?;
    assert_eq!(err["code"], "INVALID_BOUND");

    server_handle.stop(true).await;
    Ok(())
}

#[tokio::test]
async fn turn_holder_leaving_passes_the_turn() -> Result<(), Box<dyn std::error::Error>> {
    let state = build_state().with_rng_seed(205).build().await?;
    let (server_handle, url, _join) = start_test_server(state).await?;
    let mut table = Table::seat(&url).await?;
    let started = table.start(1_000).await?;

    let holder = started["players"][0]["connection_id"].clone();
    let (leaver, stayer, stayer_id) = if holder == table.host_id.as_str() {
        (&mut table.host, &mut table.guest, table.guest_id.clone())
    } else {
        (&mut table.guest, &mut table.host, table.host_id.clone())
    };
    leaver.close().await?;

    stayer.expect_type("player_left", WAIT).await?;
    let mut frame = stayer.expect_any(WAIT).await?;
    if frame["type"] == "host_changed" {
        frame = stayer.expect_any(WAIT).await?;
    }
    assert_eq!(frame["type"], "turn_changed");
    assert_eq!(frame["current_turn"], 0);
    assert_eq!(frame["turn_holder"], stayer_id);
    assert!(frame.get("roll").is_none());

    server_handle.stop(true).await;
    Ok(())
}
