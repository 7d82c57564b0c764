use std::sync::Arc;
use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::LobbyId;
use crate::errors::domain::DomainError;
use crate::services::{Admission, LobbyCoordinator, LobbyEvent};
use crate::state::app_state::AppState;
use crate::ws::hub::WsRegistry;
use crate::ws::protocol::{ClientMsg, ServerMsg, WsErrorCode, PROTOCOL_VERSION};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

#[derive(Message)]
#[rtype(result = "()")]
pub struct Shutdown;

/// A coordinator event addressed to this session's connection.
#[derive(Message, Clone)]
#[rtype(result = "()")]
pub struct LobbyBroadcast(pub LobbyEvent);

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let conn_id = Uuid::new_v4();
    let session = WsSession::new(
        conn_id,
        app_state.coordinator(),
        app_state.websocket_registry(),
    );
    ws::start(session, &req, stream)
}

pub struct WsSession {
    conn_id: Uuid,
    coordinator: Arc<LobbyCoordinator>,
    registry: Arc<WsRegistry>,

    last_heartbeat: Instant,
    heartbeat_handle: Option<actix::SpawnHandle>,

    hello_done: bool,
}

impl WsSession {
    fn new(conn_id: Uuid, coordinator: Arc<LobbyCoordinator>, registry: Arc<WsRegistry>) -> Self {
        Self {
            conn_id,
            coordinator,
            registry,
            last_heartbeat: Instant::now(),
            heartbeat_handle: None,
            hello_done: false,
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound message"),
        }
    }

    fn send_error_and_close(
        &self,
        ctx: &mut ws::WebsocketContext<Self>,
        code: WsErrorCode,
        message: impl Into<String>,
    ) {
        let message = message.into();
        warn!(
            conn_id = %self.conn_id,
            code = code.as_str(),
            message = %message,
            "[WS SESSION] closing on protocol error"
        );
        Self::send_json(ctx, &ServerMsg::Error { code, message });
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
        ctx.stop();
    }

    /// Report a rejected request to this connection only.
    fn send_rejection(&self, ctx: &mut ws::WebsocketContext<Self>, op: &str, err: DomainError) {
        debug!(
            conn_id = %self.conn_id,
            op,
            code = err.code().as_str(),
            detail = err.detail(),
            "[WS SESSION] request rejected"
        );
        Self::send_json(
            ctx,
            &ServerMsg::LobbyError {
                code: err.code(),
                message: err.detail().to_string(),
            },
        );
    }

    fn start_heartbeat(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let handle = ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(conn_id = %actor.conn_id, "[WS SESSION] heartbeat timed out");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
        self.heartbeat_handle = Some(handle);
    }

    /// Run one lobby command against the coordinator and answer the
    /// requester. Lobby-wide effects arrive separately as broadcasts.
    fn dispatch(&mut self, cmd: ClientMsg, ctx: &mut ws::WebsocketContext<Self>) {
        let op = cmd.kind();
        let conn_id = self.conn_id;
        let coordinator = Arc::clone(&self.coordinator);

        let outcome: Result<Option<ServerMsg>, DomainError> = match cmd {
            ClientMsg::Hello { .. } => Ok(None),
            ClientMsg::CreateLobby { nickname, avatar } => coordinator
                .create_lobby(conn_id, &nickname, avatar)
                .map(|Admission { lobby_id, player, snapshot }| {
                    Some(ServerMsg::LobbyCreated {
                        lobby_id,
                        player,
                        lobby: snapshot,
                    })
                }),
            ClientMsg::JoinLobby {
                nickname,
                lobby_id,
                avatar,
            } => LobbyId::parse(&lobby_id).and_then(|lobby_id| {
                coordinator
                    .join_lobby(conn_id, &nickname, &lobby_id, avatar)
                    .map(|Admission { lobby_id, player, snapshot }| {
                        Some(ServerMsg::LobbyJoined {
                            lobby_id,
                            player,
                            lobby: snapshot,
                        })
                    })
            }),
            ClientMsg::GetLobby { lobby_id } => LobbyId::parse(&lobby_id)
                .and_then(|lobby_id| coordinator.lobby_snapshot(&lobby_id))
                .map(|lobby| Some(ServerMsg::LobbySnapshot { lobby })),
            ClientMsg::LeaveLobby { lobby_id } => LobbyId::parse(&lobby_id).map(|lobby_id| {
                coordinator.remove_player(&lobby_id, conn_id);
                None
            }),
            ClientMsg::StartGame {
                lobby_id,
                starting_bound,
            } => LobbyId::parse(&lobby_id)
                .and_then(|lobby_id| coordinator.start_game(&lobby_id, conn_id, starting_bound))
                .map(|()| None),
            ClientMsg::PlayerAction { lobby_id } => LobbyId::parse(&lobby_id)
                .and_then(|lobby_id| coordinator.player_action(&lobby_id, conn_id))
                .map(|_| None),
            ClientMsg::StopGame { lobby_id } => LobbyId::parse(&lobby_id)
                .and_then(|lobby_id| coordinator.stop_game(&lobby_id, conn_id))
                .map(|()| None),
        };

        match outcome {
            Ok(Some(reply)) => Self::send_json(ctx, &reply),
            Ok(None) => {}
            Err(err) => self.send_rejection(ctx, op, err),
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(conn_id = %self.conn_id, "[WS SESSION] started");

        let recipient = ctx.address().recipient::<LobbyBroadcast>();
        let addr = ctx.address();
        self.registry
            .register_connection(self.conn_id, recipient, addr);

        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        // Implicit disconnect: same effect as leave_lobby.
        self.coordinator.disconnect(self.conn_id);
        self.registry.unregister_connection(self.conn_id);
        info!(conn_id = %self.conn_id, "[WS SESSION] stopped");
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();

                let parsed: Result<ClientMsg, _> = serde_json::from_str(&text);
                let Ok(cmd) = parsed else {
                    self.send_error_and_close(ctx, WsErrorCode::BadRequest, "Malformed JSON");
                    return;
                };

                match cmd {
                    ClientMsg::Hello { protocol } => {
                        if protocol != PROTOCOL_VERSION {
                            self.send_error_and_close(
                                ctx,
                                WsErrorCode::BadProtocol,
                                "Unsupported protocol version",
                            );
                            return;
                        }
                        self.hello_done = true;
                        Self::send_json(
                            ctx,
                            &ServerMsg::HelloAck {
                                protocol: PROTOCOL_VERSION,
                                connection_id: self.conn_id,
                            },
                        );
                    }
                    cmd if !self.hello_done => {
                        self.send_error_and_close(
                            ctx,
                            WsErrorCode::BadRequest,
                            format!("Must send hello before {}", cmd.kind()),
                        );
                    }
                    cmd => self.dispatch(cmd, ctx),
                }
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                self.send_error_and_close(ctx, WsErrorCode::BadRequest, "Binary not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(
                    conn_id = %self.conn_id,
                    error = %err,
                    "[WS SESSION] protocol error"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}

impl Handler<LobbyBroadcast> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: LobbyBroadcast, ctx: &mut Self::Context) -> Self::Result {
        Self::send_json(ctx, &ServerMsg::from(msg.0));
    }
}

impl Handler<Shutdown> for WsSession {
    type Result = ();

    fn handle(&mut self, _msg: Shutdown, ctx: &mut Self::Context) -> Self::Result {
        self.registry.unregister_connection(self.conn_id);

        if let Some(handle) = self.heartbeat_handle.take() {
            ctx.cancel_future(handle);
        }

        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Away)));
        ctx.stop();
    }
}
