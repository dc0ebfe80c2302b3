//! End-to-end flows through the client state machine, without I/O.

use std::time::{Duration, Instant};
use tictactoe_online::{
    ApiError, CONNECTION_LOST_MESSAGE, ClientAction, ClientEvent, ConnectionState,
    ConnectionToken, Endpoint, GameClient, GameStatus, HeartbeatMonitor, Mark, NotificationCenter,
    ReconnectPolicy, RequestId, RoomAssignment, RoomRequest, Severity, SupervisorState,
    UserCommand,
};

fn client() -> GameClient {
    GameClient::new(
        Endpoint::parse("http://localhost:8000").unwrap(),
        HeartbeatMonitor::default(),
        ReconnectPolicy::default(),
        NotificationCenter::default(),
    )
}

fn assignment() -> RoomAssignment {
    RoomAssignment {
        room_id: "ROOM42".to_string(),
        player_id: "player-x".to_string(),
        message: None,
    }
}

fn request_of(actions: &[ClientAction]) -> RequestId {
    actions
        .iter()
        .find_map(|a| match a {
            ClientAction::RequestRoom { request, .. } => Some(*request),
            _ => None,
        })
        .expect("room request")
}

fn connect_of(actions: &[ClientAction]) -> (ConnectionToken, String) {
    actions
        .iter()
        .find_map(|a| match a {
            ClientAction::Connect { token, url } => Some((*token, url.clone())),
            _ => None,
        })
        .expect("connect action")
}

fn notices(actions: &[ClientAction]) -> Vec<(String, Severity)> {
    actions
        .iter()
        .filter_map(|a| match a {
            ClientAction::Notify { notification, .. } => {
                Some((notification.message.clone(), notification.severity))
            }
            _ => None,
        })
        .collect()
}

fn sends(actions: &[ClientAction]) -> Vec<serde_json::Value> {
    actions
        .iter()
        .filter_map(|a| match a {
            ClientAction::Send { frame, .. } => Some(serde_json::from_str(frame).unwrap()),
            _ => None,
        })
        .collect()
}

/// Creates a room and opens its connection; returns the live token.
fn created_and_open(client: &mut GameClient) -> ConnectionToken {
    let actions = client.on_user_command(UserCommand::CreateRoom);
    let request = request_of(&actions);
    let actions = client.on_room_assigned(request, RoomRequest::Create, assignment());
    let (token, _) = connect_of(&actions);
    client.on_connection_opened(token);
    token
}

fn playing_frame(current_player: &str, board: [&str; 9]) -> String {
    serde_json::json!({
        "type": "game_update",
        "data": {
            "board": board,
            "current_player": current_player,
            "game_status": "playing"
        }
    })
    .to_string()
}

#[test]
fn create_room_connects_to_room_socket() {
    let mut client = client();

    let actions = client.on_user_command(UserCommand::CreateRoom);
    assert!(client.is_loading());
    let request = request_of(&actions);

    let actions = client.on_room_assigned(request, RoomRequest::Create, assignment());
    let (_, url) = connect_of(&actions);
    assert_eq!(url, "ws://localhost:8000/ws/ROOM42/player-x");
    assert!(!client.is_loading());
    assert_eq!(client.connection_state(), ConnectionState::Connecting);
    assert_eq!(client.store().my_symbol(), Some(Mark::X));
    assert_eq!(
        notices(&actions),
        vec![(
            "Room created! Share the room ID with your friend.".to_string(),
            Severity::Success
        )]
    );
}

#[test]
fn open_announces_connection() {
    let mut client = client();
    let actions = client.on_user_command(UserCommand::CreateRoom);
    let request = request_of(&actions);
    let actions = client.on_room_assigned(request, RoomRequest::Create, assignment());
    let (token, _) = connect_of(&actions);

    let actions = client.on_connection_opened(token);
    assert_eq!(client.connection_state(), ConnectionState::Connected);
    assert_eq!(
        notices(&actions),
        vec![("Connected to game server".to_string(), Severity::Success)]
    );
    assert!(actions.contains(&ClientAction::Render));
}

#[test]
fn joining_plays_o() {
    let mut client = client();
    let actions = client.on_user_command(UserCommand::JoinRoom("  ROOM42 ".to_string()));
    let kind = actions
        .iter()
        .find_map(|a| match a {
            ClientAction::RequestRoom { kind, .. } => Some(kind.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        kind,
        RoomRequest::Join {
            room_id: "ROOM42".to_string()
        }
    );

    let actions = client.on_room_assigned(request_of(&actions), kind, assignment());
    assert_eq!(client.store().my_symbol(), Some(Mark::O));
    assert_eq!(
        notices(&actions),
        vec![("Joined room successfully!".to_string(), Severity::Success)]
    );
}

#[test]
fn blank_join_is_rejected_locally() {
    let mut client = client();
    let actions = client.on_user_command(UserCommand::JoinRoom("   ".to_string()));
    assert!(!client.is_loading());
    assert!(
        !actions
            .iter()
            .any(|a| matches!(a, ClientAction::RequestRoom { .. }))
    );
    assert_eq!(
        notices(&actions),
        vec![("Please enter a room ID".to_string(), Severity::Error)]
    );
}

#[test]
fn api_failure_uses_detail_or_fallback() {
    let mut client = client();

    let actions = client.on_user_command(UserCommand::JoinRoom("NOPE".to_string()));
    let kind = RoomRequest::Join {
        room_id: "NOPE".to_string(),
    };
    let error = ApiError::new("HTTP 404 Not Found").with_detail("Room not found");
    let actions = client.on_room_request_failed(request_of(&actions), kind.clone(), &error);
    assert_eq!(
        notices(&actions),
        vec![("Room not found".to_string(), Severity::Error)]
    );
    assert!(!client.store().in_room());

    let actions = client.on_user_command(UserCommand::JoinRoom("NOPE".to_string()));
    let error = ApiError::new("HTTP error: connection refused");
    let actions = client.on_room_request_failed(request_of(&actions), kind, &error);
    assert_eq!(
        notices(&actions),
        vec![(
            "Failed to join room. Please check the room ID.".to_string(),
            Severity::Error
        )]
    );
    assert!(!client.is_loading());
}

#[test]
fn superseded_room_response_is_ignored() {
    let mut client = client();
    let first = request_of(&client.on_user_command(UserCommand::CreateRoom));
    let second = request_of(&client.on_user_command(UserCommand::CreateRoom));
    assert_ne!(first, second);

    let actions = client.on_room_assigned(first, RoomRequest::Create, assignment());
    assert!(actions.is_empty());
    assert!(!client.store().in_room());

    let actions = client.on_room_assigned(second, RoomRequest::Create, assignment());
    assert!(client.store().in_room());
    connect_of(&actions);
}

#[test]
fn legal_move_sends_exactly_one_frame() {
    let mut client = client();
    let token = created_and_open(&mut client);
    client.on_frame(
        token,
        &playing_frame("X", ["", "", "", "", "", "", "", "", ""]),
        Instant::now(),
    );
    assert!(client.store().is_my_turn());

    let actions = client.on_user_command(UserCommand::MakeMove(4));
    assert_eq!(
        sends(&actions),
        vec![serde_json::json!({"type": "make_move", "position": 4})]
    );
}

#[test]
fn illegal_moves_are_silent() {
    let mut client = client();
    let token = created_and_open(&mut client);

    // Waiting for an opponent.
    assert!(client.on_user_command(UserCommand::MakeMove(0)).is_empty());

    // Opponent's turn.
    client.on_frame(
        token,
        &playing_frame("O", ["X", "", "", "", "", "", "", "", ""]),
        Instant::now(),
    );
    assert!(client.on_user_command(UserCommand::MakeMove(1)).is_empty());

    // Our turn, occupied cell and off-board cell.
    client.on_frame(
        token,
        &playing_frame("X", ["X", "O", "", "", "", "", "", "", ""]),
        Instant::now(),
    );
    assert!(client.on_user_command(UserCommand::MakeMove(1)).is_empty());
    assert!(client.on_user_command(UserCommand::MakeMove(9)).is_empty());
}

#[test]
fn game_update_replaces_state_and_notifies() {
    let mut client = client();
    let token = created_and_open(&mut client);

    let actions = client.on_frame(
        token,
        &playing_frame("O", ["X", "", "", "", "", "", "", "", ""]),
        Instant::now(),
    );
    assert_eq!(client.store().current_player(), Mark::O);
    assert_eq!(client.store().status(), GameStatus::Playing);
    assert_eq!(client.store().board().get(0).and_then(|c| c.mark()), Some(Mark::X));
    assert_eq!(
        notices(&actions),
        vec![("Opponent made a move!".to_string(), Severity::Success)]
    );
    assert!(actions.contains(&ClientAction::Render));
}

#[test]
fn server_error_keeps_session_open() {
    let mut client = client();
    let token = created_and_open(&mut client);

    let actions = client.on_frame(
        token,
        r#"{"type":"error","message":"Not your turn"}"#,
        Instant::now(),
    );
    assert_eq!(
        notices(&actions),
        vec![("Not your turn".to_string(), Severity::Error)]
    );
    assert_eq!(client.connection_state(), ConnectionState::Connected);
}

#[test]
fn garbage_frames_are_dropped() {
    let mut client = client();
    let token = created_and_open(&mut client);
    let before = client.store().snapshot().clone();

    assert!(client.on_frame(token, "not json", Instant::now()).is_empty());
    assert!(
        client
            .on_frame(token, r#"{"type":"game_update"}"#, Instant::now())
            .is_empty()
    );
    assert!(
        client
            .on_frame(token, r#"{"type":"chat","message":"hi"}"#, Instant::now())
            .is_empty()
    );
    assert_eq!(client.store().snapshot(), &before);
}

#[test]
fn reset_is_silent_while_disconnected() {
    let mut client = client();
    assert!(client.on_user_command(UserCommand::ResetGame).is_empty());

    let token = created_and_open(&mut client);
    let actions = client.on_user_command(UserCommand::ResetGame);
    assert_eq!(sends(&actions), vec![serde_json::json!({"type": "reset_game"})]);

    client.on_connection_closed(token);
    assert!(client.on_user_command(UserCommand::ResetGame).is_empty());
}

#[test]
fn move_after_connection_drop_reports_loss() {
    let mut client = client();
    let token = created_and_open(&mut client);
    client.on_frame(
        token,
        &playing_frame("X", ["", "", "", "", "", "", "", "", ""]),
        Instant::now(),
    );
    client.on_connection_closed(token);

    let actions = client.on_user_command(UserCommand::MakeMove(4));
    assert!(sends(&actions).is_empty());
    assert_eq!(
        notices(&actions),
        vec![(CONNECTION_LOST_MESSAGE.to_string(), Severity::Error)]
    );
}

#[test]
fn close_schedules_linear_backoff_and_reopens() {
    let mut client = client();
    let token = created_and_open(&mut client);

    let actions = client.on_connection_closed(token);
    assert_eq!(
        notices(&actions),
        vec![("Reconnecting... (1/5)".to_string(), Severity::Error)]
    );
    let (backoff, delay) = actions
        .iter()
        .find_map(|a| match a {
            ClientAction::ScheduleReconnect { token, delay } => Some((*token, *delay)),
            _ => None,
        })
        .unwrap();
    assert_eq!(delay, Duration::from_secs(2));

    let actions = client.on_reconnect_due(backoff);
    let (reopened, url) = connect_of(&actions);
    assert_ne!(reopened, token);
    assert_eq!(url, "ws://localhost:8000/ws/ROOM42/player-x");

    client.on_connection_opened(reopened);
    assert_eq!(client.supervisor().attempts(), 0);
    assert_eq!(client.supervisor().state(), SupervisorState::Idle);
}

#[test]
fn gives_up_after_five_failed_attempts() {
    let mut client = client();
    let mut token = created_and_open(&mut client);
    let mut connects = 0;
    let mut lost_notices = 0;

    loop {
        let actions = client.on_connection_closed(token);
        lost_notices += notices(&actions)
            .iter()
            .filter(|(m, _)| m == CONNECTION_LOST_MESSAGE)
            .count();
        let Some((backoff, delay)) = actions.iter().find_map(|a| match a {
            ClientAction::ScheduleReconnect { token, delay } => Some((*token, *delay)),
            _ => None,
        }) else {
            break;
        };
        assert_eq!(delay, Duration::from_secs(2) * (connects + 1));
        let (next, _) = connect_of(&client.on_reconnect_due(backoff));
        connects += 1;
        token = next;
    }

    assert_eq!(connects, 5);
    assert_eq!(lost_notices, 1);
    assert!(client.supervisor().is_exhausted());

    // Nothing further happens on stray events.
    assert!(client.on_connection_closed(token).is_empty());
}

#[test]
fn stale_events_are_ignored() {
    let mut client = client();
    let old = created_and_open(&mut client);
    client.on_connection_closed(old);

    assert!(client.on_connection_opened(old).is_empty());
    assert!(
        client
            .on_frame(old, &playing_frame("X", [""; 9]), Instant::now())
            .is_empty()
    );
    assert!(client.on_connection_error(old, "late").is_empty());
    assert!(client.on_connection_closed(old).is_empty());
}

#[test]
fn leave_room_cancels_pending_reconnect() {
    let mut client = client();
    let token = created_and_open(&mut client);
    let actions = client.on_connection_closed(token);
    let backoff = actions
        .iter()
        .find_map(|a| match a {
            ClientAction::ScheduleReconnect { token, .. } => Some(*token),
            _ => None,
        })
        .unwrap();

    let actions = client.on_user_command(UserCommand::LeaveRoom);
    assert_eq!(
        notices(&actions),
        vec![("Left the room".to_string(), Severity::Success)]
    );
    assert!(!client.store().in_room());
    assert_eq!(client.store().status(), GameStatus::Waiting);

    assert!(client.on_reconnect_due(backoff).is_empty());
}

#[test]
fn leave_room_releases_live_connection() {
    let mut client = client();
    let token = created_and_open(&mut client);

    let actions = client.on_user_command(UserCommand::LeaveRoom);
    assert!(actions.contains(&ClientAction::Disconnect { token }));
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);

    // The socket's own close arrives later and must not trigger a reconnect.
    assert!(client.on_connection_closed(token).is_empty());
}

#[test]
fn connection_error_is_reported() {
    let mut client = client();
    let token = created_and_open(&mut client);
    let actions = client.on_connection_error(token, "reset by peer");
    assert_eq!(
        notices(&actions),
        vec![("Connection error".to_string(), Severity::Error)]
    );
}

#[test]
fn heartbeat_pings_only_when_connected() {
    let mut client = client();
    assert!(client.handle(ClientEvent::HeartbeatTick, Instant::now()).is_empty());

    let token = created_and_open(&mut client);
    let actions = client.handle(ClientEvent::HeartbeatTick, Instant::now());
    assert_eq!(sends(&actions), vec![serde_json::json!({"type": "ping"})]);
    assert_eq!(client.heartbeat().pings_sent(), 1);

    let now = Instant::now();
    let actions = client.on_frame(token, r#"{"type":"pong"}"#, now);
    assert!(actions.is_empty());
    assert_eq!(client.heartbeat().last_pong(), Some(now));
}

#[test]
fn heartbeat_is_silent_while_connecting() {
    let mut client = client();
    let actions = client.on_user_command(UserCommand::CreateRoom);
    let request = request_of(&actions);
    client.on_room_assigned(request, RoomRequest::Create, assignment());
    assert_eq!(client.connection_state(), ConnectionState::Connecting);

    let actions = client.handle(ClientEvent::HeartbeatTick, Instant::now());
    assert!(
        !actions
            .iter()
            .any(|a| matches!(a, ClientAction::Send { .. }))
    );
    assert_eq!(client.heartbeat().pings_sent(), 0);
}

#[test]
fn zero_heartbeat_interval_is_clamped() {
    let monitor = HeartbeatMonitor::new(Duration::ZERO);
    assert!(monitor.interval() > Duration::ZERO);
    assert_eq!(monitor.interval(), HeartbeatMonitor::MIN_INTERVAL);

    let client = GameClient::new(
        Endpoint::parse("http://localhost:8000").unwrap(),
        monitor,
        ReconnectPolicy::default(),
        NotificationCenter::default(),
    );
    assert!(client.heartbeat().interval() > Duration::ZERO);
}

#[test]
fn expired_notification_is_dismissed_once() {
    let mut client = client();
    let actions = client.on_user_command(UserCommand::JoinRoom(String::new()));
    let id = match &actions[0] {
        ClientAction::Notify { notification, dismiss_after } => {
            assert_eq!(*dismiss_after, Duration::from_secs(3));
            notification.id
        }
        other => panic!("unexpected action {other:?}"),
    };

    assert_eq!(
        client.handle(ClientEvent::NotificationExpired { id }, Instant::now()),
        vec![ClientAction::Render]
    );
    assert!(client.notification().is_none());
    assert!(
        client
            .handle(ClientEvent::NotificationExpired { id }, Instant::now())
            .is_empty()
    );
}

#[test]
fn newer_notification_survives_older_timer() {
    let mut client = client();
    let first = client.on_user_command(UserCommand::JoinRoom(String::new()));
    let first_id = match &first[0] {
        ClientAction::Notify { notification, .. } => notification.id,
        other => panic!("unexpected action {other:?}"),
    };
    client.on_user_command(UserCommand::JoinRoom(String::new()));

    assert!(client.on_notification_expired(first_id).is_empty());
    assert!(client.notification().is_some());
}
