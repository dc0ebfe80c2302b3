//! Tests for the game state store.

use tictactoe_online::{
    Board, Cell, GameSnapshot, GameStateStore, GameStatus, LastMove, LocalIdentity, Mark,
    SessionIdentity,
};

fn store_as(mark: Mark) -> GameStateStore {
    let mut store = GameStateStore::new();
    store
        .enter_room(
            SessionIdentity::new("ROOM42".to_string(), "p1".to_string()),
            LocalIdentity::playing(mark),
        )
        .unwrap();
    store
}

fn board_with(cells: &[(usize, Mark)]) -> Board {
    let mut all = [Cell::Empty; 9];
    for (pos, mark) in cells {
        all[*pos] = Cell::Occupied(*mark);
    }
    Board::from_cells(all)
}

#[test]
fn applied_snapshot_is_read_back() {
    let mut store = store_as(Mark::X);
    let snapshot = GameSnapshot::new(board_with(&[(0, Mark::X)]), Mark::O, GameStatus::Playing)
        .with_last_move(LastMove::new(0, Mark::X));

    store.apply_snapshot(snapshot.clone());

    assert_eq!(store.snapshot(), &snapshot);
    assert_eq!(store.board(), snapshot.board());
    assert_eq!(store.current_player(), Mark::O);
    assert_eq!(store.status(), GameStatus::Playing);
    assert_eq!(store.last_move(), Some(LastMove::new(0, Mark::X)));
}

#[test]
fn snapshot_is_replaced_not_merged() {
    let mut store = store_as(Mark::X);
    store.apply_snapshot(
        GameSnapshot::new(board_with(&[(0, Mark::X)]), Mark::O, GameStatus::Won)
            .with_last_move(LastMove::new(0, Mark::X))
            .with_winning_combo([0, 1, 2]),
    );

    store.apply_snapshot(GameSnapshot::new(Board::new(), Mark::X, GameStatus::Playing));

    assert_eq!(store.last_move(), None);
    assert_eq!(store.winning_combo(), None);
    assert!(store.board().is_empty(0));
}

#[test]
fn moves_are_illegal_unless_playing() {
    let mut store = store_as(Mark::X);
    for status in [GameStatus::Waiting, GameStatus::Won, GameStatus::Draw] {
        store.apply_snapshot(GameSnapshot::new(Board::new(), Mark::X, status));
        for pos in 0..9 {
            assert!(!store.is_legal_move(pos), "{status} allowed move {pos}");
        }
    }
}

#[test]
fn legal_move_needs_our_turn_and_free_cell() {
    let mut store = store_as(Mark::X);
    store.apply_snapshot(GameSnapshot::new(
        board_with(&[(4, Mark::O)]),
        Mark::X,
        GameStatus::Playing,
    ));
    assert!(store.is_my_turn());
    assert!(store.is_legal_move(0));
    assert!(!store.is_legal_move(4));
    assert!(!store.is_legal_move(9));

    store.apply_snapshot(GameSnapshot::new(Board::new(), Mark::O, GameStatus::Playing));
    assert!(!store.is_my_turn());
    assert!(!store.is_legal_move(0));
}

#[test]
fn winner_is_last_mover_when_won() {
    let mut store = store_as(Mark::O);
    store.apply_snapshot(
        GameSnapshot::new(
            board_with(&[(0, Mark::X), (1, Mark::X), (2, Mark::X)]),
            Mark::O,
            GameStatus::Won,
        )
        .with_last_move(LastMove::new(2, Mark::X))
        .with_winning_combo([0, 1, 2]),
    );
    assert_eq!(store.winner(), Some(Mark::X));
    assert_eq!(store.status_text(), "X wins!");

    store.apply_snapshot(
        GameSnapshot::new(Board::new(), Mark::O, GameStatus::Playing)
            .with_last_move(LastMove::new(2, Mark::X)),
    );
    assert_eq!(store.winner(), None);
}

#[test]
fn reset_restores_initial_state() {
    let mut store = store_as(Mark::O);
    store.apply_snapshot(GameSnapshot::new(
        board_with(&[(0, Mark::X)]),
        Mark::O,
        GameStatus::Playing,
    ));

    store.reset();

    assert!(store.board().cells().iter().all(|c| *c == Cell::Empty));
    assert_eq!(store.status(), GameStatus::Waiting);
    assert_eq!(store.current_player(), Mark::X);
    assert!(store.session().is_none());
    assert!(store.my_symbol().is_none());
    assert!(!store.in_room());
}

#[test]
fn entering_twice_fails() {
    let mut store = store_as(Mark::X);
    let result = store.enter_room(
        SessionIdentity::new("OTHER".to_string(), "p2".to_string()),
        LocalIdentity::joiner(),
    );
    assert!(result.is_err());
    assert_eq!(store.session().unwrap().room_id, "ROOM42");
}

#[test]
fn status_text_follows_status() {
    let mut store = store_as(Mark::X);
    assert_eq!(store.status_text(), "Waiting for opponent...");

    store.apply_snapshot(GameSnapshot::new(Board::new(), Mark::X, GameStatus::Playing));
    assert_eq!(store.status_text(), "Your turn!");

    store.apply_snapshot(GameSnapshot::new(Board::new(), Mark::O, GameStatus::Playing));
    assert_eq!(store.status_text(), "Opponent's turn");

    store.apply_snapshot(GameSnapshot::new(Board::new(), Mark::X, GameStatus::Draw));
    assert_eq!(store.status_text(), "It's a draw!");
}
