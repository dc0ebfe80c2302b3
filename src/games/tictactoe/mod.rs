mod types;

pub use types::{
    BOARD_CELLS, Board, Cell, GameSnapshot, GameStatus, LastMove, Mark, RoomPlayer,
};
