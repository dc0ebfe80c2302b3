//! Game-specific snapshot types.

pub mod tictactoe;
