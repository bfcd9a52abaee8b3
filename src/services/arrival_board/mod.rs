pub mod arrival_board;
pub mod live_boards;

pub use arrival_board::{BoardSnapshot, BoardTimings};
pub use live_boards::LiveBoards;
