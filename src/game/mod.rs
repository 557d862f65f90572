//! 对局核心逻辑（棋盘、状态机、落子规则）。

pub mod rules;
pub mod state;

pub use rules::{evaluate_status, RuleEngine, RuleError, RuleResolution};
pub use state::{
    Board,
    Cell,
    CellIndex,
    GameEvent,
    GameState,
    GameStatus,
    IntegrityError,
    Player,
    WinLine,
    BOARD_SIZE,
    CENTER,
    CORNERS,
    EDGES,
    OPPOSITE_CORNERS,
    WIN_LINES,
};
