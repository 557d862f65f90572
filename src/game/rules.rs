use serde::{Deserialize, Serialize};
use std::fmt;

use super::state::{
    Board, CellIndex, GameEvent, GameState, GameStatus, IntegrityError, Player, BOARD_SIZE,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum RuleError {
    GameFinished,
    OutOfRange {
        index: CellIndex,
    },
    CellOccupied {
        index: CellIndex,
        occupant: Player,
    },
    IntegrityViolation {
        error: IntegrityError,
    },
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleError::GameFinished => f.write_str("the game is already over"),
            RuleError::OutOfRange { index } => write!(f, "cell {index} is off the board"),
            RuleError::CellOccupied { index, occupant } => {
                write!(f, "cell {index} is already taken by {occupant}")
            }
            RuleError::IntegrityViolation { error } => write!(f, "invalid board: {error}"),
        }
    }
}

impl std::error::Error for RuleError {}

impl From<IntegrityError> for RuleError {
    fn from(error: IntegrityError) -> Self {
        RuleError::IntegrityViolation { error }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleResolution {
    pub state: GameState,
    pub events: Vec<GameEvent>,
    pub status: GameStatus,
}

impl RuleResolution {
    pub fn new(state: GameState, events: Vec<GameEvent>) -> Self {
        let status = state.status;
        Self {
            state,
            events,
            status,
        }
    }
}

/// 由棋盘推导结果：先看成线，再看是否下满。
pub fn evaluate_status(board: &Board) -> GameStatus {
    if let Some((winner, line)) = board.winning_line() {
        return GameStatus::Won { winner, line };
    }
    if board.is_full() {
        return GameStatus::Draw;
    }
    GameStatus::InProgress
}

#[derive(Debug, Default)]
pub struct RuleEngine;

impl RuleEngine {
    fn ensure_in_progress(state: &GameState) -> Result<(), RuleError> {
        if state.is_finished() {
            return Err(RuleError::GameFinished);
        }
        Ok(())
    }

    fn ensure_on_board(index: CellIndex) -> Result<(), RuleError> {
        if index >= BOARD_SIZE {
            return Err(RuleError::OutOfRange { index });
        }
        Ok(())
    }

    fn ensure_vacant(state: &GameState, index: CellIndex) -> Result<(), RuleError> {
        match state.board.get(index).and_then(|cell| cell.owner()) {
            Some(occupant) => Err(RuleError::CellOccupied { index, occupant }),
            None => Ok(()),
        }
    }

    /// 当前行动方在 `index` 落子。
    ///
    /// 校验失败时状态保持不变。成线或下满则对局结束，否则交换行动方。
    pub fn apply_move(state: &mut GameState, index: CellIndex) -> Result<Vec<GameEvent>, RuleError> {
        Self::ensure_in_progress(state)?;
        Self::ensure_on_board(index)?;
        Self::ensure_vacant(state, index)?;

        let player = state.current_player;
        state.board.place(index, player);
        state.history.push(index);

        let mut events = vec![GameEvent::MovePlayed { player, index }];
        state.status = evaluate_status(&state.board);

        match state.status {
            GameStatus::Won { winner, line } => {
                events.push(GameEvent::GameWon { winner, line });
            }
            GameStatus::Draw => events.push(GameEvent::GameDrawn),
            GameStatus::InProgress => {
                state.current_player = player.opponent();
                events.push(GameEvent::TurnPassed {
                    next: state.current_player,
                });
            }
        }

        Ok(events)
    }

    pub fn resolve(state: &mut GameState, index: CellIndex) -> Result<RuleResolution, RuleError> {
        let events = Self::apply_move(state, index)?;
        Ok(RuleResolution::new(state.clone(), events))
    }
}
