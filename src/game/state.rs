use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const BOARD_SIZE: usize = 9;
pub const CENTER: CellIndex = 4;
pub const CORNERS: [CellIndex; 4] = [0, 2, 6, 8];
pub const EDGES: [CellIndex; 4] = [1, 3, 5, 7];
pub const OPPOSITE_CORNERS: [(CellIndex, CellIndex); 2] = [(0, 8), (2, 6)];

/// 棋盘格索引，按行优先 0..=8。
pub type CellIndex = usize;
/// 连成一线的三个格子。
pub type WinLine = [CellIndex; 3];

/// 固定的 8 条获胜线：三行、三列、两条对角线（顺序即判定顺序）。
pub const WIN_LINES: [WinLine; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Player {
    X,
    O,
}

impl Player {
    pub fn opponent(self) -> Self {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    pub fn mark(self) -> Cell {
        match self {
            Player::X => Cell::X,
            Player::O => Cell::O,
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Player::X
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::X => f.write_str("X"),
            Player::O => f.write_str("O"),
        }
    }
}

impl FromStr for Player {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "X" => Ok(Player::X),
            "O" => Ok(Player::O),
            _ => Err(()),
        }
    }
}

/// 单个格子的内容，JSON 中与前端保持一致：`""`、`"X"`、`"O"`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Cell {
    #[serde(rename = "")]
    Empty,
    X,
    O,
}

impl Cell {
    pub fn owner(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Player::X),
            Cell::O => Some(Player::O),
        }
    }

    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Empty
    }
}

impl From<Player> for Cell {
    fn from(player: Player) -> Self {
        player.mark()
    }
}

/// 3×3 棋盘。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Board {
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: [Cell; BOARD_SIZE]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Cell; BOARD_SIZE] {
        &self.cells
    }

    pub fn get(&self, index: CellIndex) -> Option<Cell> {
        self.cells.get(index).copied()
    }

    pub fn is_empty(&self, index: CellIndex) -> bool {
        self.get(index).map(Cell::is_empty).unwrap_or(false)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_empty())
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(index, _)| index)
    }

    pub fn count(&self, player: Player) -> usize {
        let mark = player.mark();
        self.cells.iter().filter(|cell| **cell == mark).count()
    }

    pub(crate) fn place(&mut self, index: CellIndex, player: Player) {
        self.cells[index] = player.mark();
    }

    pub(crate) fn clear(&mut self) {
        self.cells = [Cell::Empty; BOARD_SIZE];
    }

    /// 临时落子并在闭包返回后撤销。
    ///
    /// 搜索与启发式探测都通过这里修改棋盘，闭包结束时格子恢复为探测前的内容，
    /// 调用方即使随后剪枝 `break`，也不会留下残子。
    pub fn with_probe<T>(
        &mut self,
        index: CellIndex,
        player: Player,
        probe: impl FnOnce(&mut Board) -> T,
    ) -> T {
        let previous = self.cells[index];
        self.cells[index] = player.mark();
        let result = probe(self);
        self.cells[index] = previous;
        result
    }

    pub fn has_line(&self, player: Player) -> bool {
        let mark = player.mark();
        WIN_LINES
            .iter()
            .any(|line| line.iter().all(|&index| self.cells[index] == mark))
    }

    /// 按声明顺序返回第一条被占满的线。
    pub fn winning_line(&self) -> Option<(Player, WinLine)> {
        WIN_LINES.iter().find_map(|line| {
            let [a, b, c] = *line;
            let owner = self.cells[a].owner()?;
            if self.cells[b] == self.cells[a] && self.cells[c] == self.cells[a] {
                Some((owner, *line))
            } else {
                None
            }
        })
    }

    /// 根据落子数推断轮到谁：X 先手，双方交替。
    pub fn side_to_move(&self) -> Player {
        if self.count(Player::X) > self.count(Player::O) {
            Player::O
        } else {
            Player::X
        }
    }

    pub fn integrity_check(&self) -> Result<(), IntegrityError> {
        let x_count = self.count(Player::X);
        let o_count = self.count(Player::O);
        if x_count < o_count || x_count > o_count + 1 {
            return Err(IntegrityError::TurnImbalance { x_count, o_count });
        }
        if self.has_line(Player::X) && self.has_line(Player::O) {
            return Err(IntegrityError::MultipleWinners);
        }
        Ok(())
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, chunk) in self.cells.chunks(3).enumerate() {
            if row > 0 {
                f.write_str("/")?;
            }
            for cell in chunk {
                let symbol = match cell {
                    Cell::Empty => '.',
                    Cell::X => 'X',
                    Cell::O => 'O',
                };
                write!(f, "{symbol}")?;
            }
        }
        Ok(())
    }
}

/// 解析 `Display` 的输出格式，`/` 与空白会被忽略，`.`、`-`、`_` 表示空格。
impl FromStr for Board {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cells = [Cell::Empty; BOARD_SIZE];
        let mut filled = 0;
        for symbol in s.chars().filter(|c| *c != '/' && !c.is_whitespace()) {
            let cell = match symbol {
                'X' | 'x' => Cell::X,
                'O' | 'o' => Cell::O,
                '.' | '-' | '_' => Cell::Empty,
                _ => return Err(()),
            };
            *cells.get_mut(filled).ok_or(())? = cell;
            filled += 1;
        }
        if filled != BOARD_SIZE {
            return Err(());
        }
        Ok(Self { cells })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameStatus {
    InProgress,
    Won { winner: Player, line: WinLine },
    Draw,
}

impl GameStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, GameStatus::InProgress)
    }

    pub fn winner(&self) -> Option<Player> {
        match self {
            GameStatus::Won { winner, .. } => Some(*winner),
            _ => None,
        }
    }
}

impl Default for GameStatus {
    fn default() -> Self {
        GameStatus::InProgress
    }
}

/// 游戏事件流。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum GameEvent {
    MovePlayed { player: Player, index: CellIndex },
    TurnPassed { next: Player },
    GameWon { winner: Player, line: WinLine },
    GameDrawn,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum IntegrityError {
    TurnImbalance { x_count: usize, o_count: usize },
    MultipleWinners,
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityError::TurnImbalance { x_count, o_count } => {
                write!(f, "mark counts out of turn order (X={x_count}, O={o_count})")
            }
            IntegrityError::MultipleWinners => f.write_str("both players own a line"),
        }
    }
}

impl std::error::Error for IntegrityError {}

/// 对局状态：棋盘、当前行动方与结果。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameState {
    pub board: Board,
    pub current_player: Player,
    pub status: GameStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<CellIndex>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            board: Board::new(),
            current_player: Player::X,
            status: GameStatus::InProgress,
            history: Vec::new(),
        }
    }

    /// 由前端传来的棋盘快照重建状态；历史无法还原，保持为空。
    pub fn from_board(board: Board) -> Result<Self, IntegrityError> {
        board.integrity_check()?;
        let status = super::rules::evaluate_status(&board);
        Ok(Self {
            board,
            current_player: board.side_to_move(),
            status,
            history: Vec::new(),
        })
    }

    pub fn reset(&mut self) {
        self.board.clear();
        self.current_player = Player::X;
        self.status = GameStatus::InProgress;
        self.history.clear();
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}
