use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::heuristic::{self, HeuristicRule};
use crate::game::{evaluate_status, Board, CellIndex, GameStatus, Player, BOARD_SIZE, CORNERS};

/// 终局评分：行动方成线 +10，对手成线 -10，平局 0，不随深度衰减。
pub const WIN_SCORE: i32 = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiStrategy {
    Random,
    Heuristic,
    Minimax,
}

impl FromStr for AiStrategy {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(AiStrategy::Random),
            "heuristic" | "strategic" => Ok(AiStrategy::Heuristic),
            "minimax" | "optimal" | "best" => Ok(AiStrategy::Minimax),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AiDifficulty {
    Easy,
    Medium,
    Hard,
    Impossible,
}

impl Default for AiDifficulty {
    fn default() -> Self {
        AiDifficulty::Easy
    }
}

impl FromStr for AiDifficulty {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(AiDifficulty::Easy),
            "medium" | "normal" => Ok(AiDifficulty::Medium),
            "hard" => Ok(AiDifficulty::Hard),
            "impossible" | "expert" => Ok(AiDifficulty::Impossible),
            _ => Err(()),
        }
    }
}

/// 决策策略：以 `confidence` 的概率采用 `strategy`，否则退回 `fallback`。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiConfig {
    pub strategy: AiStrategy,
    pub fallback: AiStrategy,
    pub confidence: f64,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: AiDifficulty) -> Self {
        match difficulty {
            AiDifficulty::Easy => Self {
                strategy: AiStrategy::Random,
                fallback: AiStrategy::Random,
                confidence: 1.0,
            },
            AiDifficulty::Medium => Self {
                strategy: AiStrategy::Heuristic,
                fallback: AiStrategy::Random,
                confidence: 0.7,
            },
            AiDifficulty::Hard => Self {
                strategy: AiStrategy::Minimax,
                fallback: AiStrategy::Heuristic,
                confidence: 0.9,
            },
            AiDifficulty::Impossible => Self {
                strategy: AiStrategy::Minimax,
                fallback: AiStrategy::Minimax,
                confidence: 1.0,
            },
        }
    }

    pub fn with_strategy(mut self, strategy: AiStrategy) -> Self {
        self.strategy = strategy;
        self.fallback = strategy;
        self.confidence = 1.0;
        self
    }

    fn pick_strategy<R: Rng + ?Sized>(&self, rng: &mut R) -> AiStrategy {
        if self.strategy == self.fallback || self.confidence >= 1.0 {
            return self.strategy;
        }
        if rng.gen::<f64>() < self.confidence {
            self.strategy
        } else {
            self.fallback
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig::from_difficulty(AiDifficulty::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiDecision {
    pub cell: CellIndex,
    pub strategy: AiStrategy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<HeuristicRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<i32>,
    pub nodes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum AiError {
    NoAvailableMoves,
    GameOver { status: GameStatus },
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AiError::NoAvailableMoves => f.write_str("asked for a move on a full board"),
            AiError::GameOver { .. } => f.write_str("asked for a move after the game ended"),
        }
    }
}

impl std::error::Error for AiError {}

/// 一次完整搜索的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOutcome {
    pub cell: CellIndex,
    pub score: i32,
    pub nodes: u64,
}

struct SearchStats {
    nodes: u64,
}

impl SearchStats {
    fn new() -> Self {
        Self { nodes: 0 }
    }
}

pub struct AiAgent {
    config: AiConfig,
    rng: SmallRng,
}

impl AiAgent {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            rng: SmallRng::from_entropy(),
        }
    }

    pub fn with_seed(config: AiConfig, seed: u64) -> Self {
        Self {
            config,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: AiConfig) {
        self.config = config;
    }

    /// 派生一个独立的代理，种子取自本代理的随机数流，固定种子时结果可复现。
    pub fn fork(&mut self) -> AiAgent {
        AiAgent::with_seed(self.config.clone(), self.rng.gen())
    }

    /// 为 `player` 选择一个空格。对已结束或已满的棋盘调用属于调用方错误。
    pub fn decide_move(&mut self, board: &Board, player: Player) -> Result<AiDecision, AiError> {
        match evaluate_status(board) {
            GameStatus::InProgress => {}
            GameStatus::Draw => {
                crate::console_warn!("[ai] no empty cell on {board}");
                return Err(AiError::NoAvailableMoves);
            }
            status @ GameStatus::Won { .. } => {
                crate::console_warn!("[ai] game already decided on {board}");
                return Err(AiError::GameOver { status });
            }
        }

        let decision = match self.config.pick_strategy(&mut self.rng) {
            AiStrategy::Random => self.random_decision(board),
            AiStrategy::Heuristic => self.heuristic_decision(board, player),
            AiStrategy::Minimax => self.search_decision(board, player),
        }?;

        crate::console_log!(
            "[ai] {player} on {board}: cell {} via {:?} ({} nodes)",
            decision.cell,
            decision.strategy,
            decision.nodes
        );
        Ok(decision)
    }

    fn random_decision(&mut self, board: &Board) -> Result<AiDecision, AiError> {
        let cell = heuristic::random_move(board, &mut self.rng).ok_or(AiError::NoAvailableMoves)?;
        Ok(AiDecision {
            cell,
            strategy: AiStrategy::Random,
            rule: None,
            evaluation: None,
            nodes: 0,
        })
    }

    fn heuristic_decision(&mut self, board: &Board, player: Player) -> Result<AiDecision, AiError> {
        let (cell, rule) = heuristic::strategic_move(board, player, &mut self.rng)
            .ok_or(AiError::NoAvailableMoves)?;
        Ok(AiDecision {
            cell,
            strategy: AiStrategy::Heuristic,
            rule: Some(rule),
            evaluation: None,
            nodes: 0,
        })
    }

    fn search_decision(&mut self, board: &Board, player: Player) -> Result<AiDecision, AiError> {
        // 空棋盘直接随机占角，省掉整棵树的搜索
        if board.is_blank() {
            let cell = *CORNERS
                .choose(&mut self.rng)
                .ok_or(AiError::NoAvailableMoves)?;
            return Ok(AiDecision {
                cell,
                strategy: AiStrategy::Minimax,
                rule: None,
                evaluation: None,
                nodes: 0,
            });
        }

        let mut scratch = *board;
        let outcome = best_move(&mut scratch, player).ok_or(AiError::NoAvailableMoves)?;
        debug_assert_eq!(scratch, *board, "search must revert every probe");

        Ok(AiDecision {
            cell: outcome.cell,
            strategy: AiStrategy::Minimax,
            rule: None,
            evaluation: Some(outcome.score),
            nodes: outcome.nodes,
        })
    }
}

/// 带 alpha-beta 剪枝的完整搜索，`player` 为极大方。
///
/// 取严格最大分，同分保留索引最小的格子。返回时 `board` 与调用前一致。
pub fn best_move(board: &mut Board, player: Player) -> Option<SearchOutcome> {
    let mut stats = SearchStats::new();
    let mut best: Option<(CellIndex, i32)> = None;
    let mut alpha = i32::MIN;
    let beta = i32::MAX;

    for index in 0..BOARD_SIZE {
        if !board.is_empty(index) {
            continue;
        }
        let score = board.with_probe(index, player, |b| {
            minimax_rec(b, player, player.opponent(), alpha, beta, &mut stats)
        });
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((index, score));
        }
        alpha = alpha.max(score);
    }

    best.map(|(cell, score)| SearchOutcome {
        cell,
        score,
        nodes: stats.nodes,
    })
}

fn terminal_score(board: &Board, root: Player) -> Option<i32> {
    if board.has_line(root) {
        return Some(WIN_SCORE);
    }
    if board.has_line(root.opponent()) {
        return Some(-WIN_SCORE);
    }
    if board.is_full() {
        return Some(0);
    }
    None
}

fn minimax_rec(
    board: &mut Board,
    root: Player,
    to_move: Player,
    mut alpha: i32,
    mut beta: i32,
    stats: &mut SearchStats,
) -> i32 {
    stats.nodes += 1;

    if let Some(score) = terminal_score(board, root) {
        return score;
    }

    if to_move == root {
        let mut value = i32::MIN;
        for index in 0..BOARD_SIZE {
            if !board.is_empty(index) {
                continue;
            }
            let score = board.with_probe(index, to_move, |b| {
                minimax_rec(b, root, to_move.opponent(), alpha, beta, stats)
            });
            value = value.max(score);
            alpha = alpha.max(score);
            if beta <= alpha {
                break;
            }
        }
        value
    } else {
        let mut value = i32::MAX;
        for index in 0..BOARD_SIZE {
            if !board.is_empty(index) {
                continue;
            }
            let score = board.with_probe(index, to_move, |b| {
                minimax_rec(b, root, to_move.opponent(), alpha, beta, stats)
            });
            value = value.min(score);
            beta = beta.min(score);
            if beta <= alpha {
                break;
            }
        }
        value
    }
}
