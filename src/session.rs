//! 一局接一局的对战会话：棋盘状态、累计比分与电脑对手设置。

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ai::{AiAgent, AiConfig, AiDecision, AiDifficulty, AiError};
use crate::game::{CellIndex, GameState, Player, RuleEngine, RuleError, RuleResolution};

/// 双方累计胜场。重新开局不会清零。
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scoreboard {
    #[serde(rename = "X")]
    pub x: u32,
    #[serde(rename = "O")]
    pub o: u32,
}

impl Scoreboard {
    pub fn record(&mut self, winner: Player) {
        match winner {
            Player::X => self.x += 1,
            Player::O => self.o += 1,
        }
    }

    pub fn wins(&self, player: Player) -> u32 {
        match player {
            Player::X => self.x,
            Player::O => self.o,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MatchSettings {
    pub vs_computer: bool,
    pub computer: Player,
    pub difficulty: AiDifficulty,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            vs_computer: false,
            computer: Player::O,
            difficulty: AiDifficulty::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum SessionError {
    Rule { error: RuleError },
    Ai { error: AiError },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Rule { error } => write!(f, "rule error: {error}"),
            SessionError::Ai { error } => write!(f, "ai error: {error}"),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<RuleError> for SessionError {
    fn from(error: RuleError) -> Self {
        SessionError::Rule { error }
    }
}

impl From<AiError> for SessionError {
    fn from(error: AiError) -> Self {
        SessionError::Ai { error }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComputerTurn {
    pub decision: AiDecision,
    pub applied: RuleResolution,
}

pub struct Session {
    state: GameState,
    scores: Scoreboard,
    settings: MatchSettings,
    agent: AiAgent,
}

impl Session {
    pub fn new(settings: MatchSettings) -> Self {
        let agent = AiAgent::new(AiConfig::from_difficulty(settings.difficulty));
        Self::with_agent(settings, agent)
    }

    pub fn with_seed(settings: MatchSettings, seed: u64) -> Self {
        let agent = AiAgent::with_seed(AiConfig::from_difficulty(settings.difficulty), seed);
        Self::with_agent(settings, agent)
    }

    fn with_agent(settings: MatchSettings, agent: AiAgent) -> Self {
        Self {
            state: GameState::new(),
            scores: Scoreboard::default(),
            settings,
            agent,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn scores(&self) -> Scoreboard {
        self.scores
    }

    pub fn settings(&self) -> &MatchSettings {
        &self.settings
    }

    pub fn agent_config(&self) -> &AiConfig {
        self.agent.config()
    }

    /// 玩家点击格子。
    pub fn play(&mut self, index: CellIndex) -> Result<RuleResolution, RuleError> {
        let resolution = RuleEngine::resolve(&mut self.state, index).map_err(|error| {
            crate::console_warn!("[session] rejected move {index}: {error}");
            error
        })?;
        self.record_outcome();
        Ok(resolution)
    }

    pub fn computer_turn_pending(&self) -> bool {
        self.settings.vs_computer
            && !self.state.is_finished()
            && self.state.current_player == self.settings.computer
    }

    /// 轮到电脑时走一步；否则什么也不做。
    pub fn play_computer(&mut self) -> Result<Option<ComputerTurn>, SessionError> {
        if !self.computer_turn_pending() {
            return Ok(None);
        }

        let decision = self
            .agent
            .decide_move(&self.state.board, self.state.current_player)?;
        let applied = RuleEngine::resolve(&mut self.state, decision.cell)?;
        self.record_outcome();

        Ok(Some(ComputerTurn { decision, applied }))
    }

    /// 为当前行动方给出建议，不落子。
    pub fn suggest_move(&mut self) -> Result<AiDecision, AiError> {
        self.agent
            .decide_move(&self.state.board, self.state.current_player)
    }

    /// 供异步思考使用的独立代理，种子来自会话自身的代理。
    pub fn fork_agent(&mut self) -> AiAgent {
        self.agent.fork()
    }

    /// 清空棋盘重新开局，比分与设置保持不变。
    pub fn restart(&mut self) {
        self.state.reset();
    }

    pub fn reset_scores(&mut self) {
        self.scores.reset();
    }

    pub fn set_difficulty(&mut self, difficulty: AiDifficulty) {
        self.settings.difficulty = difficulty;
        self.agent.set_config(AiConfig::from_difficulty(difficulty));
    }

    pub fn set_vs_computer(&mut self, enabled: bool) {
        self.settings.vs_computer = enabled;
    }

    fn record_outcome(&mut self) {
        if let Some(winner) = self.state.status().winner() {
            self.scores.record(winner);
        }
    }
}
