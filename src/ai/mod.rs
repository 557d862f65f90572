//! 电脑对手（随机、启发式规则链、alpha-beta 极小化极大搜索）。

pub mod heuristic;
pub mod minimax;

pub use heuristic::HeuristicRule;
pub use minimax::{
    best_move, AiAgent, AiConfig, AiDecision, AiDifficulty, AiError, AiStrategy, SearchOutcome,
};
