pub mod ai;
pub mod game;
pub mod session;
pub mod utils;

use gloo_timers::future::TimeoutFuture;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::js_sys::Promise;

pub use ai::{
    AiAgent, AiConfig, AiDecision, AiDifficulty, AiError, AiStrategy, HeuristicRule,
    SearchOutcome,
};
pub use game::{
    Board, Cell, CellIndex, GameEvent, GameState, GameStatus, IntegrityError, Player, RuleEngine,
    RuleError, RuleResolution, WinLine, WIN_LINES,
};
pub use session::{ComputerTurn, MatchSettings, Scoreboard, Session, SessionError};

#[cfg(all(feature = "wee_alloc", target_arch = "wasm32"))]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

#[wasm_bindgen(start)]
pub fn start() {
    utils::set_panic_hook();
}

fn to_js_error<E: Serialize>(error: E) -> JsValue {
    to_value(&error).unwrap_or_else(|serialize_err| JsValue::from_str(&serialize_err.to_string()))
}

fn serde_to_js_error<E: std::fmt::Display>(error: E) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(serde_to_js_error)
}

fn parse_settings(settings_json: Option<String>) -> Result<MatchSettings, JsValue> {
    match settings_json {
        Some(json) => serde_json::from_str(&json).map_err(serde_to_js_error),
        None => Ok(MatchSettings::default()),
    }
}

fn parse_difficulty(value: &str) -> Result<AiDifficulty, JsValue> {
    AiDifficulty::from_str(value)
        .map_err(|_| JsValue::from_str(&format!("unknown difficulty: {value}")))
}

fn parse_player(value: &str) -> Result<Player, JsValue> {
    Player::from_str(value).map_err(|_| JsValue::from_str(&format!("unknown player: {value}")))
}

/// 校验前端传来的棋盘，并推出行动方与对局状态。
fn state_from_js(board: JsValue) -> Result<GameState, JsValue> {
    let board: Board = from_value(board).map_err(JsValue::from)?;
    GameState::from_board(board)
        .map_err(|error| to_js_error(RuleError::IntegrityViolation { error }))
}

/// 页面持有的对局句柄。
#[wasm_bindgen]
pub struct TicTacToe {
    session: Session,
}

#[wasm_bindgen]
impl TicTacToe {
    #[wasm_bindgen(constructor)]
    pub fn new(settings_json: Option<String>) -> Result<TicTacToe, JsValue> {
        let settings = parse_settings(settings_json)?;
        Ok(TicTacToe {
            session: Session::new(settings),
        })
    }

    /// 固定随机种子，便于复现电脑的走法。
    pub fn with_seed(settings_json: Option<String>, seed: u64) -> Result<TicTacToe, JsValue> {
        let settings = parse_settings(settings_json)?;
        Ok(TicTacToe {
            session: Session::with_seed(settings, seed),
        })
    }

    pub fn state_json(&self) -> Result<String, JsValue> {
        to_json(self.session.state())
    }

    pub fn scores_json(&self) -> Result<String, JsValue> {
        to_json(&self.session.scores())
    }

    pub fn settings_json(&self) -> Result<String, JsValue> {
        to_json(self.session.settings())
    }

    pub fn play(&mut self, index: usize) -> Result<String, JsValue> {
        let resolution = self.session.play(index).map_err(to_js_error)?;
        to_json(&resolution)
    }

    pub fn computer_turn_pending(&self) -> bool {
        self.session.computer_turn_pending()
    }

    /// 轮到电脑时落子并返回 `{ decision, applied }`，否则返回 `null`。
    pub fn computer_move(&mut self) -> Result<String, JsValue> {
        let turn = self.session.play_computer().map_err(to_js_error)?;
        to_json(&turn)
    }

    /// 延迟 `delay_ms` 后给出当前行动方的建议走法，不修改对局。
    pub fn think_ai(&mut self, delay_ms: Option<u32>) -> Promise {
        let board = self.session.state().board;
        let player = self.session.state().current_player;
        let mut agent = self.session.fork_agent();
        let delay = delay_ms.unwrap_or(0);

        future_to_promise(async move {
            if delay > 0 {
                TimeoutFuture::new(delay).await;
            }
            let decision = agent.decide_move(&board, player).map_err(to_js_error)?;
            let json = to_json(&decision)?;
            Ok(JsValue::from_str(&json))
        })
    }

    pub fn restart(&mut self) {
        self.session.restart();
    }

    pub fn reset_scores(&mut self) {
        self.session.reset_scores();
    }

    pub fn set_difficulty(&mut self, difficulty: &str) -> Result<(), JsValue> {
        let difficulty = parse_difficulty(difficulty)?;
        self.session.set_difficulty(difficulty);
        Ok(())
    }

    pub fn set_vs_computer(&mut self, enabled: bool) {
        self.session.set_vs_computer(enabled);
    }
}

/// 无状态接口：为给定棋盘计算电脑走法。`player` 缺省时按落子数推断，
/// 无法识别的 `player` 或 `difficulty` 直接报错。
#[wasm_bindgen(js_name = "computeAiMove")]
pub fn compute_ai_move(
    board: JsValue,
    player: Option<String>,
    difficulty: Option<String>,
) -> Result<JsValue, JsValue> {
    let state = state_from_js(board)?;
    let player = match player.as_deref() {
        Some(value) => parse_player(value)?,
        None => state.current_player,
    };
    let difficulty = match difficulty.as_deref() {
        Some(value) => parse_difficulty(value)?,
        None => AiDifficulty::default(),
    };

    let mut agent = AiAgent::new(AiConfig::from_difficulty(difficulty));
    let decision = agent.decide_move(&state.board, player).map_err(to_js_error)?;
    to_value(&decision).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "evaluateBoard")]
pub fn evaluate_board(board: JsValue) -> Result<JsValue, JsValue> {
    let state = state_from_js(board)?;
    to_value(&state.status()).map_err(JsValue::from)
}

#[wasm_bindgen(js_name = "validateBoard")]
pub fn validate_board(board: JsValue) -> Result<(), JsValue> {
    state_from_js(board).map(|_| ())
}
