//! 浏览器端测试，使用 `wasm-pack test --headless --firefox` 运行。

#![cfg(target_arch = "wasm32")]

use serde_json::Value;
use tictactoe_wasm::{compute_ai_move, evaluate_board, validate_board, TicTacToe};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn parse(json: &str) -> Value {
    serde_json::from_str(json).expect("exported json should parse")
}

fn board(cells: &[&str; 9]) -> JsValue {
    serde_wasm_bindgen::to_value(cells).expect("board should convert")
}

#[wasm_bindgen_test]
fn human_move_then_computer_reply() {
    let mut game = TicTacToe::with_seed(
        Some(r#"{"vs_computer":true,"difficulty":"impossible"}"#.into()),
        7,
    )
    .expect("settings should parse");

    let resolution = parse(&game.play(4).expect("center is free"));
    assert_eq!(resolution["status"]["type"], "InProgress");
    assert!(game.computer_turn_pending());

    let turn = parse(&game.computer_move().expect("computer should move"));
    let cell = turn["decision"]["cell"].as_u64().expect("cell index");
    assert_ne!(cell, 4);
    assert_eq!(turn["applied"]["state"]["board"][cell as usize], "O");
    assert!(!game.computer_turn_pending());
}

#[wasm_bindgen_test]
fn occupied_cell_is_rejected() {
    let mut game = TicTacToe::new(None).expect("default settings");
    game.play(0).expect("first move");
    assert!(game.play(0).is_err());
    let state = parse(&game.state_json().expect("state json"));
    assert_eq!(state["current_player"], "O");
}

#[wasm_bindgen_test]
fn scores_survive_restart() {
    let mut game = TicTacToe::new(None).expect("default settings");
    for index in [0, 3, 1, 4, 2] {
        game.play(index).expect("legal move");
    }
    game.restart();
    let scores = parse(&game.scores_json().expect("scores json"));
    assert_eq!(scores["X"], 1);
    let state = parse(&game.state_json().expect("state json"));
    assert_eq!(state["board"], serde_json::json!(["", "", "", "", "", "", "", "", ""]));
}

#[wasm_bindgen_test]
fn unknown_difficulty_is_an_error() {
    let mut game = TicTacToe::new(None).expect("default settings");
    assert!(game.set_difficulty("nightmare").is_err());
    game.set_difficulty("hard").expect("hard is valid");
    let settings = parse(&game.settings_json().expect("settings json"));
    assert_eq!(settings["difficulty"], "hard");
}

#[wasm_bindgen_test]
fn stateless_helpers_accept_page_boards() {
    let threatened = board(&["X", "X", "", "", "O", "", "", "", ""]);
    let decision = compute_ai_move(threatened, Some("O".into()), Some("impossible".into()))
        .expect("decision");
    let decision: Value = serde_wasm_bindgen::from_value(decision).expect("decision value");
    assert_eq!(decision["cell"].as_f64(), Some(2.0));

    let won = board(&["O", "O", "O", "X", "X", "", "X", "", ""]);
    let status: Value =
        serde_wasm_bindgen::from_value(evaluate_board(won).expect("status")).expect("status value");
    assert_eq!(status["type"], "Won");
    assert_eq!(status["winner"], "O");

    assert!(validate_board(board(&["O", "O", "", "", "", "", "", "", ""])).is_err());
}

#[wasm_bindgen_test]
async fn think_ai_suggests_an_empty_cell() {
    let mut game = TicTacToe::with_seed(
        Some(r#"{"vs_computer":true,"difficulty":"medium"}"#.into()),
        11,
    )
    .expect("settings should parse");
    game.play(4).expect("center is free");

    let value = JsFuture::from(game.think_ai(Some(10)))
        .await
        .expect("thinking should succeed");
    let decision = parse(&value.as_string().expect("decision json"));
    let cell = decision["cell"].as_u64().expect("cell index") as usize;

    let state = parse(&game.state_json().expect("state json"));
    assert_eq!(state["board"][cell], "");
    assert_eq!(state["board"][4], "X");
}

#[wasm_bindgen_test]
fn stateless_helpers_reject_bad_input() {
    let open = || board(&["X", "", "", "", "", "", "", "", ""]);
    assert!(compute_ai_move(open(), Some("Z".into()), None).is_err());
    assert!(compute_ai_move(open(), None, Some("nightmare".into())).is_err());
    assert!(compute_ai_move(open(), None, None).is_ok());

    let decided = board(&["X", "X", "X", "O", "O", "", "", "", ""]);
    assert!(compute_ai_move(decided, Some("O".into()), Some("impossible".into())).is_err());
}
