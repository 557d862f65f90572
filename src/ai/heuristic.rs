use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::game::{Board, CellIndex, Player, BOARD_SIZE, CENTER, CORNERS, EDGES, OPPOSITE_CORNERS};

/// 规则链中实际生效的那一条。
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HeuristicRule {
    Win,
    Block,
    Center,
    Fork,
    BlockFork,
    OppositeCorner,
    Corner,
    Edge,
}

/// 按优先级依次尝试各条规则，返回第一条适用规则给出的格子。
///
/// 只在棋盘副本上探测，`board` 本身不会被修改；棋盘已满时返回 `None`。
pub fn strategic_move<R: Rng + ?Sized>(
    board: &Board,
    player: Player,
    rng: &mut R,
) -> Option<(CellIndex, HeuristicRule)> {
    let mut scratch = *board;
    let opponent = player.opponent();

    if let Some(index) = winning_move(&mut scratch, player) {
        return Some((index, HeuristicRule::Win));
    }
    if let Some(index) = winning_move(&mut scratch, opponent) {
        return Some((index, HeuristicRule::Block));
    }
    if scratch.is_empty(CENTER) {
        return Some((CENTER, HeuristicRule::Center));
    }
    if let Some(index) = fork_move(&mut scratch, player) {
        return Some((index, HeuristicRule::Fork));
    }
    if let Some(index) = fork_move(&mut scratch, opponent) {
        return Some((index, HeuristicRule::BlockFork));
    }
    if let Some(index) = opposite_corner(&scratch, player) {
        return Some((index, HeuristicRule::OppositeCorner));
    }
    if let Some(index) = random_among(&scratch, &CORNERS, rng) {
        return Some((index, HeuristicRule::Corner));
    }
    random_among(&scratch, &EDGES, rng).map(|index| (index, HeuristicRule::Edge))
}

/// `player` 一步即可成线的格子（按索引顺序取第一个）。
pub fn winning_move(board: &mut Board, player: Player) -> Option<CellIndex> {
    (0..BOARD_SIZE).find(|&index| {
        board.is_empty(index) && board.with_probe(index, player, |b| b.has_line(player))
    })
}

/// 落子后能同时形成两个及以上成线威胁的格子。
pub fn fork_move(board: &mut Board, player: Player) -> Option<CellIndex> {
    (0..BOARD_SIZE).find(|&index| {
        board.is_empty(index) && board.with_probe(index, player, |b| threat_count(b, player) >= 2)
    })
}

fn threat_count(board: &mut Board, player: Player) -> usize {
    (0..BOARD_SIZE)
        .filter(|&index| {
            board.is_empty(index) && board.with_probe(index, player, |b| b.has_line(player))
        })
        .count()
}

/// 对手占了某个角而对角为空时，占对角。
fn opposite_corner(board: &Board, player: Player) -> Option<CellIndex> {
    let opponent = Some(player.opponent().mark());
    OPPOSITE_CORNERS.iter().find_map(|&(first, second)| {
        if board.get(first) == opponent && board.is_empty(second) {
            Some(second)
        } else if board.get(second) == opponent && board.is_empty(first) {
            Some(first)
        } else {
            None
        }
    })
}

fn random_among<R: Rng + ?Sized>(
    board: &Board,
    cells: &[CellIndex],
    rng: &mut R,
) -> Option<CellIndex> {
    let open: Vec<CellIndex> = cells
        .iter()
        .copied()
        .filter(|&index| board.is_empty(index))
        .collect();
    open.choose(rng).copied()
}

/// 在所有空格中均匀随机选择。
pub fn random_move<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<CellIndex> {
    let open: Vec<CellIndex> = board.empty_cells().collect();
    open.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn board(layout: &str) -> Board {
        layout.parse().expect("test layout should parse")
    }

    fn decide(layout: &str, player: Player) -> (CellIndex, HeuristicRule) {
        let mut rng = SmallRng::seed_from_u64(11);
        strategic_move(&board(layout), player, &mut rng).expect("board has empty cells")
    }

    #[test]
    fn completing_a_line_beats_everything() {
        assert_eq!(decide("OO.......", Player::O), (2, HeuristicRule::Win));
        // 同时存在需要封堵的线时仍然优先取胜
        assert_eq!(decide("OO.XX.X..", Player::O), (2, HeuristicRule::Win));
    }

    #[test]
    fn blocks_opponent_line() {
        assert_eq!(decide("XX.......", Player::O), (2, HeuristicRule::Block));
        assert_eq!(decide("O.X.X....", Player::O), (6, HeuristicRule::Block));
    }

    #[test]
    fn takes_center_when_open() {
        assert_eq!(decide("X........", Player::O), (4, HeuristicRule::Center));
        assert_eq!(decide(".........", Player::X), (4, HeuristicRule::Center));
    }

    #[test]
    fn creates_own_fork() {
        assert_eq!(decide(".X.XXO.O.", Player::O), (8, HeuristicRule::Fork));
        assert_eq!(decide("XO..X...O", Player::X), (3, HeuristicRule::Fork));
    }

    #[test]
    fn blocks_opponent_fork() {
        assert_eq!(decide("X...O...X", Player::O), (2, HeuristicRule::BlockFork));
    }

    #[test]
    fn opposite_corner_follows_the_acting_side() {
        assert_eq!(
            decide("O...X....", Player::X),
            (8, HeuristicRule::OppositeCorner)
        );
        assert_eq!(
            decide("XOX.OX.XO", Player::O),
            (6, HeuristicRule::OppositeCorner)
        );
    }

    #[test]
    fn falls_back_to_random_corner_then_edge() {
        let (index, rule) = decide("....X....", Player::O);
        assert_eq!(rule, HeuristicRule::Corner);
        assert!(CORNERS.contains(&index));

        let (index, rule) = decide("XOX.X.OXO", Player::O);
        assert_eq!(rule, HeuristicRule::Edge);
        assert!(index == 3 || index == 5);
    }

    #[test]
    fn probing_leaves_board_untouched() {
        let original = board("X...O...X");
        let mut rng = SmallRng::seed_from_u64(3);
        let _ = strategic_move(&original, Player::O, &mut rng);
        assert_eq!(original, board("X...O...X"));

        let mut probed = original;
        let _ = fork_move(&mut probed, Player::X);
        let _ = winning_move(&mut probed, Player::O);
        assert_eq!(probed, original);
    }

    #[test]
    fn full_board_has_no_move() {
        let mut rng = SmallRng::seed_from_u64(5);
        assert_eq!(strategic_move(&board("XOXXOOOXX"), Player::O, &mut rng), None);
        assert_eq!(random_move(&board("XOXXOOOXX"), &mut rng), None);
    }

    #[test]
    fn random_move_only_picks_empty_cells() {
        let layout = board("XO.X.O.XO");
        let mut rng = SmallRng::seed_from_u64(9);
        for _ in 0..50 {
            let index = random_move(&layout, &mut rng).expect("board has empty cells");
            assert!(layout.is_empty(index));
        }
    }
}
