use chess_core::{Color, Game, GameState, MoveInfo, PieceType, Square};

/// Score added for a mating move. Dominates every other component.
pub const MATE_SCORE: i32 = 100_000;
const PROMOTION_BONUS: i32 = 2_000;
const CAPTURE_MULTIPLIER: i32 = 10;
const FAVOURABLE_TRADE_BONUS: i32 = 50;
const UNFAVOURABLE_TRADE_PENALTY: i32 = 5;
const CHECK_BONUS: i32 = 40;
const CENTER_BONUS: i32 = 25;
const CASTLE_BONUS: i32 = 70;

/// d4, e4, d5, e5
const CENTER_SQUARES: [u8; 4] = [27, 28, 35, 36];

/// Material value of a piece kind.
pub const fn piece_value(piece_type: PieceType) -> i32 {
    match piece_type {
        PieceType::Pawn => 10,
        PieceType::Knight => 32,
        PieceType::Bishop => 33,
        PieceType::Rook => 50,
        PieceType::Queen => 90,
        PieceType::King => 2000,
    }
}

/// Material balance, positive when White is ahead. An empty board is 0.
pub fn evaluate_material(state: &GameState) -> i32 {
    state
        .board
        .pieces()
        .map(|(_, piece)| match piece.color {
            Color::White => piece_value(piece.piece_type),
            Color::Black => -piece_value(piece.piece_type),
        })
        .sum()
}

fn is_center(square: Square) -> bool {
    CENTER_SQUARES.contains(&square.index())
}

/// Heuristic tactical score of a single legal move.
///
/// Every input is carried by the move itself, so the score depends only on
/// the move and is the same wherever it is computed.
pub fn score_move(info: &MoveInfo) -> i32 {
    let mut score = 0;

    if info.is_mate() {
        score += MATE_SCORE;
    }

    if info.is_promotion() {
        score += PROMOTION_BONUS;
    }

    if let Some(victim) = info.captured {
        let victim_value = piece_value(victim);
        let attacker_value = piece_value(info.piece);
        score += CAPTURE_MULTIPLIER * victim_value;
        if victim_value > attacker_value {
            score += FAVOURABLE_TRADE_BONUS;
        } else if attacker_value > victim_value && !info.is_mate() {
            score -= UNFAVOURABLE_TRADE_PENALTY;
        }
    }

    if info.is_check() {
        score += CHECK_BONUS;
    }

    if is_center(info.to()) {
        score += CENTER_BONUS;
    }

    if info.is_castle() {
        score += CASTLE_BONUS;
    }

    score
}

/// Anything that can report a White-positive material balance.
pub trait Evaluatable {
    fn material_balance(&self) -> i32;
}

impl Evaluatable for GameState {
    fn material_balance(&self) -> i32 {
        evaluate_material(self)
    }
}

impl Evaluatable for Game {
    fn material_balance(&self) -> i32 {
        evaluate_material(self.state())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(fen: &str) -> Game {
        Game::from_fen(fen).unwrap()
    }

    #[test]
    fn test_material_balance() {
        assert_eq!(Game::new().material_balance(), 0);
        assert_eq!(GameState::empty().material_balance(), 0);

        // White has an extra queen
        let up_queen = game("3qk3/8/8/8/8/8/8/2QQK3 w - - 0 1");
        assert_eq!(up_queen.material_balance(), 90);

        let down_rook = game("r3k3/8/8/8/8/8/8/4K3 w - - 0 1");
        assert_eq!(evaluate_material(down_rook.state()), -50);
    }

    #[test]
    fn test_quiet_and_central_moves() {
        let start = Game::new();
        let e4 = start.resolve_san("e4").unwrap();
        let nf3 = start.resolve_san("Nf3").unwrap();
        assert_eq!(score_move(&e4), CENTER_BONUS);
        assert_eq!(score_move(&nf3), 0);
    }

    #[test]
    fn test_capture_components() {
        // Pawn takes knight on d5: 10*32 + 50 bonus, central square
        let pawn_takes = game("4k3/8/8/3n4/4P3/8/8/4K3 w - - 0 1");
        let exd5 = pawn_takes.resolve_san("exd5").unwrap();
        assert_eq!(score_move(&exd5), 320 + 50 + 25);

        // Queen takes pawn on a6: 10*10 - 5
        let queen_takes = game("4k3/8/p7/8/8/8/8/Q3K3 w - - 0 1");
        let qxa6 = queen_takes.resolve_san("Qxa6").unwrap();
        assert_eq!(score_move(&qxa6), 100 - 5);
    }

    #[test]
    fn test_castle_and_promotion_bonuses() {
        let castle = game("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
        let short = castle.resolve_san("O-O").unwrap();
        assert_eq!(score_move(&short), CASTLE_BONUS);

        let promo = game("7k/P7/8/8/8/8/8/K7 w - - 0 1");
        let queen = promo.resolve_san("a8=Q").unwrap();
        assert_eq!(score_move(&queen), PROMOTION_BONUS + CHECK_BONUS);
    }

    #[test]
    fn test_mate_dominates() {
        let before_mate = game("rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq g3 0 2");
        let qh4 = before_mate.resolve_san("Qh4#").unwrap();
        assert_eq!(score_move(&qh4), MATE_SCORE + CHECK_BONUS);
    }

    #[test]
    fn test_scoring_is_pure() {
        let start = Game::new();
        for info in start.legal_moves() {
            assert_eq!(score_move(&info), score_move(&info.clone()));
        }
    }
}
