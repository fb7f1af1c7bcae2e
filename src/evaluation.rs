use crate::board::Board;
use crate::piece::Color::White;
use crate::piece::{Color, Piece, PieceKind};
use crate::square::{file_of, make_square, rank_of, vertical_symmetry, Square};

pub type Score = i32;

pub const MATE_VALUE: Score = 30_000;
pub const MATE_THRESHOLD: Score = MATE_VALUE - 1024;
pub const INFINITY: Score = i32::MAX / 16;
pub const DRAW_SCORE: Score = 0;

/// Material values indexed by `PieceKind::index`. The king entry only feeds
/// move ordering, never the material sum.
pub const PIECE_VALUE: [Score; 6] = [100, 320, 330, 500, 900, MATE_VALUE];

const PHASE_VALUE: [Score; 6] = [0, 1, 1, 2, 4, 0];
const MAX_PHASE: Score = 24;

pub fn piece_value(kind: PieceKind) -> Score {
    PIECE_VALUE[kind.index()]
}

// Piece-square tables are white-oriented, rank 1 in the first row; black
// pieces read them through a vertical mirror.
#[rustfmt::skip]
const PAWN_TABLE: [Score; 64] = [
     0,  0,  0,  0,  0,  0,  0,  0,
    10, 15, 15, 20, 20, 15, 15, 10,
     5, 10, 15, 25, 25, 15, 10,  5,
     0,  5, 10, 20, 20, 10,  5,  0,
     0,  5, 10, 15, 15, 10,  5,  0,
     0,  5,  5, 10, 10,  5,  5,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
     0,  0,  0,  0,  0,  0,  0,  0,
];

#[rustfmt::skip]
const KNIGHT_TABLE: [Score; 64] = [
    -50, -40, -30, -30, -30, -30, -40, -50,
    -40, -20,   0,   5,   5,   0, -20, -40,
    -30,   5,  10,  15,  15,  10,   5, -30,
    -30,   0,  15,  20,  20,  15,   0, -30,
    -30,   5,  15,  20,  20,  15,   5, -30,
    -30,   0,  10,  15,  15,  10,   0, -30,
    -40, -20,   0,   0,   0,   0, -20, -40,
    -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP_TABLE: [Score; 64] = [
    -20, -10, -10, -10, -10, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,  10,  10,   5,   0, -10,
    -10,   5,   5,  10,  10,   5,   5, -10,
    -10,   0,  10,  10,  10,  10,   0, -10,
    -10,  10,  10,  10,  10,  10,  10, -10,
    -10,   5,   0,   0,   0,   0,   5, -10,
    -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK_TABLE: [Score; 64] = [
     0,   0,   5,  10,  10,   5,   0,   0,
     0,   0,   5,  10,  10,   5,   0,   0,
     0,   0,   5,  10,  10,   5,   0,   0,
     0,   0,   5,  10,  10,   5,   0,   0,
     0,   0,   5,  10,  10,   5,   0,   0,
     0,   0,   5,  10,  10,   5,   0,   0,
    10,  10,  10,  15,  15,  10,  10,  10,
     0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN_TABLE: [Score; 64] = [
    -20, -10, -10,  -5,  -5, -10, -10, -20,
    -10,   0,   0,   0,   0,   0,   0, -10,
    -10,   0,   5,   5,   5,   5,   0, -10,
     -5,   0,   5,   5,   5,   5,   0,  -5,
      0,   0,   5,   5,   5,   5,   0,  -5,
    -10,   5,   5,   5,   5,   5,   0, -10,
    -10,   0,   5,   0,   0,   0,   0, -10,
    -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_TABLE_MIDGAME: [Score; 64] = [
     20,  30,  10,   0,   0,  10,  30,  20,
     20,  20,   0,   0,   0,   0,  20,  20,
    -10, -20, -20, -20, -20, -20, -20, -10,
    -20, -30, -30, -40, -40, -30, -30, -20,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
    -30, -40, -40, -50, -50, -40, -40, -30,
];

#[rustfmt::skip]
const KING_TABLE_ENDGAME: [Score; 64] = [
    -50, -30, -30, -30, -30, -30, -30, -50,
    -30, -30,   0,   0,   0,   0, -30, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  30,  40,  40,  30, -10, -30,
    -30, -10,  20,  30,  30,  20, -10, -30,
    -30, -20, -10,   0,   0, -10, -20, -30,
    -50, -40, -30, -20, -20, -30, -40, -50,
];

const PASSED_PAWN_MG: [Score; 8] = [0, 5, 10, 20, 35, 60, 100, 0];
const PASSED_PAWN_EG: [Score; 8] = [0, 10, 20, 40, 70, 110, 170, 0];

const DOUBLED_PAWN_PENALTY: (Score, Score) = (20, 12);
const ISOLATED_PAWN_PENALTY: (Score, Score) = (15, 10);
const BACKWARD_PAWN_PENALTY: (Score, Score) = (12, 8);

/// Midgame and endgame running totals for one side.
#[derive(Default, Clone, Copy)]
struct Tally {
    mg: Score,
    eg: Score,
}
impl Tally {
    fn add(&mut self, mg: Score, eg: Score) {
        self.mg += mg;
        self.eg += eg;
    }
}

/// Static evaluation in centipawns, from the side to move's perspective so
/// that it composes directly with negamax.
pub fn evaluate(board: &Board) -> Score {
    let mut tallies = [Tally::default(); 2];
    let mut phase = 0;

    // Pawn counts per file, used by structure, rook and king-safety terms
    let mut pawns_on_file = [[0u8; 8]; 2];
    for sq in 0..64 {
        if let Some(p) = board.piece_at(sq) {
            if p.kind == PieceKind::Pawn {
                pawns_on_file[p.color.index()][file_of(sq)] += 1;
            }
        }
    }

    for sq in 0..64 {
        let piece = match board.piece_at(sq) {
            Some(p) => p,
            None => continue,
        };
        let us = piece.color.index();
        let tally = &mut tallies[us];
        // White reads tables and ranks directly, Black through a mirror
        let rel_sq = if piece.color == White {
            sq
        } else {
            vertical_symmetry(sq)
        };
        let rel_rank = rank_of(rel_sq);
        let file = file_of(sq);

        phase += PHASE_VALUE[piece.kind.index()];

        match piece.kind {
            PieceKind::Pawn => {
                let value = piece_value(PieceKind::Pawn) + PAWN_TABLE[rel_sq];
                tally.add(value, value);
                pawn_structure(board, tally, piece.color, sq, rel_rank);
            }
            PieceKind::Knight => {
                let value = piece_value(PieceKind::Knight) + KNIGHT_TABLE[rel_sq];
                tally.add(value, value);
                if rel_rank > 0 {
                    tally.add(6, 0);
                }
                if (2..=5).contains(&file) && (2..=5).contains(&rel_rank) {
                    tally.add(8, 4);
                }
                if file == 0 || file == 7 {
                    tally.add(-8, 0);
                }
            }
            PieceKind::Bishop => {
                let value = piece_value(PieceKind::Bishop) + BISHOP_TABLE[rel_sq];
                tally.add(value, value);
                if rel_rank > 0 {
                    tally.add(5, 0);
                }
            }
            PieceKind::Rook => {
                let value = piece_value(PieceKind::Rook) + ROOK_TABLE[rel_sq];
                tally.add(value, value);
                if pawns_on_file[0][file] == 0 && pawns_on_file[1][file] == 0 {
                    tally.add(20, 12);
                } else if pawns_on_file[us][file] == 0 {
                    tally.add(12, 6);
                }
                if rel_rank == 6 {
                    tally.add(8, 6);
                }
            }
            PieceKind::Queen => {
                let value = piece_value(PieceKind::Queen) + QUEEN_TABLE[rel_sq];
                tally.add(value, value);
                if rel_rank >= 5 {
                    tally.add(4, 0);
                }
            }
            PieceKind::King => {
                tally.add(KING_TABLE_MIDGAME[rel_sq], KING_TABLE_ENDGAME[rel_sq]);
                king_safety(board, tally, piece.color, sq, &pawns_on_file);
            }
        }
    }

    // Doubled pawns: one penalty per extra pawn on a file
    for color_index in 0..2 {
        for file in 0..8 {
            let extra = pawns_on_file[color_index][file].saturating_sub(1) as Score;
            tallies[color_index].add(
                -DOUBLED_PAWN_PENALTY.0 * extra,
                -DOUBLED_PAWN_PENALTY.1 * extra,
            );
        }
    }

    phase = phase.min(MAX_PHASE);
    let mg_total = tallies[0].mg - tallies[1].mg;
    let eg_total = tallies[0].eg - tallies[1].eg;
    let blended = (mg_total * phase + eg_total * (MAX_PHASE - phase)) / MAX_PHASE;

    if board.side_to_move() == White {
        blended
    } else {
        -blended
    }
}

/// True if no enemy pawn can stop this pawn: nothing on its file or the
/// adjacent ones on any rank strictly ahead.
fn is_passed(board: &Board, color: Color, sq: Square) -> bool {
    !enemy_pawn_ahead(board, color, file_of(sq) as i32, rank_of(sq) as i32)
}

pub(crate) fn enemy_pawn_ahead(board: &Board, color: Color, file: i32, rank: i32) -> bool {
    let direction = if color == White { 1 } else { -1 };
    let enemy_pawn = Piece::new(PieceKind::Pawn, color.opposite());

    let mut r = rank + direction;
    while (0..8).contains(&r) {
        for df in -1..=1i32 {
            let f = file + df;
            if (0..8).contains(&f)
                && board.piece_at(make_square(f as usize, r as usize)) == Some(enemy_pawn)
            {
                return true;
            }
        }
        r += direction;
    }
    false
}

fn pawn_structure(board: &Board, tally: &mut Tally, color: Color, sq: Square, rel_rank: usize) {
    let file = file_of(sq) as i32;
    let rank = rank_of(sq) as i32;
    let direction = if color == White { 1i32 } else { -1 };
    let friendly_pawn = Piece::new(PieceKind::Pawn, color);
    let enemy_pawn = Piece::new(PieceKind::Pawn, color.opposite());

    let pawn_at = |f: i32, r: i32, pawn: Piece| -> bool {
        (0..8).contains(&f)
            && (0..8).contains(&r)
            && board.piece_at(make_square(f as usize, r as usize)) == Some(pawn)
    };

    if is_passed(board, color, sq) {
        tally.add(PASSED_PAWN_MG[rel_rank], PASSED_PAWN_EG[rel_rank]);
    }

    let has_neighbor = (0..8).any(|r| {
        pawn_at(file - 1, r, friendly_pawn) || pawn_at(file + 1, r, friendly_pawn)
    });
    if !has_neighbor {
        tally.add(-ISOLATED_PAWN_PENALTY.0, -ISOLATED_PAWN_PENALTY.1);
    }

    // Backward: nothing guards the stop square and the pawn cannot safely
    // advance past the enemy pawn presence
    let stop_rank = rank + direction;
    let stop_empty = (0..8).contains(&stop_rank)
        && board
            .piece_at(make_square(file as usize, stop_rank as usize))
            .is_none();
    if stop_empty {
        let support_behind = (0..8)
            .filter(|r| {
                if color == White {
                    *r <= rank
                } else {
                    *r >= rank
                }
            })
            .any(|r| pawn_at(file - 1, r, friendly_pawn) || pawn_at(file + 1, r, friendly_pawn));
        let stop_attacked = pawn_at(file - 1, stop_rank + direction, enemy_pawn)
            || pawn_at(file + 1, stop_rank + direction, enemy_pawn);
        let enemy_on_file = (0..8).any(|r| pawn_at(file, r, enemy_pawn));
        if !support_behind && (stop_attacked || enemy_on_file) {
            tally.add(-BACKWARD_PAWN_PENALTY.0, -BACKWARD_PAWN_PENALTY.1);
        }
    }
}

/// Midgame-weighted king safety: pawn shield, open files around the king,
/// castled/uncastled bonuses and enemy pieces loitering nearby.
fn king_safety(
    board: &Board,
    tally: &mut Tally,
    color: Color,
    king_sq: Square,
    pawns_on_file: &[[u8; 8]; 2],
) {
    let us = color.index();
    let file = file_of(king_sq) as i32;
    let rank = rank_of(king_sq) as i32;
    let direction = if color == White { 1i32 } else { -1 };
    let home_rank = if color == White { 0 } else { 7 };
    let friendly_pawn = Piece::new(PieceKind::Pawn, color);

    let mut shield = 0;
    for df in -1..=1i32 {
        for step in 1..=2i32 {
            let (f, r) = (file + df, rank + step * direction);
            if (0..8).contains(&f)
                && (0..8).contains(&r)
                && board.piece_at(make_square(f as usize, r as usize)) == Some(friendly_pawn)
            {
                shield += 1;
            }
        }
    }
    let missing = 3 - shield.min(3);
    tally.add(-12 * missing, 0);

    for f in (file - 1)..=(file + 1) {
        if !(0..8).contains(&f) {
            continue;
        }
        let f = f as usize;
        if pawns_on_file[0][f] == 0 && pawns_on_file[1][f] == 0 {
            tally.add(-20, 0);
        } else if pawns_on_file[us][f] == 0 {
            tally.add(-12, 0);
        }
    }

    if rank == home_rank as i32 && (file == 6 || file == 2) {
        tally.add(16, 0);
    }
    if board.fullmove_number() > 10 && rank == home_rank as i32 {
        tally.add(-18, 0);
    }

    for sq in 0..64 {
        let piece = match board.piece_at(sq) {
            Some(p) if p.color != color => p,
            _ => continue,
        };
        let chebyshev = (file_of(sq) as i32 - file)
            .abs()
            .max((rank_of(sq) as i32 - rank).abs());
        if chebyshev <= 2 {
            let penalty = match piece.kind {
                PieceKind::Knight => 6,
                PieceKind::Bishop => 5,
                PieceKind::Rook => 7,
                PieceKind::Queen => 9,
                _ => 0,
            };
            tally.add(-penalty, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Color::Black;

    #[test]
    fn start_position_is_balanced() {
        assert_eq!(evaluate(&Board::default()), 0);
    }

    /// Mirroring the position vertically and swapping colors flips the
    /// white-relative score; with the side-to-move letter kept, the returned
    /// value negates.
    #[test]
    fn evaluation_negates_under_color_swap() {
        let pairs = [
            (
                "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3",
                "rnbqkb1r/pppp1ppp/5n2/4p3/4P3/2N5/PPPP1PPP/R1BQKBNR w KQkq - 2 3",
            ),
            (
                "4k3/8/8/3P4/8/8/8/4K3 w - - 0 1",
                "4k3/8/8/8/3p4/8/8/4K3 w - - 0 1",
            ),
            (
                "r3k3/pp6/8/8/8/8/6PP/5RK1 w q - 0 20",
                "5rk1/6pp/8/8/8/8/PP6/R3K3 w Q - 0 20",
            ),
        ];
        for (fen, mirrored) in pairs {
            let a = Board::from_fen(fen).unwrap();
            let b = Board::from_fen(mirrored).unwrap();
            assert_eq!(evaluate(&a), -evaluate(&b), "mirror pair {}", fen);
        }
    }

    #[test]
    fn passed_pawns_are_detected() {
        let board = Board::from_fen("4k3/8/8/3P4/8/2p5/8/4K3 w - - 0 1").unwrap();
        assert!(is_passed(&board, White, 35)); // d5 has a clear road
        assert!(is_passed(&board, Black, 18)); // so does c3
    }

    #[test]
    fn blocked_pawns_are_not_passed() {
        let board = Board::from_fen("4k3/3p4/8/3P4/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(!is_passed(&board, White, 35));
    }

    #[test]
    fn material_up_reads_positive_for_the_side_to_move() {
        // White is a rook up
        let board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap();
        assert!(evaluate(&board) > 300);

        let board = Board::from_fen("4k3/8/8/8/8/8/8/R3K3 b - - 0 1").unwrap();
        assert!(evaluate(&board) < -300);
    }
}
