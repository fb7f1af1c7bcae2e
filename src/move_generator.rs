use crate::board::{Board, BISHOP_DIRECTIONS, KING_DELTAS, KNIGHT_DELTAS, ROOK_DIRECTIONS};
use crate::movelist::MoveList;
use crate::piece::Color::White;
use crate::piece::{Piece, PieceKind};
use crate::r#move::Move;
use crate::square::{file_of, make_square, rank_of, Square};

#[derive(Debug, Copy, Clone, PartialOrd, PartialEq)]
pub enum GenType {
    Legal,
    Captures,
}

/// Generates a subset of all legal moves for a given position.
/// Generation is two-pass: every pseudo-legal move is played on a scratch
/// board and kept only if the mover's king survives.
pub fn generate(board: &Board, gen_type: GenType) -> MoveList {
    let pseudo = pseudo_legal(board);
    let mut legal = MoveList::default();

    let mover = board.side_to_move();
    let mut scratch = board.clone();
    for mv in pseudo.into_iter() {
        if gen_type == GenType::Captures && !mv.is_capture() {
            continue;
        }
        scratch.make(mv);
        if !scratch.in_check(mover) {
            legal.push(mv);
        }
        scratch.unmake();
    }

    legal
}

fn pseudo_legal(board: &Board) -> MoveList {
    let mut moves = MoveList::default();

    for square in 0..64 {
        let piece = match board.piece_at(square) {
            Some(p) if p.color == board.side_to_move() => p,
            _ => continue,
        };

        match piece.kind {
            PieceKind::Pawn => pawn_moves(board, &mut moves, square, piece),
            PieceKind::Knight => jump_moves(board, &mut moves, square, piece, &KNIGHT_DELTAS),
            PieceKind::Bishop | PieceKind::Rook | PieceKind::Queen => {
                slider_moves(board, &mut moves, square, piece)
            }
            PieceKind::King => {
                jump_moves(board, &mut moves, square, piece, &KING_DELTAS);
                castling_moves(board, &mut moves, square, piece);
            }
        }
    }

    moves
}

/// Promotions are emitted queen first; every pawn arrival on the last rank
/// yields all four of them.
fn push_promotions(
    moves: &mut MoveList,
    from: Square,
    to: Square,
    piece: Piece,
    captured: Option<Piece>,
) {
    for kind in [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ] {
        moves.push(Move::new_promotion(
            from,
            to,
            piece,
            captured,
            Piece::new(kind, piece.color),
        ));
    }
}

fn pawn_moves(board: &Board, moves: &mut MoveList, square: Square, piece: Piece) {
    let (direction, start_rank, promotion_rank) = if piece.color == White {
        (1i32, 1, 6)
    } else {
        (-1i32, 6, 1)
    };
    let file = file_of(square) as i32;
    let rank = rank_of(square) as i32;

    let forward_rank = rank + direction;
    if (0..8).contains(&forward_rank) {
        let forward = make_square(file as usize, forward_rank as usize);
        if board.piece_at(forward).is_none() {
            if rank == promotion_rank {
                push_promotions(moves, square, forward, piece, None);
            } else {
                moves.push(Move::new_quiet(square, forward, piece));

                if rank == start_rank {
                    let double = make_square(file as usize, (rank + 2 * direction) as usize);
                    if board.piece_at(double).is_none() {
                        moves.push(Move::new_double_push(square, double, piece));
                    }
                }
            }
        }

        for df in [-1, 1] {
            let capture_file = file + df;
            if !(0..8).contains(&capture_file) {
                continue;
            }
            let target = make_square(capture_file as usize, forward_rank as usize);

            match board.piece_at(target) {
                Some(victim) if victim.color != piece.color => {
                    if rank == promotion_rank {
                        push_promotions(moves, square, target, piece, Some(victim));
                    } else {
                        moves.push(Move::new_capture(square, target, piece, victim));
                    }
                }
                _ => (),
            }

            // The en-passant victim is the enemy pawn beside us, not a piece
            // on the target square
            if board.en_passant_target() == Some(target) {
                let victim = Piece::new(PieceKind::Pawn, piece.color.opposite());
                moves.push(Move::new_en_passant(square, target, piece, victim));
            }
        }
    }
}

fn jump_moves(
    board: &Board,
    moves: &mut MoveList,
    square: Square,
    piece: Piece,
    deltas: &[(i32, i32); 8],
) {
    let file = file_of(square) as i32;
    let rank = rank_of(square) as i32;

    for (df, dr) in deltas {
        let (f, r) = (file + df, rank + dr);
        if !(0..8).contains(&f) || !(0..8).contains(&r) {
            continue;
        }
        let target = make_square(f as usize, r as usize);
        match board.piece_at(target) {
            None => moves.push(Move::new_quiet(square, target, piece)),
            Some(victim) if victim.color != piece.color => {
                moves.push(Move::new_capture(square, target, piece, victim))
            }
            _ => (),
        }
    }
}

fn slider_moves(board: &Board, moves: &mut MoveList, square: Square, piece: Piece) {
    let file = file_of(square) as i32;
    let rank = rank_of(square) as i32;

    let mut scan = |directions: &[(i32, i32); 4]| {
        for (df, dr) in directions {
            let (mut f, mut r) = (file + df, rank + dr);
            while (0..8).contains(&f) && (0..8).contains(&r) {
                let target = make_square(f as usize, r as usize);
                match board.piece_at(target) {
                    None => moves.push(Move::new_quiet(square, target, piece)),
                    Some(victim) => {
                        if victim.color != piece.color {
                            moves.push(Move::new_capture(square, target, piece, victim));
                        }
                        break;
                    }
                }
                f += df;
                r += dr;
            }
        }
    };

    if piece.kind.is_bishop_like() {
        scan(&BISHOP_DIRECTIONS);
    }
    if piece.kind.is_rook_like() {
        scan(&ROOK_DIRECTIONS);
    }
}

/// Castling needs the matching right, an empty path between king and rook,
/// and an unattacked king transit. The queen-side b-file square only has to
/// be empty.
fn castling_moves(board: &Board, moves: &mut MoveList, square: Square, piece: Piece) {
    let home_rank = if piece.color == White { 0 } else { 7 };
    if square != make_square(4, home_rank) {
        return;
    }
    let them = piece.color.opposite();
    let (kingside_right, queenside_right) = board.castling_rights().get(piece.color);

    if kingside_right {
        let f_square = make_square(5, home_rank);
        let g_square = make_square(6, home_rank);
        if board.piece_at(f_square).is_none()
            && board.piece_at(g_square).is_none()
            && !board.is_square_attacked(square, them)
            && !board.is_square_attacked(f_square, them)
            && !board.is_square_attacked(g_square, them)
        {
            moves.push(Move::new_castle(square, g_square, piece, true));
        }
    }

    if queenside_right {
        let d_square = make_square(3, home_rank);
        let c_square = make_square(2, home_rank);
        let b_square = make_square(1, home_rank);
        if board.piece_at(d_square).is_none()
            && board.piece_at(c_square).is_none()
            && board.piece_at(b_square).is_none()
            && !board.is_square_attacked(square, them)
            && !board.is_square_attacked(d_square, them)
            && !board.is_square_attacked(c_square, them)
        {
            moves.push(Move::new_castle(square, c_square, piece, false));
        }
    }
}
