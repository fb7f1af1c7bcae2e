use crate::board::Board;
use crate::move_generator::{generate, GenType};
use crate::piece::PieceKind;
use crate::r#move::{Move, MoveFlags};
use crate::square::{file_of, rank_of, square_representation};

fn piece_letter(kind: PieceKind) -> &'static str {
    match kind {
        PieceKind::King => "K",
        PieceKind::Queen => "Q",
        PieceKind::Rook => "R",
        PieceKind::Bishop => "B",
        PieceKind::Knight => "N",
        PieceKind::Pawn => "",
    }
}

/// Renders a move in standard algebraic notation. The board must hold the
/// position the move is about to be played in; check and mate suffixes are
/// derived by playing the move on a scratch copy.
pub fn to_san(board: &Board, mv: Move) -> String {
    if mv.flags.contains(MoveFlags::CASTLE_KINGSIDE) {
        return decorated("O-O".to_string(), board, mv);
    }
    if mv.flags.contains(MoveFlags::CASTLE_QUEENSIDE) {
        return decorated("O-O-O".to_string(), board, mv);
    }

    let is_pawn = mv.moving_piece.kind == PieceKind::Pawn;
    let mut san = String::from(piece_letter(mv.moving_piece.kind));

    if !is_pawn {
        san.push_str(&disambiguation(board, mv));
    }

    if mv.is_capture() {
        if is_pawn {
            san.push((b'a' + file_of(mv.from) as u8) as char);
        }
        san.push('x');
    }

    san.push_str(&square_representation(mv.to).unwrap_or_default());

    if let Some(kind) = mv.promotion_kind() {
        san.push('=');
        san.push_str(piece_letter(kind));
    }

    decorated(san, board, mv)
}

/// Minimal origin qualifier against the other legal moves of the same piece
/// kind to the same destination: file first, then rank, then both.
fn disambiguation(board: &Board, mv: Move) -> String {
    let candidates: Vec<Move> = generate(board, GenType::Legal)
        .into_iter()
        .filter(|m| {
            m.to == mv.to
                && m.from != mv.from
                && m.moving_piece.kind == mv.moving_piece.kind
                && m.moving_piece.color == mv.moving_piece.color
        })
        .collect();

    if candidates.is_empty() {
        return String::new();
    }

    let from_file = file_of(mv.from);
    let from_rank = rank_of(mv.from);
    let file_unique = candidates.iter().all(|c| file_of(c.from) != from_file);
    let rank_unique = candidates.iter().all(|c| rank_of(c.from) != from_rank);

    let file_char = (b'a' + from_file as u8) as char;
    let rank_char = (b'1' + from_rank as u8) as char;
    if file_unique {
        file_char.to_string()
    } else if rank_unique {
        rank_char.to_string()
    } else {
        format!("{}{}", file_char, rank_char)
    }
}

fn decorated(san: String, board: &Board, mv: Move) -> String {
    let mut copy = board.clone();
    copy.make(mv);
    if !copy.in_check(copy.side_to_move()) {
        return san;
    }
    if generate(&copy, GenType::Legal).is_empty() {
        san + "#"
    } else {
        san + "+"
    }
}
