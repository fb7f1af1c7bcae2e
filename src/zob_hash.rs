use crate::castling::CastlingRights;
use crate::piece::{Color, Piece, PieceKind};
use crate::square::{file_of, Square};

// Keys are generated at compile time for reproducibility and
// to avoid init functions
include!(concat!(env!("OUT_DIR"), "/zobrist_keys.rs"));

pub type Hash = u64;

pub struct ZobristHasher {}
impl ZobristHasher {
    /// Row of the piece/square table for a given piece. Row 0 belongs to the
    /// empty square and is never used.
    fn piece_row(piece: Piece) -> usize {
        let kind_offset = match piece.kind {
            PieceKind::Pawn => 1,
            PieceKind::Knight => 2,
            PieceKind::Bishop => 3,
            PieceKind::Rook => 4,
            PieceKind::Queen => 5,
            PieceKind::King => 6,
        };
        kind_offset + 6 * piece.color.index()
    }

    pub fn hash_for_piece_sq(piece: Piece, sq: Square) -> Hash {
        Self::PIECE_KEYS[Self::piece_row(piece)][sq]
    }

    pub fn side_to_move_hash(color: Color) -> Hash {
        if color == Color::Black {
            Self::SIDE_TO_MOVE_KEY
        } else {
            0
        }
    }

    pub fn castling_rights_hash(castling_rights: CastlingRights) -> Hash {
        Self::CASTLING_KEYS[castling_rights.bits()]
    }

    pub fn en_passant_hash(ep_target: Option<Square>) -> Hash {
        if let Some(sq) = ep_target {
            Self::EN_PASSANT_KEYS[file_of(sq)]
        } else {
            0
        }
    }
}
