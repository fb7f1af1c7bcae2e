use crate::castling::CastlingRights;
use crate::piece::Piece;
use crate::r#move::Move;
use crate::square::Square;
use crate::zob_hash::Hash;

/// Everything `unmake` needs to restore the previous position exactly.
/// One entry is pushed per make, popped per unmake.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HistoryEntry {
    pub move_played: Move,
    pub captured_piece: Option<Piece>,
    pub castling_rights: CastlingRights,
    pub ep_target: Option<Square>,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
    pub hash: Hash,
}
