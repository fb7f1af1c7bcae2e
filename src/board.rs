use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::castling::CastlingRights;
use crate::history::HistoryEntry;
use crate::move_generator::{generate, GenType};
use crate::piece::Color::{Black, White};
use crate::piece::{Color, Piece, PieceKind};
use crate::r#move::{Move, MoveFlags};
use crate::square::{file_of, make_square, parse_square, rank_of, square_representation, Square};
use crate::zob_hash::{Hash, ZobristHasher};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Reasons a FEN string can be rejected. Parsing never touches an existing
/// board; a bad string simply fails to produce one.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FenError {
    #[error("missing FEN field: {0}")]
    MissingField(&'static str),
    #[error("unknown character '{0}' in piece placement")]
    BadPiece(char),
    #[error("piece placement must describe 8 ranks of 8 squares")]
    BadPlacement,
    #[error("side to move must be 'w' or 'b', got '{0}'")]
    BadSideToMove(String),
    #[error("castling field may only contain K, Q, k, q or '-', got '{0}'")]
    BadCastling(String),
    #[error("bad en passant square '{0}'")]
    BadEnPassant(String),
    #[error("bad move clock '{0}'")]
    BadClock(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pieces: [Option<Piece>; 64],
    side_to_move: Color,
    castling_rights: CastlingRights,
    ep_target: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,

    history_entries: Vec<HistoryEntry>,
    hash: Hash,
}

impl Default for Board {
    fn default() -> Self {
        Self::from_fen(START_FEN).expect("the standard start position FEN parses")
    }
}

impl Board {
    /// Builds a board from its FEN representation
    pub fn from_fen(fen: &str) -> Result<Board, FenError> {
        let mut sections = fen.split_whitespace();
        let placement = sections.next().ok_or(FenError::MissingField("placement"))?;
        let side = sections.next().ok_or(FenError::MissingField("side to move"))?;
        let castling = sections.next().ok_or(FenError::MissingField("castling"))?;
        let ep_target = sections.next().ok_or(FenError::MissingField("en passant"))?;
        let halfmove = sections.next().ok_or(FenError::MissingField("halfmove clock"))?;
        let fullmove = sections
            .next()
            .ok_or(FenError::MissingField("fullmove number"))?;

        let mut board = Board {
            pieces: [None; 64],
            side_to_move: White,
            castling_rights: CastlingRights::none(),
            ep_target: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            history_entries: Vec::with_capacity(128),
            hash: 0,
        };

        let mut rank = 7i32;
        let mut file = 0i32;
        for c in placement.chars() {
            match c {
                '/' => {
                    if file != 8 {
                        return Err(FenError::BadPlacement);
                    }
                    rank -= 1;
                    file = 0;
                }
                '1'..='8' => file += c.to_digit(10).unwrap() as i32,
                _ => {
                    let piece = Piece::from_char(c).ok_or(FenError::BadPiece(c))?;
                    if rank < 0 || file > 7 {
                        return Err(FenError::BadPlacement);
                    }
                    board.pieces[make_square(file as usize, rank as usize)] = Some(piece);
                    file += 1;
                }
            }
            if file > 8 || rank < 0 {
                return Err(FenError::BadPlacement);
            }
        }
        if rank != 0 || file != 8 {
            return Err(FenError::BadPlacement);
        }

        board.side_to_move = match side {
            "w" => White,
            "b" => Black,
            _ => return Err(FenError::BadSideToMove(side.to_string())),
        };

        if castling != "-" && !castling.chars().all(|c| "KQkq".contains(c)) {
            return Err(FenError::BadCastling(castling.to_string()));
        }
        board.castling_rights = CastlingRights::from_str(castling);

        board.ep_target = match ep_target {
            "-" => None,
            s => Some(parse_square(s).ok_or_else(|| FenError::BadEnPassant(s.to_string()))?),
        };

        board.halfmove_clock = halfmove
            .parse()
            .map_err(|_| FenError::BadClock(halfmove.to_string()))?;
        board.fullmove_number = fullmove
            .parse()
            .map_err(|_| FenError::BadClock(fullmove.to_string()))?;

        board.hash = board.compute_zobrist();
        Ok(board)
    }

    pub fn get_fen(&self) -> String {
        let mut fen = String::new();

        for rank in (0..8).rev() {
            let mut empty_counter = 0;
            for file in 0..8 {
                match self.pieces[make_square(file, rank)] {
                    Some(p) => {
                        if empty_counter != 0 {
                            fen.push_str(&empty_counter.to_string());
                            empty_counter = 0;
                        }
                        fen.push_str(&p.to_string());
                    }
                    None => empty_counter += 1,
                }
            }
            if empty_counter != 0 {
                fen.push_str(&empty_counter.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push_str(&self.side_to_move.to_string());
        fen.push(' ');
        fen.push_str(&self.castling_rights.to_string());
        match self.ep_target {
            Some(sq) => {
                fen.push(' ');
                fen.push_str(&square_representation(sq).unwrap_or_else(|| String::from("-")))
            }
            None => fen.push_str(" -"),
        }
        fen.push(' ');
        fen.push_str(&self.halfmove_clock.to_string());
        fen.push(' ');
        fen.push_str(&self.fullmove_number.to_string());
        fen
    }

    /// Makes a move on the board. The move is expected to come out of
    /// `generate`; applying an arbitrary move is undefined.
    /// `Move::NULL` passes the turn (search only).
    pub fn make(&mut self, mv: Move) {
        if mv.is_null() {
            self.make_null();
            return;
        }

        self.history_entries.push(HistoryEntry {
            move_played: mv,
            captured_piece: mv.captured_piece,
            castling_rights: self.castling_rights,
            ep_target: self.ep_target,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            hash: self.hash,
        });

        let mover = self.side_to_move;

        if mover == Black {
            self.fullmove_number += 1;
        }
        if mv.moving_piece.kind == PieceKind::Pawn || mv.captured_piece.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock += 1;
        }

        self.ep_target = None;

        if mv.flags.contains(MoveFlags::EN_PASSANT) {
            // The captured pawn sits behind the capture square
            let victim_sq = if mover == White { mv.to - 8 } else { mv.to + 8 };
            self.pieces[victim_sq] = None;
        }

        let home_rank = if mover == White { 0 } else { 7 };
        if mv.flags.contains(MoveFlags::CASTLE_KINGSIDE) {
            let rook = self.pieces[make_square(7, home_rank)].take();
            self.pieces[make_square(5, home_rank)] = rook;
        } else if mv.flags.contains(MoveFlags::CASTLE_QUEENSIDE) {
            let rook = self.pieces[make_square(0, home_rank)].take();
            self.pieces[make_square(3, home_rank)] = rook;
        }

        self.pieces[mv.from] = None;
        self.pieces[mv.to] = Some(mv.promotion_piece.unwrap_or(mv.moving_piece));

        self.update_castling_rights(&mv);

        if mv.flags.contains(MoveFlags::DOUBLE_PAWN_PUSH) {
            self.ep_target = Some(if mover == White {
                mv.from + 8
            } else {
                mv.from - 8
            });
        }

        self.side_to_move = mover.opposite();
        self.hash = self.compute_zobrist();
    }

    /// Given a string in UCI long algebraic notation, makes the move if it
    /// is legal
    pub fn make_from_str(&mut self, move_str: &str) -> Result<(), String> {
        let (from, to, promotion) = Move::parse(move_str)
            .ok_or_else(|| String::from("Move is not formatted correctly"))?;

        let legal_moves = generate(self, GenType::Legal);
        if let Some(mv) = legal_moves
            .into_iter()
            .find(|m| m.from == from && m.to == to && m.promotion_kind() == promotion)
        {
            self.make(mv);
            Ok(())
        } else {
            Err(String::from("Illegal move"))
        }
    }

    /// Makes a null move (the side to move passes its turn). Only used in search
    fn make_null(&mut self) {
        self.history_entries.push(HistoryEntry {
            move_played: Move::NULL,
            captured_piece: None,
            castling_rights: self.castling_rights,
            ep_target: self.ep_target,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            hash: self.hash,
        });

        self.ep_target = None;
        self.side_to_move = self.side_to_move.opposite();
        self.hash = self.compute_zobrist();
    }

    /// Unmakes the move on the top of the history stack
    pub fn unmake(&mut self) {
        let entry = match self.history_entries.pop() {
            Some(e) => e,
            None => return,
        };

        self.castling_rights = entry.castling_rights;
        self.ep_target = entry.ep_target;
        self.halfmove_clock = entry.halfmove_clock;
        self.fullmove_number = entry.fullmove_number;
        self.hash = entry.hash;
        self.side_to_move = self.side_to_move.opposite();

        let mv = entry.move_played;
        if mv.is_null() {
            return;
        }

        let mover = self.side_to_move;

        self.pieces[mv.from] = Some(mv.moving_piece);
        if mv.flags.contains(MoveFlags::EN_PASSANT) {
            self.pieces[mv.to] = None;
            let victim_sq = if mover == White { mv.to - 8 } else { mv.to + 8 };
            self.pieces[victim_sq] = entry.captured_piece;
        } else {
            self.pieces[mv.to] = entry.captured_piece;
        }

        let home_rank = if mover == White { 0 } else { 7 };
        if mv.flags.contains(MoveFlags::CASTLE_KINGSIDE) {
            let rook = self.pieces[make_square(5, home_rank)].take();
            self.pieces[make_square(7, home_rank)] = rook;
        } else if mv.flags.contains(MoveFlags::CASTLE_QUEENSIDE) {
            let rook = self.pieces[make_square(3, home_rank)].take();
            self.pieces[make_square(0, home_rank)] = rook;
        }
    }

    /// Clears castling rights invalidated by a move: both bits when the king
    /// moves, one bit when a rook leaves its home corner or is captured there.
    fn update_castling_rights(&mut self, mv: &Move) {
        let mover = mv.moving_piece.color;
        match mv.moving_piece.kind {
            PieceKind::King => self.castling_rights.uncastle(mover),
            PieceKind::Rook => {
                let home_rank = if mover == White { 0 } else { 7 };
                if mv.from == make_square(0, home_rank) {
                    self.castling_rights.uncastle_queenside(mover);
                } else if mv.from == make_square(7, home_rank) {
                    self.castling_rights.uncastle_kingside(mover);
                }
            }
            _ => (),
        }

        if let Some(captured) = mv.captured_piece {
            if captured.kind == PieceKind::Rook {
                let home_rank = if captured.color == White { 0 } else { 7 };
                if mv.to == make_square(0, home_rank) {
                    self.castling_rights.uncastle_queenside(captured.color);
                } else if mv.to == make_square(7, home_rank) {
                    self.castling_rights.uncastle_kingside(captured.color);
                }
            }
        }
    }

    /*
    GETTERS
     */
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.pieces[sq]
    }

    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    pub fn en_passant_target(&self) -> Option<Square> {
        self.ep_target
    }

    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    pub fn history_len(&self) -> usize {
        self.history_entries.len()
    }

    pub fn king_square(&self, color: Color) -> Option<Square> {
        let king = Piece::new(PieceKind::King, color);
        self.pieces.iter().position(|p| *p == Some(king))
    }

    pub fn in_check(&self, side: Color) -> bool {
        match self.king_square(side) {
            Some(sq) => self.is_square_attacked(sq, side.opposite()),
            None => false,
        }
    }

    /// True if `side` has anything beyond pawns and its king; gates
    /// null-move pruning in the search.
    pub fn has_non_pawn_material(&self, side: Color) -> bool {
        self.pieces.iter().flatten().any(|p| {
            p.color == side && p.kind != PieceKind::Pawn && p.kind != PieceKind::King
        })
    }

    /// Returns true if any piece of `by_side` attacks the given square
    pub fn is_square_attacked(&self, square: Square, by_side: Color) -> bool {
        let file = file_of(square) as i32;
        let rank = rank_of(square) as i32;

        let holds = |f: i32, r: i32, kind: PieceKind| -> bool {
            self.pieces[make_square(f as usize, r as usize)] == Some(Piece::new(kind, by_side))
        };

        // A pawn of `by_side` attacks this square from the rank it would
        // capture towards it, which depends on the attacker's color
        let pawn_rank = rank + if by_side == White { -1 } else { 1 };
        if (0..8).contains(&pawn_rank) {
            for df in [-1, 1] {
                let pawn_file = file + df;
                if (0..8).contains(&pawn_file) && holds(pawn_file, pawn_rank, PieceKind::Pawn) {
                    return true;
                }
            }
        }

        for (df, dr) in KNIGHT_DELTAS {
            let (f, r) = (file + df, rank + dr);
            if (0..8).contains(&f) && (0..8).contains(&r) && holds(f, r, PieceKind::Knight) {
                return true;
            }
        }

        for (df, dr) in KING_DELTAS {
            let (f, r) = (file + df, rank + dr);
            if (0..8).contains(&f) && (0..8).contains(&r) && holds(f, r, PieceKind::King) {
                return true;
            }
        }

        for (directions, bishop_like) in [(BISHOP_DIRECTIONS, true), (ROOK_DIRECTIONS, false)] {
            for (df, dr) in directions {
                let (mut f, mut r) = (file + df, rank + dr);
                while (0..8).contains(&f) && (0..8).contains(&r) {
                    if let Some(p) = self.pieces[make_square(f as usize, r as usize)] {
                        let slides = if bishop_like {
                            p.kind.is_bishop_like()
                        } else {
                            p.kind.is_rook_like()
                        };
                        if p.color == by_side && slides {
                            return true;
                        }
                        break;
                    }
                    f += df;
                    r += dr;
                }
            }
        }

        false
    }

    /*
    HASHING
     */
    pub fn get_hash(&self) -> Hash {
        self.hash
    }

    /// Recomputes the Zobrist key of the current position from scratch
    pub fn compute_zobrist(&self) -> Hash {
        let mut hash = 0u64;
        for (sq, maybe_piece) in self.pieces.iter().enumerate() {
            if let Some(piece) = maybe_piece {
                hash ^= ZobristHasher::hash_for_piece_sq(*piece, sq);
            }
        }
        hash ^= ZobristHasher::castling_rights_hash(self.castling_rights);
        hash ^= ZobristHasher::en_passant_hash(self.ep_target);
        hash ^= ZobristHasher::side_to_move_hash(self.side_to_move);
        hash
    }
}

pub const KNIGHT_DELTAS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];
pub const KING_DELTAS: [(i32, i32); 8] = [
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
    (0, -1),
    (1, -1),
];
pub const BISHOP_DIRECTIONS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
pub const ROOK_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

impl Display for Board {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for rank in (0..8).rev() {
            for file in 0..8 {
                match self.pieces[make_square(file, rank)] {
                    None => write!(f, ". ")?,
                    Some(p) => write!(f, "{} ", p)?,
                }
            }
            writeln!(f)?;
        }
        write!(f, "fen: {}", self.get_fen())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_generator::{generate, GenType};

    const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

    #[test]
    fn fen_round_trips() {
        for fen in [
            START_FEN,
            KIWIPETE,
            "rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3",
            "8/P7/8/8/8/8/8/4k2K w - - 0 1",
            "7k/5Q2/6K1/8/8/8/8/8 b - - 12 43",
        ] {
            let board = Board::from_fen(fen).unwrap();
            assert_eq!(board.get_fen(), fen);
        }
    }

    #[test]
    fn malformed_fens_are_rejected() {
        assert_eq!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -"),
            Err(FenError::MissingField("halfmove clock"))
        );
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1"),
            Err(FenError::BadPiece('X'))
        ));
        assert!(matches!(
            Board::from_fen("rnbqkbnr/ppppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
            Err(FenError::BadPlacement)
        ));
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1"),
            Err(FenError::BadSideToMove(_))
        ));
        assert!(matches!(
            Board::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq z9 0 1"),
            Err(FenError::BadEnPassant(_))
        ));
    }

    #[test]
    fn make_unmake_restores_the_exact_position() {
        let mut board = Board::from_fen(KIWIPETE).unwrap();
        let reference = board.clone();

        for mv in generate(&board, GenType::Legal) {
            board.make(mv);
            board.unmake();
            assert!(board == reference, "{} corrupted the position", mv);
            assert_eq!(board.get_hash(), reference.get_hash());
            assert_eq!(board.history_len(), reference.history_len());
        }
    }

    #[test]
    fn running_hash_matches_recomputation() {
        let mut board = Board::default();
        for mv_str in ["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "g8f6"] {
            board.make_from_str(mv_str).unwrap();
            assert_eq!(board.get_hash(), board.compute_zobrist());
        }
        for _ in 0..6 {
            board.unmake();
            assert_eq!(board.get_hash(), board.compute_zobrist());
        }
        assert_eq!(board, Board::default());
    }

    #[test]
    fn transpositions_hash_equal() {
        let mut a = Board::default();
        for mv in ["e2e4", "e7e5", "g1f3", "b8c6"] {
            a.make_from_str(mv).unwrap();
        }
        let mut b = Board::default();
        for mv in ["g1f3", "e7e5", "e2e4", "b8c6"] {
            b.make_from_str(mv).unwrap();
        }
        // Placement, side, rights and en passant coincide (the move clocks
        // differ, and hashing ignores them)
        let fields = |board: &Board| {
            board
                .get_fen()
                .split(' ')
                .take(4)
                .map(String::from)
                .collect::<Vec<_>>()
        };
        assert_eq!(fields(&a), fields(&b));
        assert_eq!(a.get_hash(), b.get_hash());
    }

    #[test]
    fn en_passant_capture_removes_the_bypassing_pawn() {
        let mut board =
            Board::from_fen("rnbqkbnr/ppp1pppp/8/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 3")
                .unwrap();
        let ep = generate(&board, GenType::Legal)
            .into_iter()
            .find(|m| m.flags.contains(MoveFlags::EN_PASSANT))
            .expect("e5xd6 en passant is legal here");
        assert_eq!(ep.to_string(), "e5d6");
        assert!(ep.is_capture());

        board.make(ep);
        assert_eq!(board.piece_at(parse_square("d5").unwrap()), None);
        assert_eq!(
            board.piece_at(parse_square("d6").unwrap()),
            Some(Piece::new(PieceKind::Pawn, White))
        );
    }

    #[test]
    fn king_and_rook_moves_strip_castling_rights() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();

        board.make_from_str("a1a2").unwrap();
        assert_eq!(board.castling_rights().get(White), (true, false));

        board.make_from_str("e8d8").unwrap();
        assert_eq!(board.castling_rights().get(Black), (false, false));

        board.make_from_str("h1h8").unwrap();
        assert_eq!(board.castling_rights().get(White), (false, false));

        board.unmake();
        board.unmake();
        board.unmake();
        assert_eq!(board.castling_rights(), CastlingRights::all());
    }

    #[test]
    fn castling_relocates_the_rook() {
        let mut board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        board.make_from_str("e1g1").unwrap();
        assert_eq!(
            board.piece_at(parse_square("f1").unwrap()),
            Some(Piece::new(PieceKind::Rook, White))
        );
        assert_eq!(board.piece_at(parse_square("h1").unwrap()), None);

        board.make_from_str("e8c8").unwrap();
        assert_eq!(
            board.piece_at(parse_square("d8").unwrap()),
            Some(Piece::new(PieceKind::Rook, Black))
        );
        assert_eq!(board.piece_at(parse_square("a8").unwrap()), None);

        board.unmake();
        board.unmake();
        assert_eq!(board.get_fen(), "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1");
    }

    #[test]
    fn clocks_follow_pawn_moves_and_captures() {
        let mut board = Board::default();
        board.make_from_str("g1f3").unwrap();
        assert_eq!(board.halfmove_clock(), 1);
        assert_eq!(board.fullmove_number(), 1);

        board.make_from_str("d7d5").unwrap();
        assert_eq!(board.halfmove_clock(), 0);
        assert_eq!(board.fullmove_number(), 2);
    }
}
