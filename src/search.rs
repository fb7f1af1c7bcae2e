use std::cmp::Reverse;
use std::fmt::Display;
use std::time::{Duration, Instant};

use crate::board::Board;
use crate::evaluation::{self, piece_value, Score, DRAW_SCORE, INFINITY, MATE_VALUE};
use crate::move_generator::{generate, GenType};
use crate::movelist::MoveList;
use crate::piece::{Color, PieceKind};
use crate::r#move::Move;
use crate::transposition_table::{NodeType, TranspositionTable, TT_SIZE};
use crate::uci::{UCICommand, UCI};

pub const MAX_PLY: usize = 64;

/// A struct to group together every limit the protocol can put on a search.
/// Avoids passing around six arguments in functions
#[derive(Clone, Default)]
pub struct SearchOptions {
    pub depth: Option<i32>,
    pub move_time: Option<Duration>,
    pub clock: Option<Duration>,
    pub increment: Option<Duration>,
    pub moves_to_go: Option<u32>,
    pub infinite: bool,
}

impl SearchOptions {
    /// Resolves the limits into an absolute time budget, if there is one.
    /// An explicit movetime is used verbatim; a clock is stretched over the
    /// remaining moves with a safety margin held back.
    fn time_budget(&self) -> Option<Duration> {
        if self.infinite {
            return None;
        }
        if let Some(movetime) = self.move_time {
            return Some(movetime);
        }
        let clock = self.clock?;

        let moves_to_go = self.moves_to_go.unwrap_or(30);
        let per_move = (clock / moves_to_go).max(Duration::from_millis(50));
        let margin = clock / 20;
        Some(per_move.min(clock.saturating_sub(margin)))
    }

    fn max_depth(&self) -> i32 {
        if let Some(depth) = self.depth {
            return depth.clamp(1, MAX_PLY as i32);
        }
        if self.infinite || self.move_time.is_some() || self.clock.is_some() {
            MAX_PLY as i32
        } else {
            6
        }
    }
}

#[derive(Clone)]
pub struct SearchReport {
    pub best_move: Option<Move>,
    pub score: Score,
    pub depth: i32,
    pub nodes: u64,
    pub time: Duration,
}

impl Display for SearchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let seconds = self.time.as_secs_f64().max(0.001);
        write!(
            f,
            "depth {} score {} nodes {} nps {} pv {}",
            self.depth,
            self.score,
            self.nodes,
            (self.nodes as f64 / seconds) as u64,
            match &self.best_move {
                Some(mv) => mv.to_string(),
                None => String::from("0000"),
            }
        )
    }
}

#[derive(Clone, Copy, Default)]
struct KillerMoves {
    primary: Move,
    secondary: Move,
}

/// One search session. Owns the transposition table, the killer slots and
/// the history heuristic; all three are reset when a new search starts, so
/// results never leak between positions.
pub struct Search {
    transposition_table: TranspositionTable,
    killers: [KillerMoves; MAX_PLY],
    history: [[[Score; 64]; 64]; 2],
    nodes: u64,
    start_time: Instant,
    time_budget: Option<Duration>,
    stopped: bool,
}

impl Search {
    pub fn new() -> Search {
        Search {
            transposition_table: TranspositionTable::new(TT_SIZE),
            killers: [KillerMoves::default(); MAX_PLY],
            history: [[[0; 64]; 64]; 2],
            nodes: 0,
            start_time: Instant::now(),
            time_budget: None,
            stopped: false,
        }
    }

    /// Iterative-deepening driver. Emits one `info` line per completed
    /// iteration and returns the best move of the last one; a timed-out
    /// iteration is discarded.
    pub fn find_best_move(&mut self, board: &mut Board, options: &SearchOptions) -> SearchReport {
        self.transposition_table.clear();
        self.killers = [KillerMoves::default(); MAX_PLY];
        self.history = [[[0; 64]; 64]; 2];
        self.nodes = 0;
        self.start_time = Instant::now();
        self.time_budget = options.time_budget();
        self.stopped = false;

        let mut root_moves = generate(board, GenType::Legal);
        if root_moves.is_empty() {
            return SearchReport {
                best_move: None,
                score: 0,
                depth: 0,
                nodes: 0,
                time: self.start_time.elapsed(),
            };
        }

        let mut global_best = root_moves.get(0).unwrap_or(Move::NULL);
        let mut global_score = -INFINITY;
        let mut depth_reached = 0;

        for depth in 1..=options.max_depth() {
            let mut alpha = -INFINITY;
            let beta = INFINITY;
            let mut iteration_best = None;
            let mut iteration_score = -INFINITY;

            // The previous iteration's winner goes to the front
            self.score_and_sort(global_best, 0, board.side_to_move(), &mut root_moves);

            for mv in root_moves.as_slice().iter().copied() {
                if !self.has_time_left() {
                    break;
                }
                board.make(mv);
                let score = -self.negamax(board, depth - 1, -beta, -alpha, 1, mv);
                board.unmake();
                if self.stopped {
                    break;
                }

                if iteration_best.is_none() || score > iteration_score {
                    iteration_best = Some(mv);
                    iteration_score = score;
                }
                if score > alpha {
                    alpha = score;
                }
            }

            if self.stopped {
                break;
            }
            if let Some(best) = iteration_best {
                global_best = best;
                global_score = iteration_score;
                depth_reached = depth;

                UCI::send(UCICommand::Info(&SearchReport {
                    best_move: Some(best),
                    score: iteration_score,
                    depth,
                    nodes: self.nodes,
                    time: self.start_time.elapsed(),
                }));
            }
        }

        SearchReport {
            best_move: Some(global_best),
            score: if global_score == -INFINITY {
                0
            } else {
                global_score
            },
            depth: depth_reached,
            nodes: self.nodes,
            time: self.start_time.elapsed(),
        }
    }

    fn negamax(
        &mut self,
        board: &mut Board,
        depth: i32,
        mut alpha: Score,
        beta: Score,
        ply: usize,
        previous_move: Move,
    ) -> Score {
        if !self.has_time_left() {
            return evaluation::evaluate(board);
        }
        // Check extensions can keep the depth from shrinking; the ply cap
        // bounds the recursion regardless
        if ply >= MAX_PLY {
            return evaluation::evaluate(board);
        }
        if depth <= 0 {
            return self.quiescence(board, alpha, beta, ply);
        }

        self.nodes += 1;

        let alpha_original = alpha;
        let key = board.get_hash();
        let mover = board.side_to_move();
        let in_check = board.in_check(mover);

        let (tt_move, tt_score) = self.transposition_table.probe(key, depth, alpha, beta, ply);
        if let Some(score) = tt_score {
            return score;
        }
        let tt_move = tt_move.unwrap_or(Move::NULL);

        // Null move: hand the opponent a free tempo at reduced depth; if the
        // position still beats beta the subtree is not worth a full search.
        // Skipped in check and in pawn endings, where zugzwang bites.
        if !in_check && depth >= 3 && board.has_non_pawn_material(mover) {
            board.make(Move::NULL);
            let null_score = -self.negamax(board, depth - 3, -beta, -beta + 1, ply + 1, Move::NULL);
            board.unmake();
            if self.stopped {
                return alpha;
            }
            if null_score >= beta {
                return beta;
            }
        }

        let mut moves = generate(board, GenType::Legal);
        if moves.is_empty() {
            // Shorter mates score higher than longer ones
            return if in_check {
                -(MATE_VALUE - ply as Score)
            } else {
                DRAW_SCORE
            };
        }
        self.score_and_sort(tt_move, ply, mover, &mut moves);

        let mut best_score = -INFINITY;
        let mut best_move = Move::NULL;

        for (move_index, mv) in moves.as_slice().iter().copied().enumerate() {
            if self.stopped {
                break;
            }
            board.make(mv);

            let gave_check = board.in_check(board.side_to_move());
            let passed_pawn_push = is_passed_pawn_push(board, mv, mover);
            let recapture = mv.is_capture()
                && previous_move.to == mv.to
                && previous_move.from != previous_move.to;

            let extension = if gave_check || passed_pawn_push || recapture {
                1
            } else {
                0
            };
            let mut next_depth = depth - 1 + extension;

            // Late move reduction for quiet moves sorted far down the list
            if !mv.is_capture()
                && !mv.is_promotion()
                && depth >= 3
                && move_index >= 4
                && !gave_check
                && !recapture
                && mv != tt_move
            {
                next_depth -= 1;
            }
            if next_depth < 0 {
                next_depth = 0;
            }

            let score = -self.negamax(board, next_depth, -beta, -alpha, ply + 1, mv);
            board.unmake();
            if self.stopped {
                return alpha;
            }

            if score > best_score {
                best_score = score;
                best_move = mv;
            }
            if score > alpha {
                alpha = score;
                if alpha >= beta {
                    if !mv.is_capture() && !mv.is_promotion() && ply < MAX_PLY {
                        let killers = &mut self.killers[ply];
                        if killers.primary != mv {
                            killers.secondary = killers.primary;
                            killers.primary = mv;
                        }
                        self.history[mover.index()][mv.from][mv.to] += depth * depth;
                    }
                    break;
                }
            }
        }

        let node_type = if best_score <= alpha_original {
            NodeType::UpperBound
        } else if best_score >= beta {
            NodeType::LowerBound
        } else {
            NodeType::Exact
        };
        self.transposition_table
            .store(key, depth, ply, best_score, node_type, best_move);

        best_score
    }

    /// Capture-only search at the horizon, to keep the static evaluation
    /// from firing in the middle of an exchange
    fn quiescence(&mut self, board: &mut Board, mut alpha: Score, beta: Score, ply: usize) -> Score {
        if !self.has_time_left() {
            return evaluation::evaluate(board);
        }

        self.nodes += 1;

        let stand_pat = evaluation::evaluate(board);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut captures = generate(board, GenType::Captures);
        self.score_and_sort(Move::NULL, ply, board.side_to_move(), &mut captures);

        for mv in captures.as_slice().iter().copied() {
            if self.stopped {
                break;
            }
            board.make(mv);
            let score = -self.quiescence(board, -beta, -alpha, ply + 1);
            board.unmake();
            if self.stopped {
                return alpha;
            }

            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }

    /// Stable sort keeps equal-score moves in generation order, which keeps
    /// the search deterministic.
    fn score_and_sort(&self, tt_move: Move, ply: usize, mover: Color, moves: &mut MoveList) {
        let killers = if ply < MAX_PLY {
            self.killers[ply]
        } else {
            KillerMoves::default()
        };

        moves.as_mut_slice().sort_by_key(|mv| {
            let score = if *mv == tt_move {
                1_000_000
            } else if mv.is_capture() {
                let mut score = 900_000 + mvv_lva(mv);
                if let Some(kind) = mv.promotion_kind() {
                    score += piece_value(kind);
                }
                score
            } else if let Some(kind) = mv.promotion_kind() {
                850_000 + piece_value(kind)
            } else if *mv == killers.primary {
                800_000
            } else if *mv == killers.secondary {
                795_000
            } else {
                self.history[mover.index()][mv.from][mv.to]
            };
            Reverse(score)
        });
    }

    fn has_time_left(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        let budget = match self.time_budget {
            Some(b) => b,
            None => return true,
        };
        if self.start_time.elapsed() >= budget {
            self.stopped = true;
            false
        } else {
            true
        }
    }
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

/// Most-valuable-victim / least-valuable-attacker capture ordering
fn mvv_lva(mv: &Move) -> Score {
    let victim = mv.captured_piece.map_or(0, |p| piece_value(p.kind));
    victim * 10 - piece_value(mv.moving_piece.kind)
}

/// A quiet pawn advance into a square no enemy pawn can contest ahead.
/// Called after the move has been made.
fn is_passed_pawn_push(board: &Board, mv: Move, mover: Color) -> bool {
    if mv.moving_piece.kind != PieceKind::Pawn || mv.is_capture() {
        return false;
    }
    let file = crate::square::file_of(mv.to) as i32;
    let rank = crate::square::rank_of(mv.to) as i32;
    !evaluation::enemy_pawn_ahead(board, mover, file, rank)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notation;

    fn run(fen: &str, depth: i32) -> SearchReport {
        let mut board = Board::from_fen(fen).unwrap();
        let options = SearchOptions {
            depth: Some(depth),
            ..Default::default()
        };
        Search::new().find_best_move(&mut board, &options)
    }

    #[test]
    fn finds_mate_in_one() {
        let fen = "4k3/8/4K3/8/8/8/8/7R w - - 0 1";
        let report = run(fen, 3);
        let best = report.best_move.expect("a move exists");

        let board = Board::from_fen(fen).unwrap();
        let san = notation::to_san(&board, best);
        assert!(san.ends_with('#'), "expected mate, got {}", san);
        assert!(report.score >= MATE_VALUE - MAX_PLY as Score);
    }

    #[test]
    fn stalemated_positions_report_no_move() {
        // Black has no legal move to report
        let mut board = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let report = Search::new().find_best_move(
            &mut board,
            &SearchOptions {
                depth: Some(3),
                ..Default::default()
            },
        );
        assert!(report.best_move.is_none());
    }

    #[test]
    fn search_is_repeatable() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        let first = run(fen, 4);
        let second = run(fen, 4);
        assert_eq!(first.best_move, second.best_move);
        assert_eq!(first.score, second.score);
        assert_eq!(first.nodes, second.nodes);
    }

    #[test]
    fn search_leaves_the_board_untouched() {
        let mut board = Board::default();
        let reference = board.clone();
        let options = SearchOptions {
            depth: Some(3),
            ..Default::default()
        };
        Search::new().find_best_move(&mut board, &options);
        assert!(board == reference);
    }

    #[test]
    fn grabs_a_hanging_queen() {
        // The black queen hangs on d5, one knight jump away
        let report = run("4k3/8/8/3q4/8/4N3/8/4K3 w - - 0 1", 3);
        let best = report.best_move.unwrap();
        assert_eq!(best.to_string(), "e3d5");
    }

    #[test]
    fn respects_an_absolute_movetime() {
        let mut board = Board::default();
        let options = SearchOptions {
            move_time: Some(Duration::from_millis(100)),
            ..Default::default()
        };
        let start = Instant::now();
        let report = Search::new().find_best_move(&mut board, &options);
        assert!(start.elapsed() < Duration::from_millis(500));
        assert!(report.best_move.is_some());
    }

    #[test]
    fn clock_budget_is_a_fraction_of_the_clock() {
        let options = SearchOptions {
            clock: Some(Duration::from_millis(3000)),
            ..Default::default()
        };
        assert_eq!(options.time_budget(), Some(Duration::from_millis(100)));

        let verbatim = SearchOptions {
            move_time: Some(Duration::from_millis(3000)),
            ..Default::default()
        };
        assert_eq!(verbatim.time_budget(), Some(Duration::from_millis(3000)));
    }
}
