#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use mimalloc::MiMalloc;
use std::time::Instant;

use crate::board::Board;
use crate::move_generator::{generate, GenType};

pub mod board;
pub mod castling;
pub mod evaluation;
pub mod history;
pub mod r#move;
pub mod move_generator;
pub mod movelist;
pub mod notation;
pub mod piece;
pub mod search;
pub mod square;
pub mod transposition_table;
pub mod uci;
pub mod zob_hash;

/// Walks the move tree to the given depth from the start position or a FEN,
/// printing exact node counts per depth
pub fn perft(depth: u32, fen: Option<String>) {
    let mut board = match fen {
        None => Board::default(),
        Some(f) => match Board::from_fen(&f) {
            Ok(b) => b,
            Err(e) => {
                eprintln!("{}", e);
                return;
            }
        },
    };
    println!("{}\n", board);
    println!("depth nodes\n--------");
    for d in 0..depth + 1 {
        let start = Instant::now();
        let nodes = perft_nodes(&mut board, d);
        let elapsed = start.elapsed();
        println!(
            "{}     {} ({}s, {} nps)",
            d,
            nodes,
            elapsed.as_secs_f32(),
            nodes as f32 / elapsed.as_secs_f32()
        );
    }
}

pub fn perft_nodes(board: &mut Board, depth: u32) -> u128 {
    if depth == 0 {
        return 1;
    }
    let moves = generate(board, GenType::Legal);
    if depth == 1 {
        return moves.len() as u128;
    }
    let mut nodes = 0u128;
    for mv in moves {
        board.make(mv);
        nodes += perft_nodes(board, depth - 1);
        board.unmake()
    }
    nodes
}
