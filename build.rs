use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use rand_mt::Mt64;

// Zobrist keys are baked in at compile time so that identical positions
// hash identically across runs and across builds.
const ZOBRIST_SEED: u64 = 0x9e3779b97f4a7c15;

fn main() {
    let out_dir = env::var_os("OUT_DIR").unwrap();
    let zobrist_file = Path::new(&out_dir).join("zobrist_keys.rs");
    let mut file = File::create(zobrist_file).unwrap();

    let mut rng = Mt64::new(ZOBRIST_SEED);

    // 13 rows of piece/square keys: row 0 stays unused (the empty square),
    // rows 1..=6 are the white pieces, rows 7..=12 the black pieces.
    let piece_keys: Vec<Vec<u64>> = (0..13)
        .map(|_| (0..64).map(|_| rng.next_u64()).collect())
        .collect();
    let castling_keys: Vec<u64> = (0..16).map(|_| rng.next_u64()).collect();
    let en_passant_keys: Vec<u64> = (0..8).map(|_| rng.next_u64()).collect();
    let side_to_move_key = rng.next_u64();

    writeln!(&mut file, "impl ZobristHasher {{").unwrap();
    inject_2d_array(
        &mut file,
        "pub const PIECE_KEYS: [[u64; 64]; 13]",
        &piece_keys,
    );
    inject_array(&mut file, "pub const CASTLING_KEYS: [u64; 16]", &castling_keys);
    inject_array(
        &mut file,
        "pub const EN_PASSANT_KEYS: [u64; 8]",
        &en_passant_keys,
    );
    writeln!(
        &mut file,
        "pub const SIDE_TO_MOVE_KEY: u64 = {};",
        side_to_move_key
    )
    .unwrap();
    writeln!(&mut file, "}}").unwrap();
}

fn inject_array(file: &mut File, signature: &str, values: &[u64]) {
    write!(file, "{} = [", signature).unwrap();
    for v in values {
        write!(file, "{},", v).unwrap();
    }
    writeln!(file, "];").unwrap();
}

fn inject_2d_array(file: &mut File, signature: &str, values: &[Vec<u64>]) {
    write!(file, "{} = [", signature).unwrap();
    for row in values {
        write!(file, "[").unwrap();
        for v in row {
            write!(file, "{},", v).unwrap();
        }
        write!(file, "],").unwrap();
    }
    writeln!(file, "];").unwrap();
}
