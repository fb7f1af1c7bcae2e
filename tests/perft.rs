use pangolin::board::Board;
use pangolin::perft_nodes;

#[test]
fn start_position_node_counts() {
    let mut board = Board::default();
    assert_eq!(perft_nodes(&mut board, 1), 20);
    assert_eq!(perft_nodes(&mut board, 2), 400);
    assert_eq!(perft_nodes(&mut board, 3), 8902);
    assert_eq!(perft_nodes(&mut board, 4), 197_281);
}

#[test]
#[ignore = "slow; run with --ignored for full conformance"]
fn start_position_node_counts_deep() {
    let mut board = Board::default();
    assert_eq!(perft_nodes(&mut board, 5), 4_865_609);
    assert_eq!(perft_nodes(&mut board, 6), 119_060_324);
}

// Positions from https://www.chessprogramming.org/Perft_Results, picked to
// exercise castling, en passant, promotions and pins
#[test]
fn kiwipete_node_counts() {
    let mut board =
        Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
            .unwrap();
    assert_eq!(perft_nodes(&mut board, 1), 48);
    assert_eq!(perft_nodes(&mut board, 2), 2039);
    assert_eq!(perft_nodes(&mut board, 3), 97_862);
}

#[test]
fn endgame_pin_position_node_counts() {
    let mut board = Board::from_fen("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1").unwrap();
    assert_eq!(perft_nodes(&mut board, 1), 14);
    assert_eq!(perft_nodes(&mut board, 2), 191);
    assert_eq!(perft_nodes(&mut board, 3), 2812);
    assert_eq!(perft_nodes(&mut board, 4), 43_238);
}

#[test]
fn promotion_heavy_position_node_counts() {
    let mut board =
        Board::from_fen("n1n5/PPPk4/8/8/8/8/4Kppp/5N1N b - - 0 1").unwrap();
    assert_eq!(perft_nodes(&mut board, 1), 24);
    assert_eq!(perft_nodes(&mut board, 2), 496);
    assert_eq!(perft_nodes(&mut board, 3), 9483);
}
