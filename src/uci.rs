use crate::board::Board;
use crate::r#move::Move;
use crate::search::{Search, SearchOptions, SearchReport};

use regex::Regex;
use rustyline::config::Configurer;
use rustyline::Editor;
use std::collections::HashMap;
use std::time::Duration;

/// The stdin/stdout protocol adapter. Commands mutate the held board;
/// `go` hands it to the search session and reports the result.
pub struct UCI {
    board: Board,
    search: Search,
    editor: Editor<()>,
    debug_mode: bool,
}

impl Default for UCI {
    fn default() -> Self {
        let mut editor = Editor::<()>::new();
        editor.set_auto_add_history(true);
        UCI {
            board: Board::default(),
            search: Search::new(),
            editor,
            debug_mode: false,
        }
    }
}

impl UCI {
    /// Blocks on stdin until `quit` or end of input
    pub fn run(&mut self) {
        while let Ok(line) = self.editor.readline("") {
            match self.handle_command(&line) {
                Ok(UCIOkCode::ShouldQuit) => break,
                Err(UCIErrCode::BadCommand(cmd)) => {
                    eprintln!("Unknown or badly formed UCI command: {}", cmd)
                }
                Err(UCIErrCode::BadFen(reason)) => {
                    eprintln!("Rejected FEN: {}", reason)
                }
                Err(UCIErrCode::MissingArg(arg)) => {
                    eprintln!("Missing an argument: {} {} <- here", line.trim(), arg)
                }
                _ => (),
            }
        }
    }

    fn handle_command(&mut self, line: &str) -> Result<UCIOkCode, UCIErrCode> {
        let tokens: Vec<String> = Self::args_regex()
            .find_iter(line)
            .map(|m| m.as_str().to_string())
            .collect();
        let cmd = match tokens.first() {
            Some(c) => c.to_lowercase(),
            None => return Err(UCIErrCode::NoCommand),
        };

        match cmd.as_str() {
            "uci" => {
                Self::send(UCICommand::Id);
                Self::send(UCICommand::UciOk);
            }
            "debug" => {
                self.debug_mode = tokens.get(1).map(|s| s.to_lowercase()) == Some("on".to_string())
            }
            "isready" => Self::send(UCICommand::ReadyOk),
            "ucinewgame" => self.board = Board::default(),
            "position" => self.handle_position(&tokens[1..])?,
            "go" => {
                let options = Self::parse_go_args(&self.board, &tokens[1..]);
                let report = self.search.find_best_move(&mut self.board, &options);
                Self::send(UCICommand::BestMove(report.best_move.as_ref()));
            }
            // The search runs synchronously; there is nothing to interrupt
            "stop" => (),
            // Not part of the UCI protocol, but handy at the prompt
            "show" => println!("{}", self.board),
            "quit" => return Ok(UCIOkCode::ShouldQuit),
            _ => return Err(UCIErrCode::BadCommand(cmd)),
        }

        Ok(UCIOkCode::OkCommand)
    }

    fn handle_position(&mut self, args: &[String]) -> Result<(), UCIErrCode> {
        let first = match args.first() {
            Some(f) => f.to_lowercase(),
            None => return Err(UCIErrCode::MissingArg(String::from("<startpos | fen>"))),
        };

        let mut index = 1;
        self.board = match first.as_str() {
            "startpos" => Board::default(),
            "fen" => {
                if args.len() < 7 {
                    return Err(UCIErrCode::MissingArg(String::from("<6 FEN fields>")));
                }
                index = 7;
                Board::from_fen(&args[1..7].join(" "))
                    .map_err(|e| UCIErrCode::BadFen(e.to_string()))?
            }
            other => return Err(UCIErrCode::BadCommand(format!("position {}", other))),
        };

        if args.get(index).map(|s| s.to_lowercase()) == Some("moves".to_string()) {
            // Applied through the legal move list; the first token that does
            // not match a legal move ends the sequence
            for move_str in &args[index + 1..] {
                if let Err(reason) = self.board.make_from_str(&move_str.to_lowercase()) {
                    if self.debug_mode {
                        eprintln!("stopped applying moves at {}: {}", move_str, reason);
                    }
                    break;
                }
            }
        }

        Ok(())
    }

    pub fn send(command: UCICommand) {
        match command {
            UCICommand::Id => println!("id name Pangolin\nid author the pangolin authors"),
            UCICommand::UciOk => println!("uciok"),
            UCICommand::ReadyOk => println!("readyok"),
            UCICommand::BestMove(Some(mv)) => println!("bestmove {}", mv),
            UCICommand::BestMove(None) => println!("bestmove 0000"),
            UCICommand::Info(report) => println!("info {}", report),
        }
    }

    fn parse_go_args(board: &Board, args: &[String]) -> SearchOptions {
        let valid_args = [
            "depth",
            "movetime",
            "wtime",
            "btime",
            "winc",
            "binc",
            "movestogo",
            "infinite",
        ];

        let mut arg_value_map: HashMap<String, String> = HashMap::new();
        let mut current_arg = String::new();
        for word in args {
            let lowered = word.to_lowercase();
            if valid_args.contains(&lowered.as_str()) {
                arg_value_map.insert(lowered, String::new());
                current_arg = word.to_lowercase();
            } else if let Some(value) = arg_value_map.get_mut(&current_arg) {
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(word);
            }
        }

        let millis = |key: &str| -> Option<Duration> {
            arg_value_map
                .get(key)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_millis)
        };

        let mut options = SearchOptions {
            infinite: arg_value_map.contains_key("infinite"),
            depth: arg_value_map.get("depth").and_then(|v| v.parse().ok()),
            move_time: millis("movetime"),
            moves_to_go: arg_value_map.get("movestogo").and_then(|v| v.parse().ok()),
            ..Default::default()
        };

        let (clock_key, increment_key) = if board.side_to_move() == crate::piece::Color::White {
            ("wtime", "winc")
        } else {
            ("btime", "binc")
        };
        options.clock = millis(clock_key);
        options.increment = millis(increment_key);

        options
    }

    fn args_regex() -> Regex {
        Regex::new(r#"(".*?"|[^"\s]+)"#).unwrap()
    }
}

enum UCIOkCode {
    OkCommand,
    ShouldQuit,
}

enum UCIErrCode {
    MissingArg(String),
    NoCommand,
    BadCommand(String),
    BadFen(String),
}

pub enum UCICommand<'a> {
    Id,
    UciOk,
    ReadyOk,
    BestMove(Option<&'a Move>),
    Info(&'a SearchReport),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::START_FEN;

    #[test]
    fn position_startpos_with_moves() {
        let mut uci = UCI::default();
        assert!(uci
            .handle_command("position startpos moves e2e4 e7e5")
            .is_ok());
        assert_eq!(
            uci.board.get_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2"
        );
    }

    #[test]
    fn position_fen_loads_all_six_fields() {
        let mut uci = UCI::default();
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        assert!(uci
            .handle_command(&format!("position fen {}", fen))
            .is_ok());
        assert_eq!(uci.board.get_fen(), fen);
    }

    #[test]
    fn move_application_stops_at_the_first_illegal_token() {
        let mut uci = UCI::default();
        assert!(uci
            .handle_command("position startpos moves e2e4 e2e4 e7e5")
            .is_ok());
        // Only the first move applied; the bogus second token ends the list
        assert_eq!(
            uci.board.get_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1"
        );
    }

    #[test]
    fn bad_fen_leaves_the_board_untouched() {
        let mut uci = UCI::default();
        assert!(uci
            .handle_command("position fen not a real fen at all zzz")
            .is_err());
        assert_eq!(uci.board.get_fen(), START_FEN);
    }

    #[test]
    fn commands_are_case_insensitive() {
        let mut uci = UCI::default();
        assert!(uci.handle_command("POSITION STARTPOS MOVES E2E4").is_ok());
        assert_eq!(uci.board.side_to_move(), crate::piece::Color::Black);
    }

    #[test]
    fn go_args_fill_the_search_options() {
        let board = Board::default();

        let options = UCI::parse_go_args(
            &board,
            &["depth".into(), "4".into(), "movetime".into(), "250".into()],
        );
        assert_eq!(options.depth, Some(4));
        assert_eq!(options.move_time, Some(Duration::from_millis(250)));

        // White to move reads the white clock
        let options = UCI::parse_go_args(
            &board,
            &[
                "wtime".into(),
                "60000".into(),
                "btime".into(),
                "90000".into(),
                "movestogo".into(),
                "20".into(),
            ],
        );
        assert_eq!(options.clock, Some(Duration::from_millis(60000)));
        assert_eq!(options.moves_to_go, Some(20));

        let options = UCI::parse_go_args(&board, &["infinite".into()]);
        assert!(options.infinite);
    }
}
