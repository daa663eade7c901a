//! The rules oracle: a chess game whose legality, notation and results are delegated to shakmaty.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use std::collections::HashMap;
use std::fmt;
use lazy_static::lazy_static;
use regex::Regex;
use shakmaty::{Board, CastlingMode, Chess, Color, EnPassantMode, Move, Piece, Position, Role};
use shakmaty::Square;
use shakmaty::fen::Fen;
use shakmaty::san::{San, SanPlus};
use shakmaty::uci::Uci;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Error type used by methods in the `game` module
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Error {
    /// Cannot parse string
    ParseError,
    /// Illegal move
    IllegalMove,
    /// The FEN describes a position that cannot occur in a game
    InvalidPosition,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;

        match self {
            ParseError => "cannot parse string",
            IllegalMove => "illegal move",
            InvalidPosition => "invalid position",
        }.fmt(f)
    }
}

impl std::error::Error for Error { }

/// Result type used by methods in the `game` module
pub type Result<T> = std::result::Result<T, Error>;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// The result of a game
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameResult {
    /// The given color has won.
    Win(Color, Option<WinReason>),
    /// The game has ended in a draw.
    Draw(Option<DrawReason>),
}

impl GameResult {
    /// The result as it appears at the end of PGN move text.
    pub fn score(&self) -> &'static str {
        match self {
            GameResult::Win(Color::White, _) => "1-0",
            GameResult::Win(Color::Black, _) => "0-1",
            GameResult::Draw(_) => "1/2-1/2",
        }
    }
}

impl fmt::Display for GameResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameResult::Win(_, Some(reason)) => format!("{} {{{}}}", self.score(), reason).fmt(f),
            GameResult::Draw(Some(reason)) => format!("{} {{{}}}", self.score(), reason).fmt(f),
            _ => self.score().fmt(f),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Win reason
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WinReason {
    /// The game was won by checkmate.
    Checkmate,
    /// One player's time ran out.
    Time,
}

impl fmt::Display for WinReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WinReason::Checkmate => "checkmate".fmt(f),
            WinReason::Time => "time expired".fmt(f),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Draw reason
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DrawReason {
    /// Stalemate
    Stalemate,
    /// Draw by the fifty-move rule
    FiftyMoves,
    /// Draw by three-fold repetition
    Repetition,
    /// Insufficient material
    Material,
}

impl fmt::Display for DrawReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrawReason::Stalemate => "stalemate".fmt(f),
            DrawReason::FiftyMoves => "fifty-move rule".fmt(f),
            DrawReason::Repetition => "repetition".fmt(f),
            DrawReason::Material => "insufficient material".fmt(f),
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A move that has been played, along with what is needed to describe it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    mv: Move,
    color: Color,
    san: String,
}

impl MoveRecord {
    /// The type of piece that moved.
    pub fn role(&self) -> Role {
        self.mv.role()
    }

    /// The side that made the move.
    pub fn color(&self) -> Color {
        self.color
    }

    /// The square the piece moved from.
    pub fn from(&self) -> Option<Square> {
        self.mv.from()
    }

    /// The square the piece moved to. For castling this is the king's destination.
    pub fn to(&self) -> Square {
        destination(&self.mv, self.color)
    }

    /// Returns true if a piece was captured.
    pub fn is_capture(&self) -> bool {
        self.mv.is_capture()
    }

    /// The piece a pawn was promoted to, if any.
    pub fn promotion(&self) -> Option<Role> {
        self.mv.promotion()
    }

    /// The move in Standard Algebraic Notation, including any check or mate suffix.
    pub fn san(&self) -> &str {
        &self.san
    }

    /// The move in coordinate notation, eg. `e7e8q`.
    pub fn uci(&self) -> String {
        self.mv.to_uci(CastlingMode::Standard).to_string()
    }
}

impl fmt::Display for MoveRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            self.uci().fmt(f)
        } else {
            self.san.fmt(f)
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
/// A chess game: the initial position, every move played since, and the result once there is one.
#[derive(Debug, Clone)]
pub struct Game {
    positions: Vec<Chess>,
    moves: Vec<MoveRecord>,
    result: Option<GameResult>,
}

impl Game {
    /// Creates a new game from the standard starting position
    pub fn new() -> Self {
        Game::starting_at(Chess::default())
    }

    /// Creates a new game using `pos` as the starting position
    pub fn starting_at(pos: Chess) -> Self {
        let mut game = Game {
            positions: vec![pos],
            moves: Vec::new(),
            result: None,
        };
        game.check_game_result();

        game
    }

    /// Creates a new game starting from a position in Forsyth-Edwards Notation.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let fen: Fen = fen.trim().parse().map_err(|_| { Error::ParseError })?;
        let pos: Chess = fen
            .into_position(CastlingMode::Standard)
            .map_err(|_| { Error::InvalidPosition })?;

        Ok(Game::starting_at(pos))
    }

    /// Returns to the standard starting position, forgetting every move and the result.
    pub fn reset(&mut self) {
        *self = Game::new();
    }

    /// Returns the current position
    pub fn position(&self) -> &Chess {
        self.positions.last().expect("INFALLIBLE")
    }

    /// Returns the position the game started from
    pub fn initial_position(&self) -> &Chess {
        &self.positions[0]
    }

    /// Returns the board of the current position
    pub fn board(&self) -> &Board {
        self.position().board()
    }

    /// Returns the side to move
    pub fn turn(&self) -> Color {
        self.position().turn()
    }

    /// Returns the piece on `sq`, if any
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board().piece_at(sq)
    }

    /// Returns every legal move of the piece on `sq`
    pub fn moves_from(&self, sq: Square) -> Vec<Move> {
        self.position()
            .legal_moves()
            .into_iter()
            .filter(|mv| { mv.from() == Some(sq) })
            .collect()
    }

    /// Returns the squares the piece on `sq` can move to. For castling this is where the king
    /// lands.
    pub fn destinations_from(&self, sq: Square) -> Vec<Square> {
        let color = self.turn();

        self.moves_from(sq).iter().map(|mv| { destination(mv, color) }).collect()
    }

    /// Finds the legal move from `from` to `to`. `promotion` is only considered if the move is a
    /// pawn promotion.
    pub fn legal_move(&self, from: Square, to: Square, promotion: Role) -> Option<Move> {
        let color = self.turn();

        self.position()
            .legal_moves()
            .into_iter()
            .find(|mv| {
                mv.from() == Some(from)
                    && destination(mv, color) == to
                    && mv.promotion().map_or(true, |role| { role == promotion })
            })
    }

    /// Returns the moves played so far, oldest first
    pub fn history(&self) -> &[MoveRecord] {
        &self.moves
    }

    /// Returns the current position in Forsyth-Edwards Notation
    pub fn fen(&self) -> String {
        Fen::from_position(self.position().clone(), EnPassantMode::Legal).to_string()
    }

    /// Returns the result of the game, or `None` if the game isn't over
    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    /// Sets the result of the game. Used for results the position can't show, such as time.
    pub fn set_result(&mut self, result: GameResult) {
        self.result = Some(result);
    }

    /// Returns true if the game has a result
    pub fn is_game_over(&self) -> bool {
        self.result.is_some()
    }

    /// Returns true if the side to move is in check
    pub fn in_check(&self) -> bool {
        self.position().is_check()
    }

    /// Returns true if the side to move has been checkmated
    pub fn in_checkmate(&self) -> bool {
        self.position().is_checkmate()
    }

    /// Returns true if the game has been drawn
    pub fn in_draw(&self) -> bool {
        matches!(self.result, Some(GameResult::Draw(_)))
    }

    /// Makes a move given in any common notation: SAN (`Nf3`, `exd5`, `O-O`), coordinate
    /// (`g1f3`, `e7e8q`) or long algebraic (`Ng1-f3`, `e4xd5`). Piece letters may be lower case.
    /// Promotions must name the piece.
    pub fn make_move_from_str(&mut self, mv: &str) -> Result<&MoveRecord> {
        let mv = self.parse_move(mv)?;

        Ok(self.push(mv))
    }

    /// Makes the move from `from` to `to`, promoting to `promotion` if the move is a promotion.
    pub fn make_move_from_coords(&mut self, from: Square, to: Square, promotion: Role)
    -> Result<&MoveRecord> {
        let mv = self.legal_move(from, to, promotion).ok_or(Error::IllegalMove)?;

        Ok(self.push(mv))
    }

    /// Undoes the last move. Returns false if there are no moves to undo.
    pub fn undo(&mut self) -> bool {
        if self.moves.pop().is_some() {
            self.positions.pop();
            if self.result.map_or(true, |result| { !is_time_result(result) }) {
                self.check_game_result();
            }
            true
        } else {
            false
        }
    }

    /// Plays a move already known to be legal in the current position
    fn push(&mut self, mv: Move) -> &MoveRecord {
        let pos = self.position().clone();
        let color = pos.turn();
        let san = SanPlus::from_move(pos.clone(), &mv).to_string();

        let mut next = pos;
        next.play_unchecked(&mv);
        self.positions.push(next);
        self.moves.push(MoveRecord { mv, color, san });

        self.check_game_result();

        self.moves.last().expect("INFALLIBLE")
    }

    /// Interprets `s` permissively, returning the first legal move it could describe
    fn parse_move(&self, s: &str) -> Result<Move> {
        let s = s.trim().trim_end_matches(|c: char| { matches!(c, '+' | '#' | '!' | '?') });
        if s.is_empty() {
            return Err(Error::ParseError);
        }

        if let Some(mv) = self.parse_san(s) {
            return Ok(mv);
        }

        // lower case piece letters, such as "nf3" or "bxc4"
        if s.starts_with(|c: char| { "nbrqk".contains(c) }) {
            let upper = s[..1].to_uppercase() + &s[1..];
            if let Some(mv) = self.parse_san(&upper) {
                return Ok(mv);
            }
        }

        if let Ok(uci) = s.parse::<Uci>() {
            if let Ok(mv) = uci.to_move(self.position()) {
                return Ok(mv);
            }
        }

        if let Some(caps) = LONG_MOVE.captures(s) {
            let role = caps.get(1)
                .and_then(|role| { role.as_str().chars().next() })
                .and_then(role_from_letter);
            let from: Square = caps[2].parse().map_err(|_| { Error::ParseError })?;
            let to: Square = caps[3].parse().map_err(|_| { Error::ParseError })?;
            let promotion = caps.get(4)
                .and_then(|promotion| { promotion.as_str().chars().next() })
                .and_then(role_from_letter);
            let color = self.turn();

            return self.position()
                .legal_moves()
                .into_iter()
                .find(|mv| {
                    mv.from() == Some(from)
                        && destination(mv, color) == to
                        && role.map_or(true, |role| { role == mv.role() })
                        && mv.promotion() == promotion
                })
                .ok_or(Error::IllegalMove);
        }

        Err(Error::IllegalMove)
    }

    fn parse_san(&self, s: &str) -> Option<Move> {
        s.parse::<San>().ok()?.to_move(self.position()).ok()
    }

    /// Checks if the game is over, and sets `self.result` appropriately
    fn check_game_result(&mut self) {
        let pos = self.position();

        self.result = if pos.is_checkmate() {
            Some(GameResult::Win(!pos.turn(), Some(WinReason::Checkmate)))
        } else if pos.is_stalemate() {
            Some(GameResult::Draw(Some(DrawReason::Stalemate)))
        } else if pos.is_insufficient_material() {
            Some(GameResult::Draw(Some(DrawReason::Material)))
        } else if pos.halfmoves() >= 100 {
            Some(GameResult::Draw(Some(DrawReason::FiftyMoves)))
        } else if self.three_fold_repetition() {
            Some(GameResult::Draw(Some(DrawReason::Repetition)))
        } else {
            None
        };
    }

    /// Returns true if the current position has occurred at least three times
    fn three_fold_repetition(&self) -> bool {
        let current = self.position();

        self.positions
            .iter()
            .filter(|pos| { same_position(pos, current) })
            .count() >= 3
    }

    /// Returns a PGN representation of the game, using the given tags.
    ///
    /// This method will add a "Result" tag, and, if needed, the "SetUp" and "FEN" tags to the
    /// given tags.
    pub fn to_pgn(&self, tags: &HashMap<String, String>) -> String {
        let mut tags = tags.to_owned();

        let initial_fen =
            Fen::from_position(self.initial_position().clone(), EnPassantMode::Legal).to_string();
        if initial_fen != Fen::from_position(Chess::default(), EnPassantMode::Legal).to_string() {
            tags.insert("SetUp".to_owned(), "1".to_owned());
            tags.insert("FEN".to_owned(), initial_fen);
        }

        let result = self.result.map_or("*", |result| { result.score() });
        tags.insert("Result".to_owned(), result.to_owned());

        let mut tag_list = String::new();
        for &name in &["Event", "Site", "Date", "Round", "White", "Black", "Result"] {
            let value = match (name, tags.remove(name)) {
                (_, Some(value)) => value,
                ("Date", None) => "????.??.??".to_owned(),
                (_, None) => "?".to_owned(),
            };

            tag_list += &format!("[{} \"{}\"]\n", name, value);
        }

        let mut names: Vec<_> = tags.keys().collect();
        names.sort_unstable();

        for name in names {
            tag_list += &format!("[{} \"{}\"]\n", name, tags[name]);
        }

        let mut words = Vec::new();
        let mut number = self.initial_position().fullmoves().get();
        for (i, record) in self.moves.iter().enumerate() {
            if record.color == Color::White {
                words.push(format!("{}.", number));
            } else if i == 0 {
                words.push(format!("{}...", number));
            }
            words.push(record.san.clone());
            if record.color == Color::Black {
                number += 1;
            }
        }
        words.push(result.to_owned());

        let mut move_text = String::new();
        let mut width = 0;
        for word in words {
            // split into lines of no more than 80 bytes each
            if width + word.len() < 80 && width > 0 {
                move_text += " ";
                width += 1;
            } else if width > 0 {
                move_text += "\n";
                width = 0;
            }
            width += word.len();
            move_text += &word;
        }

        format!("{}\n{}\n", tag_list, move_text)
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

lazy_static! {
    static ref LONG_MOVE: Regex =
        Regex::new(r"^([pnbrqkPNBRQK])?([a-h][1-8])[x-]?([a-h][1-8])=?([qrbnQRBN])?$")
        .expect("INFALLIBLE");
}

/// Returns the piece type for an English piece letter of either case.
pub fn role_from_letter(c: char) -> Option<Role> {
    match c.to_ascii_lowercase() {
        'p' => Some(Role::Pawn),
        'n' => Some(Role::Knight),
        'b' => Some(Role::Bishop),
        'r' => Some(Role::Rook),
        'q' => Some(Role::Queen),
        'k' => Some(Role::King),
        _ => None,
    }
}

/// Where the moving piece ends up. shakmaty represents castling as king-takes-rook, but players
/// name the king's destination.
fn destination(mv: &Move, color: Color) -> Square {
    match mv.castling_side() {
        Some(side) => side.king_to(color),
        None => mv.to(),
    }
}

fn same_position(a: &Chess, b: &Chess) -> bool {
    a.turn() == b.turn()
        && a.board() == b.board()
        && a.castles().castling_rights() == b.castles().castling_rights()
        && a.ep_square(EnPassantMode::Legal) == b.ep_square(EnPassantMode::Legal)
}

fn is_time_result(result: GameResult) -> bool {
    matches!(result, GameResult::Win(_, Some(WinReason::Time)))
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// ***************************************** UNIT TESTS ***************************************** //
////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod test {
    use super::*;

    fn play(game: &mut Game, moves: &[&str]) {
        for mv in moves {
            game.make_move_from_str(mv).expect(mv);
        }
    }

    #[test]
    fn sloppy_notations() {
        for (mv, san) in &[
            ("Nf3", "Nf3"), ("nf3", "Nf3"), ("g1f3", "Nf3"), ("Ng1f3", "Nf3"), ("Ng1-f3", "Nf3"),
            ("e4", "e4"), ("e2e4", "e4"), ("e2-e4", "e4"), ("Nf3+", "Nf3"),
        ] {
            let mut game = Game::new();
            let record = game.make_move_from_str(mv).expect(mv);
            assert_eq!(record.san(), *san, "{}", mv);
            assert_eq!(game.turn(), Color::Black);
        }
    }

    #[test]
    fn lower_case_bishop_prefers_pawn() {
        let mut game = Game::new();
        play(&mut game, &["b4", "c5"]);
        assert_eq!(game.make_move_from_str("bxc5").map(|mv| mv.role()), Ok(Role::Pawn));

        let mut game = Game::new();
        play(&mut game, &["e4", "e5"]);
        assert_eq!(game.make_move_from_str("bc4").map(|mv| mv.role()), Ok(Role::Bishop));
    }

    #[test]
    fn illegal_and_garbage() {
        let mut game = Game::new();
        assert_eq!(game.make_move_from_str("xe5").err(), Some(Error::IllegalMove));
        assert_eq!(game.make_move_from_str("e2e5").err(), Some(Error::IllegalMove));
        assert_eq!(game.make_move_from_str("Nf6").err(), Some(Error::IllegalMove));
        assert_eq!(game.make_move_from_str("").err(), Some(Error::ParseError));
        assert!(game.history().is_empty());
    }

    #[test]
    fn promotion_must_be_named_when_sloppy() {
        let fen = "8/4P3/8/8/8/8/k7/4K3 w - - 0 1";
        let mut game = Game::from_fen(fen).expect("fen");
        assert!(game.make_move_from_str("e7e8").is_err());

        let record = game.make_move_from_str("e7e8n").expect("e7e8n");
        assert_eq!(record.promotion(), Some(Role::Knight));

        let mut game = Game::from_fen(fen).expect("fen");
        let e7: Square = "e7".parse().expect("square");
        let e8: Square = "e8".parse().expect("square");
        let record = game.make_move_from_coords(e7, e8, Role::Queen).expect("e7e8");
        assert_eq!(record.promotion(), Some(Role::Queen));
        assert_eq!(record.uci(), "e7e8q");
    }

    #[test]
    fn coordinates_ignore_promotion_for_normal_moves() {
        let mut game = Game::new();
        let g1: Square = "g1".parse().expect("square");
        let f3: Square = "f3".parse().expect("square");
        let record = game.make_move_from_coords(g1, f3, Role::Queen).expect("g1f3");
        assert_eq!(record.san(), "Nf3");
    }

    #[test]
    fn castling_uses_king_destination() {
        let mut game = Game::new();
        play(&mut game, &["e4", "e5", "Nf3", "Nc6", "Bc4", "Bc5"]);
        assert!(game.destinations_from(Square::E1).contains(&Square::G1));
        let record = game.make_move_from_str("O-O").expect("castle").clone();
        assert_eq!(record.role(), Role::King);
        assert_eq!(record.to(), "g1".parse::<Square>().expect("square"));
        assert_eq!(record.uci(), "e1g1");

        game.undo();
        assert!(game.make_move_from_str("e1g1").is_ok());
    }

    #[test]
    fn undo() {
        let mut game = Game::new();
        play(&mut game, &["e4", "e5"]);
        assert!(game.undo());
        assert_eq!(game.turn(), Color::Black);
        assert!(game.undo());
        assert!(!game.undo());
        assert_eq!(game.fen(), Game::new().fen());
    }

    #[test]
    fn checkmate() {
        let mut game = Game::new();
        play(&mut game, &["f3", "e5", "g4", "Qh4"]);
        assert!(game.in_checkmate());
        assert!(game.in_check());
        assert!(game.is_game_over());
        assert_eq!(game.result(), Some(GameResult::Win(Color::Black, Some(WinReason::Checkmate))));
        assert_eq!(game.history().last().map(|mv| mv.san()), Some("Qh4#"));

        game.undo();
        assert_eq!(game.result(), None);
    }

    #[test]
    fn draws() {
        let game = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").expect("fen");
        assert_eq!(game.result(), Some(GameResult::Draw(Some(DrawReason::Stalemate))));
        assert!(game.in_draw());

        let game = Game::from_fen("8/8/8/8/8/8/k7/4K3 w - - 0 1").expect("fen");
        assert_eq!(game.result(), Some(GameResult::Draw(Some(DrawReason::Material))));

        let mut game = Game::new();
        play(&mut game, &["Nf3", "Nf6", "Ng1", "Ng8", "Nf3", "Nf6", "Ng1"]);
        assert_eq!(game.result(), None);
        play(&mut game, &["Ng8"]);
        assert_eq!(game.result(), Some(GameResult::Draw(Some(DrawReason::Repetition))));
    }

    #[test]
    fn time_result_survives_undo() {
        let mut game = Game::new();
        play(&mut game, &["e4"]);
        game.set_result(GameResult::Win(Color::White, Some(WinReason::Time)));
        assert!(game.is_game_over());
        game.undo();
        assert!(game.is_game_over());
    }

    #[test]
    fn fen_and_bad_fen() {
        let mut game = Game::new();
        play(&mut game, &["e4"]);
        assert_eq!(game.fen(), "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1");
        assert_eq!(Game::from_fen("not a fen").err(), Some(Error::ParseError));
    }

    #[test]
    fn pgn() {
        let mut game = Game::new();
        play(&mut game, &["f3", "e5", "g4", "Qh4"]);

        let mut tags = HashMap::new();
        tags.insert("Event".to_owned(), "Casual game".to_owned());
        tags.insert("White".to_owned(), "Player".to_owned());
        tags.insert("Black".to_owned(), "Engine".to_owned());
        tags.insert("TimeControl".to_owned(), "600".to_owned());

        assert_eq!(game.to_pgn(&tags),
            "[Event \"Casual game\"]\n\
             [Site \"?\"]\n\
             [Date \"????.??.??\"]\n\
             [Round \"?\"]\n\
             [White \"Player\"]\n\
             [Black \"Engine\"]\n\
             [Result \"0-1\"]\n\
             [TimeControl \"600\"]\n\
             \n\
             1. f3 e5 2. g4 Qh4# 0-1\n");
    }

    #[test]
    fn pgn_from_black_to_move() {
        let mut game = Game::from_fen(
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").expect("fen");
        play(&mut game, &["e5", "Nf3"]);

        let pgn = game.to_pgn(&HashMap::new());
        assert!(pgn.contains("[SetUp \"1\"]\n"));
        assert!(pgn.ends_with("\n1... e5 2. Nf3 *\n"));
    }
}
