use std::ops::{Deref, DerefMut};
use std::str::FromStr;

use chess::{BitBoard, Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Square, EMPTY};
use smallvec::SmallVec;

use super::attacks;
use super::san;
use crate::error::{EngineError, Result};

/*
 * MODULE IS RESPONSIBLE FOR
 * GAME STATE HISTORY ON TOP OF `chess::Board`
 */

/// Squares of the light color (b1, d1, ..., a2, c2, ...)
const LIGHT_SQUARES: BitBoard = BitBoard(0x55AA_55AA_55AA_55AA);

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Clone, Copy, Debug)]
struct Frame {
    board: Board,
    /// Move that produced this frame. `None` for the root frame and for null moves.
    played: Option<ChessMove>,
    halfmove_clock: u32,
}

/// A move that was played on the board, with the side and piece that made it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlayedMove {
    pub color: Color,
    pub piece: Piece,
    pub mv: ChessMove,
}

/// Mutable game state with a strict push/pop discipline.
///
/// Every pushed move keeps the previous board around, so undo is a plain
/// stack pop and repetition detection can scan past positions.
#[derive(Clone, Debug)]
pub struct Position {
    frames: Vec<Frame>,
    /// Ply count of the root frame, derived from the FEN move counters
    start_ply: u32,
}

impl Default for Position {
    fn default() -> Self {
        Self {
            frames: vec![Frame {
                board: Board::default(),
                played: None,
                halfmove_clock: 0,
            }],
            start_ply: 0,
        }
    }
}

impl FromStr for Position {
    type Err = EngineError;

    fn from_str(fen: &str) -> Result<Self> {
        Self::from_fen(fen)
    }
}

impl Position {
    /// Parse a FEN string. Missing trailing fields fall back to `w - - 0 1`.
    pub fn from_fen(fen: &str) -> Result<Position> {
        let mut fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.is_empty() {
            return Err(EngineError::InvalidFen(fen.to_string()));
        }
        const DEFAULTS: [&str; 5] = ["w", "-", "-", "0", "1"];
        while fields.len() < 6 {
            fields.push(DEFAULTS[fields.len() - 1]);
        }

        let board = Board::from_str(&fields[..4].join(" "))
            .map_err(|e| EngineError::InvalidFen(format!("{fen} ({e})")))?;

        let halfmove_clock: u32 = fields[4]
            .parse()
            .map_err(|_| EngineError::InvalidFen(fen.to_string()))?;
        let fullmove: u32 = fields[5]
            .parse()
            .map_err(|_| EngineError::InvalidFen(fen.to_string()))?;

        let start_ply =
            2 * fullmove.max(1).saturating_sub(1) + u32::from(board.side_to_move() == Color::Black);

        Ok(Position {
            frames: vec![Frame {
                board,
                played: None,
                halfmove_clock,
            }],
            start_ply,
        })
    }

    /// FEN of the start position
    pub fn start_fen() -> &'static str {
        START_FEN
    }

    #[inline]
    fn top(&self) -> &Frame {
        // The root frame is never popped
        &self.frames[self.frames.len() - 1]
    }

    /// The board of the current position
    #[inline]
    pub fn board(&self) -> &Board {
        &self.top().board
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.board().side_to_move()
    }

    /// FEN of the current position, including the tracked move counters
    pub fn fen(&self) -> String {
        let board_fen = self.board().to_string();
        let head: Vec<&str> = board_fen.split_whitespace().take(4).collect();
        format!(
            "{} {} {}",
            head.join(" "),
            self.halfmove_clock(),
            self.fullmove_number()
        )
    }

    // ------------------------------------------------------------------
    // Stack discipline
    // ------------------------------------------------------------------

    /// Play a legal move on top of the stack.
    pub fn push(&mut self, mv: ChessMove) {
        let top = *self.top();
        let resets_clock =
            top.board.piece_on(mv.get_source()) == Some(Piece::Pawn) || self.is_capture(mv);
        self.frames.push(Frame {
            board: top.board.make_move_new(mv),
            played: Some(mv),
            halfmove_clock: if resets_clock { 0 } else { top.halfmove_clock + 1 },
        });
    }

    /// Pass the turn. Returns `false` (and pushes nothing) when in check.
    pub fn push_null(&mut self) -> bool {
        let top = *self.top();
        match top.board.null_move() {
            Some(board) => {
                self.frames.push(Frame {
                    board,
                    played: None,
                    halfmove_clock: top.halfmove_clock + 1,
                });
                true
            }
            None => false,
        }
    }

    /// Undo the last push. The root position is never popped.
    ///
    /// Returns the undone move, or `None` for a null move or an empty stack.
    pub fn pop(&mut self) -> Option<ChessMove> {
        if self.frames.len() > 1 {
            self.frames.pop().and_then(|frame| frame.played)
        } else {
            None
        }
    }

    /// Push `mv` and return a guard that pops it again when dropped.
    pub fn play(&mut self, mv: ChessMove) -> MoveGuard<'_> {
        self.push(mv);
        MoveGuard { pos: self }
    }

    /// Scoped null move; `None` when the side to move is in check.
    pub fn play_null(&mut self) -> Option<MoveGuard<'_>> {
        if self.push_null() {
            Some(MoveGuard { pos: self })
        } else {
            None
        }
    }

    /// Number of frames above the root
    pub fn stack_depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Moves played since the root frame, oldest first. Null moves are skipped.
    pub fn played_moves(&self) -> impl Iterator<Item = PlayedMove> + '_ {
        self.frames.windows(2).filter_map(|pair| {
            let mv = pair[1].played?;
            let piece = pair[0].board.piece_on(mv.get_source())?;
            Some(PlayedMove {
                color: pair[0].board.side_to_move(),
                piece,
                mv,
            })
        })
    }

    pub fn last_move(&self) -> Option<ChessMove> {
        self.top().played
    }

    // ------------------------------------------------------------------
    // Counters
    // ------------------------------------------------------------------

    /// Half-moves since the start of the game
    pub fn ply(&self) -> u32 {
        self.start_ply + self.stack_depth() as u32
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.top().halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        1 + self.ply() / 2
    }

    // ------------------------------------------------------------------
    // Moves
    // ------------------------------------------------------------------

    pub fn legal_moves(&self) -> SmallVec<[ChessMove; 64]> {
        MoveGen::new_legal(self.board()).collect()
    }

    pub fn legal_move_count(&self) -> usize {
        MoveGen::new_legal(self.board()).len()
    }

    pub fn is_legal(&self, mv: ChessMove) -> bool {
        self.board().legal(mv)
    }

    /// Does `mv` capture a piece (including en passant)?
    pub fn is_capture(&self, mv: ChessMove) -> bool {
        self.captured_piece(mv).is_some()
    }

    /// The piece `mv` captures, if any. En passant captures a pawn.
    pub fn captured_piece(&self, mv: ChessMove) -> Option<Piece> {
        let board = self.board();
        let dest = mv.get_dest();
        if board.color_on(dest) == Some(!board.side_to_move()) {
            return board.piece_on(dest);
        }
        let is_pawn = board.piece_on(mv.get_source()) == Some(Piece::Pawn);
        if is_pawn && mv.get_source().get_file() != dest.get_file() {
            return Some(Piece::Pawn);
        }
        None
    }

    pub fn is_en_passant(&self, mv: ChessMove) -> bool {
        let board = self.board();
        board.piece_on(mv.get_source()) == Some(Piece::Pawn)
            && mv.get_source().get_file() != mv.get_dest().get_file()
            && board.piece_on(mv.get_dest()).is_none()
    }

    /// Does `mv` put the opponent in check?
    pub fn gives_check(&self, mv: ChessMove) -> bool {
        *self.board().make_move_new(mv).checkers() != EMPTY
    }

    // ------------------------------------------------------------------
    // Piece queries
    // ------------------------------------------------------------------

    pub fn piece_at(&self, sq: Square) -> Option<(Piece, Color)> {
        let board = self.board();
        Some((board.piece_on(sq)?, board.color_on(sq)?))
    }

    /// Squares holding `piece` of `color`
    #[inline]
    pub fn pieces(&self, piece: Piece, color: Color) -> BitBoard {
        let board = self.board();
        *board.pieces(piece) & *board.color_combined(color)
    }

    #[inline]
    pub fn occupied_by(&self, color: Color) -> BitBoard {
        *self.board().color_combined(color)
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        self.board().king_square(color)
    }

    pub fn has_kingside_castling_rights(&self, color: Color) -> bool {
        self.board().castle_rights(color).has_kingside()
    }

    pub fn has_queenside_castling_rights(&self, color: Color) -> bool {
        self.board().castle_rights(color).has_queenside()
    }

    pub fn has_castling_rights(&self, color: Color) -> bool {
        self.has_kingside_castling_rights(color) || self.has_queenside_castling_rights(color)
    }

    /// Is `sq` attacked by any piece of `color`?
    pub fn is_attacked_by(&self, color: Color, sq: Square) -> bool {
        attacks::attackers(self.board(), color, sq) != EMPTY
    }

    /// Pseudo-legal move count for `color`, regardless of who is to move
    pub fn pseudo_mobility(&self, color: Color) -> u32 {
        attacks::pseudo_mobility(self.board(), color)
    }

    // ------------------------------------------------------------------
    // Game state predicates
    // ------------------------------------------------------------------

    pub fn is_check(&self) -> bool {
        *self.board().checkers() != EMPTY
    }

    pub fn is_checkmate(&self) -> bool {
        self.board().status() == BoardStatus::Checkmate
    }

    pub fn is_stalemate(&self) -> bool {
        self.board().status() == BoardStatus::Stalemate
    }

    /// Neither side can ever deliver mate: bare kings, a single minor piece,
    /// or bishops that all stand on one square color.
    pub fn is_insufficient_material(&self) -> bool {
        let board = self.board();
        let heavy = *board.pieces(Piece::Pawn) | *board.pieces(Piece::Rook) | *board.pieces(Piece::Queen);
        if heavy != EMPTY {
            return false;
        }

        let knights = *board.pieces(Piece::Knight);
        let bishops = *board.pieces(Piece::Bishop);
        if knights.popcnt() + bishops.popcnt() <= 1 {
            return true;
        }
        knights == EMPTY && ((bishops & LIGHT_SQUARES) == EMPTY || (bishops & !LIGHT_SQUARES) == EMPTY)
    }

    pub fn is_seventyfive_moves(&self) -> bool {
        self.halfmove_clock() >= 150 && !self.is_checkmate()
    }

    /// Has the current position occurred at least `count` times (this one included)
    /// since the last irreversible move?
    pub fn is_repetition(&self, count: usize) -> bool {
        let key = self.board().get_hash();
        let window = self.halfmove_clock() as usize;
        let mut seen = 1;
        for frame in self.frames.iter().rev().skip(1).take(window) {
            if seen >= count {
                break;
            }
            if frame.board.get_hash() == key {
                seen += 1;
            }
        }
        seen >= count
    }

    pub fn is_game_over(&self) -> bool {
        self.board().status() != BoardStatus::Ongoing
            || self.is_insufficient_material()
            || self.is_seventyfive_moves()
            || self.is_repetition(5)
    }

    // ------------------------------------------------------------------
    // Notation
    // ------------------------------------------------------------------

    /// Standard algebraic notation of a legal move, with check suffix
    pub fn san(&self, mv: ChessMove) -> String {
        san::to_san(self.board(), mv)
    }

    /// Find the legal move written as `text` in SAN
    pub fn parse_san(&self, text: &str) -> Result<ChessMove> {
        san::parse_san(self.board(), text)
    }

    /// Coordinate notation, e.g. `e2e4` or `e7e8q`
    pub fn uci(&self, mv: ChessMove) -> String {
        mv.to_string()
    }

    pub fn parse_uci(&self, text: &str) -> Result<ChessMove> {
        let wanted = text.trim().to_ascii_lowercase();
        MoveGen::new_legal(self.board())
            .find(|mv| mv.to_string() == wanted)
            .ok_or_else(|| EngineError::InvalidMoveNotation(text.to_string()))
    }

    /// Parse `text` as SAN and push it
    pub fn push_san(&mut self, text: &str) -> Result<ChessMove> {
        let mv = self.parse_san(text)?;
        self.push(mv);
        Ok(mv)
    }
}

/// Scoped move: the move is undone when the guard goes out of scope,
/// including early returns and `?` propagation.
pub struct MoveGuard<'a> {
    pos: &'a mut Position,
}

impl Deref for MoveGuard<'_> {
    type Target = Position;

    fn deref(&self) -> &Position {
        self.pos
    }
}

impl DerefMut for MoveGuard<'_> {
    fn deref_mut(&mut self) -> &mut Position {
        self.pos
    }
}

impl Drop for MoveGuard<'_> {
    fn drop(&mut self) {
        self.pos.pop();
    }
}
