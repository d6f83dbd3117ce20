// Standard algebraic notation (SAN) for `chess::ChessMove`.

use std::str::FromStr;

use chess::{Board, BoardStatus, ChessMove, MoveGen, Piece, Square, EMPTY};

use crate::error::{EngineError, Result};

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

fn piece_from_letter(letter: char) -> Option<Piece> {
    match letter {
        'N' => Some(Piece::Knight),
        'B' => Some(Piece::Bishop),
        'R' => Some(Piece::Rook),
        'Q' => Some(Piece::Queen),
        'K' => Some(Piece::King),
        _ => None,
    }
}

fn file_char(index: usize) -> char {
    (b'a' + index as u8) as char
}

fn rank_char(index: usize) -> char {
    (b'1' + index as u8) as char
}

/// SAN for a legal move in `board`, e.g. `Nbd7`, `exd5`, `e8=Q+`, `O-O`.
pub fn to_san(board: &Board, mv: ChessMove) -> String {
    let src = mv.get_source();
    let dest = mv.get_dest();
    let Some(piece) = board.piece_on(src) else {
        return mv.to_string();
    };

    let file_delta = src.get_file().to_index().abs_diff(dest.get_file().to_index());
    let mut san = String::with_capacity(8);

    if piece == Piece::King && file_delta == 2 {
        let kingside = dest.get_file().to_index() > src.get_file().to_index();
        san.push_str(if kingside { "O-O" } else { "O-O-O" });
    } else {
        let capture = board.piece_on(dest).is_some() || (piece == Piece::Pawn && file_delta != 0);

        if piece == Piece::Pawn {
            if capture {
                san.push(file_char(src.get_file().to_index()));
            }
        } else {
            san.push(piece_letter(piece));

            // Other pieces of the same kind that can reach the same square
            let rivals: Vec<ChessMove> = MoveGen::new_legal(board)
                .filter(|m| {
                    m.get_dest() == dest
                        && m.get_source() != src
                        && board.piece_on(m.get_source()) == Some(piece)
                })
                .collect();
            if !rivals.is_empty() {
                let shares_file = rivals.iter().any(|m| m.get_source().get_file() == src.get_file());
                let shares_rank = rivals.iter().any(|m| m.get_source().get_rank() == src.get_rank());
                if !shares_file {
                    san.push(file_char(src.get_file().to_index()));
                } else if !shares_rank {
                    san.push(rank_char(src.get_rank().to_index()));
                } else {
                    san.push(file_char(src.get_file().to_index()));
                    san.push(rank_char(src.get_rank().to_index()));
                }
            }
        }

        if capture {
            san.push('x');
        }
        san.push(file_char(dest.get_file().to_index()));
        san.push(rank_char(dest.get_rank().to_index()));

        if let Some(promotion) = mv.get_promotion() {
            san.push('=');
            san.push(piece_letter(promotion));
        }
    }

    let after = board.make_move_new(mv);
    if *after.checkers() != EMPTY {
        san.push(if after.status() == BoardStatus::Checkmate { '#' } else { '+' });
    }
    san
}

/// Strip annotations so `Nf3+`, `Nf3!?` and `Nf3` compare equal,
/// and accept `0-0` for castling and `e8Q` for promotions.
fn normalize(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !matches!(c, '+' | '#' | '!' | '?' | '='))
        .map(|c| if c == '0' { 'O' } else { c })
        .collect()
}

/// Find the legal move written as `text`.
pub fn parse_san(board: &Board, text: &str) -> Result<ChessMove> {
    let wanted = normalize(text);
    if wanted.is_empty() {
        return Err(EngineError::InvalidMoveNotation(text.to_string()));
    }
    MoveGen::new_legal(board)
        .find(|&mv| normalize(&to_san(board, mv)) == wanted)
        .or_else(|| parse_loose(board, &wanted))
        .ok_or_else(|| EngineError::InvalidMoveNotation(text.to_string()))
}

/// Over-disambiguated input such as `Ngf3` or `Rd1d4`: match piece, target
/// and promotion, and treat any file or rank before the target as a
/// constraint on the source square. Must still name exactly one legal move.
fn parse_loose(board: &Board, wanted: &str) -> Option<ChessMove> {
    let mut chars: Vec<char> = wanted.chars().filter(|&c| c != 'x').collect();

    let promotion = match chars.last() {
        Some(&c) if c.is_ascii_uppercase() => {
            chars.pop();
            Some(piece_from_letter(c)?)
        }
        _ => None,
    };
    let piece = match chars.first() {
        Some(&c) if c.is_ascii_uppercase() => {
            chars.remove(0);
            piece_from_letter(c)?
        }
        _ => Piece::Pawn,
    };
    if chars.len() < 2 {
        return None;
    }
    let target: String = chars.split_off(chars.len() - 2).into_iter().collect();
    let dest = Square::from_str(&target).ok()?;

    let (mut file, mut rank) = (None, None);
    for c in chars {
        match c {
            'a'..='h' if file.is_none() => file = Some(c as usize - 'a' as usize),
            '1'..='8' if rank.is_none() => rank = Some(c as usize - '1' as usize),
            _ => return None,
        }
    }

    let mut candidates = MoveGen::new_legal(board).filter(|m| {
        let src = m.get_source();
        m.get_dest() == dest
            && m.get_promotion() == promotion
            && board.piece_on(src) == Some(piece)
            && file.map_or(true, |f| src.get_file().to_index() == f)
            && rank.map_or(true, |r| src.get_rank().to_index() == r)
    });
    let found = candidates.next()?;
    candidates.next().is_none().then_some(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(fen: &str) -> Board {
        Board::from_str(fen).unwrap()
    }

    fn san_of(fen: &str, uci: &str) -> String {
        let b = board(fen);
        let mv = MoveGen::new_legal(&b).find(|m| m.to_string() == uci).unwrap();
        to_san(&b, mv)
    }

    #[test]
    fn test_pawn_and_piece_moves() {
        let start = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert_eq!(san_of(start, "e2e4"), "e4");
        assert_eq!(san_of(start, "g1f3"), "Nf3");
    }

    #[test]
    fn test_captures() {
        let fen = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
        assert_eq!(san_of(fen, "e4d5"), "exd5");
    }

    #[test]
    fn test_castling() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        assert_eq!(san_of(fen, "e1g1"), "O-O");
        assert_eq!(san_of(fen, "e1c1"), "O-O-O");
    }

    #[test]
    fn test_disambiguation() {
        // Knights on b1 and f3 can both reach d2
        let fen = "4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1";
        assert_eq!(san_of(fen, "b1d2"), "Nbd2");
        assert_eq!(san_of(fen, "f3d2"), "Nfd2");
        // Rooks on a1 and a5 share a file
        let fen = "4k3/8/8/R7/8/8/8/R3K3 w - - 0 1";
        assert_eq!(san_of(fen, "a1a3"), "R1a3");
    }

    #[test]
    fn test_promotion_and_check_suffix() {
        let fen = "4k3/1P6/8/8/8/8/8/4K3 w - - 0 1";
        assert_eq!(san_of(fen, "b7b8q"), "b8=Q+");
        assert_eq!(san_of(fen, "b7b8n"), "b8=N");
    }

    #[test]
    fn test_mate_suffix() {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq - 0 2";
        assert_eq!(san_of(fen, "d8h4"), "Qh4#");
    }

    #[test]
    fn test_parse_accepts_annotations() {
        let b = Board::default();
        let mv = parse_san(&b, "Nf3!").unwrap();
        assert_eq!(mv.to_string(), "g1f3");
        assert!(parse_san(&b, "Nf4").is_err());
        assert!(parse_san(&b, "").is_err());
        assert!(parse_san(&b, "xyz").is_err());
    }

    #[test]
    fn test_parse_accepts_extra_disambiguation() {
        let b = Board::default();
        assert_eq!(parse_san(&b, "Ngf3").unwrap().to_string(), "g1f3");
        assert_eq!(parse_san(&b, "Ng1f3").unwrap().to_string(), "g1f3");
        assert_eq!(parse_san(&b, "Ng1xf3").unwrap().to_string(), "g1f3");
        // The hint must agree with the moving piece
        assert!(parse_san(&b, "Nbf3").is_err());

        // Still ambiguous without a hint
        let two_knights = board("4k3/8/8/8/8/5N2/8/1N2K3 w - - 0 1");
        assert!(parse_san(&two_knights, "Nd2").is_err());
        assert_eq!(parse_san(&two_knights, "Nb1d2").unwrap().to_string(), "b1d2");
    }
}
