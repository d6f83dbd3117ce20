// Quiescence Search - Tactical Stability Extension
//
// A fixed-depth search that stops in the middle of an exchange misjudges the
// position badly (the "horizon effect"). At the leaves we keep searching
// captures only until the position is quiet, so every score is taken after
// the forcing sequence has played out.
//
// - Stand-pat: the side to move may decline every capture
// - Delta pruning: skip captures that cannot lift the score to alpha
// - MVV-LVA ordering: best captures first
// - Ply cap: complex exchanges stop after 16 plies

use super::evaluation::{mate_bonus, piece_value};
use super::move_ordering::order_captures;
use super::negamax::{SearchContext, SearchTimeout};
use crate::game_repr::Position;

/// Maximum quiescence plies below the main search
pub const MAX_QSEARCH_DEPTH: u32 = 16;

/// Safety buffer for positional compensation when delta pruning
const DELTA_MARGIN: i32 = 200;

/// Search captures until the position is quiet.
///
/// Returns the score from the side to move's point of view. `ply` is the
/// distance from the search root, so checkmates found here are scored on the
/// same scale as in the main search.
pub fn quiescence(
    pos: &mut Position,
    mut alpha: i32,
    beta: i32,
    ply: usize,
    qs_depth: u32,
    ctx: &mut SearchContext<'_>,
) -> Result<i32, SearchTimeout> {
    ctx.clock.tick()?;

    let stand_pat = ctx.eval.evaluate(pos, mate_bonus(ply));
    if qs_depth >= MAX_QSEARCH_DEPTH || pos.is_game_over() {
        return Ok(stand_pat);
    }

    if stand_pat >= beta {
        return Ok(beta);
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }

    for mv in order_captures(pos) {
        let victim = pos.captured_piece(mv).map_or(0, piece_value);
        if stand_pat + victim + DELTA_MARGIN < alpha {
            continue;
        }

        let score = {
            let mut child = pos.play(mv);
            -quiescence(&mut child, -beta, -alpha, ply + 1, qs_depth + 1, ctx)?
        };

        if score >= beta {
            return Ok(beta);
        }
        if score > alpha {
            alpha = score;
        }
    }

    Ok(alpha)
}
