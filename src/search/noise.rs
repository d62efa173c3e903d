use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{Player, Pos};
use crate::rules::{order_moves, Game};

/// Uniformly random legal move, `None` only when there is none.
pub fn random_legal_move<G: Game, R: Rng + ?Sized>(board: &G, player: Player, rng: &mut R) -> Option<Pos> {
    board.legal_moves(player).choose(rng).copied()
}

/// Choose uniformly among the `topk` best-ranked moves (by the game's cheap
/// ordering key). Used to vary self-play openings.
pub fn choose_noisy_from_order<G: Game, R: Rng + ?Sized>(board: &G, player: Player, topk: usize, rng: &mut R) -> Option<Pos> {
    let order = order_moves(board, player, board.legal_moves(player), None);
    if order.is_empty() { return None; }
    let k = topk.max(1).min(order.len());
    Some(order[rng.gen_range(0..k)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::FlipBoard;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn random_move_is_legal() {
        let b = FlipBoard::new();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..20 {
            let mv = random_legal_move(&b, Player::Second, &mut rng).unwrap();
            assert!(b.legal_moves(Player::Second).contains(&mv));
        }
    }

    #[test]
    fn no_moves_gives_none() {
        let b = FlipBoard::empty();
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(random_legal_move(&b, Player::First, &mut rng), None);
        assert_eq!(choose_noisy_from_order(&b, Player::First, 3, &mut rng), None);
    }
}
