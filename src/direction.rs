// Heading selection: the random initial pick and the masked resolution used by
// the AI fallback.

use rand::Rng;

use crate::types::{Direction, DirectionMask};

/// Uniform pick among the four cardinal directions
pub fn random_direction<R: Rng + ?Sized>(rng: &mut R) -> Direction {
    Direction::all()[rng.random_range(0..4)]
}

impl DirectionMask {
    /// Collapses a set of candidate headings into one.
    ///
    /// * no bits: random cardinal direction
    /// * one bit: that direction
    /// * several bits: a coin flip between the lowest and the highest set bit.
    ///   Bits in between are never chosen, so `UP | DOWN | LEFT` can only
    ///   resolve to up or left.
    pub fn resolve<R: Rng + ?Sized>(&self, rng: &mut R) -> Direction {
        let bits = self.bits();
        if bits == 0 {
            return random_direction(rng);
        }

        let lowest = bits & bits.wrapping_neg();
        let highest = 1u8 << (7 - bits.leading_zeros());
        let chosen = if lowest == highest || rng.random_bool(0.5) {
            lowest
        } else {
            highest
        };

        // Masks only ever hold cardinal bits, so both ends map to a direction
        Direction::from_bit(chosen).unwrap_or(Direction::Up)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_direction_covers_all_four() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 4];
        for _ in 0..200 {
            let d = random_direction(&mut rng);
            let idx = Direction::all().iter().position(|x| *x == d).unwrap();
            seen[idx] = true;
        }
        assert_eq!(seen, [true; 4]);
    }

    #[test]
    fn test_single_bit_mask_returns_that_direction() {
        let mut rng = StdRng::seed_from_u64(1);
        for dir in Direction::all() {
            for _ in 0..20 {
                assert_eq!(DirectionMask::from(dir).resolve(&mut rng), dir);
            }
        }
    }

    #[test]
    fn test_empty_mask_still_yields_a_direction() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..50 {
            let d = DirectionMask::empty().resolve(&mut rng);
            assert_ne!(d.bit(), 0);
        }
    }

    #[test]
    fn test_two_bit_mask_returns_one_of_the_pair() {
        let mut rng = StdRng::seed_from_u64(3);
        let mask = DirectionMask::new(DirectionMask::UP | DirectionMask::RIGHT);
        let mut seen_up = false;
        let mut seen_right = false;
        for _ in 0..100 {
            match mask.resolve(&mut rng) {
                Direction::Up => seen_up = true,
                Direction::Right => seen_right = true,
                other => panic!("unexpected {:?}", other),
            }
        }
        assert!(seen_up && seen_right);
    }

    #[test]
    fn test_inner_bits_are_never_returned() {
        let mut rng = StdRng::seed_from_u64(4);
        let mask = DirectionMask::new(0x0f);
        for _ in 0..200 {
            let d = mask.resolve(&mut rng);
            assert!(d == Direction::Up || d == Direction::Right, "got {:?}", d);
        }

        let mask = DirectionMask::new(DirectionMask::DOWN | DirectionMask::LEFT | DirectionMask::RIGHT);
        for _ in 0..200 {
            let d = mask.resolve(&mut rng);
            assert_ne!(d, Direction::Left);
        }
    }
}
