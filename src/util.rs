// Copyright (c) 2026 rezky_nightky

use rand::Rng;

pub fn rand_range<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi <= lo {
        return lo;
    }
    rng.random_range(lo..hi)
}

// Uniform integer in `[lo, hi]`, both ends inclusive.
pub fn rand_int<R: Rng + ?Sized>(rng: &mut R, lo: i64, hi: i64) -> i64 {
    if hi <= lo {
        return lo;
    }
    rng.random_range(lo..=hi)
}

pub fn weighted_choice<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [(T, u32)]) -> &'a T {
    debug_assert!(!items.is_empty());
    let total: u32 = items.iter().map(|(_, w)| *w).sum();
    if total == 0 {
        return &items[0].0;
    }
    let mut pick = rng.random_range(0..total);
    for (item, w) in items {
        if pick < *w {
            return item;
        }
        pick -= *w;
    }
    &items[items.len() - 1].0
}

pub fn clamp<T: PartialOrd>(v: T, lo: T, hi: T) -> T {
    if v < lo {
        lo
    } else if v > hi {
        hi
    } else {
        v
    }
}

pub fn format_money_usd(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

pub fn to_base36(mut v: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if v == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while v > 0 {
        out.push(DIGITS[(v % 36) as usize]);
        v /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn money_formats_sign_and_grouping() {
        assert_eq!(format_money_usd(-1234), "-$1,234");
        assert_eq!(format_money_usd(95000), "$95,000");
        assert_eq!(format_money_usd(0), "$0");
        assert_eq!(format_money_usd(999), "$999");
        assert_eq!(format_money_usd(1_000_000), "$1,000,000");
    }

    #[test]
    fn weighted_choice_never_picks_zero_weight() {
        let mut rng = StdRng::seed_from_u64(7);
        let items = [("never", 0), ("always", 5)];
        for _ in 0..200 {
            assert_eq!(*weighted_choice(&mut rng, &items), "always");
        }
    }

    #[test]
    fn weighted_choice_favours_heavier_items() {
        let mut rng = StdRng::seed_from_u64(11);
        let items = [("light", 1), ("heavy", 9)];
        let heavy = (0..2000)
            .filter(|_| *weighted_choice(&mut rng, &items) == "heavy")
            .count();
        assert!(heavy > 1500, "heavy picked {heavy} times");
    }

    #[test]
    fn rand_int_is_inclusive() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen_hi = false;
        for _ in 0..500 {
            let v = rand_int(&mut rng, 2, 4);
            assert!((2..=4).contains(&v));
            seen_hi |= v == 4;
        }
        assert!(seen_hi);
    }

    #[test]
    fn rand_range_handles_empty_range() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(rand_range(&mut rng, 3.0, 3.0), 3.0);
    }

    #[test]
    fn clamp_bounds() {
        assert_eq!(clamp(5, 0, 3), 3);
        assert_eq!(clamp(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
    }

    #[test]
    fn base36_digits() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }
}
