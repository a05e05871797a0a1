//! 12-bit signed-magnitude arithmetic: the wrap discipline every MUSYS expression
//! and register is subject to. Bit 11 of the masked 12-bit pattern is a sign flag,
//! not a two's-complement high bit, so 0x800 itself wraps to 0 rather than -2048 -
//! that's what the original simulator's `max_signed()` does and scenario 3 in the
//! spec (`2047+5` -> `-4`) only checks out under this reading.

use crate::error::RuntimeError;

pub const MAX: i64 = 0xFFF;
const SIGN_BIT: i64 = 0x800;

/// A 12-bit signed-magnitude integer: the value held by EXP and by A..Z variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, PartialOrd, Ord)]
pub struct Signed12(i32);

impl Signed12 {
    pub const ZERO: Signed12 = Signed12(0);

    /// Wraps an arbitrary-width accumulator (used mid-expression, see the 23-bit
    /// interior-precision rule for `*` immediately followed by `/`) down to range.
    pub fn new(raw: i64) -> Self {
        Signed12(wrap(raw))
    }

    pub fn get(self) -> i32 {
        self.0
    }

    pub fn as_i64(self) -> i64 {
        self.0 as i64
    }

    pub fn add(self, rhs: Signed12) -> Signed12 {
        Signed12::new(self.as_i64() + rhs.as_i64())
    }

    pub fn sub(self, rhs: Signed12) -> Signed12 {
        Signed12::new(self.as_i64() - rhs.as_i64())
    }

    pub fn mul(self, rhs: Signed12) -> Signed12 {
        Signed12::new(self.as_i64() * rhs.as_i64())
    }

    /// Truncating division toward zero. Division by zero is a [`RuntimeError`],
    /// not a panic: the caller substitutes 0 and keeps running.
    pub fn div(self, rhs: Signed12) -> Result<Signed12, RuntimeError> {
        if rhs.0 == 0 {
            Err(RuntimeError::DivideByZero)
        } else {
            Ok(Signed12::new(self.as_i64() / rhs.as_i64()))
        }
    }

    /// Bitwise AND, masked to 12 bits. The mask is applied to the native-width
    /// two's-complement AND of the two operands, matching the source's `e & x & MAX`.
    pub fn and(self, rhs: Signed12) -> Signed12 {
        Signed12::new((self.as_i64() & rhs.as_i64()) & MAX)
    }

    pub fn max(self, rhs: Signed12) -> Signed12 {
        if self.0 >= rhs.0 {
            self
        } else {
            rhs
        }
    }

    pub fn min(self, rhs: Signed12) -> Signed12 {
        if self.0 <= rhs.0 {
            self
        } else {
            rhs
        }
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl std::fmt::Display for Signed12 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Signed12 {
    fn from(raw: i32) -> Self {
        Signed12::new(raw as i64)
    }
}

/// A value already in range passes through unchanged. Anything outside it is
/// masked to its low 12 bits, then bit 11 of that mask is reinterpreted as a
/// sign flag rather than a two's-complement high bit (0x800 -> 0, 0x801 -> -1,
/// 0xFFF -> -2047) — the decode only ever applies to the overflow, never to an
/// in-range negative, which would otherwise get corrupted by it.
fn wrap(raw: i64) -> i32 {
    if (-MAX..=MAX).contains(&raw) {
        return raw as i32;
    }
    let low12 = raw.rem_euclid(MAX + 1);
    let sign = low12 & SIGN_BIT;
    let result = if sign != 0 { -(low12 - sign) } else { low12 };
    result as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_identity_within_range() {
        for i in -2047..=2047 {
            assert_eq!(Signed12::new(i).get(), i as i32);
        }
    }

    #[test]
    fn wrap_matches_worked_example() {
        // spec scenario 3: "2047+5 $" -> EXP == -4
        assert_eq!(Signed12::new(2047 + 5).get(), -4);
    }

    #[test]
    fn wrap_stays_in_range() {
        for i in -8192..=8192 {
            let w = Signed12::new(i).get();
            assert!((-2047..=2047).contains(&w), "{i} wrapped to {w}");
        }
    }

    #[test]
    fn division_by_zero_is_reported_not_fatal() {
        let a = Signed12::new(10);
        let b = Signed12::new(0);
        assert_eq!(a.div(b), Err(RuntimeError::DivideByZero));
    }

    #[test]
    fn division_truncates_toward_zero() {
        assert_eq!(Signed12::new(-7).div(Signed12::new(2)).unwrap().get(), -3);
    }

    #[test]
    fn and_masks_to_twelve_bits() {
        let a = Signed12::new(0xFFF);
        let b = Signed12::new(0x0F0);
        assert_eq!(a.and(b).get(), 0x0F0);
    }
}
