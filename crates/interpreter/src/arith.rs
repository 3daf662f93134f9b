//! 256-bit word operations the EVM defines beyond plain unsigned integer
//! arithmetic: two's-complement signed division and comparison, sign
//! extension, byte extraction, and the shift family.

use evm_types::{U256, U512};

#[inline]
pub fn is_negative(value: U256) -> bool {
    value.bit(255)
}

/// Two's-complement negation.
#[inline]
pub fn negate(value: U256) -> U256 {
    (!value).overflowing_add(U256::one()).0
}

fn abs(value: U256) -> U256 {
    if is_negative(value) {
        negate(value)
    } else {
        value
    }
}

/// Unsigned division; division by zero yields zero.
pub fn div(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        U256::zero()
    } else {
        a / b
    }
}

/// Unsigned remainder; modulo zero yields zero.
pub fn rem(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        U256::zero()
    } else {
        a % b
    }
}

/// Signed division in two's-complement. `INT256_MIN / -1` wraps back to
/// `INT256_MIN`, which falls out of the magnitude arithmetic naturally.
pub fn sdiv(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let quotient = abs(a) / abs(b);
    if is_negative(a) != is_negative(b) {
        negate(quotient)
    } else {
        quotient
    }
}

/// Signed remainder; the sign follows the dividend.
pub fn smod(a: U256, b: U256) -> U256 {
    if b.is_zero() {
        return U256::zero();
    }
    let remainder = abs(a) % abs(b);
    if is_negative(a) {
        negate(remainder)
    } else {
        remainder
    }
}

/// `(a + b) % m` without wrapping the intermediate sum; `m == 0` yields zero.
pub fn addmod(a: U256, b: U256, m: U256) -> U256 {
    if m.is_zero() {
        return U256::zero();
    }
    let sum = U512::from(a) + U512::from(b);
    U256::try_from(sum % U512::from(m)).unwrap_or_default()
}

/// `(a * b) % m` over the full 512-bit product; `m == 0` yields zero.
pub fn mulmod(a: U256, b: U256, m: U256) -> U256 {
    if m.is_zero() {
        return U256::zero();
    }
    U256::try_from(a.full_mul(b) % U512::from(m)).unwrap_or_default()
}

/// Extend the sign of the byte at index `b` (0 = least significant) through
/// the higher bytes. Identity for `b >= 31`.
pub fn signextend(b: U256, x: U256) -> U256 {
    if b >= U256::from(31) {
        return x;
    }
    let sign_bit = b.low_u64() as usize * 8 + 7;
    let mask = (U256::one() << (sign_bit + 1)) - U256::one();
    if x.bit(sign_bit) {
        x | !mask
    } else {
        x & mask
    }
}

/// The `i`-th byte of `x` counted from the most significant end; zero for
/// `i >= 32`.
pub fn byte(i: U256, x: U256) -> U256 {
    if i >= U256::from(32) {
        return U256::zero();
    }
    U256::from(x.byte(31 - i.low_u64() as usize))
}

pub fn shl(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        U256::zero()
    } else {
        value << shift.low_u64() as usize
    }
}

pub fn shr(shift: U256, value: U256) -> U256 {
    if shift >= U256::from(256) {
        U256::zero()
    } else {
        value >> shift.low_u64() as usize
    }
}

/// Arithmetic right shift: the sign bit fills the vacated positions.
pub fn sar(shift: U256, value: U256) -> U256 {
    let negative = is_negative(value);
    if shift >= U256::from(256) {
        return if negative { U256::MAX } else { U256::zero() };
    }
    let n = shift.low_u64() as usize;
    let shifted = value >> n;
    if negative && n > 0 {
        shifted | (U256::MAX << (256 - n))
    } else {
        shifted
    }
}

pub fn slt(a: U256, b: U256) -> bool {
    match (is_negative(a), is_negative(b)) {
        (true, false) => true,
        (false, true) => false,
        // Within one sign, two's-complement order matches unsigned order.
        _ => a < b,
    }
}

pub fn sgt(a: U256, b: U256) -> bool {
    slt(b, a)
}

/// Number of significant bytes of an EXP exponent, for its per-byte cost.
pub fn exponent_bytes(exponent: U256) -> usize {
    (exponent.bits() + 7) / 8
}

#[cfg(test)]
mod tests {
    use super::*;

    const INT256_MIN_BIT: usize = 255;

    fn int256_min() -> U256 {
        U256::one() << INT256_MIN_BIT
    }

    fn minus(n: u64) -> U256 {
        negate(U256::from(n))
    }

    #[test]
    fn test_div_by_zero() {
        assert_eq!(div(U256::from(7), U256::zero()), U256::zero());
        assert_eq!(rem(U256::from(7), U256::zero()), U256::zero());
        assert_eq!(sdiv(minus(7), U256::zero()), U256::zero());
        assert_eq!(smod(minus(7), U256::zero()), U256::zero());
    }

    #[test]
    fn test_sdiv_signs() {
        assert_eq!(sdiv(minus(12), U256::from(4)), minus(3));
        assert_eq!(sdiv(U256::from(12), minus(4)), minus(3));
        assert_eq!(sdiv(minus(12), minus(4)), U256::from(3));
        assert_eq!(sdiv(U256::from(12), U256::from(4)), U256::from(3));
    }

    #[test]
    fn test_sdiv_int256_min_overflow() {
        assert_eq!(sdiv(int256_min(), minus(1)), int256_min());
    }

    #[test]
    fn test_smod_sign_follows_dividend() {
        assert_eq!(smod(minus(10), U256::from(3)), minus(1));
        assert_eq!(smod(U256::from(10), minus(3)), U256::from(1));
        assert_eq!(smod(minus(9), U256::from(3)), U256::zero());
    }

    #[test]
    fn test_addmod_wrapping_sum() {
        // MAX + MAX would wrap in 256 bits; the 512-bit sum must not.
        assert_eq!(
            addmod(U256::MAX, U256::MAX, U256::from(7)),
            (U256::MAX % U256::from(7) * U256::from(2)) % U256::from(7)
        );
        assert_eq!(addmod(U256::from(5), U256::from(6), U256::zero()), U256::zero());
    }

    #[test]
    fn test_mulmod_full_product() {
        // (2^256 - 1)^2 ≡ 1 (mod 2^256 - 2), exercising the 512-bit product.
        let m = U256::MAX - U256::one();
        assert_eq!(mulmod(U256::MAX, U256::MAX, m), U256::one());
        assert_eq!(
            mulmod(U256::from(7), U256::from(8), U256::from(13)),
            U256::from(56 % 13)
        );
        assert_eq!(mulmod(U256::from(5), U256::from(6), U256::zero()), U256::zero());
    }

    #[test]
    fn test_signextend() {
        // 0xff at byte 0 is -1.
        assert_eq!(signextend(U256::zero(), U256::from(0xff_u64)), U256::MAX);
        // 0x7f at byte 0 stays positive.
        assert_eq!(
            signextend(U256::zero(), U256::from(0x7f_u64)),
            U256::from(0x7f_u64)
        );
        // Higher bytes are masked off when the sign bit is clear.
        assert_eq!(
            signextend(U256::zero(), U256::from(0x1234_u64)),
            U256::from(0x34_u64)
        );
        // b >= 31 is the identity.
        assert_eq!(signextend(U256::from(31), U256::MAX), U256::MAX);
        assert_eq!(signextend(U256::MAX, U256::from(5)), U256::from(5));
    }

    #[test]
    fn test_byte() {
        let x = U256::from_big_endian(&{
            let mut b = [0u8; 32];
            b[0] = 0xaa;
            b[31] = 0xbb;
            b
        });
        assert_eq!(byte(U256::zero(), x), U256::from(0xaa_u64));
        assert_eq!(byte(U256::from(31), x), U256::from(0xbb_u64));
        assert_eq!(byte(U256::from(32), x), U256::zero());
        assert_eq!(byte(U256::MAX, x), U256::zero());
    }

    #[test]
    fn test_shifts_past_width() {
        assert_eq!(shl(U256::from(256), U256::MAX), U256::zero());
        assert_eq!(shr(U256::from(256), U256::MAX), U256::zero());
        assert_eq!(sar(U256::from(256), U256::one()), U256::zero());
        assert_eq!(sar(U256::from(256), minus(1)), U256::MAX);
        assert_eq!(sar(U256::MAX, minus(1)), U256::MAX);
    }

    #[test]
    fn test_sar_sign_fill() {
        assert_eq!(sar(U256::from(1), minus(4)), minus(2));
        assert_eq!(sar(U256::from(4), U256::from(0x80_u64)), U256::from(8));
        assert_eq!(sar(U256::zero(), minus(4)), minus(4));
    }

    #[test]
    fn test_signed_comparison() {
        assert!(slt(minus(1), U256::zero()));
        assert!(slt(minus(2), minus(1)));
        assert!(!slt(U256::zero(), minus(1)));
        assert!(slt(int256_min(), U256::zero()));
        assert!(sgt(U256::one(), minus(1)));
        assert!(!slt(U256::from(5), U256::from(5)));
    }

    #[test]
    fn test_exponent_bytes() {
        assert_eq!(exponent_bytes(U256::zero()), 0);
        assert_eq!(exponent_bytes(U256::from(1)), 1);
        assert_eq!(exponent_bytes(U256::from(255)), 1);
        assert_eq!(exponent_bytes(U256::from(256)), 2);
        assert_eq!(exponent_bytes(U256::MAX), 32);
    }
}
