//! Grain-128AEADv2 keystream generation.
//!
//! Only the keystream half of the cipher is exposed: the pre-output bits
//! that would drive the authenticator are discarded. Both registers are
//! held in a `u128`, with bit `i` of the integer holding register cell `i`.
//! Cell 0 is the next to leave the register. Bytes map onto cells least
//! significant bit first, on input and on output.

use segrun_foundation::{ByteRows, Result, check_array_size};

use crate::check_key_len;

/// Key size in bytes.
pub const KEY_LEN: usize = 16;

/// Nonce size in bytes.
pub const IV_LEN: usize = 12;

const WARMUP_CLOCKS: usize = 320;
const KEY_REINTRODUCTION_CLOCKS: usize = 64;
const AUTH_INIT_CLOCKS: usize = 128;

#[inline]
fn bit(reg: u128, i: u32) -> u128 {
    (reg >> i) & 1
}

/// Loads bytes LSB first into register cells 0, 1, 2, ...
fn load(bytes: &[u8]) -> u128 {
    bytes
        .iter()
        .enumerate()
        .fold(0u128, |reg, (i, &byte)| reg | (u128::from(byte) << (i * 8)))
}

struct Grain {
    /// LFSR state `s`.
    lfsr: u128,
    /// NFSR state `b`.
    nfsr: u128,
}

impl Grain {
    fn new(key: &[u8], iv: &[u8]) -> Self {
        let mut grain = Self::keyed(key, iv);
        // These pre-output bits load the authenticator.
        for _ in 0..AUTH_INIT_CLOCKS {
            grain.clock(0, 0);
        }
        grain
    }

    /// State after key and nonce setup.
    fn keyed(key: &[u8], iv: &[u8]) -> Self {
        // s = IV || 1^31 || 0
        let lfsr = load(iv) | (((1u128 << 31) - 1) << 96);
        let mut grain = Self {
            lfsr,
            nfsr: load(key),
        };
        let key_bits = load(key);

        for _ in 0..WARMUP_CLOCKS {
            let y = grain.output();
            grain.clock(y, y);
        }
        for t in 0..KEY_REINTRODUCTION_CLOCKS {
            #[allow(clippy::cast_possible_truncation)]
            let t = t as u32;
            let y = grain.output();
            grain.clock(y ^ bit(key_bits, 64 + t), y ^ bit(key_bits, t));
        }
        grain
    }

    fn f(&self) -> u128 {
        let s = self.lfsr;
        bit(s, 0) ^ bit(s, 7) ^ bit(s, 38) ^ bit(s, 70) ^ bit(s, 81) ^ bit(s, 96)
    }

    fn g(&self) -> u128 {
        let b = self.nfsr;
        bit(b, 0)
            ^ bit(b, 26)
            ^ bit(b, 56)
            ^ bit(b, 91)
            ^ bit(b, 96)
            ^ (bit(b, 3) & bit(b, 67))
            ^ (bit(b, 11) & bit(b, 13))
            ^ (bit(b, 17) & bit(b, 18))
            ^ (bit(b, 27) & bit(b, 59))
            ^ (bit(b, 40) & bit(b, 48))
            ^ (bit(b, 61) & bit(b, 65))
            ^ (bit(b, 68) & bit(b, 84))
            ^ (bit(b, 22) & bit(b, 24) & bit(b, 25))
            ^ (bit(b, 70) & bit(b, 78) & bit(b, 82))
            ^ (bit(b, 88) & bit(b, 92) & bit(b, 93) & bit(b, 95))
    }

    /// Pre-output bit `y` for the current state.
    fn output(&self) -> u128 {
        let (s, b) = (self.lfsr, self.nfsr);
        let x = [
            bit(b, 12),
            bit(s, 8),
            bit(s, 13),
            bit(s, 20),
            bit(b, 95),
            bit(s, 42),
            bit(s, 60),
            bit(s, 79),
            bit(s, 94),
        ];
        let h = (x[0] & x[1]) ^ (x[2] & x[3]) ^ (x[4] & x[5]) ^ (x[6] & x[7]) ^ (x[0] & x[4] & x[8]);
        h ^ bit(s, 93)
            ^ bit(b, 2)
            ^ bit(b, 15)
            ^ bit(b, 36)
            ^ bit(b, 45)
            ^ bit(b, 64)
            ^ bit(b, 73)
            ^ bit(b, 89)
    }

    /// Advances both registers, XORing extra bits into their feedback.
    fn clock(&mut self, lfsr_in: u128, nfsr_in: u128) {
        let s_new = self.f() ^ lfsr_in;
        let b_new = bit(self.lfsr, 0) ^ self.g() ^ nfsr_in;
        self.lfsr = (self.lfsr >> 1) | (s_new << 127);
        self.nfsr = (self.nfsr >> 1) | (b_new << 127);
    }

    /// Next keystream bit: even pre-output bits only.
    #[allow(clippy::cast_possible_truncation)]
    fn next_bit(&mut self) -> u8 {
        let y = self.output();
        self.clock(0, 0);
        // Odd bits feed the authenticator.
        self.clock(0, 0);
        y as u8
    }

    fn next_byte(&mut self) -> u8 {
        (0..8).fold(0u8, |acc, j| acc | (self.next_bit() << j))
    }
}

/// Raw keystream bytes.
///
/// # Errors
///
/// Returns `InvalidKeyLength` if the key is not 16 bytes or the IV not 12,
/// and `InvalidInput` if `len` exceeds
/// [`MAX_ARRAY_BYTES`](segrun_foundation::MAX_ARRAY_BYTES).
pub fn keystream(key: &[u8], iv: &[u8], len: usize) -> Result<Vec<u8>> {
    check_key_len(key, KEY_LEN)?;
    check_key_len(iv, IV_LEN)?;
    check_array_size(len, 1)?;
    let mut grain = Grain::new(key, iv);
    Ok((0..len).map(|_| grain.next_byte()).collect())
}

/// `length` rows of `width` keystream bytes.
///
/// # Errors
///
/// As for [`keystream`], plus `InvalidInput` for a zero width and
/// `Overflow` if `width * length` does not fit in `usize`.
pub fn keystream_rows(key: &[u8], iv: &[u8], width: usize, length: usize) -> Result<ByteRows> {
    let total = check_array_size(length, width)?;
    ByteRows::from_flat(width, keystream(key, iv, total)?)
}

/// XORs the keystream over the rows, treated as one contiguous message.
///
/// # Errors
///
/// As for [`keystream`].
pub fn apply(data: &ByteRows, key: &[u8], iv: &[u8]) -> Result<ByteRows> {
    let stream = keystream(key, iv, data.as_bytes().len())?;
    let out = data
        .as_bytes()
        .iter()
        .zip(stream)
        .map(|(d, k)| d ^ k)
        .collect();
    ByteRows::from_flat(data.width(), out)
}
