//! Minimal-width bit packing of symbol indices.
//!
//! Symbols are written least-significant-bit first into a running accumulator
//! and flushed a byte at a time, so a symbol that straddles a byte boundary is
//! split across consecutive output bytes.
//!
//! Symbol index `i` is stored as code `i + 1`. An all-zero group therefore
//! never denotes a letter, which lets the zero padding in a word's final byte
//! terminate decoding without storing the character count.

use crate::alphabet::Alphabet;
use crate::MAX_BIT_WIDTH;

/// Bits needed per symbol for `alphabet` in its current state.
///
/// This is `ceil(log2(len + 1))`, the width of the largest code, clamped to at
/// least 1 so empty and single-letter alphabets still make progress.
///
/// # Panics
/// Panics if the alphabet needs more than [`MAX_BIT_WIDTH`] bits, which the
/// alphabet's capacity rules out.
pub fn bit_width(alphabet: &Alphabet) -> u8 {
    let bits = (usize::BITS - alphabet.len().leading_zeros()) as u8;
    assert!(
        bits <= MAX_BIT_WIDTH,
        "alphabet of {} letters needs {bits} bits per symbol",
        alphabet.len()
    );
    bits.max(1)
}

#[inline]
fn effective_width(width: u8) -> u32 {
    assert!(width <= MAX_BIT_WIDTH, "bit width {width} exceeds {MAX_BIT_WIDTH}");
    u32::from(width.max(1))
}

#[inline]
fn code_mask(width: u32) -> u32 {
    (1u32 << width) - 1
}

/// Number of bytes `symbols` symbols occupy at `width` bits each.
#[inline]
pub fn packed_len(symbols: usize, width: u8) -> usize {
    (symbols * effective_width(width) as usize).div_ceil(8)
}

/// Pack symbol indices at `width` bits each.
///
/// # Panics
/// Panics if an index does not fit in `width` bits once shifted to its code.
pub fn pack(indices: &[u8], width: u8) -> Vec<u8> {
    let width = effective_width(width);
    let mask = code_mask(width);
    let mut out = Vec::with_capacity((indices.len() * width as usize).div_ceil(8));

    let mut acc = 0u32;
    let mut bits = 0u32;
    for &index in indices {
        let code = u32::from(index) + 1;
        assert!(code <= mask, "symbol {index} does not fit in {width} bits");
        acc |= code << bits;
        bits += width;
        while bits >= 8 {
            out.push(acc as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        out.push(acc as u8);
    }
    out
}

/// Decode packed bytes back to text using `alphabet`.
///
/// Stops at the first group that does not name a letter: the zero padding at
/// the end of the payload, or a code past the end of the alphabet.
pub fn unpack(bytes: &[u8], width: u8, alphabet: &Alphabet) -> String {
    let width = effective_width(width);
    let mask = code_mask(width);
    let mut out = String::with_capacity(bytes.len() * 8 / width as usize);

    let mut input = bytes.iter();
    let mut acc = 0u32;
    let mut bits = 0u32;
    loop {
        while bits < width {
            match input.next() {
                Some(&byte) => {
                    acc |= u32::from(byte) << bits;
                    bits += 8;
                }
                None => return out,
            }
        }

        let code = acc & mask;
        acc >>= width;
        bits -= width;

        match letter_for_code(code, alphabet) {
            Some(letter) => out.push(letter),
            None => return out,
        }
    }
}

#[inline]
fn letter_for_code(code: u32, alphabet: &Alphabet) -> Option<char> {
    let index = code.checked_sub(1)?;
    alphabet.letter_at(index as usize)
}

/// Index of the first symbol in `packed`, read from the leading byte only.
///
/// `width` never exceeds 8, so the first group always sits entirely in byte 0.
#[inline]
pub fn first_symbol(packed: &[u8], width: u8) -> Option<u8> {
    let width = effective_width(width);
    let first = *packed.first()?;
    let code = u32::from(first) & code_mask(width);
    code.checked_sub(1).map(|index| index as u8)
}
