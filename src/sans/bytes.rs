//! Endian-aware assembly of multi-byte integers.

/// Assemble up to four bytes into an unsigned integer.
///
/// Bytes are taken in wire order. When `little_endian` is false they are
/// reversed first, then each byte is accumulated as `byte[i] << (8 * i)`.
///
/// Returns `None` unless `bytes` holds between one and four bytes.
pub fn assemble_integer(little_endian: bool, bytes: &[u8]) -> Option<u32> {
    if !(1..=4).contains(&bytes.len()) {
        return None;
    }

    assemble_wide(little_endian, bytes).map(|x| x as u32)
}

/// Assemble up to eight bytes into an unsigned integer.
///
/// The wide counterpart of [`assemble_integer`], used for 64-bit base types.
pub fn assemble_wide(little_endian: bool, bytes: &[u8]) -> Option<u64> {
    if !(1..=8).contains(&bytes.len()) {
        return None;
    }

    let mut ordered = [0; 8];
    let ordered = &mut ordered[..bytes.len()];
    ordered.copy_from_slice(bytes);

    if !little_endian {
        ordered.reverse();
    }

    let value = ordered
        .iter()
        .enumerate()
        .fold(0u64, |acc, (i, b)| acc | (u64::from(*b) << (8 * i)));

    Some(value)
}

/// Reinterpret the low `width` bytes of `raw` as a two's-complement integer.
pub fn sign_extend(raw: u64, width: usize) -> i64 {
    match width {
        1 => raw as u8 as i8 as i64,
        2 => raw as u16 as i16 as i64,
        4 => raw as u32 as i32 as i64,
        _ => raw as i64,
    }
}
