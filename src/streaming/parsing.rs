//! Zero-allocation breakpoint TSV field parsing.
//!
//! A breakpoint line is `chrom<TAB>pos<TAB><TYPE><TAB>length[<TAB>extra...]`.
//! These helpers split and convert the fixed columns without building a Vec.

use memchr::memchr;

/// Fast u64 parsing - no allocation, no error formatting.
///
/// Returns None if the input is empty or contains non-digit characters.
#[inline(always)]
pub fn parse_u64_fast(bytes: &[u8]) -> Option<u64> {
    if bytes.is_empty() {
        return None;
    }
    let mut n: u64 = 0;
    for &b in bytes {
        let d = b.wrapping_sub(b'0');
        if d > 9 {
            return None;
        }
        n = n.checked_mul(10)?.checked_add(d as u64)?;
    }
    Some(n)
}

/// Signed variant of [`parse_u64_fast`] accepting a single leading `-`.
#[inline(always)]
pub fn parse_i64_fast(bytes: &[u8]) -> Option<i64> {
    match bytes.split_first() {
        Some((b'-', digits)) => {
            let n = parse_u64_fast(digits)?;
            0i64.checked_sub_unsigned(n)
        }
        _ => i64::try_from(parse_u64_fast(bytes)?).ok(),
    }
}

/// Raw fixed columns of a breakpoint line.
#[derive(Debug, PartialEq, Eq)]
pub struct RawBreakpoint<'a> {
    pub chrom: &'a [u8],
    pub pos: &'a [u8],
    pub indel_type: &'a [u8],
    pub length: &'a [u8],
    /// Byte offset where pass-through columns begin, if any.
    pub rest_start: Option<usize>,
}

/// Split the four fixed columns using memchr.
///
/// Returns None if fewer than four columns are present.
#[inline(always)]
pub fn split_breakpoint_fields(line: &[u8]) -> Option<RawBreakpoint<'_>> {
    let tab1 = memchr(b'\t', line)?;
    let rest1 = &line[tab1 + 1..];
    let tab2 = memchr(b'\t', rest1)?;
    let rest2 = &rest1[tab2 + 1..];
    let tab3 = memchr(b'\t', rest2)?;
    let rest3 = &rest2[tab3 + 1..];

    let (length, rest_start) = match memchr(b'\t', rest3) {
        Some(tab4) => (
            &rest3[..tab4],
            Some(tab1 + 1 + tab2 + 1 + tab3 + 1 + tab4 + 1),
        ),
        None => (rest3, None),
    };

    Some(RawBreakpoint {
        chrom: &line[..tab1],
        pos: &rest1[..tab2],
        indel_type: &rest2[..tab3],
        length,
        rest_start,
    })
}

/// Check if a line should be skipped (empty or comment/header).
#[inline(always)]
pub fn should_skip_line(line: &[u8]) -> bool {
    line.is_empty() || line[0] == b'#'
}

/// Strip a trailing `\n` or `\r\n`.
#[inline(always)]
pub fn trim_newline(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
