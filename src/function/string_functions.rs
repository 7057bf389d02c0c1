//! String operations
//!
//! Inputs are raw payload bytes; anything that needs characters decodes them
//! as UTF-8, replacing invalid sequences. Results are written straight into
//! the result vector so long outputs land in its overflow buffer.

use std::collections::HashMap;

use parking_lot::Mutex;
use regex::bytes::Regex;
use tracing::debug;

use crate::common::constants::MAX_STRING_LENGTH;
use crate::common::error::{KuzuError, Result};
use crate::vector::accessors::StringVector;
use crate::vector::value_vector::ValueVector;

/// Compiled patterns shared by every invocation of one bound regex function
#[derive(Debug, Default)]
pub struct RegexBindData {
    cache: Mutex<HashMap<String, Regex>>,
}

impl RegexBindData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_compile(&self, pattern: &[u8]) -> Result<Regex> {
        let pattern = String::from_utf8_lossy(pattern);
        let mut cache = self.cache.lock();
        if let Some(regex) = cache.get(pattern.as_ref()) {
            return Ok(regex.clone());
        }
        let regex = Regex::new(&pattern).map_err(|e| {
            KuzuError::Runtime(format!("Invalid regex pattern {}: {}", pattern, e))
        })?;
        debug!(pattern = %pattern, "compiled regex");
        cache.insert(pattern.into_owned(), regex.clone());
        Ok(regex)
    }

    pub fn num_cached(&self) -> usize {
        self.cache.lock().len()
    }
}

pub fn concat(left: &[u8], right: &[u8], result: &mut ValueVector, pos: usize) -> Result<()> {
    StringVector::reserve_string(result, pos, left.len() + right.len(), |buf| {
        buf[..left.len()].copy_from_slice(left);
        buf[left.len()..].copy_from_slice(right);
    })
}

pub fn lower(input: &[u8], result: &mut ValueVector, pos: usize) -> Result<()> {
    let lowered = String::from_utf8_lossy(input).to_lowercase();
    StringVector::add_string(result, pos, lowered.as_bytes())
}

pub fn upper(input: &[u8], result: &mut ValueVector, pos: usize) -> Result<()> {
    let uppered = String::from_utf8_lossy(input).to_uppercase();
    StringVector::add_string(result, pos, uppered.as_bytes())
}

/// Number of characters
pub fn length(input: &[u8]) -> i64 {
    if input.is_ascii() {
        return input.len() as i64;
    }
    String::from_utf8_lossy(input).chars().count() as i64
}

/// `len` characters starting at the 1-based character `start`, clipped to the input
pub fn substr(
    input: &[u8],
    start: i64,
    len: i64,
    result: &mut ValueVector,
    pos: usize,
) -> Result<()> {
    let text = String::from_utf8_lossy(input);
    let num_chars = text.chars().count() as i64;
    let begin = start.max(1);
    let end = start.saturating_add(len.max(0)).min(num_chars + 1);
    if end <= begin {
        return StringVector::add_string(result, pos, b"");
    }
    let piece: String = text
        .chars()
        .skip((begin - 1) as usize)
        .take((end - begin) as usize)
        .collect();
    StringVector::add_string(result, pos, piece.as_bytes())
}

/// Left-pad with `pad` to `count` characters, truncating longer inputs
pub fn lpad(
    input: &[u8],
    count: i64,
    pad: &[u8],
    result: &mut ValueVector,
    pos: usize,
) -> Result<()> {
    if count > MAX_STRING_LENGTH as i64 {
        return Err(KuzuError::Runtime(format!(
            "LPAD length {} exceeds the maximum string length {}.",
            count, MAX_STRING_LENGTH
        )));
    }
    let count = count.max(0) as usize;
    let text = String::from_utf8_lossy(input);
    let chars: Vec<char> = text.chars().collect();
    if chars.len() >= count {
        let truncated: String = chars[..count].iter().collect();
        return StringVector::add_string(result, pos, truncated.as_bytes());
    }
    let pad: Vec<char> = String::from_utf8_lossy(pad).chars().collect();
    if pad.is_empty() {
        return StringVector::add_string(result, pos, text.as_bytes());
    }
    let padded: String = pad
        .iter()
        .cycle()
        .take(count - chars.len())
        .chain(chars.iter())
        .collect();
    StringVector::add_string(result, pos, padded.as_bytes())
}

pub fn contains(left: &[u8], right: &[u8]) -> bool {
    right.is_empty() || left.windows(right.len()).any(|window| window == right)
}

pub fn regexp_matches(input: &[u8], pattern: &[u8], bind_data: &RegexBindData) -> Result<bool> {
    Ok(bind_data.get_or_compile(pattern)?.is_match(input))
}

/// Replace the first match; `$1` style group references are expanded
pub fn regexp_replace(
    input: &[u8],
    pattern: &[u8],
    replacement: &[u8],
    result: &mut ValueVector,
    pos: usize,
    bind_data: &RegexBindData,
) -> Result<()> {
    let regex = bind_data.get_or_compile(pattern)?;
    let replaced = regex.replacen(input, 1, replacement);
    StringVector::add_string(result, pos, &replaced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::memory_manager::MemoryManager;
    use crate::types::LogicalType;

    fn out() -> ValueVector {
        ValueVector::new(LogicalType::string(), &MemoryManager::default())
    }

    #[test]
    fn test_concat_and_case() {
        let mut v = out();
        concat(b"graph ", b"databases are fun", &mut v, 0).unwrap();
        assert_eq!(StringVector::get_string(&v, 0), "graph databases are fun");
        upper("straße".as_bytes(), &mut v, 1).unwrap();
        assert_eq!(StringVector::get_string(&v, 1), "STRASSE");
        lower(b"MiXeD", &mut v, 2).unwrap();
        assert_eq!(StringVector::get_string(&v, 2), "mixed");
    }

    #[test]
    fn test_length_counts_characters() {
        assert_eq!(length(b"abc"), 3);
        assert_eq!(length("héllo".as_bytes()), 5);
        assert_eq!(length(b""), 0);
    }

    #[test]
    fn test_substr_is_one_based_and_clipped() {
        let mut v = out();
        substr(b"kuzu graph", 1, 4, &mut v, 0).unwrap();
        assert_eq!(StringVector::get_string(&v, 0), "kuzu");
        substr(b"kuzu graph", 6, 100, &mut v, 1).unwrap();
        assert_eq!(StringVector::get_string(&v, 1), "graph");
        substr(b"abc", 0, 2, &mut v, 2).unwrap();
        assert_eq!(StringVector::get_string(&v, 2), "a");
        substr(b"abc", 5, 2, &mut v, 3).unwrap();
        assert_eq!(StringVector::get_string(&v, 3), "");
        substr("日本語".as_bytes(), 2, 1, &mut v, 4).unwrap();
        assert_eq!(StringVector::get_string(&v, 4), "本");
    }

    #[test]
    fn test_lpad() {
        let mut v = out();
        lpad(b"7", 3, b"0", &mut v, 0).unwrap();
        assert_eq!(StringVector::get_string(&v, 0), "007");
        lpad(b"hello", 2, b"x", &mut v, 1).unwrap();
        assert_eq!(StringVector::get_string(&v, 1), "he");
        lpad(b"ab", 6, b"xy", &mut v, 2).unwrap();
        assert_eq!(StringVector::get_string(&v, 2), "xyxyab");
        lpad(b"ab", -4, b"x", &mut v, 3).unwrap();
        assert_eq!(StringVector::get_string(&v, 3), "");
    }

    #[test]
    fn test_lpad_rejects_huge_lengths() {
        let mut v = out();
        let err = lpad(b"ab", i64::MAX, b"x", &mut v, 0).unwrap_err();
        assert!(matches!(err, KuzuError::Runtime(_)));
        lpad(b"", MAX_STRING_LENGTH as i64, b"x", &mut v, 1).unwrap();
        assert_eq!(StringVector::get_string(&v, 1).len(), MAX_STRING_LENGTH);
    }

    #[test]
    fn test_regex_cache_and_replace() {
        let bind_data = RegexBindData::new();
        assert!(regexp_matches(b"abc123", b"[0-9]+", &bind_data).unwrap());
        assert!(!regexp_matches(b"abc", b"[0-9]+", &bind_data).unwrap());
        assert_eq!(bind_data.num_cached(), 1);

        let mut v = out();
        regexp_replace(b"a1b22c", b"[0-9]+", b"#", &mut v, 0, &bind_data).unwrap();
        assert_eq!(StringVector::get_string(&v, 0), "a#b22c");
        regexp_replace(b"john smith", b"(\\w+) (\\w+)", b"$2 $1", &mut v, 1, &bind_data).unwrap();
        assert_eq!(StringVector::get_string(&v, 1), "smith john");

        assert!(regexp_matches(b"x", b"(", &bind_data).is_err());
    }

    #[test]
    fn test_contains() {
        assert!(contains(b"hello", b"ell"));
        assert!(contains(b"hello", b""));
        assert!(!contains(b"he", b"hello"));
    }
}
