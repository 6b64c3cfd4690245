//! The `"{docIdx:%04X}.{pageIdx}"` id scheme pages are keyed by in the
//! text index.

use crate::error::{Error, Result};

pub fn encode(doc_idx: u64, page_idx: usize) -> String {
    format!("{doc_idx:04X}.{page_idx}")
}

pub fn decode(id: &str) -> Result<(u64, usize)> {
    let (doc_part, page_part) = id
        .split_once('.')
        .ok_or_else(|| Error::Corrupt(format!("malformed page id {id:?}")))?;
    let doc_idx = u64::from_str_radix(doc_part, 16)
        .map_err(|e| Error::Corrupt(format!("malformed docIdx in id {id:?}: {e}")))?;
    let page_idx: usize = page_part
        .parse()
        .map_err(|e| Error::Corrupt(format!("malformed pageIdx in id {id:?}: {e}")))?;
    Ok((doc_idx, page_idx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let id = encode(0x2A, 7);
        assert_eq!(id, "002A.7");
        assert_eq!(decode(&id).unwrap(), (0x2A, 7));
    }

    #[test]
    fn pads_to_at_least_four_hex_digits() {
        assert_eq!(encode(1, 0), "0001.0");
        assert_eq!(encode(0x12345, 0), "12345.0");
    }

    #[test]
    fn rejects_malformed_ids() {
        assert!(decode("no-dot-here").is_err());
        assert!(decode("zz.0").is_err());
        assert!(decode("0001.abc").is_err());
    }
}
