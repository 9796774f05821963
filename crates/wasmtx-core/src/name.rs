//! 64-bit names for accounts, contracts, actions and permissions
//!
//! A name packs up to 13 characters from the alphabet
//! `.12345abcdefghijklmnopqrstuvwxyz` into a `u64`. The first 12 characters
//! take 5 bits each starting from the most significant bit; the 13th takes
//! the low 4 bits. The canonical string form drops trailing dots.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Maximum number of characters in a name
pub const MAX_NAME_LEN: usize = 13;

/// A 64-bit encoded name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(pub u64);

impl Name {
    /// Encode a name, failing on characters outside the alphabet or
    /// names longer than 13 characters.
    pub fn new(text: &str) -> Result<Self> {
        let bytes = text.as_bytes();
        if bytes.len() > MAX_NAME_LEN {
            return Err(Error::Parse(format!(
                "name '{}' is longer than {} characters",
                text, MAX_NAME_LEN
            )));
        }

        let mut value = 0u64;
        for (i, &c) in bytes.iter().enumerate() {
            let symbol = char_to_symbol(c).ok_or_else(|| {
                Error::Parse(format!("invalid character '{}' in name '{}'", c as char, text))
            })?;
            if i < MAX_NAME_LEN - 1 {
                value |= (symbol & 0x1f) << (64 - 5 * (i + 1));
            } else {
                if symbol > 0x0f {
                    return Err(Error::Parse(format!(
                        "thirteenth character of name '{}' must be one of .12345abcdefghij",
                        text
                    )));
                }
                value |= symbol;
            }
        }
        Ok(Name(value))
    }

    /// Raw numeric value
    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

fn char_to_symbol(c: u8) -> Option<u64> {
    match c {
        b'a'..=b'z' => Some(u64::from(c - b'a') + 6),
        b'1'..=b'5' => Some(u64::from(c - b'1') + 1),
        b'.' => Some(0),
        _ => None,
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chars = [b'.'; MAX_NAME_LEN];
        let mut tmp = self.0;
        for i in 0..MAX_NAME_LEN {
            let (mask, shift) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
            chars[MAX_NAME_LEN - 1 - i] = CHARMAP[(tmp & mask) as usize];
            tmp >>= shift;
        }
        let end = chars
            .iter()
            .rposition(|&c| c != b'.')
            .map_or(0, |pos| pos + 1);
        // Every byte comes from CHARMAP, which is ASCII.
        f.write_str(std::str::from_utf8(&chars[..end]).map_err(|_| fmt::Error)?)
    }
}

impl FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Name::new(s)
    }
}

impl From<u64> for Name {
    fn from(value: u64) -> Self {
        Name(value)
    }
}

impl serde::Serialize for Name {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Name {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Name::new(&text).map_err(serde::de::Error::custom)
    }
}
