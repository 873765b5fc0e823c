use std::collections::HashMap;

/// Maps a raw keystroke to the character it produces in the target script.
///
/// Implementations are total: any key the table does not know is returned
/// unchanged so it can be typed verbatim.
pub trait KeyMapper: Send + Sync {
    fn map(&self, raw: char) -> char;
}

/// Standard phonetic Thaana keyboard layout.
const PHONETIC_LAYOUT: &[(char, char)] = &[
    // Consonants
    ('h', 'ހ'),
    ('S', 'ށ'),
    ('n', 'ނ'),
    ('r', 'ރ'),
    ('b', 'ބ'),
    ('L', 'ޅ'),
    ('k', 'ކ'),
    ('w', 'އ'),
    ('v', 'ވ'),
    ('m', 'މ'),
    ('f', 'ފ'),
    ('d', 'ދ'),
    ('t', 'ތ'),
    ('l', 'ލ'),
    ('g', 'ގ'),
    ('N', 'ޏ'),
    ('s', 'ސ'),
    ('D', 'ޑ'),
    ('z', 'ޒ'),
    ('T', 'ޓ'),
    ('y', 'ޔ'),
    ('p', 'ޕ'),
    ('j', 'ޖ'),
    ('c', 'ޗ'),
    // Arabic-derived letters
    ('X', 'ޘ'),
    ('H', 'ޙ'),
    ('K', 'ޚ'),
    ('J', 'ޛ'),
    ('R', 'ޜ'),
    ('C', 'ޝ'),
    ('B', 'ޞ'),
    ('M', 'ޟ'),
    ('Y', 'ޠ'),
    ('Z', 'ޡ'),
    ('W', 'ޢ'),
    ('G', 'ޣ'),
    ('Q', 'ޤ'),
    ('V', 'ޥ'),
    // Vowel signs (fili) and sukun
    ('a', 'ަ'),
    ('A', 'ާ'),
    ('i', 'ި'),
    ('I', 'ީ'),
    ('u', 'ު'),
    ('U', 'ޫ'),
    ('e', 'ެ'),
    ('E', 'ޭ'),
    ('o', 'ޮ'),
    ('O', 'ޯ'),
    ('q', 'ް'),
    // Punctuation
    (',', '،'),
    (';', '؛'),
    ('?', '؟'),
];

#[derive(Debug, Clone)]
pub struct PhoneticKeyMapper {
    table: HashMap<char, char>,
}

impl PhoneticKeyMapper {
    pub fn new() -> Self {
        Self {
            table: PHONETIC_LAYOUT.iter().copied().collect(),
        }
    }
}

impl Default for PhoneticKeyMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyMapper for PhoneticKeyMapper {
    fn map(&self, raw: char) -> char {
        self.table.get(&raw).copied().unwrap_or(raw)
    }
}

/// Passes every key through untouched. Useful when the input method already
/// produces script characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityKeyMapper;

impl KeyMapper for IdentityKeyMapper {
    fn map(&self, raw: char) -> char {
        raw
    }
}
