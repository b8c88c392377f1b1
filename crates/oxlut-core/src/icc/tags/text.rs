//! Text tag types: `text`, `desc` (v2) and `mluc` (v4)

use crate::icc::error::IccError;
use crate::icc::types::read_u32;

/// Decoded text tag
#[derive(Debug, Clone, PartialEq)]
pub struct TextData {
    /// English text when available, otherwise the first record
    pub text: String,
    /// `(locale, text)` pairs from `mluc` records
    pub localized: Vec<(String, String)>,
}

impl TextData {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            localized: Vec::new(),
        }
    }

    /// Body of a `text` tag: NUL-terminated ASCII
    pub fn parse_text(data: &[u8]) -> Result<Self, IccError> {
        Ok(Self::new(ascii_until_nul(data)))
    }

    /// Body of a v2 `desc` tag. Only the ASCII part is read.
    pub fn parse_desc(data: &[u8]) -> Result<Self, IccError> {
        if data.len() < 4 {
            return Err(IccError::CorruptedData("desc tag too small".to_string()));
        }
        let count = read_u32(data, 0) as usize;
        let ascii = data
            .get(4..4 + count)
            .ok_or_else(|| IccError::CorruptedData("desc ASCII data truncated".to_string()))?;
        Ok(Self::new(ascii_until_nul(ascii)))
    }

    /// A whole `mluc` tag. String offsets are relative to the tag start.
    pub fn parse_mluc(tag: &[u8]) -> Result<Self, IccError> {
        if tag.len() < 16 {
            return Err(IccError::CorruptedData("mluc tag too small".to_string()));
        }

        let record_count = read_u32(tag, 8) as usize;
        let record_size = read_u32(tag, 12) as usize;
        if record_size < 12 {
            return Err(IccError::CorruptedData("mluc record size too small".to_string()));
        }

        let mut localized = Vec::new();
        for i in 0..record_count {
            let Some(record) = tag.get(16 + i * record_size..16 + i * record_size + 12) else {
                break;
            };
            let locale = format!(
                "{}{}-{}{}",
                char::from(record[0]),
                char::from(record[1]),
                char::from(record[2]),
                char::from(record[3])
            );
            let len = read_u32(record, 4) as usize;
            let offset = read_u32(record, 8) as usize;
            if let Some(text) = tag.get(offset..offset + len).and_then(decode_utf16be) {
                localized.push((locale, text));
            }
        }

        let text = localized
            .iter()
            .find(|(locale, _)| locale.starts_with("en"))
            .or_else(|| localized.first())
            .map(|(_, text)| text.clone())
            .unwrap_or_default();

        Ok(Self { text, localized })
    }

    /// Text for a language prefix such as `"en"`
    pub fn get_locale(&self, lang: &str) -> Option<&str> {
        self.localized
            .iter()
            .find(|(locale, _)| locale.starts_with(lang))
            .map(|(_, text)| text.as_str())
    }
}

fn ascii_until_nul(data: &[u8]) -> String {
    data.iter()
        .take_while(|&&b| b != 0)
        .map(|&b| char::from(b))
        .collect()
}

fn decode_utf16be(data: &[u8]) -> Option<String> {
    if data.len() % 2 != 0 {
        return None;
    }
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .take_while(|&c| c != 0)
        .collect();
    String::from_utf16(&units).ok()
}
