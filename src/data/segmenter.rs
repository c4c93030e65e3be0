// ============================================================
// Layer 4 — CJK Segmenter
// ============================================================
// Word segmentation built from the `tokenizers` pipeline pieces
// (no trained tokenizer model is involved):
//
//   BertNormalizer(handle_chinese_chars) → puts spaces around every
//                                          CJK ideograph, drops
//                                          control characters
//   Whitespace pre-tokenizer             → splits on \w+ | [^\w\s]+
//
// So "我爱你。Tom来了" becomes ["我", "爱", "你", "。", "Tom", "来", "了"].
// Case and accents are preserved; the vocabulary decides what is rare.

use tokenizers::{
    normalizers::BertNormalizer, pre_tokenizers::whitespace::Whitespace, NormalizedString,
    Normalizer, OffsetReferential, OffsetType, PreTokenizedString, PreTokenizer,
};

use crate::domain::traits::Segmenter;
use crate::error::{GanError, Result};

#[derive(Debug, Clone)]
pub struct CjkSegmenter {
    normalizer: BertNormalizer,
    pre_tokenizer: Whitespace,
}

impl CjkSegmenter {
    pub fn new() -> Self {
        Self {
            // clean_text, handle_chinese_chars, strip_accents, lowercase
            normalizer: BertNormalizer::new(true, true, Some(false), false),
            pre_tokenizer: Whitespace::default(),
        }
    }
}

impl Default for CjkSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter for CjkSegmenter {
    fn segment(&self, text: &str) -> Result<Vec<String>> {
        let mut normalized = NormalizedString::from(text);
        self.normalizer
            .normalize(&mut normalized)
            .map_err(|e| GanError::Tokenization(e.to_string()))?;

        let mut pretokenized = PreTokenizedString::from(normalized);
        self.pre_tokenizer
            .pre_tokenize(&mut pretokenized)
            .map_err(|e| GanError::Tokenization(e.to_string()))?;

        Ok(pretokenized
            .get_splits(OffsetReferential::Original, OffsetType::Char)
            .into_iter()
            .map(|(piece, _, _)| piece.to_string())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_ideograph_is_a_token() {
        let s = CjkSegmenter::new();
        assert_eq!(s.segment("我爱你").unwrap(), vec!["我", "爱", "你"]);
    }

    #[test]
    fn test_punctuation_and_latin_words() {
        let s = CjkSegmenter::new();
        assert_eq!(
            s.segment("小猫很可爱。Tom 来了").unwrap(),
            vec!["小", "猫", "很", "可", "爱", "。", "Tom", "来", "了"]
        );
    }

    #[test]
    fn test_empty_and_blank_text() {
        let s = CjkSegmenter::new();
        assert!(s.segment("").unwrap().is_empty());
        assert!(s.segment("   \n\t").unwrap().is_empty());
    }
}
