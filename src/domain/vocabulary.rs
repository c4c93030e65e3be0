// ============================================================
// Layer 3 — Vocabulary
// ============================================================
// Bidirectional token <-> index mapping.
//
// Layout:
//   0  <PAD>   padding for batched tensors
//   1  <UNK>   any token that did not make the cut
//   2  <s>     start of sequence
//   3  </s>    end of sequence
//   4… learned tokens, most frequent first
//
// Ties in frequency are broken by the order in which the tokens
// were first seen in the corpus, so building twice from the same
// corpus always yields the same indices.

use std::collections::HashMap;

pub const PAD_INDEX: usize = 0;
pub const UNK_INDEX: usize = 1;
pub const START_INDEX: usize = 2;
pub const END_INDEX: usize = 3;

pub const PAD_TOKEN: &str = "<PAD>";
pub const UNK_TOKEN: &str = "<UNK>";
pub const START_TOKEN: &str = "<s>";
pub const END_TOKEN: &str = "</s>";

/// Marker texts in index order.
pub const RESERVED_TOKENS: [&str; 4] = [PAD_TOKEN, UNK_TOKEN, START_TOKEN, END_TOKEN];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    /// index -> token
    tokens: Vec<String>,
    /// token -> index
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// A vocabulary holding only the four reserved markers.
    pub fn reserved() -> Self {
        let tokens: Vec<String> = RESERVED_TOKENS.iter().map(|t| t.to_string()).collect();
        Self::index_tokens(tokens)
    }

    /// Build from already-segmented texts.
    ///
    /// Keeps at most `vocab_size - 4` learned tokens.
    pub fn build(segmented: &[Vec<String>], vocab_size: usize) -> Self {
        // token -> (count, first seen position)
        let mut freq: HashMap<&str, (usize, usize)> = HashMap::new();
        let mut seen = 0usize;

        for text in segmented {
            for token in text {
                let entry = freq.entry(token.as_str()).or_insert((0, seen));
                entry.0 += 1;
                seen += 1;
            }
        }

        let mut ranked: Vec<(&str, usize, usize)> = freq
            .into_iter()
            .filter(|(token, _)| !RESERVED_TOKENS.contains(token))
            .map(|(token, (count, first))| (token, count, first))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked.truncate(vocab_size.saturating_sub(RESERVED_TOKENS.len()));

        let mut tokens: Vec<String> = RESERVED_TOKENS.iter().map(|t| t.to_string()).collect();
        tokens.extend(ranked.into_iter().map(|(token, _, _)| token.to_string()));

        tracing::debug!("Vocabulary built: {} entries (cap {})", tokens.len(), vocab_size);
        Self::index_tokens(tokens)
    }

    /// Restore from the index -> token list stored in a checkpoint.
    pub fn from_tokens(tokens: Vec<String>) -> Result<Self, String> {
        if tokens.len() < RESERVED_TOKENS.len()
            || tokens.iter().zip(RESERVED_TOKENS.iter()).any(|(a, b)| a != b)
        {
            return Err("vocabulary does not start with the reserved markers".to_string());
        }
        let vocab = Self::index_tokens(tokens);
        if vocab.index.len() != vocab.tokens.len() {
            return Err("vocabulary contains duplicate tokens".to_string());
        }
        Ok(vocab)
    }

    fn index_tokens(tokens: Vec<String>) -> Self {
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { tokens, index }
    }

    /// Number of entries, reserved markers included.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Entries learned from the corpus (everything after the markers).
    pub fn learned_len(&self) -> usize {
        self.tokens.len().saturating_sub(RESERVED_TOKENS.len())
    }

    pub fn get(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    /// Index of `token`, or the unknown index when absent.
    pub fn index_of(&self, token: &str) -> usize {
        self.get(token).unwrap_or(UNK_INDEX)
    }

    /// Text for `index`; indices outside the table read as `<UNK>`.
    pub fn token(&self, index: usize) -> &str {
        self.tokens.get(index).map(String::as_str).unwrap_or(UNK_TOKEN)
    }

    /// Concatenate token texts with no separator (Chinese has no spaces).
    pub fn decode(&self, indices: &[usize]) -> String {
        indices.iter().map(|&i| self.token(i)).collect()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::reserved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn seg(texts: &[&[&str]]) -> Vec<Vec<String>> {
        texts
            .iter()
            .map(|t| t.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_reserved_indices_are_fixed() {
        let v = Vocabulary::build(&seg(&[&["<s>", "猫", "<PAD>"]]), 50);
        assert_eq!(v.token(PAD_INDEX), PAD_TOKEN);
        assert_eq!(v.token(UNK_INDEX), UNK_TOKEN);
        assert_eq!(v.token(START_INDEX), START_TOKEN);
        assert_eq!(v.token(END_INDEX), END_TOKEN);
        assert_eq!(v.get("猫"), Some(4));
        assert_eq!(v.len(), 5);
    }

    #[test]
    fn test_empty_corpus_has_only_markers() {
        let v = Vocabulary::build(&[], 100);
        assert_eq!(v.len(), 4);
        assert_eq!(v.learned_len(), 0);
    }

    #[test]
    fn test_frequency_then_first_seen_order() {
        // 我 爱 你 / 你 爱 我 : all three appear twice
        let v = Vocabulary::build(&seg(&[&["我", "爱", "你"], &["你", "爱", "我"]]), 10);
        assert_eq!(v.get("我"), Some(4));
        assert_eq!(v.get("爱"), Some(5));
        assert_eq!(v.get("你"), Some(6));
        assert_eq!(v.len(), 7);
    }

    #[test]
    fn test_more_frequent_tokens_come_first() {
        let v = Vocabulary::build(&seg(&[&["a", "b", "b", "c", "c", "c"]]), 10);
        assert_eq!(v.get("c"), Some(4));
        assert_eq!(v.get("b"), Some(5));
        assert_eq!(v.get("a"), Some(6));
    }

    #[test]
    fn test_cap_drops_rare_tokens() {
        let v = Vocabulary::build(&seg(&[&["a", "a", "b", "c"]]), 5);
        assert_eq!(v.len(), 5);
        assert_eq!(v.get("a"), Some(4));
        assert_eq!(v.get("b"), None);
        assert_eq!(v.index_of("c"), UNK_INDEX);
    }

    #[test]
    fn test_indices_are_unique() {
        let words: Vec<String> = (0..200).map(|i| format!("w{}", i % 37)).collect();
        let v = Vocabulary::build(&[words], 30);
        let unique: HashSet<usize> = v.tokens().iter().map(|t| v.index_of(t)).collect();
        assert_eq!(unique.len(), v.len());
    }

    #[test]
    fn test_decode_maps_unknown_and_out_of_range() {
        let v = Vocabulary::build(&seg(&[&["好", "天"]]), 10);
        assert_eq!(v.decode(&[4, 5, 999, END_INDEX]), "好天<UNK></s>");
    }

    #[test]
    fn test_from_tokens_round_trip_and_validation() {
        let v = Vocabulary::build(&seg(&[&["山", "水"]]), 10);
        let restored = Vocabulary::from_tokens(v.tokens().to_vec()).unwrap();
        assert_eq!(restored, v);

        assert!(Vocabulary::from_tokens(vec!["x".into()]).is_err());
        let mut dup = v.tokens().to_vec();
        dup.push("山".into());
        assert!(Vocabulary::from_tokens(dup).is_err());
    }
}
