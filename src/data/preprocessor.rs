// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Cleans raw corpus text before segmentation.
//
// Story files are plain UTF-8, one story per line. Text copied
// from the web or from word processors often carries:
//   - full-width spaces (U+3000) and non-breaking spaces
//   - zero-width spaces and byte order marks
//   - Windows line endings and stray control characters
//
// Cleaning steps (applied in order):
//   1. Map whitespace variants to a plain space, \r to \n,
//      drop invisible characters
//   2. Collapse runs of spaces and trim each line
//   3. Drop blank lines

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean a single story line.
    pub fn clean(&self, text: &str) -> String {
        let mut out        = String::with_capacity(text.len());
        let mut last_space = true;

        for c in text.chars().filter_map(normalise_char) {
            if c == ' ' || c == '\n' {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            } else {
                out.push(c);
                last_space = false;
            }
        }

        out.trim_end().to_string()
    }

    /// Split a corpus file into cleaned, non-empty stories.
    pub fn split_stories(&self, text: &str) -> Vec<String> {
        text.split(['\n', '\r'])
            .map(|line| self.clean(line))
            .filter(|line| !line.is_empty())
            .collect()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Character-level normalisation. `None` drops the character.
fn normalise_char(c: char) -> Option<char> {
    match c {
        '\t' | '\u{00A0}' | '\u{3000}' => Some(' '),
        '\u{200B}' | '\u{FEFF}' => None,
        '\r' => Some('\n'),
        c if c.is_control() && c != '\n' => None,
        c => Some(c),
    }
}
