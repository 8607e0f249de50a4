// Rule-based word tokenizer and sentence splitter.
//
// Word tokenization follows Penn Treebank conventions closely enough for
// density scoring: punctuation becomes its own token, decimal numbers and
// hyphenated words stay whole, and English contractions are split
// ("don't" -> "do", "n't"; "John's" -> "John", "'s").
//
// Sentence boundaries come from the Unicode sentence segmentation rules
// (UAX #29) via the unicode-segmentation crate.

use unicode_segmentation::UnicodeSegmentation;

/// Suffixes split off a word after an apostrophe.
const CLITICS: [&str; 6] = ["'s", "'re", "'ve", "'ll", "'d", "'m"];

/// Split text into an ordered sequence of word and punctuation tokens.
pub fn word_tokenize(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let n = chars.len();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < n {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        i += 1;

        if is_word_char(c) {
            loop {
                if i < n && is_word_char(chars[i]) {
                    i += 1;
                } else if i + 1 < n && is_joiner(chars[i]) && is_word_char(chars[i + 1]) {
                    i += 2;
                } else {
                    break;
                }
            }
            let word: String = chars[start..i].iter().collect();
            push_word(&mut tokens, word);
        } else {
            // Ellipses and dashes stay together as one token
            if c == '.' || c == '-' {
                while i < n && chars[i] == c {
                    i += 1;
                }
            }
            tokens.push(chars[start..i].iter().collect());
        }
    }

    tokens
}

/// Split text into trimmed, non-empty sentences.
pub fn sentence_split(text: &str) -> Vec<String> {
    text.unicode_sentences()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_joiner(c: char) -> bool {
    matches!(c, '-' | '.' | '\'' | '\u{2019}')
}

/// Push a word, splitting a trailing contraction into its own token.
fn push_word(tokens: &mut Vec<String>, word: String) {
    let normalized = word.replace('\u{2019}', "'");

    if normalized.len() > 3 && normalized.to_lowercase().ends_with("n't") {
        let split = normalized.len() - 3;
        tokens.push(normalized[..split].to_string());
        tokens.push(normalized[split..].to_string());
        return;
    }

    if let Some(pos) = normalized.rfind('\'') {
        let suffix = normalized[pos..].to_lowercase();
        if pos > 0 && CLITICS.contains(&suffix.as_str()) {
            tokens.push(normalized[..pos].to_string());
            tokens.push(normalized[pos..].to_string());
            return;
        }
    }

    tokens.push(word);
}
