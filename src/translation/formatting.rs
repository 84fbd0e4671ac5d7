/*!
 * Text clean-up applied to model output and to finished captions.
 *
 * Models like to wrap JSON in markdown fences and to leave spaces between
 * CJK characters. Both are undone here.
 */

use once_cell::sync::Lazy;
use regex::Regex;

use crate::language_utils;
use crate::subtitle_processor::CaptionBlock;

/// Fenced block with an optional language tag
static CODE_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*\n?(.*?)\s*```\s*$").unwrap()
});

static WHITESPACE_RUN_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Full-width punctuation that never takes surrounding spaces
const FULL_WIDTH_PUNCTUATION: &[char] = &[
    '，', '。', '！', '？', '；', '：', '、', '「', '」', '『', '』',
    '（', '）', '《', '》', '【', '】', '“', '”', '‘', '’', '…', '～',
];

/// Caption text formatter
pub struct TextFormatter;

impl TextFormatter {
    /// Remove a surrounding markdown code fence, if any
    pub fn clean_markdown_code_block(text: &str) -> String {
        match CODE_FENCE_REGEX.captures(text) {
            Some(caps) => caps[1].trim().to_string(),
            None => text.trim().to_string(),
        }
    }

    /// Han, kana and CJK symbol ranges
    ///
    /// Hangul is excluded; Korean separates words with spaces.
    fn is_cjk(c: char) -> bool {
        matches!(c,
            '\u{3040}'..='\u{30FF}'   // Hiragana, Katakana
            | '\u{3400}'..='\u{4DBF}' // CJK Extension A
            | '\u{4E00}'..='\u{9FFF}' // CJK Unified Ideographs
            | '\u{F900}'..='\u{FAFF}' // CJK Compatibility Ideographs
            | '\u{3000}'..='\u{303F}' // CJK Symbols and Punctuation
            | '\u{FF00}'..='\u{FFEF}' // Half/full-width forms
        )
    }

    fn is_full_width_punctuation(c: char) -> bool {
        FULL_WIDTH_PUNCTUATION.contains(&c)
    }

    /// Normalize spacing and punctuation for Chinese, Japanese and Korean text
    pub fn beautify_logographic(text: &str) -> String {
        let collapsed = WHITESPACE_RUN_REGEX.replace_all(text.trim(), " ");
        let chars: Vec<char> = collapsed.chars().collect();

        let mut result = String::with_capacity(collapsed.len());
        for (i, &c) in chars.iter().enumerate() {
            if c == ' ' {
                // Interior space: neighbours always exist after trimming
                let prev = chars[i - 1];
                let next = chars[i + 1];
                let between_cjk = Self::is_cjk(prev) && Self::is_cjk(next);
                let touches_punctuation = Self::is_full_width_punctuation(prev) || Self::is_full_width_punctuation(next);
                if between_cjk || touches_punctuation {
                    continue;
                }
            }
            result.push(c);
        }

        result.trim_end_matches(['，', '。']).to_string()
    }

    /// Beautify the text of a language; non-logographic text is only trimmed
    pub fn beautify_for_language(text: &str, language: &str) -> String {
        if language_utils::is_logographic_language(language) {
            Self::beautify_logographic(text)
        } else {
            text.trim().to_string()
        }
    }

    /// Apply language-specific beautification to both texts of every block
    pub fn beautify_blocks(blocks: &mut [CaptionBlock], origin_language: &str, target_language: &str) {
        let origin_logographic = language_utils::is_logographic_language(origin_language);
        let target_logographic = language_utils::is_logographic_language(target_language);

        for block in blocks.iter_mut() {
            if target_logographic {
                block.target_text = Self::beautify_logographic(&block.target_text);
            }
            if origin_logographic {
                block.origin_text = Self::beautify_logographic(&block.origin_text);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanMarkdownCodeBlock_withJsonFence_shouldUnwrap() {
        let fenced = "```json\n{\"parts\": [\"a\", \"b\"]}\n```";
        assert_eq!(TextFormatter::clean_markdown_code_block(fenced), "{\"parts\": [\"a\", \"b\"]}");
        assert_eq!(TextFormatter::clean_markdown_code_block("  {\"x\": 1} "), "{\"x\": 1}");
        assert_eq!(TextFormatter::clean_markdown_code_block("```\nplain\n```"), "plain");
    }

    #[test]
    fn test_beautifyLogographic_shouldRemoveSpacesBetweenCjk() {
        assert_eq!(TextFormatter::beautify_logographic("我 们  去 吧"), "我们去吧");
        assert_eq!(TextFormatter::beautify_logographic("你好 ， 世界 。"), "你好，世界");
        assert_eq!(TextFormatter::beautify_logographic("使用 Rust 编程"), "使用 Rust 编程");
    }

    #[test]
    fn test_beautifyLogographic_withKorean_shouldKeepWordSpaces() {
        assert_eq!(TextFormatter::beautify_logographic("안녕 하세요"), "안녕 하세요");
    }

    #[test]
    fn test_beautifyBlocks_shouldOnlyTouchLogographicSides() {
        let mut blocks = vec![CaptionBlock::new(1, 0, 1_000, "hello  there")];
        blocks[0].target_text = "你 好。".to_string();

        TextFormatter::beautify_blocks(&mut blocks, "en", "zh_cn");
        assert_eq!(blocks[0].target_text, "你好");
        assert_eq!(blocks[0].origin_text, "hello  there");
    }
}
