use anyhow::{Result, anyhow};
use isolang::Language;

/// Language utilities for caption language codes
///
/// The project accepts ISO 639-1 (2-letter) and ISO 639-3 codes plus two
/// script-specific Chinese codes, `zh_cn` and `zh_tw`. Target languages may
/// also be `none`, which disables the translated variant.
/// Language code type
#[derive(Debug, PartialEq, Eq)]
pub enum LanguageCodeType {
    /// ISO 639-1 (2-letter) code
    Part1,
    /// ISO 639-3 (3-letter) code
    Part3,
    /// Chinese with an explicit script (zh_cn / zh_tw)
    ChineseScript,
}

/// Sentinel target language meaning "do not translate"
pub const NO_TRANSLATION: &str = "none";

/// Returns true when the target language disables translation
pub fn is_no_translation(code: &str) -> bool {
    code.trim().eq_ignore_ascii_case(NO_TRANSLATION)
}

fn normalize(code: &str) -> String {
    code.trim().to_lowercase().replace('-', "_")
}

/// Validate a language code as used in configuration and on the command line
pub fn validate_project_language(code: &str) -> Result<LanguageCodeType> {
    let normalized_code = normalize(code);

    match normalized_code.as_str() {
        "zh_cn" | "zh_tw" => return Ok(LanguageCodeType::ChineseScript),
        _ => {}
    }

    // Check for ISO 639-1 (2-letter) code
    if normalized_code.len() == 2 {
        if Language::from_639_1(&normalized_code).is_some() {
            return Ok(LanguageCodeType::Part1);
        }
    }
    // Check for ISO 639-3 (3-letter) code
    else if normalized_code.len() == 3 && Language::from_639_3(&normalized_code).is_some() {
        return Ok(LanguageCodeType::Part3);
    }

    Err(anyhow!("Invalid language code: {}", code))
}

/// Get the English language name used in prompts
///
/// Script-specific Chinese codes get a qualified name so the model knows
/// which script to write. Unknown codes are returned unchanged.
pub fn standard_language_name(code: &str) -> String {
    let normalized_code = normalize(code);
    match normalized_code.as_str() {
        "zh_cn" => return "Simplified Chinese".to_string(),
        "zh_tw" => return "Traditional Chinese".to_string(),
        _ => {}
    }

    let lang = match normalized_code.len() {
        2 => Language::from_639_1(&normalized_code),
        3 => Language::from_639_3(&normalized_code),
        _ => None,
    };

    lang.map(|l| l.to_name().to_string())
        .unwrap_or_else(|| code.trim().to_string())
}

/// Whether the language is written without spaces between words
///
/// Covers the languages whose text gets CJK beautification.
pub fn is_logographic_language(code: &str) -> bool {
    matches!(
        normalize(code).as_str(),
        "zh" | "zh_cn" | "zh_tw" | "zho" | "ja" | "jpn" | "ko" | "kor"
    )
}

/// Map a project language code to the code used by the video platform's caption tracks
pub fn map_language_for_platform(code: &str) -> String {
    match normalize(code).as_str() {
        "zh_cn" => "zh-Hans".to_string(),
        "zh_tw" => "zh-Hant".to_string(),
        "he" => "iw".to_string(),
        _ => code.trim().to_string(),
    }
}

/// Check if two language codes represent the same language
pub fn language_codes_match(code1: &str, code2: &str) -> bool {
    let n1 = normalize(code1);
    let n2 = normalize(code2);
    if n1 == n2 {
        return true;
    }

    // zh_cn and zh_tw are distinct from each other but not from themselves
    if matches!(n1.as_str(), "zh_cn" | "zh_tw") || matches!(n2.as_str(), "zh_cn" | "zh_tw") {
        return false;
    }

    let to_part3 = |code: &str| -> Option<String> {
        match code.len() {
            2 => Language::from_639_1(code).map(|l| l.to_639_3().to_string()),
            3 => Language::from_639_3(code).map(|l| l.to_639_3().to_string()),
            _ => None,
        }
    };

    match (to_part3(&n1), to_part3(&n2)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
