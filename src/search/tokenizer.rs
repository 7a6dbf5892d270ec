//! Tokenizer - uses jieba-rs for CJK word segmentation / 分词器
//!
//! Supports / 支持：
//! - Chinese word segmentation (jieba) / 中文分词
//! - Latin text split on any non-alphanumeric character + lowercase / 英文分词
//! - Mixed text processing / 混合文本处理
//!
//! Documents and queries go through the same function so their terms line up.

use jieba_rs::Jieba;
use once_cell::sync::Lazy;

/// Global jieba tokenizer instance / 全局 jieba 分词器实例
static JIEBA: Lazy<Jieba> = Lazy::new(Jieba::new);

/// Tokenize text / 对文本进行分词
///
/// Splits on any non-alphanumeric character; pieces containing CJK characters are
/// further segmented by jieba in search mode / 含中日韩字符的片段再用 jieba 分词
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();

    for piece in text.split(|c: char| !c.is_alphanumeric()) {
        if piece.is_empty() {
            continue;
        }
        if !contains_cjk(piece) {
            tokens.push(piece.to_lowercase());
            continue;
        }
        for word in JIEBA.cut_for_search(piece, true) {
            let word = word.trim();
            if !word.is_empty() {
                tokens.push(word.to_lowercase());
            }
        }
    }

    tokens
}

/// Check if text contains CJK characters (Chinese, Japanese, Korean) / 检测文本是否包含CJK字符
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(|c| {
        matches!(c,
            '\u{4e00}'..='\u{9fff}' |  // CJK Unified Ideographs
            '\u{3400}'..='\u{4dbf}' |  // CJK Extension A
            '\u{3040}'..='\u{309f}' |  // Hiragana
            '\u{30a0}'..='\u{30ff}' |  // Katakana
            '\u{ac00}'..='\u{d7af}'    // Hangul Syllables
        )
    })
}
