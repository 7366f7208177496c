//! Word splitter - jieba segmentation plus CJK bigrams / 分词器
//!
//! Supports / 支持：
//! - CJK dictionary segmentation (jieba) / 中日韩分词
//! - Whitespace/punctuation splitting for other scripts / 其他文字按空白和标点切分
//! - Overlapping bigrams for ideographic runs, so text with no word
//!   boundaries still yields multiple multi-character terms
//!
//! Deterministic for a given input; the only process-wide state is the
//! read-only jieba dictionary initialized once.

use jieba_rs::Jieba;
use once_cell::sync::Lazy;

/// Global jieba tokenizer instance / 全局 jieba 分词器实例
static JIEBA: Lazy<Jieba> = Lazy::new(Jieba::new);

/// Split text into raw terms. Case is left untouched; canonicalization
/// belongs to the indexing context.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut terms = Vec::new();

    // jieba search-engine mode handles mixed CJK/Latin text / 使用 jieba
    for word in JIEBA.cut_for_search(text, true) {
        let word = word.trim();
        if word.is_empty() || !word.chars().any(|c| c.is_alphanumeric()) {
            continue;
        }
        terms.push(word.to_string());
    }

    // Overlapping bigrams for every ideographic run, in addition to the
    // dictionary cut. A lone CJK character contributes itself.
    for run in cjk_runs(text) {
        for gram in generate_ngrams(&run, 2, 2) {
            if !terms.contains(&gram) {
                terms.push(gram);
            }
        }
        if run.chars().count() == 1 && !terms.contains(&run) {
            terms.push(run);
        }
    }

    terms
}

/// Generate N-grams over the characters of `text` / 生成 N-gram
///
/// Example: `generate_ngrams("测试中", 2, 2)` -> `["测试", "试中"]`
pub fn generate_ngrams(text: &str, min_n: usize, max_n: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut ngrams = Vec::new();

    for n in min_n..=max_n {
        if n == 0 || n > chars.len() {
            continue;
        }
        for i in 0..=(chars.len() - n) {
            let ngram: String = chars[i..i + n].iter().collect();
            if !ngram.trim().is_empty() {
                ngrams.push(ngram);
            }
        }
    }

    ngrams
}

/// Check if a character is CJK (Chinese, Japanese, Korean) / 检测CJK字符
pub fn is_cjk(c: char) -> bool {
    matches!(c,
        '\u{4e00}'..='\u{9fff}' |  // CJK Unified Ideographs
        '\u{3400}'..='\u{4dbf}' |  // CJK Extension A
        '\u{3040}'..='\u{309f}' |  // Hiragana
        '\u{30a0}'..='\u{30ff}' |  // Katakana
        '\u{ac00}'..='\u{d7af}'    // Hangul Syllables
    )
}

/// Check if text contains CJK characters / 检测文本是否包含CJK字符
pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

/// Maximal consecutive runs of CJK characters in `text`.
fn cjk_runs(text: &str) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if is_cjk(c) {
            current.push(c);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_english() {
        let terms = tokenize("the quick fox");
        assert!(terms.contains(&"the".to_string()));
        assert!(terms.contains(&"quick".to_string()));
        assert!(terms.contains(&"fox".to_string()));
    }

    #[test]
    fn test_tokenize_never_emits_empty_terms() {
        for terms in [tokenize(""), tokenize("   \t\n"), tokenize("!!! ... ---")] {
            assert!(terms.iter().all(|t| !t.is_empty()));
        }
        assert!(tokenize("").is_empty());
        assert!(tokenize("?!,.").is_empty());
    }

    #[test]
    fn test_tokenize_cjk_yields_overlapping_bigrams() {
        // Four ideographs with no spaces must split into multiple
        // overlapping multi-character terms, not one opaque token.
        let terms = tokenize("中华人民");
        assert!(terms.len() > 1);
        assert!(terms.contains(&"中华".to_string()));
        assert!(terms.contains(&"华人".to_string()));
        assert!(terms.contains(&"人民".to_string()));
    }

    #[test]
    fn test_tokenize_single_cjk_char() {
        let terms = tokenize("书");
        assert!(terms.contains(&"书".to_string()));
    }

    #[test]
    fn test_tokenize_mixed() {
        let terms = tokenize("测试文件 report.txt");
        assert!(terms.contains(&"测试".to_string()));
        assert!(terms.iter().any(|t| t.contains("report")));
    }

    #[test]
    fn test_tokenize_deterministic() {
        assert_eq!(tokenize("mixed 测试 input"), tokenize("mixed 测试 input"));
    }

    #[test]
    fn test_ngrams() {
        let ngrams = generate_ngrams("测试中", 2, 2);
        assert_eq!(ngrams, vec!["测试".to_string(), "试中".to_string()]);
        assert!(generate_ngrams("a", 2, 2).is_empty());
    }

    #[test]
    fn test_cjk_runs() {
        assert_eq!(cjk_runs("abc测试def文"), vec!["测试", "文"]);
        assert!(cjk_runs("plain ascii").is_empty());
    }

    #[test]
    fn test_contains_cjk() {
        assert!(contains_cjk("テスト"));
        assert!(contains_cjk("test测试"));
        assert!(!contains_cjk("test"));
    }
}
