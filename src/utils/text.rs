//! 文本处理工具

use regex::Regex;
use std::sync::OnceLock;

fn non_word() -> &'static Regex {
    static NON_WORD: OnceLock<Regex> = OnceLock::new();
    NON_WORD.get_or_init(|| Regex::new(r"[^\w]").expect("静态正则表达式"))
}

/// 合并连续重复的单词
///
/// 比较时忽略标点；重复时保留后出现的写法，例如
/// `"a dog dog, running"` → `"a dog, running"`。
pub fn clean_repeated_words(text: &str) -> String {
    let mut result: Vec<&str> = Vec::new();
    for word in text.split_whitespace() {
        let current = non_word().replace_all(word, "");
        match result.last_mut() {
            Some(last) if !current.is_empty() && current == non_word().replace_all(last, "") => {
                *last = word;
            }
            _ => result.push(word),
        }
    }
    result.join(" ")
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_repeated_words() {
        assert_eq!(clean_repeated_words("a dog dog, running"), "a dog, running");
        assert_eq!(
            clean_repeated_words("a man man man standing"),
            "a man standing"
        );
        assert_eq!(clean_repeated_words("  "), "");
        assert_eq!(clean_repeated_words(""), "");
        // 纯标点不参与合并
        assert_eq!(clean_repeated_words("wow - - nice"), "wow - - nice");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("短文本", 10), "短文本");
        assert_eq!(truncate_text("abcdefgh", 3), "abc...");
    }
}
