//! 密码强度评估
//!
//! 加分项：长度 ≥ 6、长度 ≥ 10、大写、小写、数字、特殊字符；
//! 命中常见模式扣 2 分。最终分数为 `min(4, floor(raw / 1.5))`。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::auth::responses::PasswordStrength;

static COMMON_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"^123", r"(?i)password", r"(?i)qwerty", r"(?i)abc", r"111", r"000"]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

pub fn check_password_strength(password: &str) -> PasswordStrength {
    let mut feedback = Vec::new();
    let mut raw: u32 = 0;
    let length = password.chars().count();

    if length >= 6 {
        raw += 1;
    } else {
        feedback.push("At least 6 characters".to_string());
    }
    if length >= 10 {
        raw += 1;
    }

    let checks: [(fn(&char) -> bool, &str); 4] = [
        (char::is_ascii_uppercase, "One uppercase letter"),
        (char::is_ascii_lowercase, "One lowercase letter"),
        (char::is_ascii_digit, "One number"),
        (|c| !c.is_ascii_alphanumeric(), "One special character (!@#$%^&*)"),
    ];
    for (test, hint) in checks {
        if password.chars().any(|c| test(&c)) {
            raw += 1;
        } else {
            feedback.push(hint.to_string());
        }
    }

    if COMMON_PATTERNS.iter().any(|re| re.is_match(password)) {
        raw = raw.saturating_sub(2);
        feedback.push("Avoid common patterns".to_string());
    }

    // raw / 1.5 向下取整
    let score = ((raw * 2) / 3).min(4) as u8;

    PasswordStrength {
        score,
        feedback,
        is_strong: score >= 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_password() {
        let s = check_password_strength("");
        assert_eq!(s.score, 0);
        assert!(!s.is_strong);
        assert!(s.feedback.contains(&"At least 6 characters".to_string()));
        assert!(s.feedback.contains(&"One special character (!@#$%^&*)".to_string()));
    }

    #[test]
    fn test_strong_password() {
        let s = check_password_strength("Tr0ub4dor&Horse");
        // 6 分 -> 4
        assert_eq!(s.score, 4);
        assert!(s.is_strong);
        assert!(s.feedback.is_empty());
    }

    #[test]
    fn test_common_pattern_penalty() {
        let plain = check_password_strength("Xyzzy#9876");
        let common = check_password_strength("Password#9876");
        assert!(common.score <= plain.score);
        assert!(common.feedback.contains(&"Avoid common patterns".to_string()));

        // "^123" 只匹配开头
        assert!(
            !check_password_strength("Zz9!x123")
                .feedback
                .contains(&"Avoid common patterns".to_string())
        );
        assert!(
            check_password_strength("123Zz9!x")
                .feedback
                .contains(&"Avoid common patterns".to_string())
        );
    }

    #[test]
    fn test_adding_classes_never_lowers_score() {
        let steps = ["zzzzzzzz", "Zzzzzzzz", "Zzzzzzz9", "Zzzzzz9!"];
        let scores: Vec<u8> = steps
            .iter()
            .map(|p| check_password_strength(p).score)
            .collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]), "{scores:?}");
        assert!(check_password_strength("Zzzzzz9!").is_strong);
    }

    #[test]
    fn test_length_counts_characters() {
        // 5 个字符，15 个字节
        let s = check_password_strength("密码密码密");
        assert!(s.feedback.contains(&"At least 6 characters".to_string()));
    }

    #[test]
    fn test_score_floor() {
        // 原始 5 分，命中 "abc" 扣到 3，floor(3 / 1.5) = 2
        let s = check_password_strength("Abcdefg1!");
        assert!(s.feedback.contains(&"Avoid common patterns".to_string()));
        assert_eq!(s.score, 2);
        assert!(!s.is_strong);
    }
}
