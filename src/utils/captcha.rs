//! 算术验证码

use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
}

impl Operation {
    fn symbol(&self) -> &'static str {
        match self {
            Operation::Add => "+",
            Operation::Subtract => "-",
            Operation::Multiply => "×",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MathChallenge {
    pub question: String,
    pub answer: i64,
}

impl MathChallenge {
    /// 由两个操作数生成题目；减法总是大数减小数
    pub fn from_parts(a: i64, b: i64, op: Operation) -> Self {
        let (a, b) = match op {
            Operation::Subtract => (a.max(b), a.min(b)),
            _ => (a, b),
        };
        let answer = match op {
            Operation::Add => a + b,
            Operation::Subtract => a - b,
            Operation::Multiply => a * b,
        };
        Self {
            question: format!("{a} {} {b}", op.symbol()),
            answer,
        }
    }

    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let a = rng.random_range(1..=10);
        let b = rng.random_range(1..=10);
        let op = match rng.random_range(0..3) {
            0 => Operation::Add,
            1 => Operation::Subtract,
            _ => Operation::Multiply,
        };
        Self::from_parts(a, b, op)
    }
}

/// 宽松的整数解析：忽略前导空白，可带符号，读取到第一个非数字为止
pub fn parse_answer(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let digits: &str = &rest[..rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len())];
    digits.parse::<i64>().ok().map(|n| sign * n)
}
