use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::homework::requests::HomeworkForm;

static CLASS_CODE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{1,2}[A-Z]{2,3}[0-9]{1,2}$").expect("Invalid class code regex"));

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("Invalid email regex")
});

pub const HOMEWORK_TITLE_MAX: usize = 200;

/// 去掉首尾空白并转为大写
pub fn normalize_class_code(code: &str) -> String {
    code.trim().to_uppercase()
}

/// 入参应已规范化
pub fn is_valid_class_code(code: &str) -> bool {
    CLASS_CODE_RE.is_match(code)
}

pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.trim().is_empty() {
        return Err("Please enter your email address");
    }
    if !EMAIL_RE.is_match(email.trim()) {
        return Err("Email format is invalid");
    }
    Ok(())
}

/// 规范化作业表单：标题去空白，空的可选字段置为 None
pub fn validate_homework_form(mut form: HomeworkForm) -> Result<HomeworkForm, &'static str> {
    let title = form.title.trim();
    if title.is_empty() {
        return Err("Title is required");
    }
    if title.chars().count() > HOMEWORK_TITLE_MAX {
        return Err("Title must be at most 200 characters");
    }
    form.title = title.to_string();

    let blank_to_none = |v: Option<String>| {
        v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
    };
    form.description = blank_to_none(form.description);
    form.subject = blank_to_none(form.subject);
    Ok(form)
}
