//! 统一错误处理模块
//!
//! 使用宏生成错误枚举，每个变体带有错误代码、类型名称和详情。

use std::fmt;

/// 定义错误类型的宏
///
/// 生成 enum 本体、`code()` / `error_type()` / `message()` 以及
/// 以变体蛇形命名的构造函数。
macro_rules! define_planner_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum PlannerError {
            $($variant(String),)*
        }

        impl PlannerError {
            pub fn code(&self) -> &'static str {
                match self {
                    $(PlannerError::$variant(_) => $code,)*
                }
            }

            pub fn error_type(&self) -> &'static str {
                match self {
                    $(PlannerError::$variant(_) => $type_name,)*
                }
            }

            pub fn message(&self) -> &str {
                match self {
                    $(PlannerError::$variant(msg) => msg,)*
                }
            }
        }

        paste::paste! {
            impl PlannerError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        PlannerError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_planner_errors! {
    CacheConnection("E001", "Cache Connection Error"),
    CachePluginNotFound("E002", "Cache Plugin Not Found"),
    DatabaseConfig("E003", "Database Configuration Error"),
    DatabaseConnection("E004", "Database Connection Error"),
    DatabaseOperation("E005", "Database Operation Error"),
    FileOperation("E006", "File Operation Error"),
    Validation("E007", "Validation Error"),
    NotFound("E008", "Resource Not Found"),
    Serialization("E009", "Serialization Error"),
    ObjectStore("E010", "Object Store Error"),
    DateParse("E011", "Date Parse Error"),
    Authentication("E012", "Authentication Error"),
    Authorization("E013", "Authorization Error"),
    RateLimited("E014", "Rate Limited"),
    Realtime("E015", "Realtime Channel Error"),
}

impl PlannerError {
    /// 数据库连接或查询失败
    pub fn is_database(&self) -> bool {
        matches!(
            self,
            PlannerError::DatabaseConnection(_)
                | PlannerError::DatabaseOperation(_)
                | PlannerError::DatabaseConfig(_)
        )
    }

    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for PlannerError {}

impl From<sea_orm::DbErr> for PlannerError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err {
            sea_orm::DbErr::RecordNotFound(msg) => PlannerError::NotFound(msg),
            sea_orm::DbErr::Conn(e) => PlannerError::DatabaseConnection(e.to_string()),
            other => PlannerError::DatabaseOperation(other.to_string()),
        }
    }
}

impl From<std::io::Error> for PlannerError {
    fn from(err: std::io::Error) -> Self {
        PlannerError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for PlannerError {
    fn from(err: serde_json::Error) -> Self {
        PlannerError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for PlannerError {
    fn from(err: chrono::ParseError) -> Self {
        PlannerError::DateParse(err.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for PlannerError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        PlannerError::Authentication(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PlannerError::cache_connection("x").code(), "E001");
        assert_eq!(PlannerError::validation("x").code(), "E007");
        assert_eq!(PlannerError::object_store("x").code(), "E010");
        assert_eq!(PlannerError::rate_limited("x").code(), "E014");
    }

    #[test]
    fn test_format_simple() {
        let err = PlannerError::not_found("homework 42");
        assert_eq!(err.format_simple(), "Resource Not Found: homework 42");
        assert_eq!(err.message(), "homework 42");
    }

    #[test]
    fn test_db_err_mapping() {
        let err: PlannerError = sea_orm::DbErr::RecordNotFound("gone".into()).into();
        assert_eq!(err, PlannerError::not_found("gone"));

        let err: PlannerError = sea_orm::DbErr::Custom("boom".into()).into();
        assert!(err.is_database());
        assert!(!PlannerError::serialization("bad").is_database());
    }
}
