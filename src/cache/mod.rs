//! 对象缓存
//!
//! 以插件形式注册的键值缓存，存放验证码答案、已撤销令牌与令牌校验结果。

pub mod object_cache;
pub mod register;
pub mod traits;

pub use traits::{CacheResult, ObjectCache};

/// 在加载期把缓存实现注册进插件表
///
/// 实现类型需要提供 `fn new() -> Result<Self, String>`。
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:literal, $ty:ty) => {
        #[ctor::ctor]
        unsafe fn __register_object_cache_plugin() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(|| {
                    Box::pin(async {
                        <$ty>::new()
                            .map(|c| Box::new(c) as Box<dyn $crate::cache::ObjectCache>)
                            .map_err($crate::errors::PlannerError::cache_connection)
                    })
                }),
            );
        }
    };
}
