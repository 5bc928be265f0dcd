//! Homework Planner - 班级作业计划后端
//!
//! 基于 Actix Web 构建，班级共享作业列表、完成状态与实时同步。
//!
//! # 架构
//! - `cache`: 缓存层（Moka/Redis）
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `middlewares`: 认证、班级与限流中间件
//! - `models`: 数据模型定义
//! - `object_store`: 附件对象存储
//! - `realtime`: 行级变更广播
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM）
//! - `sync`: 作业列表增量同步
//! - `utils`: 工具函数

pub mod cache;
pub mod config;
pub mod entity;
pub mod errors;
pub mod middlewares;
pub mod models;
pub mod object_store;
pub mod realtime;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod sync;
pub mod utils;
