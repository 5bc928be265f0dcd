/*!
 * WebSocket 实时同步服务
 *
 * 每个连接持有一个 [`HomeworkSync`]，把班级作业的变化与用户通知推送给浏览器。
 *
 * ## 使用方法
 *
 * ```text
 * ws://host/api/v1/ws?token=<access_token>&class_id=<class_id>
 * ```
 *
 * ## 消息格式
 *
 * ### 服务端推送
 * ```json
 * {"type": "snapshot", "homework": [...]}
 * {"type": "homework", "homework": [...]}
 * {"type": "notification", "title": "New homework", "body": "Essay is due Mon", "tag": "uuid"}
 * {"type": "error", "message": "..."}
 * ```
 *
 * ### 客户端命令
 * ```json
 * {"type": "refetch"}
 * {"type": "toggle_completion", "homework_id": "uuid", "done": true}
 * ```
 *
 * ### 心跳
 * ```json
 * {"type": "ping"}
 * {"type": "pong"}
 * ```
 */

use std::sync::Arc;
use std::time::{Duration, Instant};

use actix_ws::Message;
use dashmap::DashMap;
use futures_util::StreamExt;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::config::AppConfig;
use crate::models::homework::entities::HomeworkWithRelations;
use crate::models::notifications::entities::Notification;
use crate::realtime::ChangeFeed;
use crate::storage::Storage;
use crate::sync::{HomeworkSync, SyncState, SyncUpdate};

/// 全局连接管理器
static CONNECTION_MANAGER: Lazy<ConnectionManager> = Lazy::new(ConnectionManager::new);

/// 服务端发送的帧
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    /// 激活后的完整列表
    Snapshot { homework: Vec<HomeworkWithRelations> },
    /// 增量合并或重新拉取后的列表
    Homework { homework: Vec<HomeworkWithRelations> },
    Notification {
        title: String,
        body: Option<String>,
        tag: String,
    },
    Error { message: String },
    Ping,
    Pong,
}

impl ServerFrame {
    pub fn notification(n: &Notification) -> Self {
        ServerFrame::Notification {
            title: n.title.clone(),
            body: n.message.clone(),
            tag: n.id.clone(),
        }
    }

    /// 同步状态转为帧；拉取失败时为 error
    fn from_state(state: &SyncState, initial: bool) -> Self {
        if let Some(message) = &state.error {
            return ServerFrame::Error {
                message: message.clone(),
            };
        }
        let homework = state.homework.clone();
        if initial {
            ServerFrame::Snapshot { homework }
        } else {
            ServerFrame::Homework { homework }
        }
    }
}

/// 客户端命令
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientCommand {
    Ping,
    Pong,
    Refetch,
    ToggleCompletion { homework_id: String, done: bool },
}

/// 连接管理器
pub struct ConnectionManager {
    /// 用户 ID -> 广播发送器（同一用户可以有多个标签页）
    connections: DashMap<String, broadcast::Sender<ServerFrame>>,
}

impl ConnectionManager {
    fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// 获取全局实例
    pub fn get() -> &'static Self {
        &CONNECTION_MANAGER
    }

    /// 注册用户连接
    pub fn register(&self, user_id: &str) -> broadcast::Receiver<ServerFrame> {
        let entry = self
            .connections
            .entry(user_id.to_string())
            .or_insert_with(|| broadcast::channel(100).0);
        entry.subscribe()
    }

    /// 移除用户连接
    pub fn unregister(&self, user_id: &str) {
        // 只有当没有订阅者时才移除
        self.connections
            .remove_if(user_id, |_, sender| sender.receiver_count() == 0);
    }

    /// 向指定用户发送
    pub fn send_to_user(&self, user_id: &str, frame: ServerFrame) -> bool {
        self.connections
            .get(user_id)
            .is_some_and(|sender| sender.send(frame).is_ok())
    }

    pub fn push_notification(&self, notification: &Notification) -> bool {
        match &notification.user_id {
            Some(user_id) => self.send_to_user(user_id, ServerFrame::notification(notification)),
            None => false,
        }
    }

    /// 获取在线用户数
    pub fn online_count(&self) -> usize {
        self.connections
            .iter()
            .filter(|entry| entry.receiver_count() > 0)
            .count()
    }
}

/// 辅助函数：把新通知推给在线的接收者，返回送达条数
pub fn push_notifications(notifications: &[Notification]) -> usize {
    let manager = ConnectionManager::get();
    let delivered = notifications
        .iter()
        .filter(|n| manager.push_notification(n))
        .count();
    debug!(
        "Pushed {}/{} notifications to online users",
        delivered,
        notifications.len()
    );
    delivered
}

fn encode(frame: &ServerFrame) -> Option<String> {
    serde_json::to_string(frame)
        .map_err(|e| warn!("Failed to encode websocket frame: {}", e))
        .ok()
}

/// 处理一条客户端命令，返回需要回给该连接的帧
pub async fn handle_command(
    sync: &mut HomeworkSync,
    user_id: &str,
    command: ClientCommand,
) -> Option<ServerFrame> {
    match command {
        ClientCommand::Ping => Some(ServerFrame::Pong),
        ClientCommand::Pong => None,
        ClientCommand::Refetch => Some(ServerFrame::from_state(sync.refetch().await, false)),
        ClientCommand::ToggleCompletion { homework_id, done } => {
            match sync.toggle_completion(&homework_id, user_id, done).await {
                Ok(_) => Some(ServerFrame::from_state(sync.state(), false)),
                Err(e) => Some(ServerFrame::Error {
                    message: e.message().to_string(),
                }),
            }
        }
    }
}

/// WebSocket 服务
pub struct WebSocketService;

impl WebSocketService {
    /// 处理 WebSocket 连接
    pub async fn handle_connection(
        user_id: String,
        class_id: String,
        storage: Arc<dyn Storage>,
        mut session: actix_ws::Session,
        mut stream: actix_ws::MessageStream,
    ) {
        info!("WebSocket connected for user {} in class {}", user_id, class_id);

        let config = &AppConfig::get().realtime;
        let mut rx = ConnectionManager::get().register(&user_id);
        debug!("{} users online", ConnectionManager::get().online_count());
        let mut sync = HomeworkSync::new(storage, ChangeFeed::global().clone(), class_id);

        let initial = ServerFrame::from_state(sync.activate().await, true);
        if let Some(json) = encode(&initial) {
            let _ = session.text(json).await;
        }

        let mut heartbeat = tokio::time::interval(Duration::from_secs(config.heartbeat_interval.max(1)));
        let client_timeout = Duration::from_secs(config.client_timeout);
        let mut last_seen = Instant::now();

        loop {
            let outgoing = tokio::select! {
                // 处理来自客户端的消息
                msg = stream.next() => {
                    last_seen = Instant::now();
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<ClientCommand>(&text) {
                                Ok(command) => handle_command(&mut sync, &user_id, command).await,
                                Err(e) => {
                                    debug!("Ignoring malformed message from {}: {}", user_id, e);
                                    None
                                }
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            if session.pong(&data).await.is_err() {
                                break;
                            }
                            None
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("WebSocket closed for user: {}", user_id);
                            break;
                        }
                        Some(Err(e)) => {
                            warn!("WebSocket error for user {}: {:?}", user_id, e);
                            break;
                        }
                        _ => None,
                    }
                }

                // 班级作业的变更
                received = sync.next_event() => {
                    match sync.process(received).await {
                        SyncUpdate::Merged | SyncUpdate::Refetched => {
                            Some(ServerFrame::from_state(sync.state(), false))
                        }
                        SyncUpdate::Ignored => None,
                        SyncUpdate::Closed => {
                            warn!("Change feed closed, dropping websocket for {}", user_id);
                            break;
                        }
                    }
                }

                // 推送给该用户的通知
                frame = rx.recv() => {
                    match frame {
                        Ok(frame) => Some(frame),
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("WebSocket for user {} lagged by {} messages", user_id, n);
                            None
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }

                // 心跳
                _ = heartbeat.tick() => {
                    if last_seen.elapsed() > client_timeout {
                        info!("WebSocket for user {} timed out", user_id);
                        break;
                    }
                    Some(ServerFrame::Ping)
                }
            };

            if let Some(frame) = outgoing
                && let Some(json) = encode(&frame)
                && session.text(json).await.is_err()
            {
                break;
            }
        }

        // 清理连接
        sync.teardown();
        drop(rx);
        ConnectionManager::get().unregister(&user_id);
        let _ = session.close(None).await;
        info!(
            "WebSocket disconnected for user: {} ({} still online)",
            user_id,
            ConnectionManager::get().online_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::homework::requests::NewHomework;
    use crate::storage::sea_orm_storage::SeaOrmStorage;

    fn notification(user_id: Option<&str>) -> Notification {
        Notification {
            id: "n1".into(),
            user_id: user_id.map(str::to_string),
            class_id: None,
            notification_type: "homework_created".into(),
            title: "New homework".into(),
            message: Some("Essay".into()),
            read: false,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_frame_encoding() {
        let json = serde_json::to_value(ServerFrame::notification(&notification(Some("u")))).unwrap();
        assert_eq!(json["type"], "notification");
        assert_eq!(json["body"], "Essay");
        assert_eq!(json["tag"], "n1");

        let cmd: ClientCommand =
            serde_json::from_str(r#"{"type":"toggle_completion","homework_id":"h","done":true}"#)
                .unwrap();
        assert_eq!(
            cmd,
            ClientCommand::ToggleCompletion {
                homework_id: "h".into(),
                done: true
            }
        );
    }

    #[test]
    fn test_connection_manager_routes_by_user() {
        let manager = ConnectionManager::new();
        let mut rx = manager.register("ws-user");
        assert_eq!(manager.online_count(), 1);

        assert!(manager.push_notification(&notification(Some("ws-user"))));
        assert!(!manager.push_notification(&notification(Some("someone-else"))));
        assert!(!manager.push_notification(&notification(None)));
        assert!(matches!(rx.try_recv(), Ok(ServerFrame::Notification { .. })));

        drop(rx);
        manager.unregister("ws-user");
        assert_eq!(manager.online_count(), 0);
    }

    #[test]
    fn test_push_notifications_counts_online_recipients() {
        let manager = ConnectionManager::get();
        let _rx = manager.register("push-online");
        let batch = [
            notification(Some("push-online")),
            notification(Some("push-offline")),
            notification(None),
        ];
        assert_eq!(push_notifications(&batch), 1);
    }

    #[tokio::test]
    async fn test_commands_against_sync() {
        let storage = SeaOrmStorage::in_memory().await.unwrap();
        let class = storage.create_class("1HAT2", None).await.unwrap();
        let hw = storage
            .create_homework(NewHomework {
                class_id: class.id.clone(),
                title: "Essay".into(),
                description: None,
                subject: None,
                due_date: chrono::Utc::now(),
                created_by: None,
            })
            .await
            .unwrap();
        let storage: Arc<dyn Storage> = Arc::new(storage);

        let mut sync = HomeworkSync::new(storage, ChangeFeed::new(16), class.id);
        sync.activate().await;

        assert_eq!(
            handle_command(&mut sync, "u1", ClientCommand::Ping).await,
            Some(ServerFrame::Pong)
        );

        let frame = handle_command(
            &mut sync,
            "u1",
            ClientCommand::ToggleCompletion {
                homework_id: hw.id.clone(),
                done: true,
            },
        )
        .await;
        match frame {
            Some(ServerFrame::Homework { homework }) => assert!(homework[0].is_done_by("u1")),
            other => panic!("unexpected frame: {other:?}"),
        }

        let frame = handle_command(
            &mut sync,
            "u1",
            ClientCommand::ToggleCompletion {
                homework_id: "missing".into(),
                done: true,
            },
        )
        .await;
        assert!(matches!(frame, Some(ServerFrame::Error { .. })));
    }
}
