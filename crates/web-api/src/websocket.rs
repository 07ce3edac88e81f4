//! WebSocket 会话处理
//!
//! 连接升级后先等待 `join` 事件完成鉴权，之后把入站事件逐条
//! 分发给协调器。出站事件经无界通道由独立任务泵送，业务错误
//! 转换为错误事件回传，不中断会话。

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use uuid::Uuid;

use application::{ConnectionHandle, Coordinator, SendMessage, ServerEvent};
use domain::UserId;

use crate::events::ClientEvent;
use crate::state::AppState;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// 已完成 join 的会话上下文。
struct Session {
    user_id: UserId,
    connection_id: Uuid,
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();

    // 出站泵：序列化并发送服务端事件
    let pump = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::error!(error = %e, "服务端事件序列化失败");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let mut session: Option<Session> = None;

    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!(error = %e, "WebSocket 读取失败");
                break;
            }
        };

        let text = match frame {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => break,
            // Ping/Pong 由 axum 处理，二进制帧忽略
            _ => continue,
        };

        let event: ClientEvent = match serde_json::from_str(text.as_str()) {
            Ok(event) => event,
            Err(e) => {
                let _ = tx.send(ServerEvent::Error {
                    message: format!("invalid event payload: {e}"),
                });
                continue;
            }
        };

        match (&session, event) {
            (None, ClientEvent::Join { user_id }) => {
                let handle = ConnectionHandle::new(tx.clone());
                let connection_id = handle.connection_id;
                match state.coordinator.join(user_id, handle).await {
                    Ok(()) => {
                        session = Some(Session {
                            user_id,
                            connection_id,
                        });
                    }
                    Err(e) if e.is_not_found() => {
                        tracing::warn!(%user_id, "未知用户的连接被拒绝");
                        let _ = tx.send(ServerEvent::AuthError);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "连接注册失败");
                        let _ = tx.send(ServerEvent::Error {
                            message: "join failed".to_string(),
                        });
                    }
                }
            }
            (Some(_), ClientEvent::Join { .. }) => {
                let _ = tx.send(ServerEvent::Error {
                    message: "already joined".to_string(),
                });
            }
            (None, _) => {
                let _ = tx.send(ServerEvent::AuthError);
            }
            (Some(active), event) => {
                dispatch(&state.coordinator, active.user_id, event, &tx).await;
            }
        }
    }

    if let Some(active) = session {
        if let Err(e) = state
            .coordinator
            .disconnect(active.user_id, active.connection_id)
            .await
        {
            tracing::error!(error = %e, user_id = %active.user_id, "断连清理失败");
        }
    }

    pump.abort();
}

/// 把单个入站事件分发给协调器，业务错误转换为错误事件回传。
async fn dispatch(
    coordinator: &Coordinator,
    user_id: UserId,
    event: ClientEvent,
    tx: &mpsc::UnboundedSender<ServerEvent>,
) {
    let result = match event {
        ClientEvent::Join { .. } => unreachable!("join 在会话建立前处理"),
        ClientEvent::JoinChat { chat_id } => coordinator.join_chat(user_id, chat_id).await,
        ClientEvent::LeaveChat { chat_id } => coordinator.leave_chat(user_id, chat_id).await,
        ClientEvent::SendMessage {
            chat_id,
            text,
            media_url,
            media_type,
            public_id,
        } => {
            let command = SendMessage {
                chat_id,
                sender_id: user_id,
                text,
                media_url,
                media_type,
                public_id,
            };
            match coordinator.send_message(command).await {
                Ok(_) => Ok(()),
                Err(e) => {
                    let _ = tx.send(ServerEvent::MessageError {
                        message: e.to_string(),
                    });
                    return;
                }
            }
        }
        ClientEvent::Typing {
            recipient_id,
            is_typing,
        } => coordinator.set_typing(user_id, recipient_id, is_typing).await,
        ClientEvent::TypingInChat { chat_id, is_typing } => {
            coordinator
                .set_typing_in_chat(user_id, chat_id, is_typing)
                .await
        }
        ClientEvent::MarkAsRead { sender_id } => coordinator.mark_read(user_id, sender_id).await,
        ClientEvent::MessageSeen {
            message_id,
            chat_id,
        } => coordinator.message_seen(user_id, message_id, chat_id).await,
        ClientEvent::MessageReact {
            message_id,
            chat_id,
            emoji,
        } => {
            coordinator
                .react(user_id, message_id, chat_id, &emoji)
                .await
        }
    };

    if let Err(e) = result {
        let _ = tx.send(ServerEvent::Error {
            message: e.to_string(),
        });
    }
}
