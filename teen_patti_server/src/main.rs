mod session;

use std::net::SocketAddr;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{stream::StreamExt, SinkExt};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use session::Session;
use teen_patti_core::{ClientMessage, ServerMessage};

const DEFAULT_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 25917);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // 监听地址可以通过 TEEN_PATTI_ADDR 覆盖，例如 127.0.0.1:8080
    let addr = match std::env::var("TEEN_PATTI_ADDR") {
        Ok(text) => text.parse::<SocketAddr>()?,
        Err(_) => SocketAddr::from(DEFAULT_ADDR),
    };

    let app = Router::new().route("/ws", get(websocket_handler));

    info!("服务器正在监听 {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// 处理 WebSocket 连接请求
async fn websocket_handler(ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(handle_socket)
}

/// 处理单个 WebSocket 连接的生命周期
///
/// 每个连接拥有自己的会话和牌桌，连接之间不共享任何状态。
async fn handle_socket(socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();

    // 创建一个 MPSC 通道，由单独的任务负责写入 WebSocket
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let payload = match serde_json::to_string(&msg) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("序列化消息失败: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                // 发送失败，说明客户端已断开，退出任务
                break;
            }
        }
    });

    info!("新会话已连接");
    let mut session = Session::new();

    // 主循环：一次只处理一条消息，处理完再读下一条
    'conn: while let Some(Ok(msg)) = receiver.next().await {
        let Message::Text(text) = msg else { continue };

        let replies = match serde_json::from_str::<ClientMessage>(&text) {
            Ok(client_msg) => session.handle(client_msg),
            Err(e) => {
                warn!("解析消息失败: {}", e);
                vec![ServerMessage::Error { message: format!("无法解析消息: {}", e) }]
            }
        };

        for reply in replies {
            if tx.send(reply).await.is_err() {
                break 'conn;
            }
        }
    }

    drop(tx);
    let _ = writer.await;
    info!("客户端连接关闭，会话牌桌已销毁");
}
