//! # 炸金花（Teen Patti）核心逻辑库
//!
//! 这个 `core` crate 包含牌堆、三张牌的牌力评估、
//! 单桌回合状态机以及前端与服务器通信消息的定义。
//! 它不关心渲染方式，网页后端和终端客户端都通过它驱动牌局。

mod card;
mod error;
mod hand;
mod logic;
mod message;
mod state;

pub use card::*;

pub use error::GameError;

pub use hand::*;

pub use message::*;

pub use state::*;
