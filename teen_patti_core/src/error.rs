use crate::card::Card;
use crate::state::GamePhase;
use thiserror::Error;

/// 牌桌上所有操作可能返回的错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    // --- 配置错误（仅在开桌时检查） ---
    #[error("玩家人数必须在 2 到 6 之间，当前为 {0}")]
    InvalidPlayerCount(usize),
    #[error("初始筹码必须为正数，且全桌筹码总数不能超过 {}", u32::MAX)]
    InvalidStartingMoney,
    #[error("底注必须为正数，且翻倍后不能超过 {}", u32::MAX)]
    InvalidStake,

    // --- 发牌错误 ---
    #[error("牌堆剩余 {remaining} 张，无法发出 {requested} 张")]
    InsufficientCards { requested: usize, remaining: usize },
    #[error("牌 {0} 被重复分配")]
    DuplicateCard(Card),
    #[error("座位 {seat} 需要恰好 3 张牌，当前为 {count} 张")]
    IncompleteHand { seat: usize, count: usize },
    #[error("无法识别的牌: {0}")]
    InvalidCard(String),

    // --- 牌力评估错误 ---
    #[error("手牌必须是 3 张互不相同的牌，当前为 {0} 张")]
    InvalidHand(usize),
    #[error("没有仍在牌局中的玩家")]
    NoActivePlayers,

    // --- 行动错误 ---
    #[error("座位 {seat} 筹码不足: 需要 {needed}，只有 {available}")]
    InsufficientFunds { seat: usize, needed: u32, available: u32 },
    #[error("当前阶段为 {actual:?}，该操作需要 {expected:?}")]
    InvalidPhase { expected: GamePhase, actual: GamePhase },
    #[error("座位 {0} 不存在或已出局")]
    InvalidSeat(usize),
    #[error("现在不是座位 {0} 的回合")]
    NotPlayersTurn(usize),
    #[error("只有剩下两名玩家时才能开牌，当前剩余 {0} 名")]
    ShowNotAllowed(usize),
}

impl GameError {
    /// 该错误是否只需拒绝当前操作，牌局可以继续。
    ///
    /// 牌堆耗尽与不变量被破坏（非法手牌、无人可赢）会中止本局。
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            GameError::InsufficientCards { .. } | GameError::InvalidHand(_) | GameError::NoActivePlayers
        )
    }
}
