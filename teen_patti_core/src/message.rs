use crate::card::{Card, card_image_url};
use crate::hand::{HandScore, evaluate_hand};
use crate::state::{GamePhase, GameState, PlayerAction, PlayerActionType, RoundResult, TableConfig, TableId};
use serde::{Deserialize, Serialize};

// --- 前端 -> 服务器 的消息 ---
// 一个连接就是一个会话，会话里最多只有一张牌桌。

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// 开桌。已有牌桌时会被拒绝，需要先 Restart。
    OpenTable(TableConfig),
    /// 自动洗牌发牌
    StartRound,
    /// 手动发牌: (座位号, 3 张牌)
    DealManual { hands: Vec<(usize, Vec<Card>)> },
    /// 当前行动的玩家执行一个动作
    PerformAction(PlayerAction),
    /// 摊牌后收取奖池，进入下一局
    CollectAndContinue,
    /// 丢弃当前牌桌
    Restart,
}

// --- 服务器 -> 前端 的消息 ---

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ServerMessage {
    TableOpened {
        table_id: TableId,
        game_state: GameState,
    },

    /// 完整牌桌状态的快照，发送前经过 `for_display` 处理
    GameStateSnapshot(GameState),

    /// 轮到某个座位行动
    NextToAct {
        seat: usize,
        name: String,
        valid_actions: Vec<PlayerActionType>,
    },

    /// 摊牌，公布所有仍在牌局中的手牌
    Showdown {
        result: RoundResult,
        hands: Vec<ShowdownHand>,
    },

    GameOver { champion: String },

    Info { message: String },
    Error { message: String },
}

/// 在 Showdown 消息中，用于描述单个玩家的手牌
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ShowdownHand {
    pub seat: usize,
    pub name: String,
    pub cards: Vec<Card>,
    pub score: Option<HandScore>,
    pub card_images: Vec<String>,
}

impl From<PlayerAction> for ClientMessage {
    fn from(action: PlayerAction) -> Self {
        ClientMessage::PerformAction(action)
    }
}

impl ServerMessage {
    /// 为摊牌阶段生成 Showdown 消息，其他阶段返回 None
    pub fn showdown(state: &GameState) -> Option<Self> {
        if state.phase != GamePhase::Showdown {
            return None;
        }
        let result = state.last_result.clone()?;
        let hands = state
            .players
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_in_hand())
            .map(|(seat, p)| ShowdownHand {
                seat,
                name: p.name.clone(),
                cards: p.cards.clone(),
                score: evaluate_hand(&p.cards).ok(),
                card_images: p.cards.iter().map(card_image_url).collect(),
            })
            .collect();
        Some(ServerMessage::Showdown { result, hands })
    }
}
