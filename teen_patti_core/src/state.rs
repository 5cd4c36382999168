use crate::card::Card;
use crate::error::GameError;
use crate::hand::HandScore;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

pub type TableId = Uuid;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;
/// 活动日志最多保留的条数
pub const LOG_CAPACITY: usize = 10;

/// 开桌参数，只在创建牌桌时校验一次
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    pub player_count: usize,
    pub starting_money: u32,
    pub base_stake: u32, // 底注：蒙牌玩家下注额，看牌玩家翻倍
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig { player_count: 3, starting_money: 1000, base_stake: 20 }
    }
}

impl TableConfig {
    pub fn validate(&self) -> Result<(), GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.player_count) {
            return Err(GameError::InvalidPlayerCount(self.player_count));
        }
        // 牌桌上的筹码总量不变，总量能放进 u32 就不会在结算时溢出
        let total = u32::try_from(self.player_count).ok().and_then(|n| n.checked_mul(self.starting_money));
        if self.starting_money == 0 || total.is_none() {
            return Err(GameError::InvalidStartingMoney);
        }
        // 看牌后下注额翻倍
        if self.base_stake == 0 || self.base_stake.checked_mul(2).is_none() {
            return Err(GameError::InvalidStake);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub table_id: TableId,
    pub players: Vec<Player>, // 按座位顺序排列
    pub pot: u32,             // 总奖池金额
    // 当前应该行动的玩家座位号，下注阶段总是指向一个未出局且未弃牌的玩家
    pub current_turn: usize,
    pub current_stake: u32,
    pub round: u32,
    pub phase: GamePhase,
    // 摊牌时计算出的结果，下一局发牌时清空
    pub last_result: Option<RoundResult>,
    // 活动日志，最新的在最前
    pub log: VecDeque<String>,
    #[serde(skip)] // 剩余牌堆不会发给前端
    pub deck: Vec<Card>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Player {
    pub name: String,
    pub money: u32,
    pub status: PlayerStatus,
    pub cards: Vec<Card>, // 0 张或 3 张
    pub has_seen: bool,   // 是否已看牌
    pub folded: bool,
}

/// 出局是单向的：Active -> Out，不会恢复
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlayerStatus {
    Active,
    Out,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GamePhase {
    Dealing,   // 等待发牌（自动或手动）
    Betting,   // 下注中
    Showdown,  // 已决出赢家，等待收取奖池
    RoundOver, // 结算中，仅在 collect_and_continue 内部短暂存在
    GameOver,  // 只剩一名玩家
}

/// 玩家在自己回合内可以执行的动作
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlayerAction {
    SeeCards, // 看牌
    Bet,      // 按当前底注下注（看牌后翻倍）
    Fold,     // 弃牌
    Show,     // 开牌，只剩两人时可用
}

/// 告知前端当前合法的动作，避免前端重复实现规则
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlayerActionType {
    SeeCards,
    Bet(u32), // 需要下注的金额
    Fold,
    Show,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundResult {
    pub winner: usize,
    pub winner_name: String,
    pub score: HandScore,
    pub pot: u32,
}

// --- Player 的实现方法 ---

impl Player {
    pub fn new(name: impl Into<String>, money: u32) -> Self {
        Player {
            name: name.into(),
            money,
            status: PlayerStatus::Active,
            cards: Vec::new(),
            has_seen: false,
            folded: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PlayerStatus::Active
    }

    /// 未出局且未弃牌
    pub fn is_in_hand(&self) -> bool {
        self.is_active() && !self.folded
    }
}

// --- GameState 的实现方法 ---

impl GameState {
    /// 开桌：校验配置并创建玩家 P1..Pn
    pub fn new(config: TableConfig) -> Result<Self, GameError> {
        config.validate()?;

        let players = (1..=config.player_count)
            .map(|i| Player::new(format!("P{}", i), config.starting_money))
            .collect();

        let mut state = GameState {
            table_id: Uuid::new_v4(),
            players,
            pot: 0,
            current_turn: 0,
            current_stake: config.base_stake,
            round: 1,
            phase: GamePhase::Dealing,
            last_result: None,
            log: VecDeque::with_capacity(LOG_CAPACITY),
            deck: Vec::new(),
        };
        state.add_log("Game initialized.");
        Ok(state)
    }

    /// 当前行动的玩家（仅在下注阶段有意义）
    pub fn current_player(&self) -> Option<&Player> {
        match self.phase {
            GamePhase::Betting => self.players.get(self.current_turn),
            _ => None,
        }
    }

    /// 未出局且未弃牌的玩家数量
    pub fn players_in_hand(&self) -> usize {
        self.players.iter().filter(|p| p.is_in_hand()).count()
    }

    pub fn active_players(&self) -> usize {
        self.players.iter().filter(|p| p.is_active()).count()
    }

    /// 游戏结束后唯一剩下的玩家
    pub fn champion(&self) -> Option<&Player> {
        match self.phase {
            GamePhase::GameOver => self.players.iter().find(|p| p.is_active()),
            _ => None,
        }
    }

    /// 该座位此刻下注需要的金额：蒙牌为底注，看牌后翻倍
    pub fn stake_for(&self, seat: usize) -> u32 {
        match self.players.get(seat) {
            Some(p) if p.has_seen => self.current_stake.saturating_mul(2),
            _ => self.current_stake,
        }
    }

    pub fn valid_actions(&self) -> Vec<PlayerActionType> {
        let Some(player) = self.current_player() else {
            return Vec::new();
        };

        let mut actions = Vec::new();
        if !player.has_seen {
            actions.push(PlayerActionType::SeeCards);
        }
        let stake = self.stake_for(self.current_turn);
        if player.money >= stake {
            actions.push(PlayerActionType::Bet(stake));
        }
        actions.push(PlayerActionType::Fold);
        if self.players_in_hand() == 2 {
            actions.push(PlayerActionType::Show);
        }
        actions
    }

    /// 生成可以展示在公共屏幕上的状态副本
    ///
    /// 牌堆总是被清空；摊牌之前，还没看牌的玩家的手牌被隐藏。
    pub fn for_display(&self) -> Self {
        let mut view = self.clone();
        view.deck.clear();

        let revealed = matches!(self.phase, GamePhase::Showdown | GamePhase::GameOver);
        if !revealed {
            for player in view.players.iter_mut().filter(|p| !p.has_seen) {
                player.cards.clear();
            }
        }
        view
    }

    pub fn add_log(&mut self, message: impl Into<String>) {
        self.log.push_front(message.into());
        self.log.truncate(LOG_CAPACITY);
    }
}
