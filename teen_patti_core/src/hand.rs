use crate::card::Card;
use crate::error::GameError;
use crate::state::Player;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 牌型 (HandCategory)
/// 变体按从小到大排列，判别值即牌型等级 1-6，可以直接利用 `Ord` 比较。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum HandCategory {
    HighCard = 1, // 高牌
    Pair,         // 对子
    Color,        // 金花（同花）
    Sequence,     // 顺子
    PureSequence, // 同花顺
    Trail,        // 豹子（三条）
}

impl HandCategory {
    pub fn level(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            HandCategory::HighCard => "High Card",
            HandCategory::Pair => "Pair",
            HandCategory::Color => "Color (Flush)",
            HandCategory::Sequence => "Sequence",
            HandCategory::PureSequence => "Pure Sequence",
            HandCategory::Trail => "Trail (Three of a Kind)",
        }
    }
}

/// 一手牌的得分。
///
/// 字段顺序决定派生 `Ord` 的比较顺序：先比牌型，再依次比两个关键点数。
/// 得分只用于比较和展示，不做持久化。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct HandScore {
    pub category: HandCategory,
    pub primary: u8,
    pub secondary: u8,
}

impl HandScore {
    pub fn label(&self) -> &'static str {
        self.category.label()
    }
}

impl fmt::Display for HandScore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// --- 牌型评估逻辑 ---

/// 评估一手 3 张牌
///
/// 牌数不是 3 张时返回 `InvalidHand`，包含重复的牌时返回 `DuplicateCard`，
/// 两者都说明上游发牌逻辑出了问题。
pub fn evaluate_hand(hand: &[Card]) -> Result<HandScore, GameError> {
    if hand.len() != 3 {
        return Err(GameError::InvalidHand(hand.len()));
    }
    if hand[0] == hand[1] || hand[0] == hand[2] {
        return Err(GameError::DuplicateCard(hand[0]));
    }
    if hand[1] == hand[2] {
        return Err(GameError::DuplicateCard(hand[1]));
    }

    // 从大到小排序
    let mut ranks = [hand[0].rank.value(), hand[1].rank.value(), hand[2].rank.value()];
    ranks.sort_unstable_by(|a, b| b.cmp(a));

    let is_flush = hand.windows(2).all(|w| w[0].suit == w[1].suit);

    // A-3-2 是最小的顺子，A 当作 1
    let mut is_sequence = ranks.windows(2).all(|w| w[0] == w[1] + 1);
    if ranks == [14, 3, 2] {
        is_sequence = true;
        ranks = [3, 2, 1];
    }

    let (category, primary, secondary) = if ranks[0] == ranks[2] {
        (HandCategory::Trail, ranks[0], 0)
    } else if is_sequence && is_flush {
        (HandCategory::PureSequence, ranks[0], 0)
    } else if is_sequence {
        (HandCategory::Sequence, ranks[0], 0)
    } else if is_flush {
        (HandCategory::Color, ranks[0], ranks[1])
    } else if ranks[0] == ranks[1] {
        (HandCategory::Pair, ranks[0], ranks[2])
    } else if ranks[1] == ranks[2] {
        (HandCategory::Pair, ranks[1], ranks[0])
    } else {
        (HandCategory::HighCard, ranks[0], ranks[1])
    };

    Ok(HandScore { category, primary, secondary })
}

/// 在仍在牌局中（未出局、未弃牌）的玩家里找出得分最高者
///
/// 返回赢家的座位号和得分。得分相同时座位靠前的玩家获胜，
/// 后面的玩家必须严格更大才能领先（不支持平分奖池）。
pub fn get_winner(players: &[Player]) -> Result<(usize, HandScore), GameError> {
    let mut best: Option<(usize, HandScore)> = None;

    for (seat, player) in players.iter().enumerate().filter(|(_, p)| p.is_in_hand()) {
        let score = evaluate_hand(&player.cards)?;
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((seat, score));
        }
    }

    best.ok_or(GameError::NoActivePlayers)
}

// --- 单元测试 ---
