use crate::error::GameError;
use rand::Rng;
use rand::prelude::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// --- 核心数据结构定义 ---

/// 花色 (Suit)
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Suit {
    Spade,   // 黑桃 ♠
    Heart,   // 红心 ♥
    Diamond, // 方块 ♦
    Club,    // 梅花 ♣
}

/// 点数 (Rank)
/// 判别值即牌面分值，A 默认为最大 (14)。
/// A-3-2 顺子中 A 当作 1 计算，这一点由牌力评估处理，不在这里体现。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Rank {
    Two = 2,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

/// 单张扑克牌 (Card)
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Diamond, Suit::Club];
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two, Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven,
        Rank::Eight, Rank::Nine, Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace,
    ];

    /// 牌面分值: 2-10 按字面，J=11, Q=12, K=13, A=14
    pub fn value(self) -> u8 {
        self as u8
    }
}

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }
}

// --- 实现辅助功能 ---

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Suit::Spade => "♠",
            Suit::Heart => "♥",
            Suit::Diamond => "♦",
            Suit::Club => "♣",
        })
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank, self.suit)
    }
}

/// 解析 `10♠`、`QS`、`ah` 这类写法，供手动发牌使用
impl FromStr for Card {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || GameError::InvalidCard(s.to_string());
        // 兼容带 emoji 变体选择符的花色，例如 "♠️"
        let text = s.trim().trim_end_matches('\u{FE0F}');
        let suit_char = text.chars().last().ok_or_else(invalid)?;
        let rank_text = &text[..text.len() - suit_char.len_utf8()];

        let suit = match suit_char {
            '♠' | 's' | 'S' => Suit::Spade,
            '♥' | 'h' | 'H' => Suit::Heart,
            '♦' | 'd' | 'D' => Suit::Diamond,
            '♣' | 'c' | 'C' => Suit::Club,
            _ => return Err(invalid()),
        };
        let rank = match rank_text.to_ascii_uppercase().as_str() {
            "2" => Rank::Two,
            "3" => Rank::Three,
            "4" => Rank::Four,
            "5" => Rank::Five,
            "6" => Rank::Six,
            "7" => Rank::Seven,
            "8" => Rank::Eight,
            "9" => Rank::Nine,
            "10" | "T" => Rank::Ten,
            "J" => Rank::Jack,
            "Q" => Rank::Queen,
            "K" => Rank::King,
            "A" => Rank::Ace,
            _ => return Err(invalid()),
        };
        Ok(Card::new(rank, suit))
    }
}

// --- 牌堆 ---

/// 创建一副完整的 52 张扑克牌（按花色分组）
pub fn create_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(52);
    for &suit in &Suit::ALL {
        for &rank in &Rank::ALL {
            deck.push(Card { rank, suit });
        }
    }
    deck
}

/// 使用线程本地随机数洗牌
pub fn shuffle(deck: &mut [Card]) {
    let mut rng = rand::rng();
    shuffle_with(deck, &mut rng);
}

/// 使用指定的随机数生成器洗牌，测试中可传入固定种子的 StdRng
pub fn shuffle_with<R: Rng + ?Sized>(deck: &mut [Card], rng: &mut R) {
    deck.shuffle(rng);
}

/// 从牌堆末尾取出 n 张牌。牌不够时牌堆保持原样。
pub fn deal(deck: &mut Vec<Card>, n: usize) -> Result<Vec<Card>, GameError> {
    if n > deck.len() {
        return Err(GameError::InsufficientCards { requested: n, remaining: deck.len() });
    }
    Ok(deck.split_off(deck.len() - n))
}

// --- 牌面图片 ---

pub const CARD_IMAGE_BASE_URL: &str = "https://raw.githubusercontent.com/hayeah/playing-cards-assets/master/png/";
pub const CARD_BACK_URL: &str = "https://raw.githubusercontent.com/hayeah/playing-cards-assets/master/png/back.png";

/// 牌面图片地址，例如 `jack_of_spades.png`
pub fn card_image_url(card: &Card) -> String {
    let rank = match card.rank {
        Rank::Jack => "jack".to_string(),
        Rank::Queen => "queen".to_string(),
        Rank::King => "king".to_string(),
        Rank::Ace => "ace".to_string(),
        r => r.value().to_string(),
    };
    let suit = match card.suit {
        Suit::Spade => "spades",
        Suit::Heart => "hearts",
        Suit::Diamond => "diamonds",
        Suit::Club => "clubs",
    };
    format!("{}{}_of_{}.png", CARD_IMAGE_BASE_URL, rank, suit)
}

// --- 单元测试 ---
