use crate::card::{self, Card};
use crate::error::GameError;
use crate::hand::get_winner;
use crate::state::*;
use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, info};

// --- 核心游戏流程函数 ---

impl GameState {
    /// 洗牌并给每个未出局的玩家发 3 张牌，然后进入下注阶段
    pub fn start_round(&mut self) -> Result<(), GameError> {
        let mut rng = rand::rng();
        self.start_round_with(&mut rng)
    }

    /// 同 `start_round`，但使用指定的随机数生成器
    pub fn start_round_with<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), GameError> {
        self.expect_phase(GamePhase::Dealing)?;

        let mut deck = card::create_deck();
        card::shuffle_with(&mut deck, rng);

        // 先发到临时变量里，任何一步失败都不会改动牌桌
        let mut hands = Vec::with_capacity(self.players.len());
        for (seat, _) in self.players.iter().enumerate().filter(|(_, p)| p.is_active()) {
            hands.push((seat, card::deal(&mut deck, 3)?));
        }

        self.deck = deck;
        self.begin_betting(hands);
        self.add_log("Cards dealt.");
        Ok(())
    }

    /// 手动发牌：由外部指定每个未出局玩家的 3 张牌
    ///
    /// 每个未出局的玩家都必须恰好拿到 3 张，且所有牌互不重复，
    /// 否则返回错误并保持在发牌阶段。
    pub fn deal_manual(&mut self, hands: &[(usize, Vec<Card>)]) -> Result<(), GameError> {
        self.expect_phase(GamePhase::Dealing)?;

        let mut assigned_seats = HashSet::new();
        for (seat, cards) in hands {
            let seat_ok = self.players.get(*seat).is_some_and(|p| p.is_active());
            if !seat_ok || !assigned_seats.insert(*seat) {
                return Err(GameError::InvalidSeat(*seat));
            }
            if cards.len() != 3 {
                return Err(GameError::IncompleteHand { seat: *seat, count: cards.len() });
            }
        }
        if let Some(seat) = (0..self.players.len())
            .find(|seat| self.players[*seat].is_active() && !assigned_seats.contains(seat))
        {
            return Err(GameError::IncompleteHand { seat, count: 0 });
        }

        let mut used = HashSet::new();
        for card in hands.iter().flat_map(|(_, cards)| cards) {
            if !used.insert(*card) {
                return Err(GameError::DuplicateCard(*card));
            }
        }

        // 已分配的牌不能同时留在牌堆里
        let mut deck = card::create_deck();
        deck.retain(|c| !used.contains(c));

        self.deck = deck;
        self.begin_betting(hands.to_vec());
        self.add_log("Manual Deal Confirmed.");
        Ok(())
    }

    /// 处理当前玩家的动作
    pub fn handle_player_action(&mut self, seat: usize, action: PlayerAction) -> Result<(), GameError> {
        match action {
            PlayerAction::SeeCards => self.see_cards(seat),
            PlayerAction::Bet => self.place_bet(seat).map(|_| ()),
            PlayerAction::Fold => self.fold(seat),
            PlayerAction::Show => {
                self.expect_turn(seat)?;
                self.call_show()
            }
        }
    }

    /// 看牌。不结束回合，但之后的下注额翻倍。
    pub fn see_cards(&mut self, seat: usize) -> Result<(), GameError> {
        self.expect_turn(seat)?;
        let player = &mut self.players[seat];
        if player.has_seen {
            return Ok(());
        }
        player.has_seen = true;
        let message = format!("{} saw cards.", player.name);
        debug!(seat, "玩家看牌");
        self.add_log(message);
        Ok(())
    }

    /// 下注，返回实际下注的金额
    ///
    /// 筹码不足时拒绝，牌桌状态不变，牌局继续。
    pub fn place_bet(&mut self, seat: usize) -> Result<u32, GameError> {
        self.expect_turn(seat)?;
        let stake = self.stake_for(seat);
        let player = &mut self.players[seat];
        if player.money < stake {
            return Err(GameError::InsufficientFunds { seat, needed: stake, available: player.money });
        }

        player.money -= stake;
        self.pot += stake;
        let message = format!("{} bet {}.", player.name, stake);
        debug!(seat, stake, pot = self.pot, "玩家下注");
        self.add_log(message);

        self.advance_turn()?;
        Ok(stake)
    }

    pub fn fold(&mut self, seat: usize) -> Result<(), GameError> {
        self.expect_turn(seat)?;
        let player = &mut self.players[seat];
        player.folded = true;
        let message = format!("{} folded.", player.name);
        debug!(seat, "玩家弃牌");
        self.add_log(message);

        self.advance_turn()
    }

    /// 开牌：只剩两名玩家时直接进入摊牌
    pub fn call_show(&mut self) -> Result<(), GameError> {
        self.expect_phase(GamePhase::Betting)?;
        let remaining = self.players_in_hand();
        if remaining != 2 {
            return Err(GameError::ShowNotAllowed(remaining));
        }
        self.add_log("Showdown!");
        self.enter_showdown()
    }

    /// 收取奖池并进入下一局
    ///
    /// - 赢家拿走全部奖池，奖池清零。
    /// - 筹码为 0 的玩家出局。
    /// - 只剩一名玩家时游戏结束，否则局数加一并回到发牌阶段。
    pub fn collect_and_continue(&mut self) -> Result<(), GameError> {
        self.expect_phase(GamePhase::Showdown)?;
        let winner = match &self.last_result {
            Some(result) => result.winner,
            None => get_winner(&self.players)?.0,
        };

        self.phase = GamePhase::RoundOver;
        let pot = std::mem::take(&mut self.pot);
        self.players[winner].money += pot;
        let message = format!("{} collected {}.", self.players[winner].name, pot);
        self.add_log(message);

        let mut eliminated = Vec::new();
        for player in self.players.iter_mut() {
            player.cards.clear();
            if player.is_active() && player.money == 0 {
                player.status = PlayerStatus::Out;
                eliminated.push(player.name.clone());
            }
        }
        for name in eliminated {
            info!(player = %name, "玩家筹码耗尽，出局");
            self.add_log(format!("{} is OUT.", name));
        }

        if self.active_players() <= 1 {
            self.phase = GamePhase::GameOver;
            if let Some(name) = self.champion().map(|p| p.name.clone()) {
                info!(table = %self.table_id, champion = %name, "游戏结束");
                self.add_log(format!("{} wins the table.", name));
            }
        } else {
            self.round += 1;
            self.phase = GamePhase::Dealing;
            info!(table = %self.table_id, round = self.round, "进入下一局");
        }
        Ok(())
    }
}

// --- 辅助逻辑函数 ---

impl GameState {
    fn expect_phase(&self, expected: GamePhase) -> Result<(), GameError> {
        if self.phase != expected {
            return Err(GameError::InvalidPhase { expected, actual: self.phase });
        }
        Ok(())
    }

    fn expect_turn(&self, seat: usize) -> Result<(), GameError> {
        self.expect_phase(GamePhase::Betting)?;
        if !self.players.get(seat).is_some_and(|p| p.is_in_hand()) {
            return Err(GameError::InvalidSeat(seat));
        }
        if seat != self.current_turn {
            return Err(GameError::NotPlayersTurn(seat));
        }
        Ok(())
    }

    /// 写入新发的手牌并重置每名玩家本局的状态
    fn begin_betting(&mut self, hands: Vec<(usize, Vec<Card>)>) {
        for player in self.players.iter_mut() {
            player.cards.clear();
            player.has_seen = false;
            player.folded = false;
        }
        for (seat, cards) in hands {
            self.players[seat].cards = cards;
        }

        self.last_result = None;
        self.current_turn = self.players.iter().position(|p| p.is_active()).unwrap_or(0);
        self.phase = GamePhase::Betting;
        info!(table = %self.table_id, round = self.round, "发牌完成，进入下注阶段");
    }

    /// 将行动权转移给下一位仍在牌局中的玩家
    ///
    /// 只剩一名玩家时直接进入摊牌。
    fn advance_turn(&mut self) -> Result<(), GameError> {
        if self.players_in_hand() <= 1 {
            return self.enter_showdown();
        }

        let mut idx = self.current_turn;
        loop {
            idx = (idx + 1) % self.players.len();
            if self.players[idx].is_in_hand() {
                break;
            }
        }
        self.current_turn = idx;
        Ok(())
    }

    /// 评估牌力，记录赢家，进入摊牌阶段
    fn enter_showdown(&mut self) -> Result<(), GameError> {
        let (winner, score) = get_winner(&self.players)?;
        let winner_name = self.players[winner].name.clone();

        info!(table = %self.table_id, winner = %winner_name, hand = score.label(), pot = self.pot, "摊牌");
        self.add_log(format!("{} wins with {}.", winner_name, score.label()));
        self.last_result = Some(RoundResult { winner, winner_name, score, pot: self.pot });
        self.phase = GamePhase::Showdown;
        Ok(())
    }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::HandCategory;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    // 辅助函数：创建用于测试的牌桌
    fn setup_table(player_count: usize, starting_money: u32) -> GameState {
        let config = TableConfig { player_count, starting_money, base_stake: 20 };
        GameState::new(config).unwrap()
    }

    fn hand(text: &str) -> Vec<Card> {
        text.split_whitespace().map(|c| c.parse().unwrap()).collect()
    }

    fn total_money(state: &GameState) -> u32 {
        state.players.iter().map(|p| p.money).sum::<u32>() + state.pot
    }

    #[test]
    fn test_start_round_deals_unique_cards() {
        let mut state = setup_table(6, 1000);
        let mut rng = StdRng::seed_from_u64(42);
        state.start_round_with(&mut rng).unwrap();

        assert_eq!(state.phase, GamePhase::Betting);
        assert_eq!(state.current_turn, 0);
        assert_eq!(state.deck.len(), 52 - 18);

        let mut all: HashSet<Card> = state.deck.iter().copied().collect();
        for player in &state.players {
            assert_eq!(player.cards.len(), 3);
            assert!(!player.has_seen && !player.folded);
            for card in &player.cards {
                assert!(all.insert(*card), "牌 {} 出现了两次", card);
            }
        }
        assert_eq!(all.len(), 52);
    }

    #[test]
    fn test_start_round_skips_out_players() {
        let mut state = setup_table(3, 1000);
        state.players[0].status = PlayerStatus::Out;
        state.players[0].cards = hand("2♠ 3♠ 4♠");
        state.start_round_with(&mut StdRng::seed_from_u64(1)).unwrap();

        assert!(state.players[0].cards.is_empty());
        assert_eq!(state.players[1].cards.len(), 3);
        assert_eq!(state.current_turn, 1);
    }

    #[test]
    fn test_start_round_wrong_phase() {
        let mut state = setup_table(3, 1000);
        state.start_round_with(&mut StdRng::seed_from_u64(1)).unwrap();
        let err = state.start_round().unwrap_err();
        assert_eq!(err, GameError::InvalidPhase { expected: GamePhase::Dealing, actual: GamePhase::Betting });
    }

    #[test]
    fn test_manual_deal() {
        let mut state = setup_table(2, 1000);
        state
            .deal_manual(&[(0, hand("A♠ K♠ Q♠")), (1, hand("2♥ 2♦ 9♣"))])
            .unwrap();

        assert_eq!(state.phase, GamePhase::Betting);
        assert_eq!(state.players[0].cards, hand("A♠ K♠ Q♠"));
        assert_eq!(state.deck.len(), 46);
        assert!(!state.deck.contains(&"A♠".parse().unwrap()));
        assert_eq!(state.log.front().map(String::as_str), Some("Manual Deal Confirmed."));
    }

    #[test]
    fn test_manual_deal_rejects_duplicates() {
        let mut state = setup_table(2, 1000);
        let err = state
            .deal_manual(&[(0, hand("A♠ K♠ Q♠")), (1, hand("A♠ 2♦ 9♣"))])
            .unwrap_err();
        assert_eq!(err, GameError::DuplicateCard("A♠".parse().unwrap()));
        assert_eq!(state.phase, GamePhase::Dealing);
        assert!(state.players.iter().all(|p| p.cards.is_empty()));
    }

    #[test]
    fn test_manual_deal_rejects_incomplete_hands() {
        let mut state = setup_table(3, 1000);
        let err = state
            .deal_manual(&[(0, hand("A♠ K♠")), (1, hand("2♥ 2♦ 9♣")), (2, hand("3♥ 4♦ 5♣"))])
            .unwrap_err();
        assert_eq!(err, GameError::IncompleteHand { seat: 0, count: 2 });

        // 漏掉一个未出局的玩家
        let err = state
            .deal_manual(&[(0, hand("A♠ K♠ Q♠")), (2, hand("3♥ 4♦ 5♣"))])
            .unwrap_err();
        assert_eq!(err, GameError::IncompleteHand { seat: 1, count: 0 });
        assert_eq!(state.phase, GamePhase::Dealing);
    }

    #[test]
    fn test_manual_deal_rejects_out_or_unknown_seats() {
        let mut state = setup_table(3, 1000);
        state.players[2].status = PlayerStatus::Out;

        let err = state
            .deal_manual(&[(0, hand("A♠ K♠ Q♠")), (1, hand("2♥ 2♦ 9♣")), (2, hand("3♥ 4♦ 5♣"))])
            .unwrap_err();
        assert_eq!(err, GameError::InvalidSeat(2));

        let err = state.deal_manual(&[(0, hand("A♠ K♠ Q♠")), (9, hand("2♥ 2♦ 9♣"))]).unwrap_err();
        assert_eq!(err, GameError::InvalidSeat(9));

        // 出局玩家不需要手牌
        state
            .deal_manual(&[(0, hand("A♠ K♠ Q♠")), (1, hand("2♥ 2♦ 9♣"))])
            .unwrap();
        assert!(state.players[2].cards.is_empty());
    }

    #[test]
    fn test_see_cards_doubles_stake_and_keeps_turn() {
        let mut state = setup_table(3, 1000);
        state.start_round_with(&mut StdRng::seed_from_u64(3)).unwrap();

        assert_eq!(state.stake_for(0), 20);
        state.see_cards(0).unwrap();
        assert!(state.players[0].has_seen);
        assert!(!state.players[1].has_seen);
        assert_eq!(state.current_turn, 0);
        assert_eq!(state.stake_for(0), 40);
        assert_eq!(state.stake_for(1), 20);

        assert_eq!(state.place_bet(0).unwrap(), 40);
        assert_eq!(state.players[0].money, 960);
        assert_eq!(state.pot, 40);
    }

    #[test]
    fn test_insufficient_funds_rejected_without_mutation() {
        let mut state = setup_table(3, 1000);
        state.start_round_with(&mut StdRng::seed_from_u64(3)).unwrap();
        state.players[0].money = 30;
        state.see_cards(0).unwrap();

        let before = state.clone();
        let err = state.place_bet(0).unwrap_err();
        assert_eq!(err, GameError::InsufficientFunds { seat: 0, needed: 40, available: 30 });
        assert!(err.is_recoverable());
        assert_eq!(state.players, before.players);
        assert_eq!(state.pot, before.pot);
        assert_eq!(state.current_turn, 0);
        assert_eq!(state.phase, GamePhase::Betting);

        // 仍然可以弃牌，牌局继续
        state.fold(0).unwrap();
        assert_eq!(state.current_turn, 1);
    }

    #[test]
    fn test_actions_out_of_turn_are_rejected() {
        let mut state = setup_table(3, 1000);
        state.start_round_with(&mut StdRng::seed_from_u64(3)).unwrap();

        assert_eq!(state.place_bet(1), Err(GameError::NotPlayersTurn(1)));
        assert_eq!(state.fold(2), Err(GameError::NotPlayersTurn(2)));
        assert_eq!(state.see_cards(7), Err(GameError::InvalidSeat(7)));
        assert_eq!(state.pot, 0);
    }

    #[test]
    fn test_actions_rejected_outside_betting() {
        let mut state = setup_table(2, 1000);
        let expected = GameError::InvalidPhase { expected: GamePhase::Betting, actual: GamePhase::Dealing };
        assert_eq!(state.place_bet(0), Err(expected.clone()));
        assert_eq!(state.call_show(), Err(expected));
        assert_eq!(
            state.collect_and_continue(),
            Err(GameError::InvalidPhase { expected: GamePhase::Showdown, actual: GamePhase::Dealing })
        );
    }

    #[test]
    fn test_turn_skips_folded_player() {
        // 3 人，底注 20：P1 蒙牌下注 20，P2 看牌后下注 40，P3 弃牌，应轮回 P1
        let mut state = setup_table(3, 1000);
        state.start_round_with(&mut StdRng::seed_from_u64(11)).unwrap();

        state.place_bet(0).unwrap();
        assert_eq!(state.current_turn, 1);
        state.see_cards(1).unwrap();
        state.place_bet(1).unwrap();
        assert_eq!(state.current_turn, 2);
        state.fold(2).unwrap();

        assert_eq!(state.current_turn, 0);
        assert_eq!(state.pot, 60);
        assert_eq!(state.phase, GamePhase::Betting);

        // 再转一圈同样跳过已弃牌的 P3
        state.place_bet(0).unwrap();
        state.place_bet(1).unwrap();
        assert_eq!(state.current_turn, 0);
    }

    #[test]
    fn test_turn_skips_out_player() {
        let mut state = setup_table(3, 1000);
        state.players[1].status = PlayerStatus::Out;
        state.start_round_with(&mut StdRng::seed_from_u64(5)).unwrap();

        state.place_bet(0).unwrap();
        assert_eq!(state.current_turn, 2);
        state.place_bet(2).unwrap();
        assert_eq!(state.current_turn, 0);
    }

    #[test]
    fn test_single_survivor_goes_to_showdown() {
        let mut state = setup_table(3, 1000);
        state
            .deal_manual(&[(0, hand("2♠ 5♥ 9♣")), (1, hand("A♠ A♥ A♣")), (2, hand("K♠ K♥ K♣"))])
            .unwrap();

        state.place_bet(0).unwrap();
        state.fold(1).unwrap();
        state.fold(2).unwrap();

        assert_eq!(state.phase, GamePhase::Showdown);
        let result = state.last_result.clone().unwrap();
        assert_eq!(result.winner, 0);
        assert_eq!(result.pot, 20);
        assert_eq!(result.score.category, HandCategory::HighCard);
    }

    #[test]
    fn test_show_requires_exactly_two_players() {
        let mut state = setup_table(3, 1000);
        state.start_round_with(&mut StdRng::seed_from_u64(9)).unwrap();
        assert_eq!(state.call_show(), Err(GameError::ShowNotAllowed(3)));
        assert!(!state.valid_actions().contains(&PlayerActionType::Show));

        state.fold(0).unwrap();
        assert!(state.valid_actions().contains(&PlayerActionType::Show));
        state.handle_player_action(1, PlayerAction::Show).unwrap();
        assert_eq!(state.phase, GamePhase::Showdown);
    }

    #[test]
    fn test_show_awards_pot_to_better_hand() {
        let mut state = setup_table(2, 1000);
        state
            .deal_manual(&[(0, hand("2♠ 2♥ 9♦")), (1, hand("10♠ J♠ Q♠"))])
            .unwrap();
        let before = total_money(&state);

        state.place_bet(0).unwrap();
        state.see_cards(1).unwrap();
        state.place_bet(1).unwrap();
        state.call_show().unwrap();

        let result = state.last_result.clone().unwrap();
        assert_eq!(result.winner, 1);
        assert_eq!(result.score.label(), "Pure Sequence");
        assert_eq!(result.pot, 60);

        state.collect_and_continue().unwrap();
        assert_eq!(state.pot, 0);
        assert_eq!(state.players[0].money, 980);
        assert_eq!(state.players[1].money, 1020);
        assert_eq!(total_money(&state), before);
        assert_eq!(state.phase, GamePhase::Dealing);
        assert_eq!(state.round, 2);
        assert!(state.players.iter().all(|p| p.cards.is_empty()));
    }

    #[test]
    fn test_tie_goes_to_earlier_seat() {
        let mut state = setup_table(2, 1000);
        state
            .deal_manual(&[(0, hand("10♠ 10♥ 4♣")), (1, hand("10♦ 10♣ 4♠"))])
            .unwrap();
        state.place_bet(0).unwrap();
        state.place_bet(1).unwrap();
        state.call_show().unwrap();
        state.collect_and_continue().unwrap();

        assert_eq!(state.players[0].money, 1020);
        assert_eq!(state.players[1].money, 980);
    }

    #[test]
    fn test_elimination_ends_game() {
        let mut state = setup_table(2, 20);
        state
            .deal_manual(&[(0, hand("A♠ A♥ A♣")), (1, hand("2♠ 5♥ 9♣"))])
            .unwrap();
        state.place_bet(0).unwrap();
        state.place_bet(1).unwrap();
        state.call_show().unwrap();
        state.collect_and_continue().unwrap();

        assert_eq!(state.players[1].status, PlayerStatus::Out);
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.champion().map(|p| p.name.as_str()), Some("P1"));
        assert_eq!(state.players[0].money, 40);
        assert_eq!(state.start_round(), Err(GameError::InvalidPhase {
            expected: GamePhase::Dealing,
            actual: GamePhase::GameOver,
        }));
    }

    #[test]
    fn test_eliminated_player_is_never_dealt_again() {
        let mut state = setup_table(3, 1000);
        state.players[2].money = 20;
        state
            .deal_manual(&[(0, hand("2♠ 5♥ 9♣")), (1, hand("A♠ A♥ A♣")), (2, hand("3♠ 6♥ 10♣"))])
            .unwrap();

        state.place_bet(0).unwrap();
        state.place_bet(1).unwrap();
        state.place_bet(2).unwrap();
        state.fold(0).unwrap();
        state.call_show().unwrap();
        state.collect_and_continue().unwrap();

        assert_eq!(state.players[2].status, PlayerStatus::Out);
        assert_eq!(state.phase, GamePhase::Dealing);
        assert_eq!(total_money(&state), 2020);

        state.start_round_with(&mut StdRng::seed_from_u64(8)).unwrap();
        assert!(state.players[2].cards.is_empty());
        state.place_bet(0).unwrap();
        assert_eq!(state.current_turn, 1);
        state.place_bet(1).unwrap();
        assert_eq!(state.current_turn, 0);
        assert_eq!(state.place_bet(2), Err(GameError::InvalidSeat(2)));
    }

    #[test]
    fn test_valid_actions() {
        let mut state = setup_table(2, 1000);
        assert!(state.valid_actions().is_empty());

        state.start_round_with(&mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(
            state.valid_actions(),
            vec![PlayerActionType::SeeCards, PlayerActionType::Bet(20), PlayerActionType::Fold, PlayerActionType::Show]
        );

        state.see_cards(0).unwrap();
        state.players[0].money = 10;
        assert_eq!(state.valid_actions(), vec![PlayerActionType::Fold, PlayerActionType::Show]);
    }

    #[test]
    fn test_largest_accepted_amounts_settle_without_overflow() {
        let oversized = TableConfig { player_count: 2, starting_money: 3_000_000_000, base_stake: 2_000_000_000 };
        assert_eq!(GameState::new(oversized).unwrap_err(), GameError::InvalidStartingMoney);

        let half = u32::MAX / 2;
        let config = TableConfig { player_count: 2, starting_money: half, base_stake: half };
        let mut state = GameState::new(config).unwrap();
        state
            .deal_manual(&[(0, hand("2♠ 5♥ 9♣")), (1, hand("A♠ A♥ A♣"))])
            .unwrap();

        state.place_bet(0).unwrap();
        state.see_cards(1).unwrap();
        assert_eq!(state.stake_for(1), half * 2);
        assert_eq!(state.valid_actions(), vec![PlayerActionType::Fold, PlayerActionType::Show]);

        state.call_show().unwrap();
        state.collect_and_continue().unwrap();
        assert_eq!(state.players[1].money, half * 2);
        assert_eq!(total_money(&state), half * 2);
        assert_eq!(state.phase, GamePhase::GameOver);
    }
}
