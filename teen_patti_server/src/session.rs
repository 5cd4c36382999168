use teen_patti_core::{ClientMessage, GameError, GamePhase, GameState, ServerMessage, TableConfig};
use tracing::{error, info, warn};

/// 单个连接的会话
///
/// 会话独占自己的牌桌，连接断开时牌桌随之销毁。
/// 所有操作都是同步的，处理完一条消息才会读取下一条。
#[derive(Debug, Default)]
pub struct Session {
    table: Option<GameState>,
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    /// 处理一条前端消息，返回需要发回前端的消息
    pub fn handle(&mut self, msg: ClientMessage) -> Vec<ServerMessage> {
        let outcome = match msg {
            ClientMessage::OpenTable(config) => return self.open_table(config),
            ClientMessage::Restart => {
                if let Some(state) = self.table.take() {
                    info!(table = %state.table_id, "牌桌已关闭");
                }
                return vec![ServerMessage::Info { message: "牌桌已关闭，可以重新开桌".to_string() }];
            }
            ClientMessage::StartRound => self.with_table(|state| state.start_round()),
            ClientMessage::DealManual { hands } => self.with_table(|state| state.deal_manual(&hands)),
            ClientMessage::PerformAction(action) => {
                self.with_table(|state| state.handle_player_action(state.current_turn, action))
            }
            ClientMessage::CollectAndContinue => self.with_table(|state| state.collect_and_continue()),
        };

        match outcome {
            Ok(()) => self.snapshot(),
            Err(message) => vec![ServerMessage::Error { message }],
        }
    }

    fn open_table(&mut self, config: TableConfig) -> Vec<ServerMessage> {
        if self.table.is_some() {
            return vec![ServerMessage::Error { message: "已经有一张牌桌了，请先重新开始".to_string() }];
        }
        match GameState::new(config) {
            Ok(state) => {
                info!(table = %state.table_id, players = config.player_count, "开桌");
                let opened = ServerMessage::TableOpened {
                    table_id: state.table_id,
                    game_state: state.for_display(),
                };
                self.table = Some(state);
                vec![opened]
            }
            Err(e) => {
                warn!(error = %e, "开桌参数无效");
                vec![ServerMessage::Error { message: e.to_string() }]
            }
        }
    }

    fn with_table<F>(&mut self, f: F) -> Result<(), String>
    where
        F: FnOnce(&mut GameState) -> Result<(), GameError>,
    {
        let state = self.table.as_mut().ok_or_else(|| "请先开桌".to_string())?;
        let table_id = state.table_id;
        f(state).map_err(|e| {
            if e.is_recoverable() {
                warn!(table = %table_id, error = %e, "操作被拒绝");
            } else {
                error!(table = %table_id, error = %e, "牌局状态异常");
            }
            e.to_string()
        })
    }

    /// 状态改变后发给前端的消息：快照，以及当前阶段需要的提示
    fn snapshot(&self) -> Vec<ServerMessage> {
        let Some(state) = &self.table else {
            return Vec::new();
        };

        let mut messages = vec![ServerMessage::GameStateSnapshot(state.for_display())];
        match state.phase {
            GamePhase::Betting => {
                if let Some(player) = state.current_player() {
                    messages.push(ServerMessage::NextToAct {
                        seat: state.current_turn,
                        name: player.name.clone(),
                        valid_actions: state.valid_actions(),
                    });
                }
            }
            GamePhase::Showdown => messages.extend(ServerMessage::showdown(state)),
            GamePhase::GameOver => {
                if let Some(champion) = state.champion() {
                    messages.push(ServerMessage::GameOver { champion: champion.name.clone() });
                }
            }
            GamePhase::Dealing | GamePhase::RoundOver => {}
        }
        messages
    }
}
