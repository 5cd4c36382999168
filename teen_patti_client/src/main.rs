mod command;

use futures_util::{SinkExt, StreamExt};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

use command::{parse_command, Command, HELP};
use teen_patti_core::{Card, GamePhase, GameState, PlayerActionType, ServerMessage};

const DEFAULT_URL: &str = "ws://127.0.0.1:25917/ws";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let url = Url::parse(&std::env::var("TEEN_PATTI_URL").unwrap_or_else(|_| DEFAULT_URL.to_string()))?;

    println!("正在连接到: {}", url);
    let (ws_stream, _) = connect_async(url.as_str()).await?;
    println!("连接成功!");

    let (mut write, mut read) = ws_stream.split();

    // 启动一个任务来处理从服务器接收的消息
    tokio::spawn(async move {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => match serde_json::from_str::<ServerMessage>(&text) {
                    Ok(server_msg) => {
                        render(&server_msg);
                        print!("> "); // 重新显示输入提示符
                        let _ = std::io::stdout().flush();
                    }
                    Err(e) => eprintln!("解析服务器消息失败: {}", e),
                },
                Ok(_) => {}
                Err(e) => {
                    eprintln!("接收消息时出错: {}", e);
                    break;
                }
            }
        }
    });

    // 主任务处理用户输入
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    println!("--- 炸金花 (Teen Patti) 客户端 ---");
    println!("{}", HELP);

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = stdin.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_command(&line) {
            Ok(Command::Send(msg)) => {
                let payload = serde_json::to_string(&msg)?;
                write.send(Message::Text(payload.into())).await?;
            }
            Ok(Command::Help) => println!("{}", HELP),
            Ok(Command::Exit) => {
                println!("正在断开连接...");
                break;
            }
            Err(message) => println!("{}", message),
        }
    }

    Ok(())
}

// --- 文本渲染 ---

fn render(msg: &ServerMessage) {
    match msg {
        ServerMessage::TableOpened { table_id, game_state } => {
            println!("\n牌桌 {} 已开启", table_id);
            render_table(game_state);
        }
        ServerMessage::GameStateSnapshot(state) => render_table(state),
        ServerMessage::NextToAct { name, valid_actions, .. } => {
            let actions: Vec<String> = valid_actions.iter().map(describe_action).collect();
            println!("👉 轮到 {} 行动: {}", name, actions.join(" / "));
        }
        ServerMessage::Showdown { result, hands } => {
            println!("🎉 {} 以 {} 赢得奖池 {}", result.winner_name, result.score, result.pot);
            for hand in hands {
                let label = hand.score.map_or_else(|| "-".to_string(), |s| s.to_string());
                println!("   {:<4} {}  {}", hand.name, cards_text(&hand.cards), label);
            }
            println!("输入 collect 收取奖池");
        }
        ServerMessage::GameOver { champion } => {
            println!("🏆 冠军: {}，输入 restart 开始新游戏", champion);
        }
        ServerMessage::Info { message } => println!("[信息] {}", message),
        ServerMessage::Error { message } => println!("[错误] {}", message),
    }
}

fn render_table(state: &GameState) {
    println!("\n--- 第 {} 局 | {:?} | 奖池 {} ---", state.round, state.phase, state.pot);
    for (seat, player) in state.players.iter().enumerate() {
        let marker = if state.current_player().is_some() && seat == state.current_turn { "👉" } else { "  " };
        let status = if !player.is_active() {
            "出局"
        } else if player.folded {
            "弃牌"
        } else if player.has_seen {
            "看牌"
        } else {
            "蒙牌"
        };
        let cards = match (player.cards.is_empty(), state.phase) {
            (false, _) => cards_text(&player.cards),
            (true, GamePhase::Betting) if player.is_in_hand() => "[? ? ?]".to_string(),
            (true, _) => String::new(),
        };
        println!("{} [{}] {:<4} {:>7}  {}  {}", marker, seat, player.name, player.money, status, cards);
    }
    if let Some(entry) = state.log.front() {
        println!("最新动态: {}", entry);
    }
}

fn cards_text(cards: &[Card]) -> String {
    let text: Vec<String> = cards.iter().map(Card::to_string).collect();
    format!("[{}]", text.join(" "))
}

fn describe_action(action: &PlayerActionType) -> String {
    match action {
        PlayerActionType::SeeCards => "see".to_string(),
        PlayerActionType::Bet(amount) => format!("bet {}", amount),
        PlayerActionType::Fold => "fold".to_string(),
        PlayerActionType::Show => "show".to_string(),
    }
}
