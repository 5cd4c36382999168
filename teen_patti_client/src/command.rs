use teen_patti_core::{Card, ClientMessage, PlayerAction, TableConfig};

pub const HELP: &str = "\
可用命令:
  open [人数] [初始筹码] [底注]       - 开桌 (默认 3 人, 1000, 20)
  deal                                - 自动洗牌发牌
  manual <座位>:<牌>,<牌>,<牌> ...     - 手动发牌，例如 manual 0:A♠,K♠,Q♠ 1:2h,2d,9c
  see                                 - 看牌
  bet                                 - 下注
  fold                                - 弃牌
  show                                - 开牌 (只剩两人时)
  collect                             - 收取奖池并进入下一局
  restart                             - 重新开始
  help                                - 显示帮助
  exit                                - 退出";

#[derive(Debug, PartialEq)]
pub enum Command {
    Send(ClientMessage),
    Help,
    Exit,
}

/// 把一行用户输入解析成命令，错误信息直接展示给用户
pub fn parse_command(line: &str) -> Result<Command, String> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, args)) = parts.split_first() else {
        return Err("请输入命令，help 查看帮助".to_string());
    };

    let message = match command {
        "open" => ClientMessage::OpenTable(parse_config(args)?),
        "deal" => ClientMessage::StartRound,
        "manual" => ClientMessage::DealManual { hands: parse_manual(args)? },
        "see" => PlayerAction::SeeCards.into(),
        "bet" => PlayerAction::Bet.into(),
        "fold" => PlayerAction::Fold.into(),
        "show" => PlayerAction::Show.into(),
        "collect" => ClientMessage::CollectAndContinue,
        "restart" => ClientMessage::Restart,
        "help" => return Ok(Command::Help),
        "exit" | "quit" => return Ok(Command::Exit),
        other => return Err(format!("未知命令: {}", other)),
    };
    Ok(Command::Send(message))
}

fn parse_config(args: &[&str]) -> Result<TableConfig, String> {
    let mut config = TableConfig::default();
    if let Some(text) = args.first() {
        config.player_count = text.parse().map_err(|_| format!("无效的人数: {}", text))?;
    }
    if let Some(text) = args.get(1) {
        config.starting_money = text.parse().map_err(|_| format!("无效的筹码: {}", text))?;
    }
    if let Some(text) = args.get(2) {
        config.base_stake = text.parse().map_err(|_| format!("无效的底注: {}", text))?;
    }
    Ok(config)
}

fn parse_manual(args: &[&str]) -> Result<Vec<(usize, Vec<Card>)>, String> {
    if args.is_empty() {
        return Err("用法: manual <座位>:<牌>,<牌>,<牌> ...".to_string());
    }
    args.iter()
        .map(|arg| -> Result<(usize, Vec<Card>), String> {
            let (seat, cards) = arg.split_once(':').ok_or_else(|| format!("缺少座位号: {}", arg))?;
            let seat = seat.parse::<usize>().map_err(|_| format!("无效的座位号: {}", seat))?;
            let cards = cards
                .split(',')
                .map(|c| c.parse::<Card>().map_err(|e| e.to_string()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok((seat, cards))
        })
        .collect()
}
