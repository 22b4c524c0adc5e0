//
// standup-client — 터미널 회의 클라이언트
//
// 사용법:
//   standup-client [--host HOST] [--port PORT] [--name NAME]
//
// 접속 후 한 줄씩 명령 입력:
//   press | end                          참가자
//   start | semaphore | skip | virtual   마스터
//   reorder A,B,C | reset                마스터
//   ok                                   알림 닫기
//   help | quit

use clap::Parser;
use colored::Colorize;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use daily_standup::client::{
    run_meeting, ClientProjection, ConnectionPhase, Intent, MeetingClient, MeetingPhase, SemaphorePhase, Session,
    SessionOutcome, UiCommand,
};
use daily_standup::config;
use daily_standup::error::TransportError;

#[derive(Parser)]
#[command(name = "standup-client", about = "Daily stand-up terminal client", version)]
struct Cli {
    /// 서버 호스트
    #[arg(long, default_value = config::DEFAULT_HOST)]
    host: String,

    /// 서버 포트
    #[arg(long, default_value_t = config::SIGNALING_PORT)]
    port: u16,

    /// 표시 이름 (생략 시 프롬프트)
    #[arg(long)]
    name: Option<String>,
}

#[tokio::main]
async fn main() {
    // 화면은 stdout, 로그는 stderr (기본값: warn)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    let endpoint = format!("ws://{}:{}/ws", cli.host, cli.port);
    let mut lines = spawn_stdin_lines();
    let mut next_name = cli.name;

    loop {
        let name = match next_name.take() {
            Some(n) => n,
            None => match prompt_name(&mut lines).await {
                Some(n) => n,
                None    => return,
            },
        };

        match run_once(&endpoint, &name, &mut lines).await {
            Ok(SessionOutcome::ReturnToLogin) => {
                println!("{}", "-- back to login --".dimmed());
            }
            Ok(SessionOutcome::Rejoin) => {
                println!("{}", "-- meeting reset, rejoining --".yellow());
                next_name = Some(name);
            }
            // 자동 재접속 없음
            Ok(SessionOutcome::Disconnected(reason)) => {
                println!("{} {}", "disconnected:".red(), reason);
                std::process::exit(1);
            }
            Ok(SessionOutcome::Quit) => return,
            Err(e) => {
                error!("[client] {}", e);
                println!("{} {}", "could not join:".red(), e);
                std::process::exit(1);
            }
        }
    }
}

/// 한 세션 동안 stdin 명령을 의도로 바꿔 구동 루프에 넘김
async fn run_once(
    endpoint: &str,
    name:     &str,
    lines:    &mut mpsc::Receiver<String>,
) -> Result<SessionOutcome, TransportError> {
    let (session, mut events) = Session::open(endpoint, name).await?;
    let mut client = MeetingClient::new(name, draw);
    let (ui_tx, mut commands) = mpsc::channel::<UiCommand>(16);
    let mut ui_tx = Some(ui_tx);
    let mut confirming_reset = false;

    let meeting = run_meeting(&mut client, &session, &mut events, &mut commands);
    tokio::pin!(meeting);

    loop {
        tokio::select! {
            outcome = &mut meeting => return Ok(outcome),
            line = lines.recv(), if ui_tx.is_some() => {
                let line = match line {
                    Some(l) => l,
                    None => {
                        ui_tx = None;
                        continue;
                    }
                };

                let input = if confirming_reset {
                    confirming_reset = false;
                    Input::Command(Intent::ResetMeeting { confirmed: line.trim() == "yes" }.into())
                } else {
                    parse_input(&line)
                };

                match input {
                    Input::Command(command) => {
                        if let Some(tx) = &ui_tx {
                            if tx.try_send(command).is_err() {
                                warn!("[client] ui queue full, dropped");
                            }
                        }
                    }
                    Input::ConfirmReset => {
                        confirming_reset = true;
                        print!("reset the whole meeting? type 'yes' to confirm: ");
                        let _ = std::io::stdout().flush();
                    }
                    Input::Quit  => ui_tx = None,
                    Input::Help  => print_help(),
                    Input::Empty => {}
                    Input::Unknown(cmd) => println!("unknown command: {} (try 'help')", cmd),
                }
            }
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Input {
    Command(UiCommand),
    ConfirmReset,
    Quit,
    Help,
    Empty,
    Unknown(String),
}

fn parse_input(line: &str) -> Input {
    let line = line.trim();
    let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    match cmd {
        ""          => Input::Empty,
        "press"     => intent(Intent::PressButton),
        "end"       => intent(Intent::EndTurn),
        "start"     => intent(Intent::StartMeeting),
        "semaphore" => intent(Intent::StartSemaphore),
        "skip"      => intent(Intent::SkipTurn),
        "virtual"   => intent(Intent::AddVirtualUser),
        "reorder"   => {
            let names = rest.split(',')
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string)
                .collect();
            intent(Intent::ReorderTurnOrder(names))
        }
        "reset"     => Input::ConfirmReset,
        "ok" | "dismiss" => Input::Command(UiCommand::DismissNotice),
        "help"      => Input::Help,
        "quit"      => Input::Quit,
        other       => Input::Unknown(other.to_string()),
    }
}

fn intent(intent: Intent) -> Input {
    Input::Command(intent.into())
}

fn print_help() {
    println!("participant: press, end");
    println!("master:      start, semaphore, skip, virtual, reorder A,B,C, reset");
    println!("any:         ok (dismiss notice), help, quit");
}

// ----------------------------------------------------------------------------
// [입력/출력]
// ----------------------------------------------------------------------------

fn spawn_stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });
    rx
}

async fn prompt_name(lines: &mut mpsc::Receiver<String>) -> Option<String> {
    loop {
        print!("name> ");
        let _ = std::io::stdout().flush();
        let name = lines.recv().await?;
        let name = name.trim();
        if !name.is_empty() {
            return Some(name.to_string());
        }
    }
}

fn draw(p: &ClientProjection) {
    let connection = match p.connection {
        ConnectionPhase::Connecting   => "connecting".yellow(),
        ConnectionPhase::Joined       => "joined".green(),
        ConnectionPhase::Disconnected => "disconnected".red(),
    };
    let meeting = match p.meeting_phase {
        MeetingPhase::NotStarted => "not started".dimmed(),
        MeetingPhase::InProgress => "in progress".green(),
        MeetingPhase::Finished   => "finished".cyan(),
    };
    let semaphore = match p.semaphore_phase {
        SemaphorePhase::Red   => "RED".red().bold(),
        SemaphorePhase::Green => "GREEN".green().bold(),
    };
    let role = if p.is_master() { " (master)" } else { "" };

    println!();
    println!("{}{} [{}]  meeting: {}  semaphore: {}", p.local_name.bold(), role, connection, meeting, semaphore);
    println!("  members : {}", p.roster.join(", "));
    println!("  queue   : {}", if p.queue.is_empty() { "-".to_string() } else { p.queue.join(" > ") });
    if let Some(speaker) = &p.current_speaker {
        if p.local_is_speaking {
            println!("  {} (type 'end' when done)", "you are speaking".green().bold());
        } else {
            println!("  speaking: {}", speaker.bold());
        }
    }
    if p.local_has_joined_queue && !p.local_is_speaking && p.meeting_phase == MeetingPhase::InProgress {
        println!("  {}", "waiting for your turn".dimmed());
    }
    if let Some(msg) = &p.end_message {
        println!("  {}", msg.cyan());
    }
    if let Some(notice) = &p.notice {
        println!("  {} {}", "!".yellow().bold(), notice.yellow());
    }
}
