//
// standup-admin — 회의 서버 운영 CLI
//
// 사용법:
//   standup-admin [--host HOST] [--port PORT] <COMMAND>
//
//   standup-admin status    회의실 상태 (명단, 세마포어, 대기열, 발언 시간)
//   standup-admin reset     회의 전체 초기화 (전원 재접속)

use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Deserialize;
use tabled::{Table, Tabled};

use daily_standup::config;

// ----------------------------------------------------------------------------
// [CLI 정의]
// ----------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name    = "standup-admin",
    about   = "Daily stand-up server admin CLI",
    version,
)]
struct Cli {
    /// 서버 호스트
    #[arg(long, default_value = config::DEFAULT_HOST)]
    host: String,

    /// 서버 포트 (WS/HTTP 공용)
    #[arg(long, default_value_t = config::SIGNALING_PORT)]
    port: u16,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 회의실 상태 조회
    Status,

    /// 회의 전체 초기화
    Reset,
}

// ----------------------------------------------------------------------------
// [응답 타입] — http.rs 와 대응
// ----------------------------------------------------------------------------

#[derive(Deserialize)]
struct RoomStatus {
    uptime_secs:     u64,
    members:         Vec<MemberRow>,
    meeting_started: bool,
    semaphore_green: bool,
    queue:           Vec<String>,
    current_speaker: Option<String>,
    speaking_ms:     Option<u64>,
    turn_times:      Vec<TurnRow>,
}

#[derive(Deserialize)]
struct MemberRow {
    name:       String,
    is_master:  bool,
    has_spoken: bool,
    joined_at:  u64,
}

#[derive(Deserialize, Tabled)]
struct TurnRow {
    #[tabled(rename = "SPEAKER")]
    name:        String,
    #[tabled(rename = "TIME(ms)")]
    duration_ms: u64,
}

// 컬러 렌더링용 표시 타입
#[derive(Tabled)]
struct MemberDisplay {
    #[tabled(rename = "NAME")]
    name:   String,
    #[tabled(rename = "ROLE")]
    role:   String,
    #[tabled(rename = "SPOKE")]
    spoke:  String,
    #[tabled(rename = "JOINED")]
    joined: String,
}

#[derive(Deserialize)]
struct ResetReply {
    dropped: usize,
}

// ----------------------------------------------------------------------------
// [main]
// ----------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    let base = format!("http://{}:{}", cli.host, cli.port);

    let result = match &cli.command {
        Command::Status => cmd_status(&base),
        Command::Reset  => cmd_reset(&base),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "ERROR:".red().bold(), e);
        std::process::exit(1);
    }
}

// ----------------------------------------------------------------------------
// [커맨드 구현]
// ----------------------------------------------------------------------------

fn cmd_status(base: &str) -> Result<(), Box<dyn std::error::Error>> {
    let s: RoomStatus = get_json(&format!("{}/status", base))?;

    let hours   = s.uptime_secs / 3600;
    let minutes = (s.uptime_secs % 3600) / 60;
    let secs    = s.uptime_secs % 60;

    println!();
    println!("{}", "  Daily Stand-up Status".bold().cyan());
    println!("  {}", "─".repeat(36).dimmed());
    println!("  {:16} {}",
        "Uptime:".bold(),
        format!("{}h {}m {}s", hours, minutes, secs).green()
    );
    println!("  {:16} {}",
        "Meeting:".bold(),
        if s.meeting_started { "● in progress".green().bold().to_string() } else { "○ not started".dimmed().to_string() }
    );
    println!("  {:16} {}",
        "Semaphore:".bold(),
        if s.semaphore_green { "● GREEN".green().bold().to_string() } else { "● RED".red().bold().to_string() }
    );
    let speaker = match (&s.current_speaker, s.speaking_ms) {
        (Some(name), Some(ms)) => format!("{} ({}s)", name.yellow(), ms / 1000),
        (Some(name), None)     => name.yellow().to_string(),
        _                      => "-".dimmed().to_string(),
    };
    println!("  {:16} {}", "Speaking:".bold(), speaker);
    println!("  {:16} {}",
        "Queue:".bold(),
        if s.queue.is_empty() { "(empty)".dimmed().to_string() } else { s.queue.join(" → ").yellow().to_string() }
    );

    println!();
    if s.members.is_empty() {
        println!("{}", "  No one connected".dimmed());
    } else {
        let rows: Vec<MemberDisplay> = s.members.iter().map(|m| MemberDisplay {
            name:   m.name.clone(),
            role:   if m.is_master { "master".cyan().bold().to_string() } else { "participant".to_string() },
            spoke:  if m.has_spoken { "✓".green().to_string() } else { "-".dimmed().to_string() },
            joined: format_ts(m.joined_at),
        }).collect();
        println!("{}", indent(&Table::new(&rows).to_string()));
        println!("  {} member(s)", rows.len());
    }

    if !s.turn_times.is_empty() {
        println!();
        println!("{}", "  Turn Times".bold());
        println!("{}", indent(&Table::new(&s.turn_times).to_string()));
    }

    println!();
    Ok(())
}

fn cmd_reset(base: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::blocking::Client::new();
    let resp   = client.post(format!("{}/reset", base)).send()?;

    let status = resp.status();
    if !status.is_success() {
        let body: serde_json::Value = resp.json().unwrap_or_default();
        let msg = body["error"].as_str().unwrap_or("unknown error");
        return Err(format!("[{}] {}", status, msg).into());
    }

    let reply: ResetReply = resp.json()?;
    println!();
    println!("  {} {} connection(s) dropped", "Meeting Reset OK".green().bold(), reply.dropped.to_string().yellow());
    println!();
    Ok(())
}

// ----------------------------------------------------------------------------
// [공통 유틸]
// ----------------------------------------------------------------------------

/// GET 요청 + JSON 역직렬화
fn get_json<T: for<'de> serde::Deserialize<'de>>(url: &str) -> Result<T, Box<dyn std::error::Error>> {
    let resp = reqwest::blocking::get(url)?;
    let status = resp.status();
    if !status.is_success() {
        return Err(format!("[{}] {}", status, url).into());
    }
    Ok(resp.json()?)
}

fn indent(table: &str) -> String {
    table.lines().map(|l| format!("  {}", l)).collect::<Vec<_>>().join("\n")
}

/// Unix millis → "HH:MM:SS UTC"
fn format_ts(ms: u64) -> String {
    if ms == 0 { return "-".to_string(); }
    let secs = ms / 1000;
    format!("{:02}:{:02}:{:02} UTC", (secs / 3600) % 24, (secs / 60) % 60, secs % 60)
}
