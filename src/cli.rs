use anyhow::{Context, Result};
use std::fs;

use crate::agent::{
    classify_overflow, generate_session_id, latest_session, list_sessions, parse, HistoryStore,
    SessionContext,
};
use crate::config::Config;
use crate::types::Role;

/// 未指定 agent 时使用的名称
const DEFAULT_AGENT: &str = "qq";

/// 打印帮助信息
fn print_help() {
    println!("🤖 qq - 对话历史与会话工具");
    println!();
    println!("用法：qq <命令>");
    println!();
    println!("命令:");
    println!("  session         会话管理");
    println!("  history         历史记录管理");
    println!("  classify <文本>  识别上下文超长错误");
    println!("  onboard         初始化配置");
    println!("  help            显示此帮助信息");
    println!();
    println!("Session 子命令:");
    println!("  session new                 生成新会话 ID");
    println!("  session current             当前会话 ID（读取 $QQ_SESSION_ID）");
    println!("  session list [agent]        列出会话（新的在前）");
    println!("  session latest [agent]      最近的会话");
    println!("  session dir [agent] [ID]    创建并显示会话目录");
    println!();
    println!("History 子命令:");
    println!("  history show [agent] [--all]         显示窗口内（或全部）历史");
    println!("  history add <agent> <角色> <内容>     追加一条消息");
    println!("  history clear [agent]                清空历史");
    println!();
    println!("环境变量:");
    println!("  QQ_HOME        存储根目录（默认 ~/.qq）");
    println!("  QQ_SESSION_ID  指定会话 ID");
    println!("  RUST_LOG       日志级别（默认 warn）");
}

fn usage_error(message: &str, usage: &str) -> ! {
    eprintln!("❌ {}", message);
    eprintln!();
    eprintln!("用法：{}", usage);
    std::process::exit(1);
}

/// Onboard 命令 - 初始化配置
fn run_onboard() -> Result<()> {
    println!("🚀 初始化 qq 配置...\n");

    let config = Config::load_default()?;

    fs::create_dir_all(&config.history.root).context("创建历史记录目录失败")?;
    fs::create_dir_all(&config.session.base).context("创建会话目录失败")?;

    println!("✅ 创建目录:");
    println!("   History:  {}", config.history.root.display());
    println!("   Sessions: {}", config.session.base.display());
    println!();

    let config_path = Config::default_path();
    config.save(&config_path).context("保存配置文件失败")?;
    println!("✅ 保存配置：{}", config_path.display());

    Ok(())
}

/// Session 命令 - 会话管理
fn run_session(args: &[String]) -> Result<()> {
    let usage = "qq session <new|current|list|latest|dir> [agent] [ID]";
    let Some(subcommand) = args.get(2).map(|s| s.to_lowercase()) else {
        usage_error("请指定 session 子命令", usage);
    };

    let config = Config::load_default()?;
    let base = config.session.base;
    let agent = args.get(3).map(String::as_str).unwrap_or(DEFAULT_AGENT);

    match subcommand.as_str() {
        "new" => {
            println!("{}", generate_session_id());
        }
        "current" => {
            println!("{}", SessionContext::from_env().get());
        }
        "list" | "l" => {
            let sessions = list_sessions(&base, agent)?;
            if sessions.is_empty() {
                println!("📭 暂无会话");
            }
            for id in sessions {
                println!("{}", id);
            }
        }
        "latest" => match latest_session(&base, agent)? {
            Some(id) => println!("{}", id),
            None => println!("📭 暂无会话"),
        },
        "dir" => {
            let mut ctx = SessionContext::from_env();
            if let Some(id) = args.get(4) {
                ctx.set(id.as_str());
            }
            let dir = ctx
                .resolve_directory(&base, agent)
                .context("创建会话目录失败")?;
            println!("{}", dir.display());
        }
        _ => usage_error(&format!("未知子命令：{}", subcommand), usage),
    }

    Ok(())
}

/// History 命令 - 历史记录管理
fn run_history(args: &[String]) -> Result<()> {
    let usage = "qq history <show|add|clear> [agent] ...";
    let Some(subcommand) = args.get(2).map(|s| s.to_lowercase()) else {
        usage_error("请指定 history 子命令", usage);
    };

    let config = Config::load_default()?;
    let agent = args
        .get(3)
        .map(String::as_str)
        .filter(|a| !a.starts_with("--"))
        .unwrap_or(DEFAULT_AGENT);
    let mut store = HistoryStore::from_config(agent, &config.history);

    match subcommand.as_str() {
        "show" => {
            let all = args.iter().any(|a| a == "--all");
            if store.is_empty() {
                println!("📭 暂无历史记录");
                return Ok(());
            }
            if all {
                for entry in store.full() {
                    println!("[{}] {}: {}", entry.timestamp, entry.role, entry.content);
                }
            } else {
                for message in store.window() {
                    println!("{}: {}", message.role, message.content);
                }
            }
        }
        "add" => {
            if args.len() < 6 {
                usage_error("缺少参数", "qq history add <agent> <角色> <内容>");
            }
            let role: Role = args[4].parse()?;
            let content = args[5..].join(" ");
            store.append(role, &content).context("保存历史记录失败")?;
            println!("✅ 已追加消息（共 {} 条）", store.len());
        }
        "clear" => {
            store.clear().context("保存历史记录失败")?;
            println!("✅ 已清空历史记录：{}", store.agent());
        }
        _ => usage_error(&format!("未知子命令：{}", subcommand), usage),
    }

    Ok(())
}

/// Classify 命令 - 解析供应商错误信息
fn run_classify(args: &[String]) -> Result<()> {
    if args.len() < 3 {
        usage_error("请提供错误信息", "qq classify <错误信息>");
    }

    let text = args[2..].join(" ");
    let (is_token_error, info) = parse(&text);

    println!("token_error: {}", is_token_error);
    if !is_token_error {
        return Ok(());
    }

    println!("severity: {}", classify_overflow(info.as_ref()));
    if let Some(info) = info {
        println!("limit: {}", info.limit);
        println!("used: {}", info.used);
        println!("overflow: {}", info.overflow);
        println!("reduction: {:.1}%", info.reduction_needed() * 100.0);
    }

    Ok(())
}

/// 主入口函数
pub fn run_cli() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    let command = args[1].to_lowercase();

    match command.as_str() {
        "session" | "s" => run_session(&args),
        "history" | "hist" => run_history(&args),
        "classify" | "c" => run_classify(&args),
        "onboard" => run_onboard(),
        "help" | "-h" | "--help" | "h" => {
            print_help();
            Ok(())
        }
        _ => {
            eprintln!("❌ 未知命令：{}", command);
            eprintln!();
            eprintln!("运行 'qq help' 查看帮助信息");
            std::process::exit(1);
        }
    }
}
