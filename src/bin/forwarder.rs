//! 测试中继
//!
//! 依次执行测试套件中的每个测试，打印每次运行的结果。

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use bearstp_harness::config::{DEFAULT_BASE_PORT, HarnessConfig, SuiteSpec, TimeoutPolicy};
use bearstp_harness::forwarder::{Forwarder, ForwarderError};
use clap::Parser;
use tracing::{error, warn};

#[derive(Debug, Parser)]
#[command(name = "forwarder", about = "BEARS-TP 测试中继：在被测发送端与接收端之间转发并操纵报文")]
struct Args {
    /// 基础端口；接收端使用 port+1
    #[arg(short, long, default_value_t = DEFAULT_BASE_PORT)]
    port: u16,
    /// 发送端实现
    #[arg(short, long, default_value = "Sender.py")]
    sender: PathBuf,
    /// 接收端实现
    #[arg(short, long, default_value = "Receiver.py")]
    receiver: PathBuf,
    /// 用解释器启动发送端/接收端，例如 python
    #[arg(long)]
    interpreter: Option<PathBuf>,
    /// JSON 测试套件；缺省时对 --input 依次运行 basic 与 random_drop
    #[arg(long)]
    suite: Option<PathBuf>,
    #[arg(long, default_value = "README")]
    input: PathBuf,
    /// 子进程工作目录（接收端输出文件所在目录）
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,
    #[arg(long, default_value_t = 1)]
    tick_ms: u64,
    /// 单个测试的运行时限（秒）
    #[arg(long, default_value_t = 600)]
    timeout_secs: u64,
    /// 某个测试超时后继续执行其余测试
    #[arg(long)]
    continue_on_timeout: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();

    let suite = match &args.suite {
        Some(path) => match SuiteSpec::load(path) {
            Ok(suite) => suite,
            Err(err) => {
                error!(%err, "读取测试套件失败");
                return ExitCode::from(2);
            }
        },
        None => SuiteSpec::default_for(&args.input),
    };
    let on_timeout = if args.continue_on_timeout {
        TimeoutPolicy::Continue
    } else {
        suite.on_timeout.unwrap_or_default()
    };

    let config = HarnessConfig {
        base_port: args.port,
        sender: args.sender,
        receiver: args.receiver,
        interpreter: args.interpreter,
        work_dir: args.work_dir,
        tick_interval: Duration::from_millis(args.tick_ms),
        run_timeout: Duration::from_secs(args.timeout_secs),
        on_timeout,
        ..HarnessConfig::default()
    };

    let shutdown = Arc::new(AtomicBool::new(false));
    #[cfg(unix)]
    for sig in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
        if let Err(err) = signal_hook::flag::register(sig, Arc::clone(&shutdown)) {
            warn!(sig, %err, "注册信号处理失败");
        }
    }

    let mut forwarder = match Forwarder::new(config) {
        Ok(f) => f.with_shutdown_flag(shutdown),
        Err(err) => {
            error!(%err, "中继启动失败");
            return ExitCode::from(2);
        }
    };
    for case in &suite.cases {
        forwarder.register_test(case.kind.build(), case.input.clone());
    }

    match forwarder.execute_tests() {
        Ok(session) => {
            for run in &session.runs {
                println!("{run}");
            }
            println!(
                "summary passed={} failed={}",
                session.passed(),
                session.failed()
            );
            if session.all_passed() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(ForwarderError::Interrupted) => {
            warn!("已中断，子进程已清理");
            ExitCode::from(130)
        }
        Err(err) => {
            error!(%err, "会话中止");
            ExitCode::from(2)
        }
    }
}
