//! 停等接收端
//!
//! 监听 `-p`，把收到的数据按序写到当前目录下以来源地址命名的文件里。

use std::net::UdpSocket;
use std::path::Path;
use std::process::ExitCode;

use bearstp_harness::peer::serve;
use clap::Parser;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "bears_receiver", about = "BEARS-TP 接收端")]
struct Args {
    #[arg(short, long, default_value_t = 33122)]
    port: u16,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    let args = Args::parse();
    let socket = match UdpSocket::bind(("0.0.0.0", args.port)) {
        Ok(s) => s,
        Err(err) => {
            error!(port = args.port, %err, "绑定失败");
            return ExitCode::FAILURE;
        }
    };
    info!(port = args.port, "接收端就绪");

    match serve(&socket, Path::new(".")) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "接收端退出");
            ExitCode::FAILURE
        }
    }
}
