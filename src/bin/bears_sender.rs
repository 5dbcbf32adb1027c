//! 停等发送端
//!
//! 把文件可靠地发送给 `-d:-p`（通常是中继）。

use std::fs;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::path::PathBuf;
use std::process::ExitCode;

use bearstp_harness::peer::{StopAndWaitSender, plan_frames};
use clap::Parser;
use rand::Rng;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "bears_sender", about = "BEARS-TP 停等发送端")]
struct Args {
    /// 要发送的文件
    #[arg(short, long)]
    file: PathBuf,
    #[arg(short, long, default_value_t = 33122)]
    port: u16,
    #[arg(short, long, default_value = "localhost")]
    dest: String,
}

fn resolve(host: &str, port: u16) -> std::io::Result<SocketAddr> {
    (host, port)
        .to_socket_addrs()?
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, format!("no IPv4 address for {host}")))
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let data = fs::read(&args.file)?;
    let dest = resolve(&args.dest, args.port)?;
    let socket = UdpSocket::bind("0.0.0.0:0")?;

    let isn = rand::thread_rng().gen_range(0..50_000i64);
    let frames = plan_frames(isn, &data);
    info!(%dest, isn, bytes = data.len(), frames = frames.len(), "开始发送");
    StopAndWaitSender::new(socket, dest).send_all(&frames)?;
    Ok(())
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
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "发送失败");
            ExitCode::FAILURE
        }
    }
}
