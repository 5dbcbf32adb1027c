//! 交互式发送端
//!
//! 每输入一行发送一个报文：第一行为 start，输入 `done` 发送 end，随后补发 end-ack 结束会话。

use std::io::{self, BufRead, ErrorKind, Write};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::process::ExitCode;
use std::time::Duration;

use bearstp_harness::wire::{MsgType, encode, validate_checksum};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "interactive_sender", about = "BEARS-TP 交互式发送端，输入 done 结束会话")]
struct Args {
    #[arg(short, long, default_value_t = 33122)]
    port: u16,
    #[arg(short, long, default_value = "localhost")]
    dest: String,
    /// 等待回复的时间（毫秒）
    #[arg(long, default_value_t = 2000)]
    reply_ms: u64,
}

fn show_reply(socket: &UdpSocket) -> io::Result<()> {
    let mut buf = [0u8; 4096];
    match socket.recv_from(&mut buf) {
        Ok((n, _)) => {
            let reply = &buf[..n];
            let text = String::from_utf8_lossy(reply);
            if validate_checksum(reply) {
                println!("recv: {text}");
            } else {
                println!("recv: {text} <--- CHECKSUM FAILED");
            }
            Ok(())
        }
        Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
            println!("recv: <no reply>");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

fn run(args: &Args) -> io::Result<()> {
    let dest: SocketAddr = (args.dest.as_str(), args.port)
        .to_socket_addrs()?
        .find(SocketAddr::is_ipv4)
        .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "no IPv4 destination"))?;
    let socket = UdpSocket::bind("0.0.0.0:0")?;
    socket.set_read_timeout(Some(Duration::from_millis(args.reply_ms.max(1))))?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut seqno = 0i64;
    loop {
        print!("Message:");
        io::stdout().flush()?;
        let msg = lines.next().transpose()?.unwrap_or_else(|| "done".to_string());

        let msg_type = if seqno == 0 {
            MsgType::Start
        } else if msg == "done" {
            MsgType::End
        } else {
            MsgType::Data
        };
        let packet = encode(msg_type, seqno, msg.as_bytes());
        socket.send_to(&packet, dest)?;
        println!("sent: {}", String::from_utf8_lossy(&packet));
        show_reply(&socket)?;
        seqno += 1;

        if msg_type == MsgType::End {
            let packet = encode(MsgType::EndAck, seqno, &[]);
            socket.send_to(&packet, dest)?;
            println!("sent: {}", String::from_utf8_lossy(&packet));
            return Ok(());
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("interactive_sender: {err}");
            ExitCode::FAILURE
        }
    }
}
