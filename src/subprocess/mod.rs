//! 被测发送端/接收端子进程
//!
//! 两个进程都由中继拉起，彼此只通过回环 UDP 与中继通信。

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

mod guard;

pub use guard::PeerGuard;

/// 如何启动一个被测程序
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerCommand {
    pub program: PathBuf,
    /// 设置时以 `interpreter program args..` 方式启动（例如 python 脚本）
    pub interpreter: Option<PathBuf>,
}

impl PeerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            interpreter: None,
        }
    }

    pub fn with_interpreter(mut self, interpreter: Option<PathBuf>) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn exists(&self) -> bool {
        self.program.exists()
    }

    fn command(&self, work_dir: &Path) -> Command {
        let mut cmd = match &self.interpreter {
            Some(interp) => {
                let mut c = Command::new(interp);
                c.arg(&self.program);
                c
            }
            None => Command::new(&self.program),
        };
        cmd.current_dir(work_dir);
        cmd
    }

    /// 接收端：`-p <port>`
    pub fn spawn_receiver(&self, work_dir: &Path, port: u16) -> io::Result<Child> {
        self.command(work_dir)
            .arg("-p")
            .arg(port.to_string())
            .spawn()
    }

    /// 发送端：`-f <input> -p <port>`
    pub fn spawn_sender(&self, work_dir: &Path, input: &Path, port: u16) -> io::Result<Child> {
        self.command(work_dir)
            .arg("-f")
            .arg(input)
            .arg("-p")
            .arg(port.to_string())
            .spawn()
    }
}
