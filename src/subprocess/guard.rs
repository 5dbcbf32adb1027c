//! 子进程的作用域所有权：无论正常结束还是出错，离开作用域前两个进程都会被终止。

use std::io;
use std::path::Path;
use std::process::Child;

use tracing::{debug, warn};

use super::PeerCommand;

#[derive(Debug)]
pub struct PeerGuard {
    receiver: Option<Child>,
    sender: Option<Child>,
}

impl PeerGuard {
    /// 先拉起接收端，再拉起发送端。发送端启动失败时接收端会随 guard 一起被回收。
    pub fn spawn(
        receiver: &PeerCommand,
        sender: &PeerCommand,
        work_dir: &Path,
        input: &Path,
        base_port: u16,
        receiver_port: u16,
    ) -> io::Result<PeerGuard> {
        let mut guard = PeerGuard {
            receiver: None,
            sender: None,
        };
        let child = receiver.spawn_receiver(work_dir, receiver_port)?;
        debug!(pid = child.id(), port = receiver_port, "接收端已启动");
        guard.receiver = Some(child);

        let child = sender.spawn_sender(work_dir, input, base_port)?;
        debug!(pid = child.id(), port = base_port, input = %input.display(), "发送端已启动");
        guard.sender = Some(child);
        Ok(guard)
    }

    /// 发送端是否已退出（非阻塞）
    pub fn sender_exited(&mut self) -> io::Result<bool> {
        match self.sender.as_mut() {
            Some(child) => Ok(child.try_wait()?.is_some()),
            None => Ok(true),
        }
    }

    /// 终止并回收两个进程，可重复调用
    pub fn shutdown(&mut self) {
        for (role, slot) in [("sender", &mut self.sender), ("receiver", &mut self.receiver)] {
            let Some(mut child) = slot.take() else {
                continue;
            };
            match child.try_wait() {
                Ok(Some(status)) => debug!(role, %status, "进程已自行退出"),
                _ => {
                    if let Err(err) = child.kill() {
                        warn!(role, %err, "kill 失败");
                    }
                    match child.wait() {
                        Ok(status) => debug!(role, %status, "进程已终止"),
                        Err(err) => warn!(role, %err, "wait 失败"),
                    }
                }
            }
        }
    }
}

impl Drop for PeerGuard {
    fn drop(&mut self) {
        self.shutdown();
    }
}
