//! 测试用例（故障注入场景）
//!
//! 中继只通过 [`TestCase`] 的三个回调与场景交互：每个到达的数据报一次 `on_packet`，
//! 每个 tick 一次 `on_tick`（在出站队列清空之前），运行结束时一次 `result`。

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::queue::RelayQueues;

mod basic;
mod corrupt;
mod delay;
mod random_drop;
mod reorder;

pub use basic::BasicCase;
pub use corrupt::CorruptCase;
pub use delay::DelayCase;
pub use random_drop::RandomDropCase;
pub use reorder::ReorderCase;

/// 一次运行的输入文件与接收端应当产出的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFiles {
    pub input: PathBuf,
    pub output: PathBuf,
}

/// 测试结论
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail(String),
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => f.write_str("pass"),
            Verdict::Fail(reason) => write!(f, "fail ({reason})"),
        }
    }
}

/// 故障注入场景的回调集合
pub trait TestCase {
    fn name(&self) -> &str;

    /// 每个到达的数据报调用一次，此时它已在 `queues.inbound` 末尾
    fn on_packet(&mut self, queues: &mut RelayQueues);

    /// 每个 tick 调用一次，之后中继会发出并清空 `queues.outbound`
    fn on_tick(&mut self, _interval: Duration, _queues: &mut RelayQueues) {}

    /// 运行结束后判定结果
    fn result(&mut self, files: &RunFiles) -> Verdict {
        files_match(&files.input, &files.output)
    }
}

/// 默认判定：接收端输出与输入文件逐字节相同
pub fn files_match(input: &Path, output: &Path) -> Verdict {
    let expected = match fs::read(input) {
        Ok(b) => b,
        Err(e) => return Verdict::Fail(format!("read input {}: {e}", input.display())),
    };
    let actual = match fs::read(output) {
        Ok(b) => b,
        Err(e) => return Verdict::Fail(format!("read output {}: {e}", output.display())),
    };
    if expected == actual {
        Verdict::Pass
    } else {
        Verdict::Fail(format!(
            "output differs from input ({} vs {} bytes)",
            actual.len(),
            expected.len()
        ))
    }
}
