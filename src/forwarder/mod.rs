//! 中继（Forwarder）
//!
//! 中继独占监听 socket，按注册顺序逐个执行测试：拉起接收端与发送端，
//! 在单线程循环里交替做短超时接收与 tick 检查，直到发送端退出或运行超时。

mod context;
mod error;
mod relay;
mod report;

pub use context::{RunContext, RunState, RunStats};
pub use error::ForwarderError;
pub use relay::Forwarder;
pub use report::{RunReport, SessionReport};
