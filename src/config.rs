//! 中继配置与测试套件文件
//!
//! 套件文件是 JSON，例如：
//!
//! ```json
//! {
//!     "on_timeout": "continue",
//!     "cases": [
//!         { "kind": "basic", "input": "README" },
//!         { "kind": "random_drop", "input": "README", "drop_rate": 0.2, "seed": 7 }
//!     ]
//! }
//! ```

use std::fs;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::case::{BasicCase, CorruptCase, DelayCase, RandomDropCase, ReorderCase, TestCase};

pub const DEFAULT_BASE_PORT: u16 = 33123;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse suite {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("suite {0} has no cases")]
    EmptySuite(PathBuf),
    #[error("base port {0} leaves no room for the receiver port")]
    PortOverflow(u16),
}

/// 某次运行超时后，剩余的测试是否继续
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeoutPolicy {
    /// 超时即终止整个会话
    #[default]
    AbortSession,
    /// 记为超时，继续下一个测试
    Continue,
}

/// 中继配置
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub base_port: u16,
    /// 中继绑定的地址，也是接收端的地址
    pub host: Ipv4Addr,
    pub sender: PathBuf,
    pub receiver: PathBuf,
    pub interpreter: Option<PathBuf>,
    /// 子进程的工作目录，接收端输出文件也落在这里
    pub work_dir: PathBuf,
    pub tick_interval: Duration,
    pub recv_timeout: Duration,
    pub run_timeout: Duration,
    pub max_datagram: usize,
    pub on_timeout: TimeoutPolicy,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_port: DEFAULT_BASE_PORT,
            host: Ipv4Addr::LOCALHOST,
            sender: PathBuf::from("Sender.py"),
            receiver: PathBuf::from("Receiver.py"),
            interpreter: None,
            work_dir: PathBuf::from("."),
            tick_interval: Duration::from_millis(1),
            recv_timeout: Duration::from_millis(10),
            run_timeout: Duration::from_secs(600),
            max_datagram: 4096,
            on_timeout: TimeoutPolicy::AbortSession,
        }
    }
}

impl HarnessConfig {
    pub fn receiver_port(&self) -> Result<u16, ConfigError> {
        self.base_port
            .checked_add(1)
            .ok_or(ConfigError::PortOverflow(self.base_port))
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.host, self.base_port))
    }

    pub fn receiver_addr(&self) -> Result<SocketAddr, ConfigError> {
        Ok(SocketAddr::V4(SocketAddrV4::new(
            self.host,
            self.receiver_port()?,
        )))
    }

    /// 接收端按数据来源地址（即中继地址）命名输出文件：`<ip>.<port>`
    pub fn output_file(&self) -> PathBuf {
        self.work_dir
            .join(format!("{}.{}", self.host, self.base_port))
    }
}

fn default_rate() -> f64 {
    0.5
}

/// 场景种类及其参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CaseKind {
    Basic,
    RandomDrop {
        #[serde(default = "default_rate")]
        drop_rate: f64,
        #[serde(default)]
        seed: u64,
    },
    Reorder,
    Delay {
        ticks: u64,
    },
    Corrupt {
        #[serde(default = "default_rate")]
        rate: f64,
        #[serde(default)]
        seed: u64,
    },
}

impl CaseKind {
    pub fn build(&self) -> Box<dyn TestCase> {
        match *self {
            CaseKind::Basic => Box::new(BasicCase),
            CaseKind::RandomDrop { drop_rate, seed } => Box::new(RandomDropCase::new(drop_rate, seed)),
            CaseKind::Reorder => Box::new(ReorderCase::default()),
            CaseKind::Delay { ticks } => Box::new(DelayCase::new(ticks)),
            CaseKind::Corrupt { rate, seed } => Box::new(CorruptCase::new(rate, seed)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSpec {
    pub input: PathBuf,
    #[serde(flatten)]
    pub kind: CaseKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuiteSpec {
    #[serde(default)]
    pub on_timeout: Option<TimeoutPolicy>,
    pub cases: Vec<CaseSpec>,
}

impl SuiteSpec {
    pub fn load(path: &Path) -> Result<SuiteSpec, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let suite: SuiteSpec = serde_json::from_str(&raw).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        if suite.cases.is_empty() {
            return Err(ConfigError::EmptySuite(path.to_path_buf()));
        }
        Ok(suite)
    }

    /// 没有套件文件时的默认组合：同一输入先跑 basic 再跑 random_drop
    pub fn default_for(input: impl Into<PathBuf>) -> SuiteSpec {
        let input = input.into();
        SuiteSpec {
            on_timeout: None,
            cases: vec![
                CaseSpec {
                    input: input.clone(),
                    kind: CaseKind::Basic,
                },
                CaseSpec {
                    input,
                    kind: CaseKind::RandomDrop {
                        drop_rate: default_rate(),
                        seed: 0,
                    },
                },
            ],
        }
    }
}
