//! 运行结果汇总

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::case::Verdict;

use super::context::RunStats;

#[derive(Debug, Clone)]
pub struct RunReport {
    pub name: String,
    pub input: PathBuf,
    pub verdict: Verdict,
    pub timed_out: bool,
    pub stats: RunStats,
    pub elapsed: Duration,
}

impl RunReport {
    pub(crate) fn timed_out(name: String, input: PathBuf, elapsed: Duration) -> Self {
        Self {
            name,
            input,
            verdict: Verdict::Fail("timed out".to_string()),
            timed_out: true,
            stats: RunStats::default(),
            elapsed,
        }
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "test={} input={} verdict={} in={} out={} bogons={} ticks={} elapsed_ms={}",
            self.name,
            self.input.display(),
            self.verdict,
            self.stats.datagrams_in,
            self.stats.datagrams_out,
            self.stats.bogons,
            self.stats.ticks,
            self.elapsed.as_millis()
        )
    }
}

/// 一次会话内全部运行的结果，按执行顺序排列
#[derive(Debug, Default)]
pub struct SessionReport {
    pub runs: Vec<RunReport>,
}

impl SessionReport {
    pub fn all_passed(&self) -> bool {
        self.runs.iter().all(|r| r.verdict.passed())
    }

    pub fn passed(&self) -> usize {
        self.runs.iter().filter(|r| r.verdict.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.runs.len() - self.passed()
    }
}
