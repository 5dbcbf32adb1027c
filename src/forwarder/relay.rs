//! 中继主体：测试注册、子进程生命周期与 tick 驱动的主循环。

use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::case::{RunFiles, TestCase};
use crate::config::{HarnessConfig, TimeoutPolicy};
use crate::subprocess::{PeerCommand, PeerGuard};

use super::context::{RunContext, RunState};
use super::error::ForwarderError;
use super::report::{RunReport, SessionReport};

const MIN_RECV_TIMEOUT: Duration = Duration::from_millis(1);

fn resolve_program(role: &'static str, path: &Path) -> Result<PathBuf, ForwarderError> {
    let missing = || ForwarderError::MissingExecutable {
        role,
        path: path.to_path_buf(),
    };
    let program = std::path::absolute(path).map_err(|_| missing())?;
    if !PeerCommand::new(&program).exists() {
        return Err(missing());
    }
    Ok(program)
}

pub struct Forwarder {
    config: HarnessConfig,
    sender: PeerCommand,
    receiver: PeerCommand,
    socket: UdpSocket,
    tests: Vec<(Box<dyn TestCase>, PathBuf)>,
    shutdown: Arc<AtomicBool>,
    state: RunState,
}

impl Forwarder {
    /// 检查两个可执行文件存在并绑定监听 socket。
    ///
    /// 相对路径按中继自身的工作目录解析并就地改成绝对路径，
    /// 子进程切换到 `work_dir` 后仍指向同一个文件。
    pub fn new(mut config: HarnessConfig) -> Result<Self, ForwarderError> {
        config.sender = resolve_program("sender", &config.sender)?;
        config.receiver = resolve_program("receiver", &config.receiver)?;
        let sender = PeerCommand::new(&config.sender).with_interpreter(config.interpreter.clone());
        let receiver =
            PeerCommand::new(&config.receiver).with_interpreter(config.interpreter.clone());
        config.receiver_port()?;

        let addr = config.listen_addr();
        let socket = UdpSocket::bind(addr).map_err(|source| ForwarderError::Bind { addr, source })?;
        socket.set_read_timeout(Some(config.recv_timeout.max(MIN_RECV_TIMEOUT)))?;
        info!(listen = %addr, "🔌 中继已绑定");

        Ok(Self {
            config,
            sender,
            receiver,
            socket,
            tests: Vec::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
            state: RunState::Init,
        })
    }

    /// 设置外部中断标志（例如 SIGINT 处理器写入的标志）
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = flag;
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// 注册测试；执行顺序即注册顺序
    pub fn register_test(&mut self, case: Box<dyn TestCase>, input: impl Into<PathBuf>) {
        let input = input.into();
        debug!(test = case.name(), input = %input.display(), "注册测试");
        self.tests.push((case, input));
    }

    pub fn registered(&self) -> usize {
        self.tests.len()
    }

    /// 逐个执行已注册的测试，前一个完全结束（含清理与判定）后才开始下一个。
    pub fn execute_tests(&mut self) -> Result<SessionReport, ForwarderError> {
        let mut tests = std::mem::take(&mut self.tests);
        let result = self.run_all(&mut tests);
        self.tests = tests;
        result
    }

    fn run_all(
        &mut self,
        tests: &mut [(Box<dyn TestCase>, PathBuf)],
    ) -> Result<SessionReport, ForwarderError> {
        let mut session = SessionReport::default();
        for (case, input) in tests.iter_mut() {
            match self.start(case.as_mut(), input) {
                Ok(report) => {
                    info!(%report, "🏁 测试结束");
                    session.runs.push(report);
                }
                Err(ForwarderError::TimedOut { name, elapsed })
                    if self.config.on_timeout == TimeoutPolicy::Continue =>
                {
                    warn!(test = %name, ?elapsed, "⏰ 测试超时，继续下一个");
                    session
                        .runs
                        .push(RunReport::timed_out(name, input.clone(), elapsed));
                }
                Err(err) => {
                    error!(test = case.name(), %err, "测试中止");
                    return Err(err);
                }
            }
        }
        Ok(session)
    }

    /// 完整执行一个测试。
    ///
    /// 子进程由 [`PeerGuard`] 持有；无论主循环正常结束还是出错，都会先做最后一次
    /// flush，再终止两个子进程，然后才把错误交给调用方。
    #[tracing::instrument(skip(self, case, input), fields(test = case.name(), input = %input.display()))]
    pub fn start(
        &mut self,
        case: &mut dyn TestCase,
        input: &Path,
    ) -> Result<RunReport, ForwarderError> {
        let receiver_port = self.config.receiver_port()?;
        let mut ctx = RunContext::new(self.config.receiver_addr()?);
        self.state = RunState::New;

        let input = std::path::absolute(input).unwrap_or_else(|_| input.to_path_buf());
        let mut peers = match PeerGuard::spawn(
            &self.receiver,
            &self.sender,
            &self.config.work_dir,
            &input,
            self.config.base_port,
            receiver_port,
        ) {
            Ok(peers) => peers,
            Err(err) => {
                self.state = RunState::Init;
                return Err(ForwarderError::Spawn(err));
            }
        };
        info!(receiver_port, "▶️  开始运行");

        let started = Instant::now();
        let looped = self.drive(&mut ctx, case, &mut peers, started);
        let flushed = self.flush(&mut ctx, case);
        peers.shutdown();
        self.state = RunState::Init;

        if let (Err(_), Err(err)) = (&looped, &flushed) {
            warn!(%err, "最后一次 flush 失败");
        }
        looped?;
        flushed?;

        let files = RunFiles {
            input: input.clone(),
            output: self.config.output_file(),
        };
        let verdict = case.result(&files);
        Ok(RunReport {
            name: case.name().to_string(),
            input,
            verdict,
            timed_out: false,
            stats: ctx.stats.clone(),
            elapsed: started.elapsed(),
        })
    }

    /// 主循环：直到发送端退出。每轮一次短超时接收、一次 tick 检查、一次超时检查。
    fn drive(
        &mut self,
        ctx: &mut RunContext,
        case: &mut dyn TestCase,
        peers: &mut PeerGuard,
        started: Instant,
    ) -> Result<(), ForwarderError> {
        let mut buf = vec![0u8; self.config.max_datagram];
        let mut last_tick = Instant::now();

        while !peers.sender_exited()? {
            if self.shutdown.load(Ordering::Relaxed) {
                return Err(ForwarderError::Interrupted);
            }

            match self.socket.recv_from(&mut buf) {
                Ok((n, src)) => {
                    ctx.handle_datagram(&buf[..n], src, case)?;
                    self.state = ctx.state();
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
                Err(e) if e.kind() == ErrorKind::ConnectionReset => {
                    debug!(err = %e, "忽略 ICMP 回报");
                }
                Err(e) => return Err(e.into()),
            }

            if last_tick.elapsed() >= self.config.tick_interval {
                last_tick = Instant::now();
                self.flush(ctx, case)?;
            }

            let elapsed = started.elapsed();
            if elapsed > self.config.run_timeout {
                return Err(ForwarderError::TimedOut {
                    name: case.name().to_string(),
                    elapsed,
                });
            }
        }
        debug!(elapsed = ?started.elapsed(), "发送端已退出");
        Ok(())
    }

    fn flush(&self, ctx: &mut RunContext, case: &mut dyn TestCase) -> Result<(), ForwarderError> {
        for (bytes, dest) in ctx.tick(case, self.config.tick_interval) {
            self.socket.send_to(&bytes, dest)?;
        }
        Ok(())
    }
}
