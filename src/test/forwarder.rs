use std::path::PathBuf;

use crate::case::BasicCase;
use crate::config::HarnessConfig;
use crate::forwarder::{Forwarder, ForwarderError, RunState};

#[cfg(unix)]
use super::cases::unique_temp_dir;

fn existing() -> PathBuf {
    std::env::current_exe().expect("current exe")
}

#[test]
fn missing_sender_is_fatal_at_construction() {
    let cfg = HarnessConfig {
        sender: PathBuf::from("/nonexistent/Sender.py"),
        receiver: existing(),
        ..HarnessConfig::default()
    };
    let err = Forwarder::new(cfg).err().expect("missing sender");
    assert!(matches!(err, ForwarderError::MissingExecutable { role: "sender", .. }));
}

#[test]
fn missing_receiver_is_fatal_at_construction() {
    let cfg = HarnessConfig {
        sender: existing(),
        receiver: PathBuf::from("/nonexistent/Receiver.py"),
        ..HarnessConfig::default()
    };
    let err = Forwarder::new(cfg).err().expect("missing receiver");
    assert!(matches!(err, ForwarderError::MissingExecutable { role: "receiver", .. }));
}

#[test]
fn new_forwarder_is_idle_and_keeps_registration_order() {
    let cfg = HarnessConfig {
        base_port: 0,
        sender: existing(),
        receiver: existing(),
        ..HarnessConfig::default()
    };
    let mut fwd = Forwarder::new(cfg).expect("bind ephemeral");
    assert_eq!(fwd.state(), RunState::Init);
    assert!(fwd.local_addr().expect("addr").ip().is_loopback());

    fwd.register_test(Box::new(BasicCase), "a");
    fwd.register_test(Box::new(BasicCase), "b");
    assert_eq!(fwd.registered(), 2);
}

#[test]
fn relative_peer_paths_resolve_against_the_relay_cwd() {
    let cfg = HarnessConfig {
        base_port: 0,
        sender: PathBuf::from("Cargo.toml"),
        receiver: PathBuf::from("./src/lib.rs"),
        work_dir: std::env::temp_dir(),
        ..HarnessConfig::default()
    };
    let fwd = Forwarder::new(cfg).expect("relative paths exist from the package root");
    let cwd = std::env::current_dir().expect("cwd");
    assert!(fwd.config().sender.is_absolute());
    assert!(fwd.config().receiver.is_absolute());
    assert_eq!(fwd.config().sender, cwd.join("Cargo.toml"));
    assert!(fwd.config().receiver.ends_with("src/lib.rs"));
}

#[test]
fn relative_peer_path_missing_from_the_relay_cwd_is_fatal() {
    let cfg = HarnessConfig {
        base_port: 0,
        sender: existing(),
        receiver: PathBuf::from("NoSuchReceiver.py"),
        ..HarnessConfig::default()
    };
    let err = Forwarder::new(cfg).err().expect("missing receiver");
    assert!(matches!(err, ForwarderError::MissingExecutable { role: "receiver", .. }));
}

/// 中断标志置位后，`start` 必须先终止并回收两个子进程再返回 `Interrupted`
#[cfg(unix)]
#[test]
fn interruption_returns_after_both_peers_are_reaped() {
    use std::process::Command;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::{Duration, Instant};

    let dir = unique_temp_dir("interrupt");
    let stuck = dir.join("stuck.sh");
    std::fs::write(&stuck, "echo $$ >> pids\nexec sleep 30\n").expect("write script");
    let pids = dir.join("pids");

    let cfg = HarnessConfig {
        base_port: 0,
        interpreter: Some(PathBuf::from("/bin/sh")),
        sender: stuck.clone(),
        receiver: stuck,
        work_dir: dir.clone(),
        run_timeout: Duration::from_secs(60),
        ..HarnessConfig::default()
    };
    let flag = Arc::new(AtomicBool::new(false));
    let mut fwd = Forwarder::new(cfg)
        .expect("bind ephemeral")
        .with_shutdown_flag(Arc::clone(&flag));

    let setter = {
        let flag = Arc::clone(&flag);
        let pids = pids.clone();
        std::thread::spawn(move || {
            let deadline = Instant::now() + Duration::from_secs(5);
            while Instant::now() < deadline {
                let started = std::fs::read_to_string(&pids)
                    .map(|s| s.lines().count())
                    .unwrap_or(0);
                if started >= 2 {
                    break;
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            flag.store(true, Ordering::Relaxed);
        })
    };

    let started = Instant::now();
    let err = fwd
        .start(&mut BasicCase, &dir.join("input.txt"))
        .err()
        .expect("run is interrupted");
    setter.join().expect("flag setter");

    assert!(matches!(err, ForwarderError::Interrupted));
    assert_eq!(fwd.state(), RunState::Init);
    assert!(started.elapsed() < Duration::from_secs(30));

    let pids = std::fs::read_to_string(&pids).expect("peers recorded their pids");
    let pids: Vec<_> = pids.lines().map(str::trim).collect();
    assert_eq!(pids.len(), 2);
    for pid in pids {
        let alive = Command::new("/bin/sh")
            .arg("-c")
            .arg(format!("kill -0 {pid} 2>/dev/null"))
            .status()
            .expect("run kill")
            .success();
        assert!(!alive, "peer {pid} still alive");
    }
}
