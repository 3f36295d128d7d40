//! Scripted process control for tests.
//!
//! Holds a fake process table: which app id resolves to which reaper, which
//! pids are stopped, and which calls should fail. Every call is recorded as
//! `"op:arg"` for later inspection. A [`CallGate`] holds the next call to an
//! operation in flight so tests can change the registry under it.

use async_trait::async_trait;
use pausegames_control::{AppId, BackendError, Pid, ProcessControl, Result};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// Holds one call to an operation until released.
#[derive(Debug, Default)]
pub struct CallGate {
    entered: Notify,
    release: Notify,
}

impl CallGate {
    /// Wait until the held call has started.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the held call finish.
    pub fn release(&self) {
        self.release.notify_one();
    }

    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }
}

#[derive(Debug, Default)]
struct Script {
    pids: HashMap<String, Pid>,
    /// Lookups that come back empty before the pid appears.
    pending: HashMap<String, u32>,
    owners: HashMap<Pid, AppId>,
    paused: HashSet<Pid>,
    vanished: HashSet<Pid>,
    failing: HashSet<Pid>,
    declining: HashSet<Pid>,
    fail_lookups: bool,
    gates: HashMap<&'static str, Arc<CallGate>>,
    calls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ScriptedControl {
    script: Mutex<Script>,
}

impl ScriptedControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// `app_id` resolves to `pid`, which also reports `app_id` as its owner.
    pub fn set_app_pid(&self, app_id: &str, pid: Pid) {
        let mut script = self.lock();
        script.pids.insert(app_id.to_string(), pid);
        script.owners.insert(pid, AppId::from(app_id));
    }

    /// Like [`set_app_pid`](Self::set_app_pid), but the first `misses`
    /// lookups find nothing.
    pub fn set_app_pid_after(&self, app_id: &str, pid: Pid, misses: u32) {
        self.set_app_pid(app_id, pid);
        self.lock().pending.insert(app_id.to_string(), misses);
    }

    /// `pid` (usually a child of a reaper) belongs to `app_id`.
    pub fn set_owner(&self, pid: Pid, app_id: &str) {
        self.lock().owners.insert(pid, AppId::from(app_id));
    }

    pub fn set_paused(&self, pid: Pid, paused: bool) {
        let mut script = self.lock();
        if paused {
            script.paused.insert(pid);
        } else {
            script.paused.remove(&pid);
        }
    }

    pub fn is_stopped(&self, pid: Pid) -> bool {
        self.lock().paused.contains(&pid)
    }

    /// The process is gone: queries and signals fail.
    pub fn vanish(&self, pid: Pid) {
        self.lock().vanished.insert(pid);
    }

    /// Every call touching `pid` fails.
    pub fn fail_pid(&self, pid: Pid) {
        self.lock().failing.insert(pid);
    }

    /// Signals to `pid` report that nothing was done.
    pub fn decline(&self, pid: Pid) {
        self.lock().declining.insert(pid);
    }

    pub fn fail_lookups(&self, fail: bool) {
        self.lock().fail_lookups = fail;
    }

    /// Hold the next call to `op` (`"pid_from_app_id"` or `"is_paused"`).
    pub fn gate(&self, op: &'static str) -> Arc<CallGate> {
        let gate = Arc::new(CallGate::default());
        self.lock().gates.insert(op, gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of recorded calls to `op`, e.g. `"pause"`.
    pub fn count(&self, op: &str) -> usize {
        let prefix = format!("{op}:");
        self.lock()
            .calls
            .iter()
            .filter(|call| call.starts_with(&prefix))
            .count()
    }

    /// Number of recorded calls to `op` for `pid`.
    pub fn count_for(&self, op: &str, pid: Pid) -> usize {
        let call = format!("{op}:{pid}");
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    pub fn lookup_count(&self, app_id: &str) -> usize {
        let call = format!("pid_from_app_id:{app_id}");
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    async fn wait_at_gate(&self, op: &'static str) {
        let gate = self.lock().gates.remove(op);
        if let Some(gate) = gate {
            gate.pass().await;
        }
    }

    /// Record the call and check that `pid` is reachable.
    fn touch(&self, op: &'static str, pid: Pid) -> Result<MutexGuard<'_, Script>> {
        let mut script = self.lock();
        script.calls.push(format!("{op}:{pid}"));
        if script.failing.contains(&pid) {
            return Err(BackendError::call(op, "scripted failure"));
        }
        if script.vanished.contains(&pid) {
            return Err(BackendError::call(op, format!("no such process {pid}")));
        }
        Ok(script)
    }

    fn signal(&self, op: &'static str, pid: Pid, stop: Option<bool>) -> Result<bool> {
        let mut script = self.touch(op, pid)?;
        if pid == 0 || script.declining.contains(&pid) {
            return Ok(false);
        }
        match stop {
            Some(true) => {
                script.paused.insert(pid);
            }
            Some(false) => {
                script.paused.remove(&pid);
            }
            None => {}
        }
        Ok(true)
    }
}

#[async_trait]
impl ProcessControl for ScriptedControl {
    async fn is_paused(&self, pid: Pid) -> Result<bool> {
        self.wait_at_gate("is_paused").await;
        let script = self.touch("is_paused", pid)?;
        Ok(script.paused.contains(&pid))
    }

    async fn pause(&self, pid: Pid) -> Result<bool> {
        self.signal("pause", pid, Some(true))
    }

    async fn resume(&self, pid: Pid) -> Result<bool> {
        self.signal("resume", pid, Some(false))
    }

    async fn terminate(&self, pid: Pid) -> Result<bool> {
        self.signal("terminate", pid, None)
    }

    async fn kill(&self, pid: Pid) -> Result<bool> {
        self.signal("kill", pid, None)
    }

    async fn pid_from_app_id(&self, app_id: &AppId) -> Result<Pid> {
        self.wait_at_gate("pid_from_app_id").await;
        let mut script = self.lock();
        script.calls.push(format!("pid_from_app_id:{app_id}"));
        if script.fail_lookups {
            return Err(BackendError::call("pid_from_app_id", "scripted failure"));
        }
        if let Some(misses) = script.pending.get_mut(app_id.as_str()) {
            if *misses > 0 {
                *misses -= 1;
                return Ok(0);
            }
        }
        Ok(script.pids.get(app_id.as_str()).copied().unwrap_or(0))
    }

    async fn app_id_from_pid(&self, pid: Pid) -> Result<AppId> {
        let mut script = self.lock();
        script.calls.push(format!("app_id_from_pid:{pid}"));
        if script.fail_lookups {
            return Err(BackendError::call("app_id_from_pid", "scripted failure"));
        }
        Ok(script.owners.get(&pid).cloned().unwrap_or_default())
    }
}
