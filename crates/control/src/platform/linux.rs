//! Linux implementation backed by the `sysinfo` process table.
//!
//! Applications are launched under a reaper process whose command line
//! carries an `AppId=<id>` argument. Pausing an application means stopping
//! every descendant of that reaper; the reaper itself keeps running so the
//! host still considers the application alive.

use crate::client::ProcessControl;
use crate::error::{BackendError, Result};
use crate::ids::{AppId, Pid};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;
use sysinfo::{ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, Signal, System, UpdateKind};
use tracing::debug;

const APP_ID_ARG: &str = "AppId=";
const REAPER_NAME: &str = "reaper";

/// Upper bound on parent hops when searching for the owning reaper.
const MAX_PARENT_HOPS: usize = 64;

/// What we keep of one process.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ProcessInfo {
    parent: Option<Pid>,
    stopped: bool,
    start_time: u64,
    args: Vec<String>,
}

/// Point-in-time copy of the process table, ordered by pid.
#[derive(Debug, Default)]
struct ProcessTable {
    processes: BTreeMap<Pid, ProcessInfo>,
}

impl ProcessTable {
    /// Threads are listed as processes on Linux and are left out.
    fn capture(system: &System) -> Self {
        let threads: HashSet<sysinfo::Pid> = system
            .processes()
            .iter()
            .filter_map(|(pid, process)| Some(process.tasks()?.iter().filter(move |task| *task != pid)))
            .flatten()
            .copied()
            .collect();
        let processes = system
            .processes()
            .iter()
            .filter(|(pid, _)| !threads.contains(*pid))
            .map(|(pid, process)| {
                let info = ProcessInfo {
                    parent: process.parent().map(|parent| parent.as_u32()),
                    stopped: matches!(process.status(), ProcessStatus::Stop | ProcessStatus::Tracing),
                    start_time: process.start_time(),
                    args: process
                        .cmd()
                        .iter()
                        .map(|arg| arg.to_string_lossy().into_owned())
                        .collect(),
                };
                (pid.as_u32(), info)
            })
            .collect();
        Self { processes }
    }

    fn children(&self) -> HashMap<Pid, Vec<Pid>> {
        let mut children: HashMap<Pid, Vec<Pid>> = HashMap::new();
        for (pid, info) in &self.processes {
            if let Some(parent) = info.parent {
                children.entry(parent).or_default().push(*pid);
            }
        }
        children
    }

    fn first_child(&self, pid: Pid) -> Option<&ProcessInfo> {
        self.processes
            .values()
            .find(|info| info.parent == Some(pid))
    }

    /// All descendants of `pid` in breadth-first order, `pid` excluded.
    fn descendants(&self, pid: Pid) -> Vec<Pid> {
        let tree = self.children();
        let mut found = Vec::new();
        let mut queue = VecDeque::from([pid]);
        while let Some(parent) = queue.pop_front() {
            for child in tree.get(&parent).into_iter().flatten() {
                if *child != pid && !found.contains(child) {
                    found.push(*child);
                    queue.push_back(*child);
                }
            }
        }
        found
    }

    /// Oldest reaper launched for `app_id`, `0` if none.
    fn find_reaper(&self, app_id: &AppId) -> Pid {
        self.processes
            .iter()
            .filter(|(_, info)| is_reaper(&info.args) && app_id_arg(&info.args).as_ref() == Some(app_id))
            .min_by_key(|(pid, info)| (info.start_time, **pid))
            .map(|(pid, _)| *pid)
            .unwrap_or(0)
    }

    /// Walk up from `pid` until a process carrying `AppId=` is found.
    fn owning_app_id(&self, mut pid: Pid) -> AppId {
        for _ in 0..MAX_PARENT_HOPS {
            if pid <= 1 {
                break;
            }
            let Some(info) = self.processes.get(&pid) else {
                break;
            };
            if let Some(app_id) = app_id_arg(&info.args) {
                return app_id;
            }
            match info.parent {
                Some(parent) if parent != pid => pid = parent,
                _ => break,
            }
        }
        AppId::unknown()
    }
}

fn app_id_arg(args: &[String]) -> Option<AppId> {
    args.iter()
        .filter_map(|arg| arg.trim().strip_prefix(APP_ID_ARG))
        .map(AppId::from)
        .find(AppId::is_known)
}

fn is_reaper(args: &[String]) -> bool {
    args.first()
        .and_then(|exe| Path::new(exe).file_name())
        .map(|name| name == REAPER_NAME)
        .unwrap_or(false)
}

fn refreshed_system() -> System {
    let mut system = System::new();
    system.refresh_processes_specifics(
        ProcessesToUpdate::All,
        true,
        ProcessRefreshKind::new().with_cmd(UpdateKind::OnlyIfNotSet),
    );
    system
}

/// Process control through the system process table.
#[derive(Debug, Clone, Default)]
pub struct SysinfoControl;

impl SysinfoControl {
    pub fn new() -> Self {
        Self
    }

    /// Run `f` against a fresh process table off the async runtime.
    async fn with_table<T, F>(&self, op: &'static str, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&System, &ProcessTable) -> T + Send + 'static,
    {
        tokio::task::spawn_blocking(move || {
            let system = refreshed_system();
            let table = ProcessTable::capture(&system);
            f(&system, &table)
        })
        .await
        .map_err(|e| BackendError::call(op, e.to_string()))
    }

    async fn signal_tree(&self, op: &'static str, pid: Pid, signal: Signal) -> Result<bool> {
        if pid == 0 {
            return Ok(false);
        }
        let outcome = self
            .with_table(op, move |system, table| {
                let targets = table.descendants(pid);
                if targets.is_empty() {
                    debug!(pid, op, "no child processes to signal");
                    return Some(false);
                }
                let mut all_ok = true;
                for target in targets {
                    let sent = system
                        .process(sysinfo::Pid::from_u32(target))
                        .map(|process| process.kill_with(signal));
                    match sent {
                        Some(Some(true)) => {}
                        Some(None) => return None,
                        _ => {
                            debug!(pid = target, ?signal, "signal not delivered");
                            all_ok = false;
                        }
                    }
                }
                Some(all_ok)
            })
            .await?;
        outcome.ok_or(BackendError::Unavailable)
    }
}

#[async_trait]
impl ProcessControl for SysinfoControl {
    async fn is_paused(&self, pid: Pid) -> Result<bool> {
        if pid == 0 {
            return Ok(false);
        }
        self.with_table("is_paused", move |_, table| {
            table.first_child(pid).is_some_and(|child| child.stopped)
        })
        .await
    }

    async fn pause(&self, pid: Pid) -> Result<bool> {
        self.signal_tree("pause", pid, Signal::Stop).await
    }

    async fn resume(&self, pid: Pid) -> Result<bool> {
        self.signal_tree("resume", pid, Signal::Continue).await
    }

    async fn terminate(&self, pid: Pid) -> Result<bool> {
        self.signal_tree("terminate", pid, Signal::Term).await
    }

    async fn kill(&self, pid: Pid) -> Result<bool> {
        self.signal_tree("kill", pid, Signal::Kill).await
    }

    async fn pid_from_app_id(&self, app_id: &AppId) -> Result<Pid> {
        if !app_id.is_known() {
            return Ok(0);
        }
        let app_id = app_id.clone();
        self.with_table("pid_from_app_id", move |_, table| table.find_reaper(&app_id))
            .await
    }

    async fn app_id_from_pid(&self, pid: Pid) -> Result<AppId> {
        self.with_table("app_id_from_pid", move |_, table| table.owning_app_id(pid))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(parent: Pid, stopped: bool, start_time: u64, args: &[&str]) -> ProcessInfo {
        ProcessInfo {
            parent: Some(parent),
            stopped,
            start_time,
            args: args.iter().map(|arg| arg.to_string()).collect(),
        }
    }

    /// reaper 100 (AppId=730) -> 101 -> 102, plus a second later reaper 200.
    fn table() -> ProcessTable {
        let processes = BTreeMap::from([
            (1, ProcessInfo { parent: None, ..entry(0, false, 1, &["/sbin/init"]) }),
            (
                100,
                entry(1, false, 500, &["/steam/ubuntu12_32/reaper", "SteamLaunch", "AppId=730", "--", "game"]),
            ),
            (101, entry(100, true, 510, &["game.exe"])),
            (102, entry(101, true, 520, &["game-helper"])),
            (200, entry(1, false, 900, &["/steam/ubuntu12_32/reaper", "SteamLaunch", "AppId=730"])),
            (300, entry(1, false, 50, &["/usr/bin/bash", "AppId=730"])),
        ]);
        ProcessTable { processes }
    }

    #[test]
    fn test_descendants_exclude_root() {
        let table = table();
        assert_eq!(table.descendants(100), vec![101, 102]);
        assert!(table.descendants(102).is_empty());
    }

    #[test]
    fn test_find_reaper_picks_oldest() {
        let table = table();
        assert_eq!(table.find_reaper(&AppId::from("730")), 100);
        assert_eq!(table.find_reaper(&AppId::from("999")), 0);
    }

    #[test]
    fn test_owning_app_id_walks_up_to_reaper() {
        let table = table();
        assert_eq!(table.owning_app_id(102).as_str(), "730");
        assert!(!table.owning_app_id(1).is_known());
        assert!(!table.owning_app_id(4242).is_known());
    }

    #[test]
    fn test_first_child_state() {
        let table = table();
        assert!(table.first_child(100).is_some_and(|child| child.stopped));
        assert!(table.first_child(200).is_none());
    }

    #[test]
    fn test_reaper_needs_reaper_executable() {
        assert!(is_reaper(&["/x/reaper".to_string()]));
        assert!(!is_reaper(&["/usr/bin/bash".to_string(), "AppId=730".to_string()]));
        assert!(!is_reaper(&[]));
    }

    #[tokio::test]
    async fn test_placeholder_ids_skip_the_table() {
        let control = SysinfoControl::new();
        assert_eq!(control.pid_from_app_id(&AppId::from("0")).await.unwrap(), 0);
        assert!(!control.is_paused(0).await.unwrap());
        assert!(!control.resume(0).await.unwrap());
    }

    #[tokio::test]
    async fn test_live_table_has_no_children_for_unknown_pid() {
        let control = SysinfoControl::new();
        assert!(!control.pause(u32::MAX).await.unwrap());
        assert!(!control.app_id_from_pid(u32::MAX).await.unwrap().is_known());
    }
}
