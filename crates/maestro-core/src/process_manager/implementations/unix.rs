use std::{collections::HashMap, process::Stdio};

use futures::{FutureExt, StreamExt};
use libc::{killpg, setsid, ESRCH, SIGTERM};
use tokio::{io::BufReader, process::Command};
use tokio_util::io::ReaderStream;

use crate::process_manager::{
    base::ProcessManager,
    types::{CommandSpec, ProcId, Spawned},
};

#[derive(Debug)]
struct ChildRec {
    name: String,
    pgid: libc::pid_t,
}

/// Unix-specific process manager.
///
/// Every child is started in its own session, so signals reach the whole
/// process group (e.g. `npm` and the dev server it forks).
#[derive(Debug, Default)]
pub struct UnixProcessManager {
    next_id: u64,
    processes: HashMap<ProcId, ChildRec>,
}

impl UnixProcessManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProcessManager for UnixProcessManager {
    async fn spawn(&mut self, spec: CommandSpec) -> anyhow::Result<Spawned> {
        let Some((program, args)) = spec.cmd.split_first() else {
            anyhow::bail!("empty cmd for service `{}`", spec.name);
        };

        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        for (k, v) in &spec.env {
            cmd.env(k, v);
        }

        #[allow(unsafe_code)]
        unsafe {
            cmd.pre_exec(|| {
                if setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn()?;

        let pid = child.id();
        let pgid = libc::pid_t::try_from(
            pid.ok_or_else(|| anyhow::anyhow!("spawned process has no pid"))?,
        )?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("stdout not piped"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| anyhow::anyhow!("stderr not piped"))?;

        let out_stream = ReaderStream::new(BufReader::new(stdout))
            .filter_map(|res| async move { res.ok().map(|b| b.to_vec()) });
        let err_stream = ReaderStream::new(BufReader::new(stderr))
            .filter_map(|res| async move { res.ok().map(|b| b.to_vec()) });

        let name = spec.name.clone();
        let exit = async move {
            match child.wait().await {
                Ok(status) => status.code(),
                Err(err) => {
                    tracing::warn!("Cannot wait for `{name}`: {err}");
                    None
                }
            }
        }
        .boxed();

        let id = ProcId(self.next_id);
        self.next_id += 1;
        self.processes.insert(
            id,
            ChildRec {
                name: spec.name,
                pgid,
            },
        );

        Ok(Spawned {
            id,
            pid,
            stdout: Box::pin(out_stream),
            stderr: Box::pin(err_stream),
            exit,
        })
    }

    async fn terminate(&mut self, id: ProcId) -> anyhow::Result<()> {
        let proc = self
            .processes
            .get(&id)
            .ok_or_else(|| anyhow::anyhow!("unknown process id {id:?}"))?;

        #[allow(unsafe_code)]
        let rc = unsafe { killpg(proc.pgid, SIGTERM) };
        if rc == -1 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() == Some(ESRCH) {
                tracing::debug!("Process group of `{}` is already gone", proc.name);
                return Ok(());
            }
            return Err(err.into());
        }

        Ok(())
    }

    fn release(&mut self, id: ProcId) {
        self.processes.remove(&id);
    }
}
