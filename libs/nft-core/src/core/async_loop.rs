use std::future::Future;

use eyre::{eyre, Result};
use tokio::{spawn, task::JoinHandle};
use tokio_util::sync::CancellationToken;

/// Handle to a spawned task together with the token used to stop it.
pub struct AsyncTask<T> {
    join_handle: JoinHandle<T>,
    cancel_token: CancellationToken,
}

impl<T> AsyncTask<T> {
    pub fn new(join_handle: JoinHandle<T>, cancel_token: CancellationToken) -> Self {
        Self {
            join_handle,
            cancel_token,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }

    pub async fn stop(self) -> Result<T> {
        self.cancel_token.cancel();
        self.join_handle
            .await
            .map_err(|err| eyre!("Loop task failed: {}", err))
    }
}

/// Owns at most one running loop. The loop hands back its state (usually the
/// receiving end of its command channel) when stopped, so it can be restarted.
pub struct AsyncLoop<T> {
    async_task: Option<AsyncTask<T>>,
}

impl<T> AsyncLoop<T>
where
    T: Send + 'static,
{
    pub fn new() -> Self {
        Self { async_task: None }
    }

    pub fn is_running(&self) -> bool {
        self.async_task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn start<Fut>(&mut self, f: impl FnOnce(CancellationToken) -> Fut) -> Result<()>
    where
        Fut: Future<Output = T> + Send + 'static,
    {
        if self.is_running() {
            Err(eyre!("Loop is already running"))?;
        }

        let cancel_token = CancellationToken::new();
        let join_handle = spawn(f(cancel_token.clone()));

        self.async_task = Some(AsyncTask::new(join_handle, cancel_token));
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<T> {
        match self.async_task.take() {
            Some(task) => task.stop().await,
            None => Err(eyre!("Loop is not running")),
        }
    }
}

impl<T> Default for AsyncLoop<T>
where
    T: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
