use anyhow::Result;
use std::future::Future;
use std::sync::OnceLock;

static SHARED: OnceLock<std::result::Result<tokio::runtime::Runtime, String>> = OnceLock::new();

/// Lazily built runtime for callers that have none of their own.
fn shared() -> Result<&'static tokio::runtime::Runtime> {
    let rt = SHARED.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("sceneit-io")
            .enable_all()
            .build()
            .map_err(|e| e.to_string())
    });
    rt.as_ref().map_err(|message| anyhow::anyhow!("tokio runtime unavailable: {message}"))
}

/// Spawns on the caller's runtime, or on the shared one when called from plain threads.
pub(crate) fn spawn<Fut>(fut: Fut) -> Result<()>
where
    Fut: Future<Output = ()> + Send + 'static,
{
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            handle.spawn(fut);
        }
        Err(_) => {
            shared()?.spawn(fut);
        }
    }
    Ok(())
}
