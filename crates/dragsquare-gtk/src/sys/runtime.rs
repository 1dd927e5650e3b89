use async_channel::Sender;
use dragsquare::events::HostEvent;
use std::thread;
use tokio::runtime::{Handle, Runtime};

/// Runs tokio on its own thread and returns a handle for spawning onto it.
pub fn start_background_services(tx: Sender<HostEvent>) -> std::io::Result<Handle> {
    let rt = Runtime::new()?;
    let handle = rt.handle().clone();

    thread::spawn(move || {
        rt.block_on(async {
            {
                let tx = tx.clone();
                tokio::spawn(async move {
                    dragsquare::config::run_async_watcher(tx).await;
                });
            }

            std::future::pending::<()>().await;
        });
    });

    Ok(handle)
}
