//! Runs long operations off the async runtime with a live progress bar.

use indicatif::{ProgressBar, ProgressStyle};
use pdfdesk_core::Progress;
use tokio::sync::mpsc;

/// Run a blocking operation that reports [`Progress`], driving a terminal
/// progress bar from the async side.
pub async fn run_with_progress<T, F>(task: F) -> anyhow::Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut dyn FnMut(Progress)) -> pdfdesk_core::Result<T> + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Progress>();

    let handle = tokio::task::spawn_blocking(move || {
        let mut report = |p: Progress| {
            let _ = tx.send(p);
        };
        task(&mut report)
    });

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("##-"),
    );

    while let Some(progress) = rx.recv().await {
        if progress.total > 0 {
            pb.set_length(progress.total as u64);
            pb.set_position(progress.current as u64);
        }
        pb.set_message(progress.status);
    }

    let result = handle.await?;
    match &result {
        Ok(_) => pb.finish_and_clear(),
        Err(_) => pb.abandon(),
    }
    Ok(result?)
}
