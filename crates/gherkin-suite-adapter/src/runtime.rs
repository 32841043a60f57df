//! Driving a feature run from synchronous code.

use std::future::Future;

/// Run `future` to completion on a fresh current-thread Tokio runtime inside
/// a [`LocalSet`](tokio::task::LocalSet).
///
/// Step definitions may therefore use `tokio::task::spawn_local` and
/// `tokio::runtime::Handle::current()`. Nothing runs on other threads.
///
/// # Errors
/// Returns the I/O error raised when the runtime cannot be built.
///
/// # Examples
///
/// ```
/// use gherkin_suite_adapter::block_on_local;
///
/// let value = block_on_local(async {
///     tokio::task::yield_now().await;
///     21 * 2
/// });
/// assert_eq!(value.ok(), Some(42));
/// ```
pub fn block_on_local<F: Future>(future: F) -> std::io::Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local_set = tokio::task::LocalSet::new();
    Ok(local_set.block_on(&runtime, future))
}
