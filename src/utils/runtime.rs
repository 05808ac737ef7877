use anyhow::Result;

/// Everything in medit-streak runs cooperatively on one thread.
pub fn single_thread_runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
