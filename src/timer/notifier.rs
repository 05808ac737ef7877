use anyhow::Result;
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

/// Signals the end of a session to the user. Implementations report when the signal finished
/// playing or failed, the timer doesn't care how it is produced.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self) -> Result<()>;
}

/// Rings the terminal bell.
pub struct TerminalBell;

#[async_trait]
impl Notifier for TerminalBell {
    async fn notify(&self) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(b"\x07").await?;
        stdout.flush().await?;
        Ok(())
    }
}

pub struct Silent;

#[async_trait]
impl Notifier for Silent {
    async fn notify(&self) -> Result<()> {
        Ok(())
    }
}
