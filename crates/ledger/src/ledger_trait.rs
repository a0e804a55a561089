use async_trait::async_trait;
use lojavoz_common::Result;

/// Common trait for append-only ledger clients
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Append one (timestamp, store, transcript) row; the timestamp is
    /// computed at call time
    async fn append_row(&self, store: &str, transcript: &str) -> Result<()>;
}
