use crate::config::Wiki;
use crate::error::{CheckError, Result};
use std::future::Future;

/// Where the current highest live identifier of a wiki comes from.
///
/// Implementations wrap an external data store; the checker only needs the
/// number. A failure here is fatal for the scan.
pub trait MaxIdSource: Send + Sync {
    fn max_id(&self, wiki: &Wiki) -> impl Future<Output = Result<u64>> + Send;
}

/// A max id supplied up front, e.g. on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedMaxId(pub u64);

impl MaxIdSource for FixedMaxId {
    async fn max_id(&self, wiki: &Wiki) -> Result<u64> {
        if self.0 == 0 {
            return Err(CheckError::MaxId(format!("max id for {} must be positive", wiki)));
        }
        Ok(self.0)
    }
}
