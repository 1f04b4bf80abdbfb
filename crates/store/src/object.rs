//! Object store collaborator interface.

use async_trait::async_trait;
use bytes::Bytes;
use pipeline_core::Result;

/// Key/value object storage with `/`-separated UTF-8 keys.
///
/// The pipeline only needs put/get/list; everything else about the backing
/// service is out of scope. Implementations are injected at construction so
/// tests substitute an in-memory store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `body` under `key`, overwriting any existing object.
    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<()>;

    /// Fetches the object body for `key`.
    async fn get(&self, key: &str) -> Result<Bytes>;

    /// Lists all keys starting with `prefix`, in lexicographic order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}
