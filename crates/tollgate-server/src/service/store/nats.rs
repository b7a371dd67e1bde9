use async_trait::async_trait;
use tollgate_nats::SessionStore;
use tollgate_nats::kv::{SessionData, SessionKey};

use super::SessionCache;

#[async_trait]
impl SessionCache for SessionStore {
    async fn set(&self, key: &SessionKey, session: &SessionData) -> tollgate_nats::Result<()> {
        self.put(key, session).await.map(|_| ())
    }

    async fn get(&self, key: &SessionKey) -> tollgate_nats::Result<Option<SessionData>> {
        self.get_value(key).await
    }

    async fn del(&self, key: &SessionKey) -> tollgate_nats::Result<()> {
        self.delete(key).await
    }
}
