//! Session management
//!
//! A session is the backend conversation context (assistant + thread) reused
//! across invocations. It is created lazily on first use and cached locally
//! under a name (`default` unless configured otherwise).

pub mod persistence;

use crate::errors::Result;
use async_trait::async_trait;

// Re-export key types
pub use persistence::{
    FileSessionStore, MemorySessionStore, Session, SessionStore, DEFAULT_SESSION, SESSIONS_FILE,
};

/// Creates backend-side conversation handles
#[async_trait]
pub trait SessionProvisioner: Send + Sync {
    /// Create an assistant and return its id
    async fn create_assistant(&self) -> Result<String>;

    /// Create a conversation thread and return its id
    async fn create_thread(&self) -> Result<String>;
}

/// Load the named session, creating whatever half is missing
///
/// An unreadable or unwritable cache is not fatal: the session is created
/// (or used) anyway and a warning is logged. Provisioning errors propagate.
pub async fn get_or_create_session(
    store: &dyn SessionStore,
    provisioner: &dyn SessionProvisioner,
    name: &str,
) -> Result<Session> {
    let cached = match store.load(name) {
        Ok(cached) => cached,
        Err(e) => {
            tracing::warn!(session = name, error = %e, "session cache unreadable, starting fresh");
            None
        }
    };

    let cached_assistant = cached
        .as_ref()
        .map(|s| s.assistant_id.clone())
        .filter(|id| !id.is_empty());
    let cached_thread = cached
        .as_ref()
        .map(|s| s.thread_id.clone())
        .filter(|id| !id.is_empty());

    if let (Some(session), Some(_), Some(_)) = (&cached, &cached_assistant, &cached_thread) {
        tracing::debug!(session = name, thread = %session.thread_id, "reusing cached session");
        return Ok(session.clone());
    }

    let assistant_id = match cached_assistant {
        Some(id) => id,
        None => provisioner.create_assistant().await?,
    };
    let thread_id = match cached_thread {
        Some(id) => id,
        None => provisioner.create_thread().await?,
    };

    let session = Session::new(assistant_id, thread_id);
    if let Err(e) = store.save(name, &session) {
        tracing::warn!(session = name, error = %e, "could not cache session");
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ClaixError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingProvisioner {
        assistants: AtomicUsize,
        threads: AtomicUsize,
    }

    #[async_trait]
    impl SessionProvisioner for CountingProvisioner {
        async fn create_assistant(&self) -> Result<String> {
            let n = self.assistants.fetch_add(1, Ordering::SeqCst);
            Ok(format!("asst_{}", n))
        }

        async fn create_thread(&self) -> Result<String> {
            let n = self.threads.fetch_add(1, Ordering::SeqCst);
            Ok(format!("thread_{}", n))
        }
    }

    struct BrokenStore;

    impl SessionStore for BrokenStore {
        fn load(&self, _name: &str) -> Result<Option<Session>> {
            Err(ClaixError::SessionStore("disk on fire".to_string()))
        }

        fn save(&self, _name: &str, _session: &Session) -> Result<()> {
            Err(ClaixError::SessionStore("disk on fire".to_string()))
        }
    }

    struct FailingProvisioner;

    #[async_trait]
    impl SessionProvisioner for FailingProvisioner {
        async fn create_assistant(&self) -> Result<String> {
            Err(ClaixError::Generation("HTTP 401".to_string()))
        }

        async fn create_thread(&self) -> Result<String> {
            Err(ClaixError::Generation("HTTP 401".to_string()))
        }
    }

    #[tokio::test]
    async fn test_creates_once_then_reuses() {
        let store = MemorySessionStore::new();
        let provisioner = CountingProvisioner::default();

        let first = get_or_create_session(&store, &provisioner, DEFAULT_SESSION)
            .await
            .unwrap();
        let second = get_or_create_session(&store, &provisioner, DEFAULT_SESSION)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(provisioner.assistants.load(Ordering::SeqCst), 1);
        assert_eq!(provisioner.threads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_only_missing_half_is_created() {
        let store = MemorySessionStore::new();
        store
            .save(DEFAULT_SESSION, &Session::new("asst_existing", ""))
            .unwrap();
        let provisioner = CountingProvisioner::default();

        let session = get_or_create_session(&store, &provisioner, DEFAULT_SESSION)
            .await
            .unwrap();

        assert_eq!(session.assistant_id, "asst_existing");
        assert_eq!(session.thread_id, "thread_0");
        assert_eq!(provisioner.assistants.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_broken_store_degrades() {
        let provisioner = CountingProvisioner::default();
        let session = get_or_create_session(&BrokenStore, &provisioner, DEFAULT_SESSION)
            .await
            .unwrap();
        assert_eq!(session.assistant_id, "asst_0");
    }

    #[tokio::test]
    async fn test_provisioning_failure_propagates() {
        let store = MemorySessionStore::new();
        let result = get_or_create_session(&store, &FailingProvisioner, DEFAULT_SESSION).await;
        assert!(result.is_err());
        assert!(store.is_empty());
    }
}
