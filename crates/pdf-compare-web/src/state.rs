use pdf_compare_core::{AppConfig, MergedDocument, PdfComparer, UploadSet};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Session data for one comparison: the uploaded documents and the last merge.
pub struct Session {
    pub uploads: UploadSet,
    /// Most recent merge result, served by the download route
    pub result: Option<MergedDocument>,
    pub created_at: Instant,
}

/// Global application state
pub struct AppState {
    /// Active sessions indexed by UUID
    sessions: RwLock<HashMap<Uuid, Session>>,
    /// Base configuration (note style, download name, limits)
    pub config: AppConfig,
    /// Pipeline shared by all sessions; cloned into blocking tasks
    pub comparer: PdfComparer,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let comparer = PdfComparer::new(&config);

        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            comparer,
        }
    }

    /// Create a new session holding the uploaded documents.
    ///
    /// Returns the session ID as a string (for URL embedding).
    pub async fn create_session(&self, uploads: UploadSet) -> String {
        let id = Uuid::new_v4();

        let session = Session {
            uploads,
            result: None,
            created_at: Instant::now(),
        };

        self.sessions.write().await.insert(id, session);
        id.to_string()
    }

    /// Get a session by ID string.
    ///
    /// Returns `None` if the ID is not a valid UUID or session doesn't exist.
    pub async fn get_session(&self, id: &str) -> Option<SessionRef<'_>> {
        let uuid = Uuid::parse_str(id).ok()?;
        let sessions = self.sessions.read().await;
        if sessions.contains_key(&uuid) {
            Some(SessionRef {
                id: uuid,
                state: self,
            })
        } else {
            None
        }
    }

    /// Drop sessions older than the configured TTL. Returns how many were removed.
    pub async fn cleanup_old_sessions(&self) -> usize {
        let max_age = Duration::from_secs(self.config.web.session_ttl_seconds);
        self.evict_older_than(max_age).await
    }

    async fn evict_older_than(&self, max_age: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        let now = Instant::now();

        sessions.retain(|_, session| now.duration_since(session.created_at) < max_age);
        before - sessions.len()
    }
}

/// A borrowed reference to a session that provides safe access patterns.
///
/// Locks are taken only inside the synchronous closures passed to
/// [`with_session`](Self::with_session) and [`with_session_mut`](Self::with_session_mut),
/// so no guard is ever held across an `.await`.
///
/// ```ignore
/// let docs = session.with_session(|s| s.uploads.clone()).await?;
/// run_blocking_work(docs).await;
/// ```
pub struct SessionRef<'a> {
    id: Uuid,
    state: &'a AppState,
}

impl SessionRef<'_> {
    /// Access session data immutably within a closure.
    pub async fn with_session<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&Session) -> R,
    {
        let sessions = self.state.sessions.read().await;
        sessions.get(&self.id).map(f)
    }

    /// Access session data mutably within a closure.
    pub async fn with_session_mut<F, R>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.state.sessions.write().await;
        sessions.get_mut(&self.id).map(f)
    }
}
