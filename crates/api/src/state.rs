use std::sync::Arc;

use folio_core::auth::AuthService;
use folio_core::content::ContentService;
use folio_core::events::EventBus;
use folio_core::media::{EmbedResolver, MediaReferenceStore};
use folio_core::repo::{
    PgSectionRepository, PgSubItemRepository, SectionRepository, SubItemRepository,
};
use folio_core::storage::{BlobStore, LocalBlobStore};
use sqlx::PgPool;

use crate::config::AppConfig;

/// Persistence collaborators the services are built on.
pub struct Backends {
    pub pool: Option<PgPool>,
    pub sections: Arc<dyn SectionRepository>,
    pub items: Arc<dyn SubItemRepository>,
    pub blobs: Arc<dyn BlobStore>,
}

impl Backends {
    /// PostgreSQL repositories and blobs on local disk under `MEDIA_DIR`.
    pub fn postgres(pool: PgPool, config: &AppConfig) -> Self {
        Self {
            sections: Arc::new(PgSectionRepository::new(pool.clone())),
            items: Arc::new(PgSubItemRepository::new(pool.clone())),
            blobs: Arc::new(LocalBlobStore::new(
                config.media_dir.clone(),
                config.media_public_url.clone(),
            )),
            pool: Some(pool),
        }
    }
}

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    pool: Option<PgPool>,
    config: AppConfig,
    event_bus: EventBus,
    sections: Arc<dyn SectionRepository>,
    content: ContentService,
    auth: AuthService,
    embed: EmbedResolver,
}

impl AppState {
    pub fn new(config: AppConfig, event_bus: EventBus, backends: Backends) -> Self {
        let media = Arc::new(MediaReferenceStore::new(
            backends.items.clone(),
            backends.blobs,
            event_bus.clone(),
        ));
        let content = ContentService::new(
            backends.sections.clone(),
            backends.items,
            media,
            event_bus.clone(),
        );

        Self {
            inner: Arc::new(InnerState {
                pool: backends.pool,
                auth: AuthService::new(config.auth(), event_bus.clone()),
                embed: EmbedResolver::new(config.max_upload_bytes),
                sections: backends.sections,
                config,
                event_bus,
                content,
            }),
        }
    }

    /// `None` when running without a database, as the route tests do.
    pub fn pool(&self) -> Option<&PgPool> {
        self.inner.pool.as_ref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }

    pub fn sections(&self) -> &dyn SectionRepository {
        self.inner.sections.as_ref()
    }

    pub fn content(&self) -> &ContentService {
        &self.inner.content
    }

    pub fn media(&self) -> &MediaReferenceStore {
        self.inner.content.media()
    }

    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    pub fn embed(&self) -> &EmbedResolver {
        &self.inner.embed
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;

    use folio_core::auth::hash_password;
    use folio_core::repo::MemoryRepository;
    use folio_core::storage::MemoryBlobStore;

    use super::*;

    pub const ADMIN_EMAIL: &str = "operator@example.com";
    pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

    pub struct TestApp {
        pub state: AppState,
        pub blobs: Arc<MemoryBlobStore>,
    }

    /// State over in-memory backends with a known operator account.
    pub fn test_app() -> TestApp {
        let hash = hash_password(ADMIN_PASSWORD).unwrap();
        let vars = HashMap::from([
            ("DATABASE_URL", "postgres://unused".to_string()),
            ("ADMIN_EMAIL", ADMIN_EMAIL.to_string()),
            ("ADMIN_PASSWORD_HASH", hash),
            ("JWT_SECRET", "test-secret".to_string()),
            ("MAX_UPLOAD_BYTES", "1024".to_string()),
        ]);
        let config = AppConfig::from_lookup(|name| vars.get(name).cloned()).unwrap();

        let repo = Arc::new(MemoryRepository::new());
        let blobs = Arc::new(MemoryBlobStore::new());
        let backends = Backends {
            pool: None,
            sections: repo.clone(),
            items: repo,
            blobs: blobs.clone(),
        };

        TestApp {
            state: AppState::new(config, EventBus::new(64), backends),
            blobs,
        }
    }
}
