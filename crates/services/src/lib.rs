//! # services
//!
//! Application layer: every operation of the materials repository, written
//! against the ports in `domains` and wired once at startup.

use std::sync::Arc;

use chrono::Duration;
use domains::{
    AuthorRepository, FavoriteRepository, FileStore, HistoryRepository, MaterialRepository,
    ReviewNotifier, TagRepository, UserRoleStore,
};

pub mod authors;
pub mod catalog;
pub mod favorites;
pub mod history;
pub mod lifecycle;
pub mod roles;
pub mod tags;
pub mod upload;

pub use authors::AuthorDirectory;
pub use catalog::{MaterialCatalog, SearchQuery};
pub use favorites::FavoritesTracker;
pub use history::HistoryTracker;
pub use lifecycle::MaterialLifecycle;
pub use roles::RoleResolver;
pub use tags::TagDirectory;
pub use upload::{UpdateRequest, UploadRequest};

/// Adapter instances, one per port.
#[derive(Clone)]
pub struct Ports {
    pub users: Arc<dyn UserRoleStore>,
    pub materials: Arc<dyn MaterialRepository>,
    pub authors: Arc<dyn AuthorRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub favorites: Arc<dyn FavoriteRepository>,
    pub history: Arc<dyn HistoryRepository>,
    pub files: Arc<dyn FileStore>,
    pub notifier: Arc<dyn ReviewNotifier>,
}

/// Tunables that come from configuration.
#[derive(Debug, Clone)]
pub struct Policy {
    pub allowed_email_domains: Vec<String>,
    pub history_retention: Duration,
    pub viewer_base_url: Option<String>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            allowed_email_domains: vec!["alumno.ipn.mx".to_string(), "ipn.mx".to_string()],
            history_retention: Duration::days(7),
            viewer_base_url: None,
        }
    }
}

/// All services, sharing one set of ports.
#[derive(Clone)]
pub struct Services {
    pub roles: RoleResolver,
    pub catalog: MaterialCatalog,
    pub lifecycle: MaterialLifecycle,
    pub history: HistoryTracker,
    pub favorites: FavoritesTracker,
    pub authors: AuthorDirectory,
    pub tags: TagDirectory,
}

impl Services {
    pub fn new(ports: Ports, policy: Policy) -> Self {
        let roles = RoleResolver::new(ports.users.clone());
        let catalog = MaterialCatalog::new(&ports, roles.clone(), policy.viewer_base_url);
        Self {
            lifecycle: MaterialLifecycle::new(
                &ports,
                catalog.clone(),
                policy.allowed_email_domains,
            ),
            history: HistoryTracker::new(&ports, roles.clone(), policy.history_retention),
            favorites: FavoritesTracker::new(&ports, roles.clone()),
            authors: AuthorDirectory::new(&ports),
            tags: TagDirectory::new(&ports),
            catalog,
            roles,
        }
    }
}
