use std::sync::Arc;

use crate::Result;
use crate::middleware::{GatePolicy, RouteTable};
use crate::service::{
    AuthorizationEngine, CredentialStore, Deadline, PasswordHasher, PermissionStore,
    ServiceConfig, SessionCache, SessionManager, UserDirectory,
};

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Debug, Clone)]
pub struct ServiceState {
    pub session_manager: SessionManager,
    pub authorization_engine: AuthorizationEngine,
    pub user_directory: UserDirectory,
    pub gate_policy: GatePolicy,
}

impl ServiceState {
    /// Initializes application state from configuration.
    ///
    /// Connects to Postgres (applying migrations) and NATS.
    pub async fn from_config(service_config: &ServiceConfig) -> Result<Self> {
        service_config.validate()?;

        let postgres = Arc::new(service_config.connect_postgres().await?);
        let sessions = Arc::new(service_config.connect_nats().await?);

        Ok(Self::from_stores(
            service_config,
            postgres.clone(),
            postgres,
            sessions,
        ))
    }

    /// Wires the services over already connected stores.
    pub fn from_stores(
        service_config: &ServiceConfig,
        credentials: Arc<dyn CredentialStore>,
        permissions: Arc<dyn PermissionStore>,
        sessions: Arc<dyn SessionCache>,
    ) -> Self {
        let deadline = Deadline::new(service_config.store_timeout());
        let password_hasher = PasswordHasher::new();

        let gate_policy = GatePolicy::new(&service_config.gate_section, RouteTable::default())
            .with_inferred_actions(service_config.infer_route_actions);

        Self {
            session_manager: SessionManager::new(
                credentials.clone(),
                sessions,
                password_hasher.clone(),
                deadline,
            ),
            authorization_engine: AuthorizationEngine::new(permissions.clone(), deadline),
            user_directory: UserDirectory::new(
                credentials,
                permissions,
                password_hasher,
                deadline,
                service_config.default_role_id,
            ),
            gate_policy,
        }
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(session_manager: SessionManager);
impl_di!(authorization_engine: AuthorizationEngine);
impl_di!(user_directory: UserDirectory);
impl_di!(gate_policy: GatePolicy);
