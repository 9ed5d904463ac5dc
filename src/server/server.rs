use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::Settings;
use std::sync::Arc;

/// Services shared by every request handler.
pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub token_lifecycle: Arc<dyn TokenLifecycle>,
}

impl Server {
    pub fn new(auth_service: Arc<dyn AuthService>, token_lifecycle: Arc<dyn TokenLifecycle>) -> Self {
        Self {
            auth_service,
            token_lifecycle,
        }
    }

    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let store_settings = &settings.session_store;
        let session_store: Arc<dyn SessionStore> = match store_settings.backend.as_str() {
            "memory" => {
                warn!("using in-memory session store; sessions do not survive a restart");
                Arc::new(MemorySessionStore::new())
            }
            "redis" => {
                let url = store_settings
                    .redis_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("session_store.redis_url is not set"))?;
                let store = RedisSessionStore::connect(url, store_settings.op_timeout()).await?;
                info!("connected to redis session store");
                Arc::new(store)
            }
            other => return Err(anyhow::anyhow!("Unknown session store backend: {}", other)),
        };
        let session_registry: Arc<dyn SessionRegistry> = Arc::new(StoreSessionRegistry::new(
            session_store,
            store_settings.key_prefix.clone(),
        ));

        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            issuer: settings.token.issuer.clone(),
            audience: settings.token.audience.clone(),
            access_secret: settings.token.access_secret.clone().into_bytes(),
            refresh_secret: settings.token.refresh_secret.clone().into_bytes(),
        })?);
        let lifecycle_config =
            LifecycleConfig::new(settings.token.access_ttl(), settings.token.refresh_ttl())?;
        let token_lifecycle: Arc<dyn TokenLifecycle> = Arc::new(RealTokenLifecycle::new(
            token_codec,
            session_registry,
            lifecycle_config,
        ));

        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher);
        let user_directory = Arc::new(MemoryUserDirectory::new());
        for seed in &settings.users.seed {
            let password_hash = credential_hasher.hash_password(&seed.password).await?;
            let user_id = user_directory.insert(&seed.email, &seed.name, &password_hash)?;
            debug!(%user_id, email = %seed.email, "seeded user");
        }

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            user_directory,
            credential_hasher,
            token_lifecycle.clone(),
        ));

        Ok(Self::new(auth_service, token_lifecycle))
    }
}
