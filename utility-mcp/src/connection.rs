use std::{
    collections::HashSet,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use anyhow::Context;
use mongodb::{
    bson::doc,
    event::{sdam::SdamEvent, EventHandler},
    options::ClientOptions,
    Client, Database,
};
use utility_client::{AnalyticsStore, MongoStore};

use crate::config::MongoConfig;

/// Servers the driver can currently reach, keyed by address. The database
/// counts as connected while any one of them answers heartbeats. Updated only
/// by monitoring events, read by the health endpoint.
#[derive(Debug, Clone, Default)]
pub struct ConnectionState {
    reachable: Arc<Mutex<HashSet<String>>>,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn servers(&self) -> MutexGuard<'_, HashSet<String>> {
        self.reachable.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_connected(&self) -> bool {
        !self.servers().is_empty()
    }

    pub fn record_heartbeat(&self, server: &str, succeeded: bool) {
        let (was, now) = {
            let mut servers = self.servers();
            let was = !servers.is_empty();
            if succeeded {
                servers.insert(server.to_string());
            } else {
                servers.remove(server);
            }
            (was, !servers.is_empty())
        };
        match (was, now) {
            (false, true) => tracing::info!(server, "MongoDB connection established"),
            (true, false) => {
                tracing::warn!(server, "no MongoDB server reachable; marking database disconnected")
            }
            _ => {}
        }
    }

    fn clear(&self) {
        self.servers().clear();
    }

    pub fn observe(&self, event: &SdamEvent) {
        match event {
            SdamEvent::ServerHeartbeatSucceeded(e) => {
                self.record_heartbeat(&e.server_address.to_string(), true)
            }
            SdamEvent::ServerHeartbeatFailed(e) => {
                tracing::debug!(server = %e.server_address, error = %e.failure, "heartbeat failed");
                self.record_heartbeat(&e.server_address.to_string(), false)
            }
            SdamEvent::ServerClosed(e) => self.record_heartbeat(&e.address.to_string(), false),
            SdamEvent::TopologyClosed(_) => self.clear(),
            _ => {}
        }
    }
}

/// Owns the driver client for the lifetime of the process.
pub struct ConnectionManager {
    client: Client,
    database: Database,
    state: ConnectionState,
}

impl ConnectionManager {
    /// Builds the client and pings the deployment once; failure here is fatal
    /// to startup.
    pub async fn connect(uri: &str, cfg: &MongoConfig, app_name: &str) -> anyhow::Result<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .context("parsing MongoDB connection string")?;
        options.max_pool_size = Some(cfg.max_pool_size);
        options.server_selection_timeout = Some(cfg.server_selection_timeout());
        options.connect_timeout = Some(cfg.connect_timeout());
        options.app_name = Some(app_name.to_string());

        let state = ConnectionState::new();
        let observer = state.clone();
        options.sdam_event_handler =
            Some(EventHandler::callback(move |event: SdamEvent| observer.observe(&event)));

        let client = Client::with_options(options).context("building MongoDB client")?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(&cfg.database));

        database
            .run_command(doc! { "ping": 1 })
            .await
            .context("initial MongoDB ping failed")?;

        tracing::info!(database = database.name(), "MongoDB connected");
        Ok(Self { client, database, state })
    }

    pub fn state(&self) -> ConnectionState {
        self.state.clone()
    }

    pub fn store(&self) -> Arc<dyn AnalyticsStore> {
        Arc::new(MongoStore::new(self.database.clone()))
    }

    pub async fn shutdown(self) {
        self.client.shutdown().await;
        self.state.clear();
        tracing::info!("MongoDB connection closed");
    }
}
