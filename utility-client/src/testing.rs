//! In-memory [`AnalyticsStore`] for tests of this crate and of its callers.

use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use mongodb::bson::{oid::ObjectId, Document};

use crate::{
    domain::{SystemComponent, SystemType, Utility},
    AnalyticsStore, CollectionName, QueryError,
};

/// Serves canned aggregation output per collection and records every
/// pipeline it receives.
#[derive(Default)]
pub struct FixtureStore {
    rows: HashMap<CollectionName, Vec<Document>>,
    utility: Option<Utility>,
    failure: Option<String>,
    calls: Mutex<Vec<(CollectionName, Vec<Document>)>>,
}

impl FixtureStore {
    pub fn with_rows(mut self, collection: CollectionName, rows: Vec<Document>) -> Self {
        self.rows.insert(collection, rows);
        self
    }

    pub fn with_utility(mut self, utility: Utility) -> Self {
        self.utility = Some(utility);
        self
    }

    /// Every read fails with `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    /// First pipeline run against `collection`, if any.
    pub fn pipeline(&self, collection: CollectionName) -> Option<Vec<Document>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(c, _)| *c == collection)
            .map(|(_, p)| p.clone())
    }

    fn check(&self) -> Result<(), QueryError> {
        match &self.failure {
            Some(message) => Err(QueryError::Decode(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl AnalyticsStore for FixtureStore {
    async fn aggregate(
        &self,
        collection: CollectionName,
        pipeline: Vec<Document>,
    ) -> Result<Vec<Document>, QueryError> {
        self.check()?;
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((collection, pipeline));
        Ok(self.rows.get(&collection).cloned().unwrap_or_default())
    }

    async fn find_utility(&self, id: ObjectId) -> Result<Option<Utility>, QueryError> {
        self.check()?;
        Ok(self.utility.clone().filter(|u| u.id == id))
    }
}

pub fn sample_utility(id: ObjectId) -> Utility {
    Utility {
        id,
        name: "Kano Rural Power".to_string(),
        acronym: "KRP".to_string(),
        country: "Nigeria".to_string(),
        logo_url: None,
        address: None,
        contact_email: None,
        contact_phone: None,
        total_installed_capacity_kw: None,
        system_components: vec![SystemComponent {
            component: "PV".to_string(),
            capacity: 60.0,
            unit: "kWp".to_string(),
        }],
        system_type: SystemType::LvOffGrid,
        system_description: "Solar minigrid".to_string(),
        number_of_customers: Some(412),
        population_served: None,
        location: None,
        is_active: true,
    }
}
