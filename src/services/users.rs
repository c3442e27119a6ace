use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Map, Value};

use crate::models::{Coordinates, RegisterRequest, Role, User};
use crate::services::error::ServiceError;
use crate::services::geocoder::GeoResolver;
use crate::services::identity::Identity;
use crate::services::store::{fields, to_fields, Collections, DocumentStore, StoreError};

/// Profile fields that a repeated registration always overwrites
const REFRESHED_FIELDS: [&str; 6] = [
    "organization_name",
    "city",
    "area",
    "display_name",
    "latitude",
    "longitude",
];

/// User profiles, roles and block lists
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn DocumentStore>,
    geocoder: GeoResolver,
    collections: Collections,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>, geocoder: GeoResolver, collections: Collections) -> Self {
        Self {
            store,
            geocoder,
            collections,
        }
    }

    pub async fn get(&self, uid: &str) -> Result<Option<User>, StoreError> {
        self.store
            .get(&self.collections.users, uid)
            .await?
            .map(|doc| doc.into_model::<User>("uid"))
            .transpose()
    }

    /// Fetch a user that must exist
    pub async fn require(&self, uid: &str) -> Result<User, ServiceError> {
        self.get(uid)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User profile not found".to_string()))
    }

    /// Fetch a user that must exist and hold `role`
    pub async fn require_role(&self, uid: &str, role: Role) -> Result<User, ServiceError> {
        let user = self
            .get(uid)
            .await?
            .ok_or_else(|| ServiceError::Forbidden("User profile not found".to_string()))?;

        if user.role != role {
            return Err(ServiceError::Forbidden("Access denied for this role".to_string()));
        }

        Ok(user)
    }

    /// Create the caller's profile, or refresh it if it already exists
    ///
    /// On an existing profile, organization name, city, area and display name
    /// are overwritten when supplied; other fields are only filled if missing.
    /// NGOs with a city and area get their coordinates geocoded here; a
    /// geocoding failure leaves them to be backfilled by proximity search.
    pub async fn register(&self, identity: &Identity, req: &RegisterRequest) -> Result<User, ServiceError> {
        let mut user = User {
            uid: identity.uid.clone(),
            role: req.role,
            email: identity.email.clone(),
            display_name: req.display_name.clone().or_else(|| identity.name.clone()),
            organization_name: req.organization_name.clone(),
            city: req.city.clone(),
            area: req.area.clone(),
            reputation: None,
            mismatch_count: 0,
            coordinates: None,
            blocked_uids: vec![],
            created_at: Some(Utc::now()),
        };

        if user.is_ngo() {
            user.coordinates = self.geocode_registration(&user).await;
        }

        let data = to_fields(&user, "uid")?;
        let created = self
            .store
            .create_if_absent(&self.collections.users, &identity.uid, data.clone())
            .await?;

        if created {
            tracing::info!("Registered {} {}", user.role.as_str(), identity.uid);
        } else {
            let existing = self
                .store
                .get(&self.collections.users, &identity.uid)
                .await?
                .map(|doc| doc.data)
                .unwrap_or_default();

            let update = merge_registration(&existing, data);
            if !update.is_empty() {
                self.store
                    .update(&self.collections.users, &identity.uid, update)
                    .await?;
            }
            tracing::info!("Refreshed profile for {}", identity.uid);
        }

        self.require(&identity.uid).await
    }

    async fn geocode_registration(&self, user: &User) -> Option<Coordinates> {
        let address = user.address_line()?;
        match self.geocoder.geocode(&address).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Geocoding NGO {} at registration failed: {}", user.uid, e);
                None
            }
        }
    }

    pub async fn block(&self, uid: &str, target: &str) -> Result<Vec<String>, ServiceError> {
        if uid == target {
            return Err(ServiceError::Invalid("You cannot block yourself".to_string()));
        }

        let user = self.require(uid).await?;
        let mut blocked = user.blocked_uids;
        if !blocked.iter().any(|b| b == target) {
            blocked.push(target.to_string());
            self.store_blocked(uid, &blocked).await?;
        }
        Ok(blocked)
    }

    pub async fn unblock(&self, uid: &str, target: &str) -> Result<Vec<String>, ServiceError> {
        let user = self.require(uid).await?;
        let mut blocked = user.blocked_uids;
        let before = blocked.len();
        blocked.retain(|b| b != target);
        if blocked.len() != before {
            self.store_blocked(uid, &blocked).await?;
        }
        Ok(blocked)
    }

    async fn store_blocked(&self, uid: &str, blocked: &[String]) -> Result<(), StoreError> {
        self.store
            .update(&self.collections.users, uid, fields(json!({ "blocked_uids": blocked })))
            .await
    }
}

/// Fields to write when an existing profile registers again
fn merge_registration(existing: &Map<String, Value>, incoming: Map<String, Value>) -> Map<String, Value> {
    incoming
        .into_iter()
        .filter(|(_, value)| !value.is_null())
        .filter(|(key, _)| {
            REFRESHED_FIELDS.contains(&key.as_str())
                || existing.get(key).map_or(true, Value::is_null)
        })
        .collect()
}
