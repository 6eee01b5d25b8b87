use std::sync::Arc;

use lazy_static::lazy_static;
use rand::{rngs::OsRng, RngCore};
use regex::Regex;
use serde_json::{json, Value};
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::entity::EntityService;
use crate::error::{ApiError, ApiResult};
use crate::mailer::Mailer;
use crate::state::AppState;
use crate::store::{Record, RecordStore};

use super::dto::RegisterRequest;
use super::model::{ActivationState, User, PROFILE_FIELDS, USERS};

/// One message for unknown email and wrong password; the caller must not
/// learn which one it was.
const INVALID_CREDENTIALS: &str = "invalid email or password";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// 128-bit random one-time key, hex encoded. Used for activation and for
/// password-reset codes.
fn generate_one_time_key() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn assert_owner(caller: Uuid, target: Uuid) -> ApiResult<()> {
    if caller != target {
        return Err(ApiError::Forbidden(format!(
            "caller {caller} may not modify user {target}"
        )));
    }
    Ok(())
}

/// Identity service built on the generic entity primitives. Owner-gated
/// operations take the authenticated caller id and compare it to the
/// target id before any store write.
#[derive(Clone)]
pub struct UserService {
    entities: EntityService,
    mailer: Arc<dyn Mailer>,
    public_url: String,
}

impl UserService {
    pub fn new(store: Arc<dyn RecordStore>, mailer: Arc<dyn Mailer>, public_url: String) -> Self {
        Self {
            entities: EntityService::new(&USERS, store),
            mailer,
            public_url,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.store.clone(),
            state.mailer.clone(),
            state.config.public_url.clone(),
        )
    }

    fn store(&self) -> &Arc<dyn RecordStore> {
        self.entities.store()
    }

    /// Create a pending user and queue the activation mail. The activation
    /// key is persisted in the same write that creates the user, so a
    /// pending account can never exist without a retrievable key.
    pub async fn register(&self, req: RegisterRequest) -> ApiResult<User> {
        let name = req.name.trim().to_string();
        let email = req.email.trim().to_lowercase();

        if name.is_empty() {
            return Err(ApiError::Validation("name is required".into()));
        }
        if !is_valid_email(&email) {
            return Err(ApiError::Validation("invalid email".into()));
        }
        if req.password.len() < 8 {
            return Err(ApiError::Validation(
                "password must be at least 8 characters".into(),
            ));
        }

        // Early duplicate check for a friendly message; a concurrent
        // registration still loses at the store's unique constraint, which
        // surfaces as the same Conflict.
        let mut filter = Record::new();
        filter.insert("email".into(), Value::String(email.clone()));
        if self.store().find(USERS.name, &filter).await?.is_some() {
            return Err(ApiError::Conflict("email already registered".into()));
        }

        let password_hash = hash_password(&req.password)?;
        let activation_key = generate_one_time_key();

        let mut record = Record::new();
        record.insert("name".into(), json!(name));
        record.insert("email".into(), json!(email));
        record.insert("password_hash".into(), json!(password_hash));
        record.insert("active".into(), json!(ActivationState::Pending));
        record.insert("activation_key".into(), json!(activation_key));
        record.insert("following".into(), json!([]));

        let added = self.entities.add(record).await?;
        let user = User::from_record(added)?;

        self.dispatch_activation_mail(&user, &activation_key);
        info!(user_id = %user.id, "user registered, pending activation");
        Ok(user)
    }

    fn dispatch_activation_mail(&self, user: &User, key: &str) {
        let mailer = self.mailer.clone();
        let to = user.email.clone();
        let link = format!("{}/users/{}/activate/{}", self.public_url, user.id, key);
        let body = format!(
            "<html><body>Welcome, {}!<br>\
             <a href=\"{link}\">Click this link to activate your account</a>\
             </body></html>",
            user.name
        );
        // Fire and forget: delivery failure goes to the operator log, never
        // back to the registering caller, and never rolls back the record.
        tokio::spawn(async move {
            if let Err(e) = mailer.send(&to, "Activate your portfolio account", &body).await {
                error!(error = %e, %to, "activation mail dispatch failed");
            }
        });
    }

    /// Consume the activation key and transition pending -> active. The key
    /// is single-use: a mismatch, a replay, or a key already consumed by a
    /// concurrent attempt all fail the same way without touching state. The
    /// store's guarded update does check and consume in one step, so of two
    /// racing attempts with the same key exactly one wins.
    pub async fn activate(&self, id: Uuid, activation_key: &str) -> ApiResult<User> {
        let mut guard = Record::new();
        guard.insert("active".into(), json!(ActivationState::Pending));
        guard.insert("activation_key".into(), json!(activation_key));

        let mut patch = Record::new();
        patch.insert("active".into(), json!(ActivationState::Active));
        patch.insert("activation_key".into(), Value::Null);

        let updated = self
            .store()
            .update_guarded(USERS.name, id, &guard, patch)
            .await
            .map_err(|e| match e {
                crate::store::StoreError::NotFound { .. } => {
                    ApiError::NotFound(format!("no user with id {id}"))
                }
                other => other.into(),
            })?
            .ok_or_else(|| ApiError::Forbidden("mismatching activation code".into()))?;

        info!(user_id = %id, "user activated");
        User::from_record(updated)
    }

    /// Credential check. Succeeds only for active accounts with a matching
    /// password.
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<User> {
        let email = email.trim().to_lowercase();
        let mut filter = Record::new();
        filter.insert("email".into(), Value::String(email));

        let user = match self.store().find(USERS.name, &filter).await? {
            Some(record) => User::from_record(record)?,
            None => return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into())),
        };

        if !verify_password(password, &user.password_hash)? {
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.into()));
        }
        if user.active != ActivationState::Active {
            return Err(ApiError::Forbidden("account not activated".into()));
        }

        info!(user_id = %user.id, "user logged in");
        Ok(user)
    }

    pub async fn get_users(&self) -> ApiResult<Vec<User>> {
        self.entities
            .get_all(Record::new())
            .await?
            .into_iter()
            .map(User::from_record)
            .collect()
    }

    pub async fn get_user_info(&self, id: Uuid) -> ApiResult<User> {
        let record = self
            .entities
            .get(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("no user with id {id}")))?;
        User::from_record(record)
    }

    /// Sparse profile patch. Unspecified fields stay untouched; anything
    /// outside the profile whitelist is dropped.
    pub async fn update_profile(&self, caller: Uuid, target: Uuid, patch: Record) -> ApiResult<User> {
        assert_owner(caller, target)?;

        let patch: Record = patch
            .into_iter()
            .filter(|(k, v)| PROFILE_FIELDS.contains(&k.as_str()) && !v.is_null())
            .collect();

        let updated = self.store().update(USERS.name, target, patch).await?;
        User::from_record(updated)
    }

    /// Change the password, gated on the outstanding reset code. The code
    /// is consumed on success and cannot be replayed.
    pub async fn update_password(
        &self,
        caller: Uuid,
        target: Uuid,
        password: Option<String>,
        password_reset: Option<String>,
    ) -> ApiResult<User> {
        assert_owner(caller, target)?;

        let (password, reset) = match (password, password_reset) {
            (Some(p), Some(r)) => (p, r),
            _ => {
                return Err(ApiError::Validation(
                    "password and password_reset are required".into(),
                ))
            }
        };
        if password.len() < 8 {
            return Err(ApiError::Validation(
                "password must be at least 8 characters".into(),
            ));
        }

        // Same single-use discipline as activation: the reset code is the
        // guard and the same write clears it.
        let password_hash = hash_password(&password)?;
        let mut guard = Record::new();
        guard.insert("password_reset_key".into(), json!(reset));
        let mut patch = Record::new();
        patch.insert("password_hash".into(), json!(password_hash));
        patch.insert("password_reset_key".into(), Value::Null);

        let updated = self
            .store()
            .update_guarded(USERS.name, target, &guard, patch)
            .await?
            .ok_or_else(|| ApiError::Forbidden("mismatching password reset code".into()))?;
        info!(user_id = %target, "password changed");
        User::from_record(updated)
    }

    /// Add or remove one id in the caller's following set. Both directions
    /// are idempotent.
    pub async fn update_following(
        &self,
        caller: Uuid,
        target: Uuid,
        following: Option<Uuid>,
        state: Option<bool>,
    ) -> ApiResult<User> {
        assert_owner(caller, target)?;

        let (followee, state) = match (following, state) {
            (Some(f), Some(s)) => (f, s),
            _ => {
                return Err(ApiError::Validation(
                    "following and state are required".into(),
                ))
            }
        };
        if followee == target {
            return Err(ApiError::Validation("cannot follow yourself".into()));
        }

        let user = self.get_user_info(target).await?;
        let mut following = user.following;
        if state {
            if !following.contains(&followee) {
                following.push(followee);
            }
        } else {
            following.retain(|id| *id != followee);
        }

        let mut patch = Record::new();
        patch.insert("following".into(), json!(following));
        let updated = self.store().update(USERS.name, target, patch).await?;
        User::from_record(updated)
    }

    /// Remove the account. Owned sub-records are not cascaded here.
    pub async fn delete_user(&self, caller: Uuid, target: Uuid) -> ApiResult<User> {
        assert_owner(caller, target)?;
        let removed = self.store().delete(USERS.name, target).await?;
        info!(user_id = %target, "user deleted");
        User::from_record(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryRecordStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((to.into(), subject.into(), body.into()));
            Ok(())
        }
    }

    struct Harness {
        svc: UserService,
        store: Arc<dyn RecordStore>,
        mailer: Arc<RecordingMailer>,
    }

    fn harness() -> Harness {
        let store =
            Arc::new(MemoryRecordStore::new().with_unique("users", "email")) as Arc<dyn RecordStore>;
        let mailer = Arc::new(RecordingMailer::default());
        let svc = UserService::new(
            store.clone(),
            mailer.clone() as Arc<dyn Mailer>,
            "http://localhost:8080".into(),
        );
        Harness { svc, store, mailer }
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "A".into(),
            email: email.into(),
            password: "p1-secret".into(),
        }
    }

    async fn stored_user_record(store: &Arc<dyn RecordStore>, email: &str) -> Record {
        let mut filter = Record::new();
        filter.insert("email".into(), json!(email));
        store.find("users", &filter).await.unwrap().unwrap()
    }

    async fn issued_activation_key(store: &Arc<dyn RecordStore>, email: &str) -> String {
        stored_user_record(store, email)
            .await
            .get("activation_key")
            .and_then(Value::as_str)
            .expect("pending user must hold an activation key")
            .to_string()
    }

    async fn wait_for_mail(mailer: &RecordingMailer) -> (String, String, String) {
        for _ in 0..100 {
            if let Some(first) = mailer.sent.lock().unwrap().first().cloned() {
                return first;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("activation mail never dispatched");
    }

    #[tokio::test]
    async fn register_creates_pending_user_with_retrievable_key() {
        let h = harness();
        let user = h.svc.register(register_request("a@x.com")).await.unwrap();

        assert_eq!(user.active, ActivationState::Pending);
        assert_eq!(user.email, "a@x.com");

        let key = issued_activation_key(&h.store, "a@x.com").await;
        assert_eq!(key.len(), 32); // 128 bits, hex encoded

        let (to, _subject, body) = wait_for_mail(&h.mailer).await;
        assert_eq!(to, "a@x.com");
        assert!(body.contains(&key));
        assert!(body.contains(&user.id.to_string()));
    }

    #[tokio::test]
    async fn register_normalizes_and_validates_input() {
        let h = harness();
        let user = h
            .svc
            .register(RegisterRequest {
                name: "A".into(),
                email: "  A@X.Com ".into(),
                password: "p1-secret".into(),
            })
            .await
            .unwrap();
        assert_eq!(user.email, "a@x.com");

        for bad in [
            RegisterRequest {
                name: "  ".into(),
                email: "b@x.com".into(),
                password: "p1-secret".into(),
            },
            RegisterRequest {
                name: "B".into(),
                email: "not-an-email".into(),
                password: "p1-secret".into(),
            },
            RegisterRequest {
                name: "B".into(),
                email: "b@x.com".into(),
                password: "short".into(),
            },
        ] {
            let err = h.svc.register(bad).await.unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "got {err:?}");
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_and_stores_one_user() {
        let h = harness();
        h.svc.register(register_request("a@x.com")).await.unwrap();
        let err = h.svc.register(register_request("a@x.com")).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let mut filter = Record::new();
        filter.insert("email".into(), json!("a@x.com"));
        let all = h.store.find_all("users", &filter).await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn activation_happy_path_clears_the_key() {
        let h = harness();
        let user = h.svc.register(register_request("a@x.com")).await.unwrap();
        let key = issued_activation_key(&h.store, "a@x.com").await;

        let activated = h.svc.activate(user.id, &key).await.unwrap();
        assert_eq!(activated.active, ActivationState::Active);
        assert!(activated.activation_key.is_none());
    }

    #[tokio::test]
    async fn wrong_key_never_mutates_state() {
        let h = harness();
        let user = h.svc.register(register_request("a@x.com")).await.unwrap();

        let err = h.svc.activate(user.id, "0000").await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let still = h.svc.get_user_info(user.id).await.unwrap();
        assert_eq!(still.active, ActivationState::Pending);
        assert!(still.activation_key.is_some());
    }

    #[tokio::test]
    async fn activation_key_is_single_use() {
        let h = harness();
        let user = h.svc.register(register_request("a@x.com")).await.unwrap();
        let key = issued_activation_key(&h.store, "a@x.com").await;

        h.svc.activate(user.id, &key).await.unwrap();
        let err = h.svc.activate(user.id, &key).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_activation_has_one_winner() {
        let h = harness();
        let user = h.svc.register(register_request("a@x.com")).await.unwrap();
        let key = issued_activation_key(&h.store, "a@x.com").await;

        let barrier = Arc::new(tokio::sync::Barrier::new(2));
        let attempts: Vec<_> = (0..2)
            .map(|_| {
                let svc = h.svc.clone();
                let barrier = barrier.clone();
                let key = key.clone();
                tokio::spawn(async move {
                    barrier.wait().await;
                    svc.activate(user.id, &key).await
                })
            })
            .collect();

        let mut outcomes = Vec::new();
        for attempt in attempts {
            outcomes.push(attempt.await.unwrap());
        }

        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        let loser = outcomes.into_iter().find(Result::is_err).unwrap().unwrap_err();
        assert!(matches!(loser, ApiError::Forbidden(_)));

        let settled = h.svc.get_user_info(user.id).await.unwrap();
        assert_eq!(settled.active, ActivationState::Active);
        assert!(settled.activation_key.is_none());
    }

    #[tokio::test]
    async fn activate_unknown_user_is_not_found() {
        let h = harness();
        let err = h.svc.activate(Uuid::new_v4(), "whatever").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let h = harness();
        let user = h.svc.register(register_request("a@x.com")).await.unwrap();
        let key = issued_activation_key(&h.store, "a@x.com").await;
        h.svc.activate(user.id, &key).await.unwrap();

        let wrong_password = h.svc.login("a@x.com", "not-the-password").await.unwrap_err();
        let unknown_email = h.svc.login("ghost@x.com", "p1-secret").await.unwrap_err();

        match (&wrong_password, &unknown_email) {
            (ApiError::Unauthorized(a), ApiError::Unauthorized(b)) => assert_eq!(a, b),
            other => panic!("expected two Unauthorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn login_while_pending_is_forbidden_not_unauthorized() {
        let h = harness();
        h.svc.register(register_request("a@x.com")).await.unwrap();
        let err = h.svc.login("a@x.com", "p1-secret").await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn full_lifecycle_register_activate_login() {
        let h = harness();
        let user = h.svc.register(register_request("a@x.com")).await.unwrap();
        assert_eq!(user.active, ActivationState::Pending);

        let key = issued_activation_key(&h.store, "a@x.com").await;
        let activated = h.svc.activate(user.id, &key).await.unwrap();
        assert_eq!(activated.active, ActivationState::Active);

        let logged_in = h.svc.login("a@x.com", "p1-secret").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        assert!(h.svc.login("a@x.com", "wrong-password").await.is_err());
    }

    async fn active_user(h: &Harness, email: &str) -> User {
        let user = h.svc.register(register_request(email)).await.unwrap();
        let key = issued_activation_key(&h.store, email).await;
        h.svc.activate(user.id, &key).await.unwrap()
    }

    #[tokio::test]
    async fn owner_gate_rejects_before_any_store_write() {
        let h = harness();
        let user = active_user(&h, "a@x.com").await;
        let stranger = Uuid::new_v4();
        let before = stored_user_record(&h.store, "a@x.com").await;

        let mut patch = Record::new();
        patch.insert("name".into(), json!("Mallory"));
        let err = h
            .svc
            .update_profile(stranger, user.id, patch)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = h
            .svc
            .update_password(stranger, user.id, Some("p2-secret".into()), Some("x".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = h
            .svc
            .update_following(stranger, user.id, Some(Uuid::new_v4()), Some(true))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        let err = h.svc.delete_user(stranger, user.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        // None of the rejected calls may have touched the record.
        let after = stored_user_record(&h.store, "a@x.com").await;
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn profile_patch_is_sparse_and_whitelisted() {
        let h = harness();
        let user = active_user(&h, "a@x.com").await;

        let mut patch = Record::new();
        patch.insert("description".into(), json!("rustacean"));
        patch.insert("email".into(), json!("evil@x.com"));
        patch.insert("password_hash".into(), json!("overwritten"));
        patch.insert("name".into(), Value::Null);
        let updated = h.svc.update_profile(user.id, user.id, patch).await.unwrap();

        assert_eq!(updated.description.as_deref(), Some("rustacean"));
        // Identity fields cannot be smuggled through a profile patch.
        assert_eq!(updated.email, "a@x.com");
        assert_eq!(updated.password_hash, user.password_hash);
        // A null is "no-op", not "clear".
        assert_eq!(updated.name, "A");

        // A second sparse patch leaves earlier fields alone.
        let mut patch = Record::new();
        patch.insert("mvp".into(), json!(true));
        let updated = h.svc.update_profile(user.id, user.id, patch).await.unwrap();
        assert_eq!(updated.description.as_deref(), Some("rustacean"));
        assert_eq!(updated.mvp, Some(true));
    }

    #[tokio::test]
    async fn password_change_requires_and_consumes_the_reset_code() {
        let h = harness();
        let user = active_user(&h, "a@x.com").await;

        // Missing pieces are validation failures.
        let err = h
            .svc
            .update_password(user.id, user.id, None, Some("r".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        // No outstanding reset code: forbidden.
        let err = h
            .svc
            .update_password(user.id, user.id, Some("p2-secret".into()), Some("r".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        // Seed a reset code the way the external issuance flow would.
        let mut seed = Record::new();
        seed.insert("password_reset_key".into(), json!("reset-code-1"));
        h.store.update("users", user.id, seed).await.unwrap();

        let err = h
            .svc
            .update_password(
                user.id,
                user.id,
                Some("p2-secret".into()),
                Some("wrong-code".into()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));

        h.svc
            .update_password(
                user.id,
                user.id,
                Some("p2-secret".into()),
                Some("reset-code-1".into()),
            )
            .await
            .unwrap();

        // New password works, old one does not.
        assert!(h.svc.login("a@x.com", "p2-secret").await.is_ok());
        assert!(h.svc.login("a@x.com", "p1-secret").await.is_err());

        // The code was consumed and cannot be replayed.
        let err = h
            .svc
            .update_password(
                user.id,
                user.id,
                Some("p3-secret".into()),
                Some("reset-code-1".into()),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[tokio::test]
    async fn following_mutations_are_idempotent() {
        let h = harness();
        let user = active_user(&h, "a@x.com").await;
        let other = active_user(&h, "b@x.com").await;

        let u = h
            .svc
            .update_following(user.id, user.id, Some(other.id), Some(true))
            .await
            .unwrap();
        assert_eq!(u.following, vec![other.id]);

        // Adding again is a no-op success.
        let u = h
            .svc
            .update_following(user.id, user.id, Some(other.id), Some(true))
            .await
            .unwrap();
        assert_eq!(u.following, vec![other.id]);

        let u = h
            .svc
            .update_following(user.id, user.id, Some(other.id), Some(false))
            .await
            .unwrap();
        assert!(u.following.is_empty());

        // Removing an absent id still succeeds.
        let u = h
            .svc
            .update_following(user.id, user.id, Some(other.id), Some(false))
            .await
            .unwrap();
        assert!(u.following.is_empty());
    }

    #[tokio::test]
    async fn following_validation() {
        let h = harness();
        let user = active_user(&h, "a@x.com").await;

        let err = h
            .svc
            .update_following(user.id, user.id, None, Some(true))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = h
            .svc
            .update_following(user.id, user.id, Some(user.id), Some(true))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn owner_can_delete_their_account() {
        let h = harness();
        let user = active_user(&h, "a@x.com").await;
        let removed = h.svc.delete_user(user.id, user.id).await.unwrap();
        assert_eq!(removed.id, user.id);

        let err = h.svc.get_user_info(user.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn listing_reads_back_every_user() {
        let h = harness();
        active_user(&h, "a@x.com").await;
        active_user(&h, "b@x.com").await;
        let users = h.svc.get_users().await.unwrap();
        assert_eq!(users.len(), 2);
    }
}
