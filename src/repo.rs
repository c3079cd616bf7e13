use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use uuid::Uuid;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum RepoError {
    #[error("not found")]
    NotFound,
    #[error("conflict")]
    Conflict,
    #[error("{0}")]
    InvalidTransition(&'static str),
    #[error("internal: {0}")]
    Internal(String),
}

pub type RepoResult<T> = Result<T, RepoError>;

use async_trait::async_trait;

#[async_trait]
pub trait AccountRepo: Send + Sync {
    /// Fails with `Conflict` when the email is already registered.
    async fn create_account(&self, new: NewAccount) -> RepoResult<Account>;
    async fn get_account_by_email(&self, email: &str) -> RepoResult<Account>;
}

#[async_trait]
pub trait ProfileRepo: Send + Sync {
    async fn get_profile(&self, id: Id) -> RepoResult<Profile>;
    /// Insert-or-replace keyed by profile id.
    async fn upsert_profile(&self, profile: Profile) -> RepoResult<Profile>;
}

#[async_trait]
pub trait DogRepo: Send + Sync {
    async fn create_dog(&self, owner_id: Id, new: NewDog) -> RepoResult<Dog>;
    async fn get_dog(&self, id: Id) -> RepoResult<Dog>;
    async fn list_dogs_by_owner(&self, owner_id: Id) -> RepoResult<Vec<Dog>>;
}

#[async_trait]
pub trait WalkRequestRepo: Send + Sync {
    async fn create_request(&self, owner_id: Id, new: NewWalkRequest) -> RepoResult<WalkRequest>;
    async fn get_request(&self, id: Id) -> RepoResult<WalkRequest>;
    /// Newest-first, each row carrying its dog.
    async fn list_requests(&self, status: Option<WalkStatus>) -> RepoResult<Vec<RequestWithDog>>;
    /// The whole match step in one operation: the chosen application
    /// becomes ACCEPTED, every sibling REJECTED, the request MATCHED.
    /// Runs under one lock (in-memory) or one transaction (Postgres),
    /// so concurrent accepts serialize and the loser sees the state error.
    async fn accept_application(
        &self,
        request_id: Id,
        application_id: Id,
    ) -> RepoResult<(WalkRequest, Application)>;
    /// MATCHED -> COMPLETED. COMPLETED is terminal.
    async fn complete_request(&self, id: Id) -> RepoResult<WalkRequest>;
}

#[async_trait]
pub trait ApplicationRepo: Send + Sync {
    /// Fails with `Conflict` on a duplicate (request, walker) pair or a
    /// self-application, and with a transition error when the request
    /// is no longer OPEN.
    async fn create_application(&self, request_id: Id, walker_id: Id) -> RepoResult<Application>;
    /// Newest-first, each row carrying the applicant's profile.
    async fn list_applications(&self) -> RepoResult<Vec<ApplicationWithWalker>>;
    async fn accepted_for_request(&self, request_id: Id) -> RepoResult<Option<Application>>;
}

#[async_trait]
pub trait ChatRepo: Send + Sync {
    async fn append_message(
        &self,
        request_id: Id,
        sender_id: Id,
        content: String,
    ) -> RepoResult<MessageWithSender>;
    /// Oldest-first.
    async fn list_messages(&self, request_id: Id) -> RepoResult<Vec<MessageWithSender>>;
}

pub trait Repo:
    AccountRepo + ProfileRepo + DogRepo + WalkRequestRepo + ApplicationRepo + ChatRepo
{
}

impl<T> Repo for T where
    T: AccountRepo + ProfileRepo + DogRepo + WalkRequestRepo + ApplicationRepo + ChatRepo
{
}

#[cfg(feature = "inmem-store")]
pub mod inmem {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::path::{Path, PathBuf};

    const SNAPSHOT_PATH: &str = "data/state.json";

    #[derive(Default, Serialize, Deserialize)]
    struct State {
        accounts: HashMap<Id, Account>,
        profiles: HashMap<Id, Profile>,
        dogs: HashMap<Id, Dog>,
        requests: HashMap<Id, WalkRequest>,
        applications: HashMap<Id, Application>,
        messages: HashMap<Id, ChatMessage>,
    }

    impl State {
        fn profile_of(&self, id: Id) -> Option<Profile> {
            self.profiles.get(&id).cloned()
        }

        fn with_sender(&self, message: ChatMessage) -> MessageWithSender {
            let sender = self.profile_of(message.sender_id);
            MessageWithSender { message, sender }
        }
    }

    /// HashMap-backed repository with a JSON snapshot written on every
    /// mutation and loaded at startup. The snapshot is a warm-start
    /// cache, not an authority: a corrupt file just means starting empty.
    #[derive(Clone)]
    pub struct InMemRepo {
        state: Arc<RwLock<State>>,
        snapshot_path: Arc<PathBuf>,
    }

    impl InMemRepo {
        fn data_dir() -> PathBuf {
            std::env::var("WALKMATE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data"))
        }

        fn snapshot_path() -> PathBuf {
            if std::env::var("WALKMATE_DATA_DIR").is_ok() {
                let mut p = Self::data_dir();
                p.push("state.json");
                p
            } else {
                PathBuf::from(SNAPSHOT_PATH)
            }
        }

        fn load_state_from(path: &Path) -> State {
            match std::fs::read(path) {
                Ok(bytes) => match serde_json::from_slice::<State>(&bytes) {
                    Ok(s) => {
                        log::info!("loaded snapshot '{}'", path.display());
                        s
                    }
                    Err(e) => {
                        log::warn!(
                            "failed to parse snapshot '{}': {e}. Starting empty.",
                            path.display()
                        );
                        State::default()
                    }
                },
                Err(_) => State::default(),
            }
        }

        fn persist(&self) {
            let path = self.snapshot_path.clone();
            if let Ok(s) = serde_json::to_vec_pretty(&*self.state.read().unwrap()) {
                if let Some(dir) = path.parent() {
                    let _ = std::fs::create_dir_all(dir);
                }
                if let Err(e) = std::fs::write(&*path, s) {
                    log::warn!("failed to write snapshot '{}': {e}", path.display());
                }
            }
        }

        pub fn new() -> Self {
            let snapshot_path = Self::snapshot_path();
            let state = Self::load_state_from(&snapshot_path);
            Self {
                state: Arc::new(RwLock::new(state)),
                snapshot_path: Arc::new(snapshot_path),
            }
        }
    }

    impl Default for InMemRepo {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl AccountRepo for InMemRepo {
        async fn create_account(&self, new: NewAccount) -> RepoResult<Account> {
            let mut s = self.state.write().unwrap();
            if s.accounts.values().any(|a| a.email == new.email) {
                return Err(RepoError::Conflict);
            }
            let account = Account {
                id: Uuid::new_v4(),
                email: new.email,
                password_hash: new.password_hash,
                created_at: Utc::now(),
            };
            s.accounts.insert(account.id, account.clone());
            drop(s); // release lock before persisting
            self.persist();
            Ok(account)
        }

        async fn get_account_by_email(&self, email: &str) -> RepoResult<Account> {
            let s = self.state.read().unwrap();
            s.accounts
                .values()
                .find(|a| a.email == email)
                .cloned()
                .ok_or(RepoError::NotFound)
        }
    }

    #[async_trait]
    impl ProfileRepo for InMemRepo {
        async fn get_profile(&self, id: Id) -> RepoResult<Profile> {
            let s = self.state.read().unwrap();
            s.profiles.get(&id).cloned().ok_or(RepoError::NotFound)
        }

        async fn upsert_profile(&self, profile: Profile) -> RepoResult<Profile> {
            let mut s = self.state.write().unwrap();
            s.profiles.insert(profile.id, profile.clone());
            drop(s);
            self.persist();
            Ok(profile)
        }
    }

    #[async_trait]
    impl DogRepo for InMemRepo {
        async fn create_dog(&self, owner_id: Id, new: NewDog) -> RepoResult<Dog> {
            let mut s = self.state.write().unwrap();
            let dog = Dog {
                id: Uuid::new_v4(),
                owner_id,
                name: new.name,
                breed: new.breed,
                size: new.size,
                notes: new.notes,
                image_url: new.image_url,
                created_at: Utc::now(),
            };
            s.dogs.insert(dog.id, dog.clone());
            drop(s);
            self.persist();
            Ok(dog)
        }

        async fn get_dog(&self, id: Id) -> RepoResult<Dog> {
            let s = self.state.read().unwrap();
            s.dogs.get(&id).cloned().ok_or(RepoError::NotFound)
        }

        async fn list_dogs_by_owner(&self, owner_id: Id) -> RepoResult<Vec<Dog>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .dogs
                .values()
                .filter(|d| d.owner_id == owner_id)
                .cloned()
                .collect();
            v.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(v)
        }
    }

    #[async_trait]
    impl WalkRequestRepo for InMemRepo {
        async fn create_request(
            &self,
            owner_id: Id,
            new: NewWalkRequest,
        ) -> RepoResult<WalkRequest> {
            let mut s = self.state.write().unwrap();
            if !s.dogs.contains_key(&new.dog_id) {
                return Err(RepoError::NotFound);
            }
            let request = WalkRequest {
                id: Uuid::new_v4(),
                owner_id,
                dog_id: new.dog_id,
                scheduled_at: new.scheduled_at,
                duration_min: new.duration_min,
                reward: new.reward,
                region: new.region,
                status: WalkStatus::Open,
                created_at: Utc::now(),
            };
            s.requests.insert(request.id, request.clone());
            drop(s);
            self.persist();
            Ok(request)
        }

        async fn get_request(&self, id: Id) -> RepoResult<WalkRequest> {
            let s = self.state.read().unwrap();
            s.requests.get(&id).cloned().ok_or(RepoError::NotFound)
        }

        async fn list_requests(
            &self,
            status: Option<WalkStatus>,
        ) -> RepoResult<Vec<RequestWithDog>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .requests
                .values()
                .filter(|r| status.map_or(true, |wanted| r.status == wanted))
                .cloned()
                .collect();
            // newest first
            v.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(v
                .into_iter()
                .map(|request| {
                    let dog = s.dogs.get(&request.dog_id).cloned();
                    RequestWithDog { request, dog }
                })
                .collect())
        }

        async fn accept_application(
            &self,
            request_id: Id,
            application_id: Id,
        ) -> RepoResult<(WalkRequest, Application)> {
            let mut s = self.state.write().unwrap();
            let chosen = s
                .applications
                .get(&application_id)
                .cloned()
                .ok_or(RepoError::NotFound)?;
            if chosen.request_id != request_id {
                return Err(RepoError::NotFound);
            }
            let request = s
                .requests
                .get(&request_id)
                .cloned()
                .ok_or(RepoError::NotFound)?;
            if request.status != WalkStatus::Open {
                return Err(RepoError::InvalidTransition(
                    "walk is no longer open for matching",
                ));
            }
            if chosen.status != ApplicationStatus::Pending {
                return Err(RepoError::InvalidTransition("application is not pending"));
            }
            for app in s
                .applications
                .values_mut()
                .filter(|a| a.request_id == request_id)
            {
                app.status = if app.id == application_id {
                    ApplicationStatus::Accepted
                } else {
                    ApplicationStatus::Rejected
                };
            }
            let request = s
                .requests
                .get_mut(&request_id)
                .ok_or(RepoError::NotFound)?;
            request.status = WalkStatus::Matched;
            let request = request.clone();
            let accepted = s
                .applications
                .get(&application_id)
                .cloned()
                .ok_or(RepoError::NotFound)?;
            drop(s);
            self.persist();
            Ok((request, accepted))
        }

        async fn complete_request(&self, id: Id) -> RepoResult<WalkRequest> {
            let mut s = self.state.write().unwrap();
            let request = s.requests.get_mut(&id).ok_or(RepoError::NotFound)?;
            if request.status != WalkStatus::Matched {
                return Err(RepoError::InvalidTransition(
                    "only a matched walk can be completed",
                ));
            }
            request.status = WalkStatus::Completed;
            let request = request.clone();
            drop(s);
            self.persist();
            Ok(request)
        }
    }

    #[async_trait]
    impl ApplicationRepo for InMemRepo {
        async fn create_application(
            &self,
            request_id: Id,
            walker_id: Id,
        ) -> RepoResult<Application> {
            let mut s = self.state.write().unwrap();
            let request = s
                .requests
                .get(&request_id)
                .cloned()
                .ok_or(RepoError::NotFound)?;
            if request.status != WalkStatus::Open {
                return Err(RepoError::InvalidTransition(
                    "walk is no longer open for applications",
                ));
            }
            if request.owner_id == walker_id {
                return Err(RepoError::Conflict);
            }
            // one application per (request, walker)
            if s.applications
                .values()
                .any(|a| a.request_id == request_id && a.walker_id == walker_id)
            {
                return Err(RepoError::Conflict);
            }
            let application = Application {
                id: Uuid::new_v4(),
                request_id,
                walker_id,
                status: ApplicationStatus::Pending,
                created_at: Utc::now(),
            };
            s.applications.insert(application.id, application.clone());
            drop(s);
            self.persist();
            Ok(application)
        }

        async fn list_applications(&self) -> RepoResult<Vec<ApplicationWithWalker>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s.applications.values().cloned().collect();
            // newest first
            v.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            Ok(v
                .into_iter()
                .map(|application| {
                    let walker = s.profile_of(application.walker_id);
                    ApplicationWithWalker {
                        application,
                        walker,
                    }
                })
                .collect())
        }

        async fn accepted_for_request(&self, request_id: Id) -> RepoResult<Option<Application>> {
            let s = self.state.read().unwrap();
            Ok(s.applications
                .values()
                .find(|a| {
                    a.request_id == request_id && a.status == ApplicationStatus::Accepted
                })
                .cloned())
        }
    }

    #[async_trait]
    impl ChatRepo for InMemRepo {
        async fn append_message(
            &self,
            request_id: Id,
            sender_id: Id,
            content: String,
        ) -> RepoResult<MessageWithSender> {
            let mut s = self.state.write().unwrap();
            if !s.requests.contains_key(&request_id) {
                return Err(RepoError::NotFound);
            }
            let message = ChatMessage {
                id: Uuid::new_v4(),
                request_id,
                sender_id,
                content,
                created_at: Utc::now(),
            };
            s.messages.insert(message.id, message.clone());
            let with_sender = s.with_sender(message);
            drop(s);
            self.persist();
            Ok(with_sender)
        }

        async fn list_messages(&self, request_id: Id) -> RepoResult<Vec<MessageWithSender>> {
            let s = self.state.read().unwrap();
            let mut v: Vec<_> = s
                .messages
                .values()
                .filter(|m| m.request_id == request_id)
                .cloned()
                .collect();
            // ascending, creation order
            v.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
            Ok(v.into_iter().map(|m| s.with_sender(m)).collect())
        }
    }
}

// Postgres implementation (feature = "postgres-store")
#[cfg(feature = "postgres-store")]
pub mod pg {
    use super::*;
    use sqlx::postgres::PgRow;
    use sqlx::{Pool, Postgres, Row};

    impl From<sqlx::Error> for RepoError {
        fn from(e: sqlx::Error) -> Self {
            match &e {
                sqlx::Error::RowNotFound => RepoError::NotFound,
                sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                    RepoError::Conflict
                }
                _ => RepoError::Internal(e.to_string()),
            }
        }
    }

    fn parse<T: std::str::FromStr<Err = String>>(raw: String) -> RepoResult<T> {
        raw.parse().map_err(RepoError::Internal)
    }

    #[derive(Clone)]
    pub struct PgRepo {
        pool: Pool<Postgres>,
    }

    impl PgRepo {
        pub fn new(pool: Pool<Postgres>) -> Self {
            Self { pool }
        }
    }

    pub async fn migrate(pool: &Pool<Postgres>) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(pool).await
    }

    fn map_account(row: &PgRow) -> RepoResult<Account> {
        Ok(Account {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn map_profile(row: &PgRow) -> RepoResult<Profile> {
        Ok(Profile {
            id: row.try_get("id")?,
            nickname: row.try_get("nickname")?,
            region_code: row.try_get("region_code")?,
            trust_score: row.try_get("trust_score")?,
            role: parse(row.try_get::<String, _>("role")?)?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn map_dog(row: &PgRow) -> RepoResult<Dog> {
        Ok(Dog {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            name: row.try_get("name")?,
            breed: row.try_get("breed")?,
            size: parse(row.try_get::<String, _>("size")?)?,
            notes: row.try_get("notes")?,
            image_url: row.try_get("image_url")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn map_request(row: &PgRow) -> RepoResult<WalkRequest> {
        Ok(WalkRequest {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            dog_id: row.try_get("dog_id")?,
            scheduled_at: row.try_get("scheduled_at")?,
            duration_min: row.try_get("duration_min")?,
            reward: row.try_get("reward")?,
            region: row.try_get("region")?,
            status: parse(row.try_get::<String, _>("status")?)?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn map_application(row: &PgRow) -> RepoResult<Application> {
        Ok(Application {
            id: row.try_get("id")?,
            request_id: row.try_get("request_id")?,
            walker_id: row.try_get("walker_id")?,
            status: parse(row.try_get::<String, _>("status")?)?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn map_message(row: &PgRow) -> RepoResult<ChatMessage> {
        Ok(ChatMessage {
            id: row.try_get("id")?,
            request_id: row.try_get("request_id")?,
            sender_id: row.try_get("sender_id")?,
            content: row.try_get("content")?,
            created_at: row.try_get("created_at")?,
        })
    }

    // Profile columns joined with a prefix; absent when the LEFT JOIN missed.
    fn map_joined_profile(row: &PgRow, prefix: &str) -> RepoResult<Option<Profile>> {
        let id: Option<Id> = row.try_get(format!("{prefix}id").as_str())?;
        let Some(id) = id else { return Ok(None) };
        Ok(Some(Profile {
            id,
            nickname: row.try_get(format!("{prefix}nickname").as_str())?,
            region_code: row.try_get(format!("{prefix}region_code").as_str())?,
            trust_score: row.try_get(format!("{prefix}trust_score").as_str())?,
            role: parse(row.try_get::<String, _>(format!("{prefix}role").as_str())?)?,
            created_at: row.try_get(format!("{prefix}created_at").as_str())?,
        }))
    }

    #[async_trait]
    impl AccountRepo for PgRepo {
        async fn create_account(&self, new: NewAccount) -> RepoResult<Account> {
            let row = sqlx::query(
                "INSERT INTO accounts (id, email, password_hash, created_at)
                 VALUES ($1, $2, $3, now())
                 RETURNING id, email, password_hash, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(&new.email)
            .bind(&new.password_hash)
            .fetch_one(&self.pool)
            .await?;
            map_account(&row)
        }

        async fn get_account_by_email(&self, email: &str) -> RepoResult<Account> {
            let row = sqlx::query(
                "SELECT id, email, password_hash, created_at FROM accounts WHERE email = $1",
            )
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
            map_account(&row)
        }
    }

    #[async_trait]
    impl ProfileRepo for PgRepo {
        async fn get_profile(&self, id: Id) -> RepoResult<Profile> {
            let row = sqlx::query(
                "SELECT id, nickname, region_code, trust_score, role, created_at
                 FROM profiles WHERE id = $1",
            )
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
            map_profile(&row)
        }

        async fn upsert_profile(&self, profile: Profile) -> RepoResult<Profile> {
            let row = sqlx::query(
                "INSERT INTO profiles (id, nickname, region_code, trust_score, role, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (id) DO UPDATE
                   SET nickname = EXCLUDED.nickname,
                       region_code = EXCLUDED.region_code,
                       trust_score = EXCLUDED.trust_score,
                       role = EXCLUDED.role
                 RETURNING id, nickname, region_code, trust_score, role, created_at",
            )
            .bind(profile.id)
            .bind(&profile.nickname)
            .bind(&profile.region_code)
            .bind(profile.trust_score)
            .bind(profile.role.as_str())
            .bind(profile.created_at)
            .fetch_one(&self.pool)
            .await?;
            map_profile(&row)
        }
    }

    #[async_trait]
    impl DogRepo for PgRepo {
        async fn create_dog(&self, owner_id: Id, new: NewDog) -> RepoResult<Dog> {
            let row = sqlx::query(
                "INSERT INTO dogs (id, owner_id, name, breed, size, notes, image_url, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, now())
                 RETURNING id, owner_id, name, breed, size, notes, image_url, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(&new.name)
            .bind(&new.breed)
            .bind(new.size.as_str())
            .bind(&new.notes)
            .bind(&new.image_url)
            .fetch_one(&self.pool)
            .await?;
            map_dog(&row)
        }

        async fn get_dog(&self, id: Id) -> RepoResult<Dog> {
            let row = sqlx::query(
                "SELECT id, owner_id, name, breed, size, notes, image_url, created_at
                 FROM dogs WHERE id = $1",
            )
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
            map_dog(&row)
        }

        async fn list_dogs_by_owner(&self, owner_id: Id) -> RepoResult<Vec<Dog>> {
            let rows = sqlx::query(
                "SELECT id, owner_id, name, breed, size, notes, image_url, created_at
                 FROM dogs WHERE owner_id = $1 ORDER BY created_at, id",
            )
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
            rows.iter().map(map_dog).collect()
        }
    }

    const REQUEST_WITH_DOG: &str = "
        SELECT r.id, r.owner_id, r.dog_id, r.scheduled_at, r.duration_min, r.reward,
               r.region, r.status, r.created_at,
               d.id AS dog_row_id, d.owner_id AS dog_owner_id, d.name AS dog_name,
               d.breed AS dog_breed, d.size AS dog_size, d.notes AS dog_notes,
               d.image_url AS dog_image_url, d.created_at AS dog_created_at
        FROM walk_requests r
        LEFT JOIN dogs d ON d.id = r.dog_id";

    fn map_request_with_dog(row: &PgRow) -> RepoResult<RequestWithDog> {
        let request = map_request(row)?;
        let dog_id: Option<Id> = row.try_get("dog_row_id")?;
        let dog = match dog_id {
            Some(id) => Some(Dog {
                id,
                owner_id: row.try_get("dog_owner_id")?,
                name: row.try_get("dog_name")?,
                breed: row.try_get("dog_breed")?,
                size: parse(row.try_get::<String, _>("dog_size")?)?,
                notes: row.try_get("dog_notes")?,
                image_url: row.try_get("dog_image_url")?,
                created_at: row.try_get("dog_created_at")?,
            }),
            None => None,
        };
        Ok(RequestWithDog { request, dog })
    }

    #[async_trait]
    impl WalkRequestRepo for PgRepo {
        async fn create_request(
            &self,
            owner_id: Id,
            new: NewWalkRequest,
        ) -> RepoResult<WalkRequest> {
            let row = sqlx::query(
                "INSERT INTO walk_requests
                   (id, owner_id, dog_id, scheduled_at, duration_min, reward, region, status, created_at)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, 'OPEN', now())
                 RETURNING id, owner_id, dog_id, scheduled_at, duration_min, reward, region, status, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(owner_id)
            .bind(new.dog_id)
            .bind(new.scheduled_at)
            .bind(new.duration_min)
            .bind(new.reward)
            .bind(&new.region)
            .fetch_one(&self.pool)
            .await?;
            map_request(&row)
        }

        async fn get_request(&self, id: Id) -> RepoResult<WalkRequest> {
            let row = sqlx::query(
                "SELECT id, owner_id, dog_id, scheduled_at, duration_min, reward, region, status, created_at
                 FROM walk_requests WHERE id = $1",
            )
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
            map_request(&row)
        }

        async fn list_requests(
            &self,
            status: Option<WalkStatus>,
        ) -> RepoResult<Vec<RequestWithDog>> {
            let rows = match status {
                Some(wanted) => {
                    let sql =
                        format!("{REQUEST_WITH_DOG} WHERE r.status = $1 ORDER BY r.created_at DESC, r.id DESC");
                    sqlx::query(&sql)
                        .bind(wanted.as_str())
                        .fetch_all(&self.pool)
                        .await?
                }
                None => {
                    let sql = format!("{REQUEST_WITH_DOG} ORDER BY r.created_at DESC, r.id DESC");
                    sqlx::query(&sql).fetch_all(&self.pool).await?
                }
            };
            rows.iter().map(map_request_with_dog).collect()
        }

        async fn accept_application(
            &self,
            request_id: Id,
            application_id: Id,
        ) -> RepoResult<(WalkRequest, Application)> {
            let mut tx = self.pool.begin().await?;
            let request = map_request(
                &sqlx::query(
                    "SELECT id, owner_id, dog_id, scheduled_at, duration_min, reward, region, status, created_at
                     FROM walk_requests WHERE id = $1 FOR UPDATE",
                )
                .bind(request_id)
                .fetch_one(&mut *tx)
                .await?,
            )?;
            if request.status != WalkStatus::Open {
                return Err(RepoError::InvalidTransition(
                    "walk is no longer open for matching",
                ));
            }
            let chosen = map_application(
                &sqlx::query(
                    "SELECT id, request_id, walker_id, status, created_at
                     FROM applications WHERE id = $1 FOR UPDATE",
                )
                .bind(application_id)
                .fetch_one(&mut *tx)
                .await?,
            )?;
            if chosen.request_id != request_id {
                return Err(RepoError::NotFound);
            }
            if chosen.status != ApplicationStatus::Pending {
                return Err(RepoError::InvalidTransition("application is not pending"));
            }
            sqlx::query(
                "UPDATE applications SET status = 'REJECTED' WHERE request_id = $1 AND id <> $2",
            )
            .bind(request_id)
            .bind(application_id)
            .execute(&mut *tx)
            .await?;
            let accepted = map_application(
                &sqlx::query(
                    "UPDATE applications SET status = 'ACCEPTED' WHERE id = $1
                     RETURNING id, request_id, walker_id, status, created_at",
                )
                .bind(application_id)
                .fetch_one(&mut *tx)
                .await?,
            )?;
            let request = map_request(
                &sqlx::query(
                    "UPDATE walk_requests SET status = 'MATCHED' WHERE id = $1
                     RETURNING id, owner_id, dog_id, scheduled_at, duration_min, reward, region, status, created_at",
                )
                .bind(request_id)
                .fetch_one(&mut *tx)
                .await?,
            )?;
            tx.commit().await?;
            Ok((request, accepted))
        }

        async fn complete_request(&self, id: Id) -> RepoResult<WalkRequest> {
            let mut tx = self.pool.begin().await?;
            let current = map_request(
                &sqlx::query(
                    "SELECT id, owner_id, dog_id, scheduled_at, duration_min, reward, region, status, created_at
                     FROM walk_requests WHERE id = $1 FOR UPDATE",
                )
                .bind(id)
                .fetch_one(&mut *tx)
                .await?,
            )?;
            if current.status != WalkStatus::Matched {
                return Err(RepoError::InvalidTransition(
                    "only a matched walk can be completed",
                ));
            }
            let request = map_request(
                &sqlx::query(
                    "UPDATE walk_requests SET status = 'COMPLETED' WHERE id = $1
                     RETURNING id, owner_id, dog_id, scheduled_at, duration_min, reward, region, status, created_at",
                )
                .bind(id)
                .fetch_one(&mut *tx)
                .await?,
            )?;
            tx.commit().await?;
            Ok(request)
        }
    }

    #[async_trait]
    impl ApplicationRepo for PgRepo {
        async fn create_application(
            &self,
            request_id: Id,
            walker_id: Id,
        ) -> RepoResult<Application> {
            let mut tx = self.pool.begin().await?;
            let request = map_request(
                &sqlx::query(
                    "SELECT id, owner_id, dog_id, scheduled_at, duration_min, reward, region, status, created_at
                     FROM walk_requests WHERE id = $1 FOR UPDATE",
                )
                .bind(request_id)
                .fetch_one(&mut *tx)
                .await?,
            )?;
            if request.status != WalkStatus::Open {
                return Err(RepoError::InvalidTransition(
                    "walk is no longer open for applications",
                ));
            }
            if request.owner_id == walker_id {
                return Err(RepoError::Conflict);
            }
            // duplicate (request_id, walker_id) trips the unique index -> Conflict
            let application = map_application(
                &sqlx::query(
                    "INSERT INTO applications (id, request_id, walker_id, status, created_at)
                     VALUES ($1, $2, $3, 'PENDING', now())
                     RETURNING id, request_id, walker_id, status, created_at",
                )
                .bind(Uuid::new_v4())
                .bind(request_id)
                .bind(walker_id)
                .fetch_one(&mut *tx)
                .await?,
            )?;
            tx.commit().await?;
            Ok(application)
        }

        async fn list_applications(&self) -> RepoResult<Vec<ApplicationWithWalker>> {
            let rows = sqlx::query(
                "SELECT a.id, a.request_id, a.walker_id, a.status, a.created_at,
                        p.id AS walker_profile_id, p.nickname AS walker_profile_nickname,
                        p.region_code AS walker_profile_region_code,
                        p.trust_score AS walker_profile_trust_score,
                        p.role AS walker_profile_role,
                        p.created_at AS walker_profile_created_at
                 FROM applications a
                 LEFT JOIN profiles p ON p.id = a.walker_id
                 ORDER BY a.created_at DESC, a.id DESC",
            )
            .fetch_all(&self.pool)
            .await?;
            rows.iter()
                .map(|row| {
                    Ok(ApplicationWithWalker {
                        application: map_application(row)?,
                        walker: map_joined_profile(row, "walker_profile_")?,
                    })
                })
                .collect()
        }

        async fn accepted_for_request(&self, request_id: Id) -> RepoResult<Option<Application>> {
            let row = sqlx::query(
                "SELECT id, request_id, walker_id, status, created_at
                 FROM applications WHERE request_id = $1 AND status = 'ACCEPTED'",
            )
            .bind(request_id)
            .fetch_optional(&self.pool)
            .await?;
            row.as_ref().map(map_application).transpose()
        }
    }

    #[async_trait]
    impl ChatRepo for PgRepo {
        async fn append_message(
            &self,
            request_id: Id,
            sender_id: Id,
            content: String,
        ) -> RepoResult<MessageWithSender> {
            let row = sqlx::query(
                "INSERT INTO chat_messages (id, request_id, sender_id, content, created_at)
                 VALUES ($1, $2, $3, $4, now())
                 RETURNING id, request_id, sender_id, content, created_at",
            )
            .bind(Uuid::new_v4())
            .bind(request_id)
            .bind(sender_id)
            .bind(&content)
            .fetch_one(&self.pool)
            .await?;
            let message = map_message(&row)?;
            let sender = match self.get_profile(sender_id).await {
                Ok(p) => Some(p),
                Err(RepoError::NotFound) => None,
                Err(e) => return Err(e),
            };
            Ok(MessageWithSender { message, sender })
        }

        async fn list_messages(&self, request_id: Id) -> RepoResult<Vec<MessageWithSender>> {
            let rows = sqlx::query(
                "SELECT m.id, m.request_id, m.sender_id, m.content, m.created_at,
                        p.id AS sender_profile_id, p.nickname AS sender_profile_nickname,
                        p.region_code AS sender_profile_region_code,
                        p.trust_score AS sender_profile_trust_score,
                        p.role AS sender_profile_role,
                        p.created_at AS sender_profile_created_at
                 FROM chat_messages m
                 LEFT JOIN profiles p ON p.id = m.sender_id
                 WHERE m.request_id = $1
                 ORDER BY m.created_at, m.id",
            )
            .bind(request_id)
            .fetch_all(&self.pool)
            .await?;
            rows.iter()
                .map(|row| {
                    Ok(MessageWithSender {
                        message: map_message(row)?,
                        sender: map_joined_profile(row, "sender_profile_")?,
                    })
                })
                .collect()
        }
    }
}
