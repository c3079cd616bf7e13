use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub type Id = Uuid;

/// Display-only reputation score assigned to every fresh profile.
pub const DEFAULT_TRUST_SCORE: f64 = 36.5;

/// Durations (minutes) a walk may be booked for.
pub const ALLOWED_DURATIONS: [i32; 4] = [30, 60, 90, 120];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Owner,
    Walker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::Walker => "WALKER",
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OWNER" => Ok(Role::Owner),
            "WALKER" => Ok(Role::Walker),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum DogSize {
    S,
    M,
    L,
}

impl DogSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            DogSize::S => "S",
            DogSize::M => "M",
            DogSize::L => "L",
        }
    }
}

impl std::str::FromStr for DogSize {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "S" => Ok(DogSize::S),
            "M" => Ok(DogSize::M),
            "L" => Ok(DogSize::L),
            other => Err(format!("unknown dog size: {other}")),
        }
    }
}

/// Walk request lifecycle. Strictly linear: OPEN -> MATCHED -> COMPLETED.
/// There is no CANCELLED state and no back-transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum WalkStatus {
    Open,
    Matched,
    Completed,
}

impl WalkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WalkStatus::Open => "OPEN",
            WalkStatus::Matched => "MATCHED",
            WalkStatus::Completed => "COMPLETED",
        }
    }
}

impl std::str::FromStr for WalkStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(WalkStatus::Open),
            "MATCHED" => Ok(WalkStatus::Matched),
            "COMPLETED" => Ok(WalkStatus::Completed),
            other => Err(format!("unknown walk status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Accepted => "ACCEPTED",
            ApplicationStatus::Rejected => "REJECTED",
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ApplicationStatus::Pending),
            "ACCEPTED" => Ok(ApplicationStatus::Accepted),
            "REJECTED" => Ok(ApplicationStatus::Rejected),
            other => Err(format!("unknown application status: {other}")),
        }
    }
}

/// Identity record. Serialized only into repository snapshots; API
/// responses expose profiles, never accounts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Id,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
}

/// Public projection of a user: what the catalog embeds and what
/// `/auth/me` returns. `id` equals the owning account id.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Profile {
    pub id: Id,
    pub nickname: String,
    pub region_code: String,
    pub trust_score: f64,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Dog {
    pub id: Id,
    pub owner_id: Id,
    pub name: String,
    pub breed: String,
    pub size: DogSize,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewDog {
    pub name: String,
    pub breed: String,
    pub size: DogSize,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalkRequest {
    pub id: Id,
    pub owner_id: Id,
    pub dog_id: Id,
    pub scheduled_at: DateTime<Utc>,
    pub duration_min: i32,
    pub reward: i64,
    pub region: String,
    pub status: WalkStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NewWalkRequest {
    pub dog_id: Id,
    pub scheduled_at: DateTime<Utc>,
    pub duration_min: i32,
    pub reward: i64,
    pub region: String,
}

/// Catalog row: a request with its dog joined in, the shape list
/// endpoints return. The dog is optional only because the Postgres
/// backend joins it with a LEFT JOIN.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RequestWithDog {
    #[serde(flatten)]
    pub request: WalkRequest,
    pub dog: Option<Dog>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Application {
    pub id: Id,
    pub request_id: Id,
    pub walker_id: Id,
    pub status: ApplicationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationWithWalker {
    #[serde(flatten)]
    pub application: Application,
    pub walker: Option<Profile>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub id: Id,
    pub request_id: Id,
    pub sender_id: Id,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

/// Chat message with the sender's profile joined in; both history and
/// the live stream deliver this shape.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageWithSender {
    #[serde(flatten)]
    pub message: ChatMessage,
    pub sender: Option<Profile>,
}
