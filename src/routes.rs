use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use futures_util::TryStreamExt as _;
use sha2::{Digest, Sha256};
use tokio::sync::broadcast;

use crate::auth::{create_jwt, Auth};
use crate::chat::ChatBroker;
use crate::error::ApiError;
use crate::models::*;
use crate::repo::{Repo, RepoError};
use crate::require_role;
use crate::storage::{PhotoStore, PhotoStoreError};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(web::resource("/auth/register").route(web::post().to(register)))
            .service(web::resource("/auth/login").route(web::post().to(login)))
            .service(web::resource("/auth/me").route(web::get().to(auth_me)))
            .service(web::resource("/profiles/me").route(web::put().to(update_profile)))
            .service(web::resource("/profiles/{id}").route(web::get().to(get_profile)))
            .service(
                web::resource("/dogs")
                    .route(web::get().to(list_dogs))
                    .route(web::post().to(create_dog)),
            )
            .service(
                web::resource("/requests")
                    .route(web::get().to(list_requests))
                    .route(web::post().to(create_request)),
            )
            .service(web::resource("/requests/{id}").route(web::get().to(get_request)))
            .service(
                web::resource("/requests/{id}/applications")
                    .route(web::post().to(apply)),
            )
            .service(web::resource("/applications").route(web::get().to(list_applications)))
            .service(web::resource("/requests/{id}/accept").route(web::post().to(accept)))
            .service(web::resource("/requests/{id}/complete").route(web::post().to(complete)))
            .service(
                web::resource("/requests/{id}/messages")
                    .route(web::get().to(list_messages))
                    .route(web::post().to(send_message)),
            )
            .service(
                web::resource("/requests/{id}/messages/stream")
                    .route(web::get().to(stream_messages)),
            )
            .service(web::resource("/photos").route(web::post().to(upload_photo))),
    );
    // public fetch route (no /api/v1 prefix so <img src="/photos/{hash}"> works)
    cfg.route("/photos/{hash}", web::get().to(get_photo));
}

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn Repo>,
    pub photo_store: Arc<dyn PhotoStore>,
    pub chat: Arc<ChatBroker>,
}

// ---------------- Session handling ----------------

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub role: Role,
    pub region_code: Option<String>,
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct SessionResponse {
    pub token: String,
    pub profile: Profile,
}

fn normalized_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    // deliberately loose: the mail exchanger is the real validator
    if email.len() < 3 || !email.contains('@') {
        return Err(ApiError::Validation("a valid email address is required".into()));
    }
    Ok(email)
}

fn validated_nickname(raw: &str) -> Result<String, ApiError> {
    let nickname = raw.trim();
    if nickname.chars().count() < 2 {
        return Err(ApiError::Validation(
            "nickname must be at least 2 characters".into(),
        ));
    }
    Ok(nickname.to_string())
}

/// Fetch the caller's profile, synthesizing and persisting the default
/// one when the row is missing (an account that never finished signup).
async fn profile_or_default(
    repo: &Arc<dyn Repo>,
    user_id: Id,
    role: Role,
) -> Result<Profile, ApiError> {
    match repo.get_profile(user_id).await {
        Ok(profile) => Ok(profile),
        Err(RepoError::NotFound) => {
            let short = user_id.simple().to_string();
            let profile = Profile {
                id: user_id,
                nickname: format!("user-{}", &short[..8]),
                region_code: "unset".into(),
                trust_score: DEFAULT_TRUST_SCORE,
                role,
                created_at: Utc::now(),
            };
            Ok(repo.upsert_profile(profile).await?)
        }
        Err(e) => Err(e.into()),
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = SessionResponse),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn register(
    data: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = payload.into_inner();
    let email = normalized_email(&req.email)?;
    if req.password.len() < 8 {
        return Err(ApiError::Validation(
            "password must be at least 8 characters".into(),
        ));
    }
    let nickname = validated_nickname(&req.nickname)?;

    let password_hash = crate::auth::hash_password(&req.password).map_err(|e| {
        log::error!("password hashing failed: {e}");
        ApiError::Internal
    })?;
    let account = data
        .repo
        .create_account(NewAccount {
            email,
            password_hash,
        })
        .await
        .map_err(|e| match e {
            RepoError::Conflict => ApiError::Conflict("email is already registered".into()),
            other => other.into(),
        })?;

    let profile = data
        .repo
        .upsert_profile(Profile {
            id: account.id,
            nickname,
            region_code: req.region_code.unwrap_or_else(|| "unset".into()),
            trust_score: DEFAULT_TRUST_SCORE,
            role: req.role,
            created_at: account.created_at,
        })
        .await?;

    let token = create_jwt(profile.id, profile.role).map_err(|_| ApiError::Internal)?;
    Ok(HttpResponse::Created().json(SessionResponse { token, profile }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = SessionResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    data: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = payload.into_inner();
    let email = req.email.trim().to_lowercase();
    // unknown email and wrong password are indistinguishable on purpose
    let account = data
        .repo
        .get_account_by_email(&email)
        .await
        .map_err(|e| match e {
            RepoError::NotFound => ApiError::InvalidCredentials,
            other => other.into(),
        })?;
    if !crate::auth::verify_password(&req.password, &account.password_hash) {
        return Err(ApiError::InvalidCredentials);
    }
    let profile = profile_or_default(&data.repo, account.id, Role::Owner).await?;
    let token = create_jwt(profile.id, profile.role).map_err(|_| ApiError::Internal)?;
    Ok(HttpResponse::Ok().json(SessionResponse { token, profile }))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    responses(
        (status = 200, description = "Current user profile", body = Profile),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn auth_me(auth: Auth, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let profile = profile_or_default(&data.repo, auth.0.sub, auth.0.role).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct UpdateProfileRequest {
    pub nickname: Option<String>,
    pub region_code: Option<String>,
}

#[utoipa::path(
    put,
    path = "/api/v1/profiles/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = Profile),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn update_profile(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ApiError> {
    let req = payload.into_inner();
    let mut profile = profile_or_default(&data.repo, auth.0.sub, auth.0.role).await?;
    if let Some(nickname) = req.nickname {
        profile.nickname = validated_nickname(&nickname)?;
    }
    if let Some(region_code) = req.region_code {
        let region_code = region_code.trim();
        if region_code.is_empty() {
            return Err(ApiError::Validation("region must not be empty".into()));
        }
        profile.region_code = region_code.to_string();
    }
    // role and trust score are not self-editable
    let profile = data.repo.upsert_profile(profile).await?;
    Ok(HttpResponse::Ok().json(profile))
}

#[utoipa::path(
    get,
    path = "/api/v1/profiles/{id}",
    params(("id" = Id, Path, description = "Profile id")),
    responses(
        (status = 200, description = "Profile", body = Profile),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn get_profile(
    _auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let profile = data.repo.get_profile(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

// ---------------- Dogs ----------------

#[utoipa::path(
    post,
    path = "/api/v1/dogs",
    request_body = NewDog,
    responses(
        (status = 201, description = "Dog registered", body = Dog),
        (status = 403, description = "Forbidden - owners only"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create_dog(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<NewDog>,
) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Owner);
    let mut new = payload.into_inner();
    new.name = new.name.trim().to_string();
    new.breed = new.breed.trim().to_string();
    if new.name.is_empty() || new.breed.is_empty() {
        return Err(ApiError::Validation("name and breed are required".into()));
    }
    let dog = data.repo.create_dog(auth.0.sub, new).await?;
    Ok(HttpResponse::Created().json(dog))
}

#[utoipa::path(
    get,
    path = "/api/v1/dogs",
    responses(
        (status = 200, description = "The caller's dogs", body = [Dog]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_dogs(auth: Auth, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let dogs = data.repo.list_dogs_by_owner(auth.0.sub).await?;
    Ok(HttpResponse::Ok().json(dogs))
}

// ---------------- Walk requests ----------------

#[utoipa::path(
    post,
    path = "/api/v1/requests",
    request_body = NewWalkRequest,
    responses(
        (status = 201, description = "Walk request posted", body = WalkRequest),
        (status = 403, description = "Forbidden - owners only"),
        (status = 422, description = "Validation failed")
    )
)]
pub async fn create_request(
    auth: Auth,
    data: web::Data<AppState>,
    payload: web::Json<NewWalkRequest>,
) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Owner);
    let mut new = payload.into_inner();

    let dog = data
        .repo
        .get_dog(new.dog_id)
        .await
        .map_err(|_| ApiError::Validation("selected dog does not exist".into()))?;
    if dog.owner_id != auth.0.sub {
        return Err(ApiError::Validation(
            "selected dog belongs to another owner".into(),
        ));
    }
    if !ALLOWED_DURATIONS.contains(&new.duration_min) {
        return Err(ApiError::Validation(
            "duration must be one of 30, 60, 90 or 120 minutes".into(),
        ));
    }
    if new.reward <= 0 {
        return Err(ApiError::Validation("reward must be positive".into()));
    }
    if new.scheduled_at < Utc::now() + Duration::hours(1) {
        return Err(ApiError::Validation(
            "walk must be scheduled at least one hour ahead".into(),
        ));
    }
    new.region = new.region.trim().to_string();
    if new.region.is_empty() {
        return Err(ApiError::Validation("region is required".into()));
    }

    let request = data.repo.create_request(auth.0.sub, new).await?;
    Ok(HttpResponse::Created().json(request))
}

#[derive(Debug, serde::Deserialize)]
pub struct RequestListQuery {
    pub status: Option<WalkStatus>,
}

#[utoipa::path(
    get,
    path = "/api/v1/requests",
    params(("status" = Option<WalkStatus>, Query, description = "Filter by lifecycle state")),
    responses(
        (status = 200, description = "Walk requests, newest first, dog embedded", body = [RequestWithDog]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_requests(
    _auth: Auth,
    data: web::Data<AppState>,
    query: web::Query<RequestListQuery>,
) -> Result<HttpResponse, ApiError> {
    let requests = data.repo.list_requests(query.status).await?;
    Ok(HttpResponse::Ok().json(requests))
}

#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}",
    params(("id" = Id, Path, description = "Walk request id")),
    responses(
        (status = 200, description = "Walk request", body = WalkRequest),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_request(
    _auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let request = data.repo.get_request(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(request))
}

// ---------------- Applications / matching ----------------

#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/applications",
    params(("id" = Id, Path, description = "Walk request id")),
    responses(
        (status = 201, description = "Application submitted", body = Application),
        (status = 403, description = "Forbidden - walkers only"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Already applied or request not open")
    )
)]
pub async fn apply(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Walker);
    let request_id = path.into_inner();
    let application = data
        .repo
        .create_application(request_id, auth.0.sub)
        .await
        .map_err(|e| match e {
            RepoError::Conflict => ApiError::Conflict("already applied to this walk".into()),
            other => other.into(),
        })?;
    Ok(HttpResponse::Created().json(application))
}

#[utoipa::path(
    get,
    path = "/api/v1/applications",
    responses(
        (status = 200, description = "Applications, newest first, walker embedded", body = [ApplicationWithWalker]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_applications(
    _auth: Auth,
    data: web::Data<AppState>,
) -> Result<HttpResponse, ApiError> {
    let applications = data.repo.list_applications().await?;
    Ok(HttpResponse::Ok().json(applications))
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct AcceptRequest {
    pub application_id: Id,
}

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct AcceptResponse {
    pub request: WalkRequest,
    pub application: Application,
}

#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/accept",
    request_body = AcceptRequest,
    params(("id" = Id, Path, description = "Walk request id")),
    responses(
        (status = 200, description = "Walker matched", body = AcceptResponse),
        (status = 403, description = "Forbidden - request owner only"),
        (status = 404, description = "Request or application not found"),
        (status = 409, description = "Request is not open")
    )
)]
pub async fn accept(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<AcceptRequest>,
) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Owner);
    let request_id = path.into_inner();
    let request = data.repo.get_request(request_id).await?;
    if request.owner_id != auth.0.sub {
        return Err(ApiError::Forbidden);
    }
    let (request, application) = data
        .repo
        .accept_application(request_id, payload.application_id)
        .await?;
    Ok(HttpResponse::Ok().json(AcceptResponse {
        request,
        application,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/complete",
    params(("id" = Id, Path, description = "Walk request id")),
    responses(
        (status = 200, description = "Walk completed", body = WalkRequest),
        (status = 403, description = "Forbidden - matched walker only"),
        (status = 404, description = "Request not found"),
        (status = 409, description = "Request is not matched")
    )
)]
pub async fn complete(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    require_role!(auth, Role::Walker);
    let request_id = path.into_inner();
    // only the walker holding the accepted application may complete
    data.repo.get_request(request_id).await?;
    match data.repo.accepted_for_request(request_id).await? {
        Some(accepted) if accepted.walker_id == auth.0.sub => {}
        _ => return Err(ApiError::Forbidden),
    }
    let request = data.repo.complete_request(request_id).await?;
    Ok(HttpResponse::Ok().json(request))
}

// ---------------- Chat ----------------

/// A chat channel belongs to the request's owner and its matched
/// walker, and exists only once the request has left OPEN.
async fn chat_membership(
    data: &web::Data<AppState>,
    request_id: Id,
    user_id: Id,
) -> Result<WalkRequest, ApiError> {
    let request = data.repo.get_request(request_id).await?;
    if request.status == WalkStatus::Open {
        return Err(ApiError::Forbidden);
    }
    if request.owner_id == user_id {
        return Ok(request);
    }
    if let Some(accepted) = data.repo.accepted_for_request(request_id).await? {
        if accepted.walker_id == user_id {
            return Ok(request);
        }
    }
    Err(ApiError::Forbidden)
}

#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}/messages",
    params(("id" = Id, Path, description = "Walk request id")),
    responses(
        (status = 200, description = "Message history, oldest first", body = [MessageWithSender]),
        (status = 403, description = "Not a chat participant"),
        (status = 404, description = "Request not found")
    )
)]
pub async fn list_messages(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let request_id = path.into_inner();
    chat_membership(&data, request_id, auth.0.sub).await?;
    let messages = data.repo.list_messages(request_id).await?;
    Ok(HttpResponse::Ok().json(messages))
}

#[derive(Debug, serde::Deserialize, utoipa::ToSchema)]
pub struct SendMessageRequest {
    pub content: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/requests/{id}/messages",
    request_body = SendMessageRequest,
    params(("id" = Id, Path, description = "Walk request id")),
    responses(
        (status = 201, description = "Message sent", body = MessageWithSender),
        (status = 403, description = "Not a chat participant"),
        (status = 409, description = "Chat is closed"),
        (status = 422, description = "Empty message")
    )
)]
pub async fn send_message(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
    payload: web::Json<SendMessageRequest>,
) -> Result<HttpResponse, ApiError> {
    let request_id = path.into_inner();
    let request = chat_membership(&data, request_id, auth.0.sub).await?;
    if request.status != WalkStatus::Matched {
        return Err(ApiError::Conflict("chat is closed for this walk".into()));
    }
    let content = payload.content.trim().to_string();
    if content.is_empty() {
        return Err(ApiError::Validation("message must not be empty".into()));
    }
    let message = data
        .repo
        .append_message(request_id, auth.0.sub, content)
        .await?;
    data.chat.publish(&message);
    Ok(HttpResponse::Created().json(message))
}

#[utoipa::path(
    get,
    path = "/api/v1/requests/{id}/messages/stream",
    params(("id" = Id, Path, description = "Walk request id")),
    responses(
        (status = 200, description = "Server-sent event stream of new messages"),
        (status = 403, description = "Not a chat participant")
    )
)]
pub async fn stream_messages(
    auth: Auth,
    data: web::Data<AppState>,
    path: web::Path<Id>,
) -> Result<HttpResponse, ApiError> {
    let request_id = path.into_inner();
    chat_membership(&data, request_id, auth.0.sub).await?;
    let rx = data.chat.subscribe(request_id);

    // one SSE frame per message; lagged receivers skip ahead, a closed
    // channel ends the stream (the receiver drop is the teardown)
    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(message) => {
                    let Ok(json) = serde_json::to_string(&message) else {
                        continue;
                    };
                    let frame = web::Bytes::from(format!("data: {json}\n\n"));
                    return Some((Ok::<_, std::convert::Infallible>(frame), rx));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("chat stream lagged, skipped {skipped} messages");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    Ok(HttpResponse::Ok()
        .content_type("text/event-stream")
        .insert_header(("Cache-Control", "no-cache"))
        .streaming(stream))
}

// ---------------- Photos ----------------

#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct PhotoUploadResponse {
    pub hash: String,
    pub mime: String,
    pub size: usize,
    pub url: String,
    pub duplicate: bool, // true when upload was a duplicate (idempotent)
}

const PHOTO_SIZE_LIMIT: usize = 5 * 1024 * 1024; // 5 MB

const ALLOWED_MIME: &[&str] = &["image/png", "image/jpeg", "image/gif", "image/webp"];

#[utoipa::path(
    post,
    path = "/api/v1/photos",
    responses(
        (status = 201, description = "Photo stored (new)", body = PhotoUploadResponse),
        (status = 200, description = "Photo already existed (idempotent)", body = PhotoUploadResponse),
        (status = 415, description = "Unsupported media type"),
        (status = 413, description = "Payload too large")
    )
)]
pub async fn upload_photo(
    _auth: Auth,
    data: web::Data<AppState>,
    mut payload: Multipart,
) -> Result<HttpResponse, ApiError> {
    use actix_web::http::StatusCode;
    let mut bytes: Vec<u8> = Vec::new();
    while let Some(field) = payload.try_next().await.map_err(|e| {
        log::error!("multipart error: {e}");
        ApiError::Internal
    })? {
        if let Some(name) = field.content_disposition().get_name() {
            if name != "file" {
                continue;
            }
        } else {
            continue;
        }
        let mut field_stream = field;
        let mut hasher = Sha256::new();
        while let Some(chunk) = field_stream.try_next().await.map_err(|e| {
            log::error!("stream read error: {e}");
            ApiError::Internal
        })? {
            if bytes.len() + chunk.len() > PHOTO_SIZE_LIMIT {
                return Ok(HttpResponse::build(StatusCode::PAYLOAD_TOO_LARGE).finish());
            }
            hasher.update(&chunk);
            bytes.extend_from_slice(&chunk);
        }
        let hash = format!("{:x}", hasher.finalize());
        let mime = infer::get(&bytes)
            .map(|t| t.mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".into());
        if !ALLOWED_MIME.contains(&mime.as_str()) {
            return Ok(HttpResponse::UnsupportedMediaType().finish());
        }
        let (status_code, duplicate) = match data.photo_store.save(&hash, &mime, &bytes).await {
            Ok(()) => (StatusCode::CREATED, false),
            Err(PhotoStoreError::Duplicate) => (StatusCode::OK, true),
            Err(e) => {
                log::error!("photo_store save error: {e}");
                return Err(ApiError::Internal);
            }
        };
        let resp = PhotoUploadResponse {
            url: format!("/photos/{hash}"),
            hash,
            mime,
            size: bytes.len(),
            duplicate,
        };
        return Ok(HttpResponse::build(status_code).json(resp));
    }
    Ok(HttpResponse::BadRequest().finish())
}

/// Serve a stored photo by content hash. Public: dog photo URLs are
/// embedded in catalog rows.
pub async fn get_photo(
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let hash = path.into_inner();
    // content hashes are lowercase hex; anything else cannot be a key
    if hash.len() < 2 || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ApiError::NotFound);
    }
    match data.photo_store.load(&hash).await {
        Ok((bytes, mime)) => Ok(HttpResponse::Ok()
            .insert_header(("Content-Type", mime))
            .body(bytes)),
        Err(PhotoStoreError::NotFound) => Err(ApiError::NotFound),
        Err(e) => {
            log::error!("photo_store load error: {e}");
            Err(ApiError::Internal)
        }
    }
}
