#![cfg(feature = "inmem-store")]

use chrono::{Duration, Utc};
use uuid::Uuid;
use walkmate::models::*;
use serial_test::serial;
use walkmate::repo::{inmem::InMemRepo, RepoError};
// Bring trait method namespaces into scope so calls on InMemRepo resolve.
use walkmate::repo::{
    AccountRepo, ApplicationRepo, ChatRepo, DogRepo, ProfileRepo, WalkRequestRepo,
};

/// Helper that returns a fresh, empty repository for every test run.
fn repo() -> InMemRepo {
    // isolate state: do **not** persist to the default file path
    std::env::set_var("WALKMATE_DATA_DIR", tempfile::tempdir().unwrap().path());
    InMemRepo::new()
}

async fn profile(r: &InMemRepo, nickname: &str, role: Role) -> Profile {
    r.upsert_profile(Profile {
        id: Uuid::new_v4(),
        nickname: nickname.into(),
        region_code: "SEOUL_GANGNAM".into(),
        trust_score: DEFAULT_TRUST_SCORE,
        role,
        created_at: Utc::now(),
    })
    .await
    .unwrap()
}

async fn dog_of(r: &InMemRepo, owner: &Profile) -> Dog {
    r.create_dog(
        owner.id,
        NewDog {
            name: "초코".into(),
            breed: "푸들".into(),
            size: DogSize::S,
            notes: Some("사람을 아주 좋아해요!".into()),
            image_url: None,
        },
    )
    .await
    .unwrap()
}

async fn open_request(r: &InMemRepo, owner: &Profile, dog: &Dog) -> WalkRequest {
    r.create_request(
        owner.id,
        NewWalkRequest {
            dog_id: dog.id,
            scheduled_at: Utc::now() + Duration::hours(2),
            duration_min: 60,
            reward: 15000,
            region: "강남구".into(),
        },
    )
    .await
    .unwrap()
}

#[tokio::test]
#[serial]
async fn account_create_and_email_conflict() {
    let r = repo();

    let account = r
        .create_account(NewAccount {
            email: "owner@example.com".into(),
            password_hash: "argon2-hash".into(),
        })
        .await
        .unwrap();
    assert_eq!(account.email, "owner@example.com");

    // duplicate email -> conflict
    let err = r
        .create_account(NewAccount {
            email: "owner@example.com".into(),
            password_hash: "other-hash".into(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepoError::Conflict));

    let found = r.get_account_by_email("owner@example.com").await.unwrap();
    assert_eq!(found.id, account.id);
    assert!(matches!(
        r.get_account_by_email("nobody@example.com").await,
        Err(RepoError::NotFound)
    ));
}

#[tokio::test]
#[serial]
async fn profile_upsert_is_insert_or_replace() {
    let r = repo();
    let mut p = profile(&r, "행복한견주", Role::Owner).await;
    assert_eq!(r.get_profile(p.id).await.unwrap().nickname, "행복한견주");

    p.nickname = "더행복한견주".into();
    p.region_code = "서초구".into();
    r.upsert_profile(p.clone()).await.unwrap();

    let again = r.get_profile(p.id).await.unwrap();
    assert_eq!(again.nickname, "더행복한견주");
    assert_eq!(again.region_code, "서초구");
}

#[tokio::test]
#[serial]
async fn dogs_are_listed_per_owner() {
    let r = repo();
    let owner = profile(&r, "견주1", Role::Owner).await;
    let other = profile(&r, "견주2", Role::Owner).await;

    let first = dog_of(&r, &owner).await;
    let second = dog_of(&r, &owner).await;
    dog_of(&r, &other).await;

    let dogs = r.list_dogs_by_owner(owner.id).await.unwrap();
    assert_eq!(dogs.len(), 2);
    assert_eq!(dogs[0].id, first.id);
    assert_eq!(dogs[1].id, second.id);
    assert!(dogs.iter().all(|d| d.owner_id == owner.id));
}

#[tokio::test]
#[serial]
async fn request_catalog_embeds_dog_newest_first() {
    let r = repo();
    let owner = profile(&r, "견주", Role::Owner).await;
    let dog = dog_of(&r, &owner).await;

    let first = open_request(&r, &owner, &dog).await;
    let second = open_request(&r, &owner, &dog).await;

    let catalog = r.list_requests(None).await.unwrap();
    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog[0].request.id, second.id);
    assert_eq!(catalog[1].request.id, first.id);
    assert_eq!(catalog[0].dog.as_ref().unwrap().name, "초코");

    // status filter
    let open_only = r.list_requests(Some(WalkStatus::Open)).await.unwrap();
    assert_eq!(open_only.len(), 2);
    let completed = r.list_requests(Some(WalkStatus::Completed)).await.unwrap();
    assert!(completed.is_empty());
}

#[tokio::test]
#[serial]
async fn application_rules() {
    let r = repo();
    let owner = profile(&r, "견주", Role::Owner).await;
    let walker = profile(&r, "산책러", Role::Walker).await;
    let dog = dog_of(&r, &owner).await;
    let request = open_request(&r, &owner, &dog).await;

    let app = r.create_application(request.id, walker.id).await.unwrap();
    assert_eq!(app.status, ApplicationStatus::Pending);

    // one application per (request, walker)
    assert!(matches!(
        r.create_application(request.id, walker.id).await,
        Err(RepoError::Conflict)
    ));
    // the owner cannot apply to their own request
    assert!(matches!(
        r.create_application(request.id, owner.id).await,
        Err(RepoError::Conflict)
    ));
    // unknown request
    assert!(matches!(
        r.create_application(Uuid::new_v4(), walker.id).await,
        Err(RepoError::NotFound)
    ));
}

#[tokio::test]
#[serial]
async fn accept_matches_one_and_rejects_the_rest() {
    let r = repo();
    let owner = profile(&r, "견주", Role::Owner).await;
    let dog = dog_of(&r, &owner).await;
    let request = open_request(&r, &owner, &dog).await;

    let w1 = profile(&r, "산책러1", Role::Walker).await;
    let w2 = profile(&r, "산책러2", Role::Walker).await;
    let w3 = profile(&r, "산책러3", Role::Walker).await;
    r.create_application(request.id, w1.id).await.unwrap();
    let chosen = r.create_application(request.id, w2.id).await.unwrap();
    r.create_application(request.id, w3.id).await.unwrap();

    let (matched, accepted) = r.accept_application(request.id, chosen.id).await.unwrap();
    assert_eq!(matched.status, WalkStatus::Matched);
    assert_eq!(accepted.id, chosen.id);
    assert_eq!(accepted.status, ApplicationStatus::Accepted);

    // exactly one accepted, everyone else rejected
    let all = r.list_applications().await.unwrap();
    let for_request: Vec<_> = all
        .iter()
        .filter(|a| a.application.request_id == request.id)
        .collect();
    assert_eq!(for_request.len(), 3);
    let accepted_count = for_request
        .iter()
        .filter(|a| a.application.status == ApplicationStatus::Accepted)
        .count();
    let rejected_count = for_request
        .iter()
        .filter(|a| a.application.status == ApplicationStatus::Rejected)
        .count();
    assert_eq!(accepted_count, 1);
    assert_eq!(rejected_count, 2);

    let held = r.accepted_for_request(request.id).await.unwrap().unwrap();
    assert_eq!(held.walker_id, w2.id);

    // matching again is an invalid transition
    let losing = for_request
        .iter()
        .find(|a| a.application.status == ApplicationStatus::Rejected)
        .unwrap();
    assert!(matches!(
        r.accept_application(request.id, losing.application.id).await,
        Err(RepoError::InvalidTransition(_))
    ));

    // applying after the match closed is rejected too
    let late = profile(&r, "늦은산책러", Role::Walker).await;
    assert!(matches!(
        r.create_application(request.id, late.id).await,
        Err(RepoError::InvalidTransition(_))
    ));
}

#[tokio::test]
#[serial]
async fn completed_is_terminal() {
    let r = repo();
    let owner = profile(&r, "견주", Role::Owner).await;
    let walker = profile(&r, "산책러", Role::Walker).await;
    let dog = dog_of(&r, &owner).await;
    let request = open_request(&r, &owner, &dog).await;

    // cannot complete an open request
    assert!(matches!(
        r.complete_request(request.id).await,
        Err(RepoError::InvalidTransition(_))
    ));

    let app = r.create_application(request.id, walker.id).await.unwrap();
    r.accept_application(request.id, app.id).await.unwrap();

    let done = r.complete_request(request.id).await.unwrap();
    assert_eq!(done.status, WalkStatus::Completed);

    // no transition leaves COMPLETED
    assert!(matches!(
        r.complete_request(request.id).await,
        Err(RepoError::InvalidTransition(_))
    ));
    assert!(matches!(
        r.accept_application(request.id, app.id).await,
        Err(RepoError::InvalidTransition(_))
    ));
}

#[tokio::test]
#[serial]
async fn refetching_the_catalog_is_idempotent() {
    let r = repo();
    let owner = profile(&r, "견주", Role::Owner).await;
    let walker = profile(&r, "산책러", Role::Walker).await;
    let dog = dog_of(&r, &owner).await;
    let request = open_request(&r, &owner, &dog).await;
    open_request(&r, &owner, &dog).await;
    r.create_application(request.id, walker.id).await.unwrap();

    let requests_a = serde_json::to_value(r.list_requests(None).await.unwrap()).unwrap();
    let requests_b = serde_json::to_value(r.list_requests(None).await.unwrap()).unwrap();
    assert_eq!(requests_a, requests_b);

    let apps_a = serde_json::to_value(r.list_applications().await.unwrap()).unwrap();
    let apps_b = serde_json::to_value(r.list_applications().await.unwrap()).unwrap();
    assert_eq!(apps_a, apps_b);
}

#[tokio::test]
#[serial]
async fn chat_history_is_creation_ordered_with_sender() {
    let r = repo();
    let owner = profile(&r, "견주", Role::Owner).await;
    let walker = profile(&r, "산책러", Role::Walker).await;
    let dog = dog_of(&r, &owner).await;
    let request = open_request(&r, &owner, &dog).await;

    r.append_message(request.id, owner.id, "언제 도착하세요?".into())
        .await
        .unwrap();
    r.append_message(request.id, walker.id, "10분 후 도착해요".into())
        .await
        .unwrap();
    r.append_message(request.id, owner.id, "감사합니다!".into())
        .await
        .unwrap();

    let history = r.list_messages(request.id).await.unwrap();
    assert_eq!(history.len(), 3);
    assert!(history
        .windows(2)
        .all(|w| w[0].message.created_at <= w[1].message.created_at));
    assert_eq!(history[0].sender.as_ref().unwrap().nickname, "견주");
    assert_eq!(history[1].sender.as_ref().unwrap().nickname, "산책러");

    // scoped per request
    let other = open_request(&r, &owner, &dog).await;
    assert!(r.list_messages(other.id).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn snapshot_survives_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    std::env::set_var("WALKMATE_DATA_DIR", dir.path());

    let owner_id = {
        let r = InMemRepo::new();
        let owner = r
            .upsert_profile(Profile {
                id: Uuid::new_v4(),
                nickname: "견주".into(),
                region_code: "unset".into(),
                trust_score: DEFAULT_TRUST_SCORE,
                role: Role::Owner,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        owner.id
    };

    // a second instance over the same data dir sees the persisted state
    let r = InMemRepo::new();
    assert_eq!(r.get_profile(owner_id).await.unwrap().nickname, "견주");
}
