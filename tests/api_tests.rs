// HTTP tests for the MeMatch API running on the in-memory store

use actix_web::{http::StatusCode, test, web, App};
use async_trait::async_trait;
use jsonwebtoken::{encode, EncodingKey, Header};
use mematch::core::UserDirectory;
use mematch::models::{MatchResponse, NewUser, UserId};
use mematch::routes::auth::{Claims, Role, TokenVerifier};
use mematch::routes::error::{handle_json_payload_error, handle_path_error};
use mematch::routes::{configure_routes, AppState};
use mematch::services::{CacheError, CacheLookup, MatchListCache, MemoryStore};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

const SECRET: &str = "test-secret";

fn token(user: UserId, role: Role) -> String {
    let claims = Claims {
        sub: user.0.to_string(),
        role,
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    let jwt = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
    format!("Bearer {}", jwt)
}

/// In-process match-list cache with the same generation rules as Redis
#[derive(Default)]
struct LocalCache {
    entries: Mutex<HashMap<UserId, (u64, Option<Vec<MatchResponse>>)>>,
    invalidate_after_next_lookup: AtomicBool,
    rejected_stores: AtomicUsize,
}

impl LocalCache {
    fn bump(&self, user: UserId) {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(user).or_insert((0, None));
        entry.0 += 1;
        entry.1 = None;
    }

    fn cached(&self, user: UserId) -> Option<Vec<MatchResponse>> {
        self.entries.lock().unwrap().get(&user).and_then(|(_, list)| list.clone())
    }
}

#[async_trait]
impl MatchListCache for LocalCache {
    async fn lookup(&self, user: UserId) -> Result<CacheLookup, CacheError> {
        let lookup = match self.entries.lock().unwrap().get(&user) {
            Some((_, Some(list))) => CacheLookup::Hit(list.clone()),
            Some((generation, None)) => CacheLookup::Miss { generation: *generation },
            None => CacheLookup::Miss { generation: 0 },
        };
        // a like landing between this lookup and the handler's store read
        if self.invalidate_after_next_lookup.swap(false, Ordering::SeqCst) {
            self.bump(user);
        }
        Ok(lookup)
    }

    async fn store_matches(
        &self,
        user: UserId,
        generation: u64,
        matches: &[MatchResponse],
    ) -> Result<bool, CacheError> {
        let mut entries = self.entries.lock().unwrap();
        let entry = entries.entry(user).or_insert((0, None));
        if entry.0 != generation {
            self.rejected_stores.fetch_add(1, Ordering::SeqCst);
            return Ok(false);
        }
        entry.1 = Some(matches.to_vec());
        Ok(true)
    }

    async fn invalidate_matches(&self, users: &[UserId]) -> Result<(), CacheError> {
        for user in users {
            self.bump(*user);
        }
        Ok(())
    }
}

async fn seeded_state(names: &[&str]) -> (AppState, Vec<UserId>) {
    seeded_state_with_cache(names, None).await
}

async fn seeded_state_with_cache(
    names: &[&str],
    cache: Option<Arc<dyn MatchListCache>>,
) -> (AppState, Vec<UserId>) {
    let store = Arc::new(MemoryStore::new());
    let directory = UserDirectory::new(store.clone());

    let mut ids = Vec::new();
    for name in names {
        let user = directory
            .register(NewUser {
                username: name.to_string(),
                email: format!("{}@example.com", name),
            })
            .await
            .unwrap();
        ids.push(user.id);
    }

    let state = AppState::new(store.clone(), store.clone(), store, cache, TokenVerifier::new(SECRET));
    (state, ids)
}

macro_rules! init_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
                .app_data(web::PathConfig::default().error_handler(handle_path_error))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn test_health_check() {
    let (state, _) = seeded_state(&[]).await;
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/api/v1/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_missing_token_is_unauthorized() {
    let (state, _) = seeded_state(&["a"]).await;
    let app = init_app!(state);

    let req = test::TestRequest::get().uri("/api/v1/matches").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_like_flow_statuses() {
    let (state, ids) = seeded_state(&["alice", "bob"]).await;
    let (alice, bob) = (ids[0], ids[1]);
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/matches/like/{}", bob))
        .insert_header(("Authorization", token(alice, Role::User)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["outcome"], "pending");
    assert_eq!(body["match"]["matched"], false);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/matches/like/{}", alice))
        .insert_header(("Authorization", token(bob, Role::User)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["outcome"], "matched");
    let match_id = body["match"]["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/matches/like/{}", bob))
        .insert_header(("Authorization", token(alice, Role::User)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/matches")
        .insert_header(("Authorization", token(alice, Role::User)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"].as_i64(), Some(match_id));

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/matches/status/{}", bob))
        .insert_header(("Authorization", token(alice, Role::User)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["exists"], true);
    assert_eq!(body["liked"], true);
    assert_eq!(body["matched"], true);
}

#[actix_web::test]
async fn test_like_errors() {
    let (state, ids) = seeded_state(&["alice"]).await;
    let alice = ids[0];
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/matches/like/{}", alice))
        .insert_header(("Authorization", token(alice, Role::User)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/like/999")
        .insert_header(("Authorization", token(alice, Role::User)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "not_found");

    let req = test::TestRequest::post()
        .uri("/api/v1/matches/like/not-a-number")
        .insert_header(("Authorization", token(alice, Role::User)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_create_match_requires_admin() {
    let (state, ids) = seeded_state(&["a", "b"]).await;
    let app = init_app!(state);
    let body = json!({ "user1Id": ids[0].0, "user2Id": ids[1].0 });

    let req = test::TestRequest::post()
        .uri("/api/v1/matches")
        .insert_header(("Authorization", token(ids[0], Role::User)))
        .set_json(&body)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/v1/matches")
        .insert_header(("Authorization", token(UserId(1000), Role::Admin)))
        .set_json(&body)
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/v1/matches")
        .insert_header(("Authorization", token(UserId(1000), Role::Admin)))
        .set_json(&body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "already_exists");
}

#[actix_web::test]
async fn test_messaging_over_http() {
    let (state, ids) = seeded_state(&["a", "b", "c"]).await;
    let (a, b, c) = (ids[0], ids[1], ids[2]);
    let app = init_app!(state);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/matches/like/{}", b))
        .insert_header(("Authorization", token(a, Role::User)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let match_id = body["match"]["id"].as_i64().unwrap();

    // one-way like: messaging is not allowed yet
    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/matches/{}/messages", match_id))
        .insert_header(("Authorization", token(a, Role::User)))
        .set_json(json!({ "content": "hi" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "invalid_state");

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/matches/like/{}", a))
        .insert_header(("Authorization", token(b, Role::User)))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/matches/{}/messages", match_id))
        .insert_header(("Authorization", token(a, Role::User)))
        .set_json(json!({ "content": "knock knock" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let message: Value = test::read_body_json(resp).await;
    let message_id = message["id"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/matches/{}/messages", match_id))
        .insert_header(("Authorization", token(b, Role::User)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body[0]["content"], "knock knock");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/matches/{}/messages", match_id))
        .insert_header(("Authorization", token(c, Role::User)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/messages/{}", message_id))
        .insert_header(("Authorization", token(c, Role::User)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri(&format!("/api/v1/matches/{}/messages", match_id))
        .insert_header(("Authorization", token(c, Role::User)))
        .set_json(json!({ "content": "let me in" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_feed_and_preferences() {
    let (state, ids) = seeded_state(&["me", "x", "y"]).await;
    let (me, x, y) = (ids[0], ids[1], ids[2]);
    let app = init_app!(state);

    for (user, age, gender) in [(x, 25, "female"), (y, 45, "female")] {
        let req = test::TestRequest::put()
            .uri("/api/v1/users/me/profile")
            .insert_header(("Authorization", token(user, Role::User)))
            .set_json(json!({ "age": age, "gender": gender, "humourTags": ["Puns"] }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let req = test::TestRequest::put()
        .uri("/api/v1/users/me/preferences")
        .insert_header(("Authorization", token(me, Role::User)))
        .set_json(json!({ "ageMin": 30, "ageMax": 20 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri("/api/v1/users/me/preferences")
        .insert_header(("Authorization", token(me, Role::User)))
        .set_json(json!({ "genderPreference": "female", "ageMin": 18, "ageMax": 30, "humourTags": ["puns"] }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/users/feed")
        .insert_header(("Authorization", token(me, Role::User)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total_results"], 1);
    assert_eq!(body["users"][0]["user"]["id"].as_i64(), Some(x.0));
    assert_eq!(body["users"][0]["sharedHumourTags"], json!(["puns"]));
    assert!(body["users"][0]["user"].get("email").is_none());

    let req = test::TestRequest::get()
        .uri("/api/v1/users/feed")
        .insert_header(("Authorization", token(UserId(999), Role::User)))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/users/{}", y))
        .insert_header(("Authorization", token(me, Role::User)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["profile"]["age"], 45);
}

#[actix_web::test]
async fn test_update_profile_description_and_image() {
    let (state, ids) = seeded_state(&["me"]).await;
    let me = ids[0];
    let app = init_app!(state);

    let req = test::TestRequest::put()
        .uri("/api/v1/users/me/profile")
        .insert_header(("Authorization", token(me, Role::User)))
        .set_json(json!({ "imageUrl": "not a url" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri("/api/v1/users/me/profile")
        .insert_header(("Authorization", token(me, Role::User)))
        .set_json(json!({
            "description": "Professional overthinker",
            "imageUrl": "https://img.example.com/me.png",
            "age": 33
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["description"], "Professional overthinker");
    assert_eq!(body["imageUrl"], "https://img.example.com/me.png");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/users/{}", me))
        .insert_header(("Authorization", token(me, Role::User)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["description"], "Professional overthinker");
    assert_eq!(body["profile"]["age"], 33);
}

fn like(from: UserId, to: UserId) -> test::TestRequest {
    test::TestRequest::post()
        .uri(&format!("/api/v1/matches/like/{}", to))
        .insert_header(("Authorization", token(from, Role::User)))
}

fn list_matches(user: UserId) -> test::TestRequest {
    test::TestRequest::get()
        .uri("/api/v1/matches")
        .insert_header(("Authorization", token(user, Role::User)))
}

#[actix_web::test]
async fn test_cached_match_list_refreshes_after_match() {
    let cache = Arc::new(LocalCache::default());
    let (state, ids) = seeded_state_with_cache(&["a", "b"], Some(cache.clone())).await;
    let (a, b) = (ids[0], ids[1]);
    let app = init_app!(state);

    test::call_service(&app, like(a, b).to_request()).await;
    let body: Value = test::call_and_read_body_json(&app, list_matches(a).to_request()).await;
    assert_eq!(body, json!([]));
    assert_eq!(cache.cached(a), Some(vec![]));

    test::call_service(&app, like(b, a).to_request()).await;
    assert_eq!(cache.cached(a), None);

    let body: Value = test::call_and_read_body_json(&app, list_matches(a).to_request()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(cache.cached(a).map(|list| list.len()), Some(1));
}

#[actix_web::test]
async fn test_list_read_before_invalidation_is_not_cached() {
    let cache = Arc::new(LocalCache::default());
    let (state, ids) = seeded_state_with_cache(&["a", "b"], Some(cache.clone())).await;
    let (a, b) = (ids[0], ids[1]);
    let app = init_app!(state);

    test::call_service(&app, like(a, b).to_request()).await;

    cache.invalidate_after_next_lookup.store(true, Ordering::SeqCst);
    let resp = test::call_service(&app, list_matches(a).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    assert_eq!(cache.rejected_stores.load(Ordering::SeqCst), 1);
    assert_eq!(cache.cached(a), None);

    test::call_service(&app, like(b, a).to_request()).await;
    let body: Value = test::call_and_read_body_json(&app, list_matches(a).to_request()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn test_list_users() {
    let (state, ids) = seeded_state(&["a", "b", "c"]).await;
    let app = init_app!(state);

    let req = test::TestRequest::get()
        .uri("/api/v1/users")
        .insert_header(("Authorization", token(ids[0], Role::User)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let mut listed: Vec<i64> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_i64().unwrap())
        .collect();
    listed.sort();
    assert_eq!(listed, ids.iter().map(|id| id.0).collect::<Vec<_>>());
}
