//! In-process stand-in for the Klari backend used by the unit tests.

use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use axum::{
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::{
    catalog::{Category, Goal, SkinType},
    config::AppConfig,
    navigation::AppRouter,
    pagination::Page,
    products::dto::{Product, ProductSummary},
    routines::dto::{Routine, RoutineType},
    state::AppState,
    storage::{KeyValueStore, MemoryStore},
    users::dto::User,
};

static NEXT_EMAIL: AtomicUsize = AtomicUsize::new(1);

struct Account {
    user: User,
    password: String,
}

struct RoutineRecord {
    id: i64,
    user_id: i64,
    kind: RoutineType,
    active: bool,
    product_ids: Vec<i64>,
}

#[derive(Default)]
struct Db {
    products: Vec<Product>,
    accounts: Vec<Account>,
    tokens: HashMap<String, i64>,
    favorites: HashMap<i64, BTreeSet<i64>>,
    inventory: HashMap<i64, BTreeSet<i64>>,
    routines: Vec<RoutineRecord>,
    next_user_id: i64,
    next_routine_id: i64,
    fail_next_mutation: Option<StatusCode>,
    search_delays: HashMap<String, Duration>,
    hits: HashMap<String, usize>,
}

type Shared = Arc<Mutex<Db>>;

pub struct FakeBackend {
    base_url: String,
    db: Shared,
}

impl FakeBackend {
    pub async fn start() -> Self {
        let db: Shared = Arc::new(Mutex::new(Db {
            products: seed_catalog(),
            next_user_id: 1,
            next_routine_id: 1,
            ..Db::default()
        }));

        let app = router()
            .layer(middleware::from_fn_with_state(db.clone(), count_hits))
            .layer(TraceLayer::new_for_http())
            .with_state(db.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend serve");
        });

        Self {
            base_url: format!("http://{addr}"),
            db,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn state_with_store(&self, store: Arc<dyn KeyValueStore>) -> AppState {
        let config = Arc::new(AppConfig::with_api_url(self.base_url.clone()));
        AppState::from_parts(config, store, Arc::new(AppRouter::default()))
            .expect("state from parts")
    }

    pub fn signed_out_state(&self) -> AppState {
        self.state_with_store(Arc::new(MemoryStore::new()))
    }

    /// A fresh account, logged in through the real auth flow.
    pub async fn signed_in_state(&self) -> AppState {
        let n = NEXT_EMAIL.fetch_add(1, Ordering::SeqCst);
        let email = format!("user{n}@example.com");
        self.seed_user(&format!("user{n}"), &email, "password1").await;
        let state = self.signed_out_state();
        state
            .auth
            .login(&email, "password1")
            .await
            .expect("login seeded user");
        state
    }

    pub async fn seed_user(&self, username: &str, email: &str, password: &str) -> i64 {
        let mut db = self.db.lock().await;
        create_account(&mut db, username, email, password)
    }

    /// Invalidates every issued token.
    pub async fn expire_sessions(&self) {
        self.db.lock().await.tokens.clear();
    }

    /// The next favorite/inventory/routine/profile mutation answers `status`.
    pub async fn fail_next_mutation(&self, status: StatusCode) {
        self.db.lock().await.fail_next_mutation = Some(status);
    }

    /// Delays searches for `query` so a newer request can overtake them.
    pub async fn delay_search(&self, query: &str, delay: Duration) {
        self.db
            .lock()
            .await
            .search_delays
            .insert(query.to_lowercase(), delay);
    }

    /// Inserts a product at the head of the catalog, shifting later pages.
    pub async fn prepend_product(&self, id: i64, name: &str, category: Category) {
        let product = product(id, name, "Fresh Brand", category, "DIA", &[], &[]);
        self.db.lock().await.products.insert(0, product);
    }

    pub fn catalog_len(&self) -> usize {
        seed_catalog().len()
    }

    pub async fn hits(&self, path: &str) -> usize {
        self.db.lock().await.hits.get(path).copied().unwrap_or(0)
    }

    pub async fn membership(&self, user_id: i64, favorites: bool) -> BTreeSet<i64> {
        let db = self.db.lock().await;
        let sets = if favorites { &db.favorites } else { &db.inventory };
        sets.get(&user_id).cloned().unwrap_or_default()
    }

    pub async fn profile(&self, user_id: i64) -> User {
        let db = self.db.lock().await;
        db.accounts
            .iter()
            .find(|a| a.user.id == user_id)
            .map(|a| a.user.clone())
            .expect("known user")
    }
}

fn router() -> Router<Shared> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/products/summary", get(product_page))
        .route("/products/search", get(search))
        .route("/products/category/:category", get(by_category))
        .route("/products/routine/recommend", get(recommend))
        .route("/products/routine/recommend/simple", get(recommend_simple))
        .route("/products/:id", get(product_detail))
        .route("/products/:id/summary", get(product_summary))
        .route("/users/:id", get(user_profile))
        .route("/users/:id/skin-type", patch(set_skin_type))
        .route("/users/:id/goals/:goal", post(add_goal).delete(remove_goal))
        .route("/users/:id/favorites/summary", get(favorites_page))
        .route("/users/:id/favorites/:product_id/exists", get(favorite_exists))
        .route(
            "/users/:id/favorites/:product_id",
            post(add_favorite).delete(remove_favorite),
        )
        .route("/users/:id/inventory/summary", get(inventory_page))
        .route("/users/:id/inventory/:product_id/exists", get(inventory_exists))
        .route(
            "/users/:id/inventory/:product_id",
            post(add_inventory).delete(remove_inventory),
        )
        .route("/routines/user/:id/:kind/active", get(active_routine))
        .route("/routines/user/:id/:kind/initial", post(initial_routine))
        .route("/routines/:id", get(get_routine).delete(delete_routine))
        .route(
            "/routines/:id/products/:product_id",
            post(add_routine_product).delete(remove_routine_product),
        )
}

async fn count_hits(State(db): State<Shared>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    *db.lock().await.hits.entry(path).or_default() += 1;
    next.run(req).await
}

// ---- helpers ----

fn reject(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn create_account(db: &mut Db, username: &str, email: &str, password: &str) -> i64 {
    let id = db.next_user_id;
    db.next_user_id += 1;
    db.accounts.push(Account {
        user: User {
            id,
            username: username.to_string(),
            email: email.to_lowercase(),
            skin_type: None,
            goals: Vec::new(),
        },
        password: password.to_string(),
    });
    id
}

fn issue_token(db: &mut Db, user: &User) -> serde_json::Value {
    let token = format!("token-{}-{}", user.id, db.tokens.len() + 1);
    db.tokens.insert(token.clone(), user.id);
    json!({
        "userId": user.id,
        "username": user.username,
        "email": user.email,
        "token": token,
    })
}

fn authorize(db: &Db, headers: &HeaderMap) -> Result<i64, Response> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|t| db.tokens.get(t).copied())
        .ok_or_else(|| reject(StatusCode::UNAUTHORIZED, "Unauthorized"))
}

/// Authorizes the caller as user `user_id`.
fn authorize_user(db: &Db, headers: &HeaderMap, user_id: i64) -> Result<(), Response> {
    let caller = authorize(db, headers)?;
    if caller != user_id {
        return Err(reject(StatusCode::FORBIDDEN, "Forbidden"));
    }
    Ok(())
}

fn take_failure(db: &mut Db) -> Result<(), Response> {
    match db.fail_next_mutation.take() {
        Some(status) => Err(reject(status, "Simulated failure")),
        None => Ok(()),
    }
}

fn paginate<T: Clone>(items: &[T], page: u32, size: u32) -> Page<T> {
    let size = size.max(1);
    let total = items.len();
    let start = (page as usize).saturating_mul(size as usize).min(total);
    let end = (start + size as usize).min(total);
    let total_pages = total.div_ceil(size as usize) as u32;
    let content = items[start..end].to_vec();
    Page {
        empty: content.is_empty(),
        content,
        first: page == 0,
        last: page + 1 >= total_pages,
        total_elements: total as u64,
        total_pages,
        number: page,
        size,
    }
}

fn parse_category(raw: Option<&str>) -> Result<Option<Category>, Response> {
    match raw.filter(|c| !c.is_empty()) {
        Some(c) => c
            .parse::<Category>()
            .map(Some)
            .map_err(|_| reject(StatusCode::BAD_REQUEST, "Unknown category")),
        None => Ok(None),
    }
}

fn in_category(p: &Product, category: Option<Category>) -> bool {
    category.map_or(true, |c| c.matches(&p.category))
}

fn routine_json(db: &Db, r: &RoutineRecord) -> Routine {
    Routine {
        id: r.id,
        routine_type: r.kind,
        active: r.active,
        created_at: Some("2024-05-01T09:00:00".into()),
        products: r
            .product_ids
            .iter()
            .filter_map(|id| db.products.iter().find(|p| p.id == *id).cloned())
            .collect(),
    }
}

fn parse_kind(raw: &str) -> Result<RoutineType, Response> {
    raw.parse::<RoutineType>()
        .map_err(|_| reject(StatusCode::BAD_REQUEST, "Unknown routine type"))
}

// ---- auth ----

#[derive(Deserialize)]
struct Credentials {
    email: String,
    password: String,
    #[serde(default)]
    username: Option<String>,
}

async fn login(State(db): State<Shared>, Json(body): Json<Credentials>) -> Response {
    let mut db = db.lock().await;
    let email = body.email.trim().to_lowercase();
    let Some(user) = db
        .accounts
        .iter()
        .find(|a| a.user.email == email && a.password == body.password)
        .map(|a| a.user.clone())
    else {
        return reject(StatusCode::BAD_REQUEST, "Invalid credentials");
    };
    Json(issue_token(&mut db, &user)).into_response()
}

async fn register(State(db): State<Shared>, Json(body): Json<Credentials>) -> Response {
    let mut db = db.lock().await;
    let email = body.email.trim().to_lowercase();
    if db.accounts.iter().any(|a| a.user.email == email) {
        return reject(StatusCode::CONFLICT, "Email already registered");
    }
    let username = body.username.unwrap_or_default();
    let id = create_account(&mut db, &username, &email, &body.password);
    let user = db
        .accounts
        .iter()
        .find(|a| a.user.id == id)
        .map(|a| a.user.clone())
        .expect("account just created");
    (StatusCode::CREATED, Json(issue_token(&mut db, &user))).into_response()
}

// ---- products ----

#[derive(Deserialize)]
struct ListParams {
    #[serde(default)]
    page: u32,
    #[serde(default = "default_size")]
    size: u32,
    category: Option<String>,
    q: Option<String>,
}

fn default_size() -> u32 {
    20
}

async fn product_page(
    State(db): State<Shared>,
    headers: HeaderMap,
    Query(p): Query<ListParams>,
) -> Response {
    let db = db.lock().await;
    if let Err(r) = authorize(&db, &headers) {
        return r;
    }
    let summaries: Vec<ProductSummary> = db.products.iter().cloned().map(Into::into).collect();
    Json(paginate(&summaries, p.page, p.size)).into_response()
}

async fn search(
    State(db): State<Shared>,
    headers: HeaderMap,
    Query(p): Query<ListParams>,
) -> Response {
    let delay = {
        let db = db.lock().await;
        if let Err(r) = authorize(&db, &headers) {
            return r;
        }
        p.q.as_deref()
            .and_then(|q| db.search_delays.get(&q.to_lowercase()).copied())
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let db = db.lock().await;
    let category = match parse_category(p.category.as_deref()) {
        Ok(c) => c,
        Err(r) => return r,
    };
    let needle = p.q.unwrap_or_default();
    let hits: Vec<Product> = db
        .products
        .iter()
        .filter(|prod| in_category(prod, category))
        .filter(|prod| ProductSummary::from(Product::clone(prod)).matches_text(&needle))
        .cloned()
        .collect();
    Json(paginate(&hits, p.page, p.size)).into_response()
}

async fn by_category(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(category): Path<String>,
    Query(p): Query<ListParams>,
) -> Response {
    let db = db.lock().await;
    if let Err(r) = authorize(&db, &headers) {
        return r;
    }
    let category = match parse_category(Some(&category)) {
        Ok(c) => c,
        Err(r) => return r,
    };
    let hits: Vec<Product> = db
        .products
        .iter()
        .filter(|prod| in_category(prod, category))
        .cloned()
        .collect();
    Json(paginate(&hits, p.page, p.size)).into_response()
}

#[derive(Deserialize)]
struct RecommendParams {
    category: String,
    #[serde(rename = "skinType", default)]
    skin_type: Option<String>,
    #[serde(default)]
    goals: Option<String>,
    #[serde(default)]
    page: u32,
    #[serde(default = "default_recommend_size")]
    size: u32,
    #[serde(default)]
    limit: Option<usize>,
}

fn default_recommend_size() -> u32 {
    10
}

fn ranked(db: &Db, p: &RecommendParams) -> Result<Vec<ProductSummary>, Response> {
    let category = parse_category(Some(&p.category))?;
    let goals: Vec<String> = p
        .goals
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect();
    let mut scored: Vec<(usize, &Product)> = db
        .products
        .iter()
        .filter(|prod| in_category(prod, category))
        .map(|prod| {
            let goal_hits = prod.goals.iter().filter(|g| goals.contains(g)).count();
            let skin_hit = p
                .skin_type
                .as_deref()
                .map_or(0, |s| usize::from(prod.skin_types.iter().any(|t| t == s)));
            (goal_hits + skin_hit, prod)
        })
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.id.cmp(&b.1.id)));
    Ok(scored.into_iter().map(|(_, prod)| prod.clone().into()).collect())
}

async fn recommend(
    State(db): State<Shared>,
    headers: HeaderMap,
    Query(p): Query<RecommendParams>,
) -> Response {
    let db = db.lock().await;
    if let Err(r) = authorize(&db, &headers) {
        return r;
    }
    match ranked(&db, &p) {
        Ok(items) => Json(paginate(&items, p.page, p.size)).into_response(),
        Err(r) => r,
    }
}

async fn recommend_simple(
    State(db): State<Shared>,
    headers: HeaderMap,
    Query(p): Query<RecommendParams>,
) -> Response {
    let db = db.lock().await;
    if let Err(r) = authorize(&db, &headers) {
        return r;
    }
    match ranked(&db, &p) {
        Ok(mut items) => {
            items.truncate(p.limit.unwrap_or(10));
            Json(items).into_response()
        }
        Err(r) => r,
    }
}

async fn product_detail(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let db = db.lock().await;
    if let Err(r) = authorize(&db, &headers) {
        return r;
    }
    match db.products.iter().find(|p| p.id == id) {
        Some(p) => Json(p.clone()).into_response(),
        None => reject(StatusCode::NOT_FOUND, "Product not found"),
    }
}

async fn product_summary(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let db = db.lock().await;
    if let Err(r) = authorize(&db, &headers) {
        return r;
    }
    match db.products.iter().find(|p| p.id == id) {
        Some(p) => Json(ProductSummary::from(p.clone())).into_response(),
        None => reject(StatusCode::NOT_FOUND, "Product not found"),
    }
}

// ---- users ----

async fn user_profile(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let db = db.lock().await;
    if let Err(r) = authorize_user(&db, &headers, id) {
        return r;
    }
    match db.accounts.iter().find(|a| a.user.id == id) {
        Some(a) => Json(a.user.clone()).into_response(),
        None => reject(StatusCode::NOT_FOUND, "User not found"),
    }
}

#[derive(Deserialize)]
struct SkinTypeParams {
    #[serde(rename = "skinType")]
    skin_type: String,
}

async fn set_skin_type(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(p): Query<SkinTypeParams>,
) -> Response {
    let mut db = db.lock().await;
    if let Err(r) = authorize_user(&db, &headers, id).and_then(|()| take_failure(&mut db)) {
        return r;
    }
    let Ok(skin_type) = p.skin_type.parse::<SkinType>() else {
        return reject(StatusCode::BAD_REQUEST, "Unknown skin type");
    };
    if let Some(a) = db.accounts.iter_mut().find(|a| a.user.id == id) {
        a.user.skin_type = Some(skin_type);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn change_goal(db: Shared, headers: HeaderMap, id: i64, goal: String, add: bool) -> Response {
    let mut db = db.lock().await;
    if let Err(r) = authorize_user(&db, &headers, id).and_then(|()| take_failure(&mut db)) {
        return r;
    }
    let Ok(goal) = goal.parse::<Goal>() else {
        return reject(StatusCode::BAD_REQUEST, "Unknown goal");
    };
    if let Some(a) = db.accounts.iter_mut().find(|a| a.user.id == id) {
        a.user.goals.retain(|g| *g != goal);
        if add {
            a.user.goals.push(goal);
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn add_goal(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path((id, goal)): Path<(i64, String)>,
) -> Response {
    change_goal(db, headers, id, goal, true).await
}

async fn remove_goal(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path((id, goal)): Path<(i64, String)>,
) -> Response {
    change_goal(db, headers, id, goal, false).await
}

async fn membership_page(
    db: Shared,
    headers: HeaderMap,
    id: i64,
    p: ListParams,
    favorites: bool,
) -> Response {
    let db = db.lock().await;
    if let Err(r) = authorize_user(&db, &headers, id) {
        return r;
    }
    let category = match parse_category(p.category.as_deref()) {
        Ok(c) => c,
        Err(r) => return r,
    };
    let sets = if favorites { &db.favorites } else { &db.inventory };
    let ids = sets.get(&id).cloned().unwrap_or_default();
    let items: Vec<ProductSummary> = db
        .products
        .iter()
        .filter(|prod| ids.contains(&prod.id) && in_category(prod, category))
        .cloned()
        .map(Into::into)
        .collect();
    Json(paginate(&items, p.page, p.size)).into_response()
}

async fn membership_exists(
    db: Shared,
    headers: HeaderMap,
    id: i64,
    product_id: i64,
    favorites: bool,
) -> Response {
    let db = db.lock().await;
    if let Err(r) = authorize_user(&db, &headers, id) {
        return r;
    }
    let sets = if favorites { &db.favorites } else { &db.inventory };
    let found = sets.get(&id).is_some_and(|s| s.contains(&product_id));
    Json(found).into_response()
}

async fn membership_change(
    db: Shared,
    headers: HeaderMap,
    id: i64,
    product_id: i64,
    favorites: bool,
    add: bool,
) -> Response {
    let mut db = db.lock().await;
    if let Err(r) = authorize_user(&db, &headers, id).and_then(|()| take_failure(&mut db)) {
        return r;
    }
    if !db.products.iter().any(|p| p.id == product_id) {
        return reject(StatusCode::NOT_FOUND, "Product not found");
    }
    let sets = if favorites {
        &mut db.favorites
    } else {
        &mut db.inventory
    };
    let set = sets.entry(id).or_default();
    if add {
        set.insert(product_id);
    } else {
        set.remove(&product_id);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn favorites_page(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(p): Query<ListParams>,
) -> Response {
    membership_page(db, headers, id, p, true).await
}

async fn inventory_page(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Query(p): Query<ListParams>,
) -> Response {
    membership_page(db, headers, id, p, false).await
}

async fn favorite_exists(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path((id, product_id)): Path<(i64, i64)>,
) -> Response {
    membership_exists(db, headers, id, product_id, true).await
}

async fn inventory_exists(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path((id, product_id)): Path<(i64, i64)>,
) -> Response {
    membership_exists(db, headers, id, product_id, false).await
}

async fn add_favorite(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path((id, product_id)): Path<(i64, i64)>,
) -> Response {
    membership_change(db, headers, id, product_id, true, true).await
}

async fn remove_favorite(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path((id, product_id)): Path<(i64, i64)>,
) -> Response {
    membership_change(db, headers, id, product_id, true, false).await
}

async fn add_inventory(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path((id, product_id)): Path<(i64, i64)>,
) -> Response {
    membership_change(db, headers, id, product_id, false, true).await
}

async fn remove_inventory(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path((id, product_id)): Path<(i64, i64)>,
) -> Response {
    membership_change(db, headers, id, product_id, false, false).await
}

// ---- routines ----

async fn active_routine(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path((id, kind)): Path<(i64, String)>,
) -> Response {
    let db = db.lock().await;
    if let Err(r) = authorize_user(&db, &headers, id) {
        return r;
    }
    let kind = match parse_kind(&kind) {
        Ok(k) => k,
        Err(r) => return r,
    };
    match db
        .routines
        .iter()
        .find(|r| r.user_id == id && r.kind == kind && r.active)
    {
        Some(r) => Json(routine_json(&db, r)).into_response(),
        None => reject(StatusCode::NOT_FOUND, "No active routine"),
    }
}

async fn initial_routine(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path((id, kind)): Path<(i64, String)>,
) -> Response {
    let mut db = db.lock().await;
    if let Err(r) = authorize_user(&db, &headers, id).and_then(|()| take_failure(&mut db)) {
        return r;
    }
    let kind = match parse_kind(&kind) {
        Ok(k) => k,
        Err(r) => return r,
    };
    let mut seed = vec![Category::Limpiadores, Category::Hidratantes];
    if kind == RoutineType::Day {
        seed.push(Category::ProtectoresSolares);
    }
    let product_ids = seed
        .into_iter()
        .filter_map(|c| db.products.iter().find(|p| c.matches(&p.category)))
        .map(|p| p.id)
        .collect();

    for r in db
        .routines
        .iter_mut()
        .filter(|r| r.user_id == id && r.kind == kind)
    {
        r.active = false;
    }
    let record = RoutineRecord {
        id: db.next_routine_id,
        user_id: id,
        kind,
        active: true,
        product_ids,
    };
    db.next_routine_id += 1;
    let body = routine_json(&db, &record);
    db.routines.push(record);
    (StatusCode::CREATED, Json(body)).into_response()
}

fn owned_routine<'a>(db: &'a mut Db, headers: &HeaderMap, id: i64) -> Result<&'a mut RoutineRecord, Response> {
    let caller = authorize(db, headers)?;
    db.routines
        .iter_mut()
        .find(|r| r.id == id && r.user_id == caller)
        .ok_or_else(|| reject(StatusCode::NOT_FOUND, "Routine not found"))
}

async fn get_routine(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut db = db.lock().await;
    let record = match owned_routine(&mut db, &headers, id) {
        Ok(r) => RoutineRecord {
            id: r.id,
            user_id: r.user_id,
            kind: r.kind,
            active: r.active,
            product_ids: r.product_ids.clone(),
        },
        Err(r) => return r,
    };
    Json(routine_json(&db, &record)).into_response()
}

async fn delete_routine(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let mut db = db.lock().await;
    if let Err(r) = owned_routine(&mut db, &headers, id).map(|_| ()) {
        return r;
    }
    if let Err(r) = take_failure(&mut db) {
        return r;
    }
    db.routines.retain(|r| r.id != id);
    StatusCode::NO_CONTENT.into_response()
}

async fn add_routine_product(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path((id, product_id)): Path<(i64, i64)>,
) -> Response {
    let mut db = db.lock().await;
    if let Err(r) = owned_routine(&mut db, &headers, id).map(|_| ()) {
        return r;
    }
    if let Err(r) = take_failure(&mut db) {
        return r;
    }
    if !db.products.iter().any(|p| p.id == product_id) {
        return reject(StatusCode::NOT_FOUND, "Product not found");
    }
    if let Ok(routine) = owned_routine(&mut db, &headers, id) {
        if !routine.product_ids.contains(&product_id) {
            routine.product_ids.push(product_id);
        }
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn remove_routine_product(
    State(db): State<Shared>,
    headers: HeaderMap,
    Path((id, product_id)): Path<(i64, i64)>,
) -> Response {
    let mut db = db.lock().await;
    if let Err(r) = owned_routine(&mut db, &headers, id).map(|_| ()) {
        return r;
    }
    if let Err(r) = take_failure(&mut db) {
        return r;
    }
    if let Ok(routine) = owned_routine(&mut db, &headers, id) {
        routine.product_ids.retain(|p| *p != product_id);
    }
    StatusCode::NO_CONTENT.into_response()
}

// ---- catalog ----

fn product(
    id: i64,
    name: &str,
    brand: &str,
    category: Category,
    time: &str,
    goals: &[Goal],
    skin_types: &[SkinType],
) -> Product {
    Product {
        id,
        name: name.to_string(),
        brand: brand.to_string(),
        image_url: format!("https://img.example.com/products/{id}.jpg"),
        category: category.as_str().to_string(),
        application_time: time.to_string(),
        ingredients: vec!["Aqua".to_string(), "Glycerin".to_string()],
        description: format!("{name} by {brand}"),
        goals: goals.iter().map(|g| g.as_str().to_string()).collect(),
        skin_types: skin_types.iter().map(|s| s.as_str().to_string()).collect(),
    }
}

fn seed_catalog() -> Vec<Product> {
    use Category::*;
    vec![
        product(1, "Eye Cream Retinol", "The Ordinary", ContornoOjos, "NOCHE", &[Goal::LineasExpresion], &[SkinType::Normal]),
        product(2, "Caffeine Solution 5%", "The Ordinary", ContornoOjos, "DIA", &[Goal::Textura], &[SkinType::Seca]),
        product(3, "Glycolic Acid Toner", "Pixi", Tonicos, "NOCHE", &[Goal::Textura, Goal::Manchas], &[SkinType::Grasa]),
        product(4, "Hydrating Toner", "Klairs", Tonicos, "DIA", &[Goal::Irritacion], &[SkinType::Sensible]),
        product(5, "Moisturizing Cream", "CeraVe", Hidratantes, "DIA", &[Goal::Irritacion], &[SkinType::Seca, SkinType::Normal]),
        product(6, "Water Cream", "Tatcha", Hidratantes, "DIA", &[Goal::Poros], &[SkinType::Grasa, SkinType::Mixta]),
        product(7, "Niacinamide 10%", "The Ordinary", Serums, "DIA", &[Goal::Poros, Goal::Manchas], &[SkinType::Grasa]),
        product(8, "Vitamin C Serum", "Skinceuticals", Serums, "DIA", &[Goal::Manchas], &[SkinType::Normal]),
        product(9, "Hyaluronic Acid", "The Ordinary", Serums, "NOCHE", &[Goal::Textura], &[SkinType::Seca]),
        product(10, "UV Defense SPF50", "La Roche-Posay", ProtectoresSolares, "DIA", &[Goal::Manchas], &[SkinType::Sensible]),
        product(11, "Sunscreen SPF30", "Supergoop", ProtectoresSolares, "DIA", &[Goal::Manchas], &[SkinType::Grasa]),
        product(12, "Foaming Cleanser", "CeraVe", Limpiadores, "DIA", &[Goal::Poros], &[SkinType::Grasa]),
        product(13, "Oil Cleanser", "DHC", Limpiadores, "NOCHE", &[Goal::Textura], &[SkinType::Seca]),
        product(14, "Clay Mask", "Aztec Secret", Mascarillas, "NOCHE", &[Goal::Poros], &[SkinType::Grasa]),
        product(15, "Vitamin C Glow Mask", "Innisfree", Mascarillas, "NOCHE", &[Goal::Manchas], &[SkinType::Normal]),
    ]
}
