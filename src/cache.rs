use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use axum::body::Body;
use axum::extract::State;
use axum::http::{Method, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::db::queries::{properties, settings as db_settings};
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{PropertyOption, Settings};
use crate::state::AppState;

struct Slot<T> {
    inner: RwLock<Option<(u64, T)>>,
}

impl<T: Clone> Slot<T> {
    fn new() -> Self {
        Self {
            inner: RwLock::new(None),
        }
    }

    fn get(&self, gen: u64) -> Option<T> {
        let guard = self.inner.read().ok()?;
        match guard.as_ref() {
            Some((stored_gen, val)) if *stored_gen == gen => Some(val.clone()),
            _ => None,
        }
    }

    fn set(&self, gen: u64, val: T) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some((gen, val));
        }
    }
}

/// Read-mostly lookups shared by every page. Entries are tagged with the
/// generation they were loaded under; bumping the generation drops them all.
pub struct AppCache {
    generation: AtomicU64,
    settings: Slot<Settings>,
    property_options: Slot<Vec<PropertyOption>>,
}

impl Default for AppCache {
    fn default() -> Self {
        Self::new()
    }
}

impl AppCache {
    pub fn new() -> Self {
        Self {
            generation: AtomicU64::new(0),
            settings: Slot::new(),
            property_options: Slot::new(),
        }
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn gen(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn load_settings(&self, pool: &DbPool) -> AppResult<Settings> {
        let gen = self.gen();
        if let Some(cached) = self.settings.get(gen) {
            return Ok(cached);
        }
        let conn = pool.get()?;
        let settings = db_settings::get_settings(&conn)?;
        self.settings.set(gen, settings.clone());
        Ok(settings)
    }

    pub fn load_property_options(&self, pool: &DbPool) -> AppResult<Vec<PropertyOption>> {
        let gen = self.gen();
        if let Some(cached) = self.property_options.get(gen) {
            return Ok(cached);
        }
        let conn = pool.get()?;
        let val = properties::list_property_options(&conn)?;
        self.property_options.set(gen, val.clone());
        Ok(val)
    }
}

/// Drops cached lookups after any mutating request that did not fail.
/// Form posts answer with a redirect, so 3xx counts as success here.
pub async fn cache_invalidation_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let mutating = matches!(
        *req.method(),
        Method::POST | Method::PUT | Method::DELETE | Method::PATCH
    );
    let resp = next.run(req).await;
    let status = resp.status();
    if mutating && !status.is_client_error() && !status.is_server_error() {
        state.cache.invalidate();
    }
    resp
}
