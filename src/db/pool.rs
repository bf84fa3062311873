use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

pub type DbPool = Pool<SqliteConnectionManager>;

pub fn create_pool(database_path: &Path) -> Result<DbPool, r2d2::Error> {
    if let Some(parent) = database_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let manager = SqliteConnectionManager::file(database_path).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = 5000;",
        )
    });

    Pool::builder().max_size(10).build(manager)
}

/// Pool over a uniquely named shared-cache in-memory database.
///
/// Every connection in the pool sees the same data, which a plain
/// `:memory:` database cannot offer. The database lives as long as the pool
/// holds at least one connection.
pub fn create_in_memory_pool() -> Result<DbPool, r2d2::Error> {
    let uri = format!(
        "file:deedbook-{}?mode=memory&cache=shared",
        uuid::Uuid::new_v4().simple()
    );
    let manager = SqliteConnectionManager::file(uri)
        .with_init(|conn| conn.execute_batch("PRAGMA foreign_keys = ON;"));

    Pool::builder().max_size(4).min_idle(Some(1)).build(manager)
}
