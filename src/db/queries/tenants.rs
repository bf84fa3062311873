use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use tracing::{debug, info};

use crate::models::{NewTenant, Tenant};

const TENANT_COLUMNS: &str = "id, property_id, name, email, phone, lease_start, lease_end,
     monthly_rent_cents, deposit_cents, created_at, updated_at";

fn row_to_tenant(row: &Row) -> rusqlite::Result<Tenant> {
    Ok(Tenant {
        id: row.get(0)?,
        property_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        lease_start: row.get(5)?,
        lease_end: row.get(6)?,
        monthly_rent_cents: row.get(7)?,
        deposit_cents: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Tenants ordered by lease start, newest first. `property_id` narrows to
/// one property.
pub fn list_tenants(conn: &Connection, property_id: Option<i64>) -> rusqlite::Result<Vec<Tenant>> {
    let mut sql = format!("SELECT {} FROM tenants WHERE 1=1", TENANT_COLUMNS);
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
    if let Some(property_id) = property_id {
        sql.push_str(" AND property_id = ?");
        params_vec.push(Box::new(property_id));
    }
    sql.push_str(" ORDER BY lease_start DESC, id DESC");

    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let tenants = stmt
        .query_map(params_refs.as_slice(), row_to_tenant)?
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = tenants.len(), ?property_id, "Listed tenants");
    Ok(tenants)
}

pub fn get_tenant(conn: &Connection, id: i64) -> rusqlite::Result<Option<Tenant>> {
    conn.query_row(
        &format!("SELECT {} FROM tenants WHERE id = ?", TENANT_COLUMNS),
        [id],
        row_to_tenant,
    )
    .optional()
}

pub fn create_tenant(conn: &Connection, tenant: &NewTenant) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO tenants (property_id, name, email, phone, lease_start, lease_end,
                              monthly_rent_cents, deposit_cents)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            tenant.property_id,
            tenant.name,
            tenant.email,
            tenant.phone,
            tenant.lease_start,
            tenant.lease_end,
            tenant.monthly_rent_cents,
            tenant.deposit_cents,
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(tenant_id = id, property_id = tenant.property_id, "Created tenant");
    Ok(id)
}

pub fn update_tenant(conn: &Connection, id: i64, tenant: &NewTenant) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE tenants
         SET property_id = ?, name = ?, email = ?, phone = ?, lease_start = ?, lease_end = ?,
             monthly_rent_cents = ?, deposit_cents = ?, updated_at = datetime('now')
         WHERE id = ?",
        params![
            tenant.property_id,
            tenant.name,
            tenant.email,
            tenant.phone,
            tenant.lease_start,
            tenant.lease_end,
            tenant.monthly_rent_cents,
            tenant.deposit_cents,
            id,
        ],
    )?;
    if rows > 0 {
        info!(tenant_id = id, "Updated tenant");
    }
    Ok(rows > 0)
}

pub fn delete_tenant(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM tenants WHERE id = ?", [id])?;
    if rows > 0 {
        info!(tenant_id = id, "Deleted tenant");
    }
    Ok(rows > 0)
}
