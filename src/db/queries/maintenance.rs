use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use tracing::{debug, info, warn};

use crate::models::{MaintenanceFrequency, MaintenanceSchedule, NewMaintenanceSchedule};

const SCHEDULE_COLUMNS: &str = "id, property_id, title, frequency, next_due_date,
     estimated_cost_cents, notes, created_at, updated_at";

fn row_to_schedule(row: &Row) -> rusqlite::Result<MaintenanceSchedule> {
    let frequency: String = row.get(3)?;
    Ok(MaintenanceSchedule {
        id: row.get(0)?,
        property_id: row.get(1)?,
        title: row.get(2)?,
        frequency: MaintenanceFrequency::parse(&frequency).unwrap_or_else(|| {
            warn!(value = %frequency, "Unknown maintenance frequency, using OneOff");
            MaintenanceFrequency::OneOff
        }),
        next_due_date: row.get(4)?,
        estimated_cost_cents: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Schedules ordered by due date, soonest first.
pub fn list_schedules(
    conn: &Connection,
    property_id: Option<i64>,
) -> rusqlite::Result<Vec<MaintenanceSchedule>> {
    let mut sql = format!(
        "SELECT {} FROM maintenance_schedules WHERE 1=1",
        SCHEDULE_COLUMNS
    );
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
    if let Some(property_id) = property_id {
        sql.push_str(" AND property_id = ?");
        params_vec.push(Box::new(property_id));
    }
    sql.push_str(" ORDER BY next_due_date ASC, id ASC");

    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let schedules = stmt
        .query_map(params_refs.as_slice(), row_to_schedule)?
        .collect::<Result<Vec<_>, _>>()?;

    debug!(count = schedules.len(), ?property_id, "Listed maintenance schedules");
    Ok(schedules)
}

pub fn get_schedule(conn: &Connection, id: i64) -> rusqlite::Result<Option<MaintenanceSchedule>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM maintenance_schedules WHERE id = ?",
            SCHEDULE_COLUMNS
        ),
        [id],
        row_to_schedule,
    )
    .optional()
}

pub fn create_schedule(
    conn: &Connection,
    schedule: &NewMaintenanceSchedule,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO maintenance_schedules (property_id, title, frequency, next_due_date,
                                            estimated_cost_cents, notes)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            schedule.property_id,
            schedule.title,
            schedule.frequency.as_str(),
            schedule.next_due_date,
            schedule.estimated_cost_cents,
            schedule.notes,
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(
        schedule_id = id,
        property_id = schedule.property_id,
        title = %schedule.title,
        "Created maintenance schedule"
    );
    Ok(id)
}

pub fn update_schedule(
    conn: &Connection,
    id: i64,
    schedule: &NewMaintenanceSchedule,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE maintenance_schedules
         SET property_id = ?, title = ?, frequency = ?, next_due_date = ?,
             estimated_cost_cents = ?, notes = ?, updated_at = datetime('now')
         WHERE id = ?",
        params![
            schedule.property_id,
            schedule.title,
            schedule.frequency.as_str(),
            schedule.next_due_date,
            schedule.estimated_cost_cents,
            schedule.notes,
            id,
        ],
    )?;
    if rows > 0 {
        info!(schedule_id = id, "Updated maintenance schedule");
    }
    Ok(rows > 0)
}

pub fn delete_schedule(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM maintenance_schedules WHERE id = ?", [id])?;
    if rows > 0 {
        info!(schedule_id = id, "Deleted maintenance schedule");
    }
    Ok(rows > 0)
}
