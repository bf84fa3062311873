use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};
use tracing::{debug, info, trace, warn};

use crate::date_utils::{format_date, parse_date};
use crate::models::{
    default_direction_for, CashFlow, CashFlowQuery, CashFlowWithProperty, Direction,
    MalformedCashFlow, NewCashFlow,
};

#[derive(Debug, Default)]
pub struct CashFlowFilter {
    pub property_id: Option<i64>,
    pub direction: Option<Direction>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A row as stored. Dates are text and amounts may be missing, so rows are
/// checked before they become [`CashFlow`]s.
struct StoredCashFlow {
    id: i64,
    property_id: i64,
    date: String,
    direction: String,
    category: String,
    amount_cents: Option<i64>,
    description: String,
}

impl StoredCashFlow {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            property_id: row.get(1)?,
            date: row.get(2)?,
            direction: row.get(3)?,
            category: row.get(4)?,
            amount_cents: row.get(5)?,
            description: row.get(6)?,
        })
    }

    fn into_cash_flow(self) -> Result<CashFlow, MalformedCashFlow> {
        let date = parse_date(&self.date).ok_or_else(|| MalformedCashFlow::InvalidDate {
            id: self.id,
            raw: self.date.clone(),
        })?;
        let amount_cents = self
            .amount_cents
            .ok_or(MalformedCashFlow::MissingAmount { id: self.id })?;
        let direction = Direction::parse(&self.direction)
            .unwrap_or_else(|| default_direction_for(&self.category));

        Ok(CashFlow {
            id: self.id,
            property_id: self.property_id,
            date,
            direction,
            category: self.category,
            amount_cents,
            description: self.description,
        })
    }
}

fn readable(stored: StoredCashFlow) -> Option<CashFlow> {
    match stored.into_cash_flow() {
        Ok(cf) => Some(cf),
        Err(e) => {
            warn!(error = %e, "Skipping unreadable cash flow row");
            None
        }
    }
}

fn push_filters(
    filter: &CashFlowFilter,
    sql: &mut String,
    params_vec: &mut Vec<Box<dyn ToSql>>,
) {
    if let Some(property_id) = filter.property_id {
        sql.push_str(" AND cf.property_id = ?");
        params_vec.push(Box::new(property_id));
    }
    if let Some(direction) = filter.direction {
        sql.push_str(" AND cf.direction = ?");
        params_vec.push(Box::new(direction.as_str()));
    }
    if let Some(ref category) = filter.category {
        sql.push_str(" AND UPPER(cf.category) = UPPER(?)");
        params_vec.push(Box::new(category.clone()));
    }
    if let Some(ref search) = filter.search {
        sql.push_str(" AND cf.description LIKE ?");
        params_vec.push(Box::new(format!("%{}%", search)));
    }
    if let Some(from_date) = filter.from_date {
        sql.push_str(" AND cf.date >= ?");
        params_vec.push(Box::new(format_date(from_date)));
    }
    if let Some(to_date) = filter.to_date {
        sql.push_str(" AND cf.date <= ?");
        params_vec.push(Box::new(format_date(to_date)));
    }
}

pub fn list_cash_flows(
    conn: &Connection,
    filter: &CashFlowFilter,
) -> rusqlite::Result<Vec<CashFlowWithProperty>> {
    let mut sql = String::from(
        "SELECT cf.id, cf.property_id, cf.date, cf.direction, cf.category, cf.amount_cents,
                cf.description, p.name
         FROM cash_flows cf
         JOIN properties p ON cf.property_id = p.id
         WHERE 1=1",
    );
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
    push_filters(filter, &mut sql, &mut params_vec);
    sql.push_str(" ORDER BY cf.date DESC, cf.id DESC");

    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        params_vec.push(Box::new(limit));
    }
    if let Some(offset) = filter.offset {
        sql.push_str(" OFFSET ?");
        params_vec.push(Box::new(offset));
    }

    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map(params_refs.as_slice(), |row| {
            Ok((StoredCashFlow::from_row(row)?, row.get::<_, String>(7)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let cash_flows: Vec<CashFlowWithProperty> = rows
        .into_iter()
        .filter_map(|(stored, property_name)| {
            readable(stored).map(|cash_flow| CashFlowWithProperty {
                cash_flow,
                property_name,
            })
        })
        .collect();

    debug!(count = cash_flows.len(), "Listed cash flows");
    Ok(cash_flows)
}

pub fn count_cash_flows(conn: &Connection, filter: &CashFlowFilter) -> rusqlite::Result<i64> {
    let mut sql = String::from("SELECT COUNT(*) FROM cash_flows cf WHERE 1=1");
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
    push_filters(filter, &mut sql, &mut params_vec);

    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))
}

/// Raw cash flows for the report pipeline, newest first. Rows that cannot be
/// read are left out with a warning; range checks are repeated in memory.
pub fn list_for_report(
    conn: &Connection,
    query: &CashFlowQuery,
) -> rusqlite::Result<Vec<CashFlow>> {
    let filter = CashFlowFilter {
        property_id: query.property_id,
        from_date: query.from,
        to_date: query.to,
        ..Default::default()
    };
    let mut sql = String::from(
        "SELECT cf.id, cf.property_id, cf.date, cf.direction, cf.category, cf.amount_cents,
                cf.description
         FROM cash_flows cf
         WHERE 1=1",
    );
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::new();
    push_filters(&filter, &mut sql, &mut params_vec);
    sql.push_str(" ORDER BY cf.date DESC, cf.id DESC");

    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_refs.as_slice(), StoredCashFlow::from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let cash_flows: Vec<CashFlow> = rows.into_iter().filter_map(readable).collect();
    trace!(count = cash_flows.len(), ?query, "Fetched cash flows for report");
    Ok(cash_flows)
}

pub fn get_cash_flow(conn: &Connection, id: i64) -> rusqlite::Result<Option<CashFlow>> {
    let stored = conn
        .query_row(
            "SELECT id, property_id, date, direction, category, amount_cents, description
             FROM cash_flows WHERE id = ?",
            [id],
            StoredCashFlow::from_row,
        )
        .optional()?;
    Ok(stored.and_then(readable))
}

pub fn create_cash_flow(conn: &Connection, cash_flow: &NewCashFlow) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO cash_flows (property_id, date, direction, category, amount_cents, description)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            cash_flow.property_id,
            format_date(cash_flow.date),
            cash_flow.direction.as_str(),
            cash_flow.category,
            cash_flow.amount_cents,
            cash_flow.description,
        ],
    )?;
    let id = conn.last_insert_rowid();
    info!(
        cash_flow_id = id,
        property_id = cash_flow.property_id,
        direction = %cash_flow.direction,
        category = %cash_flow.category,
        "Created cash flow"
    );
    Ok(id)
}

pub fn update_cash_flow(
    conn: &Connection,
    id: i64,
    cash_flow: &NewCashFlow,
) -> rusqlite::Result<bool> {
    let rows = conn.execute(
        "UPDATE cash_flows
         SET property_id = ?, date = ?, direction = ?, category = ?, amount_cents = ?,
             description = ?, updated_at = datetime('now')
         WHERE id = ?",
        params![
            cash_flow.property_id,
            format_date(cash_flow.date),
            cash_flow.direction.as_str(),
            cash_flow.category,
            cash_flow.amount_cents,
            cash_flow.description,
            id,
        ],
    )?;
    if rows > 0 {
        info!(cash_flow_id = id, "Updated cash flow");
    }
    Ok(rows > 0)
}

pub fn delete_cash_flow(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM cash_flows WHERE id = ?", [id])?;
    if rows > 0 {
        info!(cash_flow_id = id, "Deleted cash flow");
    }
    Ok(rows > 0)
}
