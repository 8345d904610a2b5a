use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{
    AcademySettings, Ad, Appointment, AppointmentIntent, AppointmentStatus, Catalog,
    ConversationContext, DialogueState, KnowledgeEntry, NewAppointment, Partner, Plan, Promotion,
    UserInfo,
};

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

fn now_string() -> String {
    Utc::now().naive_utc().format(DATETIME_FORMAT).to_string()
}

fn parse_datetime(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).unwrap_or_else(|_| Utc::now().naive_utc())
}

// ── Conversations ──

pub fn get_conversation(
    conn: &Connection,
    session_id: &str,
) -> anyhow::Result<Option<ConversationContext>> {
    let now = now_string();
    let result = conn.query_row(
        "SELECT session_id, data, state, last_activity, expires_at
         FROM conversations WHERE session_id = ?1 AND expires_at > ?2",
        params![session_id, now],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        },
    );

    match result {
        Ok((session_id, data_json, state_str, last_activity_str, expires_at_str)) => {
            let data: serde_json::Value =
                serde_json::from_str(&data_json).unwrap_or(serde_json::json!({}));

            let user_info: UserInfo = data
                .get("user_info")
                .and_then(|v| serde_json::from_value(v.clone()).ok())
                .unwrap_or_default();
            let appointment_intent: Option<AppointmentIntent> = data
                .get("appointment_intent")
                .and_then(|v| serde_json::from_value(v.clone()).ok());

            Ok(Some(ConversationContext {
                session_id,
                user_info,
                appointment_intent,
                state: DialogueState::parse(&state_str),
                last_activity: parse_datetime(&last_activity_str),
                expires_at: parse_datetime(&expires_at_str),
            }))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn save_conversation(conn: &Connection, ctx: &ConversationContext) -> anyhow::Result<()> {
    let data = serde_json::json!({
        "user_info": ctx.user_info,
        "appointment_intent": ctx.appointment_intent,
    });
    let data_json = serde_json::to_string(&data)?;
    let last_activity = ctx.last_activity.format(DATETIME_FORMAT).to_string();
    let expires_at = ctx.expires_at.format(DATETIME_FORMAT).to_string();

    conn.execute(
        "INSERT INTO conversations (session_id, data, state, last_activity, expires_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(session_id) DO UPDATE SET
           data = excluded.data,
           state = excluded.state,
           last_activity = excluded.last_activity,
           expires_at = excluded.expires_at",
        params![
            ctx.session_id,
            data_json,
            ctx.state.as_str(),
            last_activity,
            expires_at
        ],
    )?;
    Ok(())
}

pub fn expire_old_conversations(conn: &Connection) -> anyhow::Result<usize> {
    let now = now_string();
    let count = conn.execute(
        "DELETE FROM conversations WHERE expires_at <= ?1",
        params![now],
    )?;
    Ok(count)
}

// ── Appointments ──

const APPOINTMENT_COLUMNS: &str = "id, name, phone, email, class_type, scheduled_date, \
     scheduled_time, status, notes, created_at, updated_at";

pub fn insert_appointment(
    conn: &Connection,
    new: &NewAppointment,
) -> rusqlite::Result<Appointment> {
    let now = Utc::now().naive_utc();
    let appointment = Appointment {
        id: uuid::Uuid::new_v4().to_string(),
        name: new.name.clone(),
        phone: new.phone.clone(),
        email: new.email.clone(),
        class_type: new.class_type.clone(),
        scheduled_date: new.scheduled_date,
        scheduled_time: new.scheduled_time.clone(),
        status: AppointmentStatus::Pending,
        notes: new.notes.clone(),
        created_at: now,
        updated_at: now,
    };

    conn.execute(
        "INSERT INTO appointments (id, name, phone, email, class_type, scheduled_date, scheduled_time, status, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            appointment.id,
            appointment.name,
            appointment.phone,
            appointment.email,
            appointment.class_type,
            appointment.scheduled_date.format(DATE_FORMAT).to_string(),
            appointment.scheduled_time,
            appointment.status.as_str(),
            appointment.notes,
            appointment.created_at.format(DATETIME_FORMAT).to_string(),
            appointment.updated_at.format(DATETIME_FORMAT).to_string(),
        ],
    )?;
    Ok(appointment)
}

pub fn find_appointment(
    conn: &Connection,
    date: NaiveDate,
    time: &str,
    statuses: &[AppointmentStatus],
) -> anyhow::Result<Option<Appointment>> {
    let date_str = date.format(DATE_FORMAT).to_string();
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS} FROM appointments
         WHERE scheduled_date = ?1 AND scheduled_time = ?2 ORDER BY created_at ASC"
    ))?;

    let rows = stmt.query_map(params![date_str, time], |row| Ok(parse_appointment_row(row)))?;

    for row in rows {
        let appointment = row??;
        if statuses.contains(&appointment.status) {
            return Ok(Some(appointment));
        }
    }
    Ok(None)
}

pub fn list_appointments(
    conn: &Connection,
    status_filter: Option<AppointmentStatus>,
    limit: i64,
) -> anyhow::Result<Vec<Appointment>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE status = ?1 \
                 ORDER BY scheduled_date DESC, scheduled_time DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.as_str().to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
                 ORDER BY scheduled_date DESC, scheduled_time DESC LIMIT ?1"
            ),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_appointment_row(row)))?;

    let mut appointments = vec![];
    for row in rows {
        appointments.push(row??);
    }
    Ok(appointments)
}

pub fn update_appointment_status(
    conn: &Connection,
    id: &str,
    status: AppointmentStatus,
) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE appointments SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now_string(), id],
    )?;
    Ok(count > 0)
}

fn parse_appointment_row(row: &rusqlite::Row) -> anyhow::Result<Appointment> {
    let scheduled_date_str: String = row.get(5)?;
    let status_str: String = row.get(7)?;
    let created_at_str: String = row.get(9)?;
    let updated_at_str: String = row.get(10)?;

    let scheduled_date = NaiveDate::parse_from_str(&scheduled_date_str, DATE_FORMAT)?;

    Ok(Appointment {
        id: row.get(0)?,
        name: row.get(1)?,
        phone: row.get(2)?,
        email: row.get(3)?,
        class_type: row.get(4)?,
        scheduled_date,
        scheduled_time: row.get(6)?,
        status: AppointmentStatus::parse(&status_str),
        notes: row.get(8)?,
        created_at: parse_datetime(&created_at_str),
        updated_at: parse_datetime(&updated_at_str),
    })
}

// ── Academy Settings ──

pub fn get_settings(conn: &Connection) -> anyhow::Result<AcademySettings> {
    let result = conn.query_row(
        "SELECT name, address, phone, email, whatsapp, opening_hours, modalities
         FROM academy_settings WHERE id = 1",
        [],
        |row| {
            Ok(AcademySettings {
                name: row.get(0)?,
                address: row.get(1)?,
                phone: row.get(2)?,
                email: row.get(3)?,
                whatsapp: row.get(4)?,
                opening_hours: row.get(5)?,
                modalities: row.get(6)?,
            })
        },
    );

    match result {
        Ok(settings) => Ok(settings),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(AcademySettings::default()),
        Err(e) => Err(e.into()),
    }
}

pub fn save_settings(conn: &Connection, settings: &AcademySettings) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO academy_settings (id, name, address, phone, email, whatsapp, opening_hours, modalities)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
           name = excluded.name,
           address = excluded.address,
           phone = excluded.phone,
           email = excluded.email,
           whatsapp = excluded.whatsapp,
           opening_hours = excluded.opening_hours,
           modalities = excluded.modalities,
           updated_at = datetime('now')",
        params![
            settings.name,
            settings.address,
            settings.phone,
            settings.email,
            settings.whatsapp,
            settings.opening_hours,
            settings.modalities,
        ],
    )?;
    Ok(())
}

// ── Catalog ──

pub fn load_catalog(conn: &Connection, today: NaiveDate) -> anyhow::Result<Catalog> {
    Ok(Catalog {
        knowledge: list_knowledge(conn)?,
        plans: list_active_plans(conn)?,
        promotions: list_active_promotions(conn, today)?,
        partners: list_active_partners(conn)?,
        ads: list_active_ads(conn, today)?,
    })
}

pub fn list_knowledge(conn: &Connection) -> anyhow::Result<Vec<KnowledgeEntry>> {
    let mut stmt =
        conn.prepare("SELECT question, answer FROM knowledge_base ORDER BY created_at ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok(KnowledgeEntry {
            question: row.get(0)?,
            answer: row.get(1)?,
        })
    })?;

    let mut entries = vec![];
    for row in rows {
        entries.push(row?);
    }
    Ok(entries)
}

pub fn list_active_plans(conn: &Connection) -> anyhow::Result<Vec<Plan>> {
    let mut stmt = conn.prepare(
        "SELECT name, price, description, features FROM plans
         WHERE status = 'ACTIVE' ORDER BY price ASC",
    )?;
    let rows = stmt.query_map([], |row| {
        let features_json: String = row.get(3)?;
        Ok(Plan {
            name: row.get(0)?,
            price: row.get(1)?,
            description: row.get(2)?,
            features: serde_json::from_str(&features_json).unwrap_or_default(),
        })
    })?;

    let mut plans = vec![];
    for row in rows {
        plans.push(row?);
    }
    Ok(plans)
}

pub fn list_active_promotions(
    conn: &Connection,
    today: NaiveDate,
) -> anyhow::Result<Vec<Promotion>> {
    let mut stmt = conn.prepare(
        "SELECT title, description, valid_until FROM promotions
         WHERE is_active = 1 AND valid_until >= ?1 ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map(params![today.format(DATE_FORMAT).to_string()], |row| {
        let valid_until: String = row.get(2)?;
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, valid_until))
    })?;

    let mut promotions = vec![];
    for row in rows {
        let (title, description, valid_until) = row?;
        promotions.push(Promotion {
            title,
            description,
            valid_until: NaiveDate::parse_from_str(&valid_until, DATE_FORMAT)?,
        });
    }
    Ok(promotions)
}

pub fn list_active_partners(conn: &Connection) -> anyhow::Result<Vec<Partner>> {
    let mut stmt = conn.prepare(
        "SELECT name, category, description, link FROM partners
         WHERE is_active = 1 ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Partner {
            name: row.get(0)?,
            category: row.get(1)?,
            description: row.get(2)?,
            link: row.get(3)?,
        })
    })?;

    let mut partners = vec![];
    for row in rows {
        partners.push(row?);
    }
    Ok(partners)
}

pub fn list_active_ads(conn: &Connection, today: NaiveDate) -> anyhow::Result<Vec<Ad>> {
    let mut stmt = conn.prepare(
        "SELECT title, link FROM ads
         WHERE is_active = 1 AND valid_until >= ?1 ORDER BY created_at DESC",
    )?;
    let rows = stmt.query_map(params![today.format(DATE_FORMAT).to_string()], |row| {
        Ok(Ad {
            title: row.get(0)?,
            link: row.get(1)?,
        })
    })?;

    let mut ads = vec![];
    for row in rows {
        ads.push(row?);
    }
    Ok(ads)
}
