use std::sync::Arc;

use chrono::{Local, Utc};

use crate::db::{self, queries};
use crate::models::{ChatMessage, ConversationContext};
use crate::services::ai::prompt;
use crate::services::dialogue::DialogueDriver;
use crate::services::parser;
use crate::state::AppState;

const CANCEL_PHRASES: &[&str] = &["cancelar", "cancela", "não quero", "desistir", "deixa pra lá"];

const CANCELLED_REPLY: &str =
    "Sem problema! Cancelei o agendamento em andamento. Se quiser marcar outro dia, é só me chamar. 😉";

// "não quero de manhã, prefiro 16h" corrects the slot rather than cancelling.
pub fn is_cancel_request(message: &str) -> bool {
    let lower = message.to_lowercase();
    CANCEL_PHRASES.iter().any(|phrase| lower.contains(phrase))
        && !parser::mentions_slot(message)
}

pub async fn process_message(
    state: &Arc<AppState>,
    session_id: &str,
    history: &[ChatMessage],
) -> anyhow::Result<String> {
    let message = history.last().map(|m| m.content.trim()).unwrap_or_default();
    let now = Utc::now().naive_utc();
    let ttl = state.config.session_ttl();

    let (existing, settings) = {
        let db = db::lock(&state.db)?;
        (
            queries::get_conversation(&db, session_id)?,
            queries::get_settings(&db)?,
        )
    };
    let mut ctx = existing.unwrap_or_else(|| ConversationContext::new(session_id, now, ttl));

    let reply = if !ctx.state.is_idle() && is_cancel_request(message) {
        tracing::info!(session_id, state = ctx.state.as_str(), "booking cancelled by user");
        ctx.reset_booking();
        CANCELLED_REPLY.to_string()
    } else {
        ctx.user_info.absorb(parser::extract_user_info(message));

        let today = Local::now().date_naive();
        let mut parsed = parser::parse_on(message, Some(&ctx), today);
        let in_progress = !ctx.state.is_idle();
        if !parsed.has_appointment_intent {
            parsed = parser::extract_on(message, Some(&ctx), today);
        }

        tracing::info!(
            session_id,
            has_intent = parsed.has_appointment_intent,
            confidence = parsed.confidence,
            state = ctx.state.as_str(),
            "chat message parsed"
        );

        if parsed.has_appointment_intent || in_progress || parsed.carries_slot() {
            let driver = DialogueDriver::new(&state.gateway, &settings);
            driver.next_action(&parsed, &mut ctx).await.message
        } else {
            let catalog = {
                let db = db::lock(&state.db)?;
                queries::load_catalog(&db, today)?
            };
            prompt::answer(state.llm.as_ref(), &settings, &catalog, history).await
        }
    };

    ctx.last_activity = now;
    ctx.expires_at = now + ttl;

    {
        let db = db::lock(&state.db)?;
        queries::save_conversation(&db, &ctx)?;
    }

    Ok(reply)
}
