use chrono::NaiveDate;

use crate::models::{
    AcademySettings, Appointment, ConversationContext, DialogueState, NewAppointment,
    ParsedAppointmentRequest,
};
use crate::services::booking::{BookingError, BookingGateway};
use crate::services::parser::DEFAULT_CLASS_TYPE;

#[derive(Debug, Clone)]
pub struct Reply {
    pub message: String,
    pub state: DialogueState,
    pub appointment: Option<Appointment>,
}

impl Reply {
    fn ask(state: DialogueState, message: String) -> Self {
        Self {
            message,
            state,
            appointment: None,
        }
    }
}

pub struct DialogueDriver<'a> {
    gateway: &'a BookingGateway,
    settings: &'a AcademySettings,
}

impl<'a> DialogueDriver<'a> {
    pub fn new(gateway: &'a BookingGateway, settings: &'a AcademySettings) -> Self {
        Self { gateway, settings }
    }

    /// Folds `parsed` into the session draft and produces the next reply.
    ///
    /// Slots are collected in a fixed order: name, date, time, then the slot
    /// is checked, then phone and email. A successful booking clears the
    /// draft and returns the session to `Idle`.
    pub async fn next_action(
        &self,
        parsed: &ParsedAppointmentRequest,
        context: &mut ConversationContext,
    ) -> Reply {
        context.absorb(parsed);
        let reply = self.decide(context).await;

        context.state = reply.state;
        if reply.appointment.is_some() {
            context.appointment_intent = None;
        }
        reply
    }

    async fn decide(&self, context: &ConversationContext) -> Reply {
        let Some(name) = context.user_info.name.clone() else {
            return Reply::ask(
                DialogueState::AwaitingName,
                "Oi! Que legal que você quer agendar uma aula! 😊 Para começar, qual é o seu nome completo?"
                    .to_string(),
            );
        };

        let draft = context.appointment_intent.clone().unwrap_or_default();

        let Some(date) = draft.date else {
            return Reply::ask(
                DialogueState::AwaitingDate,
                format!(
                    "Oi {name}! Que dia você prefere para a aula? Por exemplo: \"amanhã\", \"próximo sábado\", \"segunda-feira\" ou uma data específica."
                ),
            );
        };

        let Some(time) = draft.time else {
            return Reply::ask(
                DialogueState::AwaitingTime,
                format!(
                    "{name}, qual horário você prefere? Por exemplo: \"9h da manhã\", \"14h\", \"tarde\" ou \"noite\"."
                ),
            );
        };

        if !self.gateway.check_availability(date, &time).await {
            return Reply::ask(DialogueState::SlotTaken, slot_taken_message(date, &time));
        }

        let Some(phone) = context.user_info.phone.clone() else {
            return Reply::ask(
                DialogueState::AwaitingPhone,
                format!(
                    "{name}, para confirmar o agendamento, qual é o seu telefone? (Ex: (85) 99999-9999)"
                ),
            );
        };

        let Some(email) = context.user_info.email.clone() else {
            return Reply::ask(
                DialogueState::AwaitingEmail,
                format!("{name}, qual é o seu email para enviarmos a confirmação?"),
            );
        };

        let class_type = draft
            .class_type
            .unwrap_or_else(|| DEFAULT_CLASS_TYPE.to_string());

        let new = NewAppointment {
            notes: Some(format!("Agendamento via chat inteligente - {name}")),
            name,
            phone,
            email,
            class_type,
            scheduled_date: date,
            scheduled_time: time,
        };

        match self.gateway.create_appointment(&new).await {
            Ok(appointment) => Reply {
                message: format!(
                    "🎉 Perfeito, {}! Agendei sua aula de {} para o dia {} às {}.\n\n📱 Um de nossos atendentes entrará em contato pelo WhatsApp ({}) para confirmar todos os detalhes.\n\nQualquer dúvida, é só falar comigo! 😉",
                    new.name,
                    new.class_type,
                    format_date(new.scheduled_date),
                    new.scheduled_time,
                    self.settings.whatsapp,
                ),
                state: DialogueState::Idle,
                appointment: Some(appointment),
            },
            Err(e) => {
                let state = match e {
                    BookingError::SlotTaken => DialogueState::SlotTaken,
                    BookingError::Storage(_) => DialogueState::Submitting,
                };
                Reply::ask(
                    state,
                    format!(
                        "Ops! {e}. Vamos tentar novamente? Ou prefere falar diretamente no WhatsApp ({}) para agendar?",
                        self.settings.whatsapp_url()
                    ),
                )
            }
        }
    }
}

fn slot_taken_message(date: NaiveDate, time: &str) -> String {
    format!(
        "Ops! O horário {time} no dia {} já está ocupado. Que tal outro horário? Por exemplo: \"14h\" ou \"manhã\".",
        format_date(date)
    )
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Duration;

    use super::*;
    use crate::db;
    use crate::db::queries;
    use crate::models::{AppointmentStatus, MissingField};
    use crate::services::booking::tests::BrokenStore;
    use crate::services::booking::{BookingStore, SqliteBookingStore};
    use crate::services::parser;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn saturday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn empty_context() -> ConversationContext {
        let now = chrono::Utc::now().naive_utc();
        ConversationContext::new("dialogue-test", now, Duration::minutes(30))
    }

    fn gateway() -> (BookingGateway, Arc<Mutex<rusqlite::Connection>>) {
        let conn = Arc::new(Mutex::new(db::init_db(":memory:").unwrap()));
        let store = SqliteBookingStore::new(Arc::clone(&conn));
        (BookingGateway::new(Arc::new(store)), conn)
    }

    /// Finds nothing, then refuses to write.
    struct ReadOnlyStore;

    #[async_trait]
    impl BookingStore for ReadOnlyStore {
        async fn find_appointment(
            &self,
            _date: NaiveDate,
            _time: &str,
            _statuses: &[AppointmentStatus],
        ) -> anyhow::Result<Option<Appointment>> {
            Ok(None)
        }

        async fn create_appointment(
            &self,
            _new: &NewAppointment,
        ) -> Result<Appointment, BookingError> {
            Err(BookingError::Storage(anyhow::anyhow!("read-only")))
        }
    }

    fn complete_context() -> ConversationContext {
        let mut ctx = empty_context();
        ctx.user_info.name = Some("Carlos".to_string());
        ctx.user_info.phone = Some("85999990000".to_string());
        ctx.user_info.email = Some("carlos@x.com".to_string());
        ctx
    }

    #[tokio::test]
    async fn test_asks_for_name_first() {
        let (gateway, _) = gateway();
        let settings = AcademySettings::default();
        let driver = DialogueDriver::new(&gateway, &settings);

        let mut ctx = empty_context();
        let parsed = parser::parse_on("quero marcar uma aula", Some(&ctx), today());
        assert!(parsed.is_missing(MissingField::Name));

        let reply = driver.next_action(&parsed, &mut ctx).await;
        assert_eq!(reply.state, DialogueState::AwaitingName);
        assert!(reply.message.contains("qual é o seu nome completo"));
        assert_eq!(ctx.state, DialogueState::AwaitingName);
    }

    #[tokio::test]
    async fn test_asks_for_date_after_name() {
        let (gateway, _) = gateway();
        let settings = AcademySettings::default();
        let driver = DialogueDriver::new(&gateway, &settings);

        let mut ctx = empty_context();
        ctx.user_info.name = Some("Carlos".to_string());
        let parsed = parser::parse_on("quero marcar uma aula", Some(&ctx), today());

        let reply = driver.next_action(&parsed, &mut ctx).await;
        assert_eq!(reply.state, DialogueState::AwaitingDate);
        assert!(reply.message.starts_with("Oi Carlos!"));
    }

    #[tokio::test]
    async fn test_asks_for_time_when_absent() {
        let (gateway, _) = gateway();
        let settings = AcademySettings::default();
        let driver = DialogueDriver::new(&gateway, &settings);

        let mut ctx = empty_context();
        ctx.user_info.name = Some("Carlos".to_string());
        let mut parsed = parser::parse_on("quero treinar sábado", Some(&ctx), today());
        parsed.time = None;

        let reply = driver.next_action(&parsed, &mut ctx).await;
        assert_eq!(reply.state, DialogueState::AwaitingTime);
        assert!(reply.message.contains("qual horário você prefere"));
    }

    #[tokio::test]
    async fn test_reports_taken_slot() {
        let (gateway, conn) = gateway();
        {
            let db = conn.lock().unwrap();
            let existing = queries::insert_appointment(
                &db,
                &NewAppointment {
                    name: "Ana".to_string(),
                    phone: "85911112222".to_string(),
                    email: "ana@x.com".to_string(),
                    class_type: "Yoga".to_string(),
                    scheduled_date: saturday(),
                    scheduled_time: "14:00".to_string(),
                    notes: None,
                },
            )
            .unwrap();
            queries::update_appointment_status(&db, &existing.id, AppointmentStatus::Confirmed)
                .unwrap();
        }
        let settings = AcademySettings::default();
        let driver = DialogueDriver::new(&gateway, &settings);

        let mut ctx = complete_context();
        let parsed = parser::parse_on("quero agendar sábado às 14h", Some(&ctx), today());
        let reply = driver.next_action(&parsed, &mut ctx).await;

        assert_eq!(reply.state, DialogueState::SlotTaken);
        assert!(reply.message.contains("14:00"));
        assert!(reply.message.contains("17/10/2026"));
        assert!(reply.appointment.is_none());
        // the draft survives so the user only has to change the time
        assert_eq!(ctx.appointment_intent.unwrap().date, Some(saturday()));
    }

    #[tokio::test]
    async fn test_collects_phone_then_email() {
        let (gateway, _) = gateway();
        let settings = AcademySettings::default();
        let driver = DialogueDriver::new(&gateway, &settings);

        let mut ctx = empty_context();
        ctx.user_info.name = Some("Carlos".to_string());
        let parsed = parser::parse_on("quero agendar sábado às 14h", Some(&ctx), today());
        let reply = driver.next_action(&parsed, &mut ctx).await;
        assert_eq!(reply.state, DialogueState::AwaitingPhone);

        ctx.user_info.phone = Some("85999990000".to_string());
        let parsed = parser::extract_on("(85) 99999-0000", Some(&ctx), today());
        let reply = driver.next_action(&parsed, &mut ctx).await;
        assert_eq!(reply.state, DialogueState::AwaitingEmail);
        assert!(reply.message.contains("email"));
        // the defaulted time in the phone message must not clobber 14:00
        assert_eq!(
            ctx.appointment_intent.as_ref().unwrap().time.as_deref(),
            Some("14:00")
        );
    }

    #[tokio::test]
    async fn test_books_when_everything_is_known() {
        let (gateway, conn) = gateway();
        let settings = AcademySettings::default();
        let driver = DialogueDriver::new(&gateway, &settings);

        let mut ctx = complete_context();
        let parsed = parser::parse_on("quero agendar pilates sábado às 14h", Some(&ctx), today());
        let reply = driver.next_action(&parsed, &mut ctx).await;

        assert_eq!(reply.state, DialogueState::Idle);
        let appointment = reply.appointment.expect("appointment created");
        assert_eq!(appointment.class_type, "Pilates");
        assert_eq!(appointment.scheduled_date, saturday());
        assert_eq!(appointment.scheduled_time, "14:00");
        assert_eq!(appointment.phone, "85999990000");
        assert!(reply.message.contains("aula de Pilates para o dia 17/10/2026 às 14:00"));
        assert!(reply.message.contains(&settings.whatsapp));
        assert!(ctx.appointment_intent.is_none());
        assert!(ctx.state.is_idle());

        let db = conn.lock().unwrap();
        assert!(queries::find_appointment(&db, saturday(), "14:00", &AppointmentStatus::ACTIVE)
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_storage_error_during_check_reports_slot_taken() {
        let gateway = BookingGateway::new(Arc::new(BrokenStore));
        let settings = AcademySettings::default();
        let driver = DialogueDriver::new(&gateway, &settings);

        let mut ctx = complete_context();
        let parsed = parser::parse_on("quero agendar sábado às 14h", Some(&ctx), today());
        let reply = driver.next_action(&parsed, &mut ctx).await;
        assert_eq!(reply.state, DialogueState::SlotTaken);
    }

    #[tokio::test]
    async fn test_creation_failure_apologizes_with_whatsapp() {
        let gateway = BookingGateway::new(Arc::new(ReadOnlyStore));
        let settings = AcademySettings::default();
        let driver = DialogueDriver::new(&gateway, &settings);

        let mut ctx = complete_context();
        let parsed = parser::parse_on("quero agendar sábado às 14h", Some(&ctx), today());
        let reply = driver.next_action(&parsed, &mut ctx).await;

        assert_eq!(reply.state, DialogueState::Submitting);
        assert!(reply.message.starts_with("Ops! Erro ao criar agendamento."));
        assert!(reply.message.contains("https://wa.me/5585999999999"));
        assert!(ctx.appointment_intent.is_some());
    }
}
