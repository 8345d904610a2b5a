use crate::models::{AcademySettings, Catalog, ChatMessage};
use crate::services::dialogue::format_date;

use super::{LlmProvider, Message};

pub const FALLBACK_REPLY: &str =
    "Desculpe, não consegui processar sua mensagem. Tente novamente ou fale no WhatsApp.";

pub fn system_prompt(settings: &AcademySettings, catalog: &Catalog) -> String {
    format!(
        "Você é um assistente da {name}, conversando de forma natural e descontraída em português brasileiro. \
Seja simpático e objetivo, sem ser vendedor.

INFORMAÇÕES DA ACADEMIA:
ACADEMIA: {name}
ENDEREÇO: {address}
TELEFONE: {phone}
EMAIL: {email}
WHATSAPP: {whatsapp}
HORÁRIOS: {hours}
MODALIDADES: {modalities}

ORIENTAÇÕES:
- Responda dúvidas sobre horários, aulas, planos e localização com as informações abaixo e a base de conhecimento.
- Para agendar uma aula experimental, peça que a pessoa diga o dia e o horário desejados, por exemplo \"quero agendar amanhã às 14h\".
- Para matrículas, cancelamentos ou dúvidas complexas, direcione para o WhatsApp: {whatsapp_url}
- Mantenha respostas curtas.

CONHECIMENTO BASE (use quando relevante):
{knowledge}

PLANOS DISPONÍVEIS:
{plans}{catalog_extras}

PROMOÇÕES:
- Quando perguntarem sobre promoções, ofertas ou descontos, liste todas as ativas com a validade.
- Incentive a aproveitar, mas não force.

PARCEIROS:
- Quando mencionarem profissões como nutricionista ou fisioterapeuta, sugira os parceiros e seus contatos.

ANÚNCIOS:
- Mencione serviços adicionais só quando for relevante, em tom casual: \"Ah, e temos também...\"",
        name = settings.name,
        address = settings.address,
        phone = settings.phone,
        email = settings.email,
        whatsapp = settings.whatsapp,
        hours = settings.opening_hours,
        modalities = settings.modalities,
        whatsapp_url = settings.whatsapp_url(),
        knowledge = knowledge_section(catalog),
        plans = plans_section(catalog),
        catalog_extras = extras_section(catalog),
    )
}

fn knowledge_section(catalog: &Catalog) -> String {
    catalog
        .knowledge
        .iter()
        .map(|k| format!("Pergunta: {}\nResposta: {}", k.question, k.answer))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn plans_section(catalog: &Catalog) -> String {
    catalog
        .plans
        .iter()
        .map(|p| {
            format!(
                "Plano: {} - Preço: R$ {} - Descrição: {} - Benefícios: {}",
                p.name,
                format_price(p.price),
                p.description,
                p.features.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// Promotions, partners and ads are listed only when there are any.
fn extras_section(catalog: &Catalog) -> String {
    let mut out = String::new();

    if !catalog.promotions.is_empty() {
        out.push_str("\n\nPROMOÇÕES ATIVAS:");
        for p in &catalog.promotions {
            out.push_str(&format!(
                "\n• {}: {} (Válido até {})",
                p.title,
                p.description,
                format_date(p.valid_until)
            ));
        }
    }

    if !catalog.partners.is_empty() {
        out.push_str("\n\nPARCEIROS DISPONÍVEIS:");
        for p in &catalog.partners {
            out.push_str(&format!("\n• {} ({}): {}", p.name, p.category, p.description));
            if let Some(link) = &p.link {
                out.push_str(&format!(" - Contato: {link}"));
            }
        }
    }

    if !catalog.ads.is_empty() {
        out.push_str("\n\nSERVIÇOS ADICIONAIS:");
        for ad in &catalog.ads {
            out.push_str(&format!("\n• {}", ad.title));
            if ad.link.is_some() {
                out.push_str(" - Mais informações disponíveis");
            }
        }
    }

    out
}

fn format_price(price: f64) -> String {
    format!("{price:.2}").replace('.', ",")
}

/// Free-form answer for messages outside the booking flow. Provider errors
/// are logged and replaced by a canned apology.
pub async fn answer(
    llm: &dyn LlmProvider,
    settings: &AcademySettings,
    catalog: &Catalog,
    history: &[ChatMessage],
) -> String {
    let messages: Vec<Message> = history
        .iter()
        .map(|m| Message::new(&m.role, &m.content))
        .collect();

    match llm.chat(&system_prompt(settings, catalog), &messages).await {
        Ok(reply) if !reply.trim().is_empty() => reply,
        Ok(_) => FALLBACK_REPLY.to_string(),
        Err(e) => {
            tracing::error!(error = %e, "language model call failed");
            FALLBACK_REPLY.to_string()
        }
    }
}
