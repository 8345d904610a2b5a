use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AcademySettings {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    /// Digits only, used for wa.me links.
    pub whatsapp: String,
    pub opening_hours: String,
    pub modalities: String,
}

impl Default for AcademySettings {
    fn default() -> Self {
        Self {
            name: "Gym Starter".to_string(),
            address: "Av. Santos Dumont, 1515 - Aldeota, Fortaleza - CE".to_string(),
            phone: "(85) 99999-9999".to_string(),
            email: "contato@gymstarter.com.br".to_string(),
            whatsapp: "5585999999999".to_string(),
            opening_hours: "Segunda a sexta: 5:30h às 23:00h, Sábados: 7:00h às 20:00h, Domingos: 8:00h às 18:00h".to_string(),
            modalities: "Musculação, CrossFit, Pilates, Funcional, Spinning, Yoga, Dança".to_string(),
        }
    }
}

impl AcademySettings {
    pub fn whatsapp_url(&self) -> String {
        format!("https://wa.me/{}", self.whatsapp)
    }
}
