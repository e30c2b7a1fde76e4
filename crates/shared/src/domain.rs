use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(ServiceId);
id_newtype!(NotificationId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusBanner {
    pub title: String,
    pub action: String,
    pub background_image: String,
    /// Screen the banner action opens, when it has one.
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopularService {
    pub id: ServiceId,
    pub tag: String,
    pub title: String,
    pub image: String,
    pub rating: f32,
    pub review_count: u32,
    pub price: u32,
}

/// Home screen payload. `user` is `None` for guests, who also have no pet or
/// location on file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HomeData {
    pub user: Option<String>,
    pub pet_name: Option<String>,
    pub location: Option<String>,
    pub status: StatusBanner,
    pub popular_services: Vec<PopularService>,
}

impl HomeData {
    pub fn is_guest(&self) -> bool {
        self.user.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Reservation,
    Report,
    Coupon,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
    pub time: String,
    pub is_read: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceOption {
    pub id: ServiceId,
    pub name: String,
    pub price: u32,
}

/// Reservation data collected across the booking steps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationDraft {
    pub date: Option<String>,
    pub service_name: Option<String>,
    pub price: u32,
}

impl ReservationDraft {
    pub fn is_complete(&self) -> bool {
        self.date.is_some() && self.service_name.is_some()
    }
}

/// Formats a won amount with thousands separators, e.g. `35,000원`.
pub fn format_won(amount: u32) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push('원');
    out
}
