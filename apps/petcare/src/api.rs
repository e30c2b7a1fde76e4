//! Mock backend for the petcare screens.
//!
//! Every fetch sleeps for the configured delay. A per-key failure budget makes
//! the first N fetches of a key fail with a network error so the retry path
//! can be exercised.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use shared::{
    domain::{
        HomeData, Notification, NotificationId, NotificationKind, PopularService, ServiceId,
        ServiceOption, StatusBanner,
    },
    error::ApiException,
};
use tracing::{info, warn};
use view_core::{Query, QueryError, QueryKey};

use crate::config::Settings;

pub const HOME_KEY: &str = "home/main";
pub const NOTIFICATIONS_KEY: &str = "notifications";
pub const SERVICE_CATALOG_KEY: &str = "reservation/services";

/// Dates offered by the reservation funnel.
pub const RESERVATION_DATES: [&str; 2] = ["2025-12-15 (Mon)", "2025-12-16 (Tue)"];

#[derive(Debug, Clone)]
pub struct MockApi {
    delay: Duration,
    failures: Arc<Mutex<HashMap<String, u32>>>,
    guest: bool,
}

impl MockApi {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            failures: Arc::new(Mutex::new(HashMap::new())),
            guest: false,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let api = Self::new(Duration::from_millis(settings.fetch_delay_ms)).guest(settings.guest);
        for (key, count) in &settings.fail_first {
            api.fail_first(key, *count);
        }
        api
    }

    pub fn guest(mut self, guest: bool) -> Self {
        self.guest = guest;
        self
    }

    /// Makes the next `count` fetches of `key` fail.
    pub fn fail_first(&self, key: &str, count: u32) {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        failures.insert(key.to_string(), count);
    }

    pub fn home(&self) -> HomeDataQuery {
        HomeDataQuery { api: self.clone() }
    }

    pub fn notifications(&self) -> NotificationsQuery {
        NotificationsQuery { api: self.clone() }
    }

    pub fn service_catalog(&self) -> ServiceCatalogQuery {
        ServiceCatalogQuery { api: self.clone() }
    }

    async fn respond<T>(&self, key: &QueryKey, body: impl FnOnce() -> T) -> Result<T, QueryError> {
        info!(query = %key, delay = ?self.delay, "mock fetch started");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.take_failure(key) {
            warn!(query = %key, "mock fetch failing on purpose");
            return Err(ApiException::network("network error").into());
        }
        Ok(body())
    }

    fn take_failure(&self, key: &QueryKey) -> bool {
        let mut failures = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
        match failures.get_mut(&key.to_string()) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HomeDataQuery {
    api: MockApi,
}

#[async_trait]
impl Query for HomeDataQuery {
    type Output = HomeData;

    fn key(&self) -> QueryKey {
        QueryKey::from(HOME_KEY)
    }

    async fn fetch(&self) -> Result<HomeData, QueryError> {
        let guest = self.api.guest;
        self.api
            .respond(&self.key(), || home_fixture(guest))
            .await
    }
}

#[derive(Debug, Clone)]
pub struct NotificationsQuery {
    api: MockApi,
}

#[async_trait]
impl Query for NotificationsQuery {
    type Output = Vec<Notification>;

    fn key(&self) -> QueryKey {
        QueryKey::from(NOTIFICATIONS_KEY)
    }

    async fn fetch(&self) -> Result<Vec<Notification>, QueryError> {
        self.api.respond(&self.key(), notifications_fixture).await
    }
}

#[derive(Debug, Clone)]
pub struct ServiceCatalogQuery {
    api: MockApi,
}

#[async_trait]
impl Query for ServiceCatalogQuery {
    type Output = Vec<ServiceOption>;

    fn key(&self) -> QueryKey {
        QueryKey::from(SERVICE_CATALOG_KEY)
    }

    async fn fetch(&self) -> Result<Vec<ServiceOption>, QueryError> {
        self.api.respond(&self.key(), service_catalog_fixture).await
    }
}

fn home_fixture(guest: bool) -> HomeData {
    let popular_services = vec![
        PopularService {
            id: ServiceId(1),
            tag: "Grooming".into(),
            title: "Premium Spa & Cut".into(),
            image: "https://images.unsplash.com/photo-1516734212186-a967f81ad0d7".into(),
            rating: 4.9,
            review_count: 128,
            price: 85_000,
        },
        PopularService {
            id: ServiceId(2),
            tag: "Hotel".into(),
            title: "Deluxe Pet Hotel".into(),
            image: "https://images.unsplash.com/photo-1548199973-03cce0bbc87b".into(),
            rating: 4.8,
            review_count: 96,
            price: 55_000,
        },
    ];

    if guest {
        return HomeData {
            user: None,
            pet_name: None,
            location: None,
            status: StatusBanner {
                title: "Sign in to book care for your pet".into(),
                action: "Sign in".into(),
                background_image: "https://images.unsplash.com/photo-1450778869180-41d0601e046e"
                    .into(),
                target: None,
            },
            popular_services,
        };
    }

    HomeData {
        user: Some("Dubu mom".into()),
        pet_name: Some("Dubu".into()),
        location: Some("Samseong-dong, Gangnam-gu, Seoul".into()),
        status: StatusBanner {
            title: "Dubu has no care booked today".into(),
            action: "Book now".into(),
            background_image: "https://images.unsplash.com/photo-1587300003388-59208cc962cb"
                .into(),
            target: Some("reservation".into()),
        },
        popular_services,
    }
}

fn notifications_fixture() -> Vec<Notification> {
    vec![
        Notification {
            id: NotificationId(1),
            kind: NotificationKind::Reservation,
            title: "Reservation confirmed".into(),
            description: "Daycare for Dubu on Dec 15 is confirmed.".into(),
            time: "10 min ago".into(),
            is_read: false,
        },
        Notification {
            id: NotificationId(2),
            kind: NotificationKind::Report,
            title: "Care report arrived".into(),
            description: "See how Dubu spent the day at daycare.".into(),
            time: "2 hours ago".into(),
            is_read: false,
        },
        Notification {
            id: NotificationId(3),
            kind: NotificationKind::Coupon,
            title: "10% grooming coupon".into(),
            description: "Valid until the end of the month.".into(),
            time: "Yesterday".into(),
            is_read: true,
        },
        Notification {
            id: NotificationId(4),
            kind: NotificationKind::Info,
            title: "Holiday hours".into(),
            description: "The center closes early on Dec 24.".into(),
            time: "3 days ago".into(),
            is_read: true,
        },
    ]
}

fn service_catalog_fixture() -> Vec<ServiceOption> {
    vec![
        ServiceOption {
            id: ServiceId(10),
            name: "Daycare (full day)".into(),
            price: 35_000,
        },
        ServiceOption {
            id: ServiceId(11),
            name: "Hygiene grooming".into(),
            price: 50_000,
        },
    ]
}
