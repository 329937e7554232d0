//! Test utilities shared by the unit tests.

use crate::api::models::law_firms::{Address, Contact, LawFirm, Specialization};
use crate::config::{Config, DatabaseConfig};
use crate::db::handlers::InMemoryStore;
use crate::db::models::law_firms::LawFirmCreateDBRequest;
use crate::types::SpecializationId;
use crate::{AppState, build_router};
use axum_test::TestServer;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{Value, json};
use uuid::Uuid;

/// Configuration for an in-memory, seeded application.
pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig::Memory { seed: true },
        ..Default::default()
    }
}

/// Test server over the full router, backed by a freshly seeded in-memory store.
pub fn create_test_server() -> TestServer {
    let state = AppState::from_store(InMemoryStore::seeded(), create_test_config());
    let router = build_router(state).expect("Failed to build router");
    TestServer::new(router).expect("Failed to create test server")
}

/// ID of a seeded specialization.
pub fn specialization_id(code: &str) -> SpecializationId {
    match code {
        "COMMERCIAL" => Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440010),
        "CIVIL" => Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440011),
        "CRIMINAL" => Uuid::from_u128(0x550e8400_e29b_41d4_a716_446655440012),
        other => panic!("no seeded specialization with code {other}"),
    }
}

/// Stable ID derived from a name, so records built twice compare equal.
fn stable_id(name: &str) -> Uuid {
    Uuid::from_u128(
        name.bytes()
            .fold(0xcbf29ce484222325u128, |acc, b| (acc ^ u128::from(b)).wrapping_mul(0x100000001b3)),
    )
}

fn fixed_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap()
}

/// An active firm in `city` offering the given specialization codes.
pub fn law_firm(name: &str, city: &str, codes: &[&str]) -> LawFirm {
    LawFirm {
        id: stable_id(name),
        name: name.to_string(),
        tax_number: format!("{:010}", stable_id(name).as_u128() % 10_000_000_000),
        krs_number: None,
        founded_date: None,
        description: None,
        address: Address {
            street: "ul. Testowa 1".to_string(),
            city: city.to_string(),
            postal_code: "00-001".to_string(),
            country: "PL".to_string(),
        },
        contact: Contact::default(),
        business_hours: None,
        created_at: fixed_time(),
        updated_at: fixed_time(),
        is_active: true,
        lawyers: Vec::new(),
        specializations: codes
            .iter()
            .map(|code| Specialization {
                id: stable_id(code),
                name: code.to_string(),
                code: code.to_string(),
                description: None,
                is_active: true,
                created_at: fixed_time(),
            })
            .collect(),
    }
}

/// `n` firms named "Kancelaria 01", "Kancelaria 02", ..., alternating between Warszawa and
/// Gdańsk.
pub fn numbered_firms(n: usize) -> Vec<LawFirm> {
    (1..=n)
        .map(|i| {
            let city = if i % 2 == 0 { "Gdańsk" } else { "Warszawa" };
            law_firm(&format!("Kancelaria {i:02}"), city, &[])
        })
        .collect()
}

/// A valid create request with a random, almost certainly unique, tax number.
pub fn create_request(name: &str) -> LawFirmCreateDBRequest {
    LawFirmCreateDBRequest::builder()
        .name(name.to_string())
        .tax_number(format!("{:010}", Uuid::new_v4().as_u128() % 10_000_000_000))
        .address(Address {
            street: "ul. Piwna 1".to_string(),
            city: "Gdańsk".to_string(),
            postal_code: "80-831".to_string(),
            country: "PL".to_string(),
        })
        .build()
}

/// JSON body for `POST /law-firms` offering civil law.
pub fn law_firm_payload(name: &str, tax_number: &str) -> Value {
    json!({
        "name": name,
        "tax_number": tax_number,
        "address": {
            "street": "ul. Mariacka 10",
            "city": "Gdańsk",
            "postal_code": "80-833"
        },
        "contact": {
            "phone": "+48581234567",
            "email": "biuro@kancelaria.pl",
            "website": "https://kancelaria.pl"
        },
        "specialization_ids": [specialization_id("CIVIL")]
    })
}

/// Serve the seeded application on an ephemeral local port and return the API base URL.
pub async fn spawn_test_api() -> String {
    let state = AppState::from_store(InMemoryStore::seeded(), create_test_config());
    let router = build_router(state).expect("Failed to build router");
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Test server failed");
    });
    format!("http://{addr}/api/v1")
}
