//! Startup seeding
//!
//! Gives a fresh deployment something to work with: a default SMTP
//! provider and the system design library. Both steps are idempotent so
//! seeding can run on every boot.

use crate::error::Result;
use crate::models::{CreateDesign, CreateProvider, ProviderType};
use crate::storage::Storage;
use serde_json::{json, Value};
use tracing::info;

const DEFAULT_PROVIDER_NAME: &str = "Default SMTP";

pub async fn run(storage: &Storage) -> Result<()> {
    seed_default_provider(storage).await?;
    seed_system_designs(storage).await?;
    Ok(())
}

async fn seed_default_provider(storage: &Storage) -> Result<()> {
    if storage
        .providers()
        .find_by_name(DEFAULT_PROVIDER_NAME)
        .await?
        .is_some()
    {
        return Ok(());
    }

    let config = json!({
        "host": "smtp.gmail.com",
        "port": 587,
        "secure": false,
        "auth": { "user": "", "pass": "" }
    });

    storage
        .providers()
        .create(CreateProvider {
            name: DEFAULT_PROVIDER_NAME.to_string(),
            provider_type: ProviderType::Smtp,
            config: config.to_string(),
            sender_email: "noreply@example.com".to_string(),
            is_active: Some(false),
        })
        .await?;

    info!("seeded default SMTP provider");
    Ok(())
}

async fn seed_system_designs(storage: &Storage) -> Result<()> {
    if !storage.designs().find_many().await?.is_empty() {
        return Ok(());
    }

    for (name, description, thumbnail, document) in system_designs() {
        storage
            .designs()
            .create(CreateDesign {
                name: name.to_string(),
                description: description.to_string(),
                thumbnail: Some(thumbnail.to_string()),
                design: document,
                is_active: Some(true),
                is_system: Some(true),
            })
            .await?;
    }

    info!("seeded system design library");
    Ok(())
}

fn system_designs() -> Vec<(&'static str, &'static str, &'static str, Value)> {
    vec![
        (
            "Welcome Email",
            "A friendly welcome for new subscribers",
            "/designs/welcome-thumb.png",
            design_document(vec![
                heading_block("Welcome aboard!"),
                text_block("Thanks for joining us. We're glad to have you."),
                button_block("Get started", "https://example.com/start"),
            ]),
        ),
        (
            "Newsletter",
            "A clean layout for periodic updates",
            "/designs/newsletter-thumb.png",
            design_document(vec![
                heading_block("This month's highlights"),
                text_block("A short introduction to what follows."),
                divider_block(),
                text_block("Story one goes here."),
                divider_block(),
                text_block("Story two goes here."),
            ]),
        ),
        (
            "Promotion",
            "A bold template for offers and announcements",
            "/designs/promo-thumb.png",
            design_document(vec![
                heading_block("Limited time offer"),
                text_block("Describe the deal and why it matters."),
                button_block("Claim offer", "https://example.com/offer"),
            ]),
        ),
    ]
}

/// A single-column document in the editor's row/column/block shape.
fn design_document(blocks: Vec<Value>) -> Value {
    json!({
        "rows": [{
            "columns": [{
                "width": 12,
                "blocks": blocks
            }]
        }]
    })
}

fn heading_block(text: &str) -> Value {
    json!({ "type": "heading", "text": text, "level": 1 })
}

fn text_block(text: &str) -> Value {
    json!({ "type": "text", "text": text })
}

fn button_block(label: &str, url: &str) -> Value {
    json!({ "type": "button", "label": label, "url": url })
}

fn divider_block() -> Value {
    json!({ "type": "divider" })
}
