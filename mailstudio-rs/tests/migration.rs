//! Migration between storage instances.

use mailstudio_rs::client::ApiClient;
use mailstudio_rs::models::{CreateDesign, CreateEmail, CreateProvider, EmailStatus, ProviderType};
use mailstudio_rs::storage::{EmbeddedAdapter, Migrator, Storage};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

async fn embedded_storage() -> (TempDir, Arc<Storage>) {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(Storage::new(Arc::new(EmbeddedAdapter::new(dir.path()))));
    storage.connect().await.unwrap();
    (dir, storage)
}

async fn populate(storage: &Storage) {
    storage
        .emails()
        .create(CreateEmail {
            title: "Launch".to_string(),
            content: "<p>Launch</p>".to_string(),
            design: "{}".to_string(),
            preview: None,
            status: EmailStatus::Published,
        })
        .await
        .unwrap();

    storage
        .designs()
        .create(CreateDesign {
            name: "Library".to_string(),
            description: "a design".to_string(),
            thumbnail: None,
            design: json!({ "rows": [] }),
            is_active: Some(true),
            is_system: Some(true),
        })
        .await
        .unwrap();

    storage
        .providers()
        .create(CreateProvider {
            name: "Mailer".to_string(),
            provider_type: ProviderType::Smtp,
            config: json!({ "host": "smtp.example.com", "port": 587 }).to_string(),
            sender_email: "sender@example.com".to_string(),
            is_active: Some(true),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn export_copies_every_collection() {
    let (_src_dir, source) = embedded_storage().await;
    let (_dst_dir, target) = embedded_storage().await;
    populate(&source).await;

    let migrator = Migrator::new(ApiClient::local(source), Arc::clone(&target));
    let stats = migrator.export_to_embedded().await.unwrap();

    assert_eq!(stats.emails, 1);
    assert_eq!(stats.designs, 1);
    assert_eq!(stats.providers, 1);

    let emails = target.emails().find_many().await.unwrap();
    assert_eq!(emails[0].title, "Launch");
    assert_eq!(emails[0].status, EmailStatus::Published);

    // System flag survives the copy.
    let designs = target.designs().find_many().await.unwrap();
    assert!(designs[0].is_system);
}

#[tokio::test]
async fn export_skips_designs_already_in_the_target() {
    let (_src_dir, source) = embedded_storage().await;
    let (_dst_dir, target) = embedded_storage().await;
    populate(&source).await;

    let migrator = Migrator::new(ApiClient::local(source), Arc::clone(&target));
    migrator.export_to_embedded().await.unwrap();
    let stats = migrator.export_to_embedded().await.unwrap();

    assert_eq!(stats.designs, 0);
    assert_eq!(target.designs().find_many().await.unwrap().len(), 1);
}

#[tokio::test]
async fn clear_target_empties_every_collection() {
    let (_src_dir, source) = embedded_storage().await;
    let (_dst_dir, target) = embedded_storage().await;
    populate(&source).await;

    let migrator = Migrator::new(ApiClient::local(source), Arc::clone(&target));
    migrator.export_to_embedded().await.unwrap();
    migrator.clear_target().await.unwrap();

    let stats = migrator.stats().await.unwrap();
    assert_eq!(stats.emails, 0);
    assert_eq!(stats.designs, 0);
    assert_eq!(stats.providers, 0);
}
