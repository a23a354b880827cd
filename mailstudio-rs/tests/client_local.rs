//! Local-mode behavior of the unified client.

use mailstudio_rs::client::ApiClient;
use mailstudio_rs::models::{
    CreateDesign, CreateEmail, CreateProvider, EmailStatus, ProviderType, SendEmailRequest,
    SendTestRequest, UpdateDesign, UpdateEmail, DEFAULT_DESIGN_THUMBNAIL,
};
use mailstudio_rs::storage::{EmbeddedAdapter, Storage};
use mailstudio_rs::StudioError;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

async fn local_client() -> (TempDir, ApiClient) {
    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(Storage::new(Arc::new(EmbeddedAdapter::new(dir.path()))));
    storage.connect().await.unwrap();
    (dir, ApiClient::local(storage))
}

fn new_email(title: &str) -> CreateEmail {
    CreateEmail {
        title: title.to_string(),
        content: format!("<p>{}</p>", title),
        design: "{}".to_string(),
        preview: None,
        status: EmailStatus::Draft,
    }
}

fn new_design(name: &str) -> CreateDesign {
    CreateDesign {
        name: name.to_string(),
        description: "a design".to_string(),
        thumbnail: None,
        design: json!({ "rows": [] }),
        is_active: None,
        is_system: None,
    }
}

#[tokio::test]
async fn email_crud_works_in_process() {
    let (_dir, client) = local_client().await;

    let created = client.create_email(new_email("Hello")).await.unwrap();
    assert_eq!(created.status, EmailStatus::Draft);

    let fetched = client.get_email(&created.id).await.unwrap();
    assert_eq!(fetched.title, "Hello");

    let updated = client
        .update_email(
            &created.id,
            UpdateEmail {
                status: Some(EmailStatus::Published),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, EmailStatus::Published);
    assert_eq!(updated.title, "Hello");

    client.delete_email(&created.id).await.unwrap();
    let err = client.get_email(&created.id).await.unwrap_err();
    assert!(matches!(err, StudioError::NotFound(_)));
}

#[tokio::test]
async fn design_defaults_are_applied_on_create() {
    let (_dir, client) = local_client().await;

    let design = client.create_design(new_design("Defaults")).await.unwrap();
    assert_eq!(design.thumbnail, DEFAULT_DESIGN_THUMBNAIL);
    assert!(design.is_active);
    assert!(!design.is_system);
}

#[tokio::test]
async fn duplicate_design_names_conflict_locally() {
    let (_dir, client) = local_client().await;

    client.create_design(new_design("Taken")).await.unwrap();
    let err = client.create_design(new_design("Taken")).await.unwrap_err();
    assert!(matches!(err, StudioError::Conflict(_)));
}

#[tokio::test]
async fn renaming_a_design_onto_another_conflicts() {
    let (_dir, client) = local_client().await;

    client.create_design(new_design("First")).await.unwrap();
    let second = client.create_design(new_design("Second")).await.unwrap();

    let err = client
        .update_design(
            &second.id,
            UpdateDesign {
                name: Some("First".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StudioError::Conflict(_)));

    // Keeping its own name is not a conflict.
    let updated = client
        .update_design(
            &second.id,
            UpdateDesign {
                name: Some("Second".to_string()),
                description: Some("renamed onto itself".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.description, "renamed onto itself");
}

#[tokio::test]
async fn active_provider_listing_filters() {
    let (_dir, client) = local_client().await;

    client
        .create_provider(CreateProvider {
            name: "On".to_string(),
            provider_type: ProviderType::Smtp,
            config: json!({ "host": "smtp.example.com", "port": 587 }).to_string(),
            sender_email: "on@example.com".to_string(),
            is_active: Some(true),
        })
        .await
        .unwrap();
    client
        .create_provider(CreateProvider {
            name: "Off".to_string(),
            provider_type: ProviderType::Sendgrid,
            config: json!({ "apiKey": "sg-key" }).to_string(),
            sender_email: "off@example.com".to_string(),
            is_active: Some(false),
        })
        .await
        .unwrap();

    assert_eq!(client.list_providers().await.unwrap().len(), 2);
    let active = client.list_active_providers().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "On");
}

#[tokio::test]
async fn network_operations_are_rejected_in_local_mode() {
    let (_dir, client) = local_client().await;

    let err = client.test_provider("some-id", "a@b.com").await.unwrap_err();
    assert!(matches!(err, StudioError::UnsupportedInEmbeddedMode(_)));

    let err = client
        .send_email(SendEmailRequest {
            email_id: "e".to_string(),
            to: "a@b.com".to_string(),
            provider_id: "p".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StudioError::UnsupportedInEmbeddedMode(_)));

    let err = client
        .send_test_email(SendTestRequest {
            provider_id: "p".to_string(),
            to: "a@b.com".to_string(),
            subject: "s".to_string(),
            html: "<p>hi</p>".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StudioError::UnsupportedInEmbeddedMode(_)));
}

#[tokio::test]
async fn emails_list_most_recently_edited_first() {
    let (_dir, client) = local_client().await;

    let first = client.create_email(new_email("First")).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    client.create_email(new_email("Second")).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;

    client
        .update_email(
            &first.id,
            UpdateEmail {
                title: Some("First, edited".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let titles: Vec<String> = client
        .list_emails()
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.title)
        .collect();
    assert_eq!(titles, ["First, edited", "Second"]);
}
