//! One-shot data migration from a server deployment into local storage.
//!
//! Pulls every entity through the source client and re-creates it through
//! the target facade, so the target backend stamps its own ids and
//! timestamps. Designs whose name already exists in the target are skipped
//! rather than duplicated.

use crate::client::ApiClient;
use crate::error::Result;
use crate::models::{CreateDesign, CreateEmail, CreateProvider};
use crate::storage::Storage;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationStats {
    pub emails: usize,
    pub designs: usize,
    pub providers: usize,
}

pub struct Migrator {
    source: ApiClient,
    target: Arc<Storage>,
}

impl Migrator {
    pub fn new(source: ApiClient, target: Arc<Storage>) -> Self {
        Self { source, target }
    }

    /// Copy all emails, designs and providers from the source into the
    /// target. Returns the number of records written per collection.
    pub async fn export_to_embedded(&self) -> Result<MigrationStats> {
        let mut stats = MigrationStats::default();

        for email in self.source.list_emails().await? {
            self.target
                .emails()
                .create(CreateEmail {
                    title: email.title,
                    content: email.content,
                    design: email.design,
                    preview: email.preview,
                    status: email.status,
                })
                .await?;
            stats.emails += 1;
        }

        for design in self.source.list_designs().await? {
            if self
                .target
                .designs()
                .find_by_name(&design.name)
                .await?
                .is_some()
            {
                info!(name = %design.name, "skipping design already present in target");
                continue;
            }
            self.target
                .designs()
                .create(CreateDesign {
                    name: design.name,
                    description: design.description,
                    thumbnail: Some(design.thumbnail),
                    design: design.design,
                    is_active: Some(design.is_active),
                    is_system: Some(design.is_system),
                })
                .await?;
            stats.designs += 1;
        }

        for provider in self.source.list_providers().await? {
            self.target
                .providers()
                .create(CreateProvider {
                    name: provider.name,
                    provider_type: provider.provider_type,
                    config: provider.config,
                    sender_email: provider.sender_email,
                    is_active: Some(provider.is_active),
                })
                .await?;
            stats.providers += 1;
        }

        info!(
            emails = stats.emails,
            designs = stats.designs,
            providers = stats.providers,
            "migration complete"
        );
        Ok(stats)
    }

    /// Record counts currently in the target, for pre/post comparison.
    pub async fn stats(&self) -> Result<MigrationStats> {
        Ok(MigrationStats {
            emails: self.target.emails().find_many().await?.len(),
            designs: self.target.designs().find_many().await?.len(),
            providers: self.target.providers().find_many().await?.len(),
        })
    }

    /// Empty the target before a fresh import.
    pub async fn clear_target(&self) -> Result<()> {
        for email in self.target.emails().find_many().await? {
            self.target.emails().delete(&email.id).await?;
        }
        for design in self.target.designs().find_many().await? {
            self.target.designs().delete(&design.id).await?;
        }
        for provider in self.target.providers().find_many().await? {
            self.target.providers().delete(&provider.id).await?;
        }
        Ok(())
    }
}
