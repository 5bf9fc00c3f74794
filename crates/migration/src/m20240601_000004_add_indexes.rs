use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Entries: owner lookups for "my entries" pages
        manager
            .create_index(
                Index::create()
                    .name("idx_entries_owner")
                    .table(Entries::Table)
                    .col(Entries::OwnerId)
                    .to_owned(),
            )
            .await?;

        // Tags: one row per (entry, tag), plus lookup by tag value
        manager
            .create_index(
                Index::create()
                    .name("uniq_entry_types_entry_tag")
                    .table(EntryTypes::Table)
                    .col(EntryTypes::EntryId)
                    .col(EntryTypes::Tag)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_entry_types_tag")
                    .table(EntryTypes::Table)
                    .col(EntryTypes::Tag)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("uniq_entry_abilities_entry_tag")
                    .table(EntryAbilities::Table)
                    .col(EntryAbilities::EntryId)
                    .col(EntryAbilities::Tag)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_entries_owner").table(Entries::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_entry_types_entry_tag").table(EntryTypes::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_entry_types_tag").table(EntryTypes::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_entry_abilities_entry_tag").table(EntryAbilities::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Entries { Table, OwnerId }

#[derive(DeriveIden)]
enum EntryTypes { Table, EntryId, Tag }

#[derive(DeriveIden)]
enum EntryAbilities { Table, EntryId, Tag }
