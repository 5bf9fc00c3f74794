//! Create the two multi-valued tag tables, `entry_types` and `entry_abilities`.
//! Each row references its owning entry and disappears with it.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.create_table(tag_table(EntryTypes::Table, "fk_entry_types_entry")).await?;
        manager.create_table(tag_table(EntryAbilities::Table, "fk_entry_abilities_entry")).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(EntryAbilities::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(EntryTypes::Table).to_owned()).await
    }
}

fn tag_table<T: Iden + Copy + 'static>(table: T, fk_name: &str) -> TableCreateStatement {
    Table::create()
        .table(table)
        .if_not_exists()
        .col(big_integer(Tag::Id).auto_increment().primary_key())
        .col(big_integer(Tag::EntryId).not_null())
        .col(string_len(Tag::Tag, 64).not_null())
        .foreign_key(
            ForeignKey::create()
                .name(fk_name)
                .from(table, Tag::EntryId)
                .to(Entries::Table, Entries::Id)
                .on_delete(ForeignKeyAction::Cascade)
                .on_update(ForeignKeyAction::Cascade),
        )
        .to_owned()
}

#[derive(DeriveIden, Clone, Copy)]
enum EntryTypes { Table }

#[derive(DeriveIden, Clone, Copy)]
enum EntryAbilities { Table }

#[derive(DeriveIden)]
enum Tag { Id, EntryId, Tag }

#[derive(DeriveIden)]
enum Entries { Table, Id }
