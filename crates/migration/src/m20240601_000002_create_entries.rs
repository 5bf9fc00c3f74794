//! Create `entries` table with nullable FK to `users`.
//!
//! Deleting a user leaves its entries in place with `owner_id` cleared.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Entries::Table)
                    .if_not_exists()
                    .col(big_integer(Entries::Id).auto_increment().primary_key())
                    .col(integer(Entries::Number).unique_key().not_null())
                    .col(string_len(Entries::Name, 128).not_null())
                    .col(text_null(Entries::Description))
                    .col(double_null(Entries::HeightM))
                    .col(double_null(Entries::WeightKg))
                    .col(integer_null(Entries::BaseExperience))
                    .col(integer(Entries::Hp).not_null().default(0))
                    .col(integer(Entries::Attack).not_null().default(0))
                    .col(integer(Entries::Defense).not_null().default(0))
                    .col(integer(Entries::SpecialAttack).not_null().default(0))
                    .col(integer(Entries::SpecialDefense).not_null().default(0))
                    .col(integer(Entries::Speed).not_null().default(0))
                    .col(string_len_null(Entries::ImageUrl, 512))
                    .col(string_len_null(Entries::SpriteUrl, 512))
                    .col(big_integer_null(Entries::OwnerId))
                    .col(timestamp_with_time_zone(Entries::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(Entries::UpdatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_entries_owner")
                            .from(Entries::Table, Entries::OwnerId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Entries::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Entries {
    Table,
    Id,
    Number,
    Name,
    Description,
    HeightM,
    WeightKg,
    BaseExperience,
    Hp,
    Attack,
    Defense,
    SpecialAttack,
    SpecialDefense,
    Speed,
    ImageUrl,
    SpriteUrl,
    OwnerId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users { Table, Id }
