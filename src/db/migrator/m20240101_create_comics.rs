use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Comics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comics::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comics::OwnerId).integer().null())
                    .col(ColumnDef::new(Comics::Title).string().not_null())
                    .col(ColumnDef::new(Comics::Location).string().not_null())
                    .col(ColumnDef::new(Comics::OriginalStory).text().not_null())
                    .col(ColumnDef::new(Comics::Script).text().not_null())
                    .col(ColumnDef::new(Comics::Summary).text().not_null())
                    .col(ColumnDef::new(Comics::SourceUrl).string().null())
                    .col(
                        ColumnDef::new(Comics::ImagePaths)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(ColumnDef::new(Comics::AudioPath).string().null())
                    .col(ColumnDef::new(Comics::Date).string().not_null())
                    .col(ColumnDef::new(Comics::CreatedAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comics_location_date")
                    .table(Comics::Table)
                    .col(Comics::Location)
                    .col(Comics::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comics_owner_id")
                    .table(Comics::Table)
                    .col(Comics::OwnerId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comics::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Comics {
    Table,
    Id,
    OwnerId,
    Title,
    Location,
    OriginalStory,
    Script,
    Summary,
    SourceUrl,
    ImagePaths,
    AudioPath,
    Date,
    CreatedAt,
}
