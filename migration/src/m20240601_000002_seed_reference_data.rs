use sea_orm_migration::prelude::*;

/// Genres seeded into every store.
pub const GENRES: &[(i64, &str)] = &[
    (1, "Comedy"),
    (2, "Drama"),
    (3, "Cartoon"),
    (4, "Thriller"),
    (5, "Documentary"),
    (6, "Action"),
];

/// MPA ratings seeded into every store.
pub const MPA_RATINGS: &[(i64, &str)] =
    &[(1, "G"), (2, "PG"), (3, "PG-13"), (4, "R"), (5, "NC-17")];

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut genres = Query::insert();
        genres.into_table(Genres::Table).columns([Genres::Id, Genres::Name]);
        for (id, name) in GENRES {
            genres.values_panic([(*id).into(), (*name).into()]);
        }
        manager.exec_stmt(genres).await?;

        let mut ratings = Query::insert();
        ratings.into_table(RatingMpa::Table).columns([RatingMpa::Id, RatingMpa::Name]);
        for (id, name) in MPA_RATINGS {
            ratings.values_panic([(*id).into(), (*name).into()]);
        }
        manager.exec_stmt(ratings).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.exec_stmt(Query::delete().from_table(Genres::Table).to_owned()).await?;
        manager.exec_stmt(Query::delete().from_table(RatingMpa::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Genres {
    Table,
    Id,
    Name,
}

#[derive(DeriveIden)]
enum RatingMpa {
    Table,
    Id,
    Name,
}
