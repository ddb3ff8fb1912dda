use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RatingMpa::Table)
                    .if_not_exists()
                    .col(pk_auto(RatingMpa::Id))
                    .col(string(RatingMpa::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genres::Table)
                    .if_not_exists()
                    .col(pk_auto(Genres::Id))
                    .col(string(Genres::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Films::Table)
                    .if_not_exists()
                    .col(pk_auto(Films::Id))
                    .col(string(Films::Name))
                    .col(string(Films::Description))
                    .col(string(Films::ReleaseDate))
                    .col(integer(Films::Duration))
                    .col(integer(Films::RatingMpaId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_films_rating_mpa")
                            .from(Films::Table, Films::RatingMpaId)
                            .to(RatingMpa::Table, RatingMpa::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Email))
                    .col(string(Users::Login))
                    .col(string(Users::Name))
                    .col(string(Users::Birthday))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Likes::Table)
                    .if_not_exists()
                    .col(integer(Likes::FilmId))
                    .col(integer(Likes::UserId))
                    .primary_key(Index::create().col(Likes::FilmId).col(Likes::UserId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_likes_film")
                            .from(Likes::Table, Likes::FilmId)
                            .to(Films::Table, Films::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_likes_user")
                            .from(Likes::Table, Likes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FilmsGenre::Table)
                    .if_not_exists()
                    .col(pk_auto(FilmsGenre::Id))
                    .col(integer(FilmsGenre::FilmId))
                    .col(integer(FilmsGenre::GenreId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_films_genre_film")
                            .from(FilmsGenre::Table, FilmsGenre::FilmId)
                            .to(Films::Table, Films::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_films_genre_genre")
                            .from(FilmsGenre::Table, FilmsGenre::GenreId)
                            .to(Genres::Table, Genres::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_films_genre_unique")
                    .table(FilmsGenre::Table)
                    .col(FilmsGenre::FilmId)
                    .col(FilmsGenre::GenreId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Friends::Table)
                    .if_not_exists()
                    .col(integer(Friends::UserId))
                    .col(integer(Friends::FriendId))
                    .primary_key(Index::create().col(Friends::UserId).col(Friends::FriendId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friends_user")
                            .from(Friends::Table, Friends::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friends_friend")
                            .from(Friends::Table, Friends::FriendId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_likes_user")
                    .table(Likes::Table)
                    .col(Likes::UserId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Friends::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(FilmsGenre::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Likes::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Users::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Films::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(Genres::Table).to_owned()).await?;
        manager.drop_table(Table::drop().table(RatingMpa::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Films {
    Table,
    Id,
    Name,
    Description,
    ReleaseDate,
    Duration,
    RatingMpaId,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Login,
    Name,
    Birthday,
}

#[derive(DeriveIden)]
enum Likes {
    Table,
    FilmId,
    UserId,
}

#[derive(DeriveIden)]
enum FilmsGenre {
    Table,
    Id,
    FilmId,
    GenreId,
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

#[derive(DeriveIden)]
enum Friends {
    Table,
    UserId,
    FriendId,
}
