//! Table creation from the entity definitions.

use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, DbConn, DbErr, EntityTrait, Schema};

use super::entity::{comment, follow, group, post, user};

async fn create_table<E>(db: &DbConn, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let stmt = schema.create_table_from_entity(entity).if_not_exists().to_owned();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Create every table that does not exist yet, parents before children.
pub async fn sync_schema(db: &DbConn) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, user::Entity).await?;
    create_table(db, &schema, group::Entity).await?;
    create_table(db, &schema, post::Entity).await?;
    create_table(db, &schema, comment::Entity).await?;
    create_table(db, &schema, follow::Entity).await?;

    let unique_follow = Index::create()
        .name("follows_user_author_key")
        .table(follow::Entity)
        .col(follow::Column::UserId)
        .col(follow::Column::AuthorId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(db.get_database_backend().build(&unique_follow))
        .await?;

    tracing::info!("Database schema is up to date");
    Ok(())
}
