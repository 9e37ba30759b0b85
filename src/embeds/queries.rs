//! Postgres storage of tracked embeds.
//!
//! The database tests are ignored by default; run them with
//! `cargo test -- --ignored` against a Postgres reachable at `POSTGRES_HOST`.

use sqlx::PgPool;

use super::template::{EmbedStyle, EmbedTemplate, FieldTemplate};

/// An embed the bot posted and keeps refreshed. One per guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEmbed {
    pub guild_id: u64,
    pub channel_id: u64,
    pub message_id: u64,
    pub template: EmbedTemplate,
}

#[derive(sqlx::FromRow)]
struct EmbedRow {
    guild_snowflake: i64,
    channel_snowflake: i64,
    message_snowflake: i64,
    title: String,
    description: String,
    color: Option<i32>,
    author_name: Option<String>,
    author_url: Option<String>,
    author_icon_url: Option<String>,
    thumbnail_url: Option<String>,
    image_url: Option<String>,
}

#[derive(sqlx::FromRow)]
struct FieldRow {
    guild_snowflake: i64,
    name: String,
    value: String,
    inline: bool,
}

impl EmbedRow {
    fn into_tracked(self, fields: Vec<FieldTemplate>) -> TrackedEmbed {
        TrackedEmbed {
            guild_id: self.guild_snowflake as u64,
            channel_id: self.channel_snowflake as u64,
            message_id: self.message_snowflake as u64,
            template: EmbedTemplate {
                title: self.title,
                description: self.description,
                fields,
                style: EmbedStyle {
                    color: self.color.map(|color| color as u32),
                    author_name: self.author_name,
                    author_url: self.author_url,
                    author_icon_url: self.author_icon_url,
                    thumbnail_url: self.thumbnail_url,
                    image_url: self.image_url,
                },
            },
        }
    }
}

impl From<FieldRow> for FieldTemplate {
    fn from(row: FieldRow) -> Self {
        FieldTemplate {
            name: row.name,
            value: row.value,
            inline: row.inline,
        }
    }
}

pub async fn get_embed_for_guild(
    guild_id: u64,
    pool: &PgPool,
) -> Result<Option<TrackedEmbed>, sqlx::Error> {
    let guild_id = guild_id as i64;

    let row = sqlx::query_as::<_, EmbedRow>(
        r#"
        SELECT guild_snowflake, channel_snowflake, message_snowflake, title, description,
            color, author_name, author_url, author_icon_url, thumbnail_url, image_url
        FROM embeds
        WHERE guild_snowflake = $1
        "#,
    )
    .bind(guild_id)
    .fetch_optional(pool)
    .await?;

    let row = match row {
        Some(row) => row,
        None => return Ok(None),
    };

    let fields = sqlx::query_as::<_, FieldRow>(
        r#"
        SELECT guild_snowflake, name, value, inline
        FROM embed_fields
        WHERE guild_snowflake = $1
        ORDER BY position
        "#,
    )
    .bind(guild_id)
    .fetch_all(pool)
    .await?;

    Ok(Some(
        row.into_tracked(fields.into_iter().map(FieldTemplate::from).collect()),
    ))
}

pub async fn get_all_embeds(pool: &PgPool) -> Result<Vec<TrackedEmbed>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EmbedRow>(
        r#"
        SELECT guild_snowflake, channel_snowflake, message_snowflake, title, description,
            color, author_name, author_url, author_icon_url, thumbnail_url, image_url
        FROM embeds
        ORDER BY guild_snowflake
        "#,
    )
    .fetch_all(pool)
    .await?;

    let mut fields = sqlx::query_as::<_, FieldRow>(
        r#"
        SELECT guild_snowflake, name, value, inline
        FROM embed_fields
        ORDER BY guild_snowflake, position
        "#,
    )
    .fetch_all(pool)
    .await?
    .into_iter()
    .peekable();

    let mut embeds = Vec::with_capacity(rows.len());
    for row in rows {
        let mut row_fields = Vec::new();
        while let Some(field) = fields.next_if(|field| field.guild_snowflake <= row.guild_snowflake)
        {
            if field.guild_snowflake == row.guild_snowflake {
                row_fields.push(FieldTemplate::from(field));
            }
        }
        embeds.push(row.into_tracked(row_fields));
    }

    Ok(embeds)
}

/// Stores `embed` as the guild's tracked embed, replacing any previous one.
pub async fn set_embed_for_guild(embed: &TrackedEmbed, pool: &PgPool) -> Result<(), sqlx::Error> {
    let guild_id = embed.guild_id as i64;
    let style = &embed.template.style;

    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO embeds (
            guild_snowflake, channel_snowflake, message_snowflake, title, description,
            color, author_name, author_url, author_icon_url, thumbnail_url, image_url
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        ON CONFLICT (guild_snowflake)
        DO UPDATE SET
            channel_snowflake = EXCLUDED.channel_snowflake,
            message_snowflake = EXCLUDED.message_snowflake,
            title = EXCLUDED.title,
            description = EXCLUDED.description,
            color = EXCLUDED.color,
            author_name = EXCLUDED.author_name,
            author_url = EXCLUDED.author_url,
            author_icon_url = EXCLUDED.author_icon_url,
            thumbnail_url = EXCLUDED.thumbnail_url,
            image_url = EXCLUDED.image_url
        "#,
    )
    .bind(guild_id)
    .bind(embed.channel_id as i64)
    .bind(embed.message_id as i64)
    .bind(&embed.template.title)
    .bind(&embed.template.description)
    .bind(style.color.map(|color| color as i32))
    .bind(&style.author_name)
    .bind(&style.author_url)
    .bind(&style.author_icon_url)
    .bind(&style.thumbnail_url)
    .bind(&style.image_url)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM embed_fields
        WHERE guild_snowflake = $1
        "#,
    )
    .bind(guild_id)
    .execute(&mut *tx)
    .await?;

    for (position, field) in embed.template.fields.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO embed_fields (guild_snowflake, position, name, value, inline)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(guild_id)
        .bind(position as i32)
        .bind(&field.name)
        .bind(&field.value)
        .bind(field.inline)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(())
}

pub async fn clear_embed_for_guild(guild_id: u64, pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM embeds
        WHERE guild_snowflake = $1
        "#,
    )
    .bind(guild_id as i64)
    .execute(pool)
    .await?;

    Ok(())
}

/// Stops tracking `message_id`, leaving any newer embed of the guild in place.
pub async fn forget_embed_message(
    guild_id: u64,
    message_id: u64,
    pool: &PgPool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM embeds
        WHERE guild_snowflake = $1 AND message_snowflake = $2
        "#,
    )
    .bind(guild_id as i64)
    .bind(message_id as i64)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::get_test_database;

    const GUILD_SNOWFLAKE_1: u64 = 9876543219876543210;
    const GUILD_SNOWFLAKE_2: u64 = 1234567891234567890;
    const CHANNEL_SNOWFLAKE: u64 = 123456789123456789;
    const MESSAGE_SNOWFLAKE_1: u64 = 987654321987654321;
    const MESSAGE_SNOWFLAKE_2: u64 = 987654321987654322;

    fn tracked(guild_id: u64, message_id: u64, fields: &[(&str, &str)]) -> TrackedEmbed {
        TrackedEmbed {
            guild_id,
            channel_id: CHANNEL_SNOWFLAKE,
            message_id,
            template: EmbedTemplate {
                title: "Roster".to_string(),
                description: "{count_members raiders}".to_string(),
                fields: fields
                    .iter()
                    .map(|(name, value)| FieldTemplate {
                        name: name.to_string(),
                        value: value.to_string(),
                        inline: false,
                    })
                    .collect(),
                style: EmbedStyle::default(),
            },
        }
    }

    #[tokio::test]
    #[ignore = "requires a Postgres instance"]
    async fn set_embed_is_retrieved() {
        // arrange
        let pool = get_test_database().await;
        let mut embed = tracked(
            GUILD_SNOWFLAKE_1,
            MESSAGE_SNOWFLAKE_1,
            &[("Tanks", "{list_members tank}"), ("Healers", "{list_members healer}")],
        );
        embed.template.style = EmbedStyle {
            color: Some(0xFFFFFF),
            author_name: Some("Officers".to_string()),
            author_url: None,
            author_icon_url: Some("https://example.com/icon.png".to_string()),
            thumbnail_url: None,
            image_url: Some("https://example.com/banner.png".to_string()),
        };

        // act
        set_embed_for_guild(&embed, &pool).await.unwrap();
        let stored = get_embed_for_guild(GUILD_SNOWFLAKE_1, &pool).await.unwrap();

        // assert
        assert_eq!(stored, Some(embed));
    }

    #[tokio::test]
    #[ignore = "requires a Postgres instance"]
    async fn set_embed_replaces_previous_embed_and_fields() {
        let pool = get_test_database().await;
        set_embed_for_guild(
            &tracked(GUILD_SNOWFLAKE_1, MESSAGE_SNOWFLAKE_1, &[("a", "1"), ("b", "2")]),
            &pool,
        )
        .await
        .unwrap();
        let replacement = tracked(GUILD_SNOWFLAKE_1, MESSAGE_SNOWFLAKE_2, &[("c", "3")]);

        // act
        set_embed_for_guild(&replacement, &pool).await.unwrap();

        // assert
        assert_eq!(
            get_embed_for_guild(GUILD_SNOWFLAKE_1, &pool).await.unwrap(),
            Some(replacement)
        );
    }

    #[tokio::test]
    #[ignore = "requires a Postgres instance"]
    async fn get_all_embeds_groups_fields_by_guild() {
        // arrange
        let pool = get_test_database().await;
        let first = tracked(GUILD_SNOWFLAKE_1, MESSAGE_SNOWFLAKE_1, &[("a", "1")]);
        let second = tracked(GUILD_SNOWFLAKE_2, MESSAGE_SNOWFLAKE_2, &[]);
        set_embed_for_guild(&first, &pool).await.unwrap();
        set_embed_for_guild(&second, &pool).await.unwrap();

        // act
        let embeds = get_all_embeds(&pool).await.unwrap();

        // assert
        assert_eq!(embeds.len(), 2);
        assert!(embeds.contains(&first));
        assert!(embeds.contains(&second));
    }

    #[tokio::test]
    #[ignore = "requires a Postgres instance"]
    async fn forgetting_replaced_message_keeps_newer_embed() {
        // arrange
        let pool = get_test_database().await;
        set_embed_for_guild(
            &tracked(GUILD_SNOWFLAKE_1, MESSAGE_SNOWFLAKE_1, &[("a", "1")]),
            &pool,
        )
        .await
        .unwrap();
        let replacement = tracked(GUILD_SNOWFLAKE_1, MESSAGE_SNOWFLAKE_2, &[("b", "2")]);
        set_embed_for_guild(&replacement, &pool).await.unwrap();

        // act
        forget_embed_message(GUILD_SNOWFLAKE_1, MESSAGE_SNOWFLAKE_1, &pool)
            .await
            .unwrap();

        // assert
        assert_eq!(
            get_embed_for_guild(GUILD_SNOWFLAKE_1, &pool).await.unwrap(),
            Some(replacement)
        );
    }

    #[tokio::test]
    #[ignore = "requires a Postgres instance"]
    async fn forgetting_current_message_removes_embed() {
        let pool = get_test_database().await;
        set_embed_for_guild(&tracked(GUILD_SNOWFLAKE_1, MESSAGE_SNOWFLAKE_1, &[]), &pool)
            .await
            .unwrap();

        // act
        forget_embed_message(GUILD_SNOWFLAKE_1, MESSAGE_SNOWFLAKE_1, &pool)
            .await
            .unwrap();

        // assert
        assert!(get_embed_for_guild(GUILD_SNOWFLAKE_1, &pool)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    #[ignore = "requires a Postgres instance"]
    async fn clear_embed_removes_embed() {
        let pool = get_test_database().await;
        set_embed_for_guild(
            &tracked(GUILD_SNOWFLAKE_1, MESSAGE_SNOWFLAKE_1, &[("a", "1")]),
            &pool,
        )
        .await
        .unwrap();

        // act
        clear_embed_for_guild(GUILD_SNOWFLAKE_1, &pool).await.unwrap();

        // assert
        assert!(get_embed_for_guild(GUILD_SNOWFLAKE_1, &pool)
            .await
            .unwrap()
            .is_none());
    }
}
