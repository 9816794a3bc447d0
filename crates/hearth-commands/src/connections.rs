//! Relationship chart commands.

use futures::future::join_all;
use hearth_common::UserId;
use hearth_graphs::connection_chart::AVATAR_SIZE;
use hearth_graphs::{
    added_message, fetch_avatar, removed_message, render_connection_chart, ConnectionChart, ConnectionError,
    ConnectionKind, ConnectionStore, NO_MATCH,
};
use poise::serenity_prelude as serenity;
use tracing::{info, warn};

use crate::framework::{reply_ephemeral, CommandError, Context, Error};
use crate::ids;

/// Reply accompanying the chart image.
pub const CHART_REPLY: &str = "Here's the connection chart:";
/// Reply when nothing has been declared yet.
pub const NO_CONNECTIONS: &str = "No connections have been added yet.";

/// Connection types offered as slash command choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum ConnectionChoice {
    /// Sibling.
    Sibling,
    /// Friend.
    Friend,
    /// Roommate.
    Roommate,
    /// Partner.
    Partner,
    /// Acquaintance.
    Acquaintance,
    /// Cousin.
    Cousin,
}

impl From<ConnectionChoice> for ConnectionKind {
    fn from(choice: ConnectionChoice) -> Self {
        match choice {
            ConnectionChoice::Sibling => Self::Sibling,
            ConnectionChoice::Friend => Self::Friend,
            ConnectionChoice::Roommate => Self::Roommate,
            ConnectionChoice::Partner => Self::Partner,
            ConnectionChoice::Acquaintance => Self::Acquaintance,
            ConnectionChoice::Cousin => Self::Cousin,
        }
    }
}

fn store<'a>(ctx: &Context<'a>) -> Result<&'a ConnectionStore, Error> {
    ctx.data()
        .connections
        .as_ref()
        .ok_or_else(|| CommandError::CogDisabled("connection chart").into())
}

/// Name shown for `user` in this guild: nickname, then global name, then username.
async fn display_name(ctx: Context<'_>, user: &serenity::User) -> String {
    if let Some(guild_id) = ctx.guild_id() {
        if let Some(nick) = user.nick_in(ctx, guild_id).await {
            return nick;
        }
    }
    user.display_name().to_string()
}

/// Add a connection between yourself and another user.
#[poise::command(slash_command, guild_only)]
pub async fn addconnection(
    ctx: Context<'_>,
    #[description = "The other member"] user: serenity::User,
    #[description = "Type of connection"] connection: ConnectionChoice,
) -> Result<(), Error> {
    let store = store(&ctx)?;
    let kind = ConnectionKind::from(connection);

    match store.add(ids::user(ctx.author().id), ids::user(user.id), kind).await {
        Ok(()) => {}
        Err(e @ ConnectionError::SelfConnection) => return reply_ephemeral(ctx, e.to_string()).await,
        Err(e) => return Err(e.into()),
    }

    let from = display_name(ctx, ctx.author()).await;
    let to = display_name(ctx, &user).await;
    reply_ephemeral(ctx, added_message(&from, kind, &to)).await
}

/// Remove a connection involving yourself and another user.
#[poise::command(slash_command, guild_only)]
pub async fn removeconnection(
    ctx: Context<'_>,
    #[description = "The other member"] user: serenity::User,
    #[description = "Type of connection"] connection: ConnectionChoice,
) -> Result<(), Error> {
    let store = store(&ctx)?;
    let kind = ConnectionKind::from(connection);

    let removed = store
        .remove(ids::user(ctx.author().id), ids::user(user.id), kind)
        .await?;
    if removed == 0 {
        return reply_ephemeral(ctx, NO_MATCH).await;
    }

    let from = display_name(ctx, ctx.author()).await;
    let to = display_name(ctx, &user).await;
    reply_ephemeral(ctx, removed_message(&from, kind, &to)).await
}

/// Display the member connection chart with avatars.
#[poise::command(slash_command, guild_only)]
pub async fn connectionchart(ctx: Context<'_>) -> Result<(), Error> {
    let store = store(&ctx)?;
    let guild_id = ctx.guild_id().ok_or(CommandError::NotInGuild)?;
    ctx.defer().await?;

    let connections = store.all().await;
    if connections.is_empty() {
        ctx.say(NO_CONNECTIONS).await?;
        return Ok(());
    }

    let guild_name = ctx
        .guild()
        .map_or_else(|| "Server".to_string(), |guild| guild.name.clone());
    let mut chart = ConnectionChart::from_connections(&guild_name, &connections);

    let http = &ctx.data().http;
    let members = join_all(chart.nodes.iter().map(|node| resolve_member(ctx, guild_id, node.user))).await;
    let avatars = join_all(members.iter().map(|member| async move {
        let (_, url) = member.as_ref()?;
        match fetch_avatar(http, url, AVATAR_SIZE).await {
            Ok(avatar) => Some(avatar),
            Err(e) => {
                warn!(error = %e, "Could not fetch avatar, drawing a placeholder");
                None
            }
        }
    }))
    .await;

    for ((node, member), avatar) in chart.nodes.iter_mut().zip(members).zip(avatars) {
        if let Some((name, _)) = member {
            node.name = name;
        }
        node.avatar = avatar;
    }

    let png = tokio::task::spawn_blocking(move || render_connection_chart(&chart)).await??;
    info!(guild = %guild_id, connections = connections.len(), "Sent connection chart");

    ctx.send(
        poise::CreateReply::default()
            .content(CHART_REPLY)
            .attachment(serenity::CreateAttachment::bytes(png, "connection_chart.png")),
    )
    .await?;
    Ok(())
}

/// Display name and avatar URL of a guild member, if still present.
async fn resolve_member(ctx: Context<'_>, guild_id: serenity::GuildId, user: UserId) -> Option<(String, String)> {
    let id = ids::to_user(user)?;
    match guild_id.member(ctx, id).await {
        Ok(member) => Some((member.display_name().to_string(), member.face())),
        Err(e) => {
            warn!(user = %user, error = %e, "Member not found for connection chart");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use poise::ChoiceParameter;

    #[test]
    fn test_choices_cover_every_kind() {
        let kinds: Vec<ConnectionKind> = ConnectionChoice::list()
            .iter()
            .map(|choice| {
                let choice = ConnectionChoice::from_name(&choice.name).unwrap();
                ConnectionKind::from(choice)
            })
            .collect();
        assert_eq!(kinds, ConnectionKind::ALL.to_vec());
    }
}
