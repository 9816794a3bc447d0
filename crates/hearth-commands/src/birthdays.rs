//! Birthday commands.

use hearth_birthdays::{BirthdayDate, BirthdayError, BirthdayRecord, BirthdayStore};
use hearth_common::UserId;
use poise::serenity_prelude as serenity;
use tracing::info;

use crate::framework::{reply_ephemeral, CommandError, Context, Error};
use crate::ids;

const MISSING_DATE: &str = "You need to provide a date in MM-DD format. Example: `/set_birthday @user 12-25`.";
const REMOVE_FORBIDDEN: &str = "You can only remove your own birthday. Removing someone else's needs the Manage Server permission.";

fn store<'a>(ctx: &Context<'a>) -> Result<&'a BirthdayStore, Error> {
    ctx.data()
        .birthdays
        .as_ref()
        .ok_or_else(|| CommandError::BirthdaysDisabled.into())
}

fn mention(user: &serenity::User) -> String {
    ids::user(user.id).mention()
}

/// Every known birthday as one message.
pub fn birthday_list(records: &[BirthdayRecord]) -> String {
    if records.is_empty() {
        return "I don't have any birthdays saved yet. 😔".to_string();
    }
    let lines: Vec<_> = records
        .iter()
        .map(|record| format!("🎂 **{}**: {}", record.username, record.date))
        .collect();
    format!("Here are all the birthdays I know:\n{}", lines.join("\n"))
}

/// Whether `invoker` may delete the birthday of `target`.
pub fn may_remove(invoker: UserId, target: UserId, manages_guild: bool) -> bool {
    invoker == target || manages_guild
}

async fn manages_guild(ctx: Context<'_>) -> bool {
    ctx.author_member()
        .await
        .and_then(|member| member.permissions)
        .is_some_and(|permissions| permissions.manage_guild())
}

/// Set a birthday for yourself or another user.
#[poise::command(slash_command, guild_only)]
pub async fn set_birthday(
    ctx: Context<'_>,
    #[description = "Whose birthday (defaults to you)"] target_user: Option<serenity::User>,
    #[description = "Birthday in MM-DD format"] date: Option<String>,
) -> Result<(), Error> {
    let store = store(&ctx)?;
    let target = target_user.as_ref().unwrap_or_else(|| ctx.author());

    let Some(raw) = date else {
        return reply_ephemeral(ctx, MISSING_DATE).await;
    };
    let date = match raw.parse::<BirthdayDate>() {
        Ok(date) => date,
        Err(e @ BirthdayError::InvalidDate(_)) => return reply_ephemeral(ctx, e.to_string()).await,
        Err(e) => return Err(e.into()),
    };

    store.set(ids::user(target.id), &target.name, date).await?;
    ctx.say(format!("{}, your birthday has been set to {date}. 🎉", mention(target)))
        .await?;
    Ok(())
}

/// Ask when a user's birthday is.
#[poise::command(slash_command, guild_only)]
pub async fn when_is(
    ctx: Context<'_>,
    #[description = "Whose birthday"] target_user: serenity::User,
) -> Result<(), Error> {
    let store = store(&ctx)?;

    let response = match store.get(ids::user(target_user.id)).await? {
        Some(date) => format!("{}'s birthday is on {date}. 🎂", mention(&target_user)),
        None => format!("I don't have a birthday saved for {}. 😔", mention(&target_user)),
    };
    ctx.say(response).await?;
    Ok(())
}

/// List all known birthdays.
#[poise::command(slash_command, guild_only)]
pub async fn list_birthdays(ctx: Context<'_>) -> Result<(), Error> {
    let records = store(&ctx)?.list().await?;
    ctx.say(birthday_list(&records)).await?;
    Ok(())
}

/// Forget a stored birthday.
///
/// Anyone may remove their own entry; removing another member's requires the
/// Manage Server permission.
#[poise::command(slash_command, guild_only)]
pub async fn remove_birthday(
    ctx: Context<'_>,
    #[description = "Whose birthday (defaults to you)"] target_user: Option<serenity::User>,
) -> Result<(), Error> {
    let store = store(&ctx)?;
    let target = target_user.as_ref().unwrap_or_else(|| ctx.author());
    let invoker = ids::user(ctx.author().id);
    let target_id = ids::user(target.id);

    let manages = invoker != target_id && manages_guild(ctx).await;
    if !may_remove(invoker, target_id, manages) {
        info!(invoker = %invoker, target = %target_id, "Refused to remove another member's birthday");
        return reply_ephemeral(ctx, REMOVE_FORBIDDEN).await;
    }

    let response = if store.remove(ids::user(target.id)).await? {
        format!("Removed the birthday of {}.", mention(target))
    } else {
        format!("I don't have a birthday saved for {}. 😔", mention(target))
    };
    reply_ephemeral(ctx, response).await
}
