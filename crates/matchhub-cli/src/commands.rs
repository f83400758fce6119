//! One-shot subcommands.

use std::io::Write;

use matchhub_client::models::PaymentRequest;
use matchhub_core::RoomId;
use tracing::info;

use crate::{
    args::Command,
    chat,
    context::Context,
    error::CliError,
    render::{candidate_line, match_line, message_line, profile_lines, room_line},
};

/// Execute one subcommand, writing results to `out`.
pub async fn run(command: Command, ctx: &Context, out: &mut impl Write) -> Result<(), CliError> {
    let api = &ctx.api;

    match command {
        Command::Register { email, password } => {
            let notice = api.register(&email, &password).await?;
            writeln!(out, "{}", or_default(&notice.message, "Check your email for the code."))?;
        },

        Command::Verify { email, otp } => {
            let session = api.verify_otp(&email, &otp).await?;
            ctx.store.save(&session.tokens()).await?;
            info!(path = %ctx.store.path().display(), "logged in");
            writeln!(out, "Logged in as {}", session.user.anonymous_handle)?;
        },

        Command::Resend { email } => {
            let notice = api.resend_otp(&email).await?;
            writeln!(out, "{}", or_default(&notice.message, "A new code is on its way."))?;
        },

        Command::Logout => {
            ctx.store.clear().await?;
            writeln!(out, "Logged out")?;
        },

        Command::Profile => {
            let user = ctx.authed(|token| async move { api.profile(&token).await }).await?;
            for line in profile_lines(&user) {
                writeln!(out, "{line}")?;
            }
        },

        Command::Rooms => {
            let user = ctx.authed(|token| async move { api.profile(&token).await }).await?;
            let rooms = ctx.authed(|token| async move { api.chat_rooms(&token).await }).await?;
            if rooms.is_empty() {
                writeln!(out, "No chats yet. Find someone with `matchhub discover`.")?;
            }
            for room in &rooms {
                writeln!(out, "{}", room_line(room, &user.anonymous_handle))?;
            }
        },

        Command::History { room_id, page } => {
            let room = &RoomId::new(room_id);
            let user = ctx.authed(|token| async move { api.profile(&token).await }).await?;
            let mut messages = ctx
                .authed(|token| async move { api.room_messages_page(&token, room, page).await })
                .await?;
            messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            for message in &messages {
                writeln!(out, "{}", message_line(message, &user.anonymous_handle))?;
            }
        },

        Command::Discover => {
            let candidates = ctx.authed(|token| async move { api.candidates(&token).await }).await?;
            if candidates.is_empty() {
                writeln!(out, "Nobody new right now.")?;
            }
            for candidate in &candidates {
                writeln!(out, "{}", candidate_line(candidate))?;
            }
        },

        Command::Match { target_user_id, mode } => {
            let target = target_user_id.as_str();
            let created = ctx
                .authed(|token| async move { api.create_match(&token, target, mode).await })
                .await?;
            writeln!(out, "{}", match_line(&created))?;
        },

        Command::Pay { room_id, method } => {
            let request = PaymentRequest::subscription(RoomId::new(room_id), method);
            let request = &request;
            let payment = ctx
                .authed(|token| async move { api.initiate_payment(&token, request).await })
                .await?;
            match payment.redirect(method) {
                Some(link) => writeln!(out, "Complete the payment at {link}")?,
                None => writeln!(out, "Payment started ({})", payment.status.as_deref().unwrap_or("pending"))?,
            }
        },

        Command::Upload { path } => {
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|source| CliError::File { path: path.clone(), source })?;
            let name = path.file_name().map_or_else(|| "upload".into(), |n| n.to_string_lossy());
            let name = name.as_ref();
            let url = ctx
                .authed(|token| {
                    let bytes = bytes.clone();
                    async move { api.upload_file(&token, name, bytes).await }
                })
                .await?;
            writeln!(out, "{url}")?;
        },

        Command::Chat { room_id } => chat::run(ctx, RoomId::new(room_id), out).await?,
    }

    Ok(())
}

fn or_default<'a>(message: &'a str, fallback: &'a str) -> &'a str {
    if message.trim().is_empty() { fallback } else { message }
}
