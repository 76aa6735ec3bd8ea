// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::attachment::load_attachment;
use crate::core::{ApiClient, MessagingApi};
use crate::environment::EnvironmentConfig;
use crate::error::MessagingError;
use crate::messenger::Messenger;
use crate::session::Session;
use crate::types::{Draft, InterviewDetails, Message, MessageBody, OtherUser};
use crate::utils::format_file_size;

pub const TOKEN_ENV: &str = "HIRECHAT_TOKEN";

#[derive(Parser)]
#[command(name = "hirechat")]
#[command(about = "Message job seekers who applied to your postings")]
pub struct HirechatCli {
    #[command(subcommand)]
    pub command: HirechatCommand,

    /// Bearer token; falls back to HIRECHAT_TOKEN
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[arg(long, global = true, default_value = "config.yaml")]
    pub config: PathBuf,
}

#[derive(Subcommand)]
pub enum HirechatCommand {
    /// List conversations, newest first
    Conversations {
        #[arg(long)]
        search: Option<String>,
    },
    /// Show the thread with a job seeker
    History { seeker_id: String },
    /// Show whether a job seeker can be messaged
    Status { seeker_id: String },
    /// Send a text message and/or a file
    Send {
        seeker_id: String,
        text: Option<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Propose an interview
    Interview {
        seeker_id: String,
        #[arg(long)]
        date: String,
        #[arg(long)]
        time: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        link: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark a conversation as read
    Read { conversation_id: String },
}

impl HirechatCli {
    /// `--token`, then the environment
    pub fn resolve_token(&self) -> Result<String> {
        self.token
            .clone()
            .or_else(|| std::env::var(TOKEN_ENV).ok())
            .filter(|t| !t.trim().is_empty())
            .with_context(|| format!("No token: pass --token or set {}", TOKEN_ENV))
    }
}

pub async fn handle_command(cli: HirechatCli, config: &EnvironmentConfig) -> Result<()> {
    let session = Session::from_token(&cli.resolve_token()?)?;
    info!("Session for user {} against {}", session.user_id, config.api_base_url);

    let client = ApiClient::new(&config.api_base_url, session.clone(), config.timeout_seconds)?;
    let api: Arc<dyn MessagingApi> = Arc::new(client);
    let mut messenger = Messenger::new(api, session)
        .with_file_base_url(&config.api_base_url)
        .with_scroll_anchor(config.scroll_anchor());

    match cli.command {
        HirechatCommand::Conversations { search } => {
            messenger.refresh_conversations().await?;
            let store = messenger.store();
            let matches = store.search(search.as_deref().unwrap_or_default());
            if matches.is_empty() {
                println!("No conversations");
            }
            for conv in matches {
                let preview = conv
                    .last_message
                    .as_ref()
                    .map(|m| m.content.as_str())
                    .unwrap_or("No messages yet");
                let unread = if conv.unread_count > 0 {
                    format!(" ({} unread)", conv.unread_count)
                } else {
                    String::new()
                };
                println!("{}  {}{}  {}", conv.id, conv.other_user.name, unread, preview);
            }
            println!("Total unread: {}", store.total_unread());
        }

        HirechatCommand::History { seeker_id } => {
            let seeker = lookup_seeker(&mut messenger, &seeker_id).await?;
            let opened = messenger.open(&seeker).await?;
            if let Some(notice) = opened.notice {
                println!("⚠️  {}", notice.user_message());
            }
            let lines: Vec<String> = messenger
                .channel()
                .messages()
                .map(|msg| render(&messenger, msg))
                .collect();
            if lines.is_empty() {
                println!("No messages with {} yet", seeker_display(&seeker));
            }
            for line in lines {
                println!("{}", line);
            }
        }

        HirechatCommand::Status { seeker_id } => {
            let seeker = lookup_seeker(&mut messenger, &seeker_id).await?;
            messenger.open(&seeker).await?;
            let status = messenger
                .eligibility()
                .status()
                .map(|s| s.label())
                .unwrap_or_else(|| "Checking".to_string());
            println!("{}: {}", seeker_display(&seeker), status);
            match messenger.blocked_reason() {
                None => println!("✅ Messaging allowed"),
                Some(reason) => println!("❌ {}", reason),
            }
        }

        HirechatCommand::Send {
            seeker_id,
            text,
            file,
        } => {
            let seeker = lookup_seeker(&mut messenger, &seeker_id).await?;
            messenger.open(&seeker).await?;

            let mut draft = Draft::text(text.unwrap_or_default());
            if let Some(path) = file {
                let policy = crate::attachment::AttachmentPolicy::messaging();
                let attachment = load_attachment(&path, &policy)
                    .await
                    .map_err(MessagingError::from)?;
                draft = draft.with_attachment(attachment);
            }

            let sent = messenger.send(draft).await?;
            println!("✅ Sent to {}: {}", seeker_display(&seeker), sent.preview());
        }

        HirechatCommand::Interview {
            seeker_id,
            date,
            time,
            location,
            link,
            notes,
        } => {
            let seeker = lookup_seeker(&mut messenger, &seeker_id).await?;
            messenger.open(&seeker).await?;

            let details = InterviewDetails {
                date,
                time,
                location,
                meeting_link: link,
                notes,
            };
            let sent = messenger.schedule_interview(&details).await?;
            println!("✅ {}", sent.preview());
        }

        HirechatCommand::Read { conversation_id } => {
            messenger.mark_read(&conversation_id).await?;
            println!("✅ Conversation {} marked as read", conversation_id);
        }
    }

    Ok(())
}

/// Name the seeker from the conversation list when possible
async fn lookup_seeker(messenger: &mut Messenger, seeker_id: &str) -> Result<OtherUser> {
    match messenger.refresh_conversations().await {
        Ok(_) => {}
        Err(MessagingError::Unauthorized) => return Err(MessagingError::Unauthorized.into()),
        Err(e) => warn!("Conversation list unavailable: {}", e),
    }
    Ok(messenger
        .store()
        .find_by_participant(seeker_id)
        .map(|c| c.other_user.clone())
        .unwrap_or_else(|| OtherUser::new(seeker_id, "")))
}

fn seeker_display(seeker: &OtherUser) -> &str {
    if seeker.name.is_empty() {
        &seeker.id
    } else {
        &seeker.name
    }
}

fn render(messenger: &Messenger, msg: &Message) -> String {
    let who = if messenger.is_mine(msg) { "you" } else { "them" };
    let when = msg.created_at.format("%Y-%m-%d %H:%M");
    let body = match msg.body() {
        MessageBody::Text(text) => text.to_string(),
        MessageBody::File {
            name,
            size,
            caption,
            ..
        } => {
            let size = size.map(format_file_size).unwrap_or_default();
            let url = messenger.file_url(msg).unwrap_or_default();
            match caption {
                Some(caption) => format!("📎 {} {} {}\n    {}", name, size, url, caption),
                None => format!("📎 {} {} {}", name, size, url),
            }
        }
        MessageBody::Interview { details, note } => {
            let mut text = format!("📅 Interview on {} at {}", details.date, details.time);
            if let Some(location) = &details.location {
                text.push_str(&format!(", {}", location));
            }
            if let Some(link) = &details.meeting_link {
                text.push_str(&format!(", {}", link));
            }
            if let Some(notes) = details.notes.as_deref().or(note) {
                text.push_str(&format!("\n    {}", notes));
            }
            text
        }
    };
    format!("[{}] {}: {}", when, who, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_send_with_file() {
        let cli = HirechatCli::try_parse_from([
            "hirechat",
            "send",
            "js-1",
            "Please see the offer",
            "--file",
            "offer.pdf",
            "--token",
            "abc",
        ])
        .unwrap();
        assert_eq!(cli.resolve_token().unwrap(), "abc");
        match cli.command {
            HirechatCommand::Send {
                seeker_id,
                text,
                file,
            } => {
                assert_eq!(seeker_id, "js-1");
                assert_eq!(text.as_deref(), Some("Please see the offer"));
                assert_eq!(file, Some(PathBuf::from("offer.pdf")));
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_interview_requires_date_and_time() {
        assert!(HirechatCli::try_parse_from(["hirechat", "interview", "js-1", "--time", "10:00"])
            .is_err());
        assert!(HirechatCli::try_parse_from([
            "hirechat", "interview", "js-1", "--date", "2026-02-10", "--time", "10:00"
        ])
        .is_ok());
    }
}
