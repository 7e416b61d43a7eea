//! Command-Line Interface (CLI) argument parsing.
//!
//! Each backend is a subcommand whose flags are its parameters. Everything
//! after the flags is the command to run. The parsed arguments are a figment
//! [`Provider`] yielding the same `[knockknock]` section a config file would,
//! so both entry points resolve their sender the same way.

use crate::config::SECTION;
use clap::{Args, Parser, Subcommand};
use figment::{
    value::{Dict, Map, Tag, Value},
    Error, Metadata, Profile, Provider,
};

/// KnockKnock - Be notified when your training is complete.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Show the full command in notifications.
    #[arg(long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub sender: Option<SenderCommand>,
}

/// The command line to run and watch.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct RunArgs {
    #[arg(
        value_name = "COMMAND",
        required = true,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SenderCommand {
    /// Send a Chime message when the command starts and ends.
    Chime {
        /// The webhook URL of your Chime room.
        #[arg(long)]
        webhook_url: String,
        /// User aliases or email addresses to notify, comma separated.
        #[arg(long)]
        user_mentions: Option<String>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Send a Zoho Cliq message when the command starts and ends.
    Cliq {
        #[arg(long)]
        webhook_url: String,
        /// User ids to notify, comma separated.
        #[arg(long)]
        user_mentions: Option<String>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Show a desktop notification when the command starts and ends.
    Desktop {
        /// Notification title, defaults to knockknock.
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Send a DingTalk message when the command starts and ends.
    Dingtalk {
        #[arg(long)]
        webhook_url: String,
        /// Phone numbers of users to notify, comma separated.
        #[arg(long)]
        user_mentions: Option<String>,
        /// The chatroom robot's signing secret.
        #[arg(long)]
        secret: Option<String>,
        /// Keywords the chatroom robot accepts, comma separated.
        #[arg(long)]
        keywords: Option<String>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Send a Discord message when the command starts and ends.
    Discord {
        /// The webhook URL of your Discord channel.
        #[arg(long)]
        webhook_url: String,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Send an email when the command starts and ends.
    Email {
        /// Addresses to notify, comma separated.
        #[arg(long)]
        recipient_emails: String,
        /// Sending address, defaults to the first recipient.
        #[arg(long)]
        sender_email: Option<String>,
        #[arg(long)]
        smtp_host: Option<String>,
        /// Falls back to KNOCKKNOCK_SMTP_PASSWORD.
        #[arg(long)]
        smtp_password: Option<String>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Send a Feishu message when the command starts and ends.
    Feishu {
        #[arg(long)]
        webhook_url: String,
        /// The bot's signing secret.
        #[arg(long)]
        secret: Option<String>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Send a LINE Notify message when the command starts and ends.
    Line {
        #[arg(long)]
        token: String,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Send a Matrix message when the command starts and ends.
    Matrix {
        /// The homeserver the bot is registered on.
        #[arg(long)]
        homeserver: String,
        /// Access token of the sending user.
        #[arg(long)]
        token: String,
        /// Alias or id of the room to post to.
        #[arg(long)]
        room: String,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Send a RocketChat message when the command starts and ends.
    Rocketchat {
        #[arg(long)]
        rocketchat_server_url: String,
        #[arg(long)]
        rocketchat_user_id: String,
        #[arg(long)]
        rocketchat_auth_token: String,
        #[arg(long)]
        channel: String,
        #[arg(long)]
        user_mentions: Option<String>,
        #[arg(long)]
        alias: Option<String>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Send a Slack message when the command starts and ends.
    Slack {
        /// The webhook URL of your Slack workspace.
        #[arg(long)]
        webhook_url: String,
        /// The channel to post to.
        #[arg(long)]
        channel: Option<String>,
        /// User ids to notify, comma separated.
        #[arg(long)]
        user_mentions: Option<String>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Send an SMS through Twilio when the command starts and ends.
    Sms {
        #[arg(long)]
        account_sid: String,
        #[arg(long)]
        auth_token: String,
        /// Twilio number sending the message.
        #[arg(long)]
        sender_number: String,
        #[arg(long)]
        recipient_number: String,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Send a Microsoft Teams message when the command starts and ends.
    Teams {
        #[arg(long)]
        webhook_url: String,
        #[arg(long)]
        user_mentions: Option<String>,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Send a Telegram message when the command starts and ends.
    Telegram {
        /// Bot API token.
        #[arg(long)]
        token: String,
        /// Chat id of your conversation with the bot.
        #[arg(long, allow_hyphen_values = true)]
        chat_id: String,
        #[command(flatten)]
        run: RunArgs,
    },
    /// Send a WeChat Work message when the command starts and ends.
    Wechat {
        #[arg(long)]
        webhook_url: String,
        /// User ids to notify, comma separated.
        #[arg(long)]
        user_mentions: Option<String>,
        /// Phone numbers of users to notify, comma separated.
        #[arg(long)]
        user_mentions_mobile: Option<String>,
        #[command(flatten)]
        run: RunArgs,
    },
}

type Flags<'a> = Vec<(&'static str, Option<&'a String>)>;

impl SenderCommand {
    /// Registry name of the selected backend.
    pub fn name(&self) -> &'static str {
        self.parts().0
    }

    pub fn run_args(&self) -> &RunArgs {
        self.parts().2
    }

    fn parts(&self) -> (&'static str, Flags<'_>, &RunArgs) {
        match self {
            SenderCommand::Chime { webhook_url, user_mentions, run } => (
                "chime",
                vec![("webhook_url", Some(webhook_url)), ("user_mentions", user_mentions.as_ref())],
                run,
            ),
            SenderCommand::Cliq { webhook_url, user_mentions, run } => (
                "cliq",
                vec![("webhook_url", Some(webhook_url)), ("user_mentions", user_mentions.as_ref())],
                run,
            ),
            SenderCommand::Desktop { title, run } => ("desktop", vec![("title", title.as_ref())], run),
            SenderCommand::Dingtalk { webhook_url, user_mentions, secret, keywords, run } => (
                "dingtalk",
                vec![
                    ("webhook_url", Some(webhook_url)),
                    ("user_mentions", user_mentions.as_ref()),
                    ("secret", secret.as_ref()),
                    ("keywords", keywords.as_ref()),
                ],
                run,
            ),
            SenderCommand::Discord { webhook_url, run } => {
                ("discord", vec![("webhook_url", Some(webhook_url))], run)
            }
            SenderCommand::Email { recipient_emails, sender_email, smtp_host, smtp_password, run } => (
                "email",
                vec![
                    ("recipient_emails", Some(recipient_emails)),
                    ("sender_email", sender_email.as_ref()),
                    ("smtp_host", smtp_host.as_ref()),
                    ("smtp_password", smtp_password.as_ref()),
                ],
                run,
            ),
            SenderCommand::Feishu { webhook_url, secret, run } => (
                "feishu",
                vec![("webhook_url", Some(webhook_url)), ("secret", secret.as_ref())],
                run,
            ),
            SenderCommand::Line { token, run } => ("line", vec![("token", Some(token))], run),
            SenderCommand::Matrix { homeserver, token, room, run } => (
                "matrix",
                vec![
                    ("homeserver", Some(homeserver)),
                    ("token", Some(token)),
                    ("room", Some(room)),
                ],
                run,
            ),
            SenderCommand::Rocketchat {
                rocketchat_server_url,
                rocketchat_user_id,
                rocketchat_auth_token,
                channel,
                user_mentions,
                alias,
                run,
            } => (
                "rocketchat",
                vec![
                    ("rocketchat_server_url", Some(rocketchat_server_url)),
                    ("rocketchat_user_id", Some(rocketchat_user_id)),
                    ("rocketchat_auth_token", Some(rocketchat_auth_token)),
                    ("channel", Some(channel)),
                    ("user_mentions", user_mentions.as_ref()),
                    ("alias", alias.as_ref()),
                ],
                run,
            ),
            SenderCommand::Slack { webhook_url, channel, user_mentions, run } => (
                "slack",
                vec![
                    ("webhook_url", Some(webhook_url)),
                    ("channel", channel.as_ref()),
                    ("user_mentions", user_mentions.as_ref()),
                ],
                run,
            ),
            SenderCommand::Sms { account_sid, auth_token, sender_number, recipient_number, run } => (
                "sms",
                vec![
                    ("account_sid", Some(account_sid)),
                    ("auth_token", Some(auth_token)),
                    ("sender_number", Some(sender_number)),
                    ("recipient_number", Some(recipient_number)),
                ],
                run,
            ),
            SenderCommand::Teams { webhook_url, user_mentions, run } => (
                "teams",
                vec![("webhook_url", Some(webhook_url)), ("user_mentions", user_mentions.as_ref())],
                run,
            ),
            SenderCommand::Telegram { token, chat_id, run } => (
                "telegram",
                vec![("token", Some(token)), ("chat_id", Some(chat_id))],
                run,
            ),
            SenderCommand::Wechat { webhook_url, user_mentions, user_mentions_mobile, run } => (
                "wechat",
                vec![
                    ("webhook_url", Some(webhook_url)),
                    ("user_mentions", user_mentions.as_ref()),
                    ("user_mentions_mobile", user_mentions_mobile.as_ref()),
                ],
                run,
            ),
        }
    }
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(sender) = &self.sender {
            let (name, flags, _) = sender.parts();
            let mut section = Dict::new();
            section.insert("sender".into(), Value::from(name));
            for (key, value) in flags {
                if let Some(value) = value {
                    section.insert(key.into(), Value::from(value.as_str()));
                }
            }
            dict.insert(SECTION.into(), Value::Dict(Tag::Default, section));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
