//! CLI command definitions and argument parsing

use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sct_core::{
    clear_all_data, Contact, ContactBook, FileStore, KeyManager, LoadOutcome, MessageLog,
    StoredMessage,
};
use sct_crypto::{KdfParams, MessageCrypto, PublicKey};
use thiserror::Error;

use crate::config::Config;
use crate::output::{OutputFormat, OutputFormatter, SuccessMessage};
use crate::ExitCode;

/// Sender name recorded for messages this user encrypted.
const SELF_NAME: &str = "me";

/// SCT - end-to-end encrypted messages
#[derive(Parser, Debug)]
#[command(name = "sct")]
#[command(version, about = "SCT - end-to-end encrypted messages over any channel")]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: table, json, quiet (overrides config)
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding keys, contacts and messages (overrides config)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

/// Failures specific to command handling
#[derive(Debug, Error)]
pub enum CliError {
    #[error("no stored key pair; run `sct keys generate` first")]
    NoKeyPair,

    #[error("'{0}' is neither a contact name nor a valid public key")]
    UnknownPeer(String),

    #[error("no contact with public key {0}")]
    ContactNotFound(String),

    #[error("no message with id {0}")]
    MessageNotFound(String),

    #[error("{0}")]
    InvalidInput(String),
}

impl Cli {
    /// Execute the CLI command with a pre-loaded configuration
    pub async fn execute_with_config(self, config: Config) -> anyhow::Result<ExitCode> {
        let ctx = AppContext::from_config(&config)?;

        match self.command {
            Commands::Keys(args) => args.execute(&ctx).await,
            Commands::Contacts(args) => args.execute(&ctx).await,
            Commands::Encrypt(args) => args.execute(&ctx).await,
            Commands::Decrypt(args) => args.execute(&ctx).await,
            Commands::Messages(args) => args.execute(&ctx).await,
            Commands::Reset(args) => args.execute(&ctx).await,
        }
    }
}

/// Resolved store, key parameters and formatter shared by all commands
pub struct AppContext {
    pub store: Arc<FileStore>,
    pub params: KdfParams,
    pub formatter: OutputFormatter,
}

impl AppContext {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let data_dir = config
            .data_dir()
            .context("could not determine a data directory; pass --data-dir")?;
        let format = config.output.format.parse().unwrap_or_default();

        tracing::debug!(data_dir = %data_dir.display(), "using data directory");
        Ok(Self {
            store: Arc::new(FileStore::new(data_dir)),
            params: config.kdf.params(),
            formatter: OutputFormatter::new(format, config.output.verbose),
        })
    }

    fn key_manager(&self) -> KeyManager<FileStore> {
        KeyManager::new(self.store.clone(), self.params)
    }

    fn contacts(&self) -> ContactBook<FileStore> {
        ContactBook::new(self.store.clone())
    }

    fn messages(&self) -> MessageLog<FileStore> {
        MessageLog::new(self.store.clone())
    }

    /// Unlock the stored key pair or fail with `NoKeyPair`.
    async fn unlock(&self, password: &str) -> anyhow::Result<KeyManager<FileStore>> {
        check_password(&self.formatter, password);
        self.formatter.progress("Unlocking key pair...");
        let mut keys = self.key_manager();
        match keys.load_key_pair(password).await? {
            LoadOutcome::Loaded => Ok(keys),
            LoadOutcome::NoStoredKey => Err(CliError::NoKeyPair.into()),
        }
    }

    /// Resolve a contact name or a base64 public key.
    async fn resolve_peer(&self, peer: &str) -> anyhow::Result<(PublicKey, Option<String>)> {
        if let Some(contact) = self.contacts().find_by_name(peer).await? {
            let key = PublicKey::from_base64(&contact.public_key)
                .with_context(|| format!("stored key for contact '{}' is invalid", contact.name))?;
            return Ok((key, Some(contact.name)));
        }

        let key =
            PublicKey::from_base64(peer).map_err(|_| CliError::UnknownPeer(peer.to_string()))?;
        let name = self
            .contacts()
            .list()
            .await?
            .into_iter()
            .find(|c| c.public_key == key.to_base64())
            .map(|c| c.name);
        Ok((key, name))
    }
}

fn check_password(formatter: &OutputFormatter, password: &str) {
    if password.is_empty() {
        formatter.warning("Using an empty password; anyone with access to the data directory can read your key");
    }
}

/// Ask for y/N confirmation on stderr.
fn confirm(prompt: &str) -> io::Result<bool> {
    eprint!("{prompt} [y/N] ");
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the local key pair
    Keys(KeysArgs),
    /// Manage contacts
    Contacts(ContactsArgs),
    /// Encrypt a message for a contact
    Encrypt(EncryptArgs),
    /// Decrypt a packet from a contact
    Decrypt(DecryptArgs),
    /// Browse the local message log
    Messages(MessagesArgs),
    /// Erase keys, contacts and messages
    Reset(ResetArgs),
}

/// Password argument shared by commands that unlock the key pair
#[derive(clap::Args, Debug)]
pub struct PasswordArg {
    /// Password protecting the private key
    #[arg(long, env = "SCT_PASSWORD", hide_env_values = true)]
    pub password: String,
}

/// Arguments for the keys command
#[derive(Parser, Debug)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub action: KeysAction,
}

/// Key subcommands
#[derive(Subcommand, Debug)]
pub enum KeysAction {
    /// Generate a new key pair and store it under a password
    Generate {
        #[command(flatten)]
        password: PasswordArg,
        /// Replace an existing key pair
        #[arg(long)]
        force: bool,
    },
    /// Unlock the key pair and show the public key
    Show {
        #[command(flatten)]
        password: PasswordArg,
    },
    /// Delete the stored key pair (warning: old messages become unreadable)
    Clear {
        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

impl KeysArgs {
    pub async fn execute(self, ctx: &AppContext) -> anyhow::Result<ExitCode> {
        let formatter = &ctx.formatter;

        match self.action {
            KeysAction::Generate { password, force } => {
                let mut keys = ctx.key_manager();
                if keys.vault().has_stored_key().await && !force {
                    return Err(CliError::InvalidInput(
                        "a key pair already exists; pass --force to replace it".to_string(),
                    )
                    .into());
                }
                check_password(formatter, &password.password);

                formatter.progress("Generating key pair...");
                keys.generate_key_pair(&password.password).await?;
                let public_key = keys.public_key_base64().unwrap_or_default();

                formatter.success("Key pair generated and stored");
                print_if_nonempty(formatter.format_public_key(&public_key, "keys generate"));
                Ok(ExitCode::Success)
            }
            KeysAction::Show { password } => {
                let keys = ctx.unlock(&password.password).await?;
                let public_key = keys.public_key_base64().unwrap_or_default();
                print_if_nonempty(formatter.format_public_key(&public_key, "keys show"));
                Ok(ExitCode::Success)
            }
            KeysAction::Clear { force } => {
                if !force {
                    eprintln!("WARNING: Deleting your key pair makes every message sent to you unreadable.");
                    if !confirm("Are you sure you want to continue?")? {
                        eprintln!("Aborted.");
                        return Ok(ExitCode::Success);
                    }
                }

                ctx.key_manager().clear_key_pair().await;
                formatter.success("Key pair deleted");
                print_if_nonempty(
                    formatter.format_success(&SuccessMessage::new("key pair deleted"), "keys clear"),
                );
                Ok(ExitCode::Success)
            }
        }
    }
}

/// Arguments for the contacts command
#[derive(Parser, Debug)]
pub struct ContactsArgs {
    #[command(subcommand)]
    pub action: ContactsAction,
}

/// Contact subcommands
#[derive(Subcommand, Debug)]
pub enum ContactsAction {
    /// Add a contact, or rename the one with the same key
    Add {
        /// Display name
        #[arg(long)]
        name: String,
        /// Contact's public key (base64)
        #[arg(long)]
        public_key: String,
    },
    /// List contacts
    List,
    /// Remove a contact
    Remove {
        /// Contact's public key (base64)
        #[arg(long)]
        public_key: String,
    },
}

impl ContactsArgs {
    pub async fn execute(self, ctx: &AppContext) -> anyhow::Result<ExitCode> {
        let formatter = &ctx.formatter;
        let contacts = ctx.contacts();

        match self.action {
            ContactsAction::Add { name, public_key } => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(CliError::InvalidInput("contact name must not be empty".to_string()).into());
                }
                let key = PublicKey::from_base64(&public_key)?;

                contacts.save(Contact::new(name.clone(), &key)).await?;
                formatter.success(&format!("Saved contact '{name}'"));
                print_if_nonempty(formatter.format_success(
                    &Contact::new(name, &key),
                    "contacts add",
                ));
                Ok(ExitCode::Success)
            }
            ContactsAction::List => {
                let list = contacts.list().await?;
                print_if_nonempty(formatter.format_contacts(&list));
                Ok(ExitCode::Success)
            }
            ContactsAction::Remove { public_key } => {
                let key = PublicKey::from_base64(&public_key)?.to_base64();
                if !contacts.delete(&key).await? {
                    return Err(CliError::ContactNotFound(key).into());
                }
                formatter.success("Contact removed");
                print_if_nonempty(formatter.format_success(
                    &SuccessMessage::new("contact removed"),
                    "contacts remove",
                ));
                Ok(ExitCode::Success)
            }
        }
    }
}

/// Arguments for the encrypt command
#[derive(Parser, Debug)]
pub struct EncryptArgs {
    /// Recipient: contact name or base64 public key
    #[arg(long)]
    pub to: String,

    /// Message text ("-" reads stdin)
    #[arg(long)]
    pub message: String,

    #[command(flatten)]
    pub password: PasswordArg,
}

impl EncryptArgs {
    pub async fn execute(self, ctx: &AppContext) -> anyhow::Result<ExitCode> {
        let formatter = &ctx.formatter;
        let (receiver, receiver_name) = ctx.resolve_peer(&self.to).await?;
        let message = read_arg_or_stdin(self.message)?;

        let keys = ctx.unlock(&self.password.password).await?;
        let crypto = keys.crypto().ok_or(CliError::NoKeyPair)?;

        formatter.progress(&format!(
            "Encrypting for {}...",
            receiver_name.as_deref().unwrap_or("unnamed recipient")
        ));
        let packet = crypto.encrypt(&message, &receiver)?;

        let record = StoredMessage::new(
            crypto.public_key_base64(),
            SELF_NAME,
            receiver.to_base64(),
            packet.clone(),
        )?;
        let message_id = record.id.clone();
        ctx.messages().append(record).await?;

        println!("{}", formatter.format_packet(&packet, &message_id));
        Ok(ExitCode::Success)
    }
}

/// Arguments for the decrypt command
#[derive(Parser, Debug)]
pub struct DecryptArgs {
    /// Sender: contact name or base64 public key
    #[arg(long)]
    pub from: String,

    /// Packet to decrypt ("-" reads stdin)
    #[arg(long)]
    pub packet: String,

    #[command(flatten)]
    pub password: PasswordArg,
}

impl DecryptArgs {
    pub async fn execute(self, ctx: &AppContext) -> anyhow::Result<ExitCode> {
        let formatter = &ctx.formatter;
        let (sender, sender_name) = ctx.resolve_peer(&self.from).await?;
        let packet = read_arg_or_stdin(self.packet)?;

        let keys = ctx.unlock(&self.password.password).await?;
        let crypto: &MessageCrypto = keys.crypto().ok_or(CliError::NoKeyPair)?;

        formatter.progress("Decrypting...");
        let decrypted = crypto.decrypt(packet.trim(), &sender)?;

        println!("{}", formatter.format_decrypted(&decrypted, sender_name.as_deref()));
        Ok(ExitCode::Success)
    }
}

/// Arguments for the messages command
#[derive(Parser, Debug)]
pub struct MessagesArgs {
    #[command(subcommand)]
    pub action: MessagesAction,
}

/// Message log subcommands
#[derive(Subcommand, Debug)]
pub enum MessagesAction {
    /// List logged messages
    List,
    /// Delete a logged message
    Delete {
        /// Message id
        #[arg(long)]
        id: String,
    },
}

impl MessagesArgs {
    pub async fn execute(self, ctx: &AppContext) -> anyhow::Result<ExitCode> {
        let formatter = &ctx.formatter;
        let log = ctx.messages();

        match self.action {
            MessagesAction::List => {
                print_if_nonempty(formatter.format_messages(&log.list().await?));
                Ok(ExitCode::Success)
            }
            MessagesAction::Delete { id } => {
                if !log.delete(&id).await? {
                    return Err(CliError::MessageNotFound(id).into());
                }
                formatter.success("Message deleted");
                print_if_nonempty(formatter.format_success(
                    &SuccessMessage::new(format!("message {id} deleted")),
                    "messages delete",
                ));
                Ok(ExitCode::Success)
            }
        }
    }
}

/// Arguments for the reset command
#[derive(Parser, Debug)]
pub struct ResetArgs {
    /// Skip confirmation
    #[arg(long)]
    pub force: bool,
}

impl ResetArgs {
    pub async fn execute(self, ctx: &AppContext) -> anyhow::Result<ExitCode> {
        let formatter = &ctx.formatter;

        if !self.force {
            eprintln!("WARNING: This deletes your key pair, contacts and message log.");
            if !confirm("Are you sure you want to continue?")? {
                eprintln!("Aborted.");
                return Ok(ExitCode::Success);
            }
        }

        let removed = clear_all_data(ctx.store.as_ref()).await?;
        formatter.success(&format!("Removed {removed} stored item(s)"));
        print_if_nonempty(formatter.format_success(
            &SuccessMessage::new(format!("removed {removed} stored item(s)")),
            "reset",
        ));
        Ok(ExitCode::Success)
    }
}

fn print_if_nonempty(text: String) {
    if !text.is_empty() {
        println!("{text}");
    }
}

fn read_arg_or_stdin(value: String) -> anyhow::Result<String> {
    if value != "-" {
        return Ok(value);
    }
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .context("failed to read stdin")?;
    Ok(buf.trim_end_matches(['\r', '\n']).to_string())
}
