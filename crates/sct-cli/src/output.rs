//! Output formatting for CLI results
//!
//! Three output formats:
//! - Table: Human-readable tables (default)
//! - JSON: Structured JSON for scripting and automation
//! - Quiet: Minimal output, exit codes only

use std::str::FromStr;

use chrono::{TimeZone, Utc};
use comfy_table::{presets::UTF8_FULL, Table};
use sct_core::{Contact, StoredMessage};
use sct_crypto::DecryptedMessage;
use serde::Serialize;

use crate::ExitCode;

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for scripting
    Json,
    /// Minimal output - exit codes only
    Quiet,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(Self::Table),
            "json" => Ok(Self::Json),
            "quiet" => Ok(Self::Quiet),
            _ => Err(format!("Unknown output format: {s}")),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Json => write!(f, "json"),
            Self::Quiet => write!(f, "quiet"),
        }
    }
}

/// Standard JSON response wrapper for successful commands
#[derive(Serialize)]
pub struct JsonResponse<T: Serialize> {
    /// Whether the operation was successful
    pub success: bool,
    /// The response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// ISO 8601 timestamp
    pub timestamp: String,
    /// Command that was executed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl<T: Serialize> JsonResponse<T> {
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            timestamp: Utc::now().to_rfc3339(),
            command: None,
        }
    }

    /// Create a successful response with command context
    pub fn success_with_command(data: T, command: &str) -> Self {
        Self {
            command: Some(command.to_string()),
            ..Self::success(data)
        }
    }
}

/// Formats output for different modes
pub struct OutputFormatter {
    format: OutputFormat,
    verbose: bool,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(format: OutputFormat, verbose: bool) -> Self {
        Self { format, verbose }
    }

    /// Get the current output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format the local public key
    pub fn format_public_key(&self, public_key: &str, command: &str) -> String {
        match self.format {
            OutputFormat::Table => {
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(vec!["Property", "Value"]);
                table.add_row(vec!["Public Key", public_key]);
                table.add_row(vec!["Algorithm", "X25519"]);
                table.to_string()
            }
            OutputFormat::Json => self.to_json_response(
                &KeyOutput {
                    public_key: public_key.to_string(),
                },
                command,
            ),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format contact list
    pub fn format_contacts(&self, contacts: &[Contact]) -> String {
        match self.format {
            OutputFormat::Table => self.contacts_table(contacts),
            OutputFormat::Json => self.to_json_response(
                &ContactsOutput {
                    count: contacts.len(),
                    contacts,
                },
                "contacts list",
            ),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format message log
    pub fn format_messages(&self, messages: &[StoredMessage]) -> String {
        match self.format {
            OutputFormat::Table => self.messages_table(messages),
            OutputFormat::Json => self.to_json_response(
                &MessagesOutput {
                    count: messages.len(),
                    messages: messages.iter().map(MessageJson::from).collect(),
                },
                "messages list",
            ),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format an encrypted packet.
    ///
    /// Quiet mode prints the bare packet so it can be piped.
    pub fn format_packet(&self, packet: &str, message_id: &str) -> String {
        match self.format {
            OutputFormat::Table | OutputFormat::Quiet => packet.to_string(),
            OutputFormat::Json => self.to_json_response(
                &PacketOutput {
                    packet: packet.to_string(),
                    message_id: message_id.to_string(),
                },
                "encrypt",
            ),
        }
    }

    /// Format a decrypted message.
    ///
    /// Quiet mode prints the bare plaintext.
    pub fn format_decrypted(&self, decrypted: &DecryptedMessage, sender_name: Option<&str>) -> String {
        match self.format {
            OutputFormat::Table => {
                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(vec!["Property", "Value"]);
                table.add_row(vec!["From", sender_name.unwrap_or("-")]);
                table.add_row(vec!["Sender Key", &decrypted.sender_pub]);
                table.add_row(vec!["Message", &decrypted.message]);
                table.to_string()
            }
            OutputFormat::Json => self.to_json_response(decrypted, "decrypt"),
            OutputFormat::Quiet => decrypted.message.clone(),
        }
    }

    /// Format a generic success result
    pub fn format_success<T: Serialize>(&self, data: &T, command: &str) -> String {
        match self.format {
            OutputFormat::Table => String::new(),
            OutputFormat::Json => self.to_json_response(data, command),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format error with exit code context
    pub fn format_error_with_code(&self, error: &str, code: ExitCode) -> String {
        match self.format {
            OutputFormat::Table => format!("Error: {error}"),
            OutputFormat::Json => self.to_json(&ErrorOutput {
                success: false,
                error: error.to_string(),
                exit_code: code as i32,
                exit_code_name: code.name(),
                exit_code_description: code.description(),
                timestamp: Utc::now().to_rfc3339(),
            }),
            OutputFormat::Quiet => String::new(),
        }
    }

    /// Format progress message (only shown in verbose mode)
    pub fn progress(&self, message: &str) {
        if self.verbose && self.format == OutputFormat::Table {
            eprintln!("... {message}");
        }
    }

    /// Format success message
    pub fn success(&self, message: &str) {
        if self.format == OutputFormat::Table {
            println!("✓ {message}");
        }
    }

    /// Format warning message
    pub fn warning(&self, message: &str) {
        match self.format {
            OutputFormat::Table => eprintln!("⚠ {message}"),
            OutputFormat::Json => eprintln!(
                "{}",
                self.to_json(&WarningOutput {
                    warning: message.to_string(),
                    timestamp: Utc::now().to_rfc3339(),
                })
            ),
            OutputFormat::Quiet => {}
        }
    }

    fn to_json<T: Serialize>(&self, value: &T) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }

    fn to_json_response<T: Serialize>(&self, value: &T, command: &str) -> String {
        self.to_json(&JsonResponse::success_with_command(value, command))
    }

    fn contacts_table(&self, contacts: &[Contact]) -> String {
        if contacts.is_empty() {
            return "No contacts found.".to_string();
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Name", "Public Key"]);
        for c in contacts {
            table.add_row(vec![&c.name, &c.public_key]);
        }
        table.to_string()
    }

    fn messages_table(&self, messages: &[StoredMessage]) -> String {
        if messages.is_empty() {
            return "No messages found.".to_string();
        }

        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["ID", "From", "To", "Sent At", "Size"]);
        for m in messages {
            table.add_row(vec![
                m.id.clone(),
                m.sender_name.clone(),
                short_key(&m.receiver_public_key),
                format_millis(m.timestamp),
                m.encrypted_data.len().to_string(),
            ]);
        }
        table.to_string()
    }
}

/// First 12 characters of a base64 key, for table display.
fn short_key(key: &str) -> String {
    match key.get(..12) {
        Some(prefix) if key.len() > 12 => format!("{prefix}…"),
        _ => key.to_string(),
    }
}

fn format_millis(millis: i64) -> String {
    Utc.timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_millis_iso(millis: i64) -> Option<String> {
    Utc.timestamp_millis_opt(millis).single().map(|dt| dt.to_rfc3339())
}

// JSON output structures

#[derive(Serialize)]
struct KeyOutput {
    public_key: String,
}

#[derive(Serialize)]
struct ContactsOutput<'a> {
    contacts: &'a [Contact],
    count: usize,
}

#[derive(Serialize)]
struct MessagesOutput<'a> {
    messages: Vec<MessageJson<'a>>,
    count: usize,
}

#[derive(Serialize)]
struct MessageJson<'a> {
    #[serde(flatten)]
    message: &'a StoredMessage,
    sent_at_iso: Option<String>,
}

impl<'a> From<&'a StoredMessage> for MessageJson<'a> {
    fn from(m: &'a StoredMessage) -> Self {
        Self {
            message: m,
            sent_at_iso: format_millis_iso(m.timestamp),
        }
    }
}

#[derive(Serialize)]
struct PacketOutput {
    packet: String,
    message_id: String,
}

#[derive(Serialize)]
struct ErrorOutput {
    success: bool,
    error: String,
    exit_code: i32,
    exit_code_name: &'static str,
    exit_code_description: &'static str,
    timestamp: String,
}

#[derive(Serialize)]
struct WarningOutput {
    warning: String,
    timestamp: String,
}

/// Simple success message for JSON output
#[derive(Serialize)]
pub struct SuccessMessage {
    pub message: String,
}

impl SuccessMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
