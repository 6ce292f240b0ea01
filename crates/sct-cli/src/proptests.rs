//! Property-based tests for sct-cli

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use sct_core::{Contact, StoredMessage};

    use crate::config::{CliOverrides, Config};
    use crate::output::{OutputFormat, OutputFormatter};

    fn output_format() -> impl Strategy<Value = OutputFormat> {
        prop_oneof![
            Just(OutputFormat::Table),
            Just(OutputFormat::Json),
            Just(OutputFormat::Quiet),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        // Display and FromStr agree for every format
        #[test]
        fn test_output_format_display_parse(format in output_format()) {
            let parsed: OutputFormat = format.to_string().parse().unwrap();
            prop_assert_eq!(parsed, format);
        }

        // Set overrides always win; unset ones leave the file value alone
        #[test]
        fn test_overrides_precedence(
            file_format in output_format(),
            cli_format in proptest::option::of(output_format()),
            file_verbose in any::<bool>(),
            cli_verbose in proptest::option::of(any::<bool>())
        ) {
            let mut config = Config::default();
            config.output.format = file_format.to_string();
            config.output.verbose = file_verbose;

            let overrides = CliOverrides {
                output_format: cli_format.map(|f| f.to_string()),
                verbose: cli_verbose,
                ..Default::default()
            };
            let config = config.with_overrides(&overrides);

            prop_assert_eq!(config.output.format.as_str(), cli_format.unwrap_or(file_format).to_string());
            prop_assert_eq!(config.output.verbose, cli_verbose.unwrap_or(file_verbose));
            prop_assert!(config.validate().is_ok());
        }

        // JSON output stays valid JSON whatever the contact names contain
        #[test]
        fn test_contacts_json_always_valid(names in prop::collection::vec(any::<String>(), 0..8)) {
            let contacts: Vec<Contact> = names
                .into_iter()
                .map(|name| Contact { name, public_key: "key".to_string() })
                .collect();

            let formatter = OutputFormatter::new(OutputFormat::Json, false);
            let value: serde_json::Value = serde_json::from_str(&formatter.format_contacts(&contacts)).unwrap();
            prop_assert_eq!(value["data"]["count"].as_u64(), Some(contacts.len() as u64));
        }

        // Quiet mode never prints lists
        #[test]
        fn test_quiet_lists_empty(count in 0usize..5) {
            let messages: Vec<StoredMessage> = (0..count)
                .map(|i| StoredMessage {
                    id: i.to_string(),
                    sender_public_key: "s".to_string(),
                    sender_name: "me".to_string(),
                    receiver_public_key: "r".to_string(),
                    encrypted_data: "p".to_string(),
                    timestamp: i as i64,
                })
                .collect();

            let formatter = OutputFormatter::new(OutputFormat::Quiet, false);
            prop_assert_eq!(formatter.format_messages(&messages), "");
        }
    }
}
