
#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use proptest::prelude::*;
    use sct_crypto::KdfParams;
    use tokio::runtime::Runtime;

    use crate::contacts::{Contact, ContactBook};
    use crate::messages::{MessageLog, StoredMessage};
    use crate::store::InMemoryStore;
    use crate::vault::{KeyVault, VaultError};

    fn runtime() -> Runtime {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        // After any sequence of saves, keys are unique and each holds the last name saved for it
        #[test]
        fn test_contact_upsert_keeps_keys_unique(
            ops in prop::collection::vec((0u8..4, "[a-z]{1,8}"), 0..20)
        ) {
            let rt = runtime();
            let listed = rt.block_on(async {
                let book = ContactBook::new(InMemoryStore::new_shared());
                for (key, name) in &ops {
                    book.save(Contact { name: name.clone(), public_key: format!("key{key}") })
                        .await
                        .unwrap();
                }
                book.list().await.unwrap()
            });

            let keys: HashSet<_> = listed.iter().map(|c| c.public_key.clone()).collect();
            prop_assert_eq!(keys.len(), listed.len());

            for contact in &listed {
                let last = ops
                    .iter()
                    .rev()
                    .find(|(key, _)| format!("key{key}") == contact.public_key)
                    .map(|(_, name)| name.clone());
                prop_assert_eq!(Some(contact.name.clone()), last);
            }
        }

        // Deleting one message leaves the others in their original order
        #[test]
        fn test_message_delete_preserves_order(count in 1usize..10, victim in any::<prop::sample::Index>()) {
            let rt = runtime();
            let (before, after, removed_id) = rt.block_on(async {
                let log = MessageLog::new(InMemoryStore::new_shared());
                for i in 0..count {
                    log.append(StoredMessage::new("s", "me", "r", format!("packet{i}")).unwrap())
                        .await
                        .unwrap();
                }
                let before = log.list().await.unwrap();
                let removed_id = before[victim.index(count)].id.clone();
                assert!(log.delete(&removed_id).await.unwrap());
                (before, log.list().await.unwrap(), removed_id)
            });

            let expected: Vec<_> = before.into_iter().filter(|m| m.id != removed_id).collect();
            prop_assert_eq!(after, expected);
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        // Vault round trip for arbitrary secrets and passwords; any other password fails
        #[test]
        fn test_vault_round_trip(
            secret in prop::collection::vec(any::<u8>(), 1..64),
            password in any::<String>(),
            other in any::<String>()
        ) {
            prop_assume!(password != other);
            let rt = runtime();
            let (opened, wrong) = rt.block_on(async {
                let vault = KeyVault::new(Arc::new(InMemoryStore::new()), KdfParams::insecure_for_tests());
                vault.wrap(&secret, &password).await.unwrap();
                let opened = vault.unwrap(&password).await.unwrap().to_vec();
                let wrong = vault.unwrap(&other).await;
                (opened, wrong)
            });

            prop_assert_eq!(opened, secret);
            prop_assert!(matches!(wrong, Err(VaultError::WrongPasswordOrTampered)));
        }
    }
}
