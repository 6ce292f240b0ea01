
#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use crate::codec::{from_base64, to_base64};
    use crate::envelope::{open_secret, seal_secret};
    use crate::error::{CryptoError, EnvelopeError};
    use crate::kdf::KdfParams;
    use crate::keys::KeyPair;
    use crate::message::MessageCrypto;
    use crate::packet::TAG_LEN;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        // Message round-trip for arbitrary text and arbitrary private keys
        #[test]
        fn test_message_round_trip(
            sender_seed in any::<[u8; 32]>(),
            receiver_seed in any::<[u8; 32]>(),
            message in any::<String>()
        ) {
            let sender = MessageCrypto::from_key_pair(KeyPair::from_private_key(&sender_seed).unwrap());
            let receiver = MessageCrypto::from_key_pair(KeyPair::from_private_key(&receiver_seed).unwrap());

            let packet = sender.encrypt(&message, &receiver.public_key()).unwrap();
            let opened = receiver.decrypt(&packet, &sender.public_key()).unwrap();

            prop_assert_eq!(opened.message, message);
            prop_assert_eq!(opened.sender_pub, sender.public_key_base64());
        }

        // Ciphertext length is plaintext plus tag
        #[test]
        fn test_ciphertext_length(message in ".{0,256}") {
            let sender = MessageCrypto::generate();
            let receiver = MessageCrypto::generate();
            let packet = sender.encrypt_packet(&message, &receiver.public_key()).unwrap();
            prop_assert_eq!(from_base64(&packet.ct).unwrap().len(), message.len() + TAG_LEN);
        }

        // Any single bit flip in ct is rejected
        #[test]
        fn test_ct_tamper_detection(
            message in ".{1,64}",
            position in any::<prop::sample::Index>(),
            bit in 0u8..8
        ) {
            let sender = MessageCrypto::generate();
            let receiver = MessageCrypto::generate();
            let mut packet = sender.encrypt_packet(&message, &receiver.public_key()).unwrap();

            let mut ct = from_base64(&packet.ct).unwrap();
            let idx = position.index(ct.len());
            ct[idx] ^= 1 << bit;
            packet.ct = to_base64(&ct);

            prop_assert_eq!(
                receiver.decrypt_packet(&packet, &sender.public_key()),
                Err(CryptoError::DecryptionFailed)
            );
        }

        // Arbitrary garbage never panics and never decrypts
        #[test]
        fn test_garbage_packet_rejected(garbage in any::<String>()) {
            let receiver = MessageCrypto::generate();
            let sender = MessageCrypto::generate();
            prop_assert!(receiver.decrypt(&garbage, &sender.public_key()).is_err());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        // Envelope round-trip for arbitrary secrets and passwords
        #[test]
        fn test_envelope_round_trip(
            secret in prop::collection::vec(any::<u8>(), 0..128),
            password in any::<String>()
        ) {
            let params = KdfParams::insecure_for_tests();
            let envelope = seal_secret(&secret, &password, &params).unwrap();
            let opened = open_secret(&envelope, &password, &params).unwrap();
            prop_assert_eq!(opened.as_slice(), secret.as_slice());
        }

        // Different passwords never open each other's envelopes
        #[test]
        fn test_envelope_wrong_password(
            secret in prop::collection::vec(any::<u8>(), 1..64),
            p1 in any::<String>(),
            p2 in any::<String>()
        ) {
            prop_assume!(p1 != p2);
            let params = KdfParams::insecure_for_tests();
            let envelope = seal_secret(&secret, &p1, &params).unwrap();
            prop_assert_eq!(
                open_secret(&envelope, &p2, &params),
                Err(EnvelopeError::WrongPasswordOrTampered)
            );
        }
    }
}
