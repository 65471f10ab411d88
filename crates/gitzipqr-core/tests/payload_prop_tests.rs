//! Property tests for the payload codec and the frame cipher.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use proptest::prelude::*;

use gitzipqr_core::crypto::aead::{decrypt_frame, encrypt_frame, TAG_SIZE};
use gitzipqr_core::crypto::kdf::KdfParams;
use gitzipqr_core::hash;
use gitzipqr_core::payload::{file_id, ChunkPayload, PAYLOAD_TYPE, PAYLOAD_VERSION};

fn arb_payload() -> impl Strategy<Value = ChunkPayload> {
    (
        prop::collection::vec(any::<u8>(), 0..2048),
        0u32..1000,
        1u32..1000,
        "[a-zA-Z0-9 _.-]{1,48}",
        prop::option::of("[a-z0-9]{1,6}"),
    )
        .prop_map(|(data, chunk_off, extra, name, ext)| {
            let total = chunk_off % extra.max(1) + extra;
            let chunk = chunk_off % total;
            let cipher_hash = hash::digest_hex(name.as_bytes());
            ChunkPayload {
                kind: PAYLOAD_TYPE.to_string(),
                version: PAYLOAD_VERSION.to_string(),
                file_id: file_id(&name, &cipher_hash),
                name,
                ext: ext.map(|e| format!(".{e}")).unwrap_or_default(),
                chunk,
                total,
                hash: hash::digest_hex(&data),
                cipher_hash,
                data_b64: BASE64.encode(&data),
                kdf_params: KdfParams { n: 32768, r: 8, p: 4 },
                salt_b64: BASE64.encode([7u8; 16]),
                nonce_b64: BASE64.encode([9u8; 12]),
                chunk_size: 2048,
                part: None,
                part_total: None,
            }
        })
}

proptest! {
    #[test]
    fn payload_roundtrips_through_canonical_json(payload in arb_payload()) {
        let json = payload.to_canonical_json().unwrap();
        prop_assert!(!json.contains('\n'));
        let parsed = ChunkPayload::parse(&json).unwrap();
        prop_assert_eq!(parsed, payload);
    }

    #[test]
    fn payload_data_hash_invariant(payload in arb_payload()) {
        let data = BASE64.decode(&payload.data_b64).unwrap();
        prop_assert_eq!(hash::digest_hex(&data), payload.hash);
    }

    #[test]
    fn frame_roundtrips(
        data in prop::collection::vec(any::<u8>(), 0..4096),
        key in any::<[u8; 32]>(),
        nonce in any::<[u8; 12]>(),
    ) {
        let frame = encrypt_frame(data.clone(), &key, &nonce).unwrap();
        prop_assert_eq!(frame.len(), data.len() + TAG_SIZE);
        let restored = decrypt_frame(frame, &key, &nonce).unwrap();
        prop_assert_eq!(&restored[..], &data[..]);
    }

    #[test]
    fn tampering_any_frame_byte_fails(
        data in prop::collection::vec(any::<u8>(), 1..512),
        key in any::<[u8; 32]>(),
        nonce in any::<[u8; 12]>(),
        flip in any::<prop::sample::Index>(),
    ) {
        let mut frame = encrypt_frame(data, &key, &nonce).unwrap();
        let at = flip.index(frame.len());
        frame[at] ^= 0x40;
        prop_assert!(decrypt_frame(frame, &key, &nonce).is_err());
    }
}
