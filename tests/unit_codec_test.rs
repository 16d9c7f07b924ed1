// tests/unit_codec_test.rs

//! Unit tests for the length-prefixed frame codec, including property-based
//! checks that decoding is insensitive to how the byte stream is partitioned.

use bytes::BytesMut;
use framelink::FrameLinkError;
use framelink::core::protocol::{Frame, FrameCodec, LENGTH_PREFIX_LEN};
use proptest::prelude::*;
use tokio_util::codec::{Decoder, Encoder};

#[test]
fn encode_wire_layout_is_le_length_then_payload() {
    let encoded = Frame::new(&b"PING"[..]).encode_to_vec().unwrap();
    assert_eq!(encoded, vec![4, 0, 0, 0, b'P', b'I', b'N', b'G']);
}

#[test]
fn encoder_and_encode_to_vec_agree() {
    let frame = Frame::new(&b"payload"[..]);
    let mut buf = BytesMut::new();
    FrameCodec::default().encode(frame.clone(), &mut buf).unwrap();
    assert_eq!(buf.as_ref(), frame.encode_to_vec().unwrap().as_slice());
}

#[test]
fn roundtrip_empty_payload() {
    let encoded = Frame::new(&b""[..]).encode_to_vec().unwrap();
    assert_eq!(encoded.len(), LENGTH_PREFIX_LEN);

    let mut buf = BytesMut::from(encoded.as_slice());
    let frame = FrameCodec::default().decode(&mut buf).unwrap().unwrap();
    assert!(frame.is_empty());
    assert!(buf.is_empty());
}

#[test]
fn roundtrip_large_payload() {
    let payload: Vec<u8> = (0..70_000u32).map(|i| (i % 251) as u8).collect();
    let encoded = Frame::new(payload.clone()).encode_to_vec().unwrap();

    let mut buf = BytesMut::from(encoded.as_slice());
    let frame = FrameCodec::default().decode(&mut buf).unwrap().unwrap();
    assert_eq!(frame.payload.as_ref(), payload.as_slice());
    assert!(buf.is_empty());
}

#[test]
fn incomplete_input_consumes_nothing() {
    let mut codec = FrameCodec::default();

    // Partial length prefix.
    let mut buf = BytesMut::from(&[9u8, 0][..]);
    assert!(codec.decode(&mut buf).unwrap().is_none());
    assert_eq!(buf.len(), 2);

    // Full prefix, partial payload.
    let encoded = Frame::new(&b"PAYLOAD"[..]).encode_to_vec().unwrap();
    let mut buf = BytesMut::from(&encoded[..6]);
    assert!(codec.decode(&mut buf).unwrap().is_none());
    assert_eq!(buf.len(), 6);
}

#[test]
fn split_delivery_three_then_five() {
    let encoded = Frame::new(&b"PING"[..]).encode_to_vec().unwrap();
    let mut codec = FrameCodec::default();
    let mut buf = BytesMut::new();

    buf.extend_from_slice(&encoded[..3]);
    assert!(codec.decode(&mut buf).unwrap().is_none());

    buf.extend_from_slice(&encoded[3..]);
    let frame = codec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(frame.payload.as_ref(), b"PING");
    assert!(codec.decode(&mut buf).unwrap().is_none());
}

#[test]
fn multiple_frames_in_one_buffer_decode_in_order() {
    let mut bytes = Frame::new(&b"first"[..]).encode_to_vec().unwrap();
    bytes.extend(Frame::new(&b""[..]).encode_to_vec().unwrap());
    bytes.extend(Frame::new(&b"third"[..]).encode_to_vec().unwrap());

    let mut codec = FrameCodec::default();
    let mut buf = BytesMut::from(bytes.as_slice());

    let first = codec.decode(&mut buf).unwrap().unwrap();
    let second = codec.decode(&mut buf).unwrap().unwrap();
    let third = codec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(first.payload.as_ref(), b"first");
    assert!(second.is_empty());
    assert_eq!(third.payload.as_ref(), b"third");
    assert!(codec.decode(&mut buf).unwrap().is_none());
}

#[test]
fn declared_length_above_limit_is_an_error() {
    let mut codec = FrameCodec::new(Some(8));
    let encoded = Frame::new(vec![0u8; 9]).encode_to_vec().unwrap();
    let mut buf = BytesMut::from(encoded.as_slice());

    let err = codec.decode(&mut buf).unwrap_err();
    assert!(matches!(
        err,
        FrameLinkError::FrameTooLarge {
            declared: 9,
            limit: 8
        }
    ));
}

// Zeroed pages stay virtual on Linux, so the 4 GiB payload is cheap; both
// encode paths must reject it before writing a truncated prefix.
#[test]
#[cfg(target_pointer_width = "64")]
fn payload_beyond_the_prefix_range_is_rejected() {
    let frame = Frame::new(vec![0u8; u32::MAX as usize + 1]);

    assert!(matches!(
        frame.encode_to_vec(),
        Err(FrameLinkError::FrameTooLarge { .. })
    ));

    let mut buf = BytesMut::new();
    assert!(matches!(
        FrameCodec::default().encode(frame, &mut buf),
        Err(FrameLinkError::FrameTooLarge { .. })
    ));
    assert!(buf.is_empty());
}

#[test]
fn limit_is_not_enforced_when_unset() {
    let mut codec = FrameCodec::new(None);
    let encoded = Frame::new(vec![7u8; 4096]).encode_to_vec().unwrap();
    let mut buf = BytesMut::from(encoded.as_slice());
    let frame = codec.decode(&mut buf).unwrap().unwrap();
    assert_eq!(frame.len(), 4096);
}

proptest! {
    #[test]
    fn roundtrip_any_payload(payload in proptest::collection::vec(any::<u8>(), 0..2048)) {
        let encoded = Frame::new(payload.clone()).encode_to_vec().unwrap();
        let mut buf = BytesMut::from(encoded.as_slice());
        let frame = FrameCodec::default().decode(&mut buf).unwrap().unwrap();
        prop_assert_eq!(frame.payload.as_ref(), payload.as_slice());
        prop_assert!(buf.is_empty());
    }

    /// Splitting an encoded frame into any partition of chunks and feeding
    /// them one at a time yields exactly one decoded frame, and only once
    /// every byte has been fed.
    #[test]
    fn chunked_delivery_yields_exactly_one_frame(
        payload in proptest::collection::vec(any::<u8>(), 0..512),
        raw_cuts in proptest::collection::vec(any::<usize>(), 0..4),
    ) {
        let encoded = Frame::new(payload.clone()).encode_to_vec().unwrap();

        let mut boundaries: Vec<usize> = raw_cuts
            .iter()
            .map(|cut| cut % (encoded.len() + 1))
            .collect();
        boundaries.push(0);
        boundaries.push(encoded.len());
        boundaries.sort_unstable();
        boundaries.dedup();

        let mut codec = FrameCodec::default();
        let mut buf = BytesMut::new();
        let mut decoded = Vec::new();

        for window in boundaries.windows(2) {
            buf.extend_from_slice(&encoded[window[0]..window[1]]);
            let fed = window[1];
            while let Some(frame) = codec.decode(&mut buf).unwrap() {
                prop_assert_eq!(fed, encoded.len());
                decoded.push(frame);
            }
        }

        prop_assert_eq!(decoded.len(), 1);
        prop_assert_eq!(decoded[0].payload.as_ref(), payload.as_slice());
    }
}
