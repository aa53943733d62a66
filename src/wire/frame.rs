use crate::Weight;
use crate::error::Error;
use crate::error::Result;

/// closes every frame on the wire
pub const SENTINEL: Weight = -1.0;

/// message-layer tag accompanying each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    Continue = 0,
    Stop = 1,
}

/// a decoded streaming frame
#[derive(Debug, PartialEq)]
pub struct Decoded<'a> {
    pub payload: &'a [Weight],
    pub marginal: Weight,
    pub global: usize,
}

/// one candidate row on the wire: the payload, then the sender's local
/// marginal, the dataset-global index, and the end-of-frame sentinel
pub fn encode_seed(payload: &[Weight], marginal: Weight, global: usize) -> Vec<Weight> {
    let mut frame = payload.to_vec();
    frame.push(marginal);
    frame.push(global as Weight);
    frame.push(SENTINEL);
    frame
}

/// a bare close carrying no seed, for senders with nothing to stream
pub fn terminator() -> Vec<Weight> {
    vec![SENTINEL]
}

/// scan from the tail to the sentinel; the two control values sit before it
/// and the prefix is the row payload. a frame holding only the sentinel is a
/// pure close.
pub fn decode_seed(frame: &[Weight]) -> Result<Option<Decoded<'_>>> {
    let end = frame
        .iter()
        .rposition(|v| *v == SENTINEL)
        .ok_or_else(|| Error::Transport("frame without an end sentinel".to_string()))?;
    match end {
        0 => Ok(None),
        1 => Err(Error::InvariantViolation(
            "frame too short for its control values".to_string(),
        )),
        _ => Ok(Some(Decoded {
            payload: &frame[..end - 2],
            marginal: frame[end - 2],
            global: frame[end - 1] as usize,
        })),
    }
}

/// one gathered bulk message: the local solution's total score, then one
/// fixed-width (payload, global index, sentinel) record per selected row.
/// payloads are dense-expanded so every record spans columns + 2 values.
pub fn encode_bulk(score: Weight, rows: &[(usize, Vec<Weight>)]) -> Vec<Weight> {
    let mut message = vec![score];
    for (global, payload) in rows {
        message.extend_from_slice(payload);
        message.push(*global as Weight);
        message.push(SENTINEL);
    }
    message
}

pub fn decode_bulk(message: &[Weight], columns: usize) -> Result<(Weight, Vec<(usize, Vec<Weight>)>)> {
    let score = *message
        .first()
        .ok_or_else(|| Error::Transport("empty bulk message".to_string()))?;
    let width = columns + 2;
    let body = &message[1..];
    if body.len() % width != 0 {
        return Err(Error::InvariantViolation(format!(
            "bulk body of {} values is not {}-wide records",
            body.len(),
            width
        )));
    }
    let rows = body
        .chunks_exact(width)
        .map(|record| match record[width - 1] == SENTINEL {
            true => Ok((record[width - 2] as usize, record[..columns].to_vec())),
            false => Err(Error::InvariantViolation(
                "bulk record missing its sentinel".to_string(),
            )),
        })
        .collect::<Result<Vec<_>>>()?;
    Ok((score, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_frames_roundtrip() {
        let frame = encode_seed(&[1.0, 2.0, 3.0], 0.5, 7);
        let decoded = decode_seed(&frame).expect("decode").expect("seed");
        assert_eq!(decoded.payload, &[1.0, 2.0, 3.0]);
        assert_eq!(decoded.marginal, 0.5);
        assert_eq!(decoded.global, 7);
    }

    #[test]
    fn tail_scan_ignores_receive_slack() {
        // a preallocated receive region keeps zeroed slack past the frame
        let mut frame = encode_seed(&[4.0, 5.0], 1.5, 3);
        frame.extend([0.0, 0.0, 0.0]);
        let decoded = decode_seed(&frame).expect("decode").expect("seed");
        assert_eq!(decoded.payload, &[4.0, 5.0]);
        assert_eq!(decoded.global, 3);
    }

    #[test]
    fn empty_payload_frames_decode() {
        let encoded = encode_seed(&[], 0.25, 2);
        let decoded = decode_seed(&encoded).expect("decode").expect("seed");
        assert!(decoded.payload.is_empty());
        assert_eq!(decoded.global, 2);
    }

    #[test]
    fn terminators_carry_no_seed() {
        assert_eq!(decode_seed(&terminator()).expect("decode"), None);
    }

    #[test]
    fn frames_without_sentinels_are_transport_errors() {
        assert!(decode_seed(&[1.0, 2.0]).is_err());
    }

    #[test]
    fn bulk_messages_roundtrip() {
        let rows = vec![(4, vec![1.0, 2.0]), (9, vec![0.0, 3.0])];
        let message = encode_bulk(5.5, &rows);
        let (score, decoded) = decode_bulk(&message, 2).expect("decode");
        assert_eq!(score, 5.5);
        assert_eq!(decoded, rows);
    }

    #[test]
    fn ragged_bulk_bodies_are_fatal() {
        let mut message = encode_bulk(1.0, &[(0, vec![1.0, 2.0])]);
        message.push(0.0);
        assert!(decode_bulk(&message, 2).is_err());
    }
}
