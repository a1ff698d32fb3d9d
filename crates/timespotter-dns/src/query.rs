// ABOUTME: Stateless translation of one DNS query message into one reply message.
// ABOUTME: Any failing question turns the whole reply into SERVFAIL with no answers.

use std::net::Ipv4Addr;

use hickory_proto::op::{Message, MessageType, ResponseCode};
use hickory_proto::rr::rdata::A;
use hickory_proto::rr::{RData, Record};
use thiserror::Error;
use timespotter_core::{KeyError, OccurrenceKey, OccurrenceStore};

/// Address returned for every key that has been observed.
pub const ANSWER_ADDR: Ipv4Addr = Ipv4Addr::LOCALHOST;

/// Positive answers are never cached.
pub const ANSWER_TTL: u32 = 0;

/// Reasons a single question cannot be answered positively.
#[derive(Debug, Error, PartialEq)]
pub enum QueryError {
    #[error("query name has fewer than two labels: {0}")]
    TooFewLabels(String),

    #[error("query name does not encode a key: {0}")]
    BadKey(#[from] KeyError),

    #[error("key not observed: {0}")]
    NotFound(OccurrenceKey),
}

/// Decode the key carried in a query name.
///
/// The name is split on `.`, the first two labels are lowercased and
/// concatenated, and the result is hex-decoded into a zero-padded 32-byte
/// key. Only those two labels are consulted.
pub fn decode_query_name(name: &str) -> Result<OccurrenceKey, QueryError> {
    let mut labels = name.split('.');
    let (Some(high), Some(low)) = (labels.next(), labels.next()) else {
        return Err(QueryError::TooFewLabels(name.to_string()));
    };
    let hex = format!("{}{}", high.to_ascii_lowercase(), low.to_ascii_lowercase());
    Ok(OccurrenceKey::from_hex_prefix(&hex)?)
}

/// Build the reply for `request`: one A record per question, in question
/// order, or SERVFAIL for the whole message as soon as one question fails.
/// Every decoded key is checked against the store under one lock.
pub fn answer(store: &OccurrenceStore, request: &Message) -> Message {
    let outcome = request
        .queries()
        .iter()
        .map(|query| decode_query_name(&query.name().to_string()))
        .collect::<Result<Vec<_>, _>>()
        .and_then(|keys| match store.find_unseen(&keys) {
            Some(key) => Err(QueryError::NotFound(key)),
            None => Ok(()),
        });

    if let Err(e) = outcome {
        tracing::debug!(id = request.id(), "servfail: {}", e);
        return reply_to(request, ResponseCode::ServFail);
    }

    let mut response = reply_to(request, ResponseCode::NoError);
    for query in request.queries() {
        response.add_answer(Record::from_rdata(
            query.name().clone(),
            ANSWER_TTL,
            RData::A(A::from(ANSWER_ADDR)),
        ));
    }
    response
}

fn reply_to(request: &Message, code: ResponseCode) -> Message {
    let mut response = Message::new();
    response
        .set_id(request.id())
        .set_message_type(MessageType::Response)
        .set_op_code(request.op_code())
        .set_recursion_desired(request.recursion_desired())
        .set_response_code(code);
    response.add_queries(request.queries().iter().cloned());
    response
}
