//! JSON codec for events on the wire.
//!
//! A malformed inbound message must never crash a consumer: decoding yields
//! `None` with a warning, and the caller treats it as a no-op.

use crate::event::Event;

/// Serializes an event for publishing.
pub fn to_json(event: &Event) -> String {
    // Event contains only JSON-representable fields, so this cannot fail.
    serde_json::to_string(event).unwrap_or_default()
}

/// Deserializes an inbound message.
///
/// Returns `None` when the payload does not parse as an [`Event`].
pub fn from_json(payload: &str) -> Option<Event> {
    match serde_json::from_str(payload) {
        Ok(event) => Some(event),
        Err(error) => {
            tracing::warn!(%error, "discarding unparseable event payload");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::order::{Order, OrderLine, Product};
    use crate::source::EventSource;
    use crate::status::SagaStatus;

    #[test]
    fn test_roundtrip_preserves_all_fields() {
        let mut event = Event::for_order(Order::new(vec![OrderLine::new(
            Product::new("WIDGET", Money::from_cents(1000)),
            2,
        )]));
        event.mark(EventSource::Payment, SagaStatus::Success);
        event.add_history(EventSource::Payment, SagaStatus::Success, "Payment made");

        let decoded = from_json(&to_json(&event)).unwrap();
        assert_eq!(decoded, event);
    }

    #[test]
    fn test_malformed_payload_yields_none() {
        assert!(from_json("not json at all").is_none());
        assert!(from_json("{\"id\": 42}").is_none());
        assert!(from_json("").is_none());
    }
}
