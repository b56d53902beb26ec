//! Request handlers.

mod collection;
mod sync;

pub use collection::*;
pub use sync::*;

use binder_engine::CardDto;

/// Minimal shape check for a submitted card.
///
/// Batch entries failing this are skipped (not counted, not conflicts);
/// the add path rejects the request instead.
pub(crate) fn validate_card(card: &CardDto) -> bool {
    !card.card_id.is_empty()
        && !card.name.is_empty()
        && !card.set_id.is_empty()
        && !card.set_name.is_empty()
        && !card.number.is_empty()
        && card.quantity >= 1
}
