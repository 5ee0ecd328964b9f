// Inbound HTTP API

mod entry;

pub use entry::{
    build_payload, create_entry_router, handle_post_entry, EntryAppState, EntryOutcome,
    InboundEntry, METATAG_FIELD,
};
