mod ask;
mod chat;
mod chunks;
mod index;
mod status;

pub use ask::AskArgs;
pub use chat::ChatArgs;
pub use chunks::ChunksArgs;
pub use index::IndexArgs;

pub use ask::handle_ask;
pub use chat::handle_chat;
pub use chunks::handle_chunks;
pub use index::handle_index;
pub use status::handle_status;
