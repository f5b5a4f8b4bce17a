//! Storage infrastructure - SQLite conversation store and its schema

mod conversation_store;
mod migrations;

pub use conversation_store::ConversationStore;
pub use migrations::{
    conversation_migrations, run_conversation_migrations, Migration, SqliteMigrator,
};
