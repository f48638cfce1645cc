//! Shared building blocks: the text hash table and the string builder.

pub mod hash_table;
pub mod str_buf;

pub use hash_table::HashTable;
pub use str_buf::StrBuf;
