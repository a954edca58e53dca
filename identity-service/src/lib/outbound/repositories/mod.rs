pub mod account;

pub use account::SqliteAccountRepository;
