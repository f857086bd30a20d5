pub mod account_source;
pub mod fund_registry;
pub mod funding_source;
pub mod order_book_source;
