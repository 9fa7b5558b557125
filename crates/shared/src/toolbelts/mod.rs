pub mod stock_quote;
