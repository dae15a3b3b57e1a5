pub mod order_number;
