mod order_code;

pub use order_code::{display_reference, extract_order_code, order_code, ORDER_CODE_TAG};
