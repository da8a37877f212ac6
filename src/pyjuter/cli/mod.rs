mod print;

pub use print::{print_config, print_messages, print_report};
