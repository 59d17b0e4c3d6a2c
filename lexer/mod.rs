mod driver;
mod sink;

pub use driver::run;
pub use sink::LexerSink;
