mod aggregator;
mod emitter;
mod level;
mod links;
mod markers;
mod palette;
mod pipeline;
mod run;
mod scanner;
#[cfg(test)]
mod tests;

pub use self::links::LinkTable;
pub use self::run::run;
pub use self::scanner::{ParserState, RowEvent};
