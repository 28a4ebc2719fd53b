pub mod codec;
pub mod command;
pub mod parser;

pub use codec::{CodecError, LineCodec};
pub use command::{Command, GoParams, Info, Move, Origin, Position, PositionStart, Score};
pub use parser::{parse_command, MalformedCommand};
