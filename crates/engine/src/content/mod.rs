mod atomic_io;
mod compiler;

pub use atomic_io::{write_bytes_atomic, write_text_atomic};
pub use compiler::{
    compile_world_file, compile_world_str, SourceLocation, WorldCompileError, WorldErrorCode,
};
