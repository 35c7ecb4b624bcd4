mod projected_cursor;
mod sorted_stream;

pub(crate) use projected_cursor::*;
pub(crate) use sorted_stream::*;
