//! Small helpers shared by the `DroidLift` sub-crates: LEB128 encoded
//! integers and little-endian writers used by the bytecode assembler.

pub mod leb;
pub mod writers;
