//! Register VM instructions definitions.
//!
//! [`Instr`] lists every opcode with its operands, as decoded from the code
//! units of a method. The opcode byte, mnemonic, operand [format](Format),
//! size and throwing behavior of each variant are declared with attributes
//! and derived by [`instruction_derive`].

use crate::pools::{
    CallSiteId, FieldId, Index, MethodHandleId, MethodId, PoolKind, PoolTag, Pools, ProtoId,
    StringId, TypeId,
};
use crate::registers::{Reg, RegList, RegRange};
use crate::{Addr, PrettyPrint};
use instruction_derive::Instruction;
use std::fmt;

/// Common accessors of decoded instructions.
pub trait Instruction {
    /// The opcode byte (`0x00` for payload pseudo-instructions).
    fn opcode(&self) -> u8;
    fn mnemonic(&self) -> &'static str;
    fn format(&self) -> Format;
    /// Size in 16-bit code units.
    fn size(&self) -> usize;
    fn can_throw(&self) -> bool;
    /// Operands in declaration order (empty for payloads).
    fn operands(&self) -> Vec<Operand>;
}

/// Instruction formats, named after their size in code units, their number
/// of registers and the kind of their extra operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    F10x,
    F12x,
    F11n,
    F11x,
    F10t,
    F20t,
    F22x,
    F21t,
    F21s,
    F21h,
    F21c,
    F23x,
    F22b,
    F22t,
    F22s,
    F22c,
    F30t,
    F32x,
    F31i,
    F31t,
    F31c,
    F35c,
    F3rc,
    F45cc,
    F4rcc,
    F51l,
    Payload,
}

impl Format {
    /// Formats whose last literal operand is a branch offset.
    #[must_use]
    pub const fn is_branch(self) -> bool {
        matches!(
            self,
            Self::F10t | Self::F20t | Self::F30t | Self::F21t | Self::F22t | Self::F31t
        )
    }
}

/// A single instruction operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Reg(Reg),
    RegList(RegList),
    RegRange(RegRange),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Pool(PoolTag, usize),
}

impl From<Reg> for Operand {
    fn from(r: Reg) -> Self {
        Self::Reg(r)
    }
}

impl From<RegList> for Operand {
    fn from(l: RegList) -> Self {
        Self::RegList(l)
    }
}

impl From<RegRange> for Operand {
    fn from(r: RegRange) -> Self {
        Self::RegRange(r)
    }
}

impl From<i8> for Operand {
    fn from(v: i8) -> Self {
        Self::Int8(v)
    }
}

impl From<i16> for Operand {
    fn from(v: i16) -> Self {
        Self::Int16(v)
    }
}

impl From<i32> for Operand {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Operand {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl<K: PoolKind> From<Index<K>> for Operand {
    fn from(idx: Index<K>) -> Self {
        Self::Pool(K::TAG, idx.as_usize())
    }
}

impl Operand {
    /// Literal value of an integer operand.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int8(v) => Some(i64::from(*v)),
            Self::Int16(v) => Some(i64::from(*v)),
            Self::Int32(v) => Some(i64::from(*v)),
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }
}

/// An instruction located at its code address.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledInstr {
    pub addr: Addr,
    pub instr: Instr,
}

impl LabeledInstr {
    #[must_use]
    pub const fn new(addr: Addr, instr: Instr) -> Self {
        Self { addr, instr }
    }

    #[inline]
    #[must_use]
    pub const fn addr(&self) -> Addr {
        self.addr
    }

    #[inline]
    #[must_use]
    pub const fn instr(&self) -> &Instr {
        &self.instr
    }

    #[inline]
    #[must_use]
    pub fn next_addr(&self) -> Addr {
        self.addr.after(self.instr.size())
    }
}

#[derive(Debug, Clone, PartialEq, Instruction)]
pub enum Instr {
    /// Waste cycles. Opcode `0x00` is shared with the payload pseudo-instructions, told apart by their second byte.
    #[instruction(opcode = 0x00, mnemonic = "nop", format = "10x")]
    Nop,

    /// Register to register copies. The `/from16` and `/16` forms only widen the register fields.
    #[instruction(opcode = 0x01, mnemonic = "move", format = "12x")]
    Move(Reg, Reg),
    #[instruction(opcode = 0x02, mnemonic = "move/from16", format = "22x")]
    MoveFrom16(Reg, Reg),
    #[instruction(opcode = 0x03, mnemonic = "move/16", format = "32x")]
    Move16(Reg, Reg),
    #[instruction(opcode = 0x04, mnemonic = "move-wide", format = "12x")]
    MoveWide(Reg, Reg),
    #[instruction(opcode = 0x05, mnemonic = "move-wide/from16", format = "22x")]
    MoveWideFrom16(Reg, Reg),
    #[instruction(opcode = 0x06, mnemonic = "move-wide/16", format = "32x")]
    MoveWide16(Reg, Reg),
    #[instruction(opcode = 0x07, mnemonic = "move-object", format = "12x")]
    MoveObject(Reg, Reg),
    #[instruction(opcode = 0x08, mnemonic = "move-object/from16", format = "22x")]
    MoveObjectFrom16(Reg, Reg),
    #[instruction(opcode = 0x09, mnemonic = "move-object/16", format = "32x")]
    MoveObject16(Reg, Reg),

    /// Copy the result of the immediately preceding invoke (or `filled-new-array`) into a register.
    #[instruction(opcode = 0x0a, mnemonic = "move-result", format = "11x")]
    MoveResult(Reg),
    #[instruction(opcode = 0x0b, mnemonic = "move-result-wide", format = "11x")]
    MoveResultWide(Reg),
    #[instruction(opcode = 0x0c, mnemonic = "move-result-object", format = "11x")]
    MoveResultObject(Reg),

    /// Save the exception just caught; only valid as the first instruction of a handler.
    #[instruction(opcode = 0x0d, mnemonic = "move-exception", format = "11x")]
    MoveException(Reg),

    /// Method exits.
    #[instruction(opcode = 0x0e, mnemonic = "return-void", format = "10x")]
    ReturnVoid,
    #[instruction(opcode = 0x0f, mnemonic = "return", format = "11x")]
    Return(Reg),
    #[instruction(opcode = 0x10, mnemonic = "return-wide", format = "11x")]
    ReturnWide(Reg),
    #[instruction(opcode = 0x11, mnemonic = "return-object", format = "11x")]
    ReturnObject(Reg),

    /// Literal loads. 32-bit forms sign-extend (or right-zero-extend for `/high16`) into a register, wide forms into a register pair.
    #[instruction(opcode = 0x12, mnemonic = "const/4", format = "11n")]
    Const4(Reg, i8),
    #[instruction(opcode = 0x13, mnemonic = "const/16", format = "21s")]
    Const16(Reg, i16),
    #[instruction(opcode = 0x14, mnemonic = "const", format = "31i")]
    Const(Reg, i32),
    #[instruction(opcode = 0x15, mnemonic = "const/high16", format = "21h")]
    ConstHigh16(Reg, i16),
    #[instruction(opcode = 0x16, mnemonic = "const-wide/16", format = "21s")]
    ConstWide16(Reg, i16),
    #[instruction(opcode = 0x17, mnemonic = "const-wide/32", format = "31i")]
    ConstWide32(Reg, i32),
    #[instruction(opcode = 0x18, mnemonic = "const-wide", format = "51l")]
    ConstWide(Reg, i64),
    #[instruction(opcode = 0x19, mnemonic = "const-wide/high16", format = "21h")]
    ConstWideHigh16(Reg, i16),

    /// Load a reference to a pooled constant.
    #[instruction(opcode = 0x1a, mnemonic = "const-string", format = "21c", can_throw)]
    ConstString(Reg, Index<StringId>),
    #[instruction(opcode = 0x1b, mnemonic = "const-string/jumbo", format = "31c", can_throw)]
    ConstStringJumbo(Reg, Index<StringId>),
    #[instruction(opcode = 0x1c, mnemonic = "const-class", format = "21c", can_throw)]
    ConstClass(Reg, Index<TypeId>),

    /// Acquire the monitor of the given object.
    #[instruction(opcode = 0x1d, mnemonic = "monitor-enter", format = "11x", can_throw)]
    MonitorEnter(Reg),
    #[instruction(opcode = 0x1e, mnemonic = "monitor-exit", format = "11x", can_throw)]
    MonitorExit(Reg),

    /// Throw a `ClassCastException` if the reference cannot be cast to the given type.
    #[instruction(opcode = 0x1f, mnemonic = "check-cast", format = "21c", can_throw)]
    CheckCast(Reg, Index<TypeId>),
    #[instruction(opcode = 0x20, mnemonic = "instance-of", format = "22c", can_throw)]
    InstanceOf(Reg, Reg, Index<TypeId>),

    /// Length of the array in the second register.
    #[instruction(opcode = 0x21, mnemonic = "array-length", format = "12x", can_throw)]
    ArrayLength(Reg, Reg),

    /// Allocate (but do not construct) an instance of the given class.
    #[instruction(opcode = 0x22, mnemonic = "new-instance", format = "21c", can_throw)]
    NewInstance(Reg, Index<TypeId>),
    #[instruction(opcode = 0x23, mnemonic = "new-array", format = "22c", can_throw)]
    NewArray(Reg, Reg, Index<TypeId>),

    /// Allocate an array of the given type filled with the argument registers; the array is retrieved with `move-result-object`.
    #[instruction(opcode = 0x24, mnemonic = "filled-new-array", format = "35c", can_throw)]
    FilledNewArray(RegList, Index<TypeId>),
    #[instruction(opcode = 0x25, mnemonic = "filled-new-array/range", format = "3rc", can_throw)]
    FilledNewArrayRange(RegRange, Index<TypeId>),

    /// Fill the array with the data held by the referenced `fill-array-data-payload`.
    #[instruction(opcode = 0x26, mnemonic = "fill-array-data", format = "31t", can_throw)]
    FillArrayData(Reg, i32),

    /// Throw the exception held by the register.
    #[instruction(opcode = 0x27, mnemonic = "throw", format = "11x", can_throw)]
    Throw(Reg),

    /// Unconditional jumps, offsets are counted in code units from the instruction address.
    #[instruction(opcode = 0x28, mnemonic = "goto", format = "10t")]
    Goto(i8),
    #[instruction(opcode = 0x29, mnemonic = "goto/16", format = "20t")]
    Goto16(i16),
    #[instruction(opcode = 0x2a, mnemonic = "goto/32", format = "30t")]
    Goto32(i32),

    /// Jump through the referenced switch payload.
    #[instruction(opcode = 0x2b, mnemonic = "packed-switch", format = "31t")]
    PackedSwitch(Reg, i32),
    #[instruction(opcode = 0x2c, mnemonic = "sparse-switch", format = "31t")]
    SparseSwitch(Reg, i32),

    /// Three-way comparisons, the `l`/`g` bias selects the result of a comparison involving `NaN`.
    #[instruction(opcode = 0x2d, mnemonic = "cmpl-float", format = "23x")]
    CmplFloat(Reg, Reg, Reg),
    #[instruction(opcode = 0x2e, mnemonic = "cmpg-float", format = "23x")]
    CmpgFloat(Reg, Reg, Reg),
    #[instruction(opcode = 0x2f, mnemonic = "cmpl-double", format = "23x")]
    CmplDouble(Reg, Reg, Reg),
    #[instruction(opcode = 0x30, mnemonic = "cmpg-double", format = "23x")]
    CmpgDouble(Reg, Reg, Reg),
    #[instruction(opcode = 0x31, mnemonic = "cmp-long", format = "23x")]
    CmpLong(Reg, Reg, Reg),

    /// Branch when the two registers compare as indicated.
    #[instruction(opcode = 0x32, mnemonic = "if-eq", format = "22t")]
    IfEq(Reg, Reg, i16),
    #[instruction(opcode = 0x33, mnemonic = "if-ne", format = "22t")]
    IfNe(Reg, Reg, i16),
    #[instruction(opcode = 0x34, mnemonic = "if-lt", format = "22t")]
    IfLt(Reg, Reg, i16),
    #[instruction(opcode = 0x35, mnemonic = "if-ge", format = "22t")]
    IfGe(Reg, Reg, i16),
    #[instruction(opcode = 0x36, mnemonic = "if-gt", format = "22t")]
    IfGt(Reg, Reg, i16),
    #[instruction(opcode = 0x37, mnemonic = "if-le", format = "22t")]
    IfLe(Reg, Reg, i16),

    /// Branch when the register compares with zero as indicated.
    #[instruction(opcode = 0x38, mnemonic = "if-eqz", format = "21t")]
    IfEqz(Reg, i16),
    #[instruction(opcode = 0x39, mnemonic = "if-nez", format = "21t")]
    IfNez(Reg, i16),
    #[instruction(opcode = 0x3a, mnemonic = "if-ltz", format = "21t")]
    IfLtz(Reg, i16),
    #[instruction(opcode = 0x3b, mnemonic = "if-gez", format = "21t")]
    IfGez(Reg, i16),
    #[instruction(opcode = 0x3c, mnemonic = "if-gtz", format = "21t")]
    IfGtz(Reg, i16),
    #[instruction(opcode = 0x3d, mnemonic = "if-lez", format = "21t")]
    IfLez(Reg, i16),

    /// Array element accesses, the last register holds the index.
    #[instruction(opcode = 0x44, mnemonic = "aget", format = "23x", can_throw)]
    Aget(Reg, Reg, Reg),
    #[instruction(opcode = 0x45, mnemonic = "aget-wide", format = "23x", can_throw)]
    AgetWide(Reg, Reg, Reg),
    #[instruction(opcode = 0x46, mnemonic = "aget-object", format = "23x", can_throw)]
    AgetObject(Reg, Reg, Reg),
    #[instruction(opcode = 0x47, mnemonic = "aget-boolean", format = "23x", can_throw)]
    AgetBoolean(Reg, Reg, Reg),
    #[instruction(opcode = 0x48, mnemonic = "aget-byte", format = "23x", can_throw)]
    AgetByte(Reg, Reg, Reg),
    #[instruction(opcode = 0x49, mnemonic = "aget-char", format = "23x", can_throw)]
    AgetChar(Reg, Reg, Reg),
    #[instruction(opcode = 0x4a, mnemonic = "aget-short", format = "23x", can_throw)]
    AgetShort(Reg, Reg, Reg),
    #[instruction(opcode = 0x4b, mnemonic = "aput", format = "23x", can_throw)]
    Aput(Reg, Reg, Reg),
    #[instruction(opcode = 0x4c, mnemonic = "aput-wide", format = "23x", can_throw)]
    AputWide(Reg, Reg, Reg),
    #[instruction(opcode = 0x4d, mnemonic = "aput-object", format = "23x", can_throw)]
    AputObject(Reg, Reg, Reg),
    #[instruction(opcode = 0x4e, mnemonic = "aput-boolean", format = "23x", can_throw)]
    AputBoolean(Reg, Reg, Reg),
    #[instruction(opcode = 0x4f, mnemonic = "aput-byte", format = "23x", can_throw)]
    AputByte(Reg, Reg, Reg),
    #[instruction(opcode = 0x50, mnemonic = "aput-char", format = "23x", can_throw)]
    AputChar(Reg, Reg, Reg),
    #[instruction(opcode = 0x51, mnemonic = "aput-short", format = "23x", can_throw)]
    AputShort(Reg, Reg, Reg),

    /// Instance field accesses through the object held by the second register.
    #[instruction(opcode = 0x52, mnemonic = "iget", format = "22c", can_throw)]
    Iget(Reg, Reg, Index<FieldId>),
    #[instruction(opcode = 0x53, mnemonic = "iget-wide", format = "22c", can_throw)]
    IgetWide(Reg, Reg, Index<FieldId>),
    #[instruction(opcode = 0x54, mnemonic = "iget-object", format = "22c", can_throw)]
    IgetObject(Reg, Reg, Index<FieldId>),
    #[instruction(opcode = 0x55, mnemonic = "iget-boolean", format = "22c", can_throw)]
    IgetBoolean(Reg, Reg, Index<FieldId>),
    #[instruction(opcode = 0x56, mnemonic = "iget-byte", format = "22c", can_throw)]
    IgetByte(Reg, Reg, Index<FieldId>),
    #[instruction(opcode = 0x57, mnemonic = "iget-char", format = "22c", can_throw)]
    IgetChar(Reg, Reg, Index<FieldId>),
    #[instruction(opcode = 0x58, mnemonic = "iget-short", format = "22c", can_throw)]
    IgetShort(Reg, Reg, Index<FieldId>),
    #[instruction(opcode = 0x59, mnemonic = "iput", format = "22c", can_throw)]
    Iput(Reg, Reg, Index<FieldId>),
    #[instruction(opcode = 0x5a, mnemonic = "iput-wide", format = "22c", can_throw)]
    IputWide(Reg, Reg, Index<FieldId>),
    #[instruction(opcode = 0x5b, mnemonic = "iput-object", format = "22c", can_throw)]
    IputObject(Reg, Reg, Index<FieldId>),
    #[instruction(opcode = 0x5c, mnemonic = "iput-boolean", format = "22c", can_throw)]
    IputBoolean(Reg, Reg, Index<FieldId>),
    #[instruction(opcode = 0x5d, mnemonic = "iput-byte", format = "22c", can_throw)]
    IputByte(Reg, Reg, Index<FieldId>),
    #[instruction(opcode = 0x5e, mnemonic = "iput-char", format = "22c", can_throw)]
    IputChar(Reg, Reg, Index<FieldId>),
    #[instruction(opcode = 0x5f, mnemonic = "iput-short", format = "22c", can_throw)]
    IputShort(Reg, Reg, Index<FieldId>),

    /// Static field accesses.
    #[instruction(opcode = 0x60, mnemonic = "sget", format = "21c", can_throw)]
    Sget(Reg, Index<FieldId>),
    #[instruction(opcode = 0x61, mnemonic = "sget-wide", format = "21c", can_throw)]
    SgetWide(Reg, Index<FieldId>),
    #[instruction(opcode = 0x62, mnemonic = "sget-object", format = "21c", can_throw)]
    SgetObject(Reg, Index<FieldId>),
    #[instruction(opcode = 0x63, mnemonic = "sget-boolean", format = "21c", can_throw)]
    SgetBoolean(Reg, Index<FieldId>),
    #[instruction(opcode = 0x64, mnemonic = "sget-byte", format = "21c", can_throw)]
    SgetByte(Reg, Index<FieldId>),
    #[instruction(opcode = 0x65, mnemonic = "sget-char", format = "21c", can_throw)]
    SgetChar(Reg, Index<FieldId>),
    #[instruction(opcode = 0x66, mnemonic = "sget-short", format = "21c", can_throw)]
    SgetShort(Reg, Index<FieldId>),
    #[instruction(opcode = 0x67, mnemonic = "sput", format = "21c", can_throw)]
    Sput(Reg, Index<FieldId>),
    #[instruction(opcode = 0x68, mnemonic = "sput-wide", format = "21c", can_throw)]
    SputWide(Reg, Index<FieldId>),
    #[instruction(opcode = 0x69, mnemonic = "sput-object", format = "21c", can_throw)]
    SputObject(Reg, Index<FieldId>),
    #[instruction(opcode = 0x6a, mnemonic = "sput-boolean", format = "21c", can_throw)]
    SputBoolean(Reg, Index<FieldId>),
    #[instruction(opcode = 0x6b, mnemonic = "sput-byte", format = "21c", can_throw)]
    SputByte(Reg, Index<FieldId>),
    #[instruction(opcode = 0x6c, mnemonic = "sput-char", format = "21c", can_throw)]
    SputChar(Reg, Index<FieldId>),
    #[instruction(opcode = 0x6d, mnemonic = "sput-short", format = "21c", can_throw)]
    SputShort(Reg, Index<FieldId>),

    /// Method invocations with an explicit list of up to five argument registers.
    #[instruction(opcode = 0x6e, mnemonic = "invoke-virtual", format = "35c", can_throw)]
    InvokeVirtual(RegList, Index<MethodId>),
    #[instruction(opcode = 0x6f, mnemonic = "invoke-super", format = "35c", can_throw)]
    InvokeSuper(RegList, Index<MethodId>),
    #[instruction(opcode = 0x70, mnemonic = "invoke-direct", format = "35c", can_throw)]
    InvokeDirect(RegList, Index<MethodId>),
    #[instruction(opcode = 0x71, mnemonic = "invoke-static", format = "35c", can_throw)]
    InvokeStatic(RegList, Index<MethodId>),
    #[instruction(opcode = 0x72, mnemonic = "invoke-interface", format = "35c", can_throw)]
    InvokeInterface(RegList, Index<MethodId>),

    /// Method invocations with a range of consecutive argument registers.
    #[instruction(opcode = 0x74, mnemonic = "invoke-virtual/range", format = "3rc", can_throw)]
    InvokeVirtualRange(RegRange, Index<MethodId>),
    #[instruction(opcode = 0x75, mnemonic = "invoke-super/range", format = "3rc", can_throw)]
    InvokeSuperRange(RegRange, Index<MethodId>),
    #[instruction(opcode = 0x76, mnemonic = "invoke-direct/range", format = "3rc", can_throw)]
    InvokeDirectRange(RegRange, Index<MethodId>),
    #[instruction(opcode = 0x77, mnemonic = "invoke-static/range", format = "3rc", can_throw)]
    InvokeStaticRange(RegRange, Index<MethodId>),
    #[instruction(opcode = 0x78, mnemonic = "invoke-interface/range", format = "3rc", can_throw)]
    InvokeInterfaceRange(RegRange, Index<MethodId>),

    /// Unary operations and primitive conversions, `dst, src`.
    #[instruction(opcode = 0x7b, mnemonic = "neg-int", format = "12x")]
    NegInt(Reg, Reg),
    #[instruction(opcode = 0x7c, mnemonic = "not-int", format = "12x")]
    NotInt(Reg, Reg),
    #[instruction(opcode = 0x7d, mnemonic = "neg-long", format = "12x")]
    NegLong(Reg, Reg),
    #[instruction(opcode = 0x7e, mnemonic = "not-long", format = "12x")]
    NotLong(Reg, Reg),
    #[instruction(opcode = 0x7f, mnemonic = "neg-float", format = "12x")]
    NegFloat(Reg, Reg),
    #[instruction(opcode = 0x80, mnemonic = "neg-double", format = "12x")]
    NegDouble(Reg, Reg),
    #[instruction(opcode = 0x81, mnemonic = "int-to-long", format = "12x")]
    IntToLong(Reg, Reg),
    #[instruction(opcode = 0x82, mnemonic = "int-to-float", format = "12x")]
    IntToFloat(Reg, Reg),
    #[instruction(opcode = 0x83, mnemonic = "int-to-double", format = "12x")]
    IntToDouble(Reg, Reg),
    #[instruction(opcode = 0x84, mnemonic = "long-to-int", format = "12x")]
    LongToInt(Reg, Reg),
    #[instruction(opcode = 0x85, mnemonic = "long-to-float", format = "12x")]
    LongToFloat(Reg, Reg),
    #[instruction(opcode = 0x86, mnemonic = "long-to-double", format = "12x")]
    LongToDouble(Reg, Reg),
    #[instruction(opcode = 0x87, mnemonic = "float-to-int", format = "12x")]
    FloatToInt(Reg, Reg),
    #[instruction(opcode = 0x88, mnemonic = "float-to-long", format = "12x")]
    FloatToLong(Reg, Reg),
    #[instruction(opcode = 0x89, mnemonic = "float-to-double", format = "12x")]
    FloatToDouble(Reg, Reg),
    #[instruction(opcode = 0x8a, mnemonic = "double-to-int", format = "12x")]
    DoubleToInt(Reg, Reg),
    #[instruction(opcode = 0x8b, mnemonic = "double-to-long", format = "12x")]
    DoubleToLong(Reg, Reg),
    #[instruction(opcode = 0x8c, mnemonic = "double-to-float", format = "12x")]
    DoubleToFloat(Reg, Reg),
    #[instruction(opcode = 0x8d, mnemonic = "int-to-byte", format = "12x")]
    IntToByte(Reg, Reg),
    #[instruction(opcode = 0x8e, mnemonic = "int-to-char", format = "12x")]
    IntToChar(Reg, Reg),
    #[instruction(opcode = 0x8f, mnemonic = "int-to-short", format = "12x")]
    IntToShort(Reg, Reg),

    /// Binary operations, `dst, lhs, rhs`.
    #[instruction(opcode = 0x90, mnemonic = "add-int", format = "23x")]
    AddInt(Reg, Reg, Reg),
    #[instruction(opcode = 0x91, mnemonic = "sub-int", format = "23x")]
    SubInt(Reg, Reg, Reg),
    #[instruction(opcode = 0x92, mnemonic = "mul-int", format = "23x")]
    MulInt(Reg, Reg, Reg),
    #[instruction(opcode = 0x93, mnemonic = "div-int", format = "23x", can_throw)]
    DivInt(Reg, Reg, Reg),
    #[instruction(opcode = 0x94, mnemonic = "rem-int", format = "23x", can_throw)]
    RemInt(Reg, Reg, Reg),
    #[instruction(opcode = 0x95, mnemonic = "and-int", format = "23x")]
    AndInt(Reg, Reg, Reg),
    #[instruction(opcode = 0x96, mnemonic = "or-int", format = "23x")]
    OrInt(Reg, Reg, Reg),
    #[instruction(opcode = 0x97, mnemonic = "xor-int", format = "23x")]
    XorInt(Reg, Reg, Reg),
    #[instruction(opcode = 0x98, mnemonic = "shl-int", format = "23x")]
    ShlInt(Reg, Reg, Reg),
    #[instruction(opcode = 0x99, mnemonic = "shr-int", format = "23x")]
    ShrInt(Reg, Reg, Reg),
    #[instruction(opcode = 0x9a, mnemonic = "ushr-int", format = "23x")]
    UshrInt(Reg, Reg, Reg),
    #[instruction(opcode = 0x9b, mnemonic = "add-long", format = "23x")]
    AddLong(Reg, Reg, Reg),
    #[instruction(opcode = 0x9c, mnemonic = "sub-long", format = "23x")]
    SubLong(Reg, Reg, Reg),
    #[instruction(opcode = 0x9d, mnemonic = "mul-long", format = "23x")]
    MulLong(Reg, Reg, Reg),
    #[instruction(opcode = 0x9e, mnemonic = "div-long", format = "23x", can_throw)]
    DivLong(Reg, Reg, Reg),
    #[instruction(opcode = 0x9f, mnemonic = "rem-long", format = "23x", can_throw)]
    RemLong(Reg, Reg, Reg),
    #[instruction(opcode = 0xa0, mnemonic = "and-long", format = "23x")]
    AndLong(Reg, Reg, Reg),
    #[instruction(opcode = 0xa1, mnemonic = "or-long", format = "23x")]
    OrLong(Reg, Reg, Reg),
    #[instruction(opcode = 0xa2, mnemonic = "xor-long", format = "23x")]
    XorLong(Reg, Reg, Reg),
    #[instruction(opcode = 0xa3, mnemonic = "shl-long", format = "23x")]
    ShlLong(Reg, Reg, Reg),
    #[instruction(opcode = 0xa4, mnemonic = "shr-long", format = "23x")]
    ShrLong(Reg, Reg, Reg),
    #[instruction(opcode = 0xa5, mnemonic = "ushr-long", format = "23x")]
    UshrLong(Reg, Reg, Reg),
    #[instruction(opcode = 0xa6, mnemonic = "add-float", format = "23x")]
    AddFloat(Reg, Reg, Reg),
    #[instruction(opcode = 0xa7, mnemonic = "sub-float", format = "23x")]
    SubFloat(Reg, Reg, Reg),
    #[instruction(opcode = 0xa8, mnemonic = "mul-float", format = "23x")]
    MulFloat(Reg, Reg, Reg),
    #[instruction(opcode = 0xa9, mnemonic = "div-float", format = "23x")]
    DivFloat(Reg, Reg, Reg),
    #[instruction(opcode = 0xaa, mnemonic = "rem-float", format = "23x")]
    RemFloat(Reg, Reg, Reg),
    #[instruction(opcode = 0xab, mnemonic = "add-double", format = "23x")]
    AddDouble(Reg, Reg, Reg),
    #[instruction(opcode = 0xac, mnemonic = "sub-double", format = "23x")]
    SubDouble(Reg, Reg, Reg),
    #[instruction(opcode = 0xad, mnemonic = "mul-double", format = "23x")]
    MulDouble(Reg, Reg, Reg),
    #[instruction(opcode = 0xae, mnemonic = "div-double", format = "23x")]
    DivDouble(Reg, Reg, Reg),
    #[instruction(opcode = 0xaf, mnemonic = "rem-double", format = "23x")]
    RemDouble(Reg, Reg, Reg),

    /// Binary operations, `dst-and-lhs, rhs`.
    #[instruction(opcode = 0xb0, mnemonic = "add-int/2addr", format = "12x")]
    AddInt2addr(Reg, Reg),
    #[instruction(opcode = 0xb1, mnemonic = "sub-int/2addr", format = "12x")]
    SubInt2addr(Reg, Reg),
    #[instruction(opcode = 0xb2, mnemonic = "mul-int/2addr", format = "12x")]
    MulInt2addr(Reg, Reg),
    #[instruction(opcode = 0xb3, mnemonic = "div-int/2addr", format = "12x", can_throw)]
    DivInt2addr(Reg, Reg),
    #[instruction(opcode = 0xb4, mnemonic = "rem-int/2addr", format = "12x", can_throw)]
    RemInt2addr(Reg, Reg),
    #[instruction(opcode = 0xb5, mnemonic = "and-int/2addr", format = "12x")]
    AndInt2addr(Reg, Reg),
    #[instruction(opcode = 0xb6, mnemonic = "or-int/2addr", format = "12x")]
    OrInt2addr(Reg, Reg),
    #[instruction(opcode = 0xb7, mnemonic = "xor-int/2addr", format = "12x")]
    XorInt2addr(Reg, Reg),
    #[instruction(opcode = 0xb8, mnemonic = "shl-int/2addr", format = "12x")]
    ShlInt2addr(Reg, Reg),
    #[instruction(opcode = 0xb9, mnemonic = "shr-int/2addr", format = "12x")]
    ShrInt2addr(Reg, Reg),
    #[instruction(opcode = 0xba, mnemonic = "ushr-int/2addr", format = "12x")]
    UshrInt2addr(Reg, Reg),
    #[instruction(opcode = 0xbb, mnemonic = "add-long/2addr", format = "12x")]
    AddLong2addr(Reg, Reg),
    #[instruction(opcode = 0xbc, mnemonic = "sub-long/2addr", format = "12x")]
    SubLong2addr(Reg, Reg),
    #[instruction(opcode = 0xbd, mnemonic = "mul-long/2addr", format = "12x")]
    MulLong2addr(Reg, Reg),
    #[instruction(opcode = 0xbe, mnemonic = "div-long/2addr", format = "12x", can_throw)]
    DivLong2addr(Reg, Reg),
    #[instruction(opcode = 0xbf, mnemonic = "rem-long/2addr", format = "12x", can_throw)]
    RemLong2addr(Reg, Reg),
    #[instruction(opcode = 0xc0, mnemonic = "and-long/2addr", format = "12x")]
    AndLong2addr(Reg, Reg),
    #[instruction(opcode = 0xc1, mnemonic = "or-long/2addr", format = "12x")]
    OrLong2addr(Reg, Reg),
    #[instruction(opcode = 0xc2, mnemonic = "xor-long/2addr", format = "12x")]
    XorLong2addr(Reg, Reg),
    #[instruction(opcode = 0xc3, mnemonic = "shl-long/2addr", format = "12x")]
    ShlLong2addr(Reg, Reg),
    #[instruction(opcode = 0xc4, mnemonic = "shr-long/2addr", format = "12x")]
    ShrLong2addr(Reg, Reg),
    #[instruction(opcode = 0xc5, mnemonic = "ushr-long/2addr", format = "12x")]
    UshrLong2addr(Reg, Reg),
    #[instruction(opcode = 0xc6, mnemonic = "add-float/2addr", format = "12x")]
    AddFloat2addr(Reg, Reg),
    #[instruction(opcode = 0xc7, mnemonic = "sub-float/2addr", format = "12x")]
    SubFloat2addr(Reg, Reg),
    #[instruction(opcode = 0xc8, mnemonic = "mul-float/2addr", format = "12x")]
    MulFloat2addr(Reg, Reg),
    #[instruction(opcode = 0xc9, mnemonic = "div-float/2addr", format = "12x")]
    DivFloat2addr(Reg, Reg),
    #[instruction(opcode = 0xca, mnemonic = "rem-float/2addr", format = "12x")]
    RemFloat2addr(Reg, Reg),
    #[instruction(opcode = 0xcb, mnemonic = "add-double/2addr", format = "12x")]
    AddDouble2addr(Reg, Reg),
    #[instruction(opcode = 0xcc, mnemonic = "sub-double/2addr", format = "12x")]
    SubDouble2addr(Reg, Reg),
    #[instruction(opcode = 0xcd, mnemonic = "mul-double/2addr", format = "12x")]
    MulDouble2addr(Reg, Reg),
    #[instruction(opcode = 0xce, mnemonic = "div-double/2addr", format = "12x")]
    DivDouble2addr(Reg, Reg),
    #[instruction(opcode = 0xcf, mnemonic = "rem-double/2addr", format = "12x")]
    RemDouble2addr(Reg, Reg),

    /// Binary operations with a 16-bit literal, `rsub-int` computes `lit - src`.
    #[instruction(opcode = 0xd0, mnemonic = "add-int/lit16", format = "22s")]
    AddIntLit16(Reg, Reg, i16),
    #[instruction(opcode = 0xd1, mnemonic = "rsub-int", format = "22s")]
    RsubInt(Reg, Reg, i16),
    #[instruction(opcode = 0xd2, mnemonic = "mul-int/lit16", format = "22s")]
    MulIntLit16(Reg, Reg, i16),
    #[instruction(opcode = 0xd3, mnemonic = "div-int/lit16", format = "22s", can_throw)]
    DivIntLit16(Reg, Reg, i16),
    #[instruction(opcode = 0xd4, mnemonic = "rem-int/lit16", format = "22s", can_throw)]
    RemIntLit16(Reg, Reg, i16),
    #[instruction(opcode = 0xd5, mnemonic = "and-int/lit16", format = "22s")]
    AndIntLit16(Reg, Reg, i16),
    #[instruction(opcode = 0xd6, mnemonic = "or-int/lit16", format = "22s")]
    OrIntLit16(Reg, Reg, i16),
    #[instruction(opcode = 0xd7, mnemonic = "xor-int/lit16", format = "22s")]
    XorIntLit16(Reg, Reg, i16),

    /// Binary operations with an 8-bit literal.
    #[instruction(opcode = 0xd8, mnemonic = "add-int/lit8", format = "22b")]
    AddIntLit8(Reg, Reg, i8),
    #[instruction(opcode = 0xd9, mnemonic = "rsub-int/lit8", format = "22b")]
    RsubIntLit8(Reg, Reg, i8),
    #[instruction(opcode = 0xda, mnemonic = "mul-int/lit8", format = "22b")]
    MulIntLit8(Reg, Reg, i8),
    #[instruction(opcode = 0xdb, mnemonic = "div-int/lit8", format = "22b", can_throw)]
    DivIntLit8(Reg, Reg, i8),
    #[instruction(opcode = 0xdc, mnemonic = "rem-int/lit8", format = "22b", can_throw)]
    RemIntLit8(Reg, Reg, i8),
    #[instruction(opcode = 0xdd, mnemonic = "and-int/lit8", format = "22b")]
    AndIntLit8(Reg, Reg, i8),
    #[instruction(opcode = 0xde, mnemonic = "or-int/lit8", format = "22b")]
    OrIntLit8(Reg, Reg, i8),
    #[instruction(opcode = 0xdf, mnemonic = "xor-int/lit8", format = "22b")]
    XorIntLit8(Reg, Reg, i8),
    #[instruction(opcode = 0xe0, mnemonic = "shl-int/lit8", format = "22b")]
    ShlIntLit8(Reg, Reg, i8),
    #[instruction(opcode = 0xe1, mnemonic = "shr-int/lit8", format = "22b")]
    ShrIntLit8(Reg, Reg, i8),
    #[instruction(opcode = 0xe2, mnemonic = "ushr-int/lit8", format = "22b")]
    UshrIntLit8(Reg, Reg, i8),

    /// Signature polymorphic invocation, the proto gives the call-site signature.
    #[instruction(opcode = 0xfa, mnemonic = "invoke-polymorphic", format = "45cc", can_throw)]
    InvokePolymorphic(RegList, Index<MethodId>, Index<ProtoId>),
    #[instruction(opcode = 0xfb, mnemonic = "invoke-polymorphic/range", format = "4rcc", can_throw)]
    InvokePolymorphicRange(RegRange, Index<MethodId>, Index<ProtoId>),

    /// Invocation through a call site bootstrap.
    #[instruction(opcode = 0xfc, mnemonic = "invoke-custom", format = "35c", can_throw)]
    InvokeCustom(RegList, Index<CallSiteId>),
    #[instruction(opcode = 0xfd, mnemonic = "invoke-custom/range", format = "3rc", can_throw)]
    InvokeCustomRange(RegRange, Index<CallSiteId>),

    /// Load a method handle or a method type.
    #[instruction(opcode = 0xfe, mnemonic = "const-method-handle", format = "21c", can_throw)]
    ConstMethodHandle(Reg, Index<MethodHandleId>),
    #[instruction(opcode = 0xff, mnemonic = "const-method-type", format = "21c", can_throw)]
    ConstMethodType(Reg, Index<ProtoId>),

    /// Jump table with consecutive keys from `first_key`.
    #[instruction(opcode = 0x00, mnemonic = "packed-switch-payload", format = "payload", size = "targets.len() * 2 + 4")]
    PackedSwitchPayload { first_key: i32, targets: Vec<i32> },

    /// Jump table with sorted, explicit keys.
    #[instruction(opcode = 0x00, mnemonic = "sparse-switch-payload", format = "payload", size = "targets.len() * 4 + 2")]
    SparseSwitchPayload { keys: Vec<i32>, targets: Vec<i32> },

    /// Array initialization data, `data` holds `width`-bytes little-endian elements.
    #[instruction(opcode = 0x00, mnemonic = "fill-array-data-payload", format = "payload", size = "(data.len() + 1) / 2 + 4")]
    FillArrayDataPayload { width: u16, data: Vec<u8> },
}

impl PrettyPrint for Instr {
    fn pretty_print(&self, f: &mut fmt::Formatter, pools: &Pools) -> fmt::Result {
        write!(f, "{}", self.mnemonic())?;
        let branch = self.format().is_branch();
        let operands = self.operands();
        let last = operands.len().saturating_sub(1);
        for (i, operand) in operands.iter().enumerate() {
            write!(f, "{}", if i == 0 { " " } else { ", " })?;
            match operand {
                Operand::Reg(r) => write!(f, "{r}")?,
                Operand::RegList(l) => write!(f, "{l}")?,
                Operand::RegRange(r) => write!(f, "{r}")?,
                Operand::Pool(tag, idx) => write!(f, "{}", pools.describe(*tag, *idx))?,
                lit => {
                    let v = lit.as_i64().unwrap_or_default();
                    if branch && i == last {
                        write!(f, "{v:+}")?;
                    } else {
                        write!(f, "#{v}")?;
                    }
                }
            }
        }
        match self {
            Self::PackedSwitchPayload { first_key, targets } => {
                write!(f, " {first_key} [")?;
                write_targets(f, targets)?;
                write!(f, "]")
            }
            Self::SparseSwitchPayload { keys, targets } => {
                write!(f, " [")?;
                for (i, (key, target)) in keys.iter().zip(targets).enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {target:+}")?;
                }
                write!(f, "]")
            }
            Self::FillArrayDataPayload { width, data } => {
                write!(f, " width={width} bytes={}", data.len())
            }
            _ => Ok(()),
        }
    }
}

fn write_targets(f: &mut fmt::Formatter, targets: &[i32]) -> fmt::Result {
    for (i, target) in targets.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{target:+}")?;
    }
    Ok(())
}

impl PrettyPrint for LabeledInstr {
    fn pretty_print(&self, f: &mut fmt::Formatter, pools: &Pools) -> fmt::Result {
        write!(f, "{}: ", self.addr)?;
        self.instr.pretty_print(f, pools)
    }
}

impl Instr {
    /// Elements of a `fill-array-data-payload`, sign-extended from their
    /// little-endian `width` bytes representation.
    #[must_use]
    pub fn array_data_elements(&self) -> Option<Vec<i64>> {
        match self {
            Self::FillArrayDataPayload { width, data } => {
                let width = usize::from(*width);
                if width == 0 || width > 8 || data.len() % width != 0 {
                    return None;
                }
                Some(
                    data.chunks(width)
                        .map(|chunk| {
                            let mut bytes = [0u8; 8];
                            bytes[..width].copy_from_slice(chunk);
                            let shift = 64 - 8 * width as u32;
                            (i64::from_le_bytes(bytes) << shift) >> shift
                        })
                        .collect(),
                )
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrettyPrinter;

    #[test]
    fn derived_attributes() {
        let instr = Instr::IfLt(Reg::from(1u8), Reg::from(2u8), -4);
        assert_eq!(instr.opcode(), 0x34);
        assert_eq!(instr.mnemonic(), "if-lt");
        assert_eq!(instr.format(), Format::F22t);
        assert_eq!(instr.size(), 2);
        assert!(!instr.can_throw());
        assert_eq!(
            instr.operands(),
            vec![
                Operand::Reg(Reg::from(1u8)),
                Operand::Reg(Reg::from(2u8)),
                Operand::Int16(-4)
            ]
        );

        let invoke = Instr::InvokeStatic(RegList::from(vec![0u8]), Index::new(3));
        assert_eq!(invoke.size(), 3);
        assert!(invoke.can_throw());
        assert_eq!(invoke.operands()[1], Operand::Pool(PoolTag::Method, 3));
    }

    #[test]
    fn payload_sizes() {
        let packed = Instr::PackedSwitchPayload {
            first_key: 10,
            targets: vec![3, 6, 9],
        };
        assert_eq!(packed.size(), 10);
        let sparse = Instr::SparseSwitchPayload {
            keys: vec![1, 100],
            targets: vec![3, 6],
        };
        assert_eq!(sparse.size(), 10);
        let data = Instr::FillArrayDataPayload {
            width: 2,
            data: vec![1, 0, 2, 0, 3, 0],
        };
        assert_eq!(data.size(), 7);
        assert_eq!(data.format(), Format::Payload);
        assert!(data.operands().is_empty());
    }

    #[test]
    fn array_data() {
        let data = Instr::FillArrayDataPayload {
            width: 2,
            data: vec![0xff, 0xff, 0x02, 0x00],
        };
        assert_eq!(data.array_data_elements(), Some(vec![-1, 2]));
        let odd = Instr::FillArrayDataPayload {
            width: 4,
            data: vec![0; 6],
        };
        assert_eq!(odd.array_data_elements(), None);
    }

    #[test]
    fn pretty_printing() {
        let pools = Pools {
            strings: vec!["hi".to_string()],
            ..Pools::default()
        };
        let instr = LabeledInstr::new(Addr(2), Instr::IfEqz(Reg::from(3u8), -2));
        assert_eq!(
            PrettyPrinter(&instr, &pools).to_string(),
            "0002: if-eqz v3, -2"
        );
        let instr = Instr::ConstString(Reg::from(0u8), Index::new(0));
        assert_eq!(
            PrettyPrinter(&instr, &pools).to_string(),
            "const-string v0, \"hi\""
        );
        let instr = Instr::Const4(Reg::from(0u8), -1);
        assert_eq!(PrettyPrinter(&instr, &pools).to_string(), "const/4 v0, #-1");
    }
}
