//! `nom` parsers for code units and code items.

use crate::code::{CatchHandler, Code, TryItem};
use crate::errors::{BytecodeError, BytecodeResult};
use crate::instrs::{Instr, Instruction, LabeledInstr};
use crate::pools::{Index, MethodId, ProtoId, TypeId};
use crate::registers::{Reg, RegList, RegRange};
use crate::Addr;
use dl_utils::leb::{Sleb128, Uleb128};
use nom::bytes::complete::{tag, take};
use nom::combinator::{cond, map, value, verify};
use nom::error::{ErrorKind, ParseError};
use nom::multi::count;
use nom::number::complete::{le_i16, le_i32, le_i64, le_i8, le_u16, le_u32, le_u8};
use nom::sequence::{pair, preceded, tuple};
use nom::Err::Error;
use nom::IResult;
use std::collections::BTreeMap;

type Parsed<'a, T> = IResult<&'a [u8], T, BytecodeError>;

/// Decodes a whole instructions array (little-endian code units), labelling
/// each instruction with its address.
pub fn parse_instructions(mut insns: &[u8]) -> BytecodeResult<Vec<LabeledInstr>> {
    if insns.len() % 2 != 0 {
        return Err(BytecodeError::Structure(
            "odd number of bytes in instructions array".to_string(),
        ));
    }

    let mut instrs = Vec::new();
    let mut addr = Addr::entry();
    while !insns.is_empty() {
        let consumed = insns.len();
        let (rest, instr) = parse_instr(insns)?;
        if (consumed - rest.len()) != instr.size() * 2 {
            return Err(BytecodeError::Structure(format!(
                "{} at {addr} does not span {} code units",
                instr.mnemonic(),
                instr.size()
            )));
        }
        if let Instr::FillArrayDataPayload { width, .. } = &instr {
            if !matches!(width, 1 | 2 | 4 | 8) {
                return Err(BytecodeError::BadPayload {
                    addr,
                    expected: "an element width of 1, 2, 4 or 8 bytes",
                });
            }
        }
        log::trace!("decoded {} at {addr}", instr.mnemonic());
        let next = addr.after(instr.size());
        instrs.push(LabeledInstr::new(addr, instr));
        addr = next;
        insns = rest;
    }
    Ok(instrs)
}

/// Decodes a code item: registers header, instructions and exception
/// ranges with their catch handlers.
pub fn parse_code(input: &[u8]) -> BytecodeResult<Code> {
    let (_, code) = code_item_parser(input)?;
    if code.ins_size > code.registers_size {
        return Err(BytecodeError::Structure(format!(
            "{} incoming words do not fit in {} registers",
            code.ins_size, code.registers_size
        )));
    }
    Ok(code)
}

fn code_item_parser(input: &[u8]) -> Parsed<Code> {
    let (input, registers_size) = le_u16(input)?;
    let (input, ins_size) = le_u16(input)?;
    let (input, outs_size) = le_u16(input)?;
    let (input, tries_size) = le_u16(input)?;
    let (input, _debug_info_off) = le_u32(input)?;
    let (input, insns_size) = le_u32(input)?;
    let (input, insns) = take(insns_size as usize * 2)(input)?;
    let insns = parse_instructions(insns).map_err(Error)?;

    let (input, _) = cond(tries_size != 0 && insns_size % 2 == 1, tag("\x00\x00"))(input)?;
    let (input, raw_tries) = count(try_item_parser, tries_size as usize)(input)?;
    let (input, handlers) = if tries_size == 0 {
        (input, BTreeMap::new())
    } else {
        encoded_catch_handler_list_parser(input)?
    };

    let mut tries = Vec::with_capacity(raw_tries.len());
    for (start, count, handler_off) in raw_tries {
        let handler = handlers.get(&handler_off).cloned().ok_or_else(|| {
            Error(BytecodeError::Structure(format!(
                "no catch handler at offset {handler_off}"
            )))
        })?;
        tries.push(TryItem {
            start: Addr(start as usize),
            count: count as usize,
            handler,
        });
    }

    Ok((
        input,
        Code {
            registers_size,
            ins_size,
            outs_size,
            insns,
            tries,
        },
    ))
}

fn try_item_parser(input: &[u8]) -> Parsed<(u32, u16, u16)> {
    tuple((le_u32, le_u16, le_u16))(input)
}

/// Handlers keyed by their byte offset from the start of the list.
fn encoded_catch_handler_list_parser(input: &[u8]) -> Parsed<BTreeMap<u16, CatchHandler>> {
    let start = input.len();
    let (mut current, nb) = uleb128(input)?;

    let mut list = BTreeMap::new();
    for _ in 0..nb.value() {
        let offset = u16::try_from(start - current.len()).map_err(|_| {
            Error(BytecodeError::Structure(
                "catch handlers list is too large".to_string(),
            ))
        })?;
        let (rest, handler) = encoded_catch_handler_parser(current)?;
        list.insert(offset, handler);
        current = rest;
    }
    Ok((current, list))
}

fn encoded_catch_handler_parser(input: &[u8]) -> Parsed<CatchHandler> {
    let (input, size) = sleb128(input)?;
    let (input, catches) = count(
        map(pair(uleb128, uleb128), |(type_idx, addr)| {
            (
                Index::<TypeId>::new(type_idx.value() as usize),
                Addr(addr.value() as usize),
            )
        }),
        size.value().unsigned_abs() as usize,
    )(input)?;
    let (input, catch_all) = cond(size.value() <= 0, uleb128)(input)?;

    Ok((
        input,
        CatchHandler {
            catches,
            catch_all: catch_all.map(|addr| Addr(addr.value() as usize)),
        },
    ))
}

fn uleb128(input: &[u8]) -> Parsed<Uleb128> {
    match Uleb128::decode(input) {
        Some((v, size)) => Ok((&input[size..], v)),
        None => Err(Error(BytecodeError::from_error_kind(input, ErrorKind::TooLarge))),
    }
}

fn sleb128(input: &[u8]) -> Parsed<Sleb128> {
    match Sleb128::decode(input) {
        Some((v, size)) => Ok((&input[size..], v)),
        None => Err(Error(BytecodeError::from_error_kind(input, ErrorKind::TooLarge))),
    }
}

pub(crate) fn parse_instr(input: &[u8]) -> Parsed<Instr> {
    let (input, opcode) = le_u8(input)?;
    match opcode {
        0x00 => parse_pseudo_instr(input),
        0x01 => instr_12x(input, Instr::Move),
        0x02 => instr_22x(input, Instr::MoveFrom16),
        0x03 => instr_32x(input, Instr::Move16),
        0x04 => instr_12x(input, Instr::MoveWide),
        0x05 => instr_22x(input, Instr::MoveWideFrom16),
        0x06 => instr_32x(input, Instr::MoveWide16),
        0x07 => instr_12x(input, Instr::MoveObject),
        0x08 => instr_22x(input, Instr::MoveObjectFrom16),
        0x09 => instr_32x(input, Instr::MoveObject16),
        0x0a => instr_11x(input, Instr::MoveResult),
        0x0b => instr_11x(input, Instr::MoveResultWide),
        0x0c => instr_11x(input, Instr::MoveResultObject),
        0x0d => instr_11x(input, Instr::MoveException),
        0x0e => value(Instr::ReturnVoid, parse_10x)(input),
        0x0f => instr_11x(input, Instr::Return),
        0x10 => instr_11x(input, Instr::ReturnWide),
        0x11 => instr_11x(input, Instr::ReturnObject),
        0x12 => instr_11n(input, Instr::Const4),
        0x13 => instr_21s(input, Instr::Const16),
        0x14 => instr_31i(input, Instr::Const),
        0x15 => instr_21h(input, Instr::ConstHigh16),
        0x16 => instr_21s(input, Instr::ConstWide16),
        0x17 => instr_31i(input, Instr::ConstWide32),
        0x18 => instr_51l(input, Instr::ConstWide),
        0x19 => instr_21h(input, Instr::ConstWideHigh16),
        0x1a => instr_21c(input, Instr::ConstString),
        0x1b => instr_31c(input, Instr::ConstStringJumbo),
        0x1c => instr_21c(input, Instr::ConstClass),
        0x1d => instr_11x(input, Instr::MonitorEnter),
        0x1e => instr_11x(input, Instr::MonitorExit),
        0x1f => instr_21c(input, Instr::CheckCast),
        0x20 => instr_22c(input, Instr::InstanceOf),
        0x21 => instr_12x(input, Instr::ArrayLength),
        0x22 => instr_21c(input, Instr::NewInstance),
        0x23 => instr_22c(input, Instr::NewArray),
        0x24 => instr_35c(input, Instr::FilledNewArray),
        0x25 => instr_3rc(input, Instr::FilledNewArrayRange),
        0x26 => instr_31t(input, Instr::FillArrayData),
        0x27 => instr_11x(input, Instr::Throw),
        0x28 => instr_10t(input, Instr::Goto),
        0x29 => instr_20t(input, Instr::Goto16),
        0x2a => instr_30t(input, Instr::Goto32),
        0x2b => instr_31t(input, Instr::PackedSwitch),
        0x2c => instr_31t(input, Instr::SparseSwitch),
        0x2d => instr_23x(input, Instr::CmplFloat),
        0x2e => instr_23x(input, Instr::CmpgFloat),
        0x2f => instr_23x(input, Instr::CmplDouble),
        0x30 => instr_23x(input, Instr::CmpgDouble),
        0x31 => instr_23x(input, Instr::CmpLong),
        0x32 => instr_22t(input, Instr::IfEq),
        0x33 => instr_22t(input, Instr::IfNe),
        0x34 => instr_22t(input, Instr::IfLt),
        0x35 => instr_22t(input, Instr::IfGe),
        0x36 => instr_22t(input, Instr::IfGt),
        0x37 => instr_22t(input, Instr::IfLe),
        0x38 => instr_21t(input, Instr::IfEqz),
        0x39 => instr_21t(input, Instr::IfNez),
        0x3a => instr_21t(input, Instr::IfLtz),
        0x3b => instr_21t(input, Instr::IfGez),
        0x3c => instr_21t(input, Instr::IfGtz),
        0x3d => instr_21t(input, Instr::IfLez),
        0x44 => instr_23x(input, Instr::Aget),
        0x45 => instr_23x(input, Instr::AgetWide),
        0x46 => instr_23x(input, Instr::AgetObject),
        0x47 => instr_23x(input, Instr::AgetBoolean),
        0x48 => instr_23x(input, Instr::AgetByte),
        0x49 => instr_23x(input, Instr::AgetChar),
        0x4a => instr_23x(input, Instr::AgetShort),
        0x4b => instr_23x(input, Instr::Aput),
        0x4c => instr_23x(input, Instr::AputWide),
        0x4d => instr_23x(input, Instr::AputObject),
        0x4e => instr_23x(input, Instr::AputBoolean),
        0x4f => instr_23x(input, Instr::AputByte),
        0x50 => instr_23x(input, Instr::AputChar),
        0x51 => instr_23x(input, Instr::AputShort),
        0x52 => instr_22c(input, Instr::Iget),
        0x53 => instr_22c(input, Instr::IgetWide),
        0x54 => instr_22c(input, Instr::IgetObject),
        0x55 => instr_22c(input, Instr::IgetBoolean),
        0x56 => instr_22c(input, Instr::IgetByte),
        0x57 => instr_22c(input, Instr::IgetChar),
        0x58 => instr_22c(input, Instr::IgetShort),
        0x59 => instr_22c(input, Instr::Iput),
        0x5a => instr_22c(input, Instr::IputWide),
        0x5b => instr_22c(input, Instr::IputObject),
        0x5c => instr_22c(input, Instr::IputBoolean),
        0x5d => instr_22c(input, Instr::IputByte),
        0x5e => instr_22c(input, Instr::IputChar),
        0x5f => instr_22c(input, Instr::IputShort),
        0x60 => instr_21c(input, Instr::Sget),
        0x61 => instr_21c(input, Instr::SgetWide),
        0x62 => instr_21c(input, Instr::SgetObject),
        0x63 => instr_21c(input, Instr::SgetBoolean),
        0x64 => instr_21c(input, Instr::SgetByte),
        0x65 => instr_21c(input, Instr::SgetChar),
        0x66 => instr_21c(input, Instr::SgetShort),
        0x67 => instr_21c(input, Instr::Sput),
        0x68 => instr_21c(input, Instr::SputWide),
        0x69 => instr_21c(input, Instr::SputObject),
        0x6a => instr_21c(input, Instr::SputBoolean),
        0x6b => instr_21c(input, Instr::SputByte),
        0x6c => instr_21c(input, Instr::SputChar),
        0x6d => instr_21c(input, Instr::SputShort),
        0x6e => instr_35c(input, Instr::InvokeVirtual),
        0x6f => instr_35c(input, Instr::InvokeSuper),
        0x70 => instr_35c(input, Instr::InvokeDirect),
        0x71 => instr_35c(input, Instr::InvokeStatic),
        0x72 => instr_35c(input, Instr::InvokeInterface),
        0x74 => instr_3rc(input, Instr::InvokeVirtualRange),
        0x75 => instr_3rc(input, Instr::InvokeSuperRange),
        0x76 => instr_3rc(input, Instr::InvokeDirectRange),
        0x77 => instr_3rc(input, Instr::InvokeStaticRange),
        0x78 => instr_3rc(input, Instr::InvokeInterfaceRange),
        0x7b => instr_12x(input, Instr::NegInt),
        0x7c => instr_12x(input, Instr::NotInt),
        0x7d => instr_12x(input, Instr::NegLong),
        0x7e => instr_12x(input, Instr::NotLong),
        0x7f => instr_12x(input, Instr::NegFloat),
        0x80 => instr_12x(input, Instr::NegDouble),
        0x81 => instr_12x(input, Instr::IntToLong),
        0x82 => instr_12x(input, Instr::IntToFloat),
        0x83 => instr_12x(input, Instr::IntToDouble),
        0x84 => instr_12x(input, Instr::LongToInt),
        0x85 => instr_12x(input, Instr::LongToFloat),
        0x86 => instr_12x(input, Instr::LongToDouble),
        0x87 => instr_12x(input, Instr::FloatToInt),
        0x88 => instr_12x(input, Instr::FloatToLong),
        0x89 => instr_12x(input, Instr::FloatToDouble),
        0x8a => instr_12x(input, Instr::DoubleToInt),
        0x8b => instr_12x(input, Instr::DoubleToLong),
        0x8c => instr_12x(input, Instr::DoubleToFloat),
        0x8d => instr_12x(input, Instr::IntToByte),
        0x8e => instr_12x(input, Instr::IntToChar),
        0x8f => instr_12x(input, Instr::IntToShort),
        0x90 => instr_23x(input, Instr::AddInt),
        0x91 => instr_23x(input, Instr::SubInt),
        0x92 => instr_23x(input, Instr::MulInt),
        0x93 => instr_23x(input, Instr::DivInt),
        0x94 => instr_23x(input, Instr::RemInt),
        0x95 => instr_23x(input, Instr::AndInt),
        0x96 => instr_23x(input, Instr::OrInt),
        0x97 => instr_23x(input, Instr::XorInt),
        0x98 => instr_23x(input, Instr::ShlInt),
        0x99 => instr_23x(input, Instr::ShrInt),
        0x9a => instr_23x(input, Instr::UshrInt),
        0x9b => instr_23x(input, Instr::AddLong),
        0x9c => instr_23x(input, Instr::SubLong),
        0x9d => instr_23x(input, Instr::MulLong),
        0x9e => instr_23x(input, Instr::DivLong),
        0x9f => instr_23x(input, Instr::RemLong),
        0xa0 => instr_23x(input, Instr::AndLong),
        0xa1 => instr_23x(input, Instr::OrLong),
        0xa2 => instr_23x(input, Instr::XorLong),
        0xa3 => instr_23x(input, Instr::ShlLong),
        0xa4 => instr_23x(input, Instr::ShrLong),
        0xa5 => instr_23x(input, Instr::UshrLong),
        0xa6 => instr_23x(input, Instr::AddFloat),
        0xa7 => instr_23x(input, Instr::SubFloat),
        0xa8 => instr_23x(input, Instr::MulFloat),
        0xa9 => instr_23x(input, Instr::DivFloat),
        0xaa => instr_23x(input, Instr::RemFloat),
        0xab => instr_23x(input, Instr::AddDouble),
        0xac => instr_23x(input, Instr::SubDouble),
        0xad => instr_23x(input, Instr::MulDouble),
        0xae => instr_23x(input, Instr::DivDouble),
        0xaf => instr_23x(input, Instr::RemDouble),
        0xb0 => instr_12x(input, Instr::AddInt2addr),
        0xb1 => instr_12x(input, Instr::SubInt2addr),
        0xb2 => instr_12x(input, Instr::MulInt2addr),
        0xb3 => instr_12x(input, Instr::DivInt2addr),
        0xb4 => instr_12x(input, Instr::RemInt2addr),
        0xb5 => instr_12x(input, Instr::AndInt2addr),
        0xb6 => instr_12x(input, Instr::OrInt2addr),
        0xb7 => instr_12x(input, Instr::XorInt2addr),
        0xb8 => instr_12x(input, Instr::ShlInt2addr),
        0xb9 => instr_12x(input, Instr::ShrInt2addr),
        0xba => instr_12x(input, Instr::UshrInt2addr),
        0xbb => instr_12x(input, Instr::AddLong2addr),
        0xbc => instr_12x(input, Instr::SubLong2addr),
        0xbd => instr_12x(input, Instr::MulLong2addr),
        0xbe => instr_12x(input, Instr::DivLong2addr),
        0xbf => instr_12x(input, Instr::RemLong2addr),
        0xc0 => instr_12x(input, Instr::AndLong2addr),
        0xc1 => instr_12x(input, Instr::OrLong2addr),
        0xc2 => instr_12x(input, Instr::XorLong2addr),
        0xc3 => instr_12x(input, Instr::ShlLong2addr),
        0xc4 => instr_12x(input, Instr::ShrLong2addr),
        0xc5 => instr_12x(input, Instr::UshrLong2addr),
        0xc6 => instr_12x(input, Instr::AddFloat2addr),
        0xc7 => instr_12x(input, Instr::SubFloat2addr),
        0xc8 => instr_12x(input, Instr::MulFloat2addr),
        0xc9 => instr_12x(input, Instr::DivFloat2addr),
        0xca => instr_12x(input, Instr::RemFloat2addr),
        0xcb => instr_12x(input, Instr::AddDouble2addr),
        0xcc => instr_12x(input, Instr::SubDouble2addr),
        0xcd => instr_12x(input, Instr::MulDouble2addr),
        0xce => instr_12x(input, Instr::DivDouble2addr),
        0xcf => instr_12x(input, Instr::RemDouble2addr),
        0xd0 => instr_22s(input, Instr::AddIntLit16),
        0xd1 => instr_22s(input, Instr::RsubInt),
        0xd2 => instr_22s(input, Instr::MulIntLit16),
        0xd3 => instr_22s(input, Instr::DivIntLit16),
        0xd4 => instr_22s(input, Instr::RemIntLit16),
        0xd5 => instr_22s(input, Instr::AndIntLit16),
        0xd6 => instr_22s(input, Instr::OrIntLit16),
        0xd7 => instr_22s(input, Instr::XorIntLit16),
        0xd8 => instr_22b(input, Instr::AddIntLit8),
        0xd9 => instr_22b(input, Instr::RsubIntLit8),
        0xda => instr_22b(input, Instr::MulIntLit8),
        0xdb => instr_22b(input, Instr::DivIntLit8),
        0xdc => instr_22b(input, Instr::RemIntLit8),
        0xdd => instr_22b(input, Instr::AndIntLit8),
        0xde => instr_22b(input, Instr::OrIntLit8),
        0xdf => instr_22b(input, Instr::XorIntLit8),
        0xe0 => instr_22b(input, Instr::ShlIntLit8),
        0xe1 => instr_22b(input, Instr::ShrIntLit8),
        0xe2 => instr_22b(input, Instr::UshrIntLit8),
        0xfa => instr_45cc(input, Instr::InvokePolymorphic),
        0xfb => instr_4rcc(input, Instr::InvokePolymorphicRange),
        0xfc => instr_35c(input, Instr::InvokeCustom),
        0xfd => instr_3rc(input, Instr::InvokeCustomRange),
        0xfe => instr_21c(input, Instr::ConstMethodHandle),
        0xff => instr_21c(input, Instr::ConstMethodType),
        _ => Err(Error(BytecodeError::UnknownOpcode(opcode))),
    }
}

fn parse_pseudo_instr(input: &[u8]) -> Parsed<Instr> {
    let (input, ident) = le_u8(input)?;
    match ident {
        0x00 => Ok((input, Instr::Nop)),
        0x01 => {
            let (input, size) = le_u16(input)?;
            let (input, first_key) = le_i32(input)?;
            let (input, targets) = count(le_i32, size as usize)(input)?;
            Ok((input, Instr::PackedSwitchPayload { first_key, targets }))
        }
        0x02 => {
            let (input, size) = le_u16(input)?;
            let (input, keys) = count(le_i32, size as usize)(input)?;
            let (input, targets) = count(le_i32, size as usize)(input)?;
            Ok((input, Instr::SparseSwitchPayload { keys, targets }))
        }
        0x03 => {
            let (input, width) = le_u16(input)?;
            let (input, size) = le_u32(input)?;
            let len = size as usize * width as usize;
            let (input, data) = take(len)(input)?;
            let (input, _) = cond(len % 2 == 1, take(1usize))(input)?;
            Ok((
                input,
                Instr::FillArrayDataPayload {
                    width,
                    data: data.to_vec(),
                },
            ))
        }
        _ => Err(Error(BytecodeError::from_error_kind(input, ErrorKind::Switch))),
    }
}

/// Splits a byte into its (low, high) nibbles.
fn nibbles(input: &[u8]) -> Parsed<(u8, u8)> {
    map(le_u8, |b| (b & 0x0f, b >> 4))(input)
}

fn parse_10x(input: &[u8]) -> Parsed<()> {
    value((), tag("\x00"))(input)
}

fn instr_12x(input: &[u8], make: fn(Reg, Reg) -> Instr) -> Parsed<Instr> {
    let (input, (a, b)) = nibbles(input)?;
    Ok((input, make(Reg::from(a), Reg::from(b))))
}

#[allow(clippy::cast_possible_wrap)]
fn instr_11n(input: &[u8], make: fn(Reg, i8) -> Instr) -> Parsed<Instr> {
    let (input, (a, b)) = nibbles(input)?;
    // sign-extend the 4 bits literal
    let lit = ((b << 4) as i8) >> 4;
    Ok((input, make(Reg::from(a), lit)))
}

fn instr_11x(input: &[u8], make: fn(Reg) -> Instr) -> Parsed<Instr> {
    map(le_u8, |a| make(Reg::from(a)))(input)
}

fn instr_10t(input: &[u8], make: fn(i8) -> Instr) -> Parsed<Instr> {
    map(le_i8, make)(input)
}

fn instr_20t(input: &[u8], make: fn(i16) -> Instr) -> Parsed<Instr> {
    map(preceded(tag("\x00"), le_i16), make)(input)
}

fn instr_30t(input: &[u8], make: fn(i32) -> Instr) -> Parsed<Instr> {
    map(preceded(tag("\x00"), le_i32), make)(input)
}

fn instr_22x(input: &[u8], make: fn(Reg, Reg) -> Instr) -> Parsed<Instr> {
    map(pair(le_u8, le_u16), |(a, b)| make(Reg::from(a), Reg::from(b)))(input)
}

fn instr_32x(input: &[u8], make: fn(Reg, Reg) -> Instr) -> Parsed<Instr> {
    map(preceded(tag("\x00"), pair(le_u16, le_u16)), |(a, b)| {
        make(Reg::from(a), Reg::from(b))
    })(input)
}

fn reg_lit16(input: &[u8], make: fn(Reg, i16) -> Instr) -> Parsed<Instr> {
    map(pair(le_u8, le_i16), |(a, b)| make(Reg::from(a), b))(input)
}

fn instr_21t(input: &[u8], make: fn(Reg, i16) -> Instr) -> Parsed<Instr> {
    reg_lit16(input, make)
}

fn instr_21s(input: &[u8], make: fn(Reg, i16) -> Instr) -> Parsed<Instr> {
    reg_lit16(input, make)
}

fn instr_21h(input: &[u8], make: fn(Reg, i16) -> Instr) -> Parsed<Instr> {
    reg_lit16(input, make)
}

fn instr_21c<T>(input: &[u8], make: fn(Reg, Index<T>) -> Instr) -> Parsed<Instr> {
    map(pair(le_u8, le_u16), |(a, b)| {
        make(Reg::from(a), Index::new(b as usize))
    })(input)
}

fn instr_23x(input: &[u8], make: fn(Reg, Reg, Reg) -> Instr) -> Parsed<Instr> {
    map(tuple((le_u8, le_u8, le_u8)), |(a, b, c)| {
        make(Reg::from(a), Reg::from(b), Reg::from(c))
    })(input)
}

fn instr_22b(input: &[u8], make: fn(Reg, Reg, i8) -> Instr) -> Parsed<Instr> {
    map(tuple((le_u8, le_u8, le_i8)), |(a, b, c)| {
        make(Reg::from(a), Reg::from(b), c)
    })(input)
}

fn regs_lit16(input: &[u8], make: fn(Reg, Reg, i16) -> Instr) -> Parsed<Instr> {
    map(pair(nibbles, le_i16), |((a, b), c)| {
        make(Reg::from(a), Reg::from(b), c)
    })(input)
}

fn instr_22t(input: &[u8], make: fn(Reg, Reg, i16) -> Instr) -> Parsed<Instr> {
    regs_lit16(input, make)
}

fn instr_22s(input: &[u8], make: fn(Reg, Reg, i16) -> Instr) -> Parsed<Instr> {
    regs_lit16(input, make)
}

fn instr_22c<T>(input: &[u8], make: fn(Reg, Reg, Index<T>) -> Instr) -> Parsed<Instr> {
    map(pair(nibbles, le_u16), |((a, b), c)| {
        make(Reg::from(a), Reg::from(b), Index::new(c as usize))
    })(input)
}

fn reg_lit32(input: &[u8], make: fn(Reg, i32) -> Instr) -> Parsed<Instr> {
    map(pair(le_u8, le_i32), |(a, b)| make(Reg::from(a), b))(input)
}

fn instr_31i(input: &[u8], make: fn(Reg, i32) -> Instr) -> Parsed<Instr> {
    reg_lit32(input, make)
}

fn instr_31t(input: &[u8], make: fn(Reg, i32) -> Instr) -> Parsed<Instr> {
    reg_lit32(input, make)
}

fn instr_31c<T>(input: &[u8], make: fn(Reg, Index<T>) -> Instr) -> Parsed<Instr> {
    map(pair(le_u8, le_u32), |(a, b)| {
        make(Reg::from(a), Index::new(b as usize))
    })(input)
}

/// Argument registers of the `35c` and `45cc` formats: `A|G` then (after
/// the pool index) `D|C` and `F|E`, `A` being the number of arguments.
fn reg_list(head: (u8, u8), tail: (u8, u8, u8, u8)) -> RegList {
    let (g, a) = head;
    let (c, d, e, f) = tail;
    RegList::from(
        [c, d, e, f, g]
            .into_iter()
            .take(a as usize)
            .collect::<Vec<u8>>(),
    )
}

fn list_tail(input: &[u8]) -> Parsed<(u8, u8, u8, u8)> {
    map(pair(nibbles, nibbles), |((c, d), (e, f))| (c, d, e, f))(input)
}

fn instr_35c<T>(input: &[u8], make: fn(RegList, Index<T>) -> Instr) -> Parsed<Instr> {
    let (input, head) = verify(nibbles, |(_, a): &(u8, u8)| *a <= 5)(input)?;
    let (input, b) = le_u16(input)?;
    let (input, tail) = list_tail(input)?;
    Ok((input, make(reg_list(head, tail), Index::new(b as usize))))
}

fn instr_3rc<T>(input: &[u8], make: fn(RegRange, Index<T>) -> Instr) -> Parsed<Instr> {
    map(tuple((le_u8, le_u16, le_u16)), |(a, b, c)| {
        make(RegRange::new(Reg::from(c), a), Index::new(b as usize))
    })(input)
}

fn instr_45cc(
    input: &[u8],
    make: fn(RegList, Index<MethodId>, Index<ProtoId>) -> Instr,
) -> Parsed<Instr> {
    let (input, head) = verify(nibbles, |(_, a): &(u8, u8)| *a <= 5)(input)?;
    let (input, b) = le_u16(input)?;
    let (input, tail) = list_tail(input)?;
    let (input, h) = le_u16(input)?;
    Ok((
        input,
        make(
            reg_list(head, tail),
            Index::new(b as usize),
            Index::new(h as usize),
        ),
    ))
}

fn instr_4rcc(
    input: &[u8],
    make: fn(RegRange, Index<MethodId>, Index<ProtoId>) -> Instr,
) -> Parsed<Instr> {
    map(tuple((le_u8, le_u16, le_u16, le_u16)), |(a, b, c, h)| {
        make(
            RegRange::new(Reg::from(c), a),
            Index::new(b as usize),
            Index::new(h as usize),
        )
    })(input)
}

fn instr_51l(input: &[u8], make: fn(Reg, i64) -> Instr) -> Parsed<Instr> {
    map(pair(le_u8, le_i64), |(a, b)| make(Reg::from(a), b))(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nibble_order() {
        // if-ne v3, v12, +8
        let instrs = parse_instructions(&[0x33, 0xc3, 0x08, 0x00]).unwrap();
        assert_eq!(
            instrs[0].instr,
            Instr::IfNe(Reg::from(3u8), Reg::from(12u8), 8)
        );
    }

    #[test]
    fn const4_sign_extension() {
        let instrs = parse_instructions(&[0x12, 0xf1, 0x12, 0x72]).unwrap();
        assert_eq!(instrs[0].instr, Instr::Const4(Reg::from(1u8), -1));
        assert_eq!(instrs[1].instr, Instr::Const4(Reg::from(2u8), 7));
        assert_eq!(instrs[1].addr, Addr(1));
    }

    #[test]
    fn invoke_arguments() {
        // invoke-virtual {v1, v2, v3}, method@5
        let instrs = parse_instructions(&[0x6e, 0x30, 0x05, 0x00, 0x21, 0x03]).unwrap();
        assert_eq!(
            instrs[0].instr,
            Instr::InvokeVirtual(RegList::from(vec![1u8, 2, 3]), Index::new(5))
        );
        // more than five arguments
        assert!(parse_instructions(&[0x6e, 0x60, 0x05, 0x00, 0x21, 0x03]).is_err());
    }

    #[test]
    fn empty_range() {
        let instrs = parse_instructions(&[0x77, 0x00, 0x02, 0x00, 0x04, 0x00]).unwrap();
        assert_eq!(
            instrs[0].instr,
            Instr::InvokeStaticRange(RegRange::new(Reg::from(4u16), 0), Index::new(2))
        );
    }

    #[test]
    fn unknown_opcode() {
        assert!(matches!(
            parse_instructions(&[0x3e, 0x00]),
            Err(BytecodeError::UnknownOpcode(0x3e))
        ));
    }

    #[test]
    fn truncated_instruction() {
        assert!(matches!(
            parse_instructions(&[0x14, 0x00, 0x01, 0x00]),
            Err(BytecodeError::Parsing(_, _))
        ));
    }

    #[test]
    fn fill_array_data_padding() {
        // three 1-byte elements, padded to four bytes
        let bytes = [
            0x00, 0x03, 0x01, 0x00, 0x03, 0x00, 0x00, 0x00, 0x0a, 0x0b, 0x0c, 0x00,
        ];
        let instrs = parse_instructions(&bytes).unwrap();
        assert_eq!(instrs.len(), 1);
        assert_eq!(instrs[0].instr.size(), 6);
        assert_eq!(instrs[0].instr.array_data_elements(), Some(vec![10, 11, 12]));

        // one 3-byte element
        let bytes = [
            0x00, 0x03, 0x03, 0x00, 0x01, 0x00, 0x00, 0x00, 0x0a, 0x0b, 0x0c, 0x00,
        ];
        assert!(matches!(
            parse_instructions(&bytes),
            Err(BytecodeError::BadPayload { addr: Addr(0), .. })
        ));
    }
}
