//! Writers for instructions and code items, inverse of the parsers.

use crate::code::{CatchHandler, Code};
use crate::instrs::{Format, Instr, Instruction, Operand};
use crate::registers::{Reg, RegList, RegRange};
use dl_utils::leb::{Sleb128, Uleb128};
use dl_utils::writers::{
    bytes, le_i16, le_i32, le_i64, le_i8, le_u16, le_u32, le_u8, sleb128, uleb128,
};
use std::io::{Error, ErrorKind, Result, Write};

fn invalid(msg: String) -> Error {
    Error::new(ErrorKind::InvalidData, msg)
}

fn nibble(r: Reg) -> Result<u8> {
    if r.is_nibble() {
        Ok(r.value() as u8)
    } else {
        Err(invalid(format!("register {r} cannot fit into 4 bits")))
    }
}

fn byte(r: Reg) -> Result<u8> {
    u8::try_from(r)
}

fn index16(idx: usize) -> Result<u16> {
    u16::try_from(idx).map_err(|_| invalid(format!("index {idx} cannot fit into 16 bits")))
}

fn index32(idx: usize) -> Result<u32> {
    u32::try_from(idx).map_err(|_| invalid(format!("index {idx} cannot fit into 32 bits")))
}

/// Writes a byte made of two nibbles, `low` in the low bits.
fn le_nibbles<W: Write>(output: &mut W, low: u8, high: u8) -> Result<usize> {
    le_u8(output, (high << 4) | (low & 0x0f))
}

/// Writes a single instruction, returning the number of written bytes.
#[allow(clippy::cast_sign_loss, clippy::too_many_lines)]
pub fn write_instr<W: Write>(output: &mut W, instr: &Instr) -> Result<usize> {
    let mut size = le_u8(output, instr.opcode())?;
    size += match (instr.format(), instr.operands().as_slice()) {
        (Format::F10x, []) => le_u8(output, 0x00)?,
        (Format::F12x, [Operand::Reg(a), Operand::Reg(b)]) => {
            le_nibbles(output, nibble(*a)?, nibble(*b)?)?
        }
        (Format::F11n, [Operand::Reg(a), Operand::Int8(b)]) => {
            if !(-8..=7).contains(b) {
                return Err(invalid(format!("literal {b} cannot fit into 4 bits")));
            }
            le_nibbles(output, nibble(*a)?, *b as u8)?
        }
        (Format::F11x, [Operand::Reg(a)]) => le_u8(output, byte(*a)?)?,
        (Format::F10t, [Operand::Int8(a)]) => le_i8(output, *a)?,
        (Format::F20t, [Operand::Int16(a)]) => le_u8(output, 0x00)? + le_i16(output, *a)?,
        (Format::F22x, [Operand::Reg(a), Operand::Reg(b)]) => {
            le_u8(output, byte(*a)?)? + le_u16(output, b.value())?
        }
        (Format::F21t | Format::F21s | Format::F21h, [Operand::Reg(a), Operand::Int16(b)]) => {
            le_u8(output, byte(*a)?)? + le_i16(output, *b)?
        }
        (Format::F21c, [Operand::Reg(a), Operand::Pool(_, b)]) => {
            le_u8(output, byte(*a)?)? + le_u16(output, index16(*b)?)?
        }
        (Format::F23x, [Operand::Reg(a), Operand::Reg(b), Operand::Reg(c)]) => {
            le_u8(output, byte(*a)?)? + le_u8(output, byte(*b)?)? + le_u8(output, byte(*c)?)?
        }
        (Format::F22b, [Operand::Reg(a), Operand::Reg(b), Operand::Int8(c)]) => {
            le_u8(output, byte(*a)?)? + le_u8(output, byte(*b)?)? + le_i8(output, *c)?
        }
        (
            Format::F22t | Format::F22s,
            [Operand::Reg(a), Operand::Reg(b), Operand::Int16(c)],
        ) => le_nibbles(output, nibble(*a)?, nibble(*b)?)? + le_i16(output, *c)?,
        (Format::F22c, [Operand::Reg(a), Operand::Reg(b), Operand::Pool(_, c)]) => {
            le_nibbles(output, nibble(*a)?, nibble(*b)?)? + le_u16(output, index16(*c)?)?
        }
        (Format::F30t, [Operand::Int32(a)]) => le_u8(output, 0x00)? + le_i32(output, *a)?,
        (Format::F32x, [Operand::Reg(a), Operand::Reg(b)]) => {
            le_u8(output, 0x00)? + le_u16(output, a.value())? + le_u16(output, b.value())?
        }
        (Format::F31i | Format::F31t, [Operand::Reg(a), Operand::Int32(b)]) => {
            le_u8(output, byte(*a)?)? + le_i32(output, *b)?
        }
        (Format::F31c, [Operand::Reg(a), Operand::Pool(_, b)]) => {
            le_u8(output, byte(*a)?)? + le_u32(output, index32(*b)?)?
        }
        (Format::F35c, [Operand::RegList(l), Operand::Pool(_, b)]) => {
            write_reg_list(output, l, *b, None)?
        }
        (Format::F45cc, [Operand::RegList(l), Operand::Pool(_, b), Operand::Pool(_, h)]) => {
            write_reg_list(output, l, *b, Some(*h))?
        }
        (Format::F3rc, [Operand::RegRange(r), Operand::Pool(_, b)]) => {
            write_reg_range(output, r, *b, None)?
        }
        (Format::F4rcc, [Operand::RegRange(r), Operand::Pool(_, b), Operand::Pool(_, h)]) => {
            write_reg_range(output, r, *b, Some(*h))?
        }
        (Format::F51l, [Operand::Reg(a), Operand::Int64(b)]) => {
            le_u8(output, byte(*a)?)? + le_i64(output, *b)?
        }
        (Format::Payload, []) => write_payload(output, instr)?,
        (format, _) => {
            return Err(invalid(format!(
                "operands of {} do not match format {format:?}",
                instr.mnemonic()
            )))
        }
    };
    Ok(size)
}

fn write_reg_list<W: Write>(
    output: &mut W,
    list: &RegList,
    idx: usize,
    proto: Option<usize>,
) -> Result<usize> {
    if list.len() > 5 {
        return Err(invalid(format!("too many registers in {list}")));
    }
    let mut regs = [0u8; 5];
    for (slot, reg) in regs.iter_mut().zip(list.iter()) {
        *slot = nibble(reg)?;
    }
    let [c, d, e, f, g] = regs;
    let mut size = le_nibbles(output, g, list.len() as u8)?;
    size += le_u16(output, index16(idx)?)?;
    size += le_nibbles(output, c, d)?;
    size += le_nibbles(output, e, f)?;
    if let Some(h) = proto {
        size += le_u16(output, index16(h)?)?;
    }
    Ok(size)
}

fn write_reg_range<W: Write>(
    output: &mut W,
    range: &RegRange,
    idx: usize,
    proto: Option<usize>,
) -> Result<usize> {
    let count = u8::try_from(range.len())
        .map_err(|_| invalid(format!("too many registers in {range}")))?;
    let mut size = le_u8(output, count)?;
    size += le_u16(output, index16(idx)?)?;
    size += le_u16(output, range.first().value())?;
    if let Some(h) = proto {
        size += le_u16(output, index16(h)?)?;
    }
    Ok(size)
}

fn write_payload<W: Write>(output: &mut W, instr: &Instr) -> Result<usize> {
    let count16 = |n: usize| {
        u16::try_from(n).map_err(|_| invalid(format!("{n} payload entries is too many")))
    };
    let mut size = 0;
    match instr {
        Instr::PackedSwitchPayload { first_key, targets } => {
            size += le_u8(output, 0x01)?;
            size += le_u16(output, count16(targets.len())?)?;
            size += le_i32(output, *first_key)?;
            for target in targets {
                size += le_i32(output, *target)?;
            }
        }
        Instr::SparseSwitchPayload { keys, targets } => {
            if keys.len() != targets.len() {
                return Err(invalid("sparse switch keys and targets mismatch".to_string()));
            }
            size += le_u8(output, 0x02)?;
            size += le_u16(output, count16(targets.len())?)?;
            for key in keys {
                size += le_i32(output, *key)?;
            }
            for target in targets {
                size += le_i32(output, *target)?;
            }
        }
        Instr::FillArrayDataPayload { width, data } => {
            let elements = if *width == 0 {
                0
            } else {
                data.len() / usize::from(*width)
            };
            size += le_u8(output, 0x03)?;
            size += le_u16(output, *width)?;
            size += le_u32(output, index32(elements)?)?;
            size += bytes(output, data)?;
            if data.len() % 2 == 1 {
                size += le_u8(output, 0x00)?;
            }
        }
        _ => return Err(invalid(format!("{} is not a payload", instr.mnemonic()))),
    }
    Ok(size)
}

/// Encodes a sequence of instructions into code units.
pub fn assemble(instrs: &[Instr]) -> Result<Vec<u16>> {
    let mut buffer = Vec::new();
    for instr in instrs {
        write_instr(&mut buffer, instr)?;
    }
    Ok(buffer
        .chunks(2)
        .map(|unit| u16::from_le_bytes([unit[0], *unit.get(1).unwrap_or(&0)]))
        .collect())
}

/// Writes a whole code item, as read by [`parse_code`](crate::parse_code).
pub fn write_code<W: Write>(output: &mut W, code: &Code) -> Result<usize> {
    let mut insns = Vec::new();
    for instr in &code.insns {
        write_instr(&mut insns, &instr.instr)?;
    }
    let insns_size = index32(insns.len() / 2)?;

    // handlers are shared between try items holding equal clauses
    let mut handlers: Vec<&CatchHandler> = Vec::new();
    let mut handler_list = Vec::new();
    let mut offsets = Vec::new();
    for item in &code.tries {
        if !handlers.contains(&&item.handler) {
            handlers.push(&item.handler);
        }
    }
    uleb128(&mut handler_list, Uleb128::new(index32(handlers.len())?))?;
    for handler in &handlers {
        offsets.push(index16(handler_list.len())?);
        write_catch_handler(&mut handler_list, handler)?;
    }

    let mut size = le_u16(output, code.registers_size)?;
    size += le_u16(output, code.ins_size)?;
    size += le_u16(output, code.outs_size)?;
    size += le_u16(output, index16(code.tries.len())?)?;
    size += le_u32(output, 0)?;
    size += le_u32(output, insns_size)?;
    size += bytes(output, &insns)?;
    if !code.tries.is_empty() {
        if insns_size % 2 == 1 {
            size += le_u16(output, 0)?;
        }
        for item in &code.tries {
            let position = handlers
                .iter()
                .position(|h| *h == &item.handler)
                .unwrap_or_default();
            size += le_u32(output, index32(item.start.0)?)?;
            size += le_u16(output, index16(item.count)?)?;
            size += le_u16(output, offsets[position])?;
        }
        size += bytes(output, &handler_list)?;
    }
    Ok(size)
}

#[allow(clippy::cast_possible_wrap)]
fn write_catch_handler<W: Write>(output: &mut W, handler: &CatchHandler) -> Result<usize> {
    let clauses = handler.catches.len() as i32;
    let encoded = if handler.catch_all.is_some() {
        -clauses
    } else {
        clauses
    };
    let mut size = sleb128(output, Sleb128::new(encoded))?;
    for (ty, addr) in &handler.catches {
        size += uleb128(output, Uleb128::new(index32(ty.as_usize())?))?;
        size += uleb128(output, Uleb128::new(index32(addr.0)?))?;
    }
    if let Some(addr) = handler.catch_all {
        size += uleb128(output, Uleb128::new(index32(addr.0)?))?;
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::TryItem;
    use crate::parsers::parse_instructions;
    use crate::pools::Index;
    use crate::{parse_code, Addr};

    fn r(n: u16) -> Reg {
        Reg::from(n)
    }

    /// One instruction per format.
    fn samples() -> Vec<Instr> {
        vec![
            Instr::Nop,
            Instr::ReturnVoid,
            Instr::Move(r(1), r(15)),
            Instr::Const4(r(3), -8),
            Instr::MoveResult(r(200)),
            Instr::Goto(-3),
            Instr::Goto16(-300),
            Instr::MoveFrom16(r(255), r(65535)),
            Instr::IfNez(r(7), 12),
            Instr::Const16(r(2), -2),
            Instr::ConstHigh16(r(2), 0x7f00),
            Instr::ConstString(r(4), Index::new(65535)),
            Instr::AddInt(r(1), r(2), r(3)),
            Instr::AddIntLit8(r(1), r(2), -128),
            Instr::IfLe(r(14), r(2), -20),
            Instr::AddIntLit16(r(0), r(1), 1000),
            Instr::Iget(r(1), r(2), Index::new(9)),
            Instr::Goto32(-70000),
            Instr::Move16(r(1000), r(2000)),
            Instr::Const(r(6), 0x1234_5678),
            Instr::FillArrayData(r(1), 8),
            Instr::ConstStringJumbo(r(1), Index::new(70000)),
            Instr::InvokeDirect(RegList::from(vec![1u8, 2, 3, 4, 5]), Index::new(7)),
            Instr::InvokeStaticRange(RegRange::new(r(300), 4), Index::new(8)),
            Instr::InvokePolymorphic(RegList::from(vec![0u8, 1]), Index::new(2), Index::new(3)),
            Instr::InvokePolymorphicRange(RegRange::new(r(10), 2), Index::new(2), Index::new(3)),
            Instr::ConstWide(r(4), i64::MIN),
            Instr::Nop,
            Instr::PackedSwitchPayload {
                first_key: -1,
                targets: vec![4, -8],
            },
            Instr::SparseSwitchPayload {
                keys: vec![-5, 9],
                targets: vec![20, 30],
            },
            Instr::FillArrayDataPayload {
                width: 1,
                data: vec![1, 2, 3],
            },
        ]
    }

    #[test]
    fn round_trip_every_format() {
        let instrs = samples();
        let mut buffer = Vec::new();
        for instr in &instrs {
            let written = write_instr(&mut buffer, instr).unwrap();
            assert_eq!(written, instr.size() * 2, "{}", instr.mnemonic());
        }
        let decoded = parse_instructions(&buffer).unwrap();
        let decoded: Vec<Instr> = decoded.into_iter().map(|l| l.instr).collect();
        assert_eq!(decoded, instrs);
    }

    #[test]
    fn operands_out_of_format() {
        let mut buffer = Vec::new();
        assert!(write_instr(&mut buffer, &Instr::Move(r(16), r(1))).is_err());
        assert!(write_instr(&mut buffer, &Instr::Const4(r(1), 8)).is_err());
        assert!(write_instr(&mut buffer, &Instr::AddInt(r(256), r(1), r(2))).is_err());
    }

    #[test]
    fn assemble_units() {
        let units = assemble(&[Instr::Const4(r(0), 1), Instr::Return(r(0))]).unwrap();
        assert_eq!(units, vec![0x1012, 0x000f]);
    }

    #[test]
    fn code_item_round_trip() {
        let units = assemble(&[
            Instr::Const4(r(0), 0),
            Instr::Throw(r(0)),
            Instr::MoveException(r(0)),
            Instr::ReturnVoid,
        ])
        .unwrap();
        let handler = CatchHandler {
            catches: vec![(Index::new(2), Addr(2))],
            catch_all: Some(Addr(3)),
        };
        let code = Code::from_units(
            2,
            1,
            0,
            &units,
            vec![
                TryItem {
                    start: Addr(0),
                    count: 2,
                    handler: handler.clone(),
                },
                TryItem {
                    start: Addr(2),
                    count: 1,
                    handler,
                },
            ],
        )
        .unwrap();
        let mut buffer = Vec::new();
        write_code(&mut buffer, &code).unwrap();
        assert_eq!(parse_code(&buffer).unwrap(), code);
    }
}
