use crate::filter::MethodFilter;
use crate::prelude::*;
use crate::unitfile;
use clap::ArgMatches;
use dl_bytecode::code::Code;
use dl_bytecode::pools::Pools;
use std::fmt::Write;

pub fn run(args: &ArgMatches) -> DlResult<()> {
    init_logger(args);

    let input_fname = args
        .get_one::<String>("input")
        .ok_or_else(|| DlError::BadArguments("--input needed".to_string()))?;
    let repo = unitfile::load(input_fname)?;
    let filter = MethodFilter::from_args(args)?;

    for method in filter.select(&repo) {
        println!("[*] {}", method.signature());
        if let Some(code) = method.code() {
            print!("{}", disassemble(code, repo.pools()));
        }
    }

    Ok(())
}

/// Instruction listing of a code item, followed by its exception ranges.
#[must_use]
pub fn disassemble(code: &Code, pools: &Pools) -> String {
    let mut listing = String::new();
    // writing into a String cannot fail
    let _ = writeln!(
        listing,
        "    registers: {}, ins: {}, outs: {}",
        code.registers_size, code.ins_size, code.outs_size
    );
    for instr in code.iter_instructions() {
        let _ = writeln!(
            listing,
            "    {}: {}",
            instr.addr(),
            PrettyPrinter(instr.instr(), pools)
        );
    }
    for item in &code.tries {
        for (type_idx, handler) in &item.handler.catches {
            let exception = type_idx
                .get(pools)
                .map_or_else(|_| "?".to_string(), ToString::to_string);
            let _ = writeln!(
                listing,
                "    catch {exception} {}..{} -> {handler}",
                item.start,
                item.end()
            );
        }
        if let Some(handler) = item.handler.catch_all {
            let _ = writeln!(
                listing,
                "    catchall {}..{} -> {handler}",
                item.start,
                item.end()
            );
        }
    }
    listing
}

#[cfg(test)]
mod tests {
    use super::*;
    use dl_bytecode::assemble;
    use dl_bytecode::code::{CatchHandler, TryItem};
    use dl_bytecode::instrs::Instr;
    use dl_bytecode::pools::Index;
    use dl_bytecode::registers::Reg;
    use dl_bytecode::types::Type;

    #[test]
    fn listing() {
        let pools = Pools {
            types: vec![Type::class("java/lang/Exception")],
            ..Pools::default()
        };
        let units = assemble(&[
            Instr::Const4(Reg::from(0u8), -1),
            Instr::Return(Reg::from(0u8)),
            Instr::MoveException(Reg::from(0u8)),
            Instr::Return(Reg::from(0u8)),
        ])
        .unwrap();
        let tries = vec![TryItem {
            start: Addr(0),
            count: 1,
            handler: CatchHandler {
                catches: vec![(Index::new(0), Addr(2))],
                catch_all: Some(Addr(3)),
            },
        }];
        let code = Code::from_units(1, 0, 0, &units, tries).unwrap();
        let listing = disassemble(&code, &pools);
        let lines: Vec<&str> = listing.lines().collect();
        assert_eq!(lines[0], "    registers: 1, ins: 0, outs: 0");
        assert_eq!(lines[1], "    0000: const/4 v0, #-1");
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[5], "    catch Ljava/lang/Exception; 0000..0001 -> 0002");
        assert_eq!(lines[6], "    catchall 0000..0001 -> 0003");
    }
}
