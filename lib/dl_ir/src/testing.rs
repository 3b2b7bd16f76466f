//! Helpers shared by the unit tests of this crate.

use crate::repo::{AccessFlags, MethodDef};
use dl_bytecode::assemble;
use dl_bytecode::code::{Code, TryItem};
use dl_bytecode::instrs::Instr;
use dl_bytecode::pools::{FieldRef, MethodRef, Pools, ProtoRef};
use dl_bytecode::types::Type;

pub(crate) fn proto(descriptor: &str) -> ProtoRef {
    ProtoRef::try_from(descriptor.to_string()).unwrap()
}

pub(crate) fn method_ref(class: &str, name: &str, descriptor: &str) -> MethodRef {
    MethodRef {
        class: Type::class(class),
        name: name.to_string(),
        proto: proto(descriptor),
    }
}

/// Pools used by the tests:
/// - strings: `"hello"`;
/// - types: `La/C;`, `[I`, `Ljava/lang/Exception;`, `Ljava/io/IOException;`;
/// - fields: `La/C;->count:I`, `La/C;->name:Ljava/lang/String;`,
///   `La/C;->total:J`;
/// - methods: `La/C;->get()I`, `La/C;->put(IJLjava/lang/String;)V`,
///   `La/C;->make()La/C;`, `Ljava/lang/invoke/MethodHandle;->invoke([Ljava/lang/Object;)Ljava/lang/Object;`;
/// - protos: `(I)J`.
pub(crate) fn pools() -> Pools {
    let class = Type::class("a/C");
    let field = |name: &str, ty: Type| FieldRef {
        class: class.clone(),
        name: name.to_string(),
        type_: ty,
    };
    Pools {
        strings: vec!["hello".to_string()],
        types: vec![
            class.clone(),
            Type::Int.array_of(),
            Type::class("java/lang/Exception"),
            Type::class("java/io/IOException"),
        ],
        fields: vec![
            field("count", Type::Int),
            field("name", Type::class("java/lang/String")),
            field("total", Type::Long),
        ],
        methods: vec![
            method_ref("a/C", "get", "()I"),
            method_ref("a/C", "put", "(IJLjava/lang/String;)V"),
            method_ref("a/C", "make", "()La/C;"),
            method_ref(
                "java/lang/invoke/MethodHandle",
                "invoke",
                "([Ljava/lang/Object;)Ljava/lang/Object;",
            ),
        ],
        protos: vec![proto("(I)J")],
        ..Pools::default()
    }
}

/// A method of `La/C;` whose code is made of `instrs`.
pub(crate) fn method(
    name: &str,
    descriptor: &str,
    flags: AccessFlags,
    registers_size: u16,
    instrs: &[Instr],
    tries: Vec<TryItem>,
) -> MethodDef {
    let mut method = MethodDef::new(method_ref("a/C", name, descriptor), flags);
    let ins_size = u16::try_from(
        method.method.proto.params_slots() + usize::from(!flags.contains(AccessFlags::ACC_STATIC)),
    )
    .unwrap();
    let units = assemble(instrs).unwrap();
    method.code = Some(Code::from_units(registers_size, ins_size, 4, &units, tries).unwrap());
    method
}

pub(crate) fn static_method(
    descriptor: &str,
    registers_size: u16,
    instrs: &[Instr],
) -> MethodDef {
    method(
        "test",
        descriptor,
        AccessFlags::ACC_PUBLIC | AccessFlags::ACC_STATIC,
        registers_size,
        instrs,
        Vec::new(),
    )
}
